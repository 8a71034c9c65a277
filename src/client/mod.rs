//! HTTP client for the animal API.

pub mod network;
pub mod resilience;

pub use network::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, NetworkConfig, ProxyConfig};
pub use resilience::{BackoffCalculator, BackoffConfig, Resilience, RetryConfig};

use std::time::Duration;

use bytes::Bytes;
use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

use crate::category::{Category, DEFAULT_API_BASE};
use crate::{Error, Result};

#[derive(Clone, Debug)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    resilience: Resilience,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Wrap an existing `reqwest::Client` with default retry settings.
    pub fn with_http(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            resilience: Resilience::default(),
        }
    }

    pub fn with_retry(mut self, config: RetryConfig) -> Self {
        self.resilience = Resilience::new(config);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn resilience(&self) -> &Resilience {
        &self.resilience
    }

    pub fn endpoint(&self, category: Category) -> Result<Url> {
        category.endpoint(&self.base_url)
    }

    /// URL of a random image for `category`.
    pub async fn fetch_image_url(&self, category: Category) -> Result<String> {
        let body = self.fetch_category(category).await?;
        let field = category.spec().image_field;

        body.get(field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::MissingField {
                category: category.name().to_string(),
                field: field.to_string(),
            })
    }

    /// A random fun fact about `category`.
    pub async fn fetch_fact(&self, category: Category) -> Result<String> {
        let body = self.fetch_category(category).await?;

        body.get(category.spec().fact_field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|fact| !fact.is_empty())
            .map(str::to_string)
            .ok_or_else(|| Error::FactNotFound {
                category: category.name().to_string(),
            })
    }

    /// Raw image bytes; redirects are followed.
    pub async fn fetch_image(&self, url: &str) -> Result<Bytes> {
        tracing::debug!(url, "Fetching image");
        let response = self.http.get(url).send().await?;
        let response = check_status(response)?;
        Ok(response.bytes().await?)
    }

    /// One unretried GET, reporting the status code and reason phrase.
    pub async fn probe(&self, url: &Url) -> Result<(u16, String)> {
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        Ok((status.as_u16(), reason_phrase(status).to_string()))
    }

    async fn fetch_category(&self, category: Category) -> Result<Value> {
        let url = self.endpoint(category)?;
        tracing::debug!(category = %category, url = %url, "Querying animal endpoint");
        self.resilience.execute(|| self.get_json(&url)).await
    }

    async fn get_json(&self, url: &Url) -> Result<Value> {
        let response = self.http.get(url.clone()).send().await?;
        let response = check_status(response)?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status == StatusCode::OK {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        return Err(Error::RateLimit { retry_after });
    }

    Err(Error::Api {
        message: reason_phrase(status).to_string(),
        status: Some(status.as_u16()),
        url: response.url().to_string(),
    })
}

fn reason_phrase(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown")
}

#[derive(Default)]
pub struct ClientBuilder {
    base_url: Option<String>,
    network: Option<NetworkConfig>,
    retry: Option<RetryConfig>,
}

impl ClientBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn network(mut self, config: NetworkConfig) -> Self {
        self.network = Some(config);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        let network = self.network.take().unwrap_or_default();
        self.network = Some(network.timeout(timeout));
        self
    }

    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = Some(config);
        self
    }

    pub async fn build(self) -> Result<Client> {
        let raw = self.base_url.as_deref().unwrap_or(DEFAULT_API_BASE);
        let base_url = Url::parse(raw)
            .map_err(|e| Error::Config(format!("invalid API base URL '{}': {}", raw, e)))?;

        let network = self.network.unwrap_or_default();
        let http = network
            .apply_to_builder(reqwest::Client::builder())
            .await?
            .build()?;

        Ok(Client {
            http,
            base_url,
            resilience: Resilience::new(self.retry.unwrap_or_default()),
        })
    }
}
