//! Network settings for the HTTP client: timeout, user agent, proxy, CA bundle.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_USER_AGENT: &str = concat!("catto/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Debug)]
pub struct NetworkConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub proxy: Option<ProxyConfig>,
    /// Extra root certificate (PEM)
    pub ca_cert: Option<PathBuf>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
            ca_cert: None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ProxyConfig {
    pub https: Option<String>,
    pub http: Option<String>,
    /// Hosts that bypass the proxy
    pub no_proxy: Vec<String>,
}

impl NetworkConfig {
    /// Defaults plus proxy and CA bundle from the standard environment variables.
    pub fn from_env() -> Self {
        Self {
            proxy: ProxyConfig::from_env(),
            ca_cert: env::var("SSL_CERT_FILE").ok().map(PathBuf::from),
            ..Default::default()
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn ca_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_cert = Some(path.into());
        self
    }

    pub async fn apply_to_builder(
        &self,
        mut builder: reqwest::ClientBuilder,
    ) -> Result<reqwest::ClientBuilder, std::io::Error> {
        builder = builder
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone());

        if let Some(ref proxy) = self.proxy {
            builder = proxy.apply_to_builder(builder);
        }

        if let Some(ref ca_path) = self.ca_cert {
            let cert_data = tokio::fs::read(ca_path).await?;
            match reqwest::Certificate::from_pem(&cert_data) {
                Ok(cert) => builder = builder.add_root_certificate(cert),
                Err(e) => tracing::warn!(path = %ca_path.display(), error = %e, "Ignoring unreadable CA certificate"),
            }
        }

        Ok(builder)
    }
}

impl ProxyConfig {
    pub fn from_env() -> Option<Self> {
        let https = env::var("HTTPS_PROXY")
            .ok()
            .or_else(|| env::var("https_proxy").ok());
        let http = env::var("HTTP_PROXY")
            .ok()
            .or_else(|| env::var("http_proxy").ok());

        if https.is_none() && http.is_none() {
            return None;
        }

        let no_proxy = env::var("NO_PROXY")
            .ok()
            .or_else(|| env::var("no_proxy").ok())
            .map(|s| parse_no_proxy(&s))
            .unwrap_or_default();

        Some(Self {
            https,
            http,
            no_proxy,
        })
    }

    pub fn https(url: impl Into<String>) -> Self {
        Self {
            https: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn http(mut self, url: impl Into<String>) -> Self {
        self.http = Some(url.into());
        self
    }

    pub fn no_proxy(mut self, patterns: impl IntoIterator<Item = String>) -> Self {
        self.no_proxy.extend(patterns);
        self
    }

    fn apply_to_builder(&self, mut builder: reqwest::ClientBuilder) -> reqwest::ClientBuilder {
        let no_proxy = reqwest::NoProxy::from_string(&self.no_proxy.join(","));

        if let Some(ref https_url) = self.https {
            match reqwest::Proxy::https(https_url) {
                Ok(proxy) => builder = builder.proxy(proxy.no_proxy(no_proxy.clone())),
                Err(e) => tracing::warn!(url = %https_url, error = %e, "Ignoring invalid HTTPS proxy"),
            }
        }
        if let Some(ref http_url) = self.http {
            match reqwest::Proxy::http(http_url) {
                Ok(proxy) => builder = builder.proxy(proxy.no_proxy(no_proxy)),
                Err(e) => tracing::warn!(url = %http_url, error = %e, "Ignoring invalid HTTP proxy"),
            }
        }
        builder
    }
}

fn parse_no_proxy(value: &str) -> Vec<String> {
    value
        .split([',', ' '])
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}
