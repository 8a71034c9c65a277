//! Typed settings for the catto CLI.
//!
//! Resolved from (highest priority first): `CATTO_*` environment variables,
//! the JSON settings file, then built-in defaults.
//!
//! | Key | Default |
//! |---|---|
//! | `api.base_url` | `https://some-random-api.com` |
//! | `http.timeout_secs` | `30` |
//! | `http.user_agent` | `catto/<version>` |
//! | `backoff.base` | `0.05` |
//! | `backoff.maximum_time` | `30.0` |
//! | `backoff.maximum_tries` | `5` (`0` = no limit) |
//! | `retry.max_retries` | `3` |
//! | `retry.base` | `1.0` |
//! | `download.category` | `cats` |
//! | `connectivity.check` | `true` |
//! | `connectivity.address` | `one.one.one.one:80` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;

use super::provider::{ConfigProvider, ConfigProviderExt};
use super::{ConfigBuilder, ConfigError, ConfigResult};
use crate::category::{Category, DEFAULT_API_BASE};
use crate::client::{BackoffConfig, Client, DEFAULT_USER_AGENT, NetworkConfig, RetryConfig};
use crate::connectivity::DEFAULT_PROBE_ADDRESS;

pub const ENV_PREFIX: &str = "CATTO_";
pub const SETTINGS_FILE: &str = "settings.json";

/// Base used to pace consecutive downloads and status checks.
pub const DEFAULT_PACING_BASE: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    /// Pause between consecutive requests in a batch
    pub pacing: BackoffConfig,
    pub max_retries: u32,
    pub retry_base: f64,
    pub default_category: Category,
    pub check_connectivity: bool,
    pub connectivity_address: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            pacing: BackoffConfig::new(DEFAULT_PACING_BASE, 30.0),
            max_retries: 3,
            retry_base: 1.0,
            default_category: Category::Cats,
            check_connectivity: true,
            connectivity_address: DEFAULT_PROBE_ADDRESS.to_string(),
        }
    }
}

impl Settings {
    /// `<config dir>/catto/settings.json` for the current platform.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "catto").map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
    }

    /// Environment first, then `file` (or the default settings file).
    pub async fn load_from_env_and_file(file: Option<&Path>) -> ConfigResult<Self> {
        let mut builder = ConfigBuilder::new().env();
        match file.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => builder = builder.file(path),
            None => tracing::debug!("No settings directory available, using environment only"),
        }
        Self::load(&builder.build()).await
    }

    pub async fn load<P: ConfigProvider + ?Sized>(provider: &P) -> ConfigResult<Self> {
        let defaults = Self::default();

        let api_base_url = provider
            .get_string("api.base_url")
            .await?
            .unwrap_or(defaults.api_base_url);
        url::Url::parse(&api_base_url).map_err(|e| invalid("api.base_url", e))?;

        let timeout_secs: f64 = provider
            .get("http.timeout_secs")
            .await?
            .unwrap_or(defaults.timeout.as_secs_f64());
        if !timeout_secs.is_finite() || timeout_secs <= 0.0 {
            return Err(invalid("http.timeout_secs", "must be a positive number of seconds"));
        }
        let timeout =
            Duration::try_from_secs_f64(timeout_secs).map_err(|e| invalid("http.timeout_secs", e))?;

        let user_agent = provider
            .get_string("http.user_agent")
            .await?
            .unwrap_or(defaults.user_agent);

        let pacing = BackoffConfig {
            base: provider
                .get("backoff.base")
                .await?
                .unwrap_or(defaults.pacing.base),
            maximum_time: provider
                .get("backoff.maximum_time")
                .await?
                .unwrap_or(defaults.pacing.maximum_time),
            maximum_tries: match provider.get::<u32>("backoff.maximum_tries").await? {
                Some(0) => None,
                Some(tries) => Some(tries),
                None => defaults.pacing.maximum_tries,
            },
        };
        pacing.validate().map_err(|e| invalid("backoff", e))?;

        let max_retries = provider
            .get("retry.max_retries")
            .await?
            .unwrap_or(defaults.max_retries);
        let retry_base = provider
            .get("retry.base")
            .await?
            .unwrap_or(defaults.retry_base);
        BackoffConfig { base: retry_base, ..pacing.clone() }
            .validate()
            .map_err(|e| invalid("retry.base", e))?;

        let default_category = match provider.get_string("download.category").await? {
            Some(name) => name
                .parse::<Category>()
                .map_err(|e| invalid("download.category", e))?,
            None => defaults.default_category,
        };

        let check_connectivity = provider
            .get("connectivity.check")
            .await?
            .unwrap_or(defaults.check_connectivity);
        let connectivity_address = provider
            .get_string("connectivity.address")
            .await?
            .unwrap_or(defaults.connectivity_address);

        Ok(Self {
            api_base_url,
            timeout,
            user_agent,
            pacing,
            max_retries,
            retry_base,
            default_category,
            check_connectivity,
            connectivity_address,
        })
    }

    /// Retry policy for API requests; shares the pacing caps.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::default()
            .max_retries(self.max_retries)
            .backoff(BackoffConfig {
                base: self.retry_base,
                ..self.pacing.clone()
            })
    }

    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig::from_env()
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone())
    }

    pub async fn client(&self) -> crate::Result<Client> {
        Client::builder()
            .base_url(self.api_base_url.clone())
            .network(self.network_config())
            .retry(self.retry_config())
            .build()
            .await
    }
}

fn invalid(key: &str, message: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
