//! Configuration Provider Trait

use serde::de::DeserializeOwned;

use super::{ConfigError, ConfigResult};

/// Read-only source of configuration values keyed by dotted names
/// (`backoff.base`, `api.base_url`).
#[async_trait::async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    /// Get a raw configuration value
    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>>;
}

/// Extension methods for typed configuration access
pub trait ConfigProviderExt: ConfigProvider {
    /// Get a value parsed as JSON (`0.05`, `true`, `5`)
    fn get<T: DeserializeOwned + Send>(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = ConfigResult<Option<T>>> + Send
    where
        Self: Sync,
    {
        async move {
            match self.get_raw(key).await? {
                Some(raw) => {
                    let value: T = serde_json::from_str(raw.trim()).map_err(|e| {
                        ConfigError::InvalidValue {
                            key: key.to_string(),
                            message: e.to_string(),
                        }
                    })?;
                    Ok(Some(value))
                }
                None => Ok(None),
            }
        }
    }

    /// Get a value verbatim, without JSON parsing
    fn get_string(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = ConfigResult<Option<String>>> + Send
    where
        Self: Sync,
    {
        async move {
            Ok(self
                .get_raw(key)
                .await?
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty()))
        }
    }
}

impl<P: ConfigProvider + ?Sized> ConfigProviderExt for P {}
