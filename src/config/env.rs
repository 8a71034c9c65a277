//! Environment Variable Configuration Provider
//!
//! `backoff.maximum_time` is read from `CATTO_BACKOFF_MAXIMUM_TIME`.

use super::provider::ConfigProvider;
use super::{ConfigError, ConfigResult};

#[derive(Debug, Clone)]
pub struct EnvConfigProvider {
    prefix: Option<String>,
}

impl EnvConfigProvider {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn env_key(&self, key: &str) -> String {
        let key = key.to_uppercase().replace('.', "_");
        match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, key),
            None => key,
        }
    }
}

impl Default for EnvConfigProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ConfigProvider for EnvConfigProvider {
    fn name(&self) -> &str {
        "env"
    }

    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>> {
        match std::env::var(self.env_key(key)) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(ConfigError::Env(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_key_conversion() {
        let provider = EnvConfigProvider::new();
        assert_eq!(provider.env_key("api.base_url"), "API_BASE_URL");

        let provider = EnvConfigProvider::prefixed("CATTO_");
        assert_eq!(
            provider.env_key("backoff.maximum_time"),
            "CATTO_BACKOFF_MAXIMUM_TIME"
        );
    }

    #[tokio::test]
    async fn test_env_provider_get() {
        let provider = EnvConfigProvider::prefixed("CATTO_TEST_ENV_");

        // SAFETY: Test-only environment setup, unique variable name
        unsafe { std::env::set_var("CATTO_TEST_ENV_RETRY_MAX_RETRIES", "7") };
        let value = provider.get_raw("retry.max_retries").await.unwrap();
        assert_eq!(value, Some("7".to_string()));
        unsafe { std::env::remove_var("CATTO_TEST_ENV_RETRY_MAX_RETRIES") };
    }

    #[tokio::test]
    async fn test_env_provider_not_found() {
        let provider = EnvConfigProvider::prefixed("NONEXISTENT_PREFIX_");
        assert_eq!(provider.get_raw("some.key").await.unwrap(), None);
    }
}
