//! Retry layer for requests against the animal API.
//!
//! Each call to [`Resilience::execute`] owns a fresh [`BackoffCalculator`]
//! and pauses for its next wait between attempts.

mod backoff;

pub use backoff::{BackoffCalculator, BackoffConfig};

use std::future::Future;
use std::time::Duration;

use crate::{Error, Result};

#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub backoff: BackoffConfig,
    pub retry_on_rate_limit: bool,
    pub retry_on_server_error: bool,
    pub retry_on_network_error: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: BackoffConfig::default(),
            retry_on_rate_limit: true,
            retry_on_server_error: true,
            retry_on_network_error: true,
        }
    }
}

impl RetryConfig {
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct Resilience {
    config: RetryConfig,
}

impl Resilience {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut backoff = BackoffCalculator::new(&self.config.backoff)?;
        let mut attempts = 0;

        loop {
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            attempts += 1;
            if attempts > self.config.max_retries || !self.should_retry(&error) {
                return Err(error);
            }

            let delay = self.delay(&mut backoff, &error);
            tracing::warn!(
                error = %error,
                attempt = attempts,
                max_retries = self.config.max_retries,
                delay_ms = delay.as_millis() as u64,
                "Request failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn delay(&self, backoff: &mut BackoffCalculator, error: &Error) -> Duration {
        let delay = backoff.next_delay();
        match error.retry_after() {
            Some(retry_after) => {
                let cap =
                    Duration::try_from_secs_f64(backoff.maximum_time()).unwrap_or(Duration::MAX);
                retry_after.min(cap).max(delay)
            }
            None => delay,
        }
    }

    fn should_retry(&self, error: &Error) -> bool {
        match error {
            Error::RateLimit { .. } => self.config.retry_on_rate_limit,
            Error::Network(_) => self.config.retry_on_network_error,
            Error::Api {
                status: Some(500..=599),
                ..
            } => self.config.retry_on_server_error,
            _ => false,
        }
    }
}
