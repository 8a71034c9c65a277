//! Exponential backoff wait-time calculator.
//!
//! Produces successive pause durations for repeated calls against a
//! rate-limited service. The wait ceiling grows with the square of the call
//! count, each value is jittered, and the sequence resets itself once a wait
//! hits the time cap or the try budget is used up.

use std::num::NonZeroU32;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Construction parameters for a [`BackoffCalculator`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Scaling factor for the random wait range.
    pub base: f64,
    /// Upper bound in seconds for any single wait.
    pub maximum_time: f64,
    /// Calls before the sequence resets; `None` never resets on tries.
    pub maximum_tries: Option<u32>,
}

impl BackoffConfig {
    pub fn new(base: f64, maximum_time: f64) -> Self {
        Self {
            base,
            maximum_time,
            ..Default::default()
        }
    }

    pub fn maximum_tries(mut self, tries: u32) -> Self {
        self.maximum_tries = Some(tries);
        self
    }

    pub fn unbounded(mut self) -> Self {
        self.maximum_tries = None;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.base.is_finite() || self.base <= 0.0 {
            return Err(Error::Config(format!(
                "backoff base must be a positive number, got {}",
                self.base
            )));
        }
        if !self.maximum_time.is_finite() || self.maximum_time <= 0.0 {
            return Err(Error::Config(format!(
                "backoff maximum_time must be a positive number, got {}",
                self.maximum_time
            )));
        }
        if Duration::try_from_secs_f64(self.maximum_time).is_err() {
            return Err(Error::Config(format!(
                "backoff maximum_time {} is too large",
                self.maximum_time
            )));
        }
        // Keeps the widest draw in `next_wait`, and its doubling, finite.
        if self.base * self.maximum_time > f64::MAX / 4.0 {
            return Err(Error::Config(format!(
                "backoff base {} is too large for maximum_time {}",
                self.base, self.maximum_time
            )));
        }
        if self.maximum_tries == Some(0) {
            return Err(Error::Config(
                "backoff maximum_tries must be at least 1 (omit it for no limit)".into(),
            ));
        }
        Ok(())
    }

    /// Build a calculator seeded from the operating system.
    pub fn build(&self) -> Result<BackoffCalculator> {
        BackoffCalculator::new(self)
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base: 1.0,
            maximum_time: 30.0,
            maximum_tries: Some(5),
        }
    }
}

/// Stateful generator of wait durations for one retry session.
///
/// Not meant to be shared: the owning retry loop calls [`next_wait`] once per
/// pause and sleeps for the returned number of seconds itself.
///
/// [`next_wait`]: BackoffCalculator::next_wait
#[derive(Clone, Debug)]
pub struct BackoffCalculator<R = StdRng> {
    base: f64,
    maximum_time: f64,
    maximum_tries: Option<NonZeroU32>,
    retries: u32,
    last_wait: f64,
    rng: R,
}

impl BackoffCalculator<StdRng> {
    pub fn new(config: &BackoffConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Deterministic calculator; equal seeds give equal sequences.
    pub fn seeded(config: &BackoffConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> BackoffCalculator<R> {
    pub fn with_rng(config: &BackoffConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            base: config.base,
            maximum_time: config.maximum_time,
            maximum_tries: config.maximum_tries.and_then(NonZeroU32::new),
            retries: 1,
            last_wait: 0.0,
            rng,
        })
    }

    /// Next wait in seconds, always within `[0, maximum_time]`.
    pub fn next_wait(&mut self) -> f64 {
        let exponent = f64::from(self.retries).powi(2).min(self.maximum_time);
        let mut wait = self
            .rng
            .random_range(0.0..=self.base * 2.0 * exponent);

        // A low draw must not undo the backoff already built up.
        if wait <= self.last_wait {
            wait = self.last_wait * 2.0;
        }
        self.last_wait = wait;

        if wait > self.maximum_time {
            wait = self.maximum_time;
            self.reset();
        }

        // Checked against the count before this call is added.
        if let Some(tries) = self.maximum_tries
            && self.retries >= tries.get()
        {
            self.reset();
        }

        self.retries = self.retries.saturating_add(1);
        wait
    }

    pub fn next_delay(&mut self) -> Duration {
        Duration::try_from_secs_f64(self.next_wait()).unwrap_or(Duration::MAX)
    }

    /// Calls counted since the last reset.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn last_wait(&self) -> f64 {
        self.last_wait
    }

    pub fn maximum_time(&self) -> f64 {
        self.maximum_time
    }

    fn reset(&mut self) {
        tracing::trace!(retries = self.retries, "backoff reset");
        self.retries = 0;
        self.last_wait = 0.0;
    }
}
