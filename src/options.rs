use std::time::Duration;

use crate::{retry::Backoff, PdfServiceError, Result};

/// Configures per-attempt timeout and retry behavior.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one. Must be at least 1.
    pub max_attempts: u32,
    /// Per-attempt timeout in milliseconds. Must be positive.
    pub timeout_ms: u64,
    /// Delay before the second attempt, in milliseconds.
    pub initial_delay_ms: u64,
    /// Factor applied to the delay after every retried attempt. Must be >= 1.
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout_ms: 30_000,
            initial_delay_ms: 1_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Checks the documented ranges of every field.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(PdfServiceError::InvalidConfig(
                "max_attempts must be at least 1".to_owned(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(PdfServiceError::InvalidConfig(
                "timeout_ms must be greater than 0".to_owned(),
            ));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(PdfServiceError::InvalidConfig(format!(
                "backoff_multiplier must be a finite number >= 1, got {}",
                self.backoff_multiplier
            )));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Returns the (unbounded) sequence of waits between attempts.
    pub fn delays(&self) -> Backoff {
        Backoff::new(
            Duration::from_millis(self.initial_delay_ms),
            self.backoff_multiplier,
        )
    }
}

/// Client-level options: retry policy for generation plus the health probe timeout.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientOptions {
    /// Retry policy applied to PDF generation requests.
    pub retry: RetryConfig,
    /// Timeout for the `/health` probe in milliseconds. The probe is never retried.
    pub health_timeout_ms: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            health_timeout_ms: 5_000,
        }
    }
}
