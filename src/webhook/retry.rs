//! Retry policy for outbound deliveries.

use std::time::Duration;

use serde::Deserialize;

use super::{AttemptError, HttpError};

/// Which failed attempts are eligible for a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryOn {
    /// Retry every failure: transport errors, timeouts and any non-2xx status.
    #[default]
    Any,
    /// Retry only failures that can succeed later: transport errors,
    /// timeouts, 5xx, 408 and 429.
    Transient,
}

/// Exponential backoff configuration.
///
/// The number of retries is a per-webhook setting
/// ([`max_retries`](crate::model::WebhookDefinition::max_retries)); this
/// policy only decides *when* and *whether* a failed attempt is retried.
///
/// # Defaults
///
/// - `initial_delay`: 1 second
/// - `multiplier`: 2.0
/// - `max_delay`: 1 hour
/// - `retry_on`: [`RetryOn::Any`]
///
/// With the defaults, the delay before retry `n + 1` is `2^n` seconds.
///
/// # Example
///
/// ```
/// use webhook_hub::webhook::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.delay_for_retry(0), Duration::from_secs(1));
/// assert_eq!(policy.delay_for_retry(2), Duration::from_secs(4));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Delay after the initial attempt fails.
    pub initial_delay: Duration,

    /// Upper bound for any computed delay.
    pub max_delay: Duration,

    /// Factor applied to the delay after each failed attempt.
    pub multiplier: f64,

    /// Which failures are retried.
    pub retry_on: RetryOn,
}

impl RetryPolicy {
    /// Default initial delay (1 second).
    pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1000);

    /// Default maximum delay (1 hour).
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(3600);

    /// Default multiplier (2.0).
    pub const DEFAULT_MULTIPLIER: f64 = 2.0;

    /// Creates a new retry policy with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            initial_delay: Self::DEFAULT_INITIAL_DELAY,
            max_delay: Self::DEFAULT_MAX_DELAY,
            multiplier: Self::DEFAULT_MULTIPLIER,
            retry_on: RetryOn::Any,
        }
    }

    /// Sets the initial delay.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the delay multiplier.
    ///
    /// # Panics
    ///
    /// Panics if `multiplier` is not positive (must be > 0.0).
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        assert!(multiplier > 0.0, "multiplier must be positive");
        self.multiplier = multiplier;
        self
    }

    /// Sets which failures are retried.
    #[must_use]
    pub const fn with_retry_on(mut self, retry_on: RetryOn) -> Self {
        self.retry_on = retry_on;
        self
    }

    /// Computes the delay before the retry that follows `attempt`.
    ///
    /// `attempt` is the 0-indexed number of the attempt that just failed, so
    /// the result is `initial_delay * multiplier^attempt`, capped at `max_delay`.
    #[must_use]
    pub fn delay_for_retry(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay_secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = delay_secs.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Returns true if a failed `attempt` should be followed by another one.
    ///
    /// A retry happens only while `attempt < max_retries` and the error is
    /// eligible under [`retry_on`](Self::retry_on).
    #[must_use]
    pub fn should_retry(&self, attempt: u32, max_retries: u32, error: &AttemptError) -> bool {
        if attempt >= max_retries {
            return false;
        }

        match self.retry_on {
            RetryOn::Any => true,
            RetryOn::Transient => error.is_retryable(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Extension trait for checking if an error is transient.
///
/// Consulted by [`RetryPolicy::should_retry`] under [`RetryOn::Transient`].
pub trait IsRetryable {
    /// Returns true if the error is potentially transient and should be retried.
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for HttpError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout => true,
            // Configuration issue, never fixed by waiting
            Self::InvalidUrl(_) => false,
        }
    }
}

impl IsRetryable for AttemptError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_retryable(),
            Self::NonSuccessStatus { status, .. } => {
                status.is_server_error()
                    || *status == http::StatusCode::TOO_MANY_REQUESTS
                    || *status == http::StatusCode::REQUEST_TIMEOUT
            }
            Self::InvalidHeader { .. } | Self::Encode(_) => false,
        }
    }
}
