//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::time::Duration;

/// Default address the inbound server binds to.
pub const LISTEN: &str = "127.0.0.1:8090";

/// Default maximum inbound request body size in bytes (1 MiB).
pub const MAX_BODY_BYTES: usize = crate::inbound::server::DEFAULT_MAX_BODY_BYTES;

/// Default HTTP method for outbound webhooks.
pub const METHOD: &str = "POST";

/// Default number of retries after the initial attempt.
pub const MAX_RETRIES: u32 = crate::model::WebhookDefinition::DEFAULT_MAX_RETRIES;

/// Default per-attempt timeout in milliseconds.
pub const TIMEOUT_MS: u64 = 10_000;

/// Default delay before the first retry in milliseconds.
pub const BACKOFF_BASE_MS: u64 = 1000;

/// Default backoff multiplier.
pub const BACKOFF_MULTIPLIER: f64 = 2.0;

/// Default cap on any retry delay in milliseconds (1 hour).
pub const MAX_BACKOFF_MS: u64 = 3_600_000;

/// Default per-attempt timeout as Duration.
#[must_use]
pub const fn timeout() -> Duration {
    Duration::from_millis(TIMEOUT_MS)
}

/// Default delay before the first retry as Duration.
#[must_use]
pub const fn backoff_base() -> Duration {
    Duration::from_millis(BACKOFF_BASE_MS)
}

/// Default cap on retry delays as Duration.
#[must_use]
pub const fn max_backoff() -> Duration {
    Duration::from_millis(MAX_BACKOFF_MS)
}
