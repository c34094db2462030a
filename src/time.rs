//! Time abstraction for testability.
//!
//! This module provides a [`Clock`] trait that allows injecting fixed clocks
//! in tests while using the real system clock in production.

use chrono::{DateTime, Utc};

/// Abstraction over wall-clock time.
///
/// Used for the `timestamp` of outbound payloads and the `createdAt` of
/// delivery log entries. Retry timing does not go through this trait; it uses
/// the tokio timer so tests can pause and advance it.
///
/// # Example
///
/// ```
/// use webhook_hub::time::{Clock, SystemClock};
///
/// let clock = SystemClock;
/// assert!(clock.now() >= chrono::DateTime::<chrono::Utc>::UNIX_EPOCH);
/// ```
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock using actual system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
