//! Delivery log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Direction;

/// Event name recorded for inbound attempts.
pub const INBOUND_EVENT: &str = "inbound.receive";

/// Result of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The attempt completed with a 2xx response (outbound) or was accepted (inbound).
    Success,
    /// Transport failure, non-2xx response, or rejected inbound request.
    Failed,
    /// The attempt exceeded its deadline.
    Timeout,
}

impl Outcome {
    /// Returns true for [`Outcome::Success`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// One append-only record per delivery attempt.
///
/// An entry exists for the initial attempt and for every retry; `retry_attempt`
/// counts from 0 and never exceeds the webhook's `max_retries`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryLogEntry {
    /// Webhook the attempt belongs to.
    pub webhook_id: String,
    /// Event name, or [`INBOUND_EVENT`] for inbound requests.
    pub event: String,
    /// Whether the hub sent or received the request.
    pub direction: Direction,
    /// HTTP status, absent when no response was received.
    pub status_code: Option<u16>,
    /// Body sent (outbound) or received (inbound), invalid UTF-8 replaced.
    pub request_body: String,
    /// Body returned by the endpoint, if any.
    pub response_body: Option<String>,
    /// Wall time of the attempt.
    pub duration_ms: u64,
    /// How the attempt ended.
    pub outcome: Outcome,
    /// Failure description; absent on success.
    pub error: Option<String>,
    /// 0 for the first attempt, then one more per retry.
    pub retry_attempt: u32,
    /// When the entry was made.
    pub created_at: DateTime<Utc>,
}
