//! Inbound request handling, independent of the HTTP framework.

use std::sync::Arc;
use std::time::Duration;

use http::{HeaderMap, StatusCode};
use serde_json::{Value, json};
use tokio::time::Instant;

use crate::log::{DeliveryLogger, LogStore};
use crate::model::{DeliveryLogEntry, Direction, INBOUND_EVENT, Outcome, WebhookDefinition};
use crate::store::{ConfigStore, RecordStore};
use crate::time::{Clock, SystemClock};
use crate::webhook::signature::{self, SIGNATURE_HEADER};

/// Status and JSON body returned to the external caller.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundResponse {
    /// HTTP status
    pub status: StatusCode,
    /// JSON body
    pub body: Value,
}

impl InboundResponse {
    fn accepted() -> Self {
        Self {
            status: StatusCode::OK,
            body: json!({ "success": true }),
        }
    }

    fn rejected(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            body: json!({ "success": false, "error": message }),
        }
    }

    fn not_found() -> Self {
        Self::rejected(StatusCode::NOT_FOUND, "webhook not found")
    }
}

/// Why a known inbound webhook refused a request.
struct Rejection {
    response: InboundResponse,
    /// Detail for the log entry; never sent to the caller.
    detail: String,
}

impl Rejection {
    fn new(status: StatusCode, message: &str, detail: impl Into<String>) -> Self {
        Self {
            response: InboundResponse::rejected(status, message),
            detail: detail.into(),
        }
    }
}

/// Accepts pushes from external systems.
///
/// Each request for a known inbound webhook moves through
/// `received -> verified -> forwarded | rejected -> logged`. Requests for
/// unknown ids, or ids of outbound webhooks, get a 404 and leave no log
/// entry; every other request is logged exactly once.
pub struct InboundReceiver<C, R, L> {
    config: Arc<C>,
    records: Arc<R>,
    logger: DeliveryLogger<L>,
    clock: Arc<dyn Clock>,
}

impl<C, R, L> std::fmt::Debug for InboundReceiver<C, R, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundReceiver").finish_non_exhaustive()
    }
}

impl<C, R, L> InboundReceiver<C, R, L>
where
    C: ConfigStore,
    R: RecordStore,
    L: LogStore,
{
    /// Creates a receiver using the system clock.
    #[must_use]
    pub fn new(config: Arc<C>, records: Arc<R>, logger: DeliveryLogger<L>) -> Self {
        Self {
            config,
            records,
            logger,
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets the clock used for log entry timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Handles one request for `webhook_id`.
    pub async fn receive(&self, webhook_id: &str, body: &[u8], headers: &HeaderMap) -> InboundResponse {
        let started = Instant::now();

        let Some(webhook) = self
            .config
            .get(webhook_id)
            .filter(|w| w.direction == Direction::Inbound)
        else {
            tracing::debug!(webhook_id, "Inbound request for unknown webhook");
            return InboundResponse::not_found();
        };

        let result = self.process(&webhook, body, headers).await;
        let duration = started.elapsed();

        match result {
            Ok(()) => {
                tracing::info!(webhook_id, "Inbound webhook accepted");
                self.log(&webhook, body, StatusCode::OK, None, duration).await;
                InboundResponse::accepted()
            }
            Err(rejection) => {
                tracing::warn!(
                    webhook_id,
                    status = rejection.response.status.as_u16(),
                    "Inbound webhook rejected: {}",
                    rejection.detail
                );
                self.log(
                    &webhook,
                    body,
                    rejection.response.status,
                    Some(rejection.detail),
                    duration,
                )
                .await;
                rejection.response
            }
        }
    }

    async fn process(
        &self,
        webhook: &WebhookDefinition,
        body: &[u8],
        headers: &HeaderMap,
    ) -> Result<(), Rejection> {
        // Only reached for inbound ids, so this rejects exactly the disabled ones.
        if !webhook.accepts_inbound() {
            return Err(Rejection::new(
                StatusCode::NOT_FOUND,
                "webhook not found",
                "webhook is disabled",
            ));
        }

        if let Some(secret) = &webhook.secret {
            Self::verify(secret, body, headers)?;
        }

        let payload: Value = serde_json::from_slice(body).map_err(|e| {
            Rejection::new(StatusCode::BAD_REQUEST, "invalid JSON body", e.to_string())
        })?;

        let Some(collection) = &webhook.target_collection else {
            return Ok(());
        };

        let Value::Object(values) = payload else {
            return Err(Rejection::new(
                StatusCode::BAD_REQUEST,
                "payload must be a JSON object",
                "payload is not a JSON object",
            ));
        };

        self.records
            .create(collection, values)
            .await
            .map(|record| {
                tracing::debug!(webhook_id = %webhook.id, collection, record_id = %record.id, "Record created");
            })
            .map_err(|e| Rejection::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error", e.to_string()))
    }

    fn verify(secret: &str, body: &[u8], headers: &HeaderMap) -> Result<(), Rejection> {
        let Some(provided) = headers.get(SIGNATURE_HEADER) else {
            return Err(Rejection::new(
                StatusCode::UNAUTHORIZED,
                "invalid signature",
                "missing signature header",
            ));
        };

        let valid = provided
            .to_str()
            .is_ok_and(|sig| signature::verify(secret, body, sig));
        if valid {
            Ok(())
        } else {
            Err(Rejection::new(
                StatusCode::UNAUTHORIZED,
                "invalid signature",
                "signature mismatch",
            ))
        }
    }

    async fn log(
        &self,
        webhook: &WebhookDefinition,
        body: &[u8],
        status: StatusCode,
        error: Option<String>,
        duration: Duration,
    ) {
        let outcome = if error.is_none() {
            Outcome::Success
        } else {
            Outcome::Failed
        };

        self.logger
            .record(DeliveryLogEntry {
                webhook_id: webhook.id.clone(),
                event: INBOUND_EVENT.to_string(),
                direction: Direction::Inbound,
                status_code: Some(status.as_u16()),
                request_body: String::from_utf8_lossy(body).into_owned(),
                response_body: None,
                duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                outcome,
                error,
                retry_attempt: 0,
                created_at: self.clock.now(),
            })
            .await;
    }
}
