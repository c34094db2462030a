//! Concurrent outbound delivery with exponential backoff.

use std::future::Future;
use std::num::NonZeroUsize;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use http::{HeaderName, HeaderValue};
use serde::Serialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::log::{DeliveryLogger, LogStore};
use crate::model::{DeliveryLogEntry, Direction, Event, Outcome, WebhookDefinition};
use crate::store::EventBus;
use crate::subscription::SubscriptionIndex;
use crate::time::{Clock, SystemClock};
use crate::webhook::signature::{self, EVENT_HEADER, SIGNATURE_HEADER};
use crate::webhook::{AttemptError, HttpClient, HttpError, HttpRequest, HttpResponse, RetryPolicy};

use super::RetryRegistry;

/// Body sent to outbound endpoints.
#[derive(Debug, Serialize)]
struct WirePayload<'a> {
    event: &'a str,
    timestamp: DateTime<Utc>,
    data: &'a serde_json::Value,
}

type BoxedDelivery = Pin<Box<dyn Future<Output = Outcome> + Send>>;

/// Fans events out to subscribed outbound webhooks.
///
/// Each matched webhook is delivered in its own tokio task. A failed attempt
/// is logged and, while the webhook's `max_retries` allows it, retried after
/// [`RetryPolicy::delay_for_retry`]. Retries of one delivery run strictly one
/// after another; different deliveries are independent.
///
/// The engine is shared behind an [`Arc`]; configure it with the `with_*`
/// methods before wrapping it.
///
/// # Type Parameters
///
/// - `H`: The HTTP client implementation
/// - `L`: The log store receiving one entry per attempt
pub struct DeliveryEngine<H, L> {
    client: H,
    index: Arc<SubscriptionIndex>,
    logger: DeliveryLogger<L>,
    retries: Arc<RetryRegistry>,
    policy: RetryPolicy,
    limiter: Option<Arc<Semaphore>>,
    clock: Arc<dyn Clock>,
}

impl<H, L> std::fmt::Debug for DeliveryEngine<H, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryEngine")
            .field("policy", &self.policy)
            .field("pending_retries", &self.retries.pending_total())
            .field(
                "max_in_flight_available",
                &self.limiter.as_ref().map(|s| s.available_permits()),
            )
            .finish_non_exhaustive()
    }
}

impl<H, L> DeliveryEngine<H, L> {
    /// Creates an engine with the default retry policy, no concurrency
    /// limit, its own retry registry and the system clock.
    #[must_use]
    pub fn new(client: H, index: Arc<SubscriptionIndex>, logger: DeliveryLogger<L>) -> Self {
        Self {
            client,
            index,
            logger,
            retries: Arc::new(RetryRegistry::new()),
            policy: RetryPolicy::default(),
            limiter: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Caps the number of HTTP attempts in flight at once.
    #[must_use]
    pub fn with_max_in_flight(mut self, limit: NonZeroUsize) -> Self {
        self.limiter = Some(Arc::new(Semaphore::new(limit.get())));
        self
    }

    /// Uses a shared retry registry.
    #[must_use]
    pub fn with_retry_registry(mut self, retries: Arc<RetryRegistry>) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the clock used for payload timestamps and log entries.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Returns the retry registry.
    #[must_use]
    pub const fn retries(&self) -> &Arc<RetryRegistry> {
        &self.retries
    }

    /// Returns the retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Cancels pending retries and refuses new ones.
    ///
    /// Returns how many pending retries were cancelled.
    pub fn shutdown(&self) -> usize {
        self.retries.close()
    }
}

impl<H, L> DeliveryEngine<H, L>
where
    H: HttpClient + 'static,
    L: LogStore + 'static,
{
    /// Starts delivering `event` to every subscribed webhook.
    ///
    /// Never waits on the network: each delivery runs in its own task.
    /// Returns the number of deliveries started.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(self: &Arc<Self>, event: Event) -> usize {
        let webhooks = self.index.lookup(&event.name);
        if webhooks.is_empty() {
            tracing::debug!(event = %event.name, "No webhooks subscribed");
            return 0;
        }

        let event = Arc::new(event);
        for webhook in &webhooks {
            let delivery = Arc::clone(self).deliver_boxed(Arc::clone(webhook), Arc::clone(&event), 0);
            tokio::spawn(delivery);
        }

        tracing::debug!(event = %event.name, deliveries = webhooks.len(), "Event dispatched");
        webhooks.len()
    }

    /// Dispatches every event published on `bus` until the bus closes.
    ///
    /// Events queue without bound while dispatch catches up, so none is skipped.
    pub fn listen(self: &Arc<Self>, bus: &EventBus) -> JoinHandle<()> {
        let mut events = bus.subscribe();
        let engine = Arc::clone(self);

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                engine.dispatch(event);
            }
            tracing::debug!("Event bus closed, delivery listener stopped");
        })
    }

    /// Performs attempt number `attempt` of delivering `event` to `webhook`.
    ///
    /// The attempt is always logged. On failure a retry is scheduled when
    /// the policy allows it; this call does not wait for it.
    pub async fn deliver(
        self: &Arc<Self>,
        webhook: Arc<WebhookDefinition>,
        event: Arc<Event>,
        attempt: u32,
    ) -> Outcome {
        let (request_body, result, duration) = match self.encode(&event) {
            Ok(body) => {
                let _permit = self.acquire_slot().await;
                let started = Instant::now();
                let result = self.execute(&webhook, &event.name, &body).await;
                (body, result, started.elapsed())
            }
            Err(e) => (Vec::new(), Err(AttemptError::Encode(e)), Duration::ZERO),
        };

        let outcome = match &result {
            Ok(_) => Outcome::Success,
            Err(e) if e.is_timeout() => Outcome::Timeout,
            Err(_) => Outcome::Failed,
        };

        let entry = self.log_entry(
            &webhook,
            &event,
            attempt,
            outcome,
            &request_body,
            &result,
            duration,
        );
        self.logger.record(entry).await;

        match result {
            Ok(response) => tracing::info!(
                webhook_id = %webhook.id,
                event = %event.name,
                attempt,
                status = response.status.as_u16(),
                "Webhook delivered"
            ),
            Err(e) => self.after_failure(webhook, event, attempt, &e),
        }

        outcome
    }

    async fn acquire_slot(&self) -> Option<OwnedSemaphorePermit> {
        match &self.limiter {
            // Never closed, so acquiring cannot fail.
            Some(limiter) => Arc::clone(limiter).acquire_owned().await.ok(),
            None => None,
        }
    }

    fn deliver_boxed(
        self: Arc<Self>,
        webhook: Arc<WebhookDefinition>,
        event: Arc<Event>,
        attempt: u32,
    ) -> BoxedDelivery {
        Box::pin(async move { self.deliver(webhook, event, attempt).await })
    }

    fn after_failure(
        self: &Arc<Self>,
        webhook: Arc<WebhookDefinition>,
        event: Arc<Event>,
        attempt: u32,
        error: &AttemptError,
    ) {
        if !self.policy.should_retry(attempt, webhook.max_retries, error) {
            tracing::error!(
                webhook_id = %webhook.id,
                event = %event.name,
                attempt,
                "Webhook delivery failed permanently: {error}"
            );
            return;
        }

        let delay = self.policy.delay_for_retry(attempt);
        let webhook_id = webhook.id.clone();
        let retry = Arc::clone(self).deliver_boxed(webhook, Arc::clone(&event), attempt + 1);
        let task = async move {
            retry.await;
        };

        if self.retries.schedule(&webhook_id, delay, task) {
            tracing::warn!(
                webhook_id = %webhook_id,
                event = %event.name,
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Webhook delivery failed, retry scheduled: {error}"
            );
        } else {
            tracing::warn!(
                webhook_id = %webhook_id,
                event = %event.name,
                attempt,
                "Webhook delivery failed, retries closed: {error}"
            );
        }
    }

    /// Serializes the wire payload stamped with the current time.
    fn encode(&self, event: &Event) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&WirePayload {
            event: &event.name,
            timestamp: self.clock.now(),
            data: &event.payload,
        })
    }

    fn build_request(
        webhook: &WebhookDefinition,
        event_name: &str,
        body: &[u8],
    ) -> Result<HttpRequest, AttemptError> {
        let url = webhook
            .url
            .clone()
            .ok_or_else(|| HttpError::InvalidUrl(format!("webhook '{}' has no URL", webhook.id)))?;

        let mut request = HttpRequest::new(webhook.method.clone(), url)
            .with_body(body.to_vec())
            .with_timeout(webhook.timeout);
        request.headers = webhook.headers.clone();

        request = request
            .with_header(
                http::header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )
            .with_header(
                HeaderName::from_static(EVENT_HEADER),
                header_value(EVENT_HEADER, event_name)?,
            );

        if let Some(secret) = &webhook.secret {
            let signature = signature::sign(secret, body);
            request = request.with_header(
                HeaderName::from_static(SIGNATURE_HEADER),
                header_value(SIGNATURE_HEADER, &signature)?,
            );
        }

        Ok(request)
    }

    async fn execute(
        &self,
        webhook: &WebhookDefinition,
        event_name: &str,
        body: &[u8],
    ) -> Result<HttpResponse, AttemptError> {
        let request = Self::build_request(webhook, event_name, body)?;

        // The client honours the request deadline too; this bounds clients that do not.
        let response = tokio::time::timeout(webhook.timeout, self.client.request(request))
            .await
            .map_err(|_| HttpError::Timeout)??;

        if response.is_success() {
            return Ok(response);
        }

        Err(AttemptError::NonSuccessStatus {
            status: response.status,
            body: Some(response.body_lossy()),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn log_entry(
        &self,
        webhook: &WebhookDefinition,
        event: &Event,
        attempt: u32,
        outcome: Outcome,
        request_body: &[u8],
        result: &Result<HttpResponse, AttemptError>,
        duration: Duration,
    ) -> DeliveryLogEntry {
        let (status_code, response_body, error) = match result {
            Ok(response) => (
                Some(response.status.as_u16()),
                Some(response.body_lossy()),
                None,
            ),
            Err(e @ AttemptError::NonSuccessStatus { status, body }) => {
                (Some(status.as_u16()), body.clone(), Some(e.to_string()))
            }
            Err(e) => (None, None, Some(e.to_string())),
        };

        DeliveryLogEntry {
            webhook_id: webhook.id.clone(),
            event: event.name.clone(),
            direction: Direction::Outbound,
            status_code,
            request_body: String::from_utf8_lossy(request_body).into_owned(),
            response_body,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            outcome,
            error,
            retry_attempt: attempt,
            created_at: self.clock.now(),
        }
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, AttemptError> {
    HeaderValue::from_str(value).map_err(|e| AttemptError::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })
}
