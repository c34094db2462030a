//! Webhook definitions as read from the configuration store.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which way a webhook carries data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The hub pushes events to an external URL.
    Outbound,
    /// An external system pushes payloads into the hub.
    Inbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outbound => write!(f, "outbound"),
            Self::Inbound => write!(f, "inbound"),
        }
    }
}

/// A configured webhook.
///
/// Definitions are owned by the configuration store. The hub only ever holds
/// read-only snapshots of them; a definition captured by an in-flight delivery
/// stays unchanged for every retry of that delivery.
///
/// # Example
///
/// ```
/// use webhook_hub::model::WebhookDefinition;
/// use url::Url;
///
/// let hook = WebhookDefinition::outbound("w1", Url::parse("https://example.com/hook").unwrap())
///     .with_events(["orders.afterCreate"])
///     .with_secret("s3cr3t");
///
/// assert!(hook.listens_to("orders.afterCreate"));
/// assert_eq!(hook.max_retries, 3);
/// ```
#[derive(Debug, Clone)]
pub struct WebhookDefinition {
    /// Unique identifier.
    pub id: String,
    /// Human readable name.
    pub name: String,
    /// Outbound or inbound.
    pub direction: Direction,
    /// Target URL (outbound only).
    pub url: Option<url::Url>,
    /// HTTP method used for outbound requests.
    pub method: http::Method,
    /// Event names an outbound webhook listens to.
    pub events: BTreeSet<String>,
    /// Shared HMAC key. Signing and verification are skipped when absent.
    pub secret: Option<String>,
    /// Additional static headers sent with every outbound request.
    pub headers: http::HeaderMap,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Per-attempt deadline.
    pub timeout: Duration,
    /// Collection that accepted inbound payloads are written to.
    pub target_collection: Option<String>,
    /// Disabled webhooks are neither routed to nor accepted from.
    pub enabled: bool,
}

impl WebhookDefinition {
    /// Default number of retries after the initial attempt.
    pub const DEFAULT_MAX_RETRIES: u32 = 3;

    /// Default per-attempt deadline (10 seconds).
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

    fn new(id: impl Into<String>, direction: Direction, url: Option<url::Url>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            direction,
            url,
            method: http::Method::POST,
            events: BTreeSet::new(),
            secret: None,
            headers: http::HeaderMap::new(),
            max_retries: Self::DEFAULT_MAX_RETRIES,
            timeout: Self::DEFAULT_TIMEOUT,
            target_collection: None,
            enabled: true,
        }
    }

    /// Creates an enabled outbound webhook with default settings.
    #[must_use]
    pub fn outbound(id: impl Into<String>, url: url::Url) -> Self {
        Self::new(id, Direction::Outbound, Some(url))
    }

    /// Creates an enabled inbound webhook with default settings.
    #[must_use]
    pub fn inbound(id: impl Into<String>) -> Self {
        Self::new(id, Direction::Inbound, None)
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn with_method(mut self, method: http::Method) -> Self {
        self.method = method;
        self
    }

    /// Adds event subscriptions.
    #[must_use]
    pub fn with_events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.events.extend(events.into_iter().map(Into::into));
        self
    }

    /// Sets the shared HMAC secret.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Adds a static header.
    #[must_use]
    pub fn with_header(mut self, name: http::HeaderName, value: http::HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the maximum number of retries.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the per-attempt deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the collection inbound payloads are written to.
    #[must_use]
    pub fn with_target_collection(mut self, collection: impl Into<String>) -> Self {
        self.target_collection = Some(collection.into());
        self
    }

    /// Sets the enabled flag.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Returns true if this webhook subscribes to `event`.
    #[must_use]
    pub fn listens_to(&self, event: &str) -> bool {
        self.events.contains(event)
    }

    /// Returns true for enabled outbound webhooks, the only ones routed to.
    #[must_use]
    pub fn is_routable(&self) -> bool {
        self.enabled && self.direction == Direction::Outbound
    }

    /// Returns true for enabled inbound webhooks, the only ones accepted from.
    #[must_use]
    pub fn accepts_inbound(&self) -> bool {
        self.enabled && self.direction == Direction::Inbound
    }
}
