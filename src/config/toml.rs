//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::model::Direction;
use crate::webhook::RetryOn;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All settings are optional so a file can hold only the webhook list, or
/// only the settings the CLI does not cover.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Inbound server configuration
    #[serde(default)]
    pub server: ServerSection,

    /// Outbound delivery configuration
    #[serde(default)]
    pub delivery: DeliverySection,

    /// Delivery log configuration
    #[serde(default)]
    pub log: LogSection,

    /// Config file reload configuration
    #[serde(default)]
    pub reload: ReloadSection,

    /// Webhook definitions
    #[serde(default)]
    pub webhooks: Vec<WebhookEntry>,
}

/// Inbound server section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Listen address
    pub listen: Option<String>,

    /// Maximum request body size in bytes
    pub max_body_bytes: Option<usize>,
}

/// Outbound delivery section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeliverySection {
    /// Maximum concurrent HTTP attempts (unlimited when absent)
    pub max_in_flight: Option<usize>,

    /// Delay before the first retry in milliseconds
    pub backoff_base_ms: Option<u64>,

    /// Backoff multiplier
    pub backoff_multiplier: Option<f64>,

    /// Cap on any retry delay in milliseconds
    pub max_backoff_ms: Option<u64>,

    /// Which failures are retried: "any" or "transient"
    pub retry_on: Option<RetryOn>,
}

/// Delivery log section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    /// JSON-lines file (in-memory log when absent)
    pub path: Option<PathBuf>,
}

/// Config reload section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReloadSection {
    /// How often to check the config file for changes, in seconds
    pub interval_secs: Option<u64>,
}

/// One `[[webhooks]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookEntry {
    /// Unique id
    pub id: String,

    /// Display name (defaults to the id)
    pub name: Option<String>,

    /// "outbound" or "inbound"
    pub direction: Direction,

    /// Target URL (outbound only)
    pub url: Option<String>,

    /// HTTP method (outbound only, default POST)
    pub method: Option<String>,

    /// Subscribed event names (outbound only)
    #[serde(default)]
    pub events: Vec<String>,

    /// Shared HMAC secret
    pub secret: Option<String>,

    /// Extra request headers (outbound only)
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Retries after the initial attempt (default 3)
    pub max_retries: Option<u32>,

    /// Per-attempt timeout in milliseconds (default 10000)
    pub timeout_ms: Option<u64>,

    /// Collection receiving accepted payloads (inbound only)
    pub target_collection: Option<String>,

    /// Whether the webhook is active (default true)
    pub enabled: Option<bool>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# Webhook Hub Configuration File

[server]
# Address for the inbound HTTP server (default: 127.0.0.1:8090)
# listen = "0.0.0.0:8090"

# Maximum inbound request body in bytes (default: 1048576)
# max_body_bytes = 1048576

[delivery]
# Maximum concurrent outbound HTTP attempts (default: unlimited)
# max_in_flight = 64

# Delay before the first retry in milliseconds (default: 1000)
# Retry n waits backoff_base_ms * backoff_multiplier^(n-1)
# backoff_base_ms = 1000

# Backoff multiplier (default: 2.0)
# backoff_multiplier = 2.0

# Cap on any retry delay in milliseconds (default: 3600000)
# max_backoff_ms = 3600000

# Which failures are retried (default: "any")
# "any" retries every failure, "transient" skips 4xx other than 408/429
# retry_on = "any"

[log]
# Append delivery attempts to a JSON-lines file (default: emit through tracing only)
# path = "~/.local/state/webhook-hub/deliveries.jsonl"

[reload]
# Re-read the webhook list when this file changes (default: disabled)
# interval_secs = 5

# Outbound webhook: receives a signed POST for each subscribed event
# [[webhooks]]
# id = "orders-to-crm"
# direction = "outbound"
# url = "https://crm.example.com/hooks/orders"
# events = ["orders.afterCreate", "orders.afterUpdate"]
# secret = "change-me"
# max_retries = 3
# timeout_ms = 10000
# [webhooks.headers]
# X-Api-Key = "value"

# Inbound webhook: POST /webhooks/receive/leads-intake
# [[webhooks]]
# id = "leads-intake"
# direction = "inbound"
# secret = "change-me"
# target_collection = "leads"
"#
    .to_string()
}
