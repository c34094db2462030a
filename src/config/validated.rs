//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use http::header::{HeaderName, HeaderValue};
use http::Method;
use url::Url;

use crate::model::{Direction, WebhookDefinition};
use crate::webhook::{RetryOn, RetryPolicy};

use super::cli::Cli;
use super::defaults;
use super::error::ConfigError;
use super::toml::{TomlConfig, WebhookEntry};

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Address the inbound server binds to
    pub listen: SocketAddr,

    /// Maximum inbound request body size
    pub max_body_bytes: usize,

    /// Cap on concurrent outbound attempts (`None` = unlimited)
    pub max_in_flight: Option<NonZeroUsize>,

    /// Backoff policy for failed deliveries
    pub retry_policy: RetryPolicy,

    /// JSON-lines delivery log (`None` = tracing only)
    pub log_file: Option<PathBuf>,

    /// Config file the webhooks came from, if any
    pub config_path: Option<PathBuf>,

    /// How often to re-read webhooks from `config_path` (`None` = never)
    pub reload_interval: Option<Duration>,

    /// Validated webhook definitions
    pub webhooks: Vec<WebhookDefinition>,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let log_file = self
            .log_file
            .as_ref()
            .map_or_else(|| "tracing".to_string(), |p| p.display().to_string());
        let max_in_flight = self
            .max_in_flight
            .map_or_else(|| "unlimited".to_string(), |n| n.to_string());
        let outbound = self
            .webhooks
            .iter()
            .filter(|w| w.direction == Direction::Outbound)
            .count();

        write!(
            f,
            "Config {{ listen: {}, webhooks: {} outbound/{} inbound, max_in_flight: {}, \
             backoff: {}ms x{}, retry_on: {:?}, log: {}, reload: {} }}",
            self.listen,
            outbound,
            self.webhooks.len() - outbound,
            max_in_flight,
            self.retry_policy.initial_delay.as_millis(),
            self.retry_policy.multiplier,
            self.retry_policy.retry_on,
            log_file,
            self.reload_interval
                .map_or_else(|| "off".to_string(), |d| format!("{}s", d.as_secs())),
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The listen address does not parse
    /// - A numeric setting is zero where that makes no sense
    /// - The backoff settings are inconsistent
    /// - Any webhook definition is invalid
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let listen = Self::resolve_listen(cli, toml)?;
        let max_body_bytes = Self::resolve_max_body_bytes(toml)?;
        let max_in_flight = Self::resolve_max_in_flight(cli, toml)?;
        let retry_policy = Self::build_retry_policy(cli, toml)?;
        let log_file = cli
            .log_file
            .clone()
            .or_else(|| toml.and_then(|t| t.log.path.clone()))
            .map(|p| expand_home(&p));
        let reload_interval = Self::resolve_reload_interval(cli, toml)?;
        let webhooks = build_webhooks(toml.map(|t| t.webhooks.as_slice()).unwrap_or_default())?;

        Ok(Self {
            listen,
            max_body_bytes,
            max_in_flight,
            retry_policy,
            log_file,
            config_path: cli.config.as_deref().map(expand_home),
            reload_interval,
            webhooks,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(&expand_home(path))?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    fn resolve_listen(cli: &Cli, toml: Option<&TomlConfig>) -> Result<SocketAddr, ConfigError> {
        // Priority: CLI explicit > TOML > default
        let value = cli
            .listen
            .as_deref()
            .or_else(|| toml.and_then(|t| t.server.listen.as_deref()))
            .unwrap_or(defaults::LISTEN);

        value
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidListen {
                value: value.to_string(),
                reason: e.to_string(),
            })
    }

    fn resolve_max_body_bytes(toml: Option<&TomlConfig>) -> Result<usize, ConfigError> {
        let bytes = toml
            .and_then(|t| t.server.max_body_bytes)
            .unwrap_or(defaults::MAX_BODY_BYTES);

        if bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_body_bytes",
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(bytes)
    }

    fn resolve_max_in_flight(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<Option<NonZeroUsize>, ConfigError> {
        let Some(limit) = cli
            .max_in_flight
            .or_else(|| toml.and_then(|t| t.delivery.max_in_flight))
        else {
            return Ok(None);
        };

        NonZeroUsize::new(limit)
            .map(Some)
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "max_in_flight",
                reason: "must be greater than 0".to_string(),
            })
    }

    fn resolve_reload_interval(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<Option<Duration>, ConfigError> {
        let Some(seconds) = toml.and_then(|t| t.reload.interval_secs) else {
            return Ok(None);
        };

        if seconds == 0 {
            return Err(ConfigError::InvalidDuration {
                field: "reload.interval_secs",
                reason: "must be greater than 0".to_string(),
            });
        }

        // Reload only makes sense with a file to reload from.
        Ok(cli.config.as_ref().map(|_| Duration::from_secs(seconds)))
    }

    fn build_retry_policy(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<RetryPolicy, ConfigError> {
        let delivery = toml.map(|t| &t.delivery);

        let base_ms = delivery
            .and_then(|d| d.backoff_base_ms)
            .unwrap_or(defaults::BACKOFF_BASE_MS);

        let max_ms = delivery
            .and_then(|d| d.max_backoff_ms)
            .unwrap_or(defaults::MAX_BACKOFF_MS);

        let multiplier = delivery
            .and_then(|d| d.backoff_multiplier)
            .unwrap_or(defaults::BACKOFF_MULTIPLIER);

        // Priority: CLI explicit > TOML > default
        let retry_on = cli
            .retry_on
            .map(RetryOn::from)
            .or_else(|| delivery.and_then(|d| d.retry_on))
            .unwrap_or_default();

        if base_ms == 0 {
            return Err(ConfigError::InvalidRetry(
                "backoff_base_ms must be greater than 0".to_string(),
            ));
        }

        if multiplier <= 0.0 || !multiplier.is_finite() {
            return Err(ConfigError::InvalidRetry(
                "backoff_multiplier must be a positive finite number".to_string(),
            ));
        }

        if max_ms < base_ms {
            return Err(ConfigError::InvalidRetry(format!(
                "max_backoff_ms ({max_ms}) must be >= backoff_base_ms ({base_ms})"
            )));
        }

        Ok(RetryPolicy::new()
            .with_initial_delay(Duration::from_millis(base_ms))
            .with_max_delay(Duration::from_millis(max_ms))
            .with_multiplier(multiplier)
            .with_retry_on(retry_on))
    }
}

/// Reads and validates only the webhook definitions from a config file.
///
/// Used to pick up edits to a running hub's config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or a definition is invalid.
pub fn load_webhooks(path: &Path) -> Result<Vec<WebhookDefinition>, ConfigError> {
    let toml = TomlConfig::load(path)?;
    build_webhooks(&toml.webhooks)
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

fn build_webhooks(entries: &[WebhookEntry]) -> Result<Vec<WebhookDefinition>, ConfigError> {
    let mut seen = HashSet::new();
    let mut webhooks = Vec::with_capacity(entries.len());

    for entry in entries {
        if entry.id.trim().is_empty() {
            return Err(ConfigError::webhook(&entry.id, "id must not be empty"));
        }
        if !seen.insert(entry.id.as_str()) {
            return Err(ConfigError::webhook(&entry.id, "duplicate id"));
        }

        let webhook = match entry.direction {
            Direction::Outbound => build_outbound(entry)?,
            Direction::Inbound => build_inbound(entry)?,
        };
        webhooks.push(apply_common(webhook, entry)?);
    }

    Ok(webhooks)
}

fn build_outbound(entry: &WebhookEntry) -> Result<WebhookDefinition, ConfigError> {
    let url_str = entry
        .url
        .as_deref()
        .ok_or_else(|| ConfigError::webhook(&entry.id, "outbound webhook requires a url"))?;
    let url = Url::parse(url_str).map_err(|e| ConfigError::InvalidUrl {
        url: url_str.to_string(),
        reason: e.to_string(),
    })?;

    if entry.events.is_empty() {
        return Err(ConfigError::webhook(
            &entry.id,
            "outbound webhook must subscribe to at least one event",
        ));
    }
    if entry.target_collection.is_some() {
        return Err(ConfigError::webhook(
            &entry.id,
            "target_collection applies to inbound webhooks only",
        ));
    }

    let method_str = entry.method.as_deref().unwrap_or(defaults::METHOD);
    let method = method_str
        .parse::<Method>()
        .map_err(|_| ConfigError::InvalidMethod(method_str.to_string()))?;

    let mut webhook = WebhookDefinition::outbound(&entry.id, url)
        .with_method(method)
        .with_events(entry.events.iter().map(String::as_str));

    for (name, value) in &entry.headers {
        webhook = webhook.with_header(parse_header_name(name)?, parse_header_value(name, value)?);
    }

    Ok(webhook)
}

fn build_inbound(entry: &WebhookEntry) -> Result<WebhookDefinition, ConfigError> {
    let outbound_only = [
        ("url", entry.url.is_some()),
        ("method", entry.method.is_some()),
        ("events", !entry.events.is_empty()),
        ("headers", !entry.headers.is_empty()),
    ];
    if let Some((field, _)) = outbound_only.iter().find(|(_, set)| *set) {
        return Err(ConfigError::webhook(
            &entry.id,
            format!("{field} applies to outbound webhooks only"),
        ));
    }

    let mut webhook = WebhookDefinition::inbound(&entry.id);
    if let Some(collection) = &entry.target_collection {
        webhook = webhook.with_target_collection(collection);
    }
    Ok(webhook)
}

fn apply_common(
    mut webhook: WebhookDefinition,
    entry: &WebhookEntry,
) -> Result<WebhookDefinition, ConfigError> {
    let timeout_ms = entry.timeout_ms.unwrap_or(defaults::TIMEOUT_MS);
    if timeout_ms == 0 {
        return Err(ConfigError::InvalidDuration {
            field: "timeout_ms",
            reason: format!("webhook '{}': must be greater than 0", entry.id),
        });
    }

    if let Some(name) = &entry.name {
        webhook = webhook.with_name(name);
    }
    if let Some(secret) = &entry.secret {
        if secret.is_empty() {
            return Err(ConfigError::webhook(&entry.id, "secret must not be empty"));
        }
        webhook = webhook.with_secret(secret);
    }

    Ok(webhook
        .with_max_retries(entry.max_retries.unwrap_or(defaults::MAX_RETRIES))
        .with_timeout(Duration::from_millis(timeout_ms))
        .with_enabled(entry.enabled.unwrap_or(true)))
}

/// Expands a leading `~` to the user's home directory.
fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };

    dirs::home_dir().map_or_else(|| path.to_path_buf(), |home| home.join(rest))
}

fn parse_header_name(name: &str) -> Result<HeaderName, ConfigError> {
    name.parse::<HeaderName>()
        .map_err(|e| ConfigError::InvalidHeaderName {
            name: name.to_string(),
            reason: e.to_string(),
        })
}

fn parse_header_value(name: &str, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeaderValue {
        name: name.to_string(),
        reason: e.to_string(),
    })
}
