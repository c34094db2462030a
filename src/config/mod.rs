//! Configuration layer for the webhook hub.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Configuration values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - Values explicitly passed via command line
//! 2. **TOML config file** - Values from the configuration file
//! 3. **Built-in defaults** - Hardcoded default values
//!
//! # CLI-Only vs TOML-Only Options
//!
//! Webhook definitions and the backoff shape (`backoff_base_ms`,
//! `backoff_multiplier`, `max_backoff_ms`) are TOML-only. Without a config
//! file the hub starts with no webhooks.
//!
//! # Reloading
//!
//! With `[reload] interval_secs` set, only the `[[webhooks]]` list is
//! re-read at runtime ([`load_webhooks`]); every other setting needs a restart.

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;

#[cfg(test)]
mod cli_tests;
#[cfg(test)]
mod toml_tests;

pub use cli::{Cli, Command, RetryOnArg};
pub use error::ConfigError;
pub use toml::{TomlConfig, WebhookEntry, default_config_template};
pub use validated::{ValidatedConfig, load_webhooks, write_default_config};
