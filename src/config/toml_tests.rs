//! Tests for TOML configuration parsing.

use std::path::PathBuf;

use super::ConfigError;
use super::toml::{TomlConfig, default_config_template};
use crate::model::Direction;
use crate::webhook::RetryOn;

mod parsing {
    use super::*;

    #[test]
    fn parse_empty_config() {
        let config = TomlConfig::parse("").unwrap();

        assert!(config.server.listen.is_none());
        assert!(config.delivery.max_in_flight.is_none());
        assert!(config.log.path.is_none());
        assert!(config.reload.interval_secs.is_none());
        assert!(config.webhooks.is_empty());
    }

    #[test]
    fn parse_settings_sections() {
        let toml = r#"
            [server]
            listen = "0.0.0.0:9000"
            max_body_bytes = 4096

            [delivery]
            max_in_flight = 8
            backoff_base_ms = 500
            backoff_multiplier = 3.0
            max_backoff_ms = 60000
            retry_on = "transient"

            [log]
            path = "/tmp/hub.jsonl"

            [reload]
            interval_secs = 5
        "#;

        let config = TomlConfig::parse(toml).unwrap();

        assert_eq!(config.server.listen.as_deref(), Some("0.0.0.0:9000"));
        assert_eq!(config.server.max_body_bytes, Some(4096));
        assert_eq!(config.delivery.max_in_flight, Some(8));
        assert_eq!(config.delivery.backoff_base_ms, Some(500));
        assert_eq!(config.delivery.backoff_multiplier, Some(3.0));
        assert_eq!(config.delivery.max_backoff_ms, Some(60000));
        assert_eq!(config.delivery.retry_on, Some(RetryOn::Transient));
        assert_eq!(config.log.path, Some(PathBuf::from("/tmp/hub.jsonl")));
        assert_eq!(config.reload.interval_secs, Some(5));
    }

    #[test]
    fn parse_webhook_entries() {
        let toml = r#"
            [[webhooks]]
            id = "crm"
            name = "CRM sync"
            direction = "outbound"
            url = "https://crm.example.com/hook"
            method = "PUT"
            events = ["orders.afterCreate", "orders.afterUpdate"]
            secret = "s3cret"
            max_retries = 5
            timeout_ms = 2000
            enabled = false

            [webhooks.headers]
            X-Api-Key = "abc"

            [[webhooks]]
            id = "leads"
            direction = "inbound"
            target_collection = "leads"
        "#;

        let config = TomlConfig::parse(toml).unwrap();
        assert_eq!(config.webhooks.len(), 2);

        let crm = &config.webhooks[0];
        assert_eq!(crm.id, "crm");
        assert_eq!(crm.name.as_deref(), Some("CRM sync"));
        assert_eq!(crm.direction, Direction::Outbound);
        assert_eq!(crm.events.len(), 2);
        assert_eq!(crm.max_retries, Some(5));
        assert_eq!(crm.timeout_ms, Some(2000));
        assert_eq!(crm.enabled, Some(false));
        assert_eq!(crm.headers.get("X-Api-Key").map(String::as_str), Some("abc"));

        let leads = &config.webhooks[1];
        assert_eq!(leads.direction, Direction::Inbound);
        assert_eq!(leads.target_collection.as_deref(), Some("leads"));
        assert!(leads.events.is_empty());
    }
}

mod errors {
    use super::*;

    #[test]
    fn unknown_section_is_rejected() {
        let result = TomlConfig::parse("[monitor]\npoll_interval = 60\n");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn unknown_webhook_field_is_rejected() {
        let toml = r#"
            [[webhooks]]
            id = "x"
            direction = "inbound"
            body_template = "nope"
        "#;
        assert!(TomlConfig::parse(toml).is_err());
    }

    #[test]
    fn unknown_direction_is_rejected() {
        let toml = r#"
            [[webhooks]]
            id = "x"
            direction = "sideways"
        "#;
        assert!(TomlConfig::parse(toml).is_err());
    }

    #[test]
    fn unknown_retry_on_is_rejected() {
        assert!(TomlConfig::parse("[delivery]\nretry_on = \"sometimes\"\n").is_err());
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = TomlConfig::load(&dir.path().join("absent.toml"));

        assert!(matches!(result, Err(ConfigError::FileRead { .. })));
    }
}

mod template {
    use super::*;

    #[test]
    fn default_template_parses() {
        let config = TomlConfig::parse(&default_config_template()).unwrap();

        assert!(config.webhooks.is_empty());
        assert!(config.server.listen.is_none());
    }

    #[test]
    fn template_documents_every_section() {
        let template = default_config_template();

        for section in ["[server]", "[delivery]", "[log]", "[reload]", "[[webhooks]]"] {
            assert!(template.contains(section), "missing {section}");
        }
    }
}
