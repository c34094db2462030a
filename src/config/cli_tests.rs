//! Tests for CLI argument parsing.

use std::path::PathBuf;

use super::cli::{Cli, Command, RetryOnArg};
use crate::webhook::RetryOn;

mod parsing {
    use super::*;

    #[test]
    fn parse_no_args() {
        let cli = Cli::parse_from_iter(["webhook-hub"]);

        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
        assert!(cli.listen.is_none());
        assert!(cli.log_file.is_none());
        assert!(cli.max_in_flight.is_none());
        assert!(cli.retry_on.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn parse_all_options() {
        let cli = Cli::parse_from_iter([
            "webhook-hub",
            "--config",
            "hub.toml",
            "--listen",
            "0.0.0.0:9000",
            "--log-file",
            "/var/log/hub.jsonl",
            "--max-in-flight",
            "16",
            "--retry-on",
            "transient",
            "--verbose",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("hub.toml")));
        assert_eq!(cli.listen.as_deref(), Some("0.0.0.0:9000"));
        assert_eq!(cli.log_file, Some(PathBuf::from("/var/log/hub.jsonl")));
        assert_eq!(cli.max_in_flight, Some(16));
        assert_eq!(cli.retry_on, Some(RetryOnArg::Transient));
        assert!(cli.verbose);
    }

    #[test]
    fn parse_short_flags() {
        let cli = Cli::parse_from_iter(["webhook-hub", "-c", "hub.toml", "-v"]);

        assert_eq!(cli.config, Some(PathBuf::from("hub.toml")));
        assert!(cli.verbose);
    }

    #[test]
    fn invalid_retry_on_is_rejected() {
        let result = <Cli as clap::Parser>::try_parse_from(["webhook-hub", "--retry-on", "never"]);
        assert!(result.is_err());
    }

    #[test]
    fn non_numeric_max_in_flight_is_rejected() {
        let result =
            <Cli as clap::Parser>::try_parse_from(["webhook-hub", "--max-in-flight", "lots"]);
        assert!(result.is_err());
    }
}

mod init_command {
    use super::*;

    #[test]
    fn init_uses_default_output() {
        let cli = Cli::parse_from_iter(["webhook-hub", "init"]);

        assert!(cli.is_init());
        match cli.command {
            Some(Command::Init { output }) => {
                assert_eq!(output, PathBuf::from("webhook-hub.toml"));
            }
            None => panic!("expected init command"),
        }
    }

    #[test]
    fn init_with_custom_output() {
        let cli = Cli::parse_from_iter(["webhook-hub", "init", "--output", "custom.toml"]);

        match cli.command {
            Some(Command::Init { output }) => assert_eq!(output, PathBuf::from("custom.toml")),
            None => panic!("expected init command"),
        }
    }

    #[test]
    fn run_mode_is_not_init() {
        let cli = Cli::parse_from_iter(["webhook-hub", "-c", "hub.toml"]);
        assert!(!cli.is_init());
    }
}

mod conversion {
    use super::*;

    #[test]
    fn retry_on_arg_maps_to_policy_setting() {
        assert_eq!(RetryOn::from(RetryOnArg::Any), RetryOn::Any);
        assert_eq!(RetryOn::from(RetryOnArg::Transient), RetryOn::Transient);
    }
}
