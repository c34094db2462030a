//! Tests for `RetryPolicy` and retry classification.

use std::time::Duration;

use super::{AttemptError, HttpError, IsRetryable, RetryOn, RetryPolicy};

fn status_error(code: u16) -> AttemptError {
    AttemptError::NonSuccessStatus {
        status: http::StatusCode::from_u16(code).unwrap(),
        body: None,
    }
}

mod retry_policy_defaults {
    use super::*;

    #[test]
    fn new_creates_policy_with_defaults() {
        let policy = RetryPolicy::new();

        assert_eq!(policy.initial_delay, Duration::from_millis(1000));
        assert_eq!(policy.max_delay, RetryPolicy::DEFAULT_MAX_DELAY);
        assert!((policy.multiplier - 2.0).abs() < f64::EPSILON);
        assert_eq!(policy.retry_on, RetryOn::Any);
    }

    #[test]
    fn default_trait_matches_new() {
        assert_eq!(RetryPolicy::new(), RetryPolicy::default());
    }

    #[test]
    fn retry_on_deserializes_lowercase() {
        #[derive(serde::Deserialize)]
        struct Wrapper {
            mode: RetryOn,
        }

        let any: Wrapper = toml::from_str(r#"mode = "any""#).unwrap();
        let transient: Wrapper = toml::from_str(r#"mode = "transient""#).unwrap();

        assert_eq!(any.mode, RetryOn::Any);
        assert_eq!(transient.mode, RetryOn::Transient);
    }
}

mod retry_policy_builder {
    use super::*;

    #[test]
    #[should_panic(expected = "multiplier must be positive")]
    fn with_multiplier_zero_panics() {
        let _ = RetryPolicy::new().with_multiplier(0.0);
    }

    #[test]
    fn builder_chains_correctly() {
        let policy = RetryPolicy::new()
            .with_initial_delay(Duration::from_millis(500))
            .with_max_delay(Duration::from_secs(30))
            .with_multiplier(3.0)
            .with_retry_on(RetryOn::Transient);

        assert_eq!(policy.initial_delay, Duration::from_millis(500));
        assert_eq!(policy.max_delay, Duration::from_secs(30));
        assert!((policy.multiplier - 3.0).abs() < f64::EPSILON);
        assert_eq!(policy.retry_on, RetryOn::Transient);
    }
}

mod delay_for_retry {
    use super::*;

    #[test]
    fn default_schedule_doubles_from_one_second() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_for_retry(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_retry(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for_retry(2), Duration::from_millis(4000));
        assert_eq!(policy.delay_for_retry(3), Duration::from_millis(8000));
    }

    #[test]
    fn delay_is_capped_at_max() {
        let policy = RetryPolicy::new()
            .with_initial_delay(Duration::from_secs(10))
            .with_max_delay(Duration::from_secs(30));

        // 10 * 2^2 = 40 -> capped at 30
        assert_eq!(policy.delay_for_retry(2), Duration::from_secs(30));
    }

    #[test]
    fn huge_attempt_number_stays_capped() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_for_retry(u32::MAX), RetryPolicy::DEFAULT_MAX_DELAY);
    }

    #[test]
    fn fractional_multiplier_works() {
        let policy = RetryPolicy::new()
            .with_initial_delay(Duration::from_secs(4))
            .with_multiplier(1.5);

        assert_eq!(policy.delay_for_retry(1), Duration::from_secs(6));
        assert_eq!(policy.delay_for_retry(2), Duration::from_secs(9));
    }
}

mod should_retry {
    use super::*;

    #[test]
    fn retries_until_attempt_reaches_max_retries() {
        let policy = RetryPolicy::default();
        let error = AttemptError::Http(HttpError::Timeout);

        assert!(policy.should_retry(0, 3, &error));
        assert!(policy.should_retry(2, 3, &error));
        assert!(!policy.should_retry(3, 3, &error));
        assert!(!policy.should_retry(4, 3, &error));
    }

    #[test]
    fn zero_max_retries_never_retries() {
        let policy = RetryPolicy::default();

        assert!(!policy.should_retry(0, 0, &status_error(500)));
    }

    #[test]
    fn any_mode_retries_client_errors() {
        let policy = RetryPolicy::default();

        assert!(policy.should_retry(0, 3, &status_error(400)));
        assert!(policy.should_retry(0, 3, &status_error(404)));
    }

    #[test]
    fn transient_mode_skips_client_errors() {
        let policy = RetryPolicy::new().with_retry_on(RetryOn::Transient);

        assert!(!policy.should_retry(0, 3, &status_error(400)));
        assert!(!policy.should_retry(0, 3, &status_error(404)));
        assert!(policy.should_retry(0, 3, &status_error(503)));
        assert!(policy.should_retry(0, 3, &AttemptError::Http(HttpError::Timeout)));
    }
}

mod is_retryable {
    use super::*;

    #[test]
    fn transport_errors_are_transient() {
        let refused: Box<dyn std::error::Error + Send + Sync> = "connection refused".into();

        assert!(HttpError::Timeout.is_retryable());
        assert!(HttpError::Connection(refused).is_retryable());
        assert!(!HttpError::InvalidUrl("no url".to_string()).is_retryable());
    }

    #[test]
    fn throttling_and_server_errors_are_transient() {
        assert!(status_error(500).is_retryable());
        assert!(status_error(502).is_retryable());
        assert!(status_error(429).is_retryable());
        assert!(status_error(408).is_retryable());
        assert!(!status_error(400).is_retryable());
        assert!(!status_error(401).is_retryable());
    }

    #[test]
    fn encode_errors_are_permanent() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();

        assert!(!AttemptError::Encode(err).is_retryable());
    }
}
