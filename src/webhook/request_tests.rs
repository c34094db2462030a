//! Tests for `HttpRequest`, `HttpResponse` and `AttemptError`.

use std::time::Duration;

use super::{AttemptError, HttpError, HttpRequest, HttpResponse};

fn test_url() -> url::Url {
    url::Url::parse("https://example.com/webhook").unwrap()
}

mod http_request {
    use super::*;

    #[test]
    fn new_starts_empty() {
        let req = HttpRequest::new(http::Method::PUT, test_url());

        assert_eq!(req.method, http::Method::PUT);
        assert!(req.headers.is_empty());
        assert!(req.body.is_none());
        assert!(req.timeout.is_none());
    }

    #[test]
    fn post_sets_method() {
        assert_eq!(HttpRequest::post(test_url()).method, http::Method::POST);
    }

    #[test]
    fn with_header_replaces_value() {
        let req = HttpRequest::post(test_url())
            .with_header(
                http::header::CONTENT_TYPE,
                http::HeaderValue::from_static("text/plain"),
            )
            .with_header(
                http::header::CONTENT_TYPE,
                http::HeaderValue::from_static("application/json"),
            );

        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.header_str("content-type"), Some("application/json"));
    }

    #[test]
    fn with_body_and_timeout() {
        let req = HttpRequest::post(test_url())
            .with_body(b"{}".to_vec())
            .with_timeout(Duration::from_millis(250));

        assert_eq!(req.body.as_deref(), Some(b"{}".as_slice()));
        assert_eq!(req.timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn header_str_missing_is_none() {
        assert!(HttpRequest::post(test_url()).header_str("x-missing").is_none());
    }
}

mod http_response {
    use super::*;

    #[test]
    fn success_covers_2xx_only() {
        assert!(HttpResponse::status_only(http::StatusCode::OK).is_success());
        assert!(HttpResponse::status_only(http::StatusCode::NO_CONTENT).is_success());
        assert!(!HttpResponse::status_only(http::StatusCode::FOUND).is_success());
        assert!(!HttpResponse::status_only(http::StatusCode::BAD_GATEWAY).is_success());
    }

    #[test]
    fn body_text_rejects_invalid_utf8() {
        let resp = HttpResponse::new(
            http::StatusCode::OK,
            http::HeaderMap::new(),
            vec![0xff, 0xfe],
        );

        assert!(resp.body_text().is_none());
        assert_eq!(resp.body_lossy(), "\u{fffd}\u{fffd}");
    }
}

mod attempt_error {
    use super::*;

    #[test]
    fn status_is_reported_for_non_success() {
        let err = AttemptError::NonSuccessStatus {
            status: http::StatusCode::BAD_REQUEST,
            body: Some("bad".to_string()),
        };

        assert_eq!(err.status(), Some(http::StatusCode::BAD_REQUEST));
        assert_eq!(err.to_string(), "HTTP 400 Bad Request");
        assert!(!err.is_timeout());
    }

    #[test]
    fn timeout_is_detected() {
        let err = AttemptError::from(HttpError::Timeout);

        assert!(err.is_timeout());
        assert!(err.status().is_none());
        assert_eq!(err.to_string(), "Request timed out");
    }
}
