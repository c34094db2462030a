//! HTTP request/response types and client trait.

use std::time::Duration;

use super::HttpError;

/// An outbound HTTP request.
///
/// Built by the delivery engine from a webhook definition and handed to any
/// [`HttpClient`]. Uses `http` crate types for method and headers so the
/// engine is independent of the client library.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method
    pub method: http::Method,
    /// Target URL
    pub url: url::Url,
    /// Headers to send
    pub headers: http::HeaderMap,
    /// Request body, sent exactly as given
    pub body: Option<Vec<u8>>,
    /// Deadline for the whole exchange, if any
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Creates a request with no headers, body or deadline.
    #[must_use]
    pub fn new(method: http::Method, url: url::Url) -> Self {
        Self {
            method,
            url,
            headers: http::HeaderMap::new(),
            body: None,
            timeout: None,
        }
    }

    /// Creates a POST request to the given URL.
    #[must_use]
    pub fn post(url: url::Url) -> Self {
        Self::new(http::Method::POST, url)
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets a header, replacing any previous value under the same name.
    #[must_use]
    pub fn with_header(mut self, name: http::HeaderName, value: http::HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the request deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the value of a header as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: http::StatusCode,
    /// Response headers
    pub headers: http::HeaderMap,
    /// Response body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a new HTTP response.
    #[must_use]
    pub const fn new(status: http::StatusCode, headers: http::HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Creates a response with only a status code.
    #[must_use]
    pub fn status_only(status: http::StatusCode) -> Self {
        Self::new(status, http::HeaderMap::new(), Vec::new())
    }

    /// Returns true if the status code indicates success (2xx).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the body as a UTF-8 string, if valid.
    #[must_use]
    pub fn body_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Returns the body as text, replacing invalid UTF-8 sequences.
    #[must_use]
    pub fn body_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Trait for making HTTP requests.
///
/// # Design
///
/// The delivery engine only talks to this trait, so tests can script
/// responses, failures and slow endpoints without a network, and the
/// production client can be swapped without touching delivery logic.
///
/// # Example
///
/// ```ignore
/// use webhook_hub::webhook::{HttpClient, HttpRequest, HttpResponse, HttpError};
///
/// struct AlwaysOk;
///
/// impl HttpClient for AlwaysOk {
///     async fn request(&self, _req: HttpRequest) -> Result<HttpResponse, HttpError> {
///         Ok(HttpResponse::status_only(http::StatusCode::OK))
///     }
/// }
/// ```
pub trait HttpClient: Send + Sync {
    /// Sends an HTTP request and returns the buffered response.
    ///
    /// Any status code counts as a response; classifying non-2xx statuses is
    /// the caller's job.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] when:
    /// - Network connection fails ([`HttpError::Connection`])
    /// - The request deadline passes ([`HttpError::Timeout`])
    /// - The URL or request cannot be built ([`HttpError::InvalidUrl`])
    fn request(
        &self,
        req: HttpRequest,
    ) -> impl std::future::Future<Output = Result<HttpResponse, HttpError>> + Send;
}
