//! Webhook wire layer shared by the outbound and inbound paths.
//!
//! This module provides types and traits for:
//! - Building HTTP requests ([`HttpRequest`])
//! - Handling HTTP responses ([`HttpResponse`])
//! - Abstracting HTTP clients ([`HttpClient`])
//! - Production HTTP client implementation ([`ReqwestClient`])
//! - Backoff and retry classification ([`RetryPolicy`], [`RetryOn`], [`IsRetryable`])
//! - HMAC-SHA256 signing and verification ([`signature`])

mod client;
mod error;
mod request;
mod retry;
pub mod signature;

#[cfg(test)]
mod request_tests;
#[cfg(test)]
mod retry_tests;
#[cfg(test)]
mod signature_tests;

pub use client::ReqwestClient;
pub use error::{AttemptError, HttpError};
pub use request::{HttpClient, HttpRequest, HttpResponse};
pub use retry::{IsRetryable, RetryOn, RetryPolicy};
