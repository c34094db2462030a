//! Outbound delivery.
//!
//! [`DeliveryEngine`] turns events into signed HTTP requests for every
//! subscribed webhook and retries failures with exponential backoff.
//! Pending retries live in a [`RetryRegistry`] so they can be cancelled
//! when a webhook is removed or disabled, or when the hub shuts down.

mod engine;
mod registry;

#[cfg(test)]
mod registry_tests;

pub use engine::DeliveryEngine;
pub use registry::RetryRegistry;
