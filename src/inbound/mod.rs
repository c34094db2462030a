//! Inbound webhooks.
//!
//! External systems push JSON to `POST /webhooks/receive/{webhook_id}`.
//! [`InboundReceiver`] checks the webhook exists and is enabled, verifies the
//! optional HMAC signature, writes the payload into the webhook's target
//! collection and logs the attempt. [`server`] exposes it over axum.

mod receiver;
pub mod server;


pub use receiver::{InboundReceiver, InboundResponse};
