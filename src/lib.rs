//! Webhook Hub: signed webhook delivery in both directions.
//!
//! Outbound, record events published on an [`store::EventBus`] are fanned
//! out to every subscribed webhook as HMAC-signed HTTP requests, with
//! exponential backoff retries and one log entry per attempt. Inbound,
//! external systems push signed JSON to `POST /webhooks/receive/{id}`,
//! which is verified, turned into a record, and logged.

pub mod config;
pub mod delivery;
pub mod inbound;
pub mod log;
pub mod model;
pub mod store;
pub mod subscription;
pub mod time;
pub mod webhook;
