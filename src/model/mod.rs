//! Core data model shared by the outbound and inbound paths.
//!
//! This module provides:
//! - Webhook configuration ([`WebhookDefinition`], [`Direction`])
//! - Internal data-change events ([`Event`], [`RecordEventKind`])
//! - Delivery log records ([`DeliveryLogEntry`], [`Outcome`])

mod definition;
mod entry;
mod event;

#[cfg(test)]
mod event_tests;

pub use definition::{Direction, WebhookDefinition};
pub use entry::{DeliveryLogEntry, INBOUND_EVENT, Outcome};
pub use event::{Event, RecordEventKind, record_event_name};
