//! Collaborators the hub reads from and writes to.
//!
//! This module provides:
//! - The webhook configuration store ([`ConfigStore`], [`MemoryConfigStore`])
//! - The target record store for inbound payloads ([`RecordStore`], [`MemoryRecordStore`])
//! - The record-change event stream ([`EventBus`])

mod config;
mod events;
mod records;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

pub use config::{ConfigStore, MemoryConfigStore};
pub use events::EventBus;
pub use records::{MemoryRecordStore, Record, RecordError, RecordStore};
