//! Test helpers for service tests
//!
//! In-memory implementations of the store traits, a recording store
//! client and configurable usages; no database or object store needed.
//! Compiled into the crate so integration tests and downstream crates can
//! use them too.

pub mod fixtures;
pub mod memory_stores;
pub mod recording_store;
pub mod usages;

pub use fixtures::*;
pub use memory_stores::{MemoryClaimedStore, MemoryPendingStore};
pub use recording_store::RecordingStore;
pub use usages::{TestImageUsage, TestUsage};
