//! Persistence for the content graph.
//!
//! The graph itself is always in memory; [`DurableStore`] keeps a redb copy
//! of it that [`crate::engine::Engine::persist`] refreshes and
//! [`crate::engine::Engine::new`] reloads.

pub mod durable;

pub use durable::DurableStore;

use crate::error::StoreError;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
