//! In-memory world-state backend for the coverage ledger.
//!
//! Values are kept in a `DashMap`, so reads and writes from concurrent
//! operations never block on a global lock. Conditional writes go through the
//! entry API and are atomic per key.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use coverage_db_memory::InMemoryWorldState;
//! use coverage_storage::ResourceStore;
//!
//! let store = ResourceStore::new(Arc::new(InMemoryWorldState::new()));
//! ```

pub mod snapshot;
pub mod state;

pub use coverage_storage::{StorageError, WorldState};
pub use state::InMemoryWorldState;

