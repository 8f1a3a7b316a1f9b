//! # coverage-storage
//!
//! World-state abstraction for the coverage ledger.
//!
//! The ledger substrate offers a plain key/value interface ([`WorldState`]).
//! This crate layers the typed pieces on top of it:
//! - [`CompositeKey`]: collision-free `(type, id)` addressing
//! - [`ResourceStore`]: validated reads and writes of resources
//! - [`ReferenceResolver`]: `Type/id` references resolved through the store
//!
//! Backends live in separate crates.

mod error;
mod key;
mod resolver;
mod store;
mod traits;

pub use error::{ErrorCategory, StorageError};
pub use key::{CompositeKey, normalize_id};
pub use resolver::ReferenceResolver;
pub use store::ResourceStore;
pub use traits::WorldState;
