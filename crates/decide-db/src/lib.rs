//! Data layer for the `decide` schema migration.
//!
//! The migration needs four operations from a document store: drop the
//! indexes on a collection, iterate a collection once without re-visiting
//! documents rewritten during the pass, write a document back under its own
//! `_id`, and create indexes. [`DocumentStore`] provides them over a live
//! `MongoDB` database or an in-process store.
//!
//! # Modules
//!
//! - [`mongo`] -- `MongoDB` client configuration and operations
//! - [`memory`] -- in-process store with failure injection
//! - [`store`] -- [`DocumentStore`] and [`SnapshotCursor`] dispatch
//! - [`indexes`] -- the 2.0 index set
//! - [`error`] -- Shared error types

pub mod error;
pub mod indexes;
pub mod memory;
pub mod mongo;
pub mod store;

// Re-export primary types for convenience.
pub use error::DbError;
pub use indexes::{IndexSpec, create_indexes, post_migration_indexes};
pub use memory::{MemoryCursor, MemoryStore};
pub use mongo::{MongoConfig, MongoStore};
pub use store::{DocumentStore, SnapshotCursor, display_id};
