//! Migration of the `decide` database from schema 1.0 to 2.0.
//!
//! Two collections change shape. In `events` and `trials` the compound
//! `addr` field (`"<addr>.<name>"`) becomes separate `addr` and `name`
//! fields. In `trials` the `subject` string becomes a binary UUID.
//!
//! # Architecture
//!
//! ```text
//! DocumentStore --snapshot--> MigrationDriver --document--> transform()
//!       ^                            |                          |
//!       +-----------save-------------+<-------Transformed-------+
//! ```
//!
//! # Modules
//!
//! - [`transform`] -- per-document rewrite, never fails on a field
//! - [`driver`] -- one pass per collection with per-category counts
//! - [`collection`] -- the collections and their rewrite profiles
//! - [`config`] -- YAML configuration with environment overrides
//! - [`error`] -- Error types

pub mod collection;
pub mod config;
pub mod driver;
pub mod error;
pub mod transform;

pub use collection::TargetCollection;
pub use config::{ConfigError, MigrateConfig};
pub use driver::{MigrationDriver, PassReport};
pub use error::{MigrationError, TransformError};
pub use transform::{TransformProfile, TransformWarning, Transformed, UuidRecode, transform};
