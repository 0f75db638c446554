//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`] which wraps the underlying
//! [`mongodb`] errors with additional context about which operation failed.

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `MongoDB` operation failed.
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// A document passed to a save has no `_id`.
    #[error("document has no _id")]
    MissingId,

    /// The store refused a write.
    #[error("write rejected for {id} in {collection}")]
    Rejected {
        /// Collection the write targeted.
        collection: String,
        /// Primary key of the rejected document.
        id: String,
    },

    /// A snapshot cursor broke before it was exhausted.
    #[error("cursor over {collection} broke after {yielded} documents")]
    CursorBroken {
        /// Collection being iterated.
        collection: String,
        /// Documents yielded before the failure.
        yielded: usize,
    },

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
