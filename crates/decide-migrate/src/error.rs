//! Error types for the migration.
//!
//! Field-level failures never reach these types; they are recovered inside
//! the transformer and reported as warnings. What remains is either a
//! single document that cannot be handled at all ([`TransformError`]) or a
//! pass that cannot continue ([`MigrationError`]).

use decide_db::DbError;
use decide_types::SchemaError;

use crate::driver::PassReport;

/// A document the transformer cannot process at all.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// The document does not have the minimal shape of a record.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
}

/// A migration pass that stopped before its cursor was exhausted.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Indexes could not be dropped; no document was visited.
    #[error("failed to drop indexes on {collection}: {source}")]
    Prepare {
        /// Collection being prepared.
        collection: String,
        /// The underlying store error.
        source: DbError,
    },

    /// The snapshot cursor failed; the pass must be re-run from the start.
    #[error("iteration over {collection} failed: {source}")]
    Iteration {
        /// Collection being iterated.
        collection: String,
        /// Counts accumulated before the failure.
        report: Box<PassReport>,
        /// The underlying store error.
        source: DbError,
    },
}

impl MigrationError {
    /// Counts accumulated before the failure, if any document was visited.
    pub fn report(&self) -> Option<&PassReport> {
        match self {
            Self::Prepare { .. } => None,
            Self::Iteration { report, .. } => Some(report.as_ref()),
        }
    }
}
