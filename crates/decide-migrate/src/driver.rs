//! Migration driver: one pass over one collection.
//!
//! # Pass lifecycle
//!
//! ```text
//! drop indexes --> open snapshot cursor --> for each document:
//!                                             transform
//!                                             save if changed
//!                                           --> cursor exhausted
//! ```
//!
//! Index recreation is not part of a pass; it is the separate
//! `configure-indexes` command. A document that cannot be transformed or
//! saved is logged with its `_id` and counted, and the pass moves on. Only
//! a failure to drop indexes or a broken cursor stops a pass, because a
//! cursor cannot be resumed at a defined position.

use bson::Document;
use chrono::{DateTime, Utc};
use decide_db::{DbError, DocumentStore, display_id};
use decide_types::UuidEncoding;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::collection::TargetCollection;
use crate::error::MigrationError;
use crate::transform::{TransformProfile, transform};

/// Log progress every this many scanned documents.
const PROGRESS_INTERVAL: u64 = 10_000;

/// Per-collection counts for one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassReport {
    /// Collection the pass ran over.
    pub collection: String,
    /// Documents read from the cursor.
    pub scanned: u64,
    /// Documents rewritten and saved.
    pub transformed: u64,
    /// Documents needing no rewrite, or whose fields could not be rewritten.
    pub unchanged: u64,
    /// Documents that produced at least one warning.
    pub warned: u64,
    /// Documents rewritten but rejected by the store.
    pub persist_failed: u64,
    /// Whether the cursor was exhausted.
    pub completed: bool,
    /// When the cursor was opened.
    pub started_at: DateTime<Utc>,
    /// When the pass ended, successfully or not.
    pub finished_at: DateTime<Utc>,
}

impl PassReport {
    fn start(collection: &str) -> Self {
        let now = Utc::now();
        Self {
            collection: collection.to_owned(),
            scanned: 0,
            transformed: 0,
            unchanged: 0,
            warned: 0,
            persist_failed: 0,
            completed: false,
            started_at: now,
            finished_at: now,
        }
    }

    fn finish(&mut self, completed: bool) {
        self.completed = completed;
        self.finished_at = Utc::now();
    }

    fn log_summary(&self) {
        info!(
            collection = self.collection,
            scanned = self.scanned,
            transformed = self.transformed,
            unchanged = self.unchanged,
            warned = self.warned,
            persist_failed = self.persist_failed,
            completed = self.completed,
            elapsed_ms = self
                .finished_at
                .signed_duration_since(self.started_at)
                .num_milliseconds(),
            "Migration pass finished"
        );
    }
}

fn bump(counter: &mut u64) {
    *counter = counter.saturating_add(1);
}

/// Runs migration passes against one store.
pub struct MigrationDriver<'a> {
    store: &'a DocumentStore,
}

impl<'a> MigrationDriver<'a> {
    /// Create a driver over an open store. The caller owns the store's lifecycle.
    pub const fn new(store: &'a DocumentStore) -> Self {
        Self { store }
    }

    /// Migrate one of the known collections.
    ///
    /// # Errors
    ///
    /// See [`MigrationDriver::run`].
    pub async fn run_target(
        &self,
        target: TargetCollection,
        encoding: UuidEncoding,
    ) -> Result<PassReport, MigrationError> {
        self.run(target.name(), &target.profile(encoding)).await
    }

    /// Migrate several collections, one pass each.
    ///
    /// Passes share nothing but the store, so with `concurrent` set they
    /// are driven together; each pass still uses a single cursor. A failed
    /// pass does not prevent the others from running.
    pub async fn run_all(
        &self,
        targets: &[TargetCollection],
        encoding: UuidEncoding,
        concurrent: bool,
    ) -> Vec<Result<PassReport, MigrationError>> {
        if concurrent {
            let passes = targets.iter().map(|target| self.run_target(*target, encoding));
            return futures::future::join_all(passes).await;
        }

        let mut results = Vec::with_capacity(targets.len());
        for target in targets {
            results.push(self.run_target(*target, encoding).await);
        }
        results
    }

    /// Run one full pass of `profile` over `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::Prepare`] if indexes cannot be dropped, and
    /// [`MigrationError::Iteration`] if the cursor cannot be opened or breaks.
    /// Per-document failures are counted in the report, never returned.
    pub async fn run(
        &self,
        collection: &str,
        profile: &TransformProfile,
    ) -> Result<PassReport, MigrationError> {
        self.store
            .drop_indexes(collection)
            .await
            .map_err(|source| MigrationError::Prepare {
                collection: collection.to_owned(),
                source,
            })?;
        info!(collection, backend = self.store.backend(), "Indexes dropped, starting pass");

        let mut report = PassReport::start(collection);
        let mut cursor = match self.store.snapshot(collection).await {
            Ok(cursor) => cursor,
            Err(source) => return Err(abort(report, source)),
        };

        loop {
            let document = match cursor.next_document().await {
                Ok(Some(document)) => document,
                Ok(None) => break,
                Err(source) => return Err(abort(report, source)),
            };
            bump(&mut report.scanned);
            self.migrate_document(collection, profile, document, &mut report)
                .await;

            if report.scanned.checked_rem(PROGRESS_INTERVAL) == Some(0) {
                info!(
                    collection,
                    scanned = report.scanned,
                    transformed = report.transformed,
                    "Migration progress"
                );
            }
        }

        report.finish(true);
        report.log_summary();
        Ok(report)
    }

    async fn migrate_document(
        &self,
        collection: &str,
        profile: &TransformProfile,
        document: Document,
        report: &mut PassReport,
    ) {
        let transformed = match transform(document, profile) {
            Ok(transformed) => transformed,
            Err(e) => {
                warn!(collection, error = %e, "Skipping document that cannot be transformed");
                bump(&mut report.unchanged);
                return;
            }
        };

        if !transformed.warnings.is_empty() {
            bump(&mut report.warned);
        }
        for warning in &transformed.warnings {
            warn!(
                collection,
                id = %warning.id,
                field = warning.field,
                reason = %warning.reason,
                "Unable to split field, left unchanged"
            );
        }

        if !transformed.changed {
            bump(&mut report.unchanged);
            return;
        }

        match self.store.save(collection, &transformed.document).await {
            Ok(()) => {
                debug!(
                    collection,
                    id = display_id(transformed.document.get("_id")),
                    "Document migrated"
                );
                bump(&mut report.transformed);
            }
            Err(e) => {
                warn!(
                    collection,
                    id = display_id(transformed.document.get("_id")),
                    error = %e,
                    "Failed to save document, skipping"
                );
                bump(&mut report.persist_failed);
            }
        }
    }
}

fn abort(mut report: PassReport, source: DbError) -> MigrationError {
    report.finish(false);
    report.log_summary();
    MigrationError::Iteration {
        collection: report.collection.clone(),
        report: Box::new(report),
        source,
    }
}
