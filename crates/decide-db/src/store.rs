//! The store handle the migration driver is built on.
//!
//! Uses enum dispatch instead of trait objects because async methods are
//! not dyn-compatible. Both backends expose the same four operations: drop
//! indexes, snapshot iteration, identity-preserving save, create index.

use bson::{Bson, Document};
use mongodb::Cursor;

use crate::error::DbError;
use crate::memory::{MemoryCursor, MemoryStore};
use crate::mongo::{self, MongoConfig, MongoStore};

/// A document store holding the `decide` collections.
#[derive(Clone)]
pub enum DocumentStore {
    /// A live `MongoDB` database.
    Mongo(MongoStore),
    /// An in-process store.
    Memory(MemoryStore),
}

impl DocumentStore {
    /// Open a `MongoDB`-backed store.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the connection cannot be established.
    pub async fn connect(config: &MongoConfig) -> Result<Self, DbError> {
        MongoStore::connect(config).await.map(Self::Mongo)
    }

    /// Human-readable backend name for logging.
    pub const fn backend(&self) -> &'static str {
        match self {
            Self::Mongo(_) => "mongodb",
            Self::Memory(_) => "memory",
        }
    }

    /// Drop all secondary indexes on a collection.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend rejects the command.
    pub async fn drop_indexes(&self, collection: &str) -> Result<(), DbError> {
        match self {
            Self::Mongo(store) => store.drop_indexes(collection).await,
            Self::Memory(store) => store.drop_indexes(collection).await,
        }
    }

    /// Open a cursor that visits every document present at open time once.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the cursor cannot be opened.
    pub async fn snapshot(&self, collection: &str) -> Result<SnapshotCursor, DbError> {
        match self {
            Self::Mongo(store) => store.snapshot(collection).await.map(SnapshotCursor::Mongo),
            Self::Memory(store) => store.snapshot(collection).await.map(SnapshotCursor::Memory),
        }
    }

    /// Write a document back under its own `_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the document has no `_id` or the write fails.
    pub async fn save(&self, collection: &str, document: &Document) -> Result<(), DbError> {
        match self {
            Self::Mongo(store) => store.save(collection, document).await,
            Self::Memory(store) => store.save(collection, document).await,
        }
    }

    /// Create an index and return its name.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend rejects the index.
    pub async fn create_index(&self, collection: &str, keys: Document) -> Result<String, DbError> {
        match self {
            Self::Mongo(store) => store.create_index(collection, keys).await,
            Self::Memory(store) => store.create_index(collection, keys).await,
        }
    }

    /// Key specifications of every index on a collection.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the listing fails.
    pub async fn list_indexes(&self, collection: &str) -> Result<Vec<Document>, DbError> {
        match self {
            Self::Mongo(store) => store.list_indexes(collection).await,
            Self::Memory(store) => store.list_indexes(collection).await,
        }
    }

    /// Release the connection. In-memory stores have nothing to release.
    pub async fn close(self) {
        match self {
            Self::Mongo(store) => store.close().await,
            Self::Memory(_) => {}
        }
    }
}

impl From<MemoryStore> for DocumentStore {
    fn from(store: MemoryStore) -> Self {
        Self::Memory(store)
    }
}

/// A cursor opened by [`DocumentStore::snapshot`].
pub enum SnapshotCursor {
    /// Server-side cursor.
    Mongo(Cursor<Document>),
    /// Cursor over an in-memory copy.
    Memory(MemoryCursor),
}

impl SnapshotCursor {
    /// Fetch the next document, or `None` once the cursor is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the cursor breaks. The cursor cannot be
    /// resumed afterwards.
    pub async fn next_document(&mut self) -> Result<Option<Document>, DbError> {
        match self {
            Self::Mongo(cursor) => mongo::next_document(cursor).await,
            Self::Memory(cursor) => cursor.next_document(),
        }
    }
}

/// Render a primary key for log lines and error messages.
pub fn display_id(id: Option<&Bson>) -> String {
    id.map_or_else(|| "<no _id>".to_owned(), ToString::to_string)
}
