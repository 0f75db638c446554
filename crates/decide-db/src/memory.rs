//! In-process document store.
//!
//! Behaves like a single `MongoDB` database for the operations the migration
//! needs. Snapshots copy the collection when the cursor opens, so writes made
//! during iteration are never observed by that cursor. Writes can be made to
//! fail on demand, which is how the driver's failure handling is exercised.

use std::collections::BTreeMap;
use std::sync::Arc;

use bson::{Bson, Document};
use tokio::sync::Mutex;

use crate::error::DbError;

#[derive(Debug, Default)]
struct MemoryCollection {
    documents: Vec<Document>,
    indexes: Vec<Document>,
}

#[derive(Debug, Default)]
struct MemoryState {
    collections: BTreeMap<String, MemoryCollection>,
    rejected_ids: Vec<Bson>,
    break_cursors_after: Option<usize>,
}

/// Shared in-memory store. Clones refer to the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append documents to a collection without any identity checks.
    pub async fn insert_many(
        &self,
        collection: &str,
        documents: impl IntoIterator<Item = Document>,
    ) {
        let mut state = self.state.lock().await;
        state
            .collections
            .entry(collection.to_owned())
            .or_default()
            .documents
            .extend(documents);
    }

    /// Current contents of a collection, in storage order.
    pub async fn documents(&self, collection: &str) -> Vec<Document> {
        let state = self.state.lock().await;
        state
            .collections
            .get(collection)
            .map(|c| c.documents.clone())
            .unwrap_or_default()
    }

    /// Make every future save of a document with this `_id` fail.
    pub async fn reject_saves_for(&self, id: impl Into<Bson>) {
        self.state.lock().await.rejected_ids.push(id.into());
    }

    /// Make cursors opened from now on fail after yielding `count` documents.
    pub async fn break_cursors_after(&self, count: usize) {
        self.state.lock().await.break_cursors_after = Some(count);
    }

    /// Drop every index on a collection.
    pub async fn drop_indexes(&self, collection: &str) -> Result<(), DbError> {
        let mut state = self.state.lock().await;
        if let Some(c) = state.collections.get_mut(collection) {
            c.indexes.clear();
        }
        Ok(())
    }

    /// Copy the collection and return a cursor over the copy.
    pub async fn snapshot(&self, collection: &str) -> Result<MemoryCursor, DbError> {
        let state = self.state.lock().await;
        let documents = state
            .collections
            .get(collection)
            .map(|c| c.documents.clone())
            .unwrap_or_default();
        Ok(MemoryCursor {
            collection: collection.to_owned(),
            documents: documents.into_iter(),
            yielded: 0,
            break_after: state.break_cursors_after,
        })
    }

    /// Replace the document with the same `_id`, appending it if absent.
    pub async fn save(&self, collection: &str, document: &Document) -> Result<(), DbError> {
        let id = document.get("_id").ok_or(DbError::MissingId)?;
        let mut state = self.state.lock().await;
        if state.rejected_ids.contains(id) {
            return Err(DbError::Rejected {
                collection: collection.to_owned(),
                id: id.to_string(),
            });
        }

        let documents = &mut state
            .collections
            .entry(collection.to_owned())
            .or_default()
            .documents;
        match documents.iter_mut().find(|d| d.get("_id") == Some(id)) {
            Some(existing) => existing.clone_from(document),
            None => documents.push(document.clone()),
        }
        Ok(())
    }

    /// Record an index; returns a name in the server's `field_dir` style.
    pub async fn create_index(&self, collection: &str, keys: Document) -> Result<String, DbError> {
        let name = keys
            .iter()
            .map(|(field, dir)| format!("{field}_{dir}"))
            .collect::<Vec<_>>()
            .join("_");
        let mut state = self.state.lock().await;
        let indexes = &mut state
            .collections
            .entry(collection.to_owned())
            .or_default()
            .indexes;
        if !indexes.contains(&keys) {
            indexes.push(keys);
        }
        Ok(name)
    }

    /// Key specifications of every recorded index on a collection.
    pub async fn list_indexes(&self, collection: &str) -> Result<Vec<Document>, DbError> {
        let state = self.state.lock().await;
        Ok(state
            .collections
            .get(collection)
            .map(|c| c.indexes.clone())
            .unwrap_or_default())
    }
}

/// Cursor over a copied collection.
#[derive(Debug)]
pub struct MemoryCursor {
    collection: String,
    documents: std::vec::IntoIter<Document>,
    yielded: usize,
    break_after: Option<usize>,
}

impl MemoryCursor {
    /// Yield the next document from the copy.
    pub fn next_document(&mut self) -> Result<Option<Document>, DbError> {
        if self.break_after.is_some_and(|limit| self.yielded >= limit) {
            return Err(DbError::CursorBroken {
                collection: self.collection.clone(),
                yielded: self.yielded,
            });
        }
        let next = self.documents.next();
        if next.is_some() {
            self.yielded = self.yielded.saturating_add(1);
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;

    #[tokio::test]
    async fn save_replaces_by_id() {
        let store = MemoryStore::new();
        store
            .insert_many("events", [doc! { "_id": 1, "addr": "a.b" }, doc! { "_id": 2 }])
            .await;

        store
            .save("events", &doc! { "_id": 1, "addr": "a", "name": "b" })
            .await
            .unwrap();
        store.save("events", &doc! { "_id": 3 }).await.unwrap();

        let docs = store.documents("events").await;
        assert_eq!(
            docs,
            vec![
                doc! { "_id": 1, "addr": "a", "name": "b" },
                doc! { "_id": 2 },
                doc! { "_id": 3 },
            ]
        );
    }

    #[tokio::test]
    async fn snapshot_ignores_later_writes() {
        let store = MemoryStore::new();
        store.insert_many("events", [doc! { "_id": 1 }]).await;

        let mut cursor = store.snapshot("events").await.unwrap();
        store.save("events", &doc! { "_id": 2 }).await.unwrap();

        assert_eq!(cursor.next_document().unwrap(), Some(doc! { "_id": 1 }));
        assert_eq!(cursor.next_document().unwrap(), None);
    }

    #[tokio::test]
    async fn rejected_saves_fail() {
        let store = MemoryStore::new();
        store.reject_saves_for(7).await;
        let err = store.save("trials", &doc! { "_id": 7 }).await.unwrap_err();
        assert!(matches!(err, DbError::Rejected { .. }));
        assert!(store.documents("trials").await.is_empty());
    }

    #[tokio::test]
    async fn save_without_id_fails() {
        let store = MemoryStore::new();
        let err = store.save("events", &doc! { "addr": "x" }).await.unwrap_err();
        assert!(matches!(err, DbError::MissingId));
    }

    #[tokio::test]
    async fn broken_cursor_reports_progress() {
        let store = MemoryStore::new();
        store
            .insert_many("events", [doc! { "_id": 1 }, doc! { "_id": 2 }])
            .await;
        store.break_cursors_after(1).await;

        let mut cursor = store.snapshot("events").await.unwrap();
        assert!(cursor.next_document().unwrap().is_some());
        let err = cursor.next_document().unwrap_err();
        assert!(matches!(err, DbError::CursorBroken { yielded: 1, .. }));
    }

    #[tokio::test]
    async fn indexes_are_recorded_and_dropped() {
        let store = MemoryStore::new();
        let name = store
            .create_index("events", doc! { "addr": 1, "name": 1 })
            .await
            .unwrap();
        assert_eq!(name, "addr_1_name_1");
        store
            .create_index("events", doc! { "addr": 1, "name": 1 })
            .await
            .unwrap();
        assert_eq!(store.list_indexes("events").await.unwrap().len(), 1);

        store.drop_indexes("events").await.unwrap();
        assert!(store.list_indexes("events").await.unwrap().is_empty());
    }
}
