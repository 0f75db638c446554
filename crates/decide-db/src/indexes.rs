//! The 2.0 index set.
//!
//! Indexes are dropped before a migration pass and recreated afterwards by
//! a separate invocation, so an operator can inspect the migrated data
//! before paying for the index builds.

use bson::Document;

use crate::error::DbError;
use crate::store::DocumentStore;

/// One index on one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    /// Target collection.
    pub collection: &'static str,
    /// Key specification, e.g. `{addr: 1, name: 1}`.
    pub keys: Document,
}

impl IndexSpec {
    fn ascending(collection: &'static str, fields: &[&str]) -> Self {
        let mut keys = Document::new();
        for field in fields {
            keys.insert(*field, 1_i32);
        }
        Self { collection, keys }
    }
}

/// Every index the 2.0 schema expects, all ascending.
pub fn post_migration_indexes() -> Vec<IndexSpec> {
    vec![
        IndexSpec::ascending("events", &["addr", "name"]),
        IndexSpec::ascending("events", &["addr", "time"]),
        IndexSpec::ascending("trials", &["addr", "name"]),
        IndexSpec::ascending("trials", &["addr", "time"]),
        IndexSpec::ascending("trials", &["subject", "experiment", "trial"]),
        IndexSpec::ascending("subjects", &["addr"]),
        IndexSpec::ascending("subjects", &["user"]),
        IndexSpec::ascending("subjects", &["procedure"]),
        IndexSpec::ascending("controllers", &["zmq-id"]),
        IndexSpec::ascending("controllers", &["addr"]),
    ]
}

/// Create every index in `specs`, stopping at the first failure.
///
/// Returns the names of the created indexes in order.
///
/// # Errors
///
/// Returns [`DbError`] from the first index the store rejects.
pub async fn create_indexes(
    store: &DocumentStore,
    specs: &[IndexSpec],
) -> Result<Vec<String>, DbError> {
    let mut names = Vec::with_capacity(specs.len());
    for index in specs {
        let name = store.create_index(index.collection, index.keys.clone()).await?;
        tracing::info!(collection = index.collection, index = name, "Index ensured");
        names.push(name);
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;
    use crate::memory::MemoryStore;

    #[test]
    fn index_set_matches_schema() {
        let specs = post_migration_indexes();
        assert_eq!(specs.len(), 10);
        assert!(specs.contains(&IndexSpec {
            collection: "trials",
            keys: doc! { "subject": 1, "experiment": 1, "trial": 1 },
        }));
        assert!(specs.contains(&IndexSpec {
            collection: "controllers",
            keys: doc! { "zmq-id": 1 },
        }));
    }

    #[tokio::test]
    async fn creates_every_index() {
        let memory = MemoryStore::new();
        let store = DocumentStore::from(memory.clone());

        let names = create_indexes(&store, &post_migration_indexes()).await.unwrap();
        assert_eq!(names.first().map(String::as_str), Some("addr_1_name_1"));
        assert_eq!(memory.list_indexes("events").await.unwrap().len(), 2);
        assert_eq!(memory.list_indexes("trials").await.unwrap().len(), 3);
        assert_eq!(memory.list_indexes("subjects").await.unwrap().len(), 3);
        assert_eq!(memory.list_indexes("controllers").await.unwrap().len(), 2);
    }
}
