//! Integration tests for the `decide-db` data layer.
//!
//! These tests require a live `MongoDB` instance. Run with:
//!
//! ```bash
//! docker run -d --rm -p 27017:27017 mongo:7
//! cargo test -p decide-db -- --ignored
//! ```
//!
//! All tests are marked `#[ignore]` so they are skipped during normal
//! `cargo test` runs. Each test uses its own throwaway database.

// Integration tests use expect/unwrap extensively for clarity -- panicking
// on failure is the correct behavior in test code.
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::missing_panics_doc)]

use bson::doc;
use decide_db::{DocumentStore, MongoConfig, create_indexes, post_migration_indexes};

/// `MongoDB` connection string for the local Docker instance.
const MONGODB_URI: &str = "mongodb://localhost:27017";

async fn connect(database: &str) -> DocumentStore {
    let config = MongoConfig::new(MONGODB_URI).with_database(database);
    DocumentStore::connect(&config)
        .await
        .expect("Failed to connect to MongoDB -- is Docker running?")
}

#[tokio::test]
#[ignore = "requires live MongoDB instance"]
async fn save_is_an_upsert_by_id() {
    let store = connect("decide_test_save").await;

    store
        .save("events", &doc! { "_id": 1, "addr": "dev1.temp" })
        .await
        .expect("insert via upsert");
    store
        .save("events", &doc! { "_id": 1, "addr": "dev1", "name": "temp" })
        .await
        .expect("replace");

    let mut cursor = store.snapshot("events").await.expect("snapshot");
    let first = cursor.next_document().await.expect("cursor").expect("one doc");
    assert_eq!(first, doc! { "_id": 1, "addr": "dev1", "name": "temp" });
    assert!(cursor.next_document().await.expect("cursor").is_none());

    store.close().await;
}

#[tokio::test]
#[ignore = "requires live MongoDB instance"]
async fn drop_indexes_on_missing_collection_is_ok() {
    let store = connect("decide_test_missing").await;
    store
        .drop_indexes("never_created")
        .await
        .expect("dropping on a missing namespace succeeds");
    store.close().await;
}

#[tokio::test]
#[ignore = "requires live MongoDB instance"]
async fn index_set_round_trip() {
    let store = connect("decide_test_indexes").await;
    // Collections must exist before indexes can be listed.
    for collection in ["events", "trials", "subjects", "controllers"] {
        store
            .save(collection, &doc! { "_id": 0 })
            .await
            .expect("seed");
    }

    create_indexes(&store, &post_migration_indexes())
        .await
        .expect("create indexes");
    let trials = store.list_indexes("trials").await.expect("list");
    assert!(trials.contains(&doc! { "subject": 1, "experiment": 1, "trial": 1 }));

    store.drop_indexes("trials").await.expect("drop");
    let remaining = store.list_indexes("trials").await.expect("list");
    assert_eq!(remaining, vec![doc! { "_id": 1 }]);

    store.close().await;
}
