#![cfg(feature = "sqlite")]

mod common;

use common::settings;
use common::TEST_KEY;
use person_cache::prelude::*;
use person_cache::store::db::DbDurableStore;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

async fn sqlite_store(dir: &tempfile::TempDir) -> Arc<DbDurableStore> {
    let store = DbDurableStore::connect_sqlite(dir.path(), "people.db").await.unwrap();
    store.migrate().await.unwrap();
    Arc::new(store)
}

#[tokio::test]
async fn upsert_is_idempotent() {
    let dir = tempfile::Builder::new().prefix("person-cache-test").tempdir().unwrap();
    let store = sqlite_store(&dir).await;

    let person = Person::new("John Smith", 45);
    store.upsert(&person).await.unwrap();
    let once = store.find_by_id(&person.id()).await.unwrap().unwrap();

    store.upsert(&person).await.unwrap();
    let twice = store.find_by_id(&person.id()).await.unwrap().unwrap();

    assert_eq!(store.count().await.unwrap(), 1);
    assert!(once.same_content(&twice));
    assert!(twice.same_content(&person));
}

#[tokio::test]
async fn upsert_replaces_by_identity() {
    let dir = tempfile::Builder::new().prefix("person-cache-test").tempdir().unwrap();
    let store = sqlite_store(&dir).await;

    let person = Person::new("John Smith", 45);
    store.upsert(&person).await.unwrap();
    store.upsert(&Person::from_parts(person.id(), "John Smith", 46)).await.unwrap();

    assert_eq!(store.count().await.unwrap(), 1);
    assert_eq!(store.find_by_id(&person.id()).await.unwrap().unwrap().age(), 46);
    assert!(store.find_by_id(&Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn write_back_into_sqlite() {
    let dir = tempfile::Builder::new().prefix("person-cache-test").tempdir().unwrap();
    let store = sqlite_store(&dir).await;
    let cache = Arc::new(MemoryCacheStore::new(TEST_KEY));
    let service = CachedPersonService::new(Arc::clone(&cache), Arc::clone(&store));
    let job = WriteBackJob::for_service(&service, settings(Duration::from_secs(3600)));

    let mut people = vec![];
    for _ in 0..10 {
        people.push(service.create("John Smith".into(), 45).await.unwrap());
    }
    assert_eq!(store.count().await.unwrap(), 0);

    assert_eq!(job.run_once().await, WriteBackOutcome::Drained { persisted: 10 });
    assert_eq!(store.count().await.unwrap(), 10);
    assert_eq!(cache.staging_size().await.unwrap(), 0);

    // A cold cache is refilled from the database.
    let cold = people.first().unwrap();
    assert!(cache.evict(&cold.id()).await);
    let found = service.find_one(cold.id()).await.unwrap();
    assert!(found.same_content(cold));
    assert!(cache.is_staged(&cold.id()));

    // Re-persisting the rehydrated person changes nothing.
    assert_eq!(job.run_once().await, WriteBackOutcome::Drained { persisted: 1 });
    assert_eq!(store.count().await.unwrap(), 10);
}
