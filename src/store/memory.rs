//! In-process backends. Good for tests, demos, and single-instance deployments where the "durable" store is somebody
//! else's problem.
use async_trait::async_trait;
use moka::future::Cache;
use parking_lot::Mutex;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::config::CacheSettings;
use crate::error::StoreError;
use crate::person::cache_key_of;
use crate::person::Person;
use crate::traits::CacheStore;
use crate::traits::DurableStore;
use crate::types::StagingScan;

type StagingSets = HashMap<String, HashMap<Uuid, Person>>;

/// Cache store over an unbounded [moka](https://crates.io/crates/moka) cache. Nothing is ever evicted unless
/// [`evict`](Self::evict) is called, and staged people are never evicted.
///
/// Staging collections live in a map of sets keyed by the collection name, like in a key/value server. An emptied
/// collection is dropped from the map. Clones share the same underlying storage.
#[derive(Clone)]
pub struct MemoryCacheStore {
    staging_key: String,
    values:      Cache<String, Person>,
    staging:     Arc<Mutex<StagingSets>>,
}

impl MemoryCacheStore {
    pub fn new<S: Into<String>>(staging_key: S) -> Self {
        Self {
            staging_key: staging_key.into(),
            values:      Cache::builder().name("person").build(),
            staging:     Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// A store staging into the collection named by the settings.
    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(settings.write_back_key().as_str())
    }

    /// A store sharing this one's data but staging into a different collection.
    pub fn with_staging_key<S: Into<String>>(&self, staging_key: S) -> Self {
        Self {
            staging_key: staging_key.into(),
            values:      self.values.clone(),
            staging:     Arc::clone(&self.staging),
        }
    }

    /// Drop the value entry of a person, as if the cache had been cleared. A staged person must stay cached, so the
    /// call is refused for them and `false` is returned.
    pub async fn evict(&self, id: &Uuid) -> bool {
        if self.is_staged(id) {
            debug!("Refusing to evict staged person {id}");
            return false;
        }
        self.values.invalidate(&cache_key_of(id)).await;
        true
    }

    /// Whether the person is a member of this store's staging collection.
    pub fn is_staged(&self, id: &Uuid) -> bool {
        self.staging
            .lock()
            .get(&self.staging_key)
            .is_some_and(|set| set.contains_key(id))
    }
}

impl Debug for MemoryCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCacheStore")
            .field("staging_key", &self.staging_key)
            .field("values", &self.values.entry_count())
            .finish()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, id: &Uuid) -> Result<Option<Person>, StoreError> {
        Ok(self.values.get(&cache_key_of(id)).await)
    }

    async fn set(&self, person: &Person) -> Result<(), StoreError> {
        self.values.insert(person.cache_key(), person.clone()).await;
        Ok(())
    }

    async fn staging_add(&self, person: &Person) -> Result<(), StoreError> {
        self.staging
            .lock()
            .entry(self.staging_key.clone())
            .or_default()
            .insert(person.id(), person.clone());
        Ok(())
    }

    async fn staging_remove(&self, person: &Person) -> Result<(), StoreError> {
        let mut sets = self.staging.lock();
        if let Some(set) = sets.get_mut(&self.staging_key) {
            set.remove(&person.id());
            if set.is_empty() {
                debug!("Staging collection '{}' is empty now", self.staging_key);
                sets.remove(&self.staging_key);
            }
        }
        Ok(())
    }

    async fn staging_size(&self) -> Result<u64, StoreError> {
        Ok(self
            .staging
            .lock()
            .get(&self.staging_key)
            .map_or(0, |set| set.len() as u64))
    }

    async fn staging_scan(&self) -> Result<StagingScan, StoreError> {
        let snapshot = self
            .staging
            .lock()
            .get(&self.staging_key)
            .map(|set| set.values().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        Ok(Box::pin(tokio_stream::iter(snapshot.into_iter().map(Ok))))
    }

    fn staging_key(&self) -> &str {
        &self.staging_key
    }
}

/// Map-backed durable store. Counts reads and writes so callers can tell whether it was touched at all.
#[derive(Debug, Default)]
pub struct MemoryDurableStore {
    records: RwLock<HashMap<Uuid, Person>>,
    reads:   AtomicU64,
    upserts: AtomicU64,
}

impl MemoryDurableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `find_by_id` calls served so far.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Acquire)
    }

    /// Number of `upsert` calls served so far.
    pub fn upserts(&self) -> u64 {
        self.upserts.load(Ordering::Acquire)
    }

    /// All records, ordered by identity.
    pub fn snapshot(&self) -> Vec<Person> {
        let mut records = self.records.read().values().cloned().collect::<Vec<_>>();
        records.sort_by_key(|p| p.id());
        records
    }

    /// Put a record straight into the store, bypassing the counters.
    pub fn seed(&self, person: Person) {
        self.records.write().insert(person.id(), person);
    }
}

#[async_trait]
impl DurableStore for MemoryDurableStore {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Person>, StoreError> {
        self.reads.fetch_add(1, Ordering::AcqRel);
        Ok(self.records.read().get(id).cloned())
    }

    async fn upsert(&self, person: &Person) -> Result<(), StoreError> {
        self.upserts.fetch_add(1, Ordering::AcqRel);
        self.records.write().insert(person.id(), person.clone());
        Ok(())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.records.read().len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn set_overwrites() {
        let store = MemoryCacheStore::new("test:staging");
        let person = Person::new("John Smith", 45);
        store.set(&person).await.unwrap();
        let updated = Person::from_parts(person.id(), "John Smith", 46);
        store.set(&updated).await.unwrap();

        let cached = store.get(&person.id()).await.unwrap().unwrap();
        assert_eq!(cached.age(), 46);
    }

    #[tokio::test]
    async fn staging_is_idempotent() {
        let store = MemoryCacheStore::new("test:staging");
        let person = Person::new("John Smith", 45);

        assert_eq!(store.staging_size().await.unwrap(), 0);
        store.staging_add(&person).await.unwrap();
        store.staging_add(&person).await.unwrap();
        assert_eq!(store.staging_size().await.unwrap(), 1);

        store.staging_remove(&person).await.unwrap();
        store.staging_remove(&person).await.unwrap();
        assert_eq!(store.staging_size().await.unwrap(), 0);
        assert!(!store.is_staged(&person.id()));
    }

    #[tokio::test]
    async fn scan_is_a_snapshot() {
        let store = MemoryCacheStore::new("test:staging");
        let first = Person::new("First", 1);
        store.staging_add(&first).await.unwrap();

        let mut scan = store.staging_scan().await.unwrap();
        let late = Person::new("Late", 2);
        store.staging_add(&late).await.unwrap();

        let mut seen = vec![];
        while let Some(person) = scan.next().await {
            seen.push(person.unwrap());
        }
        assert_eq!(seen, vec![first]);
        assert_eq!(store.staging_size().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn staging_keys_are_separate() {
        let store = MemoryCacheStore::new("a");
        let other = store.with_staging_key("b");
        let person = Person::new("John Smith", 45);

        store.set(&person).await.unwrap();
        store.staging_add(&person).await.unwrap();

        assert_eq!(other.staging_size().await.unwrap(), 0);
        assert!(other.get(&person.id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn staged_people_stay_cached() {
        let store = MemoryCacheStore::new("test:staging");
        let person = Person::new("John Smith", 45);
        store.set(&person).await.unwrap();
        store.staging_add(&person).await.unwrap();

        assert!(!store.evict(&person.id()).await);
        assert!(store.get(&person.id()).await.unwrap().is_some());
        assert!(store.is_staged(&person.id()));

        store.staging_remove(&person).await.unwrap();
        assert!(store.evict(&person.id()).await);
        assert!(store.get(&person.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn staging_key_from_settings() {
        let settings = CacheSettings::builder()
            .write_back_key("test:from_settings")
            .build()
            .unwrap();
        let store = MemoryCacheStore::from_settings(&settings);
        assert_eq!(store.staging_key(), "test:from_settings");

        let person = Person::new("John Smith", 45);
        store.staging_add(&person).await.unwrap();
        assert!(store.with_staging_key("test:from_settings").is_staged(&person.id()));
    }

    #[tokio::test]
    async fn durable_upsert_replaces() {
        let store = MemoryDurableStore::new();
        let person = Person::new("John Smith", 45);
        store.upsert(&person).await.unwrap();
        store.upsert(&person).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.upserts(), 2);
        assert!(store.find_by_id(&person.id()).await.unwrap().is_some());
        assert_eq!(store.reads(), 1);
    }
}
