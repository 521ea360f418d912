use async_trait::async_trait;
use uuid::Uuid;

use crate::error::PersonError;
use crate::error::StoreError;
use crate::person::Person;
use crate::types::StagingScan;

/// The hot cache: point lookups of person values plus the staging collection of people awaiting persistence.
///
/// Every method is a single store operation. Implementations rely on the atomicity of the backend for each call and do
/// no cross-call locking; a value write followed by a staging add is two independent steps.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    async fn get(&self, id: &Uuid) -> Result<Option<Person>, StoreError>;

    /// Unconditionally overwrite the value entry of the person.
    async fn set(&self, person: &Person) -> Result<(), StoreError>;

    /// Idempotent add to the staging collection.
    async fn staging_add(&self, person: &Person) -> Result<(), StoreError>;

    /// Idempotent remove from the staging collection. Removing a missing member is not an error.
    async fn staging_remove(&self, person: &Person) -> Result<(), StoreError>;

    /// Number of staged people; 0 when the collection doesn't exist.
    async fn staging_size(&self) -> Result<u64, StoreError>;

    /// Point-in-time snapshot of the staging collection. Members added after the snapshot is taken are not
    /// guaranteed to show up.
    async fn staging_scan(&self) -> Result<StagingScan, StoreError>;

    /// Name of the staging collection. Most useful for logging.
    fn staging_key(&self) -> &str;
}

/// Durable storage of person records.
#[async_trait]
pub trait DurableStore: Send + Sync + 'static {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Person>, StoreError>;

    /// Insert or replace by identity. Must be idempotent.
    async fn upsert(&self, person: &Person) -> Result<(), StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}

/// What a transport layer calls into.
#[async_trait]
pub trait PersonService: Send + Sync + 'static {
    async fn create(&self, name: String, age: i32) -> Result<Person, PersonError>;

    async fn find_one(&self, id: Uuid) -> Result<Person, PersonError>;
}
