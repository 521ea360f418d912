//! # person-cache
//!
//! Cache-aside reads and write-back persistence of person records.
//!
//! # The Basics
//!
//! There are two external collaborators:
//!
//! - a [`CacheStore`](traits::CacheStore), the hot cache. Besides the person values it keeps a *staging collection*
//!   of people not persisted yet;
//! - a [`DurableStore`](traits::DurableStore), the database of record.
//!
//! [`CachedPersonService`](service::CachedPersonService) is what the outside world talks to:
//!
//! - `create` builds a person with a fresh identity, caches it, and stages it. The durable store isn't touched.
//! - `find_one` answers from the cache. On a miss it reads the durable store and, if the person is there, caches and
//!   stages it again. Otherwise it fails with [`PersonError::NotFound`](error::PersonError::NotFound).
//!
//! [`WriteBackJob`](write_back::WriteBackJob) runs at a fixed rate and drains the staging collection into the durable
//! store. Persistence is at-least-once: the upsert is idempotent, so re-delivering after a failed cycle is harmless.
//!
//! ```ignore
//! let settings = CacheSettings::builder().write_back_rate(Duration::from_secs(1)).build()?;
//! let cache = Arc::new(MemoryCacheStore::new(settings.write_back_key().as_str()));
//! let service = CachedPersonService::new(cache, Arc::new(MemoryDurableStore::new()));
//! let write_back = Arc::new(WriteBackJob::for_service(&service, settings)).start();
//!
//! let person = service.create("John Smith".into(), 45).await?;
//! assert_eq!(service.find_one(person.id()).await?.name(), "John Smith");
//!
//! write_back.shutdown().await;
//! ```
//!
//! # Failure Windows
//!
//! Caching a person is two independent store calls: value first, then staging. A crash in between leaves the person
//! readable from the cache but not staged; it gets staged again the next time a cache miss rehydrates it from the
//! durable store. Nothing tries to make the pair atomic.
//!
//! # Backends
//!
//! - [`store::memory`]: moka-based cache and a map-based durable store, always available.
//! - `store::redis` (feature `redis`): Redis cache store.
//! - `store::db` (features `sqlite`, `pg`): SeaORM durable store with migrations.

pub mod api;
pub mod config;
pub mod error;
pub mod person;
pub mod service;
pub mod store;
pub mod traits;
pub mod types;
pub mod write_back;

#[doc(inline)]
pub use person::Person;
#[doc(inline)]
pub use service::CachedPersonService;
#[doc(inline)]
pub use write_back::WriteBackJob;

pub mod prelude {
    pub use crate::config::CacheSettings;
    pub use crate::error::PersonError;
    pub use crate::error::StoreError;
    pub use crate::person::Person;
    pub use crate::service::CachedPersonService;
    pub use crate::store::memory::MemoryCacheStore;
    pub use crate::store::memory::MemoryDurableStore;
    pub use crate::traits::CacheStore;
    pub use crate::traits::DurableStore;
    pub use crate::traits::PersonService;
    pub use crate::types::*;
    pub use crate::write_back::WriteBackHandle;
    pub use crate::write_back::WriteBackJob;
}
