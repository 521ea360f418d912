use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::info;
use tracing::instrument;
use uuid::Uuid;

use crate::error::PersonError;
use crate::error::Result;
use crate::person::Person;
use crate::traits::CacheStore;
use crate::traits::DurableStore;
use crate::traits::PersonService;

/// Cache-aside reads, write-back creates.
///
/// New people only land in the cache and its staging collection; the durable store is reached on cache misses only.
/// Persisting staged people is the job of [`WriteBackJob`](crate::write_back::WriteBackJob).
pub struct CachedPersonService<C, D>
where
    C: CacheStore,
    D: DurableStore,
{
    cache: Arc<C>,
    store: Arc<D>,
}

impl<C, D> CachedPersonService<C, D>
where
    C: CacheStore,
    D: DurableStore,
{
    pub fn new(cache: Arc<C>, store: Arc<D>) -> Self {
        Self { cache, store }
    }

    pub fn cache(&self) -> Arc<C> {
        Arc::clone(&self.cache)
    }

    pub fn store(&self) -> Arc<D> {
        Arc::clone(&self.store)
    }

    // Two separate store calls. If we die in between, the value is cached but not staged; the next miss-driven
    // rehydration stages it again.
    async fn cache_person(&self, person: &Person) -> Result<()> {
        self.cache.set(person).await?;
        self.cache.staging_add(person).await?;
        info!("Person cached (key={}, value={person})", person.cache_key());
        Ok(())
    }
}

impl<C, D> Debug for CachedPersonService<C, D>
where
    C: CacheStore,
    D: DurableStore,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedPersonService")
            .field("staging_key", &self.cache.staging_key())
            .finish()
    }
}

#[async_trait]
impl<C, D> PersonService for CachedPersonService<C, D>
where
    C: CacheStore,
    D: DurableStore,
{
    #[instrument(level = "debug", skip(self, name))]
    async fn create(&self, name: String, age: i32) -> Result<Person> {
        let person = Person::new(name, age);
        self.cache_person(&person).await?;
        Ok(person)
    }

    #[instrument(level = "debug", skip(self))]
    async fn find_one(&self, id: Uuid) -> Result<Person> {
        if let Some(person) = self.cache.get(&id).await? {
            info!("Person retrieved from cache (person_id={id})");
            return Ok(person);
        }

        let Some(person) = self.store.find_by_id(&id).await?
        else {
            info!("Person not found (person_id={id})");
            return Err(PersonError::NotFound(id));
        };

        info!("Person retrieved from database (person_id={id})");
        self.cache_person(&person).await?;
        Ok(person)
    }
}
