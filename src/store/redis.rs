//! Redis-backed cache store.
//!
//! Values are kept as JSON strings under the hyphenated identity. The staging collection is a Redis set under the
//! staging key whose members are the JSON documents themselves, so membership is by content. Since a person never
//! changes after creation and the encoding is deterministic (fixed field order), a person rehydrated from the durable
//! store encodes to the very same member, which makes this equivalent to membership by identity.
use async_trait::async_trait;
use deadpool_redis::Config;
use deadpool_redis::Connection;
use deadpool_redis::Pool;
use deadpool_redis::Runtime;
use redis::AsyncCommands;
use std::fmt::Debug;
use tracing::instrument;
use uuid::Uuid;

use crate::config::CacheSettings;
use crate::error::StoreError;
use crate::person::cache_key_of;
use crate::person::Person;
use crate::traits::CacheStore;
use crate::types::StagingScan;

pub struct RedisCacheStore {
    pool:        Pool,
    staging_key: String,
}

impl RedisCacheStore {
    pub fn new<S: Into<String>>(pool: Pool, staging_key: S) -> Self {
        Self {
            pool,
            staging_key: staging_key.into(),
        }
    }

    /// Like [`connect`](Self::connect), staging into the collection named by the settings.
    pub fn connect_with_settings(url: &str, settings: &CacheSettings) -> Result<Self, StoreError> {
        Self::connect(url, settings.write_back_key().as_str())
    }

    /// Build a connection pool for `url` (e.g. `redis://127.0.0.1:6379`) and wrap it.
    pub fn connect<S: Into<String>>(url: &str, staging_key: S) -> Result<Self, StoreError> {
        let pool = Config::from_url(url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StoreError::Unavailable(format!("cannot create redis pool for {url}: {e}")))?;
        Ok(Self::new(pool, staging_key))
    }

    async fn connection(&self) -> Result<Connection, StoreError> {
        Ok(self.pool.get().await?)
    }

    fn encode(person: &Person) -> Result<String, StoreError> {
        Ok(serde_json::to_string(person)?)
    }

    fn decode(raw: &str) -> Result<Person, StoreError> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl Debug for RedisCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheStore")
            .field("staging_key", &self.staging_key)
            .finish()
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    #[instrument(level = "trace", skip(self))]
    async fn get(&self, id: &Uuid) -> Result<Option<Person>, StoreError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(cache_key_of(id)).await?;
        raw.as_deref().map(Self::decode).transpose()
    }

    #[instrument(level = "trace", skip(self, person), fields(id = %person.id()))]
    async fn set(&self, person: &Person) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        conn.set::<_, _, ()>(person.cache_key(), Self::encode(person)?).await?;
        Ok(())
    }

    #[instrument(level = "trace", skip(self, person), fields(id = %person.id()))]
    async fn staging_add(&self, person: &Person) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        conn.sadd::<_, _, ()>(&self.staging_key, Self::encode(person)?).await?;
        Ok(())
    }

    #[instrument(level = "trace", skip(self, person), fields(id = %person.id()))]
    async fn staging_remove(&self, person: &Person) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        conn.srem::<_, _, ()>(&self.staging_key, Self::encode(person)?).await?;
        Ok(())
    }

    async fn staging_size(&self) -> Result<u64, StoreError> {
        let mut conn = self.connection().await?;
        // SCARD of a missing key is 0.
        Ok(conn.scard(&self.staging_key).await?)
    }

    async fn staging_scan(&self) -> Result<StagingScan, StoreError> {
        let mut conn = self.connection().await?;
        let members: Vec<String> = conn.smembers(&self.staging_key).await?;
        Ok(Box::pin(tokio_stream::iter(
            members.into_iter().map(|raw| Self::decode(&raw)),
        )))
    }

    fn staging_key(&self) -> &str {
        &self.staging_key
    }
}
