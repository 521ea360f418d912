#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use person_cache::prelude::*;
use std::future::Future;
use std::time::Duration;
use tokio_stream::StreamExt;
use uuid::Uuid;

pub const TEST_KEY: &str = "person:write_back_test";

pub fn settings(rate: Duration) -> CacheSettings {
    CacheSettings::builder()
        .write_back_rate(rate)
        .write_back_key(TEST_KEY)
        .build()
        .expect("test settings")
}

/// Durable store whose reads always fail. Writes go to a memory store.
#[derive(Debug, Default)]
pub struct WriteOnlyStore {
    pub inner: MemoryDurableStore,
}

#[async_trait]
impl DurableStore for WriteOnlyStore {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Person>, StoreError> {
        Err(StoreError::Unavailable(format!("reads are forbidden (asked for {id})")))
    }

    async fn upsert(&self, person: &Person) -> Result<(), StoreError> {
        self.inner.upsert(person).await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.inner.count().await
    }
}

/// A one-shot failure of a cache store operation.
#[derive(Clone, Copy, Debug)]
pub enum CacheFault {
    /// The next `staging_size` fails.
    Size,
    /// The next scan yields an error after this many members.
    ScanItem { after: usize },
    /// `staging_remove` fails after this many successful calls.
    Remove { after: usize },
}

/// Memory cache store that fails once, the way `fault` says.
#[derive(Debug)]
pub struct FaultyCache {
    pub inner: MemoryCacheStore,
    fault:     Mutex<Option<CacheFault>>,
}

impl FaultyCache {
    pub fn new(fault: CacheFault) -> Self {
        Self {
            inner: MemoryCacheStore::new(TEST_KEY),
            fault: Mutex::new(Some(fault)),
        }
    }

    pub fn tripped(&self) -> bool {
        self.fault.lock().is_none()
    }

    fn failure(what: &str) -> StoreError {
        StoreError::Unavailable(format!("{what} failed on purpose"))
    }
}

#[async_trait]
impl CacheStore for FaultyCache {
    async fn get(&self, id: &Uuid) -> Result<Option<Person>, StoreError> {
        self.inner.get(id).await
    }

    async fn set(&self, person: &Person) -> Result<(), StoreError> {
        self.inner.set(person).await
    }

    async fn staging_add(&self, person: &Person) -> Result<(), StoreError> {
        self.inner.staging_add(person).await
    }

    async fn staging_remove(&self, person: &Person) -> Result<(), StoreError> {
        let fail = {
            let mut fault = self.fault.lock();
            match *fault {
                Some(CacheFault::Remove { after: 0 }) => {
                    *fault = None;
                    true
                }
                Some(CacheFault::Remove { after }) => {
                    *fault = Some(CacheFault::Remove { after: after - 1 });
                    false
                }
                _ => false,
            }
        };
        if fail {
            return Err(Self::failure("unstaging"));
        }
        self.inner.staging_remove(person).await
    }

    async fn staging_size(&self) -> Result<u64, StoreError> {
        let fail = {
            let mut fault = self.fault.lock();
            match *fault {
                Some(CacheFault::Size) => fault.take().is_some(),
                _ => false,
            }
        };
        if fail {
            return Err(Self::failure("reading staging size"));
        }
        self.inner.staging_size().await
    }

    async fn staging_scan(&self) -> Result<StagingScan, StoreError> {
        let after = {
            let mut fault = self.fault.lock();
            match *fault {
                Some(CacheFault::ScanItem { after }) => {
                    *fault = None;
                    Some(after)
                }
                _ => None,
            }
        };

        let scan = self.inner.staging_scan().await?;
        let Some(after) = after
        else {
            return Ok(scan);
        };

        let mut members = scan.collect::<Vec<_>>().await;
        members.insert(after.min(members.len()), Err(Self::failure("decoding a staged member")));
        Ok(Box::pin(tokio_stream::iter(members)))
    }

    fn staging_key(&self) -> &str {
        self.inner.staging_key()
    }
}

/// Poll `check` until it holds or `within` runs out.
pub async fn eventually<F, Fut>(within: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    tokio::time::timeout(within, async {
        while !check().await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .is_ok()
}
