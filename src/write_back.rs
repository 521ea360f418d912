//! Periodic persistence of staged people.
//!
//! Every cycle takes a snapshot of the staging collection and, member by member, upserts it into the durable store and
//! only then removes it from staging. A failure aborts the cycle and leaves the rest staged, so a member is delivered at
//! least once: if we fail between the upsert and the unstage, the next cycle upserts it again, which is harmless.
//!
//! Cycles never overlap. The scheduled loop waits for a cycle to complete before the next tick, late ticks are skipped,
//! and a manual [`WriteBackJob::run_once`] racing a running cycle returns [`WriteBackOutcome::Busy`].
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::instrument;

use crate::config::CacheSettings;
use crate::error::StoreError;
use crate::service::CachedPersonService;
use crate::traits::CacheStore;
use crate::traits::DurableStore;
use crate::types::WriteBackOutcome;

pub struct WriteBackJob<C, D>
where
    C: CacheStore,
    D: DurableStore,
{
    cache:    Arc<C>,
    store:    Arc<D>,
    settings: CacheSettings,
    // Held for the duration of a cycle.
    running:  Mutex<()>,
}

impl<C, D> WriteBackJob<C, D>
where
    C: CacheStore,
    D: DurableStore,
{
    /// The job drains the staging collection of `cache`. The settings' write-back key is for constructing cache
    /// stores (see [`MemoryCacheStore::from_settings`](crate::store::memory::MemoryCacheStore::from_settings)); the
    /// job itself only uses the rate and the shutdown flag.
    pub fn new(cache: Arc<C>, store: Arc<D>, settings: CacheSettings) -> Self {
        Self {
            cache,
            store,
            settings,
            running: Mutex::new(()),
        }
    }

    /// A job draining into the same stores the service uses.
    pub fn for_service(service: &CachedPersonService<C, D>, settings: CacheSettings) -> Self {
        Self::new(service.cache(), service.store(), settings)
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Run a single write-back cycle. Errors are logged, never returned: whatever wasn't persisted stays staged.
    #[instrument(level = "debug", skip(self), fields(staging_key = %self.cache.staging_key()))]
    pub async fn run_once(&self) -> WriteBackOutcome {
        let Ok(_running) = self.running.try_lock()
        else {
            debug!("Previous write-back cycle is still running, skipping");
            return WriteBackOutcome::Busy;
        };

        let mut persisted = 0;
        match self.drain(&mut persisted).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(
                    "Error writing back {} set; persisted {persisted} before failure: {err}",
                    self.cache.staging_key()
                );
                WriteBackOutcome::Aborted { persisted }
            }
        }
    }

    async fn drain(&self, persisted: &mut usize) -> Result<WriteBackOutcome, StoreError> {
        let staged = self.cache.staging_size().await?;
        if staged == 0 {
            info!("None people to write back from cache to database");
            return Ok(WriteBackOutcome::Idle);
        }

        info!("Found {staged} people to write back from cache to database");

        let mut scan = self.cache.staging_scan().await?;
        while let Some(person) = scan.next().await {
            let person = person?;

            self.store.upsert(&person).await?;
            debug!("Person saved (person={person})");

            self.cache.staging_remove(&person).await?;
            debug!("Person removed from {} set (person={person})", self.cache.staging_key());

            *persisted += 1;
        }

        info!("Persisted {persisted} people in the database");
        Ok(WriteBackOutcome::Drained { persisted: *persisted })
    }

    /// Spawn the periodic task. It runs until [`WriteBackHandle::shutdown`] is called or the handle is dropped.
    pub fn start(self: Arc<Self>) -> WriteBackHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        // tokio's interval doesn't accept a zero period.
        let rate = self.settings.write_back_rate().max(Duration::from_millis(1));
        let job = self;

        let task = tokio::spawn(async move {
            info!("Starting write-back task; rate={rate:?}");
            let mut ticker = tokio::time::interval(rate);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let outcome = job.run_once().await;
                        debug!("Write-back cycle finished: {outcome}");
                    }
                    _ = stop_rx.changed() => break,
                }
            }

            if job.settings.flush_on_shutdown() {
                let outcome = job.run_once().await;
                info!("Final write-back cycle: {outcome}");
            }
            info!("Write-back task stopped");
        });

        WriteBackHandle {
            stop: stop_tx,
            task: Some(task),
        }
    }
}

impl<C, D> Debug for WriteBackJob<C, D>
where
    C: CacheStore,
    D: DurableStore,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteBackJob")
            .field("staging_key", &self.cache.staging_key())
            .field("settings", &self.settings)
            .finish()
    }
}

/// Owner of a running write-back task.
#[derive(Debug)]
pub struct WriteBackHandle {
    stop: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl WriteBackHandle {
    /// Stop the task. A cycle in progress is allowed to complete; a final cycle follows if the settings ask for it.
    pub async fn shutdown(mut self) {
        let _ = self.stop.send(true);
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                error!("Write-back task failed: {err}");
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }
}

impl Drop for WriteBackHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
