//! Create a handful of people, read them back, and watch the write-back task persist them.
//!
//! ```text
//! RUST_LOG=info cargo run --example people --features demo,sqlite -- --count 10 --sqlite-path /tmp
//! ```
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use garde::Validate;
use person_cache::api;
use person_cache::api::PersonRequest;
use person_cache::prelude::*;
use tracing::info;

#[derive(Debug, Clone, clap::Parser, Validate)]
#[clap(about, version, name = "people")]
struct Cli {
    /// Milliseconds between two write-back cycles.
    #[clap(long, env = "PERSON_CACHE_WRITE_BACK_RATE", default_value_t = 1000)]
    #[garde(range(min = 1))]
    write_back_rate: u64,

    /// Name of the staging collection.
    #[clap(long, env = "PERSON_CACHE_WRITE_BACK_KEY", default_value = "person:write_back")]
    #[garde(length(min = 1))]
    write_back_key: String,

    /// How many people to create.
    #[clap(long, default_value_t = 10)]
    #[garde(range(min = 1, max = 100_000))]
    count: u32,

    /// Use Redis at this URL as the cache store.
    #[clap(long, env = "PERSON_CACHE_REDIS_URL")]
    #[garde(skip)]
    redis_url: Option<String>,

    /// Keep people in an SQLite database in this directory.
    #[clap(long, env = "PERSON_CACHE_SQLITE_PATH")]
    #[garde(skip)]
    sqlite_path: Option<PathBuf>,

    /// Keep people in a PostgreSQL database at this URL.
    #[clap(long, env = "PERSON_CACHE_PG_URL")]
    #[garde(skip)]
    pg_url: Option<String>,
}

impl Cli {
    fn settings(&self) -> anyhow::Result<CacheSettings> {
        Ok(CacheSettings::builder()
            .write_back_rate(Duration::from_millis(self.write_back_rate))
            .write_back_key(self.write_back_key.clone())
            .build()?)
    }
}

fn setup_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    info!("Tracing initialized");
    Ok(())
}

async fn run<C, D>(cli: &Cli, cache: Arc<C>, store: Arc<D>) -> anyhow::Result<()>
where
    C: CacheStore,
    D: DurableStore,
{
    let settings = cli.settings()?;
    let rate = settings.write_back_rate();
    let service = CachedPersonService::new(cache, Arc::clone(&store));
    let write_back = Arc::new(WriteBackJob::for_service(&service, settings)).start();

    let mut ids = vec![];
    for n in 0..cli.count {
        let created = api::create_person(&service, PersonRequest::new(format!("Person #{n}"), (n % 100) as i32))
            .await
            .context("creating a person")?;
        info!("Created {}", created.location);
        ids.push(created.person.id);
    }

    for id in &ids {
        let person = api::find_person(&service, *id).await?;
        info!("Found {} ({})", person.name, person.age);
    }

    let before = store.count().await?;
    tokio::time::sleep(rate * 2).await;
    let after = store.count().await?;
    info!("Durable store count: {before} before the wait, {after} after");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
        _ = tokio::time::sleep(rate) => (),
    }

    write_back.shutdown().await;
    info!("Durable store holds {} people", store.count().await?);
    Ok(())
}

async fn durable_and_run<C: CacheStore>(cli: &Cli, cache: Arc<C>) -> anyhow::Result<()> {
    #[cfg(feature = "sqlite")]
    if let Some(ref dir) = cli.sqlite_path {
        let store = person_cache::store::db::DbDurableStore::connect_sqlite(dir, "people.db").await?;
        store.migrate().await?;
        return run(cli, cache, Arc::new(store)).await;
    }

    #[cfg(feature = "pg")]
    if let Some(ref url) = cli.pg_url {
        let store = person_cache::store::db::DbDurableStore::connect(url).await?;
        store.migrate().await?;
        return run(cli, cache, Arc::new(store)).await;
    }

    if cli.sqlite_path.is_some() || cli.pg_url.is_some() {
        anyhow::bail!("The requested database backend is not compiled in; enable the 'sqlite' or 'pg' feature");
    }

    run(cli, cache, Arc::new(MemoryDurableStore::new())).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.validate()?;
    setup_tracing()?;

    #[cfg(feature = "redis")]
    if let Some(ref url) = cli.redis_url {
        let cache = person_cache::store::redis::RedisCacheStore::connect_with_settings(url, &cli.settings()?)?;
        return durable_and_run(&cli, Arc::new(cache)).await;
    }

    if cli.redis_url.is_some() {
        anyhow::bail!("Redis support is not compiled in; enable the 'redis' feature");
    }

    durable_and_run(&cli, Arc::new(MemoryCacheStore::from_settings(&cli.settings()?))).await
}
