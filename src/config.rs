use fieldx::fxstruct;
use std::time::Duration;

pub const DEFAULT_WRITE_BACK_KEY: &str = "person:write_back";
pub const DEFAULT_WRITE_BACK_RATE: Duration = Duration::from_secs(1);

/// Settings of the write-back machinery. Loading them is up to the embedding application; see the `people` demo for a
/// command line/environment based setup.
///
/// ```ignore
/// let settings = CacheSettings::builder()
///     .write_back_rate(Duration::from_millis(500))
///     .write_back_key("person:write_back_test")
///     .build()?;
/// ```
#[derive(Clone, Debug)]
#[fxstruct(sync, no_new, builder, get(copy))]
pub struct CacheSettings {
    /// The delay between two consecutive write-back cycles.
    #[fieldx(default(DEFAULT_WRITE_BACK_RATE))]
    write_back_rate: Duration,

    /// Name of the staging collection in the cache store.
    #[fieldx(get(copy(off)), builder(into), default(String::from(DEFAULT_WRITE_BACK_KEY)))]
    write_back_key: String,

    /// Run one last cycle when the write-back task is shut down.
    #[fieldx(default(true))]
    flush_on_shutdown: bool,
}
