//! Backends for the [`CacheStore`](crate::traits::CacheStore) and [`DurableStore`](crate::traits::DurableStore) traits.
#[cfg(feature = "db")]
pub mod db;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;
