use thiserror::Error;
use uuid::Uuid;

/// Failures of the backends: unreachable stores, broken payloads, driver errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("cannot (de)serialize person: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "redis")]
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[cfg(feature = "redis")]
    #[error("redis pool: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    #[cfg(feature = "db")]
    #[error("database: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Errors of the person service.
///
/// `NotFound` is the only domain outcome; everything else is a store failure passed through as-is.
#[derive(Debug, Error)]
pub enum PersonError {
    #[error("Person not found with ID {0}")]
    NotFound(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PersonError {
    /// The identity a failed lookup was asked for.
    pub fn person_id(&self) -> Option<Uuid> {
        match self {
            Self::NotFound(id) => Some(*id),
            Self::Store(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T, E = PersonError> = std::result::Result<T, E>;
