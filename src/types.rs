use crate::error::StoreError;
use crate::person::Person;
use std::fmt::Display;
use std::pin::Pin;
use tokio_stream::Stream;

/// Finite, non-restartable sequence of the staged people.
pub type StagingScan = Pin<Box<dyn Stream<Item = Result<Person, StoreError>> + Send>>;

/// What a single write-back cycle did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteBackOutcome {
    /// Another cycle was still running; this one didn't touch anything.
    Busy,
    /// The staging collection was empty or missing.
    Idle,
    /// Every member of the snapshot was persisted and unstaged.
    Drained { persisted: usize },
    /// A backend failed part way. The remaining members stay staged for the next cycle.
    Aborted { persisted: usize },
}

impl WriteBackOutcome {
    pub fn persisted(&self) -> usize {
        match self {
            Self::Drained { persisted } | Self::Aborted { persisted } => *persisted,
            Self::Busy | Self::Idle => 0,
        }
    }
}

impl Display for WriteBackOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Busy => write!(f, "busy"),
            Self::Idle => write!(f, "idle"),
            Self::Drained { persisted } => write!(f, "drained {persisted}"),
            Self::Aborted { persisted } => write!(f, "aborted after {persisted}"),
        }
    }
}
