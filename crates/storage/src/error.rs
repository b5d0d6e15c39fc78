use std::fmt;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Which statement of the completion write failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStep {
    Begin,
    Player,
    Achievement,
    Completion,
    Commit,
}

impl WriteStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Player => "player upsert",
            Self::Achievement => "achievement upsert",
            Self::Completion => "completion insert",
            Self::Commit => "commit",
        }
    }
}

impl fmt::Display for WriteStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("schema initialization failed: {0}")]
    SchemaInitialization(#[source] BoxError),

    #[error("connection error: {0}")]
    Connection(#[source] BoxError),

    #[error("persistence error during {step}: {source}")]
    Persistence {
        step: WriteStep,
        #[source]
        source: BoxError,
    },

    #[error("core error: {0}")]
    Core(#[from] achievelog_core::CoreError),
}

impl StorageError {
    pub fn schema(err: impl Into<BoxError>) -> Self {
        Self::SchemaInitialization(err.into())
    }

    pub fn connection(err: impl Into<BoxError>) -> Self {
        Self::Connection(err.into())
    }

    pub fn persistence(step: WriteStep, err: impl Into<BoxError>) -> Self {
        Self::Persistence {
            step,
            source: err.into(),
        }
    }

    /// The failed step, for persistence errors.
    pub fn step(&self) -> Option<WriteStep> {
        match self {
            Self::Persistence { step, .. } => Some(*step),
            _ => None,
        }
    }
}
