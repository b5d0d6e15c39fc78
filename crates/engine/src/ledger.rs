use std::path::Path;

use achievelog_core::{CompletionEvent, ConnectionConfig};
use achievelog_storage::{CompletionStore, MySqlStore, RecordedCompletion, SqliteStore};

use crate::error::EngineError;

/// Owns an open store for the lifetime of the process.
///
/// The schema is ensured before the ledger accepts any write. Closing is
/// idempotent, and dropping an open ledger closes it.
pub struct Ledger<S: CompletionStore> {
    store: Option<S>,
}

impl Ledger<MySqlStore> {
    pub fn connect(config: &ConnectionConfig) -> Result<Self, EngineError> {
        tracing::info!(database = %config, "connecting to mysql");
        let store = MySqlStore::open(config)?;
        Ok(Self { store: Some(store) })
    }
}

impl Ledger<SqliteStore> {
    pub fn open_sqlite(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        tracing::info!(path = %path.as_ref().display(), "opening sqlite ledger");
        let store = SqliteStore::open(path)?;
        Ok(Self { store: Some(store) })
    }
}

impl<S: CompletionStore> Ledger<S> {
    /// Wrap an already-opened store, re-checking its schema.
    pub fn from_store(store: S) -> Result<Self, EngineError> {
        store.ensure_schema()?;
        Ok(Self { store: Some(store) })
    }

    /// A ledger that never opened a store; every write fails with `Closed`.
    pub fn closed() -> Self {
        Self { store: None }
    }

    pub fn is_open(&self) -> bool {
        self.store.is_some()
    }

    pub fn record(&self, event: &CompletionEvent) -> Result<RecordedCompletion, EngineError> {
        let store = self.store.as_ref().ok_or(EngineError::Closed)?;
        Ok(store.record_completion(event)?)
    }

    /// Release the store. A no-op when nothing is open.
    pub fn close(&mut self) -> Result<(), EngineError> {
        match self.store.take() {
            Some(store) => {
                let backend = store.backend();
                store.close()?;
                tracing::info!(backend, "ledger closed");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl<S: CompletionStore> Drop for Ledger<S> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            tracing::error!(error = %err, "failed to close ledger");
        }
    }
}
