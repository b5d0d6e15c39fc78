use achievelog_core::CompletionEvent;

use crate::error::StorageError;

/// Surrogate ids the completion resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedCompletion {
    pub player_row: i64,
    pub achievement_row: i64,
    /// False when the pair was already on record and the insert was a no-op.
    pub newly_recorded: bool,
}

/// A relational backend that can hold completion facts.
///
/// Implementations are shared across the threads that deliver host events,
/// so every method takes `&self`. At-most-once recording relies on the
/// store's unique keys, not on in-process locking.
pub trait CompletionStore: Send + Sync {
    fn backend(&self) -> &'static str;

    /// Create the player, achievement and completion tables if absent.
    fn ensure_schema(&self) -> Result<(), StorageError>;

    /// Upsert the player, upsert the achievement, then insert the completion
    /// fact, all in one transaction. Repeating a call with the same event
    /// leaves exactly one fact row.
    fn record_completion(
        &self,
        event: &CompletionEvent,
    ) -> Result<RecordedCompletion, StorageError>;

    /// Release the underlying connection(s).
    fn close(self) -> Result<(), StorageError>
    where
        Self: Sized;
}
