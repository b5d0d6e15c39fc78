use achievelog_core::CompletionEvent;
use achievelog_storage::{CompletionStore, RecordedCompletion, WriteStep};

use crate::broadcast::{announcement, Broadcaster};
use crate::error::EngineError;
use crate::ledger::Ledger;

/// What happened to one completion event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Recorded(RecordedCompletion),
    AlreadyRecorded(RecordedCompletion),
    /// The write failed and was logged; `step` is set for write failures.
    Failed { step: Option<WriteStep> },
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Boundary between the host's event source and the ledger.
///
/// This is the only place that logs persistence failures. Nothing here
/// panics or returns an error to the host: the announcement always goes out,
/// and a failed write is reported as `Outcome::Failed`.
pub struct EventAdapter<S: CompletionStore, B: Broadcaster> {
    ledger: Ledger<S>,
    broadcaster: B,
}

impl<S: CompletionStore, B: Broadcaster> EventAdapter<S, B> {
    pub fn new(ledger: Ledger<S>, broadcaster: B) -> Self {
        Self {
            ledger,
            broadcaster,
        }
    }

    pub fn ledger(&self) -> &Ledger<S> {
        &self.ledger
    }

    pub fn broadcaster(&self) -> &B {
        &self.broadcaster
    }

    pub fn on_completion(&self, event: &CompletionEvent) -> Outcome {
        self.broadcaster.announce(&announcement(event));

        match self.ledger.record(event) {
            Ok(recorded) if recorded.newly_recorded => {
                tracing::debug!(
                    player = %event.player_id,
                    key = %event.achievement_key,
                    player_row = recorded.player_row,
                    achievement_row = recorded.achievement_row,
                    "recorded achievement completion"
                );
                Outcome::Recorded(recorded)
            }
            Ok(recorded) => {
                tracing::debug!(
                    player = %event.player_id,
                    key = %event.achievement_key,
                    "achievement completion already on record"
                );
                Outcome::AlreadyRecorded(recorded)
            }
            Err(err) => {
                let step = match &err {
                    EngineError::Storage(storage) => storage.step(),
                    _ => None,
                };
                tracing::warn!(
                    player = %event.player_id,
                    name = %event.player_name,
                    key = %event.achievement_key,
                    step = step.map(|s| s.as_str()),
                    error = %err,
                    "failed to record achievement completion"
                );
                Outcome::Failed { step }
            }
        }
    }

    /// Close the ledger; later events are announced but not recorded.
    pub fn shutdown(&mut self) {
        if let Err(err) = self.ledger.close() {
            tracing::error!(error = %err, "failed to close ledger");
        }
    }
}
