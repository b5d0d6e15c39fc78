use std::io::BufRead;

use achievelog_core::CompletionEvent;
use achievelog_engine::{Broadcaster, EventAdapter, Outcome};
use achievelog_storage::CompletionStore;
use anyhow::Result;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub recorded: usize,
    pub duplicates: usize,
    pub failed: usize,
    pub rejected: usize,
}

/// Feed newline-delimited JSON events into the adapter until EOF.
///
/// Lines that do not parse are logged and skipped; write failures are
/// counted. Only an I/O error on `input` stops the loop early.
pub fn pump<S, B, R>(adapter: &EventAdapter<S, B>, input: R) -> Result<Summary>
where
    S: CompletionStore,
    B: Broadcaster,
    R: BufRead,
{
    let mut summary = Summary::default();
    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event: CompletionEvent = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(line = index + 1, error = %err, "skipping malformed event");
                summary.rejected += 1;
                continue;
            }
        };
        match adapter.on_completion(&event) {
            Outcome::Recorded(_) => summary.recorded += 1,
            Outcome::AlreadyRecorded(_) => summary.duplicates += 1,
            Outcome::Failed { .. } => summary.failed += 1,
        }
    }
    Ok(summary)
}
