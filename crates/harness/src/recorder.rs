use std::sync::Mutex;

use achievelog_engine::Broadcaster;

/// Captures announcements instead of sending them anywhere.
#[derive(Debug, Default)]
pub struct RecordingBroadcaster {
    messages: Mutex<Vec<String>>,
}

impl RecordingBroadcaster {
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

impl Broadcaster for RecordingBroadcaster {
    fn announce(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}
