use achievelog_core::CompletionEvent;

/// Player-visible notification owned by the host (chat broadcast, webhook...).
pub trait Broadcaster: Send + Sync {
    fn announce(&self, message: &str);
}

/// Message shown to everyone when a player completes an achievement.
pub fn announcement(event: &CompletionEvent) -> String {
    format!(
        "{} completed the achievement {}",
        event.player_name, event.achievement_key
    )
}

/// Broadcaster for hosts without a chat channel: writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogBroadcaster;

impl Broadcaster for LogBroadcaster {
    fn announce(&self, message: &str) {
        tracing::info!(target: "achievelog::broadcast", "{message}");
    }
}

impl<B: Broadcaster + ?Sized> Broadcaster for &B {
    fn announce(&self, message: &str) {
        (**self).announce(message)
    }
}
