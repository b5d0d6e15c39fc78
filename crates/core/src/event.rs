use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ids::PlayerId;

pub const PLAYER_NAME_MAX: usize = 32;
pub const ACHIEVEMENT_KEY_MAX: usize = 255;
pub const ACHIEVEMENT_NAME_MAX: usize = 255;

/// Display name used when the host has nothing better than the key.
pub fn default_achievement_name(key: &str) -> String {
    format!("Achievement({key})")
}

/// "Player P completed achievement A", as delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EventRecord")]
pub struct CompletionEvent {
    pub player_id: PlayerId,
    pub player_name: String,
    pub achievement_key: String,
    pub achievement_name: String,
}

impl CompletionEvent {
    pub fn new(
        player_id: PlayerId,
        player_name: impl Into<String>,
        achievement_key: impl Into<String>,
    ) -> Self {
        let achievement_key = achievement_key.into();
        Self {
            player_id,
            player_name: player_name.into(),
            achievement_name: default_achievement_name(&achievement_key),
            achievement_key,
        }
    }

    pub fn with_achievement_name(mut self, name: impl Into<String>) -> Self {
        self.achievement_name = name.into();
        self
    }

    pub fn validate_player(&self) -> Result<(), CoreError> {
        check_len("player name", &self.player_name, PLAYER_NAME_MAX)
    }

    pub fn validate_achievement(&self) -> Result<(), CoreError> {
        if self.achievement_key.is_empty() {
            return Err(CoreError::InvalidEvent("achievement key is empty".into()));
        }
        check_len("achievement key", &self.achievement_key, ACHIEVEMENT_KEY_MAX)?;
        check_len("achievement name", &self.achievement_name, ACHIEVEMENT_NAME_MAX)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        self.validate_player()?;
        self.validate_achievement()
    }
}

/// Length bound counted in characters, not bytes.
fn check_len(label: &str, value: &str, max: usize) -> Result<(), CoreError> {
    let len = value.chars().count();
    if len > max {
        return Err(CoreError::InvalidEvent(format!(
            "{label} is {len} characters (max {max})"
        )));
    }
    Ok(())
}

/// Wire shape of an event; the display name is optional there.
#[derive(Deserialize)]
struct EventRecord {
    player_id: PlayerId,
    player_name: String,
    achievement_key: String,
    #[serde(default)]
    achievement_name: Option<String>,
}

impl TryFrom<EventRecord> for CompletionEvent {
    type Error = CoreError;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        let mut event = CompletionEvent::new(
            record.player_id,
            record.player_name,
            record.achievement_key,
        );
        if let Some(name) = record.achievement_name {
            event.achievement_name = name;
        }
        event.validate()?;
        Ok(event)
    }
}
