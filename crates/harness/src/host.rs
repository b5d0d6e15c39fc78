use std::path::{Path, PathBuf};

use achievelog_core::{CompletionEvent, PlayerId};
use achievelog_engine::{EngineError, EventAdapter, Ledger, Outcome};
use achievelog_storage::SqliteStore;
use rusqlite::{Connection, OptionalExtension};
use tempfile::TempDir;

use crate::recorder::RecordingBroadcaster;

type Error = Box<dyn std::error::Error>;

/// Row counts of the three ledger tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tables {
    pub players: i64,
    pub achievements: i64,
    pub completions: i64,
}

/// A host process with a file-backed ledger in a scratch directory.
///
/// Inspection goes through a second connection so tests see only what was
/// committed.
pub struct TestHost {
    _dir: TempDir,
    path: PathBuf,
    pub adapter: EventAdapter<SqliteStore, RecordingBroadcaster>,
}

impl TestHost {
    pub fn new() -> Result<Self, Error> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("achievements.db");
        let adapter = start(&path)?;
        Ok(Self {
            _dir: dir,
            path,
            adapter,
        })
    }

    pub fn complete(&self, player: PlayerId, name: &str, key: &str) -> Outcome {
        self.adapter
            .on_completion(&CompletionEvent::new(player, name, key))
    }

    pub fn complete_event(&self, event: &CompletionEvent) -> Outcome {
        self.adapter.on_completion(event)
    }

    pub fn announcements(&self) -> Vec<String> {
        self.adapter.broadcaster().messages()
    }

    /// Simulate a restart: close the ledger and open the same file again.
    pub fn restart(&mut self) -> Result<(), Error> {
        self.adapter.shutdown();
        self.adapter = start(&self.path)?;
        Ok(())
    }

    /// An independent ledger on the same database file, with its own
    /// connection.
    pub fn second_ledger(&self) -> Result<Ledger<SqliteStore>, EngineError> {
        Ledger::open_sqlite(&self.path)
    }

    fn inspect(&self) -> Result<Connection, Error> {
        Ok(Connection::open(&self.path)?)
    }

    pub fn tables(&self) -> Result<Tables, Error> {
        let conn = self.inspect()?;
        let count = |table: &str| -> Result<i64, rusqlite::Error> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        };
        Ok(Tables {
            players: count("player")?,
            achievements: count("achievement")?,
            completions: count("player_achievement")?,
        })
    }

    pub fn player_name(&self, player: PlayerId) -> Result<Option<String>, Error> {
        let name = self
            .inspect()?
            .query_row(
                "SELECT player_name FROM player WHERE player_uuid = ?1",
                [&player.to_bytes()[..]],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name)
    }

    pub fn achievement_name(&self, key: &str) -> Result<Option<String>, Error> {
        let name = self
            .inspect()?
            .query_row(
                "SELECT achievement_name FROM achievement WHERE achievement_key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name)
    }

    /// Stored player identifiers, decoded back from their 16-byte form.
    pub fn player_ids(&self) -> Result<Vec<PlayerId>, Error> {
        let conn = self.inspect()?;
        let mut stmt = conn.prepare("SELECT player_uuid FROM player ORDER BY id")?;
        let raw = stmt
            .query_map([], |row| row.get::<_, Vec<u8>>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        let mut ids = Vec::with_capacity(raw.len());
        for bytes in raw {
            ids.push(PlayerId::from_slice(&bytes)?);
        }
        Ok(ids)
    }

    /// (player, achievement key) for every completion fact.
    pub fn completions(&self) -> Result<Vec<(PlayerId, String)>, Error> {
        let conn = self.inspect()?;
        let mut stmt = conn.prepare(
            "SELECT p.player_uuid, a.achievement_key FROM player_achievement pa
             JOIN player p ON p.id = pa.player_id
             JOIN achievement a ON a.id = pa.achievement_id
             ORDER BY pa.id",
        )?;
        let raw = stmt
            .query_map([], |row| {
                Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        let mut out = Vec::with_capacity(raw.len());
        for (bytes, key) in raw {
            out.push((PlayerId::from_slice(&bytes)?, key));
        }
        Ok(out)
    }

    /// Make every completion-fact insert fail until `clear_fault`.
    pub fn inject_fault(&self) -> Result<(), Error> {
        self.inspect()?.execute_batch(
            "CREATE TRIGGER IF NOT EXISTS simulated_fault BEFORE INSERT ON player_achievement
             BEGIN SELECT RAISE(ABORT, 'simulated store fault'); END;",
        )?;
        Ok(())
    }

    pub fn clear_fault(&self) -> Result<(), Error> {
        self.inspect()?
            .execute_batch("DROP TRIGGER IF EXISTS simulated_fault;")?;
        Ok(())
    }

    /// Overwrite the database file with bytes SQLite cannot read. Call after
    /// `adapter.shutdown()` so no connection holds the file.
    pub fn corrupt_database(&self) -> Result<(), Error> {
        std::fs::write(&self.path, vec![0xA5; 4096])?;
        Ok(())
    }
}

fn start(path: &Path) -> Result<EventAdapter<SqliteStore, RecordingBroadcaster>, Error> {
    let ledger = Ledger::open_sqlite(path)?;
    Ok(EventAdapter::new(ledger, RecordingBroadcaster::default()))
}
