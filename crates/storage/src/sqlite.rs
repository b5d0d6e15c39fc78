use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use achievelog_core::CompletionEvent;
use rusqlite::{Connection, TransactionBehavior};

use crate::error::{StorageError, WriteStep};
use crate::traits::{CompletionStore, RecordedCompletion};

/// Embedded backend. One connection, serialized behind a mutex because
/// `rusqlite::Connection` is not `Sync`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(StorageError::connection)?;
        crate::schema::init_sqlite(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(StorageError::connection)?;
        crate::schema::init_sqlite(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::connection("sqlite connection mutex poisoned"))
    }
}

impl CompletionStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    fn ensure_schema(&self) -> Result<(), StorageError> {
        let conn = self.lock()?;
        crate::schema::init_sqlite(&conn)
    }

    fn record_completion(
        &self,
        event: &CompletionEvent,
    ) -> Result<RecordedCompletion, StorageError> {
        event
            .validate_player()
            .map_err(|e| StorageError::persistence(WriteStep::Player, e))?;
        event
            .validate_achievement()
            .map_err(|e| StorageError::persistence(WriteStep::Achievement, e))?;

        let player_uuid = event.player_id.to_bytes();
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| StorageError::persistence(WriteStep::Begin, e))?;

        let player_row: i64 = tx
            .execute(
                "INSERT INTO player (player_uuid, player_name) VALUES (?1, ?2)
                 ON CONFLICT (player_uuid) DO NOTHING",
                rusqlite::params![&player_uuid[..], event.player_name],
            )
            .and_then(|_| {
                tx.query_row(
                    "SELECT id FROM player WHERE player_uuid = ?1",
                    rusqlite::params![&player_uuid[..]],
                    |row| row.get(0),
                )
            })
            .map_err(|e| StorageError::persistence(WriteStep::Player, e))?;

        let achievement_row: i64 = tx
            .execute(
                "INSERT INTO achievement (achievement_key, achievement_name) VALUES (?1, ?2)
                 ON CONFLICT (achievement_key) DO NOTHING",
                rusqlite::params![event.achievement_key, event.achievement_name],
            )
            .and_then(|_| {
                tx.query_row(
                    "SELECT id FROM achievement WHERE achievement_key = ?1",
                    rusqlite::params![event.achievement_key],
                    |row| row.get(0),
                )
            })
            .map_err(|e| StorageError::persistence(WriteStep::Achievement, e))?;

        let inserted = tx
            .execute(
                "INSERT INTO player_achievement (player_id, achievement_id) VALUES (?1, ?2)
                 ON CONFLICT (player_id, achievement_id) DO NOTHING",
                rusqlite::params![player_row, achievement_row],
            )
            .map_err(|e| StorageError::persistence(WriteStep::Completion, e))?;

        tx.commit()
            .map_err(|e| StorageError::persistence(WriteStep::Commit, e))?;

        Ok(RecordedCompletion {
            player_row,
            achievement_row,
            newly_recorded: inserted == 1,
        })
    }

    fn close(self) -> Result<(), StorageError> {
        let conn = self
            .conn
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        conn.close()
            .map_err(|(_, e)| StorageError::connection(e))
    }
}
