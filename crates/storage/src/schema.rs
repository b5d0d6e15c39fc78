use ::mysql::prelude::Queryable;
use rusqlite::Connection;

use crate::error::StorageError;

pub const PLAYER_TABLE: &str = "player";
pub const ACHIEVEMENT_TABLE: &str = "achievement";
pub const COMPLETION_TABLE: &str = "player_achievement";

/// Name of the unique key on (player_id, achievement_id).
pub const COMPLETION_PAIR_KEY: &str = "player_achievement_pair";

const SQLITE_BUSY_TIMEOUT_MS: u32 = 5000;

pub fn init_sqlite(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(&format!(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = {SQLITE_BUSY_TIMEOUT_MS};
    "
    ))
    .map_err(StorageError::schema)?;
    conn.execute_batch(SQLITE_SCHEMA_SQL)
        .map_err(StorageError::schema)?;
    Ok(())
}

const SQLITE_SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS player (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    player_uuid BLOB NOT NULL UNIQUE CHECK (length(player_uuid) = 16),
    player_name TEXT NOT NULL CHECK (length(player_name) <= 32)
);

CREATE TABLE IF NOT EXISTS achievement (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    achievement_key TEXT NOT NULL UNIQUE CHECK (length(achievement_key) <= 255),
    achievement_name TEXT NOT NULL CHECK (length(achievement_name) <= 255)
);

CREATE TABLE IF NOT EXISTS player_achievement (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    player_id INTEGER NOT NULL REFERENCES player (id),
    achievement_id INTEGER NOT NULL REFERENCES achievement (id),
    timestamp TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    CONSTRAINT player_achievement_pair UNIQUE (player_id, achievement_id)
);
";

const MYSQL_SCHEMA_SQL: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS player (
        id INT NOT NULL AUTO_INCREMENT PRIMARY KEY,
        player_uuid BINARY(16) NOT NULL UNIQUE,
        player_name VARCHAR(32) NOT NULL
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
    "CREATE TABLE IF NOT EXISTS achievement (
        id INT NOT NULL AUTO_INCREMENT PRIMARY KEY,
        achievement_key VARCHAR(255) NOT NULL UNIQUE,
        achievement_name VARCHAR(255) NOT NULL
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
    "CREATE TABLE IF NOT EXISTS player_achievement (
        id INT NOT NULL AUTO_INCREMENT PRIMARY KEY,
        player_id INT NOT NULL,
        achievement_id INT NOT NULL,
        timestamp TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE KEY player_achievement_pair (player_id, achievement_id),
        FOREIGN KEY (player_id) REFERENCES player (id),
        FOREIGN KEY (achievement_id) REFERENCES achievement (id)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
];

/// Tables created before the pair key existed get it added in place. Fails
/// if such a table already holds duplicate pairs.
const MYSQL_ADD_PAIR_KEY: &str = "ALTER TABLE player_achievement
    ADD UNIQUE KEY player_achievement_pair (player_id, achievement_id)";

const MYSQL_DUPLICATE_KEY_NAME: u16 = 1061;

pub fn init_mysql<C: Queryable>(conn: &mut C) -> Result<(), StorageError> {
    for statement in MYSQL_SCHEMA_SQL {
        conn.query_drop(statement).map_err(StorageError::schema)?;
    }
    match conn.query_drop(MYSQL_ADD_PAIR_KEY) {
        Ok(()) => Ok(()),
        Err(::mysql::Error::MySqlError(err)) if err.code == MYSQL_DUPLICATE_KEY_NAME => Ok(()),
        Err(err) => Err(StorageError::schema(err)),
    }
}
