use std::time::Duration;

use achievelog_core::{CompletionEvent, ConnectionConfig};
use mysql::prelude::Queryable;
use mysql::{Opts, OptsBuilder, Pool, PooledConn, Transaction, TxOpts};

use crate::error::{StorageError, WriteStep};
use crate::traits::{CompletionStore, RecordedCompletion};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const IO_TIMEOUT: Duration = Duration::from_secs(30);

/// Production backend. Each write checks one connection out of the pool and
/// returns it when done.
pub struct MySqlStore {
    pool: Pool,
}

impl std::fmt::Debug for MySqlStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlStore").finish()
    }
}

impl MySqlStore {
    /// Connect, verify the handshake with one pooled connection, and create
    /// the schema on it.
    pub fn open(config: &ConnectionConfig) -> Result<Self, StorageError> {
        config.validate()?;
        let pool = Pool::new(connection_opts(config)).map_err(StorageError::connection)?;
        let store = Self { pool };
        store.ensure_schema()?;
        Ok(store)
    }

    fn conn(&self) -> Result<PooledConn, StorageError> {
        self.pool.get_conn().map_err(StorageError::connection)
    }
}

fn connection_opts(config: &ConnectionConfig) -> Opts {
    OptsBuilder::new()
        .ip_or_hostname(Some(config.host.clone()))
        .tcp_port(config.port)
        .db_name(Some(config.database.clone()))
        .user(Some(config.username.clone()))
        .pass(Some(config.password.clone()))
        .tcp_connect_timeout(Some(CONNECT_TIMEOUT))
        .read_timeout(Some(IO_TIMEOUT))
        .write_timeout(Some(IO_TIMEOUT))
        .into()
}

// `id = id` turns a duplicate key into a no-op that reports zero rows.
const UPSERT_PLAYER_SQL: &str = "INSERT INTO player (player_uuid, player_name) VALUES (?, ?)
     ON DUPLICATE KEY UPDATE id = id";
const UPSERT_ACHIEVEMENT_SQL: &str =
    "INSERT INTO achievement (achievement_key, achievement_name) VALUES (?, ?)
     ON DUPLICATE KEY UPDATE id = id";
const INSERT_COMPLETION_SQL: &str =
    "INSERT INTO player_achievement (player_id, achievement_id) VALUES (?, ?)
     ON DUPLICATE KEY UPDATE id = id";

// Locking reads see rows committed after the transaction's snapshot, so a
// key another writer inserted concurrently still resolves.
const PLAYER_ID_SQL: &str = "SELECT id FROM player WHERE player_uuid = ? LOCK IN SHARE MODE";
const ACHIEVEMENT_ID_SQL: &str =
    "SELECT id FROM achievement WHERE achievement_key = ? LOCK IN SHARE MODE";

/// Run an upsert and look up the row's surrogate id by its natural key.
fn upsert_and_resolve(
    tx: &mut Transaction<'_>,
    step: WriteStep,
    insert: &str,
    insert_params: (mysql::Value, mysql::Value),
    select: &str,
    key: mysql::Value,
) -> Result<i64, StorageError> {
    tx.exec_drop(insert, insert_params)
        .map_err(|e| StorageError::persistence(step, e))?;
    tx.exec_first::<i64, _, _>(select, (key,))
        .map_err(|e| StorageError::persistence(step, e))?
        .ok_or_else(|| StorageError::persistence(step, "row missing after upsert"))
}

impl CompletionStore for MySqlStore {
    fn backend(&self) -> &'static str {
        "mysql"
    }

    fn ensure_schema(&self) -> Result<(), StorageError> {
        let mut conn = self.conn()?;
        crate::schema::init_mysql(&mut conn)
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

        let player_uuid = event.player_id.to_bytes().to_vec();
        let mut conn = self.conn()?;
        let mut tx = conn
            .start_transaction(TxOpts::default())
            .map_err(|e| StorageError::persistence(WriteStep::Begin, e))?;

        let player_row = upsert_and_resolve(
            &mut tx,
            WriteStep::Player,
            UPSERT_PLAYER_SQL,
            (player_uuid.clone().into(), event.player_name.clone().into()),
            PLAYER_ID_SQL,
            player_uuid.into(),
        )?;

        let achievement_row = upsert_and_resolve(
            &mut tx,
            WriteStep::Achievement,
            UPSERT_ACHIEVEMENT_SQL,
            (
                event.achievement_key.clone().into(),
                event.achievement_name.clone().into(),
            ),
            ACHIEVEMENT_ID_SQL,
            event.achievement_key.clone().into(),
        )?;

        let inserted = tx
            .exec_iter(INSERT_COMPLETION_SQL, (player_row, achievement_row))
            .map(|result| result.affected_rows())
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
        drop(self.pool);
        Ok(())
    }
}
