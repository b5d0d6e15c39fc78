pub mod error;
pub mod mysql_store;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use error::{StorageError, WriteStep};
pub use mysql_store::MySqlStore;
pub use sqlite::SqliteStore;
pub use traits::*;
