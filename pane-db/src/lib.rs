//! SQLite storage for the Pane licensing backend.
//!
//! One connection guarded by a mutex serves the whole process. The mutex
//! serializes writers, and [`Db::with_tx`] additionally wraps a closure in
//! an IMMEDIATE transaction, so read-count-then-insert sequences (the
//! activation-slot check) can never interleave. A short busy timeout keeps
//! any single call from blocking indefinitely; hitting it surfaces as the
//! retryable [`StoreError::Busy`].

mod error;
mod schema;

pub use error::{StoreError, StoreResult};

use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_millis(2500);

/// Handle to the licensing database.
pub struct Db {
    conn: Mutex<Connection>,
}

impl Db {
    /// Opens (creating if needed) a database file and applies the schema.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init(conn)
    }

    /// Opens a private in-memory database, for tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Runs a closure against the connection.
    pub fn with_conn<T, E>(&self, f: impl FnOnce(&Connection) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let guard = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        f(&guard)
    }

    /// Runs a closure inside an IMMEDIATE transaction.
    ///
    /// The transaction commits if the closure returns `Ok` and rolls back
    /// on `Err`, so a failed closure never leaves a partial write behind.
    pub fn with_tx<T, E>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let mut guard = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let tx = guard
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StoreError::from)?;
        let out = f(&tx)?;
        tx.commit().map_err(StoreError::from)?;
        Ok(out)
    }

    /// Runs a read-only closure, retrying exactly once on a transient
    /// failure. Non-transient errors propagate immediately.
    pub fn with_read<T>(&self, f: impl Fn(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        let guard = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        match f(&guard) {
            Err(e) if e.is_transient() => {
                tracing::debug!("transient read failure, retrying once");
                f(&guard)
            }
            other => other,
        }
    }
}
