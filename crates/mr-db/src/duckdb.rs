//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::Database;
use duckdb::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// DuckDB database backend.
///
/// Statements run in DuckDB's autocommit mode: each one that succeeds is
/// durable immediately, and a later failure never undoes it.
pub struct DuckDbBackend {
    conn: Mutex<Option<Connection>>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self::from_connection(conn))
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self::from_connection(conn))
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(Some(conn)),
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Option<Connection>>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Run `body` against the open connection
    fn with_conn<T>(&self, body: impl FnOnce(&Connection) -> DbResult<T>) -> DbResult<T> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(DbError::Closed)?;
        body(conn)
    }
}

impl Database for DuckDbBackend {
    fn execute(&self, sql: &str) -> DbResult<()> {
        self.with_conn(|conn| {
            log::debug!("Executing: {sql}");
            conn.execute_batch(sql)?;
            Ok(())
        })
    }

    fn query_scalar(&self, sql: &str) -> DbResult<Option<String>> {
        self.with_conn(|conn| {
            match conn.query_row(sql, [], |row| row.get::<_, Option<String>>(0)) {
                Ok(value) => Ok(value),
                Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(DbError::ExecutionError(format!("{e}: {sql}"))),
            }
        })
    }

    fn commit(&self) -> DbResult<()> {
        self.with_conn(|conn| match conn.execute_batch("COMMIT") {
            Ok(()) => Ok(()),
            // Autocommit mode: nothing was pending.
            Err(e) if e.to_string().contains("no transaction is active") => Ok(()),
            Err(e) => Err(DbError::ExecutionError(format!("COMMIT failed: {e}"))),
        })
    }

    fn rollback(&self) -> DbResult<()> {
        self.with_conn(|conn| match conn.execute_batch("ROLLBACK") {
            Ok(()) => Ok(()),
            Err(e) if e.to_string().contains("no transaction is active") => Ok(()),
            Err(e) => Err(DbError::ExecutionError(format!("ROLLBACK failed: {e}"))),
        })
    }

    fn close(&self) -> DbResult<()> {
        let mut guard = self.lock()?;
        match guard.take() {
            Some(conn) => conn
                .close()
                .map_err(|(_, e)| DbError::ConnectionError(format!("close failed: {e}"))),
            None => Ok(()),
        }
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
