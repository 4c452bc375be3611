//! Database trait definition

use crate::error::DbResult;

/// Connection the engine runs script statements through.
///
/// Calls block until the database answers. Implementations must be
/// Send + Sync so one connection can be shared by the engine and the table
/// checkpoint store.
pub trait Database: Send + Sync {
    /// Execute a single statement
    fn execute(&self, sql: &str) -> DbResult<()>;

    /// Run a query and return the first column of the first row.
    ///
    /// Returns `None` for no rows or a NULL value.
    fn query_scalar(&self, sql: &str) -> DbResult<Option<String>>;

    /// Commit any open transaction. Succeeds when none is open.
    fn commit(&self) -> DbResult<()>;

    /// Abandon any open transaction. Succeeds when none is open.
    fn rollback(&self) -> DbResult<()>;

    /// Close the connection. Later calls fail with [`DbError::Closed`].
    ///
    /// [`DbError::Closed`]: crate::error::DbError::Closed
    fn close(&self) -> DbResult<()>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
