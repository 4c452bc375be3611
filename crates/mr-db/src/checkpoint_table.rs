//! Checkpoints stored in a single-row table of the target database
//!
//! The table holds one row (`id = 1`) with a `last_file_<group>` column per
//! migration group. Writes commit immediately on the same connection the
//! engine uses for scripts.

use crate::error::{DbError, DbResult};
use crate::sql_utils::{quote_ident, quote_literal, quote_qualified};
use crate::traits::Database;
use mr_core::{CheckpointStore, CoreError, CoreResult};
use std::sync::Arc;

/// Key of the single checkpoint row
const CHECKPOINT_ROW_ID: i32 = 1;

/// Checkpoint store backed by a database table
pub struct TableCheckpointStore {
    db: Arc<dyn Database>,
    table: String,
    read_only: bool,
}

impl TableCheckpointStore {
    /// Create a store over `table` on the shared connection
    pub fn new(db: Arc<dyn Database>, table: impl Into<String>) -> Self {
        Self {
            db,
            table: table.into(),
            read_only: false,
        }
    }

    /// Create a store that never changes the database.
    ///
    /// The table is not prepared; a missing table or group column reads as
    /// "no checkpoint" and every `set` is refused.
    pub fn read_only(db: Arc<dyn Database>, table: impl Into<String>) -> Self {
        Self {
            read_only: true,
            ..Self::new(db, table)
        }
    }

    /// Create the table if needed, add a column for every group, and seed
    /// the checkpoint row.
    pub fn prepare(&self, groups: &[&str]) -> DbResult<()> {
        let table = quote_qualified(&self.table);
        self.db.execute(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (id INTEGER PRIMARY KEY)"
        ))?;
        for group in groups {
            self.db.execute(&format!(
                "ALTER TABLE {table} ADD COLUMN IF NOT EXISTS {} VARCHAR",
                column_for(group)
            ))?;
        }
        self.db.execute(&format!(
            "INSERT INTO {table} (id) SELECT {CHECKPOINT_ROW_ID} \
             WHERE NOT EXISTS (SELECT 1 FROM {table} WHERE id = {CHECKPOINT_ROW_ID})"
        ))?;
        self.db.commit()?;
        log::debug!(
            "Checkpoint table {} ready for groups: {}",
            self.table,
            groups.join(", ")
        );
        Ok(())
    }

    /// Name of the checkpoint table
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Whether the table has a checkpoint column for `group`
    fn has_column(&self, group: &str) -> DbResult<bool> {
        let mut parts = self.table.rsplit('.');
        let table = parts.next().unwrap_or_default();
        let mut sql = format!(
            "SELECT COUNT(*)::VARCHAR FROM information_schema.columns \
             WHERE table_name = {} AND column_name = {}",
            quote_literal(table),
            quote_literal(&format!("last_file_{group}"))
        );
        if let Some(schema) = parts.next() {
            sql.push_str(&format!(" AND table_schema = {}", quote_literal(schema)));
        }
        let count = self.db.query_scalar(&sql)?;
        Ok(count.is_some_and(|n| n != "0"))
    }
}

/// Quoted column holding `group`'s last file
fn column_for(group: &str) -> String {
    quote_ident(&format!("last_file_{group}"))
}

impl CheckpointStore for TableCheckpointStore {
    fn get(&self, group: &str) -> CoreResult<Option<String>> {
        let read_error = |e: DbError| CoreError::CheckpointRead {
            group: group.to_string(),
            message: e.to_string(),
        };
        if self.read_only && !self.has_column(group).map_err(read_error)? {
            return Ok(None);
        }

        let sql = format!(
            "SELECT {} FROM {} WHERE id = {CHECKPOINT_ROW_ID}",
            column_for(group),
            quote_qualified(&self.table)
        );
        self.db.query_scalar(&sql).map_err(read_error)
    }

    fn set(&mut self, group: &str, file_name: &str) -> CoreResult<()> {
        if self.read_only {
            return Err(CoreError::CheckpointWrite {
                group: group.to_string(),
                file: file_name.to_string(),
                message: format!("checkpoint table {} is opened read-only", self.table),
            });
        }

        let sql = format!(
            "UPDATE {} SET {} = {} WHERE id = {CHECKPOINT_ROW_ID}",
            quote_qualified(&self.table),
            column_for(group),
            quote_literal(file_name)
        );
        self.db
            .execute(&sql)
            .and_then(|()| self.db.commit())
            .map_err(|e| CoreError::CheckpointWrite {
                group: group.to_string(),
                file: file_name.to_string(),
                message: e.to_string(),
            })
    }

    fn backend_name(&self) -> &'static str {
        "table"
    }
}

#[cfg(test)]
#[path = "checkpoint_table_test.rs"]
mod tests;
