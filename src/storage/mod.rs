//! `SQLite` storage layer for `softdel`.
//!
//! [`Database`] owns a `rusqlite` connection and hands out lazy
//! [`QueryBuilder`]s bound to a [`Model`]. Nothing touches the database
//! until a terminal (`execute`, `fetch_all`, `fetch_first`, `run`) is called.
//!
//! # Submodules
//!
//! - [`query`] - chainable query builder with soft-delete operations
//! - [`filters`] - named filter registry, including `deleted`/`notDeleted`
//! - [`relation`] - relation definitions and eager loading
//! - `sql` - statement rendering and value conversion

pub mod filters;
pub mod query;
pub mod relation;
mod sql;

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, params_from_iter};
use softdel_core::Value;
use tracing::debug;

use crate::error::{Result, SoftdelError};
use crate::model::{Model, Row};

pub use filters::{FilterRegistry, NamedFilter, effective_filters, soft_delete_filters};
pub use query::{Order, QueryBuilder, QueryOutput};
pub use relation::{Relation, RelationKind, Through};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A `SQLite` database the query layer runs against.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database file.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(Self { conn })
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns `Database` if `SQLite` cannot allocate the connection.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    #[must_use]
    pub const fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run raw SQL, e.g. schema setup.
    ///
    /// # Errors
    ///
    /// Returns the mapped `SQLite` error.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Start a query over `model`'s table.
    #[must_use]
    pub fn query<'a>(&'a self, model: &'a dyn Model) -> QueryBuilder<'a> {
        QueryBuilder::new(self, model)
    }

    /// Start a query scoped to the single row `row` (by primary key).
    ///
    /// A row without a primary key value yields a builder that fails with
    /// `MissingPrimaryKey` when executed.
    #[must_use]
    pub fn instance_query<'a>(&'a self, model: &'a dyn Model, row: &Row) -> QueryBuilder<'a> {
        let query = QueryBuilder::new(self, model).for_instance();
        match row.id(model) {
            Some(id) if !id.is_null() => query.find_by_id(id.clone()),
            _ => query.fail(SoftdelError::MissingPrimaryKey {
                table: model.table_name().to_string(),
                column: model.id_column().to_string(),
            }),
        }
    }

    /// Column names of `table`, in declaration order. Empty if the table
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns the mapped `SQLite` error.
    pub fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", softdel_core::ident::quote(table)))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
        let mut columns = Vec::new();
        for row in rows {
            columns.push(row?);
        }
        Ok(columns)
    }

    // ========================================================================
    // Statement execution
    // ========================================================================

    pub(crate) fn run_statement(&self, sql: &str, params: &[Value]) -> Result<usize> {
        debug!(sql, params = params.len(), "executing statement");
        let mut stmt = self.conn.prepare(sql)?;
        let affected = stmt.execute(params_from_iter(params.iter().map(sql::to_sql_value)))?;
        Ok(affected)
    }

    pub(crate) fn select_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        debug!(sql, params = params.len(), "selecting rows");
        let mut stmt = self.conn.prepare(sql)?;
        let names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let mut rows = stmt.query(params_from_iter(params.iter().map(sql::to_sql_value)))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Row::new();
            for (index, name) in names.iter().enumerate() {
                record.set(name.clone(), sql::from_sql_ref(row.get_ref(index)?));
            }
            out.push(record);
        }
        Ok(out)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.conn.path())
            .finish()
    }
}
