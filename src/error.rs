//! Error types for `softdel`.
//!
//! Wraps [`softdel_core::SoftDeleteError`] and `SQLite` failures. SQLite's
//! "no such column" is surfaced as [`SoftdelError::ColumnNotFound`] because
//! that is what a model pointed at a table without its soft-delete column
//! runs into.

use std::path::PathBuf;

use softdel_core::SoftDeleteError;
use thiserror::Error;

/// Primary error type for softdel operations.
#[derive(Error, Debug)]
pub enum SoftdelError {
    // === Query Errors ===
    /// A referenced column does not exist in the queried tables.
    #[error("Column not found: {column}")]
    ColumnNotFound { column: String },

    /// A soft-delete operation was used on a model without soft-delete configuration.
    #[error("Soft delete is not enabled for table '{table}'")]
    SoftDeleteNotEnabled { table: String },

    /// Eager expression names a relation the model does not define.
    #[error("Relation '{relation}' is not defined on '{table}'")]
    UnknownRelation { table: String, relation: String },

    /// Named filter is not registered on the model.
    #[error("Named filter '{filter}' is not defined on '{table}'")]
    UnknownFilter { table: String, filter: String },

    /// An instance query was built from a row without its primary key.
    #[error("Row has no value for primary key '{column}' of '{table}'")]
    MissingPrimaryKey { table: String, column: String },

    /// No row has the requested primary key.
    #[error("Row not found: {table} #{id}")]
    RowNotFound { table: String, id: String },

    /// `patch` was called without any column.
    #[error("Patch on '{table}' sets no columns")]
    EmptyPatch { table: String },

    /// `limit` or `order_by` on an update or delete.
    #[error("'{clause}' cannot be used to narrow an update or delete on '{table}'")]
    MutationClause {
        table: String,
        clause: &'static str,
    },

    /// A terminal expected a different kind of output.
    #[error("Query produced {found}, expected {expected}")]
    UnexpectedOutput {
        expected: &'static str,
        found: &'static str,
    },

    // === Soft-delete Core Errors ===
    #[error(transparent)]
    Core(#[from] SoftDeleteError),

    // === Configuration Errors ===
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found.
    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    /// Table is not described in the workspace configuration.
    #[error("Table '{table}' is not configured")]
    TableNotConfigured { table: String },

    /// `sd doctor` found failing checks.
    #[error("Doctor found {problems} problem(s)")]
    Doctor { problems: usize },

    /// Multiple validation errors occurred.
    #[error("Validation errors: {errors:?}")]
    Validation { errors: Vec<ValidationError> },

    // === Storage Errors ===
    /// SQLite error.
    #[error("Database error: {0}")]
    Database(#[source] rusqlite::Error),

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parse error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl From<rusqlite::Error> for SoftdelError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(_, Some(message)) = &err {
            if let Some(column) = message.strip_prefix("no such column: ") {
                return Self::ColumnNotFound {
                    column: column.to_string(),
                };
            }
        }
        Self::Database(err)
    }
}

/// A single field validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

impl SoftdelError {
    #[must_use]
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config(reason.into())
    }

    /// Whether this error came from a lifecycle hook.
    #[must_use]
    pub const fn is_hook_failure(&self) -> bool {
        matches!(self, Self::Core(err) if err.is_hook_failure())
    }
}

/// Result type using `SoftdelError`.
pub type Result<T> = std::result::Result<T, SoftdelError>;
