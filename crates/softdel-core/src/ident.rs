//! SQL identifiers and column references.
//!
//! Table and column names are interpolated into SQL text, so only plain
//! identifiers are accepted.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::error::{Result, SoftDeleteError};

static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// Whether `ident` is a plain SQL identifier.
#[must_use]
pub fn is_valid_identifier(ident: &str) -> bool {
    IDENT_RE.is_match(ident)
}

/// Validate a plain SQL identifier.
///
/// # Errors
///
/// Returns `InvalidIdentifier` if `ident` contains anything other than
/// ASCII letters, digits and underscores, or starts with a digit.
pub fn validate_identifier(ident: &str) -> Result<()> {
    if is_valid_identifier(ident) {
        Ok(())
    } else {
        Err(SoftDeleteError::InvalidIdentifier {
            ident: ident.to_string(),
        })
    }
}

/// Double-quote an identifier for SQL.
#[must_use]
pub fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// A column, optionally qualified with its table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub column: String,
}

impl ColumnRef {
    #[must_use]
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            table: None,
            column: column.into(),
        }
    }

    #[must_use]
    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            column: column.into(),
        }
    }

    /// Parse `column` or `table.column`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentifier` if either part is not a plain identifier.
    pub fn parse(input: &str) -> Result<Self> {
        let column_ref = match input.split_once('.') {
            Some((table, column)) => Self::qualified(table, column),
            None => Self::new(input),
        };
        if let Some(table) = &column_ref.table {
            validate_identifier(table)?;
        }
        validate_identifier(&column_ref.column)?;
        Ok(column_ref)
    }

    /// Render as quoted SQL, e.g. `"TestObjects"."deleted"`.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match &self.table {
            Some(table) => format!("{}.{}", quote(table), quote(&self.column)),
            None => quote(&self.column),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{table}.{}", self.column),
            None => write!(f, "{}", self.column),
        }
    }
}
