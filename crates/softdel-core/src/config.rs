//! Per-model soft-delete configuration.
//!
//! A [`SoftDeleteConfig`] is resolved once when a model is defined and is
//! immutable afterwards. Every constructor validates, so holding one means
//! the sentinels are distinct and the column name is a plain identifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::condition::Condition;
use crate::error::{Result, SoftDeleteError};
use crate::ident::{ColumnRef, validate_identifier};
use crate::value::Value;

/// Default soft-delete column.
pub const DEFAULT_COLUMN_NAME: &str = "deleted";

/// A sentinel written to, or matched against, the soft-delete column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSentinel", into = "RawSentinel")]
pub enum Sentinel {
    Bool(bool),
    Integer(i64),
    Null,
    /// The current UTC time, stored as RFC 3339 text.
    Now,
}

impl Sentinel {
    /// Concrete value to write, evaluating `Now` at `now`.
    #[must_use]
    pub fn value_at(self, now: DateTime<Utc>) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(b),
            Self::Integer(i) => Value::Integer(i),
            Self::Null => Value::Null,
            Self::Now => Value::Text(now.to_rfc3339()),
        }
    }

    /// Fixed value of the sentinel; `None` for `Now`.
    #[must_use]
    pub const fn fixed_value(self) -> Option<Value> {
        match self {
            Self::Bool(b) => Some(Value::Bool(b)),
            Self::Integer(i) => Some(Value::Integer(i)),
            Self::Null => Some(Value::Null),
            Self::Now => None,
        }
    }
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Null => write!(f, "null"),
            Self::Now => write!(f, "now"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawSentinel {
    Bool(bool),
    Integer(i64),
    Keyword(String),
    Null,
}

impl TryFrom<RawSentinel> for Sentinel {
    type Error = SoftDeleteError;

    fn try_from(raw: RawSentinel) -> Result<Self> {
        match raw {
            RawSentinel::Bool(b) => Ok(Self::Bool(b)),
            RawSentinel::Integer(i) => Ok(Self::Integer(i)),
            RawSentinel::Null => Ok(Self::Null),
            RawSentinel::Keyword(k) if k.eq_ignore_ascii_case("now") => Ok(Self::Now),
            RawSentinel::Keyword(k) => Err(SoftDeleteError::invalid_config(format!(
                "unknown sentinel '{k}' (expected true/false, an integer, null or \"now\")"
            ))),
        }
    }
}

impl From<Sentinel> for RawSentinel {
    fn from(sentinel: Sentinel) -> Self {
        match sentinel {
            Sentinel::Bool(b) => Self::Bool(b),
            Sentinel::Integer(i) => Self::Integer(i),
            Sentinel::Null => Self::Null,
            Sentinel::Now => Self::Keyword("now".to_string()),
        }
    }
}

/// How `where_deleted` recognises a deleted row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletedMatch {
    /// Column equals the boolean `true` sentinel.
    Equality,
    /// Column differs from the not-deleted sentinel. Any third value in the
    /// column counts as deleted under this rule.
    NotActive,
}

/// Soft-delete state of a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    Active,
    Deleted,
    /// Neither sentinel, and not matched by `where_deleted` either.
    Unknown,
}

/// Soft-delete configuration for one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSoftDeleteConfig", into = "RawSoftDeleteConfig")]
pub struct SoftDeleteConfig {
    column_name: String,
    deleted_value: Sentinel,
    not_deleted_value: Sentinel,
}

impl Default for SoftDeleteConfig {
    fn default() -> Self {
        Self {
            column_name: DEFAULT_COLUMN_NAME.to_string(),
            deleted_value: Sentinel::Bool(true),
            not_deleted_value: Sentinel::Bool(false),
        }
    }
}

impl SoftDeleteConfig {
    #[must_use]
    pub fn builder() -> SoftDeleteConfigBuilder {
        SoftDeleteConfigBuilder::default()
    }

    /// Default sentinels on a custom column.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentifier` if `column_name` is not a plain identifier.
    pub fn with_column(column_name: impl Into<String>) -> Result<Self> {
        Self::builder().column_name(column_name).build()
    }

    #[must_use]
    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    #[must_use]
    pub const fn deleted_value(&self) -> Sentinel {
        self.deleted_value
    }

    #[must_use]
    pub const fn not_deleted_value(&self) -> Sentinel {
        self.not_deleted_value
    }

    /// The soft-delete column qualified with `table`.
    #[must_use]
    pub fn column(&self, table: &str) -> ColumnRef {
        ColumnRef::qualified(table, &self.column_name)
    }

    /// Value written by a soft delete performed at `now`.
    #[must_use]
    pub fn deleted_value_at(&self, now: DateTime<Utc>) -> Value {
        self.deleted_value.value_at(now)
    }

    /// Value written by an undelete.
    #[must_use]
    pub fn undelete_value(&self) -> Value {
        self.active_value()
    }

    /// Which rule `where_deleted` uses for this configuration.
    #[must_use]
    pub const fn deleted_match(&self) -> DeletedMatch {
        match self.deleted_value {
            Sentinel::Bool(true) => DeletedMatch::Equality,
            _ => DeletedMatch::NotActive,
        }
    }

    /// Condition selecting deleted rows of `table`.
    #[must_use]
    pub fn deleted_condition(&self, table: &str) -> Condition {
        let column = self.column(table);
        match self.deleted_match() {
            DeletedMatch::Equality => Condition::eq(column, true),
            DeletedMatch::NotActive => Condition::ne(column, self.active_value()),
        }
    }

    /// Condition selecting active rows of `table`.
    #[must_use]
    pub fn not_deleted_condition(&self, table: &str) -> Condition {
        Condition::eq(self.column(table), self.active_value())
    }

    /// Classify a stored column value.
    #[must_use]
    pub fn classify(&self, value: &Value) -> RowState {
        if value.sql_is(&self.active_value()) {
            return RowState::Active;
        }
        match self.deleted_match() {
            DeletedMatch::Equality if value.sql_is(&Value::Bool(true)) => RowState::Deleted,
            DeletedMatch::Equality => RowState::Unknown,
            DeletedMatch::NotActive if value.is_null() => RowState::Unknown,
            DeletedMatch::NotActive => RowState::Deleted,
        }
    }

    fn active_value(&self) -> Value {
        // `Now` is rejected for the not-deleted sentinel at construction.
        self.not_deleted_value.fixed_value().unwrap_or_default()
    }

    fn validate(&self) -> Result<()> {
        validate_identifier(&self.column_name)?;

        match self.deleted_value {
            Sentinel::Null | Sentinel::Bool(false) => {
                return Err(SoftDeleteError::invalid_config(format!(
                    "deleted_value cannot be {}",
                    self.deleted_value
                )));
            }
            Sentinel::Bool(true) | Sentinel::Integer(_) | Sentinel::Now => {}
        }
        match self.not_deleted_value {
            Sentinel::Now | Sentinel::Bool(true) => {
                return Err(SoftDeleteError::invalid_config(format!(
                    "not_deleted_value cannot be {}",
                    self.not_deleted_value
                )));
            }
            Sentinel::Bool(false) | Sentinel::Integer(_) | Sentinel::Null => {}
        }

        if let Some(deleted) = self.deleted_value.fixed_value() {
            if deleted.sql_is(&self.active_value()) {
                return Err(SoftDeleteError::SentinelCollision {
                    deleted: self.deleted_value.to_string(),
                    not_deleted: self.not_deleted_value.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Builder for [`SoftDeleteConfig`].
#[derive(Debug, Clone)]
pub struct SoftDeleteConfigBuilder {
    inner: SoftDeleteConfig,
}

impl Default for SoftDeleteConfigBuilder {
    fn default() -> Self {
        Self {
            inner: SoftDeleteConfig::default(),
        }
    }
}

impl SoftDeleteConfigBuilder {
    #[must_use]
    pub fn column_name(mut self, column_name: impl Into<String>) -> Self {
        self.inner.column_name = column_name.into();
        self
    }

    #[must_use]
    pub const fn deleted_value(mut self, sentinel: Sentinel) -> Self {
        self.inner.deleted_value = sentinel;
        self
    }

    #[must_use]
    pub const fn not_deleted_value(mut self, sentinel: Sentinel) -> Self {
        self.inner.not_deleted_value = sentinel;
        self
    }

    /// Validate and produce the configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentifier`, `InvalidConfig` or `SentinelCollision`
    /// when the configuration violates its invariants.
    pub fn build(self) -> Result<SoftDeleteConfig> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}

fn default_column_name() -> String {
    DEFAULT_COLUMN_NAME.to_string()
}

const fn default_deleted_value() -> Sentinel {
    Sentinel::Bool(true)
}

const fn default_not_deleted_value() -> Sentinel {
    Sentinel::Bool(false)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSoftDeleteConfig {
    #[serde(default = "default_column_name")]
    column_name: String,
    #[serde(default = "default_deleted_value")]
    deleted_value: Sentinel,
    #[serde(default = "default_not_deleted_value")]
    not_deleted_value: Sentinel,
}

impl TryFrom<RawSoftDeleteConfig> for SoftDeleteConfig {
    type Error = SoftDeleteError;

    fn try_from(raw: RawSoftDeleteConfig) -> Result<Self> {
        SoftDeleteConfig::builder()
            .column_name(raw.column_name)
            .deleted_value(raw.deleted_value)
            .not_deleted_value(raw.not_deleted_value)
            .build()
    }
}

impl From<SoftDeleteConfig> for RawSoftDeleteConfig {
    fn from(config: SoftDeleteConfig) -> Self {
        Self {
            column_name: config.column_name,
            deleted_value: config.deleted_value,
            not_deleted_value: config.not_deleted_value,
        }
    }
}
