//! Row-matching conditions.
//!
//! A query's WHERE clause is a conjunction of [`Condition`]s. Rendering to
//! SQL happens in the storage layer; this module only describes them.

use crate::ident::ColumnRef;
use crate::value::Value;

/// Comparison applied to a column.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(Value),
    Ne(Value),
    IsNull,
    IsNotNull,
    In(Vec<Value>),
}

/// A single column predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: ColumnRef,
    pub predicate: Predicate,
}

impl Condition {
    /// Equality. Comparing with `Null` becomes `IS NULL`.
    #[must_use]
    pub fn eq(column: ColumnRef, value: impl Into<Value>) -> Self {
        let value = value.into();
        let predicate = if value.is_null() {
            Predicate::IsNull
        } else {
            Predicate::Eq(value)
        };
        Self { column, predicate }
    }

    /// Inequality. Comparing with `Null` becomes `IS NOT NULL`.
    #[must_use]
    pub fn ne(column: ColumnRef, value: impl Into<Value>) -> Self {
        let value = value.into();
        let predicate = if value.is_null() {
            Predicate::IsNotNull
        } else {
            Predicate::Ne(value)
        };
        Self { column, predicate }
    }

    #[must_use]
    pub const fn is_null(column: ColumnRef) -> Self {
        Self {
            column,
            predicate: Predicate::IsNull,
        }
    }

    #[must_use]
    pub const fn is_not_null(column: ColumnRef) -> Self {
        Self {
            column,
            predicate: Predicate::IsNotNull,
        }
    }

    #[must_use]
    pub fn is_in(column: ColumnRef, values: Vec<Value>) -> Self {
        Self {
            column,
            predicate: Predicate::In(values),
        }
    }

    /// Evaluate against an in-memory value, with SQL semantics
    /// (`NULL = x` and `NULL != x` are both false).
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        match &self.predicate {
            Predicate::Eq(expected) => !value.is_null() && value.sql_is(expected),
            Predicate::Ne(expected) => !value.is_null() && !value.sql_is(expected),
            Predicate::IsNull => value.is_null(),
            Predicate::IsNotNull => !value.is_null(),
            Predicate::In(values) => !value.is_null() && values.iter().any(|v| value.sql_is(v)),
        }
    }
}
