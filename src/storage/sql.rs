//! SQL rendering for the query builder.
//!
//! Every identifier is double-quoted and every value is bound as a
//! positional parameter.

use std::fmt::Write as _;

use rusqlite::types::{Value as SqlValue, ValueRef};
use softdel_core::ident::quote;
use softdel_core::{ColumnRef, Condition, Predicate, Value};

use super::query::Order;

/// Alias of the owner key column added to relation loading queries.
pub const OWNER_KEY: &str = "__owner_key";

/// An inner join used when loading through a join table.
#[derive(Debug, Clone)]
pub struct Join {
    pub table: String,
    pub left: ColumnRef,
    pub right: ColumnRef,
}

/// The clauses shared by select, update and delete statements.
#[derive(Debug, Default)]
pub struct Clauses<'q> {
    pub conditions: &'q [Condition],
    pub joins: &'q [Join],
    pub order_by: &'q [(ColumnRef, Order)],
    pub limit: Option<usize>,
}

pub fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(flag) => SqlValue::Integer(i64::from(*flag)),
        Value::Integer(number) => SqlValue::Integer(*number),
        Value::Real(number) => SqlValue::Real(*number),
        Value::Text(text) => SqlValue::Text(text.clone()),
    }
}

/// Convert a fetched column. Blobs come back as lowercase hex text.
pub fn from_sql_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(number) => Value::Integer(number),
        ValueRef::Real(number) => Value::Real(number),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Text(bytes.iter().fold(String::new(), |mut hex, byte| {
            let _ = write!(hex, "{byte:02x}");
            hex
        })),
    }
}

fn render_condition(condition: &Condition, params: &mut Vec<Value>) -> String {
    let column = condition.column.to_sql();
    match &condition.predicate {
        Predicate::Eq(value) => {
            params.push(value.clone());
            format!("{column} = ?")
        }
        Predicate::Ne(value) => {
            params.push(value.clone());
            format!("{column} != ?")
        }
        Predicate::IsNull => format!("{column} IS NULL"),
        Predicate::IsNotNull => format!("{column} IS NOT NULL"),
        // `IN ()` is not valid SQLite; an empty set matches nothing.
        Predicate::In(values) if values.is_empty() => "0".to_string(),
        Predicate::In(values) => {
            params.extend(values.iter().cloned());
            let marks = vec!["?"; values.len()].join(", ");
            format!("{column} IN ({marks})")
        }
    }
}

fn render_where(conditions: &[Condition], params: &mut Vec<Value>) -> String {
    if conditions.is_empty() {
        return String::new();
    }
    let rendered: Vec<String> = conditions
        .iter()
        .map(|condition| render_condition(condition, params))
        .collect();
    format!(" WHERE {}", rendered.join(" AND "))
}

/// `SELECT "t".* [, extra AS alias] FROM "t" [JOIN ...] [WHERE ...] [ORDER BY ...] [LIMIT n]`
pub fn select(
    table: &str,
    extra: &[(ColumnRef, &str)],
    clauses: &Clauses<'_>,
    params: &mut Vec<Value>,
) -> String {
    let table_sql = quote(table);
    let mut sql = format!("SELECT {table_sql}.*");
    for (column, alias) in extra {
        let _ = write!(sql, ", {} AS {}", column.to_sql(), quote(alias));
    }
    let _ = write!(sql, " FROM {table_sql}");
    for join in clauses.joins {
        let _ = write!(
            sql,
            " INNER JOIN {} ON {} = {}",
            quote(&join.table),
            join.left.to_sql(),
            join.right.to_sql()
        );
    }
    sql.push_str(&render_where(clauses.conditions, params));
    if !clauses.order_by.is_empty() {
        let order: Vec<String> = clauses
            .order_by
            .iter()
            .map(|(column, order)| format!("{} {}", column.to_sql(), order.as_sql()))
            .collect();
        let _ = write!(sql, " ORDER BY {}", order.join(", "));
    }
    if let Some(limit) = clauses.limit {
        let _ = write!(sql, " LIMIT {limit}");
    }
    sql
}

pub fn insert(table: &str, values: &[(String, Value)], params: &mut Vec<Value>) -> String {
    if values.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES", quote(table));
    }
    let columns: Vec<String> = values.iter().map(|(column, _)| quote(column)).collect();
    params.extend(values.iter().map(|(_, value)| value.clone()));
    let marks = vec!["?"; values.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({marks})",
        quote(table),
        columns.join(", ")
    )
}

pub fn update(
    table: &str,
    values: &[(String, Value)],
    conditions: &[Condition],
    params: &mut Vec<Value>,
) -> String {
    let assignments: Vec<String> = values
        .iter()
        .map(|(column, value)| {
            params.push(value.clone());
            format!("{} = ?", quote(column))
        })
        .collect();
    let mut sql = format!("UPDATE {} SET {}", quote(table), assignments.join(", "));
    sql.push_str(&render_where(conditions, params));
    sql
}

pub fn delete(table: &str, conditions: &[Condition], params: &mut Vec<Value>) -> String {
    let mut sql = format!("DELETE FROM {}", quote(table));
    sql.push_str(&render_where(conditions, params));
    sql
}
