//! List command implementation.
//!
//! Active rows by default; `--deleted` for soft-deleted rows only and
//! `--all` for both. Tables without soft delete always list every row.
//! `--filter` applies named filters on top of that scope.

use softdel_core::ident::is_valid_identifier;

use crate::cli::{ListArgs, Session, parse_value};
use crate::error::{Result, SoftdelError, ValidationError};
use crate::format::{RowOutput, format_row_line};
use crate::model::Model;
use crate::storage::{Order, QueryBuilder};

/// Execute the list command.
///
/// # Errors
///
/// Returns an error if the table is not configured, a filter is malformed,
/// or the query fails.
pub fn execute(session: &Session, args: &ListArgs) -> Result<()> {
    let model = session.workspace.model(&args.table)?;
    let filters = parse_filters(&args.filters)?;

    let mut query = session
        .db
        .query(&model)
        .order_by(model.id_column(), Order::Asc);
    query = apply_scope(query, &model, args);
    for (column, value) in filters {
        query = query.where_eq(&column, parse_value(&value));
    }
    for name in &args.named {
        query = query.modify(name);
    }
    if let Some(expr) = &args.with {
        query = query.with_related(expr);
    }
    if let Some(limit) = args.limit {
        query = query.limit(limit);
    }
    let rows = query.fetch_all()?;

    if session.json {
        let output: Vec<RowOutput<'_>> = rows.iter().map(|row| RowOutput::new(row, &model)).collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if rows.is_empty() {
        println!("No rows found.");
    } else {
        for row in &rows {
            println!("{}", format_row_line(row, &model));
        }
        println!("\n{} row(s)", rows.len());
    }

    Ok(())
}

fn apply_scope<'a>(query: QueryBuilder<'a>, model: &dyn Model, args: &ListArgs) -> QueryBuilder<'a> {
    if args.deleted {
        return query.where_deleted();
    }
    if args.all || model.soft_delete().is_none() {
        return query;
    }
    query.where_not_deleted()
}

/// Split `column=value` arguments.
fn parse_filters(raw: &[String]) -> Result<Vec<(String, String)>> {
    let mut errors = Vec::new();
    let mut filters = Vec::new();
    for filter in raw {
        match filter.split_once('=') {
            Some((column, value)) if is_valid_identifier(column.trim()) => {
                filters.push((column.trim().to_string(), value.to_string()));
            }
            _ => errors.push(ValidationError::new(
                "where",
                format!("expected COLUMN=VALUE, got '{filter}'"),
            )),
        }
    }
    if errors.is_empty() {
        Ok(filters)
    } else {
        Err(SoftdelError::Validation { errors })
    }
}
