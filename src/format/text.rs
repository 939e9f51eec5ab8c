//! Text formatting functions for `softdel`.
//!
//! Plain text (non-ANSI) output for the terminal:
//! - State icons (○ active, ✗ deleted, ? unknown)
//! - Single-line row summaries for `sd list`
//! - Indented detail blocks for `sd show`

use softdel_core::{RowState, Value};

use crate::model::{Model, Related, Row};

/// State icon characters.
pub mod icons {
    /// Active row.
    pub const ACTIVE: &str = "○";
    /// Soft-deleted row.
    pub const DELETED: &str = "✗";
    /// Neither sentinel.
    pub const UNKNOWN: &str = "?";
    /// Table without soft delete.
    pub const PLAIN: &str = "·";
}

#[must_use]
pub const fn format_state_icon(state: Option<RowState>) -> &'static str {
    match state {
        Some(RowState::Active) => icons::ACTIVE,
        Some(RowState::Deleted) => icons::DELETED,
        Some(RowState::Unknown) => icons::UNKNOWN,
        None => icons::PLAIN,
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Text(text) => format!("{text:?}"),
        other => other.to_string(),
    }
}

fn id_label(row: &Row, model: &dyn Model) -> String {
    row.id(model)
        .map_or_else(|| "-".to_string(), ToString::to_string)
}

/// Format a single-line row summary.
///
/// Format: `{icon} {id} {column}={value} ... [{relation}: {count}]`
#[must_use]
pub fn format_row_line(row: &Row, model: &dyn Model) -> String {
    let mut line = format!(
        "{} {}",
        format_state_icon(row.state(model)),
        id_label(row, model)
    );
    for (name, value) in row.columns() {
        if name == model.id_column() {
            continue;
        }
        line.push_str(&format!(" {name}={}", format_value(value)));
    }
    for relation in model.relations() {
        if let Some(related) = row.related(relation.name()) {
            line.push_str(&format!(" [{}: {}]", relation.name(), related.len()));
        }
    }
    line
}

/// Format a row with one column per line and loaded relations nested
/// below it.
#[must_use]
pub fn format_row_detail(row: &Row, model: &dyn Model) -> Vec<String> {
    let mut lines = Vec::new();
    push_detail(&mut lines, row, model, 0);
    lines
}

fn push_detail(lines: &mut Vec<String>, row: &Row, model: &dyn Model, depth: usize) {
    let indent = "  ".repeat(depth);
    lines.push(format!(
        "{indent}{} {} #{}",
        format_state_icon(row.state(model)),
        model.table_name(),
        id_label(row, model)
    ));
    for (name, value) in row.columns() {
        lines.push(format!("{indent}  {name}: {}", format_value(value)));
    }
    for relation in model.relations() {
        let Some(related) = row.related(relation.name()) else {
            continue;
        };
        match related {
            Related::One(None) => lines.push(format!("{indent}  {}: none", relation.name())),
            Related::Many(rows) if rows.is_empty() => {
                lines.push(format!("{indent}  {}: none", relation.name()));
            }
            _ => {
                lines.push(format!("{indent}  {}:", relation.name()));
                for child in related.iter() {
                    push_detail(lines, child, relation.related(), depth + 2);
                }
            }
        }
    }
}
