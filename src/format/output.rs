use serde::Serialize;
use softdel_core::{RowState, Value};

use crate::model::{Model, Row};

/// Lowercase name of a row state, as used in JSON output.
#[must_use]
pub const fn state_label(state: RowState) -> &'static str {
    match state {
        RowState::Active => "active",
        RowState::Deleted => "deleted",
        RowState::Unknown => "unknown",
    }
}

/// A row for list/show views.
#[derive(Debug, Clone, Serialize)]
pub struct RowOutput<'a> {
    #[serde(flatten)]
    pub row: &'a Row,
    /// Absent for tables without soft delete.
    #[serde(rename = "_state", skip_serializing_if = "Option::is_none")]
    pub state: Option<&'static str>,
}

impl<'a> RowOutput<'a> {
    #[must_use]
    pub fn new(row: &'a Row, model: &dyn Model) -> Self {
        Self {
            row,
            state: row.state(model).map(state_label),
        }
    }
}

/// Result of a delete, undelete or hard-delete command.
#[derive(Debug, Clone, Serialize)]
pub struct MutationReport {
    pub table: String,
    pub action: &'static str,
    pub ids: Vec<Value>,
    pub affected: usize,
}
