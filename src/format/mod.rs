//! Output formatting for `softdel`.
//!
//! Supports both human-readable text output and machine-parseable JSON.
//!
//! # JSON Output Types
//!
//! - [`RowOutput`] - a row with its soft-delete state (list/show)
//! - [`MutationReport`] - affected rows of delete/undelete/hard-delete

mod output;
mod text;

pub use output::{MutationReport, RowOutput, state_label};
pub use text::{format_row_detail, format_row_line, format_state_icon};
