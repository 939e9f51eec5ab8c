//! Show command implementation.

use crate::cli::{Session, ShowArgs, parse_value};
use crate::error::{Result, SoftdelError};
use crate::format::{RowOutput, format_row_detail};

/// Execute the show command.
///
/// Soft-deleted rows are shown too; their state is part of the output.
///
/// # Errors
///
/// Returns `RowNotFound` if no row has the id, or an error if the
/// query fails.
pub fn execute(session: &Session, args: &ShowArgs) -> Result<()> {
    let model = session.workspace.model(&args.table)?;
    let mut query = session.db.query(&model).find_by_id(parse_value(&args.id));
    if let Some(expr) = &args.with {
        query = query.with_related(expr);
    }
    let row = query
        .fetch_first()?
        .ok_or_else(|| SoftdelError::RowNotFound {
            table: args.table.clone(),
            id: args.id.clone(),
        })?;

    if session.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&RowOutput::new(&row, &model))?
        );
    } else {
        for line in format_row_detail(&row, &model) {
            println!("{line}");
        }
    }

    Ok(())
}
