//! Command implementations.

pub mod delete;
pub mod doctor;
pub mod hard_delete;
pub mod list;
pub mod show;
pub mod undelete;
pub mod version;

use softdel_core::Value;

use crate::cli::{MutateArgs, Session, parse_value};
use crate::config::ConfiguredModel;
use crate::error::Result;
use crate::format::MutationReport;
use crate::model::Model;
use crate::storage::QueryBuilder;

/// Shared body of delete, undelete and hard-delete: match `args.ids` by
/// primary key, apply `action` and report the affected count.
pub(crate) fn run_mutation(
    session: &Session,
    args: &MutateArgs,
    label: &'static str,
    action: impl for<'a> FnOnce(QueryBuilder<'a>) -> QueryBuilder<'a>,
) -> Result<()> {
    let model: ConfiguredModel = session.workspace.model(&args.table)?;
    let ids: Vec<Value> = args.ids.iter().map(|id| parse_value(id)).collect();
    let query = session
        .db
        .query(&model)
        .where_in(model.id_column(), ids.clone());
    let affected = action(query).run()?;

    let report = MutationReport {
        table: args.table.clone(),
        action: label,
        ids,
        affected,
    };
    if session.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{label} {affected} row(s) in {}", report.table);
    }
    Ok(())
}
