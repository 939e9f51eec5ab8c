//! Undelete command implementation.

use crate::cli::{MutateArgs, Session};
use crate::error::Result;

/// Execute the undelete command.
///
/// # Errors
///
/// Returns `SoftDeleteNotEnabled` for a table without soft delete, or an
/// error if the update fails.
pub fn execute(session: &Session, args: &MutateArgs) -> Result<()> {
    super::run_mutation(session, args, "undeleted", |query| query.undelete())
}
