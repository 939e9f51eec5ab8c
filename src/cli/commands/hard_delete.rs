//! Hard-delete command implementation.

use crate::cli::{MutateArgs, Session};
use crate::error::Result;

/// Execute the hard-delete command.
///
/// # Errors
///
/// Returns an error if the table is not configured or the delete fails.
pub fn execute(session: &Session, args: &MutateArgs) -> Result<()> {
    super::run_mutation(session, args, "hard deleted", |query| query.hard_delete())
}
