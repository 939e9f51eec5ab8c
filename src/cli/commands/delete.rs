//! Delete command implementation.
//!
//! Soft deletes for tables with a `soft_delete` block, plain row removal
//! otherwise.

use crate::cli::{MutateArgs, Session};
use crate::error::Result;

/// Execute the delete command.
///
/// # Errors
///
/// Returns an error if the table is not configured or the update fails.
pub fn execute(session: &Session, args: &MutateArgs) -> Result<()> {
    super::run_mutation(session, args, "deleted", |query| query.delete())
}
