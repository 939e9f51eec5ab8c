//! `softdel` - reversible soft delete for SQLite-backed models
//!
//! Models opt in with a [`SoftDeleteConfig`]. For such models `delete()`
//! patches the soft-delete column instead of removing rows, `undelete()`
//! restores them and `hard_delete()` removes them for real. Queries can be
//! scoped with `where_deleted()` / `where_not_deleted()` or through the
//! `deleted` / `notDeleted` named filters, which also work inside eager
//! relation expressions.
//!
//! # Architecture
//!
//! - [`model`] - the [`Model`] trait, rows and a builder-style table model
//! - [`storage`] - `SQLite` database, query builder, relations and named filters
//! - [`config`] - YAML workspace configuration for the `sd` binary
//! - [`validation`] - structural checks on a workspace configuration
//! - [`cli`] - command-line interface using clap
//! - [`format`] - text and JSON output
//! - [`error`] - error types
//!
//! Engine-independent pieces (sentinels, deletion intent, hook dispatch,
//! filter registries) live in the `softdel-core` crate and are re-exported
//! here.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod model;
pub mod storage;
pub mod validation;

pub use error::{Result, SoftdelError};
pub use model::{Model, Related, Row, TableModel};
pub use softdel_core::{
    CollisionPolicy, Condition, DELETED_FILTER, DeletionIntent, HookPoint, LifecycleHooks,
    NOT_DELETED_FILTER, Operation, OperationContext, RowState, Sentinel, SoftDeleteConfig, Value,
};
pub use storage::{
    Database, FilterRegistry, NamedFilter, Order, QueryBuilder, QueryOutput, Relation, Through,
};

/// Run the CLI application.
///
/// This is the main entry point called from `main()`.
///
/// # Errors
///
/// Returns an error if command execution fails.
pub fn run() -> anyhow::Result<()> {
    cli::run()
}
