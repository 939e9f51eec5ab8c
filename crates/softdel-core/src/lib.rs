//! `softdel-core` - soft-delete semantics independent of any database.
//!
//! Provides the pieces a persistence layer needs to turn "delete" into a
//! reversible flag:
//!
//! - [`SoftDeleteConfig`] - column name and deleted/active sentinels
//! - [`DeletionIntent`] and [`OperationContext`] - per-call intent threaded
//!   through the update pipeline
//! - [`LifecycleHooks`] with [`dispatch_before`]/[`dispatch_after`] - routes
//!   soft delete, hard delete and undelete to dedicated hooks
//! - [`NamedFilters`] - `deleted`/`notDeleted` filter registration
//! - [`RelationExpr`] - eager-load expressions such as `items(notDeleted)`
//!
//! # Quick Start
//!
//! ```
//! use softdel_core::{Sentinel, SoftDeleteConfig};
//!
//! let config = SoftDeleteConfig::builder()
//!     .column_name("inactive")
//!     .deleted_value(Sentinel::Integer(1))
//!     .not_deleted_value(Sentinel::Null)
//!     .build()
//!     .unwrap();
//!
//! let active = config.not_deleted_condition("Items");
//! assert_eq!(active.column.to_sql(), "\"Items\".\"inactive\"");
//! ```

pub mod condition;
pub mod config;
pub mod context;
pub mod error;
pub mod filter;
pub mod ident;
pub mod lifecycle;
pub mod relation_expr;
pub mod value;

pub use condition::{Condition, Predicate};
pub use config::{DeletedMatch, RowState, Sentinel, SoftDeleteConfig, SoftDeleteConfigBuilder};
pub use context::{DeletionIntent, Operation, OperationContext, Stage};
pub use error::{Result, SoftDeleteError};
pub use filter::{CollisionPolicy, DELETED_FILTER, NOT_DELETED_FILTER, NamedFilters};
pub use ident::ColumnRef;
pub use lifecycle::{HookPoint, LifecycleHooks, Phase, dispatch_after, dispatch_before, hook_plan};
pub use relation_expr::RelationExpr;
pub use value::Value;

/// Crate version, reported by `sd version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
