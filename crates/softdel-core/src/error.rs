//! Error types for `softdel-core`.
//!
//! Engine-independent failures only. SQLite errors live in the `softdel`
//! crate, which wraps `SoftDeleteError`.

use thiserror::Error;

use crate::context::Stage;

/// Primary error type for softdel-core operations.
#[derive(Error, Debug)]
pub enum SoftDeleteError {
    // === Configuration Errors ===
    /// Soft-delete configuration is structurally invalid.
    #[error("Invalid soft-delete configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Deleted and not-deleted sentinels compare equal in SQL.
    #[error("Sentinel collision: deleted value {deleted} equals not-deleted value {not_deleted}")]
    SentinelCollision {
        deleted: String,
        not_deleted: String,
    },

    /// Table or column name is not a plain SQL identifier.
    #[error("Invalid identifier: '{ident}'")]
    InvalidIdentifier { ident: String },

    // === Filter Errors ===
    /// A soft-delete filter name is already declared by the host model.
    #[error("Named filter '{name}' is already defined by the model")]
    FilterCollision { name: String },

    /// Eager-load expression could not be parsed.
    #[error("Invalid relation expression '{expr}': {reason}")]
    RelationExpr { expr: String, reason: String },

    // === Lifecycle Errors ===
    /// A lifecycle hook rejected the operation.
    #[error("Lifecycle hook failed: {reason}")]
    Hook { reason: String },

    /// Dispatch was requested from a stage that does not allow it.
    #[error("Cannot dispatch {phase} hooks from stage {stage:?}")]
    DispatchState { phase: &'static str, stage: Stage },
}

impl SoftDeleteError {
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Build the error a host hook returns to abort an operation.
    #[must_use]
    pub fn hook(reason: impl Into<String>) -> Self {
        Self::Hook {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn relation_expr(expr: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RelationExpr {
            expr: expr.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error originated in a lifecycle hook.
    #[must_use]
    pub const fn is_hook_failure(&self) -> bool {
        matches!(self, Self::Hook { .. })
    }
}

/// Result type using `SoftDeleteError`.
pub type Result<T> = std::result::Result<T, SoftDeleteError>;
