//! Per-operation execution context.
//!
//! One [`OperationContext`] is created for each statement a query issues and
//! is handed to every lifecycle hook of that statement. Deletion intent is a
//! typed field here, never shared between operations.

use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// Why an update is being issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletionIntent {
    /// Ordinary update, or a genuine row removal.
    #[default]
    None,
    /// Update that flags rows as deleted.
    SoftDelete,
    /// Update that resets the flag.
    Undelete,
}

impl DeletionIntent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::SoftDelete => "soft_delete",
            Self::Undelete => "undelete",
        }
    }
}

impl fmt::Display for DeletionIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statement kind issued to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Insert,
    Update,
    Delete,
}

impl Operation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dispatch progress of a single operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    /// Created; no hooks have run.
    #[default]
    Idle,
    /// Before-hooks ran; the statement is in flight.
    Dispatching,
    /// After-hooks ran; intent has been consumed.
    Done,
}

/// Execution context shared by the hooks of one operation.
#[derive(Debug, Clone)]
pub struct OperationContext {
    table: String,
    operation: Operation,
    pub(crate) intent: DeletionIntent,
    pub(crate) stage: Stage,
    pub(crate) affected: Option<usize>,
    instance: bool,
    values: Map<String, JsonValue>,
}

impl OperationContext {
    #[must_use]
    pub fn new(table: impl Into<String>, operation: Operation) -> Self {
        Self {
            table: table.into(),
            operation,
            intent: DeletionIntent::None,
            stage: Stage::Idle,
            affected: None,
            instance: false,
            values: Map::new(),
        }
    }

    #[must_use]
    pub const fn with_intent(mut self, intent: DeletionIntent) -> Self {
        self.intent = intent;
        self
    }

    /// Mark the operation as scoped to a single loaded row.
    #[must_use]
    pub const fn with_instance(mut self, instance: bool) -> Self {
        self.instance = instance;
        self
    }

    /// Attach caller-supplied values visible to every hook.
    #[must_use]
    pub fn with_values(mut self, values: Map<String, JsonValue>) -> Self {
        self.values = values;
        self
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub const fn operation(&self) -> Operation {
        self.operation
    }

    #[must_use]
    pub const fn intent(&self) -> DeletionIntent {
        self.intent
    }

    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Rows affected by the statement; `None` until it has executed.
    #[must_use]
    pub const fn affected(&self) -> Option<usize> {
        self.affected
    }

    #[must_use]
    pub const fn is_instance(&self) -> bool {
        self.instance
    }

    /// A caller-supplied context value.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&JsonValue> {
        self.values.get(key)
    }

    /// Whether this operation is a soft delete in progress.
    #[must_use]
    pub fn is_soft_delete(&self) -> bool {
        self.intent == DeletionIntent::SoftDelete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_is_idle_without_intent() {
        let ctx = OperationContext::new("Items", Operation::Update);
        assert_eq!(ctx.stage(), Stage::Idle);
        assert_eq!(ctx.intent(), DeletionIntent::None);
        assert_eq!(ctx.affected(), None);
        assert!(!ctx.is_instance());
    }

    #[test]
    fn test_values_are_visible() {
        let mut values = Map::new();
        values.insert("actor".to_string(), JsonValue::from("alice"));
        let ctx = OperationContext::new("Items", Operation::Update)
            .with_intent(DeletionIntent::SoftDelete)
            .with_values(values);
        assert!(ctx.is_soft_delete());
        assert_eq!(ctx.value("actor"), Some(&JsonValue::from("alice")));
        assert_eq!(ctx.value("missing"), None);
    }

    #[test]
    fn test_intent_display() {
        assert_eq!(DeletionIntent::SoftDelete.to_string(), "soft_delete");
        assert_eq!(Operation::Delete.to_string(), "delete");
    }
}
