//! Models and rows.
//!
//! A [`Model`] describes one table: its name, primary key, optional
//! soft-delete configuration, relations, named filters and lifecycle hooks.
//! Hook methods come from [`LifecycleHooks`] and default to no-ops, so a
//! model only overrides the ones it reacts to.
//!
//! [`TableModel`] is a ready-made model assembled at runtime, used by the
//! CLI and handy wherever no hooks are needed.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use softdel_core::{CollisionPolicy, LifecycleHooks, RowState, SoftDeleteConfig, Value};

use crate::storage::filters::FilterRegistry;
use crate::storage::relation::Relation;

/// A table definition the query layer operates on.
pub trait Model: LifecycleHooks {
    fn table_name(&self) -> &str;

    fn id_column(&self) -> &str {
        "id"
    }

    /// Soft-delete configuration; `None` keeps plain delete semantics.
    fn soft_delete(&self) -> Option<&SoftDeleteConfig> {
        None
    }

    fn relations(&self) -> Vec<Relation> {
        Vec::new()
    }

    /// Filters declared by the model itself. The soft-delete filters are
    /// merged on top of these.
    fn named_filters(&self) -> FilterRegistry {
        FilterRegistry::new()
    }

    /// How `deleted`/`notDeleted` treat a same-named filter from
    /// [`Model::named_filters`].
    fn filter_collision(&self) -> CollisionPolicy {
        CollisionPolicy::Override
    }
}

/// Related rows attached by eager loading.
#[derive(Debug, Clone, PartialEq)]
pub enum Related {
    Many(Vec<Row>),
    One(Option<Box<Row>>),
}

impl Related {
    /// Iterate the related rows regardless of cardinality.
    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        let (many, one) = match self {
            Self::Many(rows) => (rows.as_slice(), None),
            Self::One(row) => (&[][..], row.as_deref()),
        };
        many.iter().chain(one)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Serialize for Related {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Many(rows) => rows.serialize(serializer),
            Self::One(row) => row.serialize(serializer),
        }
    }
}

/// A single table row: columns in select order plus loaded relations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
    relations: BTreeMap<String, Related>,
}

impl Row {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Row::set`].
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    /// Set a column, replacing an existing value in place.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => *slot = value,
            None => self.columns.push((column, value)),
        }
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Remove a column and return its value.
    pub fn take(&mut self, column: &str) -> Option<Value> {
        let index = self.columns.iter().position(|(name, _)| name == column)?;
        Some(self.columns.remove(index).1)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Primary key value according to `model`.
    #[must_use]
    pub fn id(&self, model: &dyn Model) -> Option<&Value> {
        self.get(model.id_column())
    }

    #[must_use]
    pub fn related(&self, name: &str) -> Option<&Related> {
        self.relations.get(name)
    }

    pub fn set_related(&mut self, name: impl Into<String>, related: Related) {
        self.relations.insert(name.into(), related);
    }

    /// Soft-delete state of this row, if `model` is soft-deleting and the
    /// row carries the configured column.
    #[must_use]
    pub fn state(&self, model: &dyn Model) -> Option<RowState> {
        let config = model.soft_delete()?;
        let value = self.get(config.column_name())?;
        Some(config.classify(value))
    }

    #[must_use]
    pub fn is_deleted(&self, model: &dyn Model) -> bool {
        self.state(model) == Some(RowState::Deleted)
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len() + self.relations.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        for (name, related) in &self.relations {
            map.serialize_entry(name, related)?;
        }
        map.end()
    }
}

/// A model assembled at runtime, with no-op hooks.
#[derive(Clone)]
pub struct TableModel {
    table: String,
    id_column: String,
    soft_delete: Option<SoftDeleteConfig>,
    relations: Vec<Relation>,
    filters: FilterRegistry,
    collision: CollisionPolicy,
}

impl TableModel {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            id_column: "id".to_string(),
            soft_delete: None,
            relations: Vec::new(),
            filters: FilterRegistry::new(),
            collision: CollisionPolicy::Override,
        }
    }

    #[must_use]
    pub fn with_id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = column.into();
        self
    }

    #[must_use]
    pub fn with_soft_delete(mut self, config: SoftDeleteConfig) -> Self {
        self.soft_delete = Some(config);
        self
    }

    #[must_use]
    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    #[must_use]
    pub fn with_filters(mut self, filters: FilterRegistry) -> Self {
        self.filters = filters;
        self
    }

    #[must_use]
    pub const fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision = policy;
        self
    }
}

impl fmt::Debug for TableModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableModel")
            .field("table", &self.table)
            .field("id_column", &self.id_column)
            .field("soft_delete", &self.soft_delete)
            .field("relations", &self.relations)
            .finish_non_exhaustive()
    }
}

impl LifecycleHooks for TableModel {}

impl Model for TableModel {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn id_column(&self) -> &str {
        &self.id_column
    }

    fn soft_delete(&self) -> Option<&SoftDeleteConfig> {
        self.soft_delete.as_ref()
    }

    fn relations(&self) -> Vec<Relation> {
        self.relations.clone()
    }

    fn named_filters(&self) -> FilterRegistry {
        self.filters.clone()
    }

    fn filter_collision(&self) -> CollisionPolicy {
        self.collision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_set_replaces_in_place() {
        let mut row = Row::new().with("id", 1).with("name", "a");
        row.set("id", 2);
        let names: Vec<&str> = row.columns().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["id", "name"]);
        assert_eq!(row.get("id"), Some(&Value::Integer(2)));
    }

    #[test]
    fn test_row_take_removes_column() {
        let mut row = Row::new().with("id", 1).with("__k", 9);
        assert_eq!(row.take("__k"), Some(Value::Integer(9)));
        assert_eq!(row.get("__k"), None);
        assert_eq!(row.take("__k"), None);
    }

    #[test]
    fn test_row_state_uses_model_config() {
        let model = TableModel::new("Items").with_soft_delete(SoftDeleteConfig::default());
        let deleted = Row::new().with("id", 1).with("deleted", 1);
        let active = Row::new().with("id", 2).with("deleted", 0);
        assert!(deleted.is_deleted(&model));
        assert_eq!(active.state(&model), Some(RowState::Active));
        assert_eq!(Row::new().state(&model), None);
        assert_eq!(deleted.state(&TableModel::new("Plain")), None);
    }

    #[test]
    fn test_row_serializes_columns_then_relations() {
        let mut row = Row::new().with("id", 1).with("deleted", false);
        row.set_related(
            "items",
            Related::Many(vec![Row::new().with("id", 5)]),
        );
        row.set_related("owner", Related::One(None));
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(
            json,
            r#"{"id":1,"deleted":false,"items":[{"id":5}],"owner":null}"#
        );
    }

    #[test]
    fn test_related_iter_covers_both_cardinalities() {
        let many = Related::Many(vec![Row::new(), Row::new()]);
        let one = Related::One(Some(Box::new(Row::new())));
        assert_eq!(many.len(), 2);
        assert_eq!(one.len(), 1);
        assert!(Related::One(None).is_empty());
    }
}
