//! Chainable query builder.
//!
//! A [`QueryBuilder`] is bound to one [`Database`] and one [`Model`]. Filter
//! and action methods only record what to do; the terminals render the
//! statement, run the lifecycle hooks around it and execute it.
//!
//! For a model with a soft-delete configuration, [`QueryBuilder::delete`]
//! becomes a single-column update tagged [`DeletionIntent::SoftDelete`], so
//! existing call sites keep working while rows stay in the table.
//! [`QueryBuilder::hard_delete`] removes rows for real.

use std::fmt;

use chrono::Utc;
use serde_json::{Map, Value as JsonValue};
use softdel_core::ident::validate_identifier;
use softdel_core::{
    ColumnRef, Condition, DeletionIntent, Operation, OperationContext, RelationExpr, Sentinel,
    SoftDeleteConfig, Value, dispatch_after, dispatch_before,
};
use tracing::{debug, info};

use super::Database;
use super::filters::effective_filters;
use super::relation;
use super::sql::{self, Clauses, Join, OWNER_KEY};
use crate::error::{Result, SoftdelError};
use crate::model::{Model, Row};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// What a terminal produced.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Rows(Vec<Row>),
    Affected(usize),
    Inserted(i64),
}

impl QueryOutput {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Rows(_) => "rows",
            Self::Affected(_) => "an affected-row count",
            Self::Inserted(_) => "an inserted id",
        }
    }

    /// # Errors
    ///
    /// Returns `UnexpectedOutput` unless the query was a select.
    pub fn into_rows(self) -> Result<Vec<Row>> {
        match self {
            Self::Rows(rows) => Ok(rows),
            other => Err(SoftdelError::UnexpectedOutput {
                expected: "rows",
                found: other.kind(),
            }),
        }
    }

    /// Affected-row count; an insert counts as one row.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedOutput` for a select.
    pub fn into_affected(self) -> Result<usize> {
        match self {
            Self::Affected(count) => Ok(count),
            Self::Inserted(_) => Ok(1),
            other @ Self::Rows(_) => Err(SoftdelError::UnexpectedOutput {
                expected: "an affected-row count",
                found: other.kind(),
            }),
        }
    }

    /// # Errors
    ///
    /// Returns `UnexpectedOutput` unless the query was an insert.
    pub fn into_inserted_id(self) -> Result<i64> {
        match self {
            Self::Inserted(id) => Ok(id),
            other => Err(SoftdelError::UnexpectedOutput {
                expected: "an inserted id",
                found: other.kind(),
            }),
        }
    }
}

#[derive(Debug)]
enum Action {
    Select,
    Insert(Vec<(String, Value)>),
    Patch(Vec<(String, Value)>),
    /// Write a soft-delete sentinel; `Now` is resolved when the statement runs.
    Flag { column: String, sentinel: Sentinel },
    Delete,
}

impl Action {
    const fn output(&self) -> &'static str {
        match self {
            Self::Select => "rows",
            Self::Insert(_) => "an inserted id",
            Self::Patch(_) | Self::Flag { .. } | Self::Delete => "an affected-row count",
        }
    }

    const fn is_select(&self) -> bool {
        matches!(self, Self::Select)
    }
}

/// A lazy query over one model's table.
pub struct QueryBuilder<'a> {
    db: &'a Database,
    model: &'a dyn Model,
    action: Action,
    intent: DeletionIntent,
    conditions: Vec<Condition>,
    joins: Vec<Join>,
    owner_key: Option<ColumnRef>,
    order_by: Vec<(ColumnRef, Order)>,
    limit: Option<usize>,
    eager: Vec<RelationExpr>,
    instance: bool,
    context: Map<String, JsonValue>,
    error: Option<SoftdelError>,
}

impl<'a> QueryBuilder<'a> {
    pub(crate) fn new(db: &'a Database, model: &'a dyn Model) -> Self {
        Self {
            db,
            model,
            action: Action::Select,
            intent: DeletionIntent::None,
            conditions: Vec::new(),
            joins: Vec::new(),
            owner_key: None,
            order_by: Vec::new(),
            limit: None,
            eager: Vec::new(),
            instance: false,
            context: Map::new(),
            error: None,
        }
    }

    #[must_use]
    pub fn model(&self) -> &'a dyn Model {
        self.model
    }

    /// Intent the statement will carry into the lifecycle hooks.
    #[must_use]
    pub const fn intent(&self) -> DeletionIntent {
        self.intent
    }

    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    // ========================================================================
    // Row matching
    // ========================================================================

    /// Add a raw condition. Its column is used exactly as given.
    #[must_use]
    pub fn where_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    #[must_use]
    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.filter_on(column, |column| Condition::eq(column, value))
    }

    #[must_use]
    pub fn where_ne(self, column: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.filter_on(column, |column| Condition::ne(column, value))
    }

    #[must_use]
    pub fn where_null(self, column: &str) -> Self {
        self.filter_on(column, Condition::is_null)
    }

    #[must_use]
    pub fn where_not_null(self, column: &str) -> Self {
        self.filter_on(column, Condition::is_not_null)
    }

    #[must_use]
    pub fn where_in<V: Into<Value>>(self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.filter_on(column, |column| Condition::is_in(column, values))
    }

    /// Match the row whose id column equals `id`.
    #[must_use]
    pub fn find_by_id(self, id: impl Into<Value>) -> Self {
        let column = ColumnRef::qualified(self.model.table_name(), self.model.id_column());
        self.where_condition(Condition::eq(column, id))
    }

    /// Only rows flagged deleted. Fails with `SoftDeleteNotEnabled` for a
    /// model without soft-delete configuration.
    #[must_use]
    pub fn where_deleted(self) -> Self {
        match self.soft_delete_config() {
            Ok(config) => {
                let condition = config.deleted_condition(self.model.table_name());
                self.where_condition(condition)
            }
            Err(err) => self.fail(err),
        }
    }

    /// Only active rows. Fails with `SoftDeleteNotEnabled` for a model
    /// without soft-delete configuration.
    #[must_use]
    pub fn where_not_deleted(self) -> Self {
        match self.soft_delete_config() {
            Ok(config) => {
                let condition = config.not_deleted_condition(self.model.table_name());
                self.where_condition(condition)
            }
            Err(err) => self.fail(err),
        }
    }

    /// Apply one of the model's named filters, `deleted` and `notDeleted`
    /// included.
    #[must_use]
    pub fn modify(self, filter: &str) -> Self {
        let filters = match effective_filters(self.model) {
            Ok(filters) => filters,
            Err(err) => return self.fail(err),
        };
        match filters.get(filter) {
            Some(named) => named.apply(self),
            None => {
                let table = self.model.table_name().to_string();
                self.fail(SoftdelError::UnknownFilter {
                    table,
                    filter: filter.to_string(),
                })
            }
        }
    }

    // ========================================================================
    // Shaping
    // ========================================================================

    #[must_use]
    pub fn order_by(self, column: &str, order: Order) -> Self {
        match self.resolve_column(column) {
            Ok(column) => self.order_by_column(column, order),
            Err(err) => self.fail(err),
        }
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Eager-load relations, e.g. `"testObjects(notDeleted)"` or
    /// `"[owner, items.[tags(deleted)]]"`.
    #[must_use]
    pub fn with_related(mut self, expr: &str) -> Self {
        match RelationExpr::parse(expr) {
            Ok(exprs) => {
                self.eager.extend(exprs);
                self
            }
            Err(err) => self.fail(err.into()),
        }
    }

    /// Attach a value every lifecycle hook of this operation can read.
    #[must_use]
    pub fn context(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    // ========================================================================
    // Actions
    // ========================================================================

    #[must_use]
    pub fn insert<K: Into<String>, V: Into<Value>>(
        self,
        values: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        match collect_values(values) {
            Ok(values) => self.set_action(Action::Insert(values), DeletionIntent::None),
            Err(err) => self.fail(err),
        }
    }

    /// Update matching rows. Runs the update hooks.
    #[must_use]
    pub fn patch<K: Into<String>, V: Into<Value>>(
        self,
        values: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        match collect_values(values) {
            Ok(values) if values.is_empty() => {
                let table = self.model.table_name().to_string();
                self.fail(SoftdelError::EmptyPatch { table })
            }
            Ok(values) => self.set_action(Action::Patch(values), DeletionIntent::None),
            Err(err) => self.fail(err),
        }
    }

    /// Delete matching rows.
    ///
    /// With a soft-delete configuration this writes the deleted sentinel to
    /// the configured column instead and runs the soft-delete hooks.
    /// Otherwise it is [`QueryBuilder::hard_delete`].
    #[must_use]
    pub fn delete(self) -> Self {
        let model = self.model;
        match model.soft_delete() {
            Some(config) => {
                self.flag(config, config.deleted_value(), DeletionIntent::SoftDelete)
            }
            None => self.hard_delete(),
        }
    }

    /// Alias of [`QueryBuilder::delete`].
    #[must_use]
    pub fn del(self) -> Self {
        self.delete()
    }

    /// Remove matching rows from the table.
    #[must_use]
    pub fn hard_delete(self) -> Self {
        self.set_action(Action::Delete, DeletionIntent::None)
    }

    /// Write the active sentinel back to matching rows. Already-active rows
    /// are rewritten with the same value.
    #[must_use]
    pub fn undelete(self) -> Self {
        match self.soft_delete_config() {
            Ok(config) => {
                self.flag(config, config.not_deleted_value(), DeletionIntent::Undelete)
            }
            Err(err) => self.fail(err),
        }
    }

    // ========================================================================
    // Terminals
    // ========================================================================

    /// Run the query.
    ///
    /// # Errors
    ///
    /// Returns the first error recorded while building, `MutationClause`
    /// when an update or delete carries `limit` or `order_by`, a hook
    /// failure, or the mapped `SQLite` error (`ColumnNotFound` when the
    /// table lacks a referenced column).
    pub fn execute(mut self) -> Result<QueryOutput> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        let table = self.model.table_name().to_string();
        let mut params = Vec::new();
        match std::mem::replace(&mut self.action, Action::Select) {
            Action::Select => self.select().map(QueryOutput::Rows),
            Action::Insert(values) => {
                let sql = sql::insert(&table, &values, &mut params);
                let db = self.db;
                self.mutate(Operation::Insert, &sql, &params)?;
                Ok(QueryOutput::Inserted(db.connection().last_insert_rowid()))
            }
            Action::Patch(values) => self.update(&table, &values),
            Action::Flag { column, sentinel } => {
                let values = [(column, sentinel.value_at(Utc::now()))];
                self.update(&table, &values)
            }
            Action::Delete => {
                self.check_mutation_clauses(&table)?;
                let sql = sql::delete(&table, &self.conditions, &mut params);
                self.mutate(Operation::Delete, &sql, &params)
                    .map(QueryOutput::Affected)
            }
        }
    }

    /// # Errors
    ///
    /// As [`QueryBuilder::execute`]; `UnexpectedOutput`, without touching
    /// the database, if an action was set.
    pub fn fetch_all(self) -> Result<Vec<Row>> {
        if !self.action.is_select() {
            return Err(SoftdelError::UnexpectedOutput {
                expected: "rows",
                found: self.action.output(),
            });
        }
        self.execute()?.into_rows()
    }

    /// First matching row, if any.
    ///
    /// # Errors
    ///
    /// As [`QueryBuilder::fetch_all`].
    pub fn fetch_first(self) -> Result<Option<Row>> {
        let limit = self.limit.map_or(1, |limit| limit.min(1));
        let mut query = self;
        query.limit = Some(limit);
        Ok(query.fetch_all()?.into_iter().next())
    }

    /// Run an insert, update or delete and return the affected-row count.
    ///
    /// # Errors
    ///
    /// As [`QueryBuilder::execute`]; `UnexpectedOutput` for a select.
    pub fn run(self) -> Result<usize> {
        if self.action.is_select() {
            return Err(SoftdelError::UnexpectedOutput {
                expected: "an affected-row count",
                found: self.action.output(),
            });
        }
        self.execute()?.into_affected()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    pub(crate) fn fail(mut self, err: SoftdelError) -> Self {
        if self.error.is_none() {
            self.error = Some(err);
        }
        self
    }

    pub(crate) const fn for_instance(mut self) -> Self {
        self.instance = true;
        self
    }

    pub(crate) fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub(crate) fn select_owner_key(mut self, column: ColumnRef) -> Self {
        self.owner_key = Some(column);
        self
    }

    pub(crate) fn order_by_column(mut self, column: ColumnRef, order: Order) -> Self {
        self.order_by.push((column, order));
        self
    }

    pub(crate) fn with_children(mut self, children: Vec<RelationExpr>) -> Self {
        self.eager.extend(children);
        self
    }

    fn soft_delete_config(&self) -> Result<&'a SoftDeleteConfig> {
        let model = self.model;
        model
            .soft_delete()
            .ok_or_else(|| SoftdelError::SoftDeleteNotEnabled {
                table: model.table_name().to_string(),
            })
    }

    /// Unqualified columns belong to this model's table.
    fn resolve_column(&self, column: &str) -> Result<ColumnRef> {
        let mut column = ColumnRef::parse(column)?;
        if column.table.is_none() {
            column.table = Some(self.model.table_name().to_string());
        }
        Ok(column)
    }

    fn filter_on(self, column: &str, build: impl FnOnce(ColumnRef) -> Condition) -> Self {
        match self.resolve_column(column) {
            Ok(column) => self.where_condition(build(column)),
            Err(err) => self.fail(err),
        }
    }

    fn set_action(mut self, action: Action, intent: DeletionIntent) -> Self {
        self.action = action;
        self.intent = intent;
        self
    }

    fn flag(self, config: &SoftDeleteConfig, sentinel: Sentinel, intent: DeletionIntent) -> Self {
        let column = config.column_name().to_string();
        self.set_action(Action::Flag { column, sentinel }, intent)
    }

    /// `SQLite` UPDATE and DELETE take no `LIMIT` or `ORDER BY`.
    fn check_mutation_clauses(&self, table: &str) -> Result<()> {
        let clause = match (self.limit, self.order_by.is_empty()) {
            (Some(_), _) => "limit",
            (None, false) => "order_by",
            (None, true) => return Ok(()),
        };
        Err(SoftdelError::MutationClause {
            table: table.to_string(),
            clause,
        })
    }

    fn update(self, table: &str, values: &[(String, Value)]) -> Result<QueryOutput> {
        self.check_mutation_clauses(table)?;
        let mut params = Vec::new();
        let sql = sql::update(table, values, &self.conditions, &mut params);
        self.mutate(Operation::Update, &sql, &params)
            .map(QueryOutput::Affected)
    }

    fn select(self) -> Result<Vec<Row>> {
        let mut params = Vec::new();
        let extra: Vec<(ColumnRef, &str)> = self
            .owner_key
            .iter()
            .map(|column| (column.clone(), OWNER_KEY))
            .collect();
        let clauses = Clauses {
            conditions: &self.conditions,
            joins: &self.joins,
            order_by: &self.order_by,
            limit: self.limit,
        };
        let sql = sql::select(self.model.table_name(), &extra, &clauses, &mut params);
        let mut rows = self.db.select_rows(&sql, &params)?;
        relation::load_related(self.db, self.model, &mut rows, &self.eager)?;
        Ok(rows)
    }

    /// Run a statement between the before and after hooks.
    fn mutate(self, operation: Operation, sql: &str, params: &[Value]) -> Result<usize> {
        let model = self.model;
        let intent = self.intent;
        let table = model.table_name();
        let mut ctx = OperationContext::new(table, operation)
            .with_intent(intent)
            .with_instance(self.instance)
            .with_values(self.context);

        dispatch_before(model, &mut ctx)?;
        let affected = self.db.run_statement(sql, params)?;
        dispatch_after(model, &mut ctx, affected)?;

        match (operation, intent) {
            (Operation::Update, DeletionIntent::SoftDelete) => {
                info!(table, affected, "soft deleted rows");
            }
            (Operation::Update, DeletionIntent::Undelete) => {
                info!(table, affected, "undeleted rows");
            }
            (Operation::Delete, _) => info!(table, affected, "hard deleted rows"),
            _ => debug!(table, affected, operation = %operation, "statement complete"),
        }
        Ok(affected)
    }
}

fn collect_values<K: Into<String>, V: Into<Value>>(
    values: impl IntoIterator<Item = (K, V)>,
) -> Result<Vec<(String, Value)>> {
    values
        .into_iter()
        .map(|(column, value)| {
            let column = column.into();
            validate_identifier(&column)?;
            Ok((column, value.into()))
        })
        .collect()
}

impl fmt::Debug for QueryBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("table", &self.model.table_name())
            .field("action", &self.action)
            .field("intent", &self.intent)
            .field("conditions", &self.conditions)
            .field("eager", &self.eager)
            .finish_non_exhaustive()
    }
}
