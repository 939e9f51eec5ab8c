#![allow(dead_code)]

pub mod cli;

use std::cell::RefCell;
use std::rc::Rc;

use softdel::storage::{Relation, Through};
use softdel::{
    Database, DeletionIntent, FilterRegistry, HookPoint, LifecycleHooks, Model, OperationContext,
    SoftDeleteConfig, TableModel, Value,
};
use softdel_core::SoftDeleteError;

pub const SCHEMA: &str = "
CREATE TABLE TestObjects (
    id INTEGER PRIMARY KEY,
    name TEXT,
    deleted BOOLEAN,
    inactive BOOLEAN
);
CREATE TABLE RelatedObjects (
    id INTEGER PRIMARY KEY,
    name TEXT,
    deleted BOOLEAN
);
CREATE TABLE JoinTable (
    id INTEGER PRIMARY KEY,
    testObjectId INTEGER,
    relatedObjectId INTEGER,
    deleted BOOLEAN
);
";

pub const SEED: &str = "
INSERT INTO TestObjects (id, name, deleted, inactive) VALUES
    (1, 'Test Object 1', 0, 0),
    (2, 'Test Object 2', 0, 0);
INSERT INTO RelatedObjects (id, name, deleted) VALUES (1, 'RelatedObject 1', 0);
INSERT INTO JoinTable (id, testObjectId, relatedObjectId, deleted) VALUES
    (1, 1, 1, 0),
    (2, 2, 1, 0);
";

/// Fresh in-memory database with the seeded fixture tables.
pub fn seeded_db() -> Database {
    let db = Database::open_in_memory().expect("open in-memory db");
    db.execute_batch(SCHEMA).expect("create schema");
    db.execute_batch(SEED).expect("seed rows");
    db
}

pub fn test_objects() -> TableModel {
    TableModel::new("TestObjects").with_soft_delete(SoftDeleteConfig::default())
}

pub fn test_objects_on(config: SoftDeleteConfig) -> TableModel {
    TableModel::new("TestObjects").with_soft_delete(config)
}

pub fn related_objects() -> TableModel {
    TableModel::new("RelatedObjects")
        .with_soft_delete(SoftDeleteConfig::default())
        .with_relation(Relation::many_to_many(
            "testObjects",
            test_objects(),
            "id",
            Through::new("JoinTable", "relatedObjectId", "testObjectId"),
            "id",
        ))
}

pub fn ids(rows: &[softdel::Row]) -> Vec<i64> {
    rows.iter()
        .filter_map(|row| row.get("id").and_then(Value::as_i64))
        .collect()
}

pub fn column(db: &Database, table: &str, id: i64, column: &str) -> Value {
    let model = TableModel::new(table);
    db.query(&model)
        .find_by_id(id)
        .fetch_first()
        .expect("query row")
        .and_then(|row| row.get(column).cloned())
        .expect("row present")
}

/// One hook invocation as seen by a [`RecordingModel`].
#[derive(Debug, Clone, PartialEq)]
pub struct HookCall {
    pub point: HookPoint,
    pub intent: DeletionIntent,
    pub instance: bool,
    pub affected: Option<usize>,
    pub source: Option<String>,
}

pub type CallLog = Rc<RefCell<Vec<HookCall>>>;

/// Model wrapper recording every lifecycle hook it receives.
pub struct RecordingModel {
    inner: TableModel,
    calls: CallLog,
    fail_on: Option<HookPoint>,
}

impl RecordingModel {
    pub fn new(inner: TableModel) -> Self {
        Self {
            inner,
            calls: Rc::default(),
            fail_on: None,
        }
    }

    pub fn failing_on(mut self, point: HookPoint) -> Self {
        self.fail_on = Some(point);
        self
    }

    pub fn calls(&self) -> Vec<HookCall> {
        self.calls.borrow().clone()
    }

    pub fn points(&self) -> Vec<HookPoint> {
        self.calls.borrow().iter().map(|call| call.point).collect()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, point: HookPoint, ctx: &OperationContext) -> softdel_core::Result<()> {
        self.calls.borrow_mut().push(HookCall {
            point,
            intent: ctx.intent(),
            instance: ctx.is_instance(),
            affected: ctx.affected(),
            source: ctx
                .value("source")
                .and_then(|value| value.as_str())
                .map(str::to_string),
        });
        if self.fail_on == Some(point) {
            return Err(SoftDeleteError::hook(format!("{point} refused")));
        }
        Ok(())
    }
}

impl LifecycleHooks for RecordingModel {
    fn before_insert(&self, ctx: &OperationContext) -> softdel_core::Result<()> {
        self.record(HookPoint::BeforeInsert, ctx)
    }
    fn after_insert(&self, ctx: &OperationContext) -> softdel_core::Result<()> {
        self.record(HookPoint::AfterInsert, ctx)
    }
    fn before_update(&self, ctx: &OperationContext) -> softdel_core::Result<()> {
        self.record(HookPoint::BeforeUpdate, ctx)
    }
    fn after_update(&self, ctx: &OperationContext) -> softdel_core::Result<()> {
        self.record(HookPoint::AfterUpdate, ctx)
    }
    fn before_delete(&self, ctx: &OperationContext) -> softdel_core::Result<()> {
        self.record(HookPoint::BeforeDelete, ctx)
    }
    fn after_delete(&self, ctx: &OperationContext) -> softdel_core::Result<()> {
        self.record(HookPoint::AfterDelete, ctx)
    }
    fn before_soft_delete(&self, ctx: &OperationContext) -> softdel_core::Result<()> {
        self.record(HookPoint::BeforeSoftDelete, ctx)
    }
    fn after_soft_delete(&self, ctx: &OperationContext) -> softdel_core::Result<()> {
        self.record(HookPoint::AfterSoftDelete, ctx)
    }
    fn before_hard_delete(&self, ctx: &OperationContext) -> softdel_core::Result<()> {
        self.record(HookPoint::BeforeHardDelete, ctx)
    }
    fn after_hard_delete(&self, ctx: &OperationContext) -> softdel_core::Result<()> {
        self.record(HookPoint::AfterHardDelete, ctx)
    }
    fn before_undelete(&self, ctx: &OperationContext) -> softdel_core::Result<()> {
        self.record(HookPoint::BeforeUndelete, ctx)
    }
    fn after_undelete(&self, ctx: &OperationContext) -> softdel_core::Result<()> {
        self.record(HookPoint::AfterUndelete, ctx)
    }
}

impl Model for RecordingModel {
    fn table_name(&self) -> &str {
        self.inner.table_name()
    }

    fn id_column(&self) -> &str {
        self.inner.id_column()
    }

    fn soft_delete(&self) -> Option<&SoftDeleteConfig> {
        self.inner.soft_delete()
    }

    fn relations(&self) -> Vec<Relation> {
        self.inner.relations()
    }

    fn named_filters(&self) -> FilterRegistry {
        self.inner.named_filters()
    }

    fn filter_collision(&self) -> softdel::CollisionPolicy {
        self.inner.filter_collision()
    }
}
