mod common;

use common::{column, ids, seeded_db, test_objects, test_objects_on};
use softdel::{Order, Row, SoftDeleteConfig, SoftdelError, TableModel, Value};

#[test]
fn test_delete_sets_deleted_column_and_keeps_row() {
    let db = seeded_db();
    let model = test_objects();

    let affected = db.query(&model).find_by_id(1).delete().run().unwrap();
    assert_eq!(affected, 1);

    assert_eq!(column(&db, "TestObjects", 1, "deleted"), Value::Integer(1));
    assert_eq!(column(&db, "TestObjects", 2, "deleted"), Value::Integer(0));

    // The row is still there when fetched by primary key.
    let row = db.query(&model).find_by_id(1).fetch_first().unwrap();
    assert!(row.is_some_and(|row| row.is_deleted(&model)));
}

#[test]
fn test_del_is_an_alias_of_delete() {
    let db = seeded_db();
    let model = test_objects();

    db.query(&model).find_by_id(2).del().run().unwrap();

    assert_eq!(column(&db, "TestObjects", 2, "deleted"), Value::Integer(1));
}

#[test]
fn test_instance_delete_only_touches_that_row() {
    let db = seeded_db();
    let model = test_objects();
    let row = db
        .query(&model)
        .find_by_id(1)
        .fetch_first()
        .unwrap()
        .expect("row 1");

    db.instance_query(&model, &row).delete().run().unwrap();

    assert_eq!(column(&db, "TestObjects", 1, "deleted"), Value::Integer(1));
    assert_eq!(column(&db, "TestObjects", 2, "deleted"), Value::Integer(0));
}

#[test]
fn test_instance_query_without_primary_key_fails() {
    let db = seeded_db();
    let model = test_objects();
    let row = Row::new().with("name", "no id");

    let err = db.instance_query(&model, &row).delete().run().unwrap_err();

    assert!(matches!(err, SoftdelError::MissingPrimaryKey { .. }));
}

#[test]
fn test_hard_delete_removes_row() {
    let db = seeded_db();
    let model = test_objects();

    let affected = db.query(&model).find_by_id(1).hard_delete().run().unwrap();
    assert_eq!(affected, 1);

    assert!(db.query(&model).find_by_id(1).fetch_first().unwrap().is_none());
    assert!(db.query(&model).find_by_id(2).fetch_first().unwrap().is_some());
}

#[test]
fn test_hard_delete_removes_soft_deleted_row() {
    let db = seeded_db();
    let model = test_objects();

    db.query(&model).find_by_id(1).delete().run().unwrap();
    db.query(&model).find_by_id(1).hard_delete().run().unwrap();

    assert!(db.query(&model).find_by_id(1).fetch_first().unwrap().is_none());
}

#[test]
fn test_undelete_restores_row() {
    let db = seeded_db();
    let model = test_objects();

    db.query(&model).find_by_id(1).delete().run().unwrap();
    let affected = db.query(&model).find_by_id(1).undelete().run().unwrap();

    assert_eq!(affected, 1);
    assert_eq!(column(&db, "TestObjects", 1, "deleted"), Value::Integer(0));
}

#[test]
fn test_undelete_active_row_is_a_no_op() {
    let db = seeded_db();
    let model = test_objects();

    db.query(&model).find_by_id(2).undelete().run().unwrap();

    assert_eq!(column(&db, "TestObjects", 2, "deleted"), Value::Integer(0));
}

#[test]
fn test_where_not_deleted_and_where_deleted_partition_rows() {
    let db = seeded_db();
    let model = test_objects();
    db.query(&model).find_by_id(1).delete().run().unwrap();

    let active = db.query(&model).where_not_deleted().fetch_all().unwrap();
    let deleted = db.query(&model).where_deleted().fetch_all().unwrap();

    assert_eq!(ids(&active), vec![2]);
    assert_eq!(ids(&deleted), vec![1]);
}

#[test]
fn test_where_deleted_composes_with_other_conditions() {
    let db = seeded_db();
    let model = test_objects();
    db.query(&model).where_in("id", [1, 2]).delete().run().unwrap();

    let rows = db
        .query(&model)
        .where_deleted()
        .where_eq("name", "Test Object 2")
        .fetch_all()
        .unwrap();

    assert_eq!(ids(&rows), vec![2]);
}

#[test]
fn test_custom_column_name_leaves_deleted_column_alone() {
    let db = seeded_db();
    let model = test_objects_on(SoftDeleteConfig::with_column("inactive").unwrap());

    db.query(&model).find_by_id(1).delete().run().unwrap();

    assert_eq!(column(&db, "TestObjects", 1, "inactive"), Value::Integer(1));
    assert_eq!(column(&db, "TestObjects", 1, "deleted"), Value::Integer(0));

    let active = db
        .query(&model)
        .where_not_deleted()
        .order_by("id", Order::Asc)
        .fetch_all()
        .unwrap();
    assert_eq!(ids(&active), vec![2]);

    db.query(&model).find_by_id(1).undelete().run().unwrap();
    assert_eq!(column(&db, "TestObjects", 1, "inactive"), Value::Integer(0));
}

#[test]
fn test_missing_soft_delete_column_is_column_not_found() {
    let db = seeded_db();
    let model = test_objects_on(SoftDeleteConfig::with_column("archived").unwrap());

    let err = db.query(&model).find_by_id(1).delete().run().unwrap_err();
    assert!(matches!(err, SoftdelError::ColumnNotFound { .. }), "{err}");

    let err = db.query(&model).where_deleted().fetch_all().unwrap_err();
    assert!(matches!(err, SoftdelError::ColumnNotFound { .. }), "{err}");

    let err = db.query(&model).find_by_id(1).undelete().run().unwrap_err();
    assert!(matches!(err, SoftdelError::ColumnNotFound { .. }), "{err}");
}

#[test]
fn test_model_without_soft_delete_keeps_plain_delete() {
    let db = seeded_db();
    let model = TableModel::new("TestObjects");

    db.query(&model).find_by_id(1).delete().run().unwrap();

    assert!(db.query(&model).find_by_id(1).fetch_first().unwrap().is_none());
}

#[test]
fn test_soft_delete_operations_need_configuration() {
    let db = seeded_db();
    let model = TableModel::new("TestObjects");

    let err = db.query(&model).find_by_id(1).undelete().run().unwrap_err();
    assert!(matches!(err, SoftdelError::SoftDeleteNotEnabled { .. }));

    let err = db.query(&model).where_deleted().fetch_all().unwrap_err();
    assert!(matches!(err, SoftdelError::SoftDeleteNotEnabled { .. }));

    let err = db.query(&model).where_not_deleted().fetch_all().unwrap_err();
    assert!(matches!(err, SoftdelError::SoftDeleteNotEnabled { .. }));
}

#[test]
fn test_plain_patch_does_not_touch_soft_delete_column() {
    let db = seeded_db();
    let model = test_objects();

    db.query(&model)
        .find_by_id(1)
        .patch([("name", "renamed")])
        .run()
        .unwrap();

    assert_eq!(
        column(&db, "TestObjects", 1, "name"),
        Value::Text("renamed".to_string())
    );
    assert_eq!(column(&db, "TestObjects", 1, "deleted"), Value::Integer(0));
}

#[test]
fn test_limit_and_order_are_rejected_on_writes() {
    let db = seeded_db();
    let model = test_objects();

    let err = db.query(&model).limit(1).hard_delete().run().unwrap_err();
    assert!(matches!(err, SoftdelError::MutationClause { clause: "limit", .. }));

    let err = db
        .query(&model)
        .order_by("id", Order::Desc)
        .delete()
        .run()
        .unwrap_err();
    assert!(matches!(err, SoftdelError::MutationClause { clause: "order_by", .. }));

    let err = db
        .query(&model)
        .limit(1)
        .patch([("name", "renamed")])
        .run()
        .unwrap_err();
    assert!(matches!(err, SoftdelError::MutationClause { .. }));

    let rows = db.query(&model).where_not_deleted().fetch_all().unwrap();
    assert_eq!(ids(&rows), vec![1, 2]);
}
