mod common;

use common::ids;
use proptest::prelude::*;
use softdel::{Database, Model, RowState, Sentinel, SoftDeleteConfig, TableModel, Value};

fn items_db() -> Database {
    let db = Database::open_in_memory().unwrap();
    db.execute_batch("CREATE TABLE Items (id INTEGER PRIMARY KEY, state);")
        .unwrap();
    db
}

fn items(config: SoftDeleteConfig) -> TableModel {
    TableModel::new("Items").with_soft_delete(config)
}

fn config(deleted: Sentinel, not_deleted: Sentinel) -> SoftDeleteConfig {
    SoftDeleteConfig::builder()
        .column_name("state")
        .deleted_value(deleted)
        .not_deleted_value(not_deleted)
        .build()
        .unwrap()
}

fn insert_active(db: &Database, model: &TableModel, id: i64) {
    let active = model.soft_delete().unwrap().undelete_value();
    db.query(model)
        .insert([("id", Value::Integer(id)), ("state", active)])
        .execute()
        .unwrap();
}

fn state(db: &Database, id: i64) -> Value {
    db.query(&TableModel::new("Items"))
        .find_by_id(id)
        .fetch_first()
        .unwrap()
        .and_then(|row| row.get("state").cloned())
        .unwrap_or_default()
}

#[test]
fn test_items_scenario() {
    let db = Database::open_in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE Items (id INTEGER PRIMARY KEY, deleted BOOLEAN);
         INSERT INTO Items (id, deleted) VALUES (1, 0), (2, 0);",
    )
    .unwrap();
    let model = TableModel::new("Items").with_soft_delete(SoftDeleteConfig::default());

    db.query(&model).find_by_id(1).delete().run().unwrap();

    let active = db.query(&model).where_not_deleted().fetch_all().unwrap();
    assert_eq!(ids(&active), vec![2]);
    let deleted = db.query(&model).where_deleted().fetch_all().unwrap();
    assert_eq!(ids(&deleted), vec![1]);

    db.query(&model).find_by_id(1).hard_delete().run().unwrap();
    assert!(db.query(&model).find_by_id(1).fetch_first().unwrap().is_none());
}

#[test]
fn test_timestamp_sentinel_with_null_active_value() {
    let db = items_db();
    let model = items(config(Sentinel::Now, Sentinel::Null));
    insert_active(&db, &model, 1);
    insert_active(&db, &model, 2);

    db.query(&model).find_by_id(1).delete().run().unwrap();

    let stamp = state(&db, 1);
    let text = stamp.as_str().expect("timestamp text");
    assert!(chrono::DateTime::parse_from_rfc3339(text).is_ok(), "{text}");
    assert_eq!(state(&db, 2), Value::Null);

    let deleted = db.query(&model).where_deleted().fetch_all().unwrap();
    assert_eq!(ids(&deleted), vec![1]);
    let active = db.query(&model).where_not_deleted().fetch_all().unwrap();
    assert_eq!(ids(&active), vec![2]);

    db.query(&model).find_by_id(1).undelete().run().unwrap();
    assert_eq!(state(&db, 1), Value::Null);
}

#[test]
fn test_timestamp_is_taken_when_the_delete_runs() {
    let db = items_db();
    let model = items(config(Sentinel::Now, Sentinel::Null));
    insert_active(&db, &model, 1);

    let query = db.query(&model).find_by_id(1).delete();
    let built = chrono::Utc::now();
    std::thread::sleep(std::time::Duration::from_millis(20));
    query.run().unwrap();

    let stamp = state(&db, 1);
    let text = stamp.as_str().expect("timestamp text");
    let stamped = chrono::DateTime::parse_from_rfc3339(text).unwrap();
    assert!(stamped > built, "{stamped} is not after {built}");
}

#[test]
fn test_third_value_counts_as_deleted_for_non_boolean_sentinels() {
    let db = items_db();
    let model = items(config(Sentinel::Integer(1), Sentinel::Integer(0)));
    db.execute_batch("INSERT INTO Items (id, state) VALUES (1, 0), (2, 1), (3, 7);")
        .unwrap();

    let deleted = db.query(&model).where_deleted().fetch_all().unwrap();
    assert_eq!(ids(&deleted), vec![2, 3]);

    let rows = db.query(&model).fetch_all().unwrap();
    let states: Vec<Option<RowState>> = rows.iter().map(|row| row.state(&model)).collect();
    assert_eq!(
        states,
        vec![
            Some(RowState::Active),
            Some(RowState::Deleted),
            Some(RowState::Deleted)
        ]
    );
}

#[test]
fn test_boolean_sentinel_matches_true_only() {
    let db = items_db();
    let model = items(config(Sentinel::Bool(true), Sentinel::Bool(false)));
    db.execute_batch("INSERT INTO Items (id, state) VALUES (1, 0), (2, 1), (3, 7);")
        .unwrap();

    let deleted = db.query(&model).where_deleted().fetch_all().unwrap();
    assert_eq!(ids(&deleted), vec![2]);
    let active = db.query(&model).where_not_deleted().fetch_all().unwrap();
    assert_eq!(ids(&active), vec![1]);
}

fn deleted_sentinel() -> impl Strategy<Value = Sentinel> {
    prop_oneof![
        Just(Sentinel::Bool(true)),
        (-1000i64..1000).prop_map(Sentinel::Integer),
        Just(Sentinel::Now),
    ]
}

fn active_sentinel() -> impl Strategy<Value = Sentinel> {
    prop_oneof![
        Just(Sentinel::Bool(false)),
        (-1000i64..1000).prop_map(Sentinel::Integer),
        Just(Sentinel::Null),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn soft_delete_then_undelete_restores_active_value(
        deleted in deleted_sentinel(),
        active in active_sentinel(),
        total in 1usize..6,
        deleted_count in 0usize..6,
    ) {
        let built = SoftDeleteConfig::builder()
            .column_name("state")
            .deleted_value(deleted)
            .not_deleted_value(active)
            .build();
        prop_assume!(built.is_ok());
        let model = items(built.unwrap());
        let db = items_db();
        let deleted_count = deleted_count.min(total);
        let all: Vec<i64> = (1..=i64::try_from(total).unwrap()).collect();
        for &id in &all {
            insert_active(&db, &model, id);
        }
        let victims: Vec<i64> = all.iter().copied().take(deleted_count).collect();

        db.query(&model).where_in("id", victims.clone()).delete().run().unwrap();

        let gone = db.query(&model).where_deleted().fetch_all().unwrap();
        let kept = db.query(&model).where_not_deleted().fetch_all().unwrap();
        prop_assert_eq!(ids(&gone), victims.clone());
        prop_assert_eq!(kept.len(), total - deleted_count);
        for row in &gone {
            prop_assert_eq!(row.state(&model), Some(RowState::Deleted));
        }

        db.query(&model).where_in("id", victims).undelete().run().unwrap();

        let restored = model.soft_delete().unwrap().undelete_value();
        for &id in &all {
            prop_assert!(state(&db, id).sql_is(&restored));
        }
        let kept = db.query(&model).where_not_deleted().fetch_all().unwrap();
        prop_assert_eq!(kept.len(), total);
    }
}
