//! Typed record collection behaviour as seen by the result layer.

use rowmap_api::{Dynamic, Entity, MapperError, Record, Related, Row, RowRef, Value};
use rowmap_engine::{RecordKey, RecordSet};

fn entity(id: i64) -> Entity {
    Entity::new(RowRef::new(Row::from_iter([("id", id)])))
}

#[test]
fn remove_then_iterate() {
    let mut set = RecordSet::from_records([(0_u64, entity(10)), (1, entity(11))]);
    set.remove(&RecordKey::Index(0));

    assert_eq!(set.len(), 1);
    let seen: Vec<(RecordKey, Value)> = set
        .iter()
        .map(|(k, r)| (k.clone(), r.row().value("id")))
        .collect();
    assert_eq!(seen, vec![(RecordKey::Index(1), Value::from(11))]);
}

#[test]
fn iteration_is_restartable() {
    let set: RecordSet<Entity> = (1..=3).map(entity).collect();
    let first: Vec<RecordKey> = set.keys().cloned().collect();
    let second: Vec<RecordKey> = (&set).into_iter().map(|(k, _)| k.clone()).collect();
    assert_eq!(first, second);
    assert_eq!(first, vec![RecordKey::Index(0), RecordKey::Index(1), RecordKey::Index(2)]);
}

#[test]
fn empty_set_flattens_to_empty_map() {
    let set: RecordSet<Entity> = RecordSet::new();
    assert!(set.is_empty());
    assert!(set.to_plain().is_empty());
}

#[test]
fn push_grows_by_exactly_one() {
    let mut set = RecordSet::from_records([("first", entity(1))]);
    let before = set.len();
    let key = set.push(entity(2)).unwrap();
    assert_eq!(set.len(), before + 1);
    assert_eq!(set.get(&key).unwrap().row().value("id"), Value::from(2));
}

#[test]
fn invalid_type_leaves_set_unchanged() {
    let mut set = RecordSet::from_records([(0_u64, entity(1))]);
    let err = set.try_set(Some(RecordKey::Index(0)), Box::new(42_i64)).unwrap_err();
    assert!(matches!(err, MapperError::InvalidType { actual: "i64", .. }));
    assert_eq!(set.len(), 1);
    assert_eq!(set[&RecordKey::Index(0)].row().value("id"), Value::from(1));
}

#[test]
fn try_from_dynamic_checks_every_value() {
    let ok = RecordSet::<Entity>::try_from_dynamic([
        (0_u64, Box::new(entity(1)) as Box<dyn Dynamic>),
        (1, Box::new(entity(2)) as Box<dyn Dynamic>),
    ])
    .unwrap();
    assert_eq!(ok.len(), 2);

    let err = RecordSet::<Entity>::try_from_dynamic([
        (0_u64, Box::new(entity(1)) as Box<dyn Dynamic>),
        (1, Box::new("oops") as Box<dyn Dynamic>),
    ])
    .unwrap_err();
    assert!(matches!(err, MapperError::InvalidType { actual: "&str", .. }));
}

#[test]
fn plain_copy_flattens_nested_records_in_order() {
    let post = Entity::new(RowRef::new(Row::from_iter([
        ("id", Value::from(5)),
        ("title", Value::from("hello")),
    ])))
    .with_related("author", Related::Record(Box::new(entity(1))))
    .with_related("comments", Related::Set(Vec::new()));

    let mut set = RecordSet::new();
    set.set(Some("featured".into()), post).unwrap();
    set.push(entity(6)).unwrap();

    let plain = set.to_plain();
    assert_eq!(plain.keys().collect::<Vec<_>>(), vec!["featured", "0"]);
    assert_eq!(
        serde_json::Value::Object(plain),
        serde_json::json!({
            "featured": {
                "id": 5,
                "title": "hello",
                "author": {"id": 1},
                "comments": [],
            },
            "0": {"id": 6},
        })
    );
}
