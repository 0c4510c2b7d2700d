use chatmirror_model::{FieldError, Member, ModelItem, Room};
use chatmirror_store::{MemorySink, Model, StoreError};
use chatmirror_types::{FieldMap, ItemKey, ModelEvent, SyncId};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;
use std::thread;

fn members() -> SyncId {
    SyncId::room("@a:x", "!r:x", "members")
}

fn setup() -> (Arc<Model>, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    (Model::new(members(), sink.clone()), sink)
}

fn member(id: &str, power: i64) -> Member {
    let mut m = Member::new(id);
    m.power_level = power;
    m
}

fn ids(model: &Model) -> Vec<String> {
    model.items().iter().map(ModelItem::id).collect()
}

// ── Insert ───────────────────────────────────────────────────────

#[test]
fn insert_into_empty_emits_inserted_at_zero() {
    let (model, sink) = setup();
    let a = member("@a:x", 0);
    model.upsert(ItemKey::id("@a:x"), a.clone().into()).unwrap();

    assert_eq!(
        sink.take(),
        vec![ModelEvent::Inserted {
            sync_id: members(),
            index: 0,
            item: ModelItem::from(a).fields().unwrap(),
        }]
    );
    assert_eq!(model.len(), 1);
}

#[test]
fn inserts_land_at_sorted_position() {
    let (model, sink) = setup();
    model.upsert_item(member("@low:x", 0)).unwrap();
    model.upsert_item(member("@high:x", 100)).unwrap();
    model.upsert_item(member("@mid:x", 50)).unwrap();

    let indices: Vec<usize> = sink
        .take()
        .into_iter()
        .map(|e| match e {
            ModelEvent::Inserted { index, .. } => index,
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(indices, vec![0, 0, 1]);
    assert_eq!(ids(&model), vec!["@high:x", "@mid:x", "@low:x"]);
}

// ── Replace ──────────────────────────────────────────────────────

#[test]
fn replacing_item_moves_it_and_reports_both_indices() {
    let (model, sink) = setup();
    model.upsert_item(member("r1", 10)).unwrap();
    model.upsert_item(member("r2", 5)).unwrap();
    assert_eq!(ids(&model), vec!["r1", "r2"]);
    sink.take();

    model.upsert_item(member("r2", 20)).unwrap();

    assert_eq!(
        sink.take(),
        vec![ModelEvent::FieldChanged {
            sync_id: members(),
            index_then: 1,
            index_now: 0,
            field: "power_level".into(),
            value: json!(20),
        }]
    );
    assert_eq!(ids(&model), vec!["r2", "r1"]);
}

#[test]
fn multi_field_change_carries_move_on_first_event_only() {
    let (model, sink) = setup();
    model.upsert_item(member("r1", 10)).unwrap();
    model.upsert_item(member("r2", 5)).unwrap();
    sink.take();

    let mut r2 = member("r2", 20);
    r2.display_name = "Second".into();
    model.upsert_item(r2).unwrap();

    assert_eq!(
        sink.take(),
        vec![
            ModelEvent::FieldChanged {
                sync_id: members(),
                index_then: 1,
                index_now: 0,
                field: "display_name".into(),
                value: json!("Second"),
            },
            ModelEvent::FieldChanged {
                sync_id: members(),
                index_then: 0,
                index_now: 0,
                field: "power_level".into(),
                value: json!(20),
            },
        ]
    );
}

#[test]
fn identical_upsert_emits_nothing() {
    let (model, sink) = setup();
    model.upsert_item(member("@a:x", 3)).unwrap();
    sink.take();

    model.upsert_item(member("@a:x", 3)).unwrap();
    assert!(sink.is_empty());
}

// ── Field updates ────────────────────────────────────────────────

#[test]
fn update_field_reports_change_and_resorts() {
    let (model, sink) = setup();
    model.upsert_item(member("a", 10)).unwrap();
    model.upsert_item(member("b", 5)).unwrap();
    sink.take();

    let changed = model
        .update_field(&ItemKey::id("b"), "power_level", json!(50))
        .unwrap();
    assert!(changed);
    assert_eq!(ids(&model), vec!["b", "a"]);
    assert_eq!(
        sink.take(),
        vec![ModelEvent::FieldChanged {
            sync_id: members(),
            index_then: 1,
            index_now: 0,
            field: "power_level".into(),
            value: json!(50),
        }]
    );
}

#[test]
fn update_field_same_value_is_noop() {
    let (model, sink) = setup();
    model.upsert_item(member("a", 10)).unwrap();
    sink.take();

    let changed = model
        .update_field(&ItemKey::id("a"), "power_level", json!(10))
        .unwrap();
    assert!(!changed);
    assert!(sink.is_empty());
}

#[test]
fn update_field_errors() {
    let (model, sink) = setup();
    model.upsert_item(member("a", 10)).unwrap();
    sink.take();

    let missing = model.update_field(&ItemKey::id("zz"), "power_level", json!(1));
    assert!(matches!(missing, Err(StoreError::NotFound { .. })));

    let unknown = model.update_field(&ItemKey::id("a"), "nope", json!(1));
    assert!(matches!(
        unknown,
        Err(StoreError::Field(FieldError::UnknownField { .. }))
    ));

    let immutable = model.update_field(&ItemKey::id("a"), "id", json!("b"));
    assert!(matches!(
        immutable,
        Err(StoreError::Field(FieldError::ImmutableField { .. }))
    ));

    let invalid = model.update_field(&ItemKey::id("a"), "power_level", json!("high"));
    assert!(matches!(
        invalid,
        Err(StoreError::Field(FieldError::InvalidValue { .. }))
    ));

    assert!(sink.is_empty());
    assert_eq!(
        model.get(&ItemKey::id("a")),
        Some(member("a", 10).into())
    );
}

// ── Delete ───────────────────────────────────────────────────────

#[test]
fn delete_reports_index_and_returns_item() {
    let (model, sink) = setup();
    model.upsert_item(member("a", 10)).unwrap();
    model.upsert_item(member("b", 5)).unwrap();
    sink.take();

    let removed = model.delete(&ItemKey::id("b")).unwrap();
    assert_eq!(removed, Some(member("b", 5).into()));
    assert_eq!(
        sink.take(),
        vec![ModelEvent::Deleted { sync_id: members(), index: 1 }]
    );
}

#[test]
fn delete_absent_is_idempotent() {
    let (model, sink) = setup();
    model.upsert_item(member("a", 10)).unwrap();
    model.delete(&ItemKey::id("a")).unwrap();
    sink.take();

    assert_eq!(model.delete(&ItemKey::id("a")).unwrap(), None);
    assert!(sink.is_empty());
}

// ── Clear ────────────────────────────────────────────────────────

#[test]
fn clear_emits_single_cleared_even_when_empty() {
    let (model, sink) = setup();
    model.clear().unwrap();
    assert_eq!(sink.take(), vec![ModelEvent::Cleared { sync_id: members() }]);

    model.upsert_item(member("a", 1)).unwrap();
    model.upsert_item(member("b", 2)).unwrap();
    sink.take();
    model.clear().unwrap();
    assert_eq!(sink.take(), vec![ModelEvent::Cleared { sync_id: members() }]);
    assert!(model.is_empty());
}

#[test]
fn clear_matching_adjusts_indices_for_earlier_removals() {
    let (model, sink) = setup();
    for (i, power) in [50, 40, 30, 20, 10].into_iter().enumerate() {
        model.upsert_item(member(&format!("m{i}"), power)).unwrap();
    }
    sink.take();

    let removed = model
        .clear_matching(|key, _| key.leaf_id() == "m1" || key.leaf_id() == "m3")
        .unwrap();

    assert_eq!(removed, 2);
    assert_eq!(
        sink.take(),
        vec![
            ModelEvent::Deleted { sync_id: members(), index: 1 },
            ModelEvent::Deleted { sync_id: members(), index: 2 },
        ]
    );
    assert_eq!(ids(&model), vec!["m0", "m2", "m4"]);
}

#[test]
fn clear_matching_nothing_emits_nothing() {
    let (model, sink) = setup();
    model.upsert_item(member("a", 1)).unwrap();
    sink.take();

    assert_eq!(model.clear_matching(|_, _| false).unwrap(), 0);
    assert!(sink.is_empty());
}

// ── Homogeneity ──────────────────────────────────────────────────

#[test]
fn mixing_kinds_is_rejected_until_empty() {
    let (model, sink) = setup();
    model.upsert_item(member("a", 1)).unwrap();
    sink.take();

    let err = model.upsert_item(Room::new("!r:x", "@a:x")).unwrap_err();
    assert!(matches!(err, StoreError::KindMismatch { .. }));
    assert!(sink.is_empty());
    assert_eq!(model.len(), 1);

    model.delete(&ItemKey::id("a")).unwrap();
    assert_eq!(model.kind(), None);
    model.upsert_item(Room::new("!r:x", "@a:x")).unwrap();
    assert_eq!(model.len(), 1);
}

// ── Reads ────────────────────────────────────────────────────────

#[test]
fn reads_return_snapshots() {
    let (model, _sink) = setup();
    model.upsert_item(member("a", 1)).unwrap();

    let mut copy = model.get(&ItemKey::id("a")).unwrap();
    copy.set_field("power_level", json!(99)).unwrap();

    assert_eq!(model.get(&ItemKey::id("a")), Some(member("a", 1).into()));
    assert_eq!(model.index_of(&ItemKey::id("a")), Some(0));
    assert_eq!(model.index_of(&ItemKey::id("b")), None);
    assert_eq!(
        model.serialized_item(&ItemKey::id("a")).unwrap().unwrap()["power_level"],
        json!(1)
    );
}

// ── Concurrency ──────────────────────────────────────────────────

#[test]
fn concurrent_writers_emit_replayable_events() {
    let (model, sink) = setup();

    thread::scope(|s| {
        for t in 0..4i64 {
            let model = &model;
            s.spawn(move || {
                for i in 0..300i64 {
                    let id = (i * 7 + t * 3) % 12;
                    let key = ItemKey::id(format!("@m{id}:x"));
                    match (i + t) % 5 {
                        0 => {
                            model.delete(&key).unwrap();
                        }
                        1 => {
                            // Absent keys fail with NotFound and change nothing.
                            let _ = model.update_field(&key, "power_level", json!(i % 9));
                        }
                        _ => {
                            let mut m = Member::new(format!("@m{id}:x"));
                            m.power_level = (i + t) % 6;
                            m.invited = i % 4 == 0;
                            model.upsert(key, m.into()).unwrap();
                        }
                    }
                }
            });
        }
    });

    let mut mirror = Vec::new();
    for event in sink.take() {
        replay(&mut mirror, event);
    }
    assert_eq!(mirror, model.serialized_items().unwrap());
    for pair in model.items().windows(2) {
        assert_ne!(pair[0].order(&pair[1]), std::cmp::Ordering::Greater);
    }
}

// ── Properties ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Upsert { id: u8, power: i64, invited: bool },
    SetPower { id: u8, power: i64 },
    Delete { id: u8 },
    DropBelow { power: i64 },
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (0u8..8, 0i64..5, any::<bool>())
            .prop_map(|(id, power, invited)| Op::Upsert { id, power, invited }),
        3 => (0u8..8, 0i64..5).prop_map(|(id, power)| Op::SetPower { id, power }),
        2 => (0u8..8).prop_map(|id| Op::Delete { id }),
        1 => (0i64..5).prop_map(|power| Op::DropBelow { power }),
        1 => Just(Op::Clear),
    ]
}

fn key(id: u8) -> ItemKey {
    ItemKey::id(format!("@m{id}:x"))
}

fn apply(model: &Model, op: &Op) {
    match *op {
        Op::Upsert { id, power, invited } => {
            let mut m = Member::new(format!("@m{id}:x"));
            m.power_level = power;
            m.invited = invited;
            model.upsert(key(id), m.into()).unwrap();
        }
        Op::SetPower { id, power } => {
            // Absent keys fail with NotFound and change nothing.
            let _ = model.update_field(&key(id), "power_level", json!(power));
        }
        Op::Delete { id } => {
            model.delete(&key(id)).unwrap();
        }
        Op::DropBelow { power } => {
            model
                .clear_matching(|_, item| match item {
                    ModelItem::Member(m) => m.power_level < power,
                    _ => false,
                })
                .unwrap();
        }
        Op::Clear => model.clear().unwrap(),
    }
}

fn replay(mirror: &mut Vec<FieldMap>, event: ModelEvent) {
    match event {
        ModelEvent::Inserted { index, item, .. } => mirror.insert(index, item),
        ModelEvent::FieldChanged { index_then, index_now, field, value, .. } => {
            let mut item = mirror.remove(index_then);
            item.insert(field, value);
            mirror.insert(index_now, item);
        }
        ModelEvent::Deleted { index, .. } => {
            mirror.remove(index);
        }
        ModelEvent::Cleared { .. } => mirror.clear(),
    }
}

proptest! {
    #[test]
    fn items_stay_sorted(ops in prop::collection::vec(op(), 1..60)) {
        let (model, _sink) = setup();
        for op in &ops {
            apply(&model, op);
            let items = model.items();
            for pair in items.windows(2) {
                prop_assert_ne!(pair[0].order(&pair[1]), std::cmp::Ordering::Greater);
            }
        }
    }

    #[test]
    fn replaying_events_reproduces_the_collection(ops in prop::collection::vec(op(), 1..60)) {
        let (model, sink) = setup();
        let mut mirror = Vec::new();
        for op in &ops {
            apply(&model, op);
            for event in sink.take() {
                replay(&mut mirror, event);
            }
            prop_assert_eq!(&mirror, &model.serialized_items().unwrap());
        }
    }
}
