use chatmirror_model::{Member, ModelItem};
use chatmirror_store::{MemorySink, Model, StoreError};
use chatmirror_types::{ItemKey, ModelEvent, SyncId};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn setup() -> (Arc<Model>, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let model = Model::new(SyncId::named("members"), sink.clone());
    model.upsert_item(Member::new("@a:x")).unwrap();
    model.upsert_item(Member::new("@b:x")).unwrap();
    sink.take();
    (model, sink)
}

#[test]
fn handle_only_for_present_keys() {
    let (model, _sink) = setup();
    assert!(model.handle(&ItemKey::id("@a:x")).is_some());
    assert!(model.handle(&ItemKey::id("@nobody:x")).is_none());
}

#[test]
fn handle_writes_go_through_collection() {
    let (model, sink) = setup();
    let handle = model.handle(&ItemKey::id("@b:x")).unwrap();

    assert!(handle.set_field("power_level", json!(100)).unwrap());
    assert!(!handle.set_field("power_level", json!(100)).unwrap());

    assert_eq!(
        sink.take(),
        vec![ModelEvent::FieldChanged {
            sync_id: SyncId::named("members"),
            index_then: 1,
            index_now: 0,
            field: "power_level".into(),
            value: json!(100),
        }]
    );
    match handle.get().unwrap() {
        ModelItem::Member(m) => assert_eq!(m.power_level, 100),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn handle_detaches_on_delete() {
    let (model, _sink) = setup();
    let handle = model.handle(&ItemKey::id("@a:x")).unwrap();
    assert!(handle.is_attached());

    model.delete(&ItemKey::id("@a:x")).unwrap();
    assert!(!handle.is_attached());
    assert!(matches!(handle.get(), Err(StoreError::Detached { .. })));
    assert!(matches!(
        handle.set_field("power_level", json!(1)),
        Err(StoreError::Detached { .. })
    ));
}

#[test]
fn handle_does_not_keep_collection_alive() {
    let (model, _sink) = setup();
    let handle = model.handle(&ItemKey::id("@a:x")).unwrap();
    drop(model);

    assert!(handle.model().is_none());
    assert!(matches!(handle.get(), Err(StoreError::Detached { .. })));
    assert_eq!(handle.key(), &ItemKey::id("@a:x"));
}
