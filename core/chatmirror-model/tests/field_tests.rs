use chatmirror_model::{Account, Event, FieldError, ItemKind, ModelItem, Room, Upload, UploadStatus};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;

fn room(id: &str) -> ModelItem {
    Room::new(id, "@a:x").into()
}

// ── Reading ──────────────────────────────────────────────────────

#[test]
fn fields_follow_declaration_order() {
    let item: ModelItem = Account::new("@a:x").into();
    let names: Vec<String> = item.fields().unwrap().keys().cloned().collect();
    assert_eq!(
        names,
        vec![
            "id",
            "display_name",
            "avatar_url",
            "max_upload_size",
            "profile_updated",
            "first_sync_done",
        ]
    );
}

#[test]
fn field_reads_wire_value() {
    let mut account = Account::new("@a:x");
    account.display_name = "Alice".into();
    let item = ModelItem::from(account);
    assert_eq!(item.field("display_name").unwrap(), json!("Alice"));
    assert_eq!(item.field("first_sync_done").unwrap(), json!(false));
}

#[test]
fn dates_cross_as_rfc3339() {
    let date = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let item: ModelItem = Event::new("$e", "RoomMessageText", date, "@a:x").into();
    assert_eq!(item.field("date").unwrap(), json!("2024-05-01T12:00:00Z"));
}

#[test]
fn enums_cross_as_strings() {
    let item: ModelItem = Upload::new("/tmp/cat.png").into();
    assert_eq!(item.field("status").unwrap(), json!("Uploading"));
    assert_eq!(item.field("filepath").unwrap(), json!("/tmp/cat.png"));
}

#[test]
fn account_or_room_renames_type_field() {
    let item: ModelItem = chatmirror_model::AccountOrRoom::from_account(&Account::new("@a:x")).into();
    assert_eq!(item.field("type").unwrap(), json!("Account"));
}

#[test]
fn unknown_field_read_is_error() {
    let err = room("!r:x").field("nope").unwrap_err();
    assert!(matches!(err, FieldError::UnknownField { kind: ItemKind::Room, .. }));
}

// ── Writing ──────────────────────────────────────────────────────

#[test]
fn set_field_changes_value() {
    let mut item = room("!r:x");
    assert!(item.set_field("mentions", json!(4)).unwrap());
    assert_eq!(item.field("mentions").unwrap(), json!(4));
}

#[test]
fn set_field_same_value_is_noop() {
    let mut item = room("!r:x");
    assert!(!item.set_field("left", json!(false)).unwrap());
    assert!(!item.set_field("federated", json!(true)).unwrap());
}

#[test]
fn set_field_equal_date_in_other_offset_is_noop() {
    let date = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let mut item: ModelItem = Event::new("$e", "RoomMessageText", date, "@a:x").into();
    assert!(!item.set_field("date", json!("2024-05-01T14:00:00+02:00")).unwrap());
}

#[test]
fn set_field_equal_float_spelled_as_int_is_noop() {
    let mut item: ModelItem = Upload::new("/tmp/a").into();
    assert!(!item.set_field("speed", json!(0)).unwrap());
    assert!(item.set_field("speed", json!(1.5)).unwrap());
}

#[test]
fn non_finite_rates_do_not_block_field_writes() {
    let mut upload = Upload::new("/tmp/a");
    upload.speed = f64::INFINITY;
    upload.time_left = f64::NAN;
    let mut item = ModelItem::from(upload);

    assert_eq!(item.field("speed").unwrap(), json!(0.0));
    assert_eq!(item.field("time_left").unwrap(), json!(0.0));
    assert!(item.set_field("paused", json!(true)).unwrap());
    assert!(item.set_field("speed", json!(2.5)).unwrap());
    assert!(!item.set_field("time_left", json!(null)).unwrap());
    match item {
        ModelItem::Upload(u) => {
            assert!(u.paused);
            assert_eq!(u.speed, 2.5);
            assert_eq!(u.time_left, 0.0);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn set_field_enum() {
    let mut upload = Upload::new("/tmp/a");
    upload.status = UploadStatus::Uploading;
    let mut item = ModelItem::from(upload);
    assert!(item.set_field("status", json!("Error")).unwrap());
    match item {
        ModelItem::Upload(u) => assert_eq!(u.status, UploadStatus::Error),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn set_field_wrong_type_is_error_and_leaves_item() {
    let mut item = room("!r:x");
    let before = item.clone();
    let err = item.set_field("mentions", json!("many")).unwrap_err();
    assert!(matches!(err, FieldError::InvalidValue { .. }));
    assert_eq!(item, before);
}

#[test]
fn set_unknown_field_is_error() {
    let mut item = room("!r:x");
    let err = item.set_field("colour", json!("red")).unwrap_err();
    assert!(matches!(err, FieldError::UnknownField { .. }));
}

#[test]
fn id_is_immutable() {
    let mut item = room("!r:x");
    let err = item.set_field("id", json!("!other:x")).unwrap_err();
    assert!(matches!(err, FieldError::ImmutableField { .. }));
    assert_eq!(item.id(), "!r:x");
}

// ── Change detection ─────────────────────────────────────────────

#[test]
fn changed_fields_lists_only_differences() {
    let old = room("!r:x");
    let mut new = old.clone();
    new.set_field("mentions", json!(2)).unwrap();
    new.set_field("display_name", json!("Lobby")).unwrap();

    let changed = old.changed_fields(&new).unwrap();
    assert_eq!(
        changed,
        vec![
            ("display_name".to_string(), json!("Lobby")),
            ("mentions".to_string(), json!(2)),
        ]
    );
}

#[test]
fn changed_fields_of_identical_items_is_empty() {
    let item = room("!r:x");
    assert!(item.changed_fields(&item.clone()).unwrap().is_empty());
}
