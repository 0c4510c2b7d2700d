use crate::{Item, ItemKind};
use chatmirror_types::{FieldMap, FieldValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Clarifies the purpose of some state events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeSpecifier {
    #[default]
    Unset,
    ProfileChange,
    MembershipChange,
}

/// A timeline event: a message or a state change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    pub id: String,
    pub event_id: String,
    pub event_type: String,
    pub date: DateTime<Utc>,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_avatar: String,

    pub content: String,
    pub inline_content: String,
    pub reason: String,
    pub links: Vec<String>,
    /// `(user_id, display_name)` pairs mentioned in the content.
    pub mentions: Vec<(String, String)>,

    pub type_specifier: TypeSpecifier,

    pub target_id: String,
    pub target_name: String,
    pub target_avatar: String,
    pub redacter_id: String,
    pub redacter_name: String,

    pub is_local_echo: bool,
    /// The raw source event, as received.
    pub source: FieldValue,

    pub media_url: String,
    pub media_title: String,
    pub media_width: u32,
    pub media_height: u32,
    pub media_duration: u64,
    pub media_size: u64,
    pub media_mime: String,
    pub media_crypt_dict: FieldMap,

    pub thumbnail_url: String,
    pub thumbnail_mime: String,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    pub thumbnail_crypt_dict: FieldMap,
}

impl Event {
    pub fn new(
        id: impl Into<String>,
        event_type: impl Into<String>,
        date: DateTime<Utc>,
        sender_id: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            event_id: id.clone(),
            id,
            event_type: event_type.into(),
            date,
            sender_id: sender_id.into(),
            ..Default::default()
        }
    }
}

impl Item for Event {
    const KIND: ItemKind = ItemKind::Event;

    fn id(&self) -> String {
        self.id.clone()
    }

    /// Newest first.
    fn order(&self, other: &Self) -> Ordering {
        other.date.cmp(&self.date)
    }
}
