use crate::order::{room_sort_name, RoomRank};
use crate::{Item, ItemKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A room an account is invited to, is, or was a member of.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Room {
    pub id: String,
    pub for_account: String,
    pub given_name: String,
    pub display_name: String,
    pub main_alias: String,
    pub avatar_url: String,
    pub plain_topic: String,
    pub topic: String,
    pub inviter_id: String,
    pub inviter_name: String,
    pub inviter_avatar: String,
    pub left: bool,

    pub typing_members: Vec<String>,

    pub federated: bool,
    pub encrypted: bool,
    pub invite_required: bool,
    pub guests_allowed: bool,

    pub can_invite: bool,
    pub can_redact_all: bool,
    pub can_send_messages: bool,
    pub can_set_name: bool,
    pub can_set_topic: bool,
    pub can_set_avatar: bool,
    pub can_set_encryption: bool,
    pub can_set_join_rules: bool,
    pub can_set_guest_access: bool,

    pub last_event_date: DateTime<Utc>,

    pub mentions: u32,
}

impl Default for Room {
    fn default() -> Self {
        Self {
            id: String::new(),
            for_account: String::new(),
            given_name: String::new(),
            display_name: String::new(),
            main_alias: String::new(),
            avatar_url: String::new(),
            plain_topic: String::new(),
            topic: String::new(),
            inviter_id: String::new(),
            inviter_name: String::new(),
            inviter_avatar: String::new(),
            left: false,
            typing_members: Vec::new(),
            federated: true,
            encrypted: false,
            invite_required: true,
            guests_allowed: true,
            can_invite: false,
            can_redact_all: false,
            can_send_messages: false,
            can_set_name: false,
            can_set_topic: false,
            can_set_avatar: false,
            can_set_encryption: false,
            can_set_join_rules: false,
            can_set_guest_access: false,
            last_event_date: DateTime::default(),
            mentions: 0,
        }
    }
}

impl Room {
    /// Creates a room of `for_account` with only its id known.
    pub fn new(id: impl Into<String>, for_account: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            for_account: for_account.into(),
            ..Default::default()
        }
    }

    /// Whether this is a pending invite.
    #[must_use]
    pub fn is_invite(&self) -> bool {
        !self.left && !self.inviter_id.is_empty()
    }

    pub(crate) fn rank(&self) -> RoomRank<'_> {
        RoomRank {
            left: self.left,
            inviter_id: &self.inviter_id,
            last_event_date: self.last_event_date,
            name: room_sort_name(&self.display_name, &self.id),
        }
    }
}

impl Item for Room {
    const KIND: ItemKind = ItemKind::Room;

    fn id(&self) -> String {
        self.id.clone()
    }

    fn order(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}
