use crate::order::{room_sort_name, sort_name, RoomRank};
use crate::{Account, Item, ItemKind, Room};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One row of the account/room tree: either an account, or one of its rooms.
///
/// Rows sort by owning account, the account row first, then its rooms in
/// room-list order. The owning account's sort key is carried as
/// `account_order` so that renaming an account is seen as a field change
/// of every row it owns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountOrRoom {
    pub id: String,
    /// `"Account"` or `"Room"`.
    #[serde(rename = "type")]
    pub row_type: String,
    pub display_name: String,
    pub avatar_url: String,

    pub account_id: String,
    pub account_order: String,

    // Account fields
    pub profile_updated: DateTime<Utc>,
    pub first_sync_done: bool,

    // Room fields
    pub for_account: String,
    pub inviter_id: String,
    pub inviter_name: String,
    pub left: bool,
    pub last_event_date: DateTime<Utc>,
    pub mentions: u32,
}

impl AccountOrRoom {
    /// Builds the row of an account.
    #[must_use]
    pub fn from_account(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            row_type: ItemKind::Account.name().to_string(),
            display_name: account.display_name.clone(),
            avatar_url: account.avatar_url.clone(),
            account_id: account.id.clone(),
            account_order: account.sort_name(),
            profile_updated: account.profile_updated,
            first_sync_done: account.first_sync_done,
            ..Default::default()
        }
    }

    /// Builds the row of a room, placed under `account` when it is known,
    /// otherwise under the room's `for_account` id.
    #[must_use]
    pub fn from_room(room: &Room, account: Option<&Account>) -> Self {
        let account_order = match account {
            Some(account) => account.sort_name(),
            None => sort_name("", &room.for_account),
        };
        Self {
            id: room.id.clone(),
            row_type: ItemKind::Room.name().to_string(),
            display_name: room.display_name.clone(),
            avatar_url: room.avatar_url.clone(),
            account_id: room.for_account.clone(),
            account_order,
            for_account: room.for_account.clone(),
            inviter_id: room.inviter_id.clone(),
            inviter_name: room.inviter_name.clone(),
            left: room.left,
            last_event_date: room.last_event_date,
            mentions: room.mentions,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn is_account(&self) -> bool {
        self.row_type == ItemKind::Account.name()
    }

    fn rank(&self) -> RoomRank<'_> {
        RoomRank {
            left: self.left,
            inviter_id: &self.inviter_id,
            last_event_date: self.last_event_date,
            name: room_sort_name(&self.display_name, &self.id),
        }
    }
}

impl Item for AccountOrRoom {
    const KIND: ItemKind = ItemKind::AccountOrRoom;

    fn id(&self) -> String {
        self.id.clone()
    }

    fn order(&self, other: &Self) -> Ordering {
        self.account_order
            .cmp(&other.account_order)
            .then_with(|| self.account_id.cmp(&other.account_id))
            .then_with(|| other.is_account().cmp(&self.is_account()))
            .then_with(|| self.rank().cmp(&other.rank()))
    }
}
