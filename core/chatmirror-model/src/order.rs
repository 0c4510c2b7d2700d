//! Ordering helpers shared by several item kinds.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// The name a user-like record sorts by: its display name, or its id
/// without the leading sigil when no display name is set. Lower-cased.
pub(crate) fn sort_name(display_name: &str, id: &str) -> String {
    if display_name.is_empty() {
        let mut chars = id.chars();
        chars.next();
        chars.as_str().to_lowercase()
    } else {
        display_name.to_lowercase()
    }
}

/// The name a room sorts by: its display name, or its id.
pub(crate) fn room_sort_name(display_name: &str, id: &str) -> String {
    if display_name.is_empty() {
        id.to_lowercase()
    } else {
        display_name.to_lowercase()
    }
}

/// Rank of a room in a room list.
///
/// Rooms still joined come before left ones; within those, pending invites
/// come first; then the most recently active; then by name.
pub(crate) struct RoomRank<'a> {
    pub left: bool,
    pub inviter_id: &'a str,
    pub last_event_date: DateTime<Utc>,
    pub name: String,
}

impl RoomRank<'_> {
    pub(crate) fn cmp(&self, other: &RoomRank<'_>) -> Ordering {
        let invited = !self.inviter_id.is_empty();
        let other_invited = !other.inviter_id.is_empty();

        // Left rooms may still have an inviter, so check left first.
        self.left
            .cmp(&other.left)
            .then_with(|| other_invited.cmp(&invited))
            .then_with(|| other.last_event_date.cmp(&self.last_event_date))
            .then_with(|| self.name.cmp(&other.name))
    }
}
