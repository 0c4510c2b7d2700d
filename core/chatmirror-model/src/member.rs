use crate::order::sort_name;
use crate::{Item, ItemKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A member of a room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Member {
    pub id: String,
    pub display_name: String,
    pub avatar_url: String,
    pub typing: bool,
    pub power_level: i64,
    pub invited: bool,
    pub profile_updated: DateTime<Utc>,
}

impl Member {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

impl Item for Member {
    const KIND: ItemKind = ItemKind::Member;

    fn id(&self) -> String {
        self.id.clone()
    }

    /// Joined members first, then by descending power level, then by name.
    fn order(&self, other: &Self) -> Ordering {
        self.invited
            .cmp(&other.invited)
            .then_with(|| other.power_level.cmp(&self.power_level))
            .then_with(|| {
                sort_name(&self.display_name, &self.id)
                    .cmp(&sort_name(&other.display_name, &other.id))
            })
    }
}
