use crate::order::room_sort_name;
use crate::{Item, ItemKind};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A device of a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Device {
    pub id: String,
    pub ed25519_key: String,
    pub trusted: bool,
    pub blacklisted: bool,
    pub display_name: String,
    pub last_seen_ip: String,
    pub last_seen_date: String,
}

impl Device {
    pub fn new(id: impl Into<String>, ed25519_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ed25519_key: ed25519_key.into(),
            ..Default::default()
        }
    }
}

impl Item for Device {
    const KIND: ItemKind = ItemKind::Device;

    fn id(&self) -> String {
        self.id.clone()
    }

    fn order(&self, other: &Self) -> Ordering {
        room_sort_name(&self.display_name, &self.id)
            .cmp(&room_sort_name(&other.display_name, &other.id))
    }
}
