use crate::order::sort_name;
use crate::{Item, ItemKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A logged in account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    pub id: String,
    pub display_name: String,
    pub avatar_url: String,
    pub max_upload_size: u64,
    pub profile_updated: DateTime<Utc>,
    pub first_sync_done: bool,
}

impl Account {
    /// Creates an account with only its user id known.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// The key accounts are sorted by.
    #[must_use]
    pub fn sort_name(&self) -> String {
        sort_name(&self.display_name, &self.id)
    }
}

impl Item for Account {
    const KIND: ItemKind = ItemKind::Account;

    fn id(&self) -> String {
        self.id.clone()
    }

    fn order(&self, other: &Self) -> Ordering {
        self.sort_name().cmp(&other.sort_name())
    }
}
