//! Change notifications emitted by collections.
//!
//! Every committed mutation of a collection produces one or more
//! [`ModelEvent`]s. Indices are positions in the collection's sorted order
//! at the instant the event is emitted: they are a snapshot, not a stable
//! identifier, so a consumer must apply the events of one stream strictly
//! in emission order. Ordering across streams is not guaranteed.

use crate::{FieldMap, FieldValue, SyncId};
use serde::{Deserialize, Serialize};

/// One atomic change to one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ModelEvent {
    /// An item was inserted at `index`.
    #[serde(rename = "ModelItemInserted")]
    Inserted {
        sync_id: SyncId,
        index: usize,
        /// Full snapshot of the inserted item.
        item: FieldMap,
    },

    /// One field of an existing item changed. The item moved from
    /// `index_then` to `index_now` (possibly the same position).
    #[serde(rename = "ModelItemFieldChanged")]
    FieldChanged {
        sync_id: SyncId,
        index_then: usize,
        index_now: usize,
        field: String,
        value: FieldValue,
    },

    /// The item at `index` was removed.
    #[serde(rename = "ModelItemDeleted")]
    Deleted { sync_id: SyncId, index: usize },

    /// Every item was removed.
    #[serde(rename = "ModelCleared")]
    Cleared { sync_id: SyncId },
}

impl ModelEvent {
    /// The stream this event belongs to.
    #[must_use]
    pub fn sync_id(&self) -> &SyncId {
        match self {
            Self::Inserted { sync_id, .. }
            | Self::FieldChanged { sync_id, .. }
            | Self::Deleted { sync_id, .. }
            | Self::Cleared { sync_id } => sync_id,
        }
    }

    /// The event name as seen by the presentation layer.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Inserted { .. } => "ModelItemInserted",
            Self::FieldChanged { .. } => "ModelItemFieldChanged",
            Self::Deleted { .. } => "ModelItemDeleted",
            Self::Cleared { .. } => "ModelCleared",
        }
    }

    /// Serializes the event for the presentation boundary.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
