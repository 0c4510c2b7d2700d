//! Non-owning handles to items held by a collection.

use crate::error::{StoreError, StoreResult};
use crate::model::Model;
use chatmirror_model::ModelItem;
use chatmirror_types::{FieldValue, ItemKey};
use std::sync::{Arc, Weak};

/// A weak back-reference from an attached item to its collection.
///
/// The handle never keeps the collection alive. Writes go through the
/// collection's own update path, so its sort order and notifications stay
/// consistent.
#[derive(Debug, Clone)]
pub struct ItemHandle {
    model: Weak<Model>,
    key: ItemKey,
}

impl ItemHandle {
    pub(crate) fn new(model: Weak<Model>, key: ItemKey) -> Self {
        Self { model, key }
    }

    pub fn key(&self) -> &ItemKey {
        &self.key
    }

    /// The owning collection, if it is still alive.
    pub fn model(&self) -> Option<Arc<Model>> {
        self.model.upgrade()
    }

    /// Whether the collection is alive and still holds the item.
    pub fn is_attached(&self) -> bool {
        self.model().is_some_and(|model| model.contains(&self.key))
    }

    /// A snapshot of the item.
    pub fn get(&self) -> StoreResult<ModelItem> {
        self.model()
            .and_then(|model| model.get(&self.key))
            .ok_or_else(|| self.detached())
    }

    /// Changes one field through the owning collection.
    ///
    /// Returns `Ok(false)` when the field already holds `value`.
    pub fn set_field(&self, field: &str, value: FieldValue) -> StoreResult<bool> {
        let model = self.model().ok_or_else(|| self.detached())?;
        match model.update_field(&self.key, field, value) {
            Err(StoreError::NotFound { .. }) => Err(self.detached()),
            other => other,
        }
    }

    fn detached(&self) -> StoreError {
        StoreError::Detached {
            key: self.key.clone(),
        }
    }
}
