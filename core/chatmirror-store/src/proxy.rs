//! Proxy collections: sorted views derived from one or more sources.
//!
//! A [`ModelProxy`] owns an ordinary [`Model`] and keeps it in step with
//! the sources it is subscribed to. Items are re-keyed as
//! `(source sync id, source key)` so entries merged from several sources
//! never collide, and a source's `Cleared` only removes the entries that
//! source contributed.

use crate::error::StoreResult;
use crate::model::{Model, SourceChange};
use crate::registry::SourceObserver;
use chatmirror_model::ModelItem;
use chatmirror_types::{ItemKey, SyncId};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// The behaviour of a proxy: which sources it takes and how it maps their
/// items.
pub trait ProxyRules: Send + Sync + 'static {
    /// Whether changes from `source` are relevant. Defaults to all.
    fn accept_source(&self, source: &SyncId) -> bool {
        let _ = source;
        true
    }

    /// Maps a source item to the item stored in the proxy.
    ///
    /// Must be deterministic. An item kind the proxy does not aggregate is
    /// a wiring bug and must fail with
    /// [`StoreError::UnsupportedItem`](crate::StoreError::UnsupportedItem).
    fn convert_item(&self, source: &SyncId, item: &ModelItem) -> StoreResult<ModelItem> {
        let _ = source;
        Ok(item.clone())
    }

    /// Called after a converted item was stored in `proxy`, for proxies
    /// whose other entries depend on it.
    fn after_source_set(&self, proxy: &Model, source: &SyncId, item: &ModelItem) -> StoreResult<()> {
        let _ = (proxy, source, item);
        Ok(())
    }
}

/// Rules of a proxy that mirrors its sources unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityRules;

impl ProxyRules for IdentityRules {}

/// A collection that is also an observer of other collections.
///
/// Source changes are applied one at a time, each including its
/// `convert_item` and `after_source_set` calls. A conversion that reads
/// another collection therefore sees either the state before a concurrent
/// change of it, whose notification is applied afterwards, or the state
/// after it.
pub struct ModelProxy {
    model: Arc<Model>,
    rules: Box<dyn ProxyRules>,
    apply: Mutex<()>,
}

impl fmt::Debug for ModelProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelProxy")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl ModelProxy {
    pub fn new(model: Arc<Model>, rules: impl ProxyRules) -> Self {
        Self {
            model,
            rules: Box::new(rules),
            apply: Mutex::new(()),
        }
    }

    /// The proxy's own collection.
    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn accept_source(&self, source: &SyncId) -> bool {
        self.rules.accept_source(source)
    }

    /// Replays the items a source held before the proxy subscribed. The
    /// caller keeps the source frozen until this returns.
    pub(crate) fn backfill(
        &self,
        source: &SyncId,
        items: Vec<(ItemKey, ModelItem)>,
    ) -> StoreResult<()> {
        if !self.accept_source(source) {
            return Ok(());
        }
        let _apply = self.apply.lock();
        for (key, item) in &items {
            self.apply_set(source, key, item)?;
        }
        Ok(())
    }

    fn apply_set(&self, source: &SyncId, key: &ItemKey, item: &ModelItem) -> StoreResult<()> {
        let converted = self.rules.convert_item(source, item)?;
        self.model
            .upsert(ItemKey::sourced(source.clone(), key.clone()), converted)?;
        self.rules.after_source_set(&self.model, source, item)
    }
}

impl SourceObserver for ModelProxy {
    fn sync_id(&self) -> &SyncId {
        self.model.sync_id()
    }

    fn on_source_change(&self, source: &SyncId, change: &SourceChange<'_>) -> StoreResult<()> {
        if !self.accept_source(source) {
            trace!("{} ignores changes from {}", self.model.sync_id(), source);
            return Ok(());
        }

        let _apply = self.apply.lock();
        match *change {
            SourceChange::Set { key, item } => self.apply_set(source, key, item),
            SourceChange::Deleted { key } => {
                self.model
                    .delete(&ItemKey::sourced(source.clone(), key.clone()))?;
                Ok(())
            }
            SourceChange::Cleared => {
                self.model
                    .clear_matching(|key, _| key.source() == Some(source))?;
                Ok(())
            }
        }
    }
}
