//! The sorted, observable collection.
//!
//! A [`Model`] keeps a keyed map of items plus the same keys in sorted
//! order. Every mutation runs under the collection's write lock for the
//! whole "mutate, compute index delta, publish" sequence, so the indices in
//! each notification are valid against the state at the instant it is
//! emitted and concurrent mutations are linearized.
//!
//! After publishing, the write lock is downgraded to a shared lock while the
//! change is fanned out to subscribed proxies: readers proceed, other
//! writers of this collection wait, so proxies see each source's changes in
//! the source's emission order.

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::handle::ItemHandle;
use crate::registry::ProxyRegistry;
use crate::sink::EventSink;
use chatmirror_model::{ItemKind, ModelItem};
use chatmirror_types::{FieldMap, FieldValue, ItemKey, ModelEvent, SyncId};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error, trace, warn};

/// A change to a source collection, as delivered to its proxies.
#[derive(Debug, Clone, Copy)]
pub enum SourceChange<'a> {
    /// `key` was inserted or replaced and now holds `item`.
    Set {
        key: &'a ItemKey,
        item: &'a ModelItem,
    },
    /// `key` was removed.
    Deleted { key: &'a ItemKey },
    /// Every item was removed.
    Cleared,
}

#[derive(Debug, Default)]
struct ModelData {
    /// Kind of every item held; `None` while empty.
    kind: Option<ItemKind>,
    entries: HashMap<ItemKey, ModelItem>,
    /// Always exactly the keys of `entries`, sorted by item order then key.
    order: Vec<ItemKey>,
}

impl ModelData {
    /// `Ok(index)` when `key` holding `item` is in `order`, otherwise the
    /// position it would be inserted at.
    fn search(&self, key: &ItemKey, item: &ModelItem) -> Result<usize, usize> {
        self.order.binary_search_by(|probe| {
            self.entries[probe]
                .order(item)
                .then_with(|| probe.cmp(key))
        })
    }

    fn index_of(&self, key: &ItemKey) -> Option<usize> {
        let item = self.entries.get(key)?;
        self.search(key, item).ok()
    }

    fn insert_sorted(&mut self, key: ItemKey, item: ModelItem) -> usize {
        let (Ok(index) | Err(index)) = self.search(&key, &item);
        self.order.insert(index, key.clone());
        self.entries.insert(key, item);
        index
    }

    /// Replaces the item under an existing key and moves it to its new
    /// position. Returns `(index_before, index_after)`.
    fn relocate(&mut self, key: &ItemKey, item: ModelItem) -> Option<(usize, usize)> {
        let before = self.index_of(key)?;
        let key = self.order.remove(before);
        self.entries.remove(&key);
        let after = self.insert_sorted(key, item);
        Some((before, after))
    }

    fn check_kind(&self, sync_id: &SyncId, item: &ModelItem) -> StoreResult<()> {
        match self.kind {
            Some(expected) if expected != item.kind() => Err(StoreError::KindMismatch {
                sync_id: sync_id.clone(),
                expected,
                found: item.kind(),
            }),
            _ => Ok(()),
        }
    }

    fn release_kind_if_empty(&mut self) {
        if self.entries.is_empty() {
            self.kind = None;
        }
    }
}

/// A shared lock on a collection: no mutation of it can start or finish
/// while this is held.
pub(crate) struct Frozen<'a> {
    sync_id: &'a SyncId,
    data: RwLockReadGuard<'a, ModelData>,
}

impl Frozen<'_> {
    pub(crate) fn sync_id(&self) -> &SyncId {
        self.sync_id
    }

    pub(crate) fn snapshot(&self) -> Vec<(ItemKey, ModelItem)> {
        self.data
            .order
            .iter()
            .map(|key| (key.clone(), self.data.entries[key].clone()))
            .collect()
    }
}

/// A keyed, sorted collection of items for one stream.
///
/// The only way to change an item held by a collection is through these
/// methods; reads hand out snapshots.
pub struct Model {
    sync_id: SyncId,
    data: RwLock<ModelData>,
    sink: Arc<dyn EventSink>,
    registry: Weak<ProxyRegistry>,
    config: Arc<StoreConfig>,
    size_warned: AtomicBool,
    this: Weak<Model>,
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("sync_id", &self.sync_id)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} items", self.sync_id, self.len())
    }
}

impl Model {
    /// Creates a collection that publishes to `sink` and has no proxies.
    pub fn new(sync_id: SyncId, sink: Arc<dyn EventSink>) -> Arc<Self> {
        Self::with_registry(sync_id, sink, Weak::new(), Arc::new(StoreConfig::default()))
    }

    pub(crate) fn with_registry(
        sync_id: SyncId,
        sink: Arc<dyn EventSink>,
        registry: Weak<ProxyRegistry>,
        config: Arc<StoreConfig>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            sync_id,
            data: RwLock::new(ModelData::default()),
            sink,
            registry,
            config,
            size_warned: AtomicBool::new(false),
            this: this.clone(),
        })
    }

    /// The stream this collection mirrors.
    pub fn sync_id(&self) -> &SyncId {
        &self.sync_id
    }

    // ── Mutations ────────────────────────────────────────────────

    /// Inserts `item` under `key`, or replaces the item already there.
    ///
    /// A new key emits one `Inserted`. A replaced item emits one
    /// `FieldChanged` per changed field, the first carrying the move; an
    /// identical replacement emits nothing.
    pub fn upsert(&self, key: ItemKey, item: ModelItem) -> StoreResult<()> {
        let mut data = self.data.write();
        data.check_kind(&self.sync_id, &item)?;

        let events = match data.entries.get(&key) {
            None => {
                let snapshot = item.fields()?;
                data.kind = Some(item.kind());
                let index = data.insert_sorted(key.clone(), item.clone());
                debug!("Inserted {} into {} at {}", key, self.sync_id, index);
                vec![ModelEvent::Inserted {
                    sync_id: self.sync_id.clone(),
                    index,
                    item: snapshot,
                }]
            }
            Some(existing) => {
                let changed = existing.changed_fields(&item)?;
                if changed.is_empty() {
                    trace!("Upsert of {} in {} changed nothing", key, self.sync_id);
                    return Ok(());
                }
                let Some((before, after)) = data.relocate(&key, item.clone()) else {
                    return Err(StoreError::NotFound {
                        sync_id: self.sync_id.clone(),
                        key,
                    });
                };
                debug!(
                    "Replaced {} in {} ({} -> {}, {} fields)",
                    key,
                    self.sync_id,
                    before,
                    after,
                    changed.len()
                );
                self.field_events(before, after, changed)
            }
        };

        self.check_size(data.entries.len());
        self.publish(events);
        self.fan_out(data, &[SourceChange::Set { key: &key, item: &item }])
    }

    /// Inserts or replaces `item` under its own id.
    pub fn upsert_item(&self, item: impl Into<ModelItem>) -> StoreResult<()> {
        let item = item.into();
        self.upsert(ItemKey::Id(item.id()), item)
    }

    /// Changes one field of the item under `key`.
    ///
    /// Returns `Ok(false)` and emits nothing when the field already holds
    /// `value`; this is the same check [`ModelItem::set_field`] performs on
    /// a detached item.
    pub fn update_field(&self, key: &ItemKey, field: &str, value: FieldValue) -> StoreResult<bool> {
        let mut data = self.data.write();
        let Some(current) = data.entries.get(key) else {
            return Err(StoreError::NotFound {
                sync_id: self.sync_id.clone(),
                key: key.clone(),
            });
        };

        let mut updated = current.clone();
        if !updated.set_field(field, value)? {
            trace!("{}.{} in {} unchanged", key, field, self.sync_id);
            return Ok(false);
        }
        let new_value = updated.field(field)?;

        let Some((before, after)) = data.relocate(key, updated.clone()) else {
            return Err(StoreError::NotFound {
                sync_id: self.sync_id.clone(),
                key: key.clone(),
            });
        };
        debug!(
            "Set {}.{} in {} ({} -> {})",
            key, field, self.sync_id, before, after
        );

        self.publish(self.field_events(before, after, vec![(field.to_string(), new_value)]));
        self.fan_out(data, &[SourceChange::Set { key, item: &updated }])?;
        Ok(true)
    }

    /// Removes the item under `key`, returning it. Absent keys are a no-op.
    pub fn delete(&self, key: &ItemKey) -> StoreResult<Option<ModelItem>> {
        let mut data = self.data.write();
        let Some(index) = data.index_of(key) else {
            return Ok(None);
        };
        data.order.remove(index);
        let removed = data.entries.remove(key);
        data.release_kind_if_empty();
        debug!("Deleted {} from {} at {}", key, self.sync_id, index);

        self.publish(vec![ModelEvent::Deleted {
            sync_id: self.sync_id.clone(),
            index,
        }]);
        self.fan_out(data, &[SourceChange::Deleted { key }])?;
        Ok(removed)
    }

    /// Removes every item, emitting a single `Cleared`.
    pub fn clear(&self) -> StoreResult<()> {
        let mut data = self.data.write();
        let count = data.entries.len();
        data.entries.clear();
        data.order.clear();
        data.kind = None;
        debug!("Cleared {} ({} items)", self.sync_id, count);

        self.publish(vec![ModelEvent::Cleared {
            sync_id: self.sync_id.clone(),
        }]);
        self.fan_out(data, &[SourceChange::Cleared])
    }

    /// Removes the items matching `predicate`, returning how many were
    /// removed.
    ///
    /// Emits one `Deleted` per removed item in ascending order of position,
    /// each index adjusted for the removals before it, and never `Cleared`.
    pub fn clear_matching<F>(&self, predicate: F) -> StoreResult<usize>
    where
        F: Fn(&ItemKey, &ModelItem) -> bool,
    {
        let mut data = self.data.write();
        let doomed: Vec<(usize, ItemKey)> = data
            .order
            .iter()
            .enumerate()
            .filter(|(_, key)| predicate(*key, &data.entries[*key]))
            .map(|(index, key)| (index, key.clone()))
            .collect();
        if doomed.is_empty() {
            return Ok(0);
        }

        let events = doomed
            .iter()
            .enumerate()
            .map(|(removed, (index, _))| ModelEvent::Deleted {
                sync_id: self.sync_id.clone(),
                index: index - removed,
            })
            .collect();

        let doomed_keys: HashSet<&ItemKey> = doomed.iter().map(|(_, key)| key).collect();
        data.order.retain(|key| !doomed_keys.contains(key));
        for key in &doomed_keys {
            data.entries.remove(*key);
        }
        data.release_kind_if_empty();
        debug!("Removed {} matching items from {}", doomed.len(), self.sync_id);

        self.publish(events);
        let changes: Vec<SourceChange<'_>> = doomed
            .iter()
            .map(|(_, key)| SourceChange::Deleted { key })
            .collect();
        self.fan_out(data, &changes)?;
        Ok(doomed.len())
    }

    // ── Reads ────────────────────────────────────────────────────

    /// A snapshot of the item under `key`.
    pub fn get(&self, key: &ItemKey) -> Option<ModelItem> {
        self.data.read_recursive().entries.get(key).cloned()
    }

    pub fn contains(&self, key: &ItemKey) -> bool {
        self.data.read_recursive().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data.read_recursive().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read_recursive().entries.is_empty()
    }

    /// The kind of the items held, if any.
    pub fn kind(&self) -> Option<ItemKind> {
        self.data.read_recursive().kind
    }

    /// Current position of `key` in the sorted order.
    pub fn index_of(&self, key: &ItemKey) -> Option<usize> {
        self.data.read_recursive().index_of(key)
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> Vec<ItemKey> {
        self.data.read_recursive().order.clone()
    }

    /// Items in sorted order.
    pub fn items(&self) -> Vec<ModelItem> {
        let data = self.data.read_recursive();
        data.order.iter().map(|key| data.entries[key].clone()).collect()
    }

    /// `(key, item)` pairs in sorted order, read under one lock.
    pub fn snapshot(&self) -> Vec<(ItemKey, ModelItem)> {
        let data = self.data.read_recursive();
        data.order
            .iter()
            .map(|key| (key.clone(), data.entries[key].clone()))
            .collect()
    }

    /// Wire snapshots of every item in sorted order, for a presentation
    /// layer's initial load.
    pub fn serialized_items(&self) -> StoreResult<Vec<FieldMap>> {
        let data = self.data.read_recursive();
        data.order
            .iter()
            .map(|key| Ok(data.entries[key].fields()?))
            .collect()
    }

    /// Wire snapshot of one item.
    pub fn serialized_item(&self, key: &ItemKey) -> StoreResult<Option<FieldMap>> {
        match self.data.read_recursive().entries.get(key) {
            Some(item) => Ok(Some(item.fields()?)),
            None => Ok(None),
        }
    }

    /// Holds this collection's shared lock until the returned guard drops.
    pub(crate) fn freeze(&self) -> Frozen<'_> {
        Frozen {
            sync_id: &self.sync_id,
            data: self.data.read_recursive(),
        }
    }

    /// A non-owning handle to the item under `key`, through which the
    /// attached item can be mutated.
    pub fn handle(&self, key: &ItemKey) -> Option<ItemHandle> {
        if !self.contains(key) {
            return None;
        }
        Some(ItemHandle::new(self.this.clone(), key.clone()))
    }

    // ── Internals ────────────────────────────────────────────────

    fn field_events(
        &self,
        before: usize,
        after: usize,
        changed: Vec<(String, FieldValue)>,
    ) -> Vec<ModelEvent> {
        changed
            .into_iter()
            .enumerate()
            .map(|(i, (field, value))| ModelEvent::FieldChanged {
                sync_id: self.sync_id.clone(),
                index_then: if i == 0 { before } else { after },
                index_now: after,
                field,
                value,
            })
            .collect()
    }

    fn publish(&self, events: Vec<ModelEvent>) {
        for event in events {
            if self.config.log_events {
                debug!("Publishing {:?}", event);
            }
            self.sink.publish(event);
        }
    }

    fn check_size(&self, len: usize) {
        if len > self.config.large_model_warning && !self.size_warned.swap(true, Ordering::Relaxed)
        {
            warn!(
                "{} holds {} items, above the configured warning threshold of {}",
                self.sync_id, len, self.config.large_model_warning
            );
        }
    }

    /// Delivers `changes` to every subscribed proxy, keeping other writers
    /// out until the last proxy returns.
    ///
    /// Every proxy sees the changes even when one fails; the first failure
    /// is returned.
    fn fan_out(
        &self,
        data: RwLockWriteGuard<'_, ModelData>,
        changes: &[SourceChange<'_>],
    ) -> StoreResult<()> {
        let Some(registry) = self.registry.upgrade() else {
            return Ok(());
        };
        let subscribers = registry.subscribers(&self.sync_id);
        if subscribers.is_empty() {
            return Ok(());
        }

        let _shared = RwLockWriteGuard::downgrade(data);
        let mut first_error = None;
        for subscriber in &subscribers {
            for change in changes {
                if let Err(e) = subscriber.on_source_change(&self.sync_id, change) {
                    error!(
                        "Proxy {} failed on change from {}: {}",
                        subscriber.sync_id(),
                        self.sync_id,
                        e
                    );
                    first_error.get_or_insert(StoreError::Fanout {
                        proxy: subscriber.sync_id().clone(),
                        source: Box::new(e),
                    });
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
