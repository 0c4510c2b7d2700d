//! The registry of every collection in the process.

use crate::aggregators::{AccountRooms, AllRooms, ACCOUNTS, ACCOUNT_ROOMS, ALL_ROOMS, ROOMS};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::model::Model;
use crate::proxy::{ModelProxy, ProxyRules};
use crate::registry::{ProxyRegistry, Route};
use crate::sink::{BroadcastSink, EventSink};
use chatmirror_types::{FieldMap, ItemKey, SyncId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

static GLOBAL: OnceLock<Arc<ModelStore>> = OnceLock::new();

/// Owns every collection, keyed by stream, plus the proxy registry their
/// changes are routed through.
///
/// Collections are created on first access and live as long as the store.
pub struct ModelStore {
    config: Arc<StoreConfig>,
    sink: Arc<dyn EventSink>,
    registry: Arc<ProxyRegistry>,
    models: RwLock<HashMap<SyncId, Arc<Model>>>,
    proxies: RwLock<HashMap<SyncId, Arc<ModelProxy>>>,
}

impl std::fmt::Debug for ModelStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelStore")
            .field("config", &self.config)
            .field("models", &self.models.read().len())
            .field("proxies", &self.proxies.read().len())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl ModelStore {
    pub fn new(config: StoreConfig, sink: Arc<dyn EventSink>) -> Self {
        Self {
            config: Arc::new(config),
            sink,
            registry: Arc::new(ProxyRegistry::new()),
            models: RwLock::new(HashMap::new()),
            proxies: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a store publishing to a new [`BroadcastSink`] sized by
    /// `config.event_buffer`. The sink is returned for subscribing.
    pub fn with_broadcast(config: StoreConfig) -> (Self, Arc<BroadcastSink>) {
        let sink = Arc::new(BroadcastSink::new(config.event_buffer));
        (Self::new(config, sink.clone()), sink)
    }

    /// The collection of `sync_id`, created empty if it does not exist.
    pub fn model(&self, sync_id: &SyncId) -> Arc<Model> {
        if let Some(model) = self.get(sync_id) {
            return model;
        }

        let mut models = self.models.write();
        Arc::clone(models.entry(sync_id.clone()).or_insert_with(|| {
            debug!("Created collection {}", sync_id);
            Model::with_registry(
                sync_id.clone(),
                Arc::clone(&self.sink),
                Arc::downgrade(&self.registry),
                Arc::clone(&self.config),
            )
        }))
    }

    /// The collection of `sync_id`, if it was ever accessed.
    pub fn get(&self, sync_id: &SyncId) -> Option<Arc<Model>> {
        self.models.read().get(sync_id).cloned()
    }

    /// Every stream with a collection, sorted.
    pub fn sync_ids(&self) -> Vec<SyncId> {
        let mut ids: Vec<SyncId> = self.models.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn registry(&self) -> &Arc<ProxyRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn sink(&self) -> &Arc<dyn EventSink> {
        &self.sink
    }

    /// Wire snapshot of one item, `None` if the stream or item is unknown.
    pub fn serialized_item(&self, sync_id: &SyncId, key: &ItemKey) -> StoreResult<Option<FieldMap>> {
        match self.get(sync_id) {
            Some(model) => model.serialized_item(key),
            None => Ok(None),
        }
    }

    /// Wire snapshots of every item of a stream, empty if it is unknown.
    pub fn serialized_items(&self, sync_id: &SyncId) -> StoreResult<Vec<FieldMap>> {
        match self.get(sync_id) {
            Some(model) => model.serialized_items(),
            None => Ok(Vec::new()),
        }
    }

    // ── Proxies ──────────────────────────────────────────────────

    /// Creates the proxy collection `sync_id`, subscribes it to `routes`
    /// and replays the collections those routes already cover.
    ///
    /// Every covered collection is frozen from before the subscription
    /// until its replay is done, so each change of it reaches the proxy
    /// exactly once: through the replay or through a notification. No new
    /// collection is created meanwhile.
    ///
    /// A route covering the proxy itself, or a `sync_id` that already has
    /// a proxy, is rejected before anything is subscribed. When a later
    /// route is cyclic, the routes registered before it stay and the proxy
    /// counts as installed.
    pub fn add_proxy(
        &self,
        sync_id: SyncId,
        routes: Vec<Route>,
        rules: impl ProxyRules,
    ) -> StoreResult<Arc<ModelProxy>> {
        for route in &routes {
            if route.matches(&sync_id) {
                return Err(StoreError::CyclicSubscription {
                    proxy: sync_id,
                    route: route.to_string(),
                });
            }
        }

        let mut proxies = self.proxies.write();
        if proxies.contains_key(&sync_id) {
            return Err(StoreError::ProxyExists { proxy: sync_id });
        }
        let proxy = Arc::new(ModelProxy::new(self.model(&sync_id), rules));
        proxies.insert(sync_id.clone(), Arc::clone(&proxy));

        {
            let models = self.models.read();
            let sources: Vec<_> = models
                .values()
                .filter(|model| routes.iter().any(|route| route.matches(model.sync_id())))
                .map(|model| model.freeze())
                .collect();

            for (registered, route) in routes.iter().enumerate() {
                if let Err(e) = self.registry.register(route.clone(), proxy.clone()) {
                    if registered == 0 {
                        proxies.remove(&sync_id);
                    }
                    return Err(e);
                }
            }
            for source in &sources {
                proxy.backfill(source.sync_id(), source.snapshot())?;
            }
        }

        info!("Installed proxy {} over {} routes", sync_id, routes.len());
        Ok(proxy)
    }

    /// The installed proxy of `sync_id`.
    pub fn proxy(&self, sync_id: &SyncId) -> Option<Arc<ModelProxy>> {
        self.proxies.read().get(sync_id).cloned()
    }

    /// Installs the account/room tree proxy over `accounts` and every
    /// `(user, "rooms")` stream.
    pub fn install_account_rooms(&self) -> StoreResult<Arc<ModelProxy>> {
        let accounts = self.model(&SyncId::named(ACCOUNTS));
        self.add_proxy(
            SyncId::named(ACCOUNT_ROOMS),
            vec![Route::exact(ACCOUNTS), Route::kind(ROOMS)],
            AccountRooms::new(accounts),
        )
    }

    /// Installs the proxy merging every account's rooms.
    pub fn install_all_rooms(&self) -> StoreResult<Arc<ModelProxy>> {
        self.add_proxy(SyncId::named(ALL_ROOMS), vec![Route::kind(ROOMS)], AllRooms)
    }

    // ── Process-wide instance ────────────────────────────────────

    /// Makes `store` the process-wide store. Only the first call succeeds.
    pub fn install_global(store: Arc<ModelStore>) -> StoreResult<Arc<ModelStore>> {
        GLOBAL
            .set(Arc::clone(&store))
            .map_err(|_| StoreError::AlreadyInstalled)?;
        Ok(store)
    }

    /// The process-wide store, if one was installed.
    pub fn global() -> Option<Arc<ModelStore>> {
        GLOBAL.get().cloned()
    }
}
