//! Routing of source changes to the proxies subscribed to them.
//!
//! The registry maps stream identifiers to proxies. It only routes; each
//! proxy filters further with its own `accept_source`. Registration is
//! append-only and guarded by the registry's own lock, distinct from every
//! collection lock.

use crate::error::{StoreError, StoreResult};
use crate::model::SourceChange;
use chatmirror_types::SyncId;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Which source streams a subscription covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    /// Exactly this stream.
    Exact(SyncId),
    /// Every stream of this kind, e.g. every `(user, "rooms")`.
    Kind(String),
}

impl Route {
    pub fn exact(sync_id: impl Into<SyncId>) -> Self {
        Self::Exact(sync_id.into())
    }

    pub fn kind(kind: impl Into<String>) -> Self {
        Self::Kind(kind.into())
    }

    /// Whether changes of `sync_id` are delivered through this route.
    pub fn matches(&self, sync_id: &SyncId) -> bool {
        match self {
            Self::Exact(id) => id == sync_id,
            Self::Kind(kind) => sync_id.kind() == kind,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(id) => write!(f, "{id}"),
            Self::Kind(kind) => write!(f, "*/{kind}"),
        }
    }
}

/// Something that reacts to changes of the collections it subscribes to.
pub trait SourceObserver: Send + Sync {
    /// The stream of the observer's own collection.
    fn sync_id(&self) -> &SyncId;

    /// Called synchronously, in the source's emission order, after the
    /// source has committed and published `change`.
    fn on_source_change(&self, source: &SyncId, change: &SourceChange<'_>) -> StoreResult<()>;
}

/// Process-wide routing table from streams to subscribed proxies.
#[derive(Default)]
pub struct ProxyRegistry {
    routes: RwLock<Vec<(Route, Arc<dyn SourceObserver>)>>,
}

impl fmt::Debug for ProxyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let routes = self.routes.read();
        f.debug_list()
            .entries(
                routes
                    .iter()
                    .map(|(route, observer)| format!("{route} -> {}", observer.sync_id())),
            )
            .finish()
    }
}

impl ProxyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `observer` to the streams covered by `route`.
    ///
    /// Fails with [`StoreError::CyclicSubscription`] when the observer's own
    /// stream, or any stream downstream of it, would be covered.
    pub fn register(&self, route: Route, observer: Arc<dyn SourceObserver>) -> StoreResult<()> {
        let mut routes = self.routes.write();
        let target = observer.sync_id().clone();

        if Self::reaches(&routes, &target, &route) {
            warn!("Rejected subscription of {} to {}: cycle", target, route);
            return Err(StoreError::CyclicSubscription {
                proxy: target,
                route: route.to_string(),
            });
        }

        debug!("Subscribed {} to {}", target, route);
        routes.push((route, observer));
        Ok(())
    }

    /// Every observer whose routes cover `sync_id`, each listed once, in
    /// registration order.
    pub fn subscribers(&self, sync_id: &SyncId) -> Vec<Arc<dyn SourceObserver>> {
        let routes = self.routes.read();
        let mut seen = HashSet::new();
        routes
            .iter()
            .filter(|(route, _)| route.matches(sync_id))
            .filter(|(_, observer)| seen.insert(Arc::as_ptr(observer).cast::<()>()))
            .map(|(_, observer)| Arc::clone(observer))
            .collect()
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.read().is_empty()
    }

    /// Whether a stream covered by `route` is `start` or downstream of it.
    fn reaches(
        routes: &[(Route, Arc<dyn SourceObserver>)],
        start: &SyncId,
        route: &Route,
    ) -> bool {
        let mut visited = HashSet::from([start.clone()]);
        let mut stack = vec![start.clone()];
        while let Some(id) = stack.pop() {
            if route.matches(&id) {
                return true;
            }
            for (existing, observer) in routes {
                if existing.matches(&id) && visited.insert(observer.sync_id().clone()) {
                    stack.push(observer.sync_id().clone());
                }
            }
        }
        false
    }
}
