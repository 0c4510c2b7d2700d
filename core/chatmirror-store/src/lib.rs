//! Sorted, observable collections for chatmirror.
//!
//! Each stream (accounts, an account's rooms, a room's members, a room's
//! timeline, ...) is mirrored by one [`Model`]: a keyed collection kept
//! sorted by its items' own order. Every mutation emits index-precise
//! [`ModelEvent`](chatmirror_types::ModelEvent)s to an [`EventSink`],
//! which a presentation layer replays to keep its views in step.
//!
//! Proxies ([`ModelProxy`]) are collections derived from other
//! collections. Their subscriptions live in a [`ProxyRegistry`]; a change
//! committed to a source is delivered to its proxies synchronously.
//!
//! ```
//! use chatmirror_model::Account;
//! use chatmirror_store::{MemorySink, ModelStore, StoreConfig};
//! use chatmirror_types::SyncId;
//! use std::sync::Arc;
//!
//! let sink = Arc::new(MemorySink::new());
//! let store = ModelStore::new(StoreConfig::default(), sink.clone());
//! let accounts = store.model(&SyncId::named("accounts"));
//!
//! accounts.upsert_item(Account::new("@alice:example.org")).unwrap();
//! assert_eq!(accounts.len(), 1);
//! assert_eq!(sink.len(), 1);
//! ```

pub mod aggregators;
mod config;
mod error;
mod handle;
mod model;
mod proxy;
mod registry;
mod sink;
mod store;

pub use aggregators::{AccountRooms, AllRooms};
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use handle::ItemHandle;
pub use model::{Model, SourceChange};
pub use proxy::{IdentityRules, ModelProxy, ProxyRules};
pub use registry::{ProxyRegistry, Route, SourceObserver};
pub use sink::{BroadcastSink, EventSink, MemorySink, NullSink};
pub use store::ModelStore;
