//! Error types for the model store.

use chatmirror_model::{FieldError, ItemKind};
use chatmirror_types::{ItemKey, SyncId};
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
///
/// Deleting an absent key is never an error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An item of another kind was written to a homogeneous collection.
    #[error("{sync_id} holds {expected} items, got {found}")]
    KindMismatch {
        sync_id: SyncId,
        expected: ItemKind,
        found: ItemKind,
    },

    /// A field read or write was rejected.
    #[error("field error: {0}")]
    Field(#[from] FieldError),

    /// No item with this key.
    #[error("{key} not found in {sync_id}")]
    NotFound { sync_id: SyncId, key: ItemKey },

    /// The handle's item was deleted or its collection dropped.
    #[error("item {key} is no longer attached to a collection")]
    Detached { key: ItemKey },

    /// A proxy was asked to convert a kind it does not aggregate.
    #[error("proxy {proxy} cannot convert {kind} items")]
    UnsupportedItem { proxy: SyncId, kind: ItemKind },

    /// Registering this route would make a proxy observe itself.
    #[error("subscribing {proxy} to {route} would create a cycle")]
    CyclicSubscription { proxy: SyncId, route: String },

    /// A proxy failed while applying a source change. The source change
    /// itself was committed and notified.
    #[error("proxy {proxy} failed to apply a source change: {source}")]
    Fanout {
        proxy: SyncId,
        #[source]
        source: Box<StoreError>,
    },

    /// A proxy with this stream id is already installed.
    #[error("proxy {proxy} is already installed")]
    ProxyExists { proxy: SyncId },

    /// The process-wide store was already installed.
    #[error("a global model store is already installed")]
    AlreadyInstalled,

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),
}
