//! Core type definitions for chatmirror.
//!
//! This crate defines the identifiers and messages shared by every layer of
//! the model store:
//! - [`SyncId`]: the stream identifier naming one collection
//! - [`ItemKey`]: the key of an item inside a collection
//! - [`ModelEvent`]: the change notifications sent to the presentation layer
//! - [`FieldValue`]: the wire-safe value carried by those notifications
//!
//! Nothing here locks or mutates shared state; the collections themselves
//! live in `chatmirror-store`.

mod event;
mod ids;

pub use event::ModelEvent;
pub use ids::{ItemKey, SyncId};

/// A field value as it crosses the presentation boundary.
///
/// Restricted to strings, numbers, booleans, and lists/maps of those.
pub type FieldValue = serde_json::Value;

/// An ordered map of field name to value, as produced by an item snapshot.
pub type FieldMap = serde_json::Map<String, FieldValue>;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid sync id: {0}")]
    InvalidSyncId(String),
}
