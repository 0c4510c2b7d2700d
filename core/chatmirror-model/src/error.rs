//! Error types for item field access.

use crate::ItemKind;
use thiserror::Error;

/// Errors raised while reading or writing an item field.
///
/// A failed write leaves the item untouched.
#[derive(Debug, Error)]
pub enum FieldError {
    /// The item kind has no field with this name.
    #[error("{kind} has no field `{field}`")]
    UnknownField { kind: ItemKind, field: String },

    /// The field identifies the item and cannot change once created.
    #[error("field `{field}` of {kind} is immutable")]
    ImmutableField { kind: ItemKind, field: String },

    /// The value does not fit the field's type.
    #[error("invalid value for {kind}.{field}: {reason}")]
    InvalidValue {
        kind: ItemKind,
        field: String,
        reason: String,
    },

    /// The record could not be converted to its wire representation.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
