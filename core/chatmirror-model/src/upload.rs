use crate::{Item, ItemKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;
use uuid::Uuid;

/// State of an upload operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadStatus {
    #[default]
    Uploading,
    Caching,
    Error,
}

/// A running or failed file upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Upload {
    pub id: Uuid,
    pub filepath: PathBuf,

    pub total_size: u64,
    pub uploaded: u64,
    /// Bytes per second.
    #[serde(with = "finite_or_zero")]
    pub speed: f64,
    /// Estimated seconds left.
    #[serde(with = "finite_or_zero")]
    pub time_left: f64,
    pub paused: bool,

    pub status: UploadStatus,
    pub error: Option<String>,

    pub start_date: DateTime<Utc>,
}

impl Upload {
    /// Creates an upload of `filepath` starting now.
    pub fn new(filepath: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            filepath: filepath.into(),
            start_date: Utc::now(),
            ..Default::default()
        }
    }
}

impl Item for Upload {
    const KIND: ItemKind = ItemKind::Upload;

    fn id(&self) -> String {
        self.id.to_string()
    }

    /// Newest upload first.
    fn order(&self, other: &Self) -> Ordering {
        other.start_date.cmp(&self.start_date)
    }
}

/// Rates computed over zero elapsed time come out infinite or NaN, which
/// JSON cannot carry. They are written as `0` and `null` reads back as `0`.
mod finite_or_zero {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(if value.is_finite() { *value } else { 0.0 })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
    }
}
