//! Identifier types naming collections and the items inside them.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies one synchronized collection (a "stream").
///
/// Serialized untagged: a named stream crosses the boundary as a plain
/// string, scoped streams as a JSON array of their parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SyncId {
    /// A process-wide stream, e.g. `"accounts"`.
    Named(String),
    /// A stream owned by one account, e.g. `(user_id, "rooms")`.
    Account(String, String),
    /// A stream owned by one room of one account, e.g.
    /// `(user_id, room_id, "events")`.
    Room(String, String, String),
}

impl SyncId {
    /// Creates a process-wide stream id.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Creates an account-scoped stream id.
    #[must_use]
    pub fn account(user_id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::Account(user_id.into(), kind.into())
    }

    /// Creates a room-scoped stream id.
    #[must_use]
    pub fn room(
        user_id: impl Into<String>,
        room_id: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self::Room(user_id.into(), room_id.into(), kind.into())
    }

    /// The trailing kind of the stream. For a named stream this is the name.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Account(_, kind) | Self::Room(_, _, kind) => kind,
        }
    }

    /// The account owning this stream, if it is scoped.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Named(_) => None,
            Self::Account(user_id, _) | Self::Room(user_id, _, _) => Some(user_id),
        }
    }

    /// The room owning this stream, if it is room-scoped.
    #[must_use]
    pub fn room_id(&self) -> Option<&str> {
        match self {
            Self::Room(_, room_id, _) => Some(room_id),
            _ => None,
        }
    }
}

impl From<&str> for SyncId {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

/// Parts are joined with `/`. A `/` or `%` inside a part is written as
/// `%2F` or `%25`, so [`FromStr`] always parses the display form back.
impl fmt::Display for SyncId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{}", escape(name)),
            Self::Account(user_id, kind) => write!(f, "{}/{}", escape(user_id), escape(kind)),
            Self::Room(user_id, room_id, kind) => write!(
                f,
                "{}/{}/{}",
                escape(user_id),
                escape(room_id),
                escape(kind)
            ),
        }
    }
}

impl FromStr for SyncId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidSyncId(s.to_string());
        let parts = s
            .split('/')
            .map(|part| match part {
                "" => None,
                part => unescape(part),
            })
            .collect::<Option<Vec<String>>>()
            .ok_or_else(invalid)?;
        if parts.len() > 3 {
            return Err(invalid());
        }
        let mut parts = parts.into_iter();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(name), None, None) => Ok(Self::Named(name)),
            (Some(user_id), Some(kind), None) => Ok(Self::Account(user_id, kind)),
            (Some(user_id), Some(room_id), Some(kind)) => Ok(Self::Room(user_id, room_id, kind)),
            _ => Err(invalid()),
        }
    }
}

fn escape(part: &str) -> String {
    part.replace('%', "%25").replace('/', "%2F")
}

/// Reverses [`escape`]. `None` on any other `%` sequence.
fn unescape(part: &str) -> Option<String> {
    let mut out = String::with_capacity(part.len());
    let mut chars = part.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match (chars.next(), chars.next()) {
            (Some('2'), Some('5')) => out.push('%'),
            (Some('2'), Some('F' | 'f')) => out.push('/'),
            _ => return None,
        }
    }
    Some(out)
}

/// The key of an item inside a collection.
///
/// Source collections key items by their id. Proxy collections key each
/// item by the stream it came from plus its key there, so items merged
/// from several sources never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemKey {
    Id(String),
    Sourced(SyncId, Box<ItemKey>),
}

impl ItemKey {
    /// Creates a plain id key.
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Creates a key for an item contributed by `source`.
    #[must_use]
    pub fn sourced(source: SyncId, key: ItemKey) -> Self {
        Self::Sourced(source, Box::new(key))
    }

    /// The stream this key was contributed by, if it is a proxy key.
    #[must_use]
    pub fn source(&self) -> Option<&SyncId> {
        match self {
            Self::Id(_) => None,
            Self::Sourced(source, _) => Some(source),
        }
    }

    /// The innermost plain id.
    #[must_use]
    pub fn leaf_id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Sourced(_, key) => key.leaf_id(),
        }
    }
}

impl From<&str> for ItemKey {
    fn from(id: &str) -> Self {
        Self::id(id)
    }
}

impl From<String> for ItemKey {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Sourced(source, key) => write!(f, "[{source}]{key}"),
        }
    }
}
