//! The item sum type held by collections.

use crate::{Account, AccountOrRoom, Device, Event, FieldError, Member, Room, Upload};
use chatmirror_types::{FieldMap, FieldValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// The kinds of record a collection can hold.
///
/// A collection is homogeneous: all its items share one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemKind {
    Account,
    Room,
    Member,
    Event,
    Upload,
    Device,
    AccountOrRoom,
}

impl ItemKind {
    /// The kind's name as seen by the presentation layer.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Account => "Account",
            Self::Room => "Room",
            Self::Member => "Member",
            Self::Event => "Event",
            Self::Upload => "Upload",
            Self::Device => "Device",
            Self::AccountOrRoom => "AccountOrRoom",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A record kind that can live in a collection.
///
/// `order` must be a pure function of the record's fields. Implementations
/// return `Equal` only for records that are interchangeable for display;
/// [`ModelItem::order`] breaks remaining ties by id.
pub trait Item: fmt::Debug + Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: ItemKind;

    /// The record's identity within its collection.
    fn id(&self) -> String;

    /// The domain order of two records of this kind.
    fn order(&self, other: &Self) -> Ordering;
}

/// Any record a collection can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelItem {
    Account(Account),
    Room(Room),
    Member(Member),
    Event(Event),
    Upload(Upload),
    Device(Device),
    AccountOrRoom(AccountOrRoom),
}

macro_rules! with_item {
    ($value:expr, $item:ident => $body:expr) => {
        match $value {
            ModelItem::Account($item) => $body,
            ModelItem::Room($item) => $body,
            ModelItem::Member($item) => $body,
            ModelItem::Event($item) => $body,
            ModelItem::Upload($item) => $body,
            ModelItem::Device($item) => $body,
            ModelItem::AccountOrRoom($item) => $body,
        }
    };
}

impl ModelItem {
    /// The kind of the wrapped record.
    #[must_use]
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Account(_) => ItemKind::Account,
            Self::Room(_) => ItemKind::Room,
            Self::Member(_) => ItemKind::Member,
            Self::Event(_) => ItemKind::Event,
            Self::Upload(_) => ItemKind::Upload,
            Self::Device(_) => ItemKind::Device,
            Self::AccountOrRoom(_) => ItemKind::AccountOrRoom,
        }
    }

    /// The record's identity.
    #[must_use]
    pub fn id(&self) -> String {
        with_item!(self, item => item.id())
    }

    /// Strict order between two items: records of the same kind by their
    /// domain order then by id, records of different kinds by kind.
    #[must_use]
    pub fn order(&self, other: &Self) -> Ordering {
        let domain = match (self, other) {
            (Self::Account(a), Self::Account(b)) => a.order(b),
            (Self::Room(a), Self::Room(b)) => a.order(b),
            (Self::Member(a), Self::Member(b)) => a.order(b),
            (Self::Event(a), Self::Event(b)) => a.order(b),
            (Self::Upload(a), Self::Upload(b)) => a.order(b),
            (Self::Device(a), Self::Device(b)) => a.order(b),
            (Self::AccountOrRoom(a), Self::AccountOrRoom(b)) => a.order(b),
            _ => return self.kind().cmp(&other.kind()),
        };
        domain.then_with(|| self.id().cmp(&other.id()))
    }

    /// All fields in declaration order, converted to wire values.
    pub fn fields(&self) -> Result<FieldMap, FieldError> {
        with_item!(self, item => fields_of(item))
    }

    /// Reads one field.
    pub fn field(&self, name: &str) -> Result<FieldValue, FieldError> {
        let mut fields = self.fields()?;
        fields
            .remove(name)
            .ok_or_else(|| FieldError::UnknownField {
                kind: self.kind(),
                field: name.to_string(),
            })
    }

    /// Writes one field of a detached item.
    ///
    /// Returns `Ok(false)` without touching the item when the field already
    /// holds `value` (compared by wire representation). On error the item is
    /// left unchanged.
    pub fn set_field(&mut self, name: &str, value: FieldValue) -> Result<bool, FieldError> {
        with_item!(self, item => set_field_of(item, name, value))
    }

    /// The names of changed fields between `self` and `new`, in `new`'s field
    /// order, with `new`'s values.
    pub fn changed_fields(&self, new: &Self) -> Result<Vec<(String, FieldValue)>, FieldError> {
        let old = self.fields()?;
        Ok(new
            .fields()?
            .into_iter()
            .filter(|(name, value)| old.get(name) != Some(value))
            .collect())
    }
}

fn fields_of<T: Item>(item: &T) -> Result<FieldMap, FieldError> {
    match serde_json::to_value(item)? {
        FieldValue::Object(map) => Ok(map),
        other => Err(FieldError::InvalidValue {
            kind: T::KIND,
            field: String::new(),
            reason: format!("record serialized to {other} instead of an object"),
        }),
    }
}

fn set_field_of<T: Item>(item: &mut T, name: &str, value: FieldValue) -> Result<bool, FieldError> {
    if name == "id" {
        return Err(FieldError::ImmutableField {
            kind: T::KIND,
            field: name.to_string(),
        });
    }

    let mut fields = fields_of(item)?;
    let Some(slot) = fields.get_mut(name) else {
        return Err(FieldError::UnknownField {
            kind: T::KIND,
            field: name.to_string(),
        });
    };
    if *slot == value {
        return Ok(false);
    }
    let before = std::mem::replace(slot, value);

    let updated: T =
        serde_json::from_value(FieldValue::Object(fields)).map_err(|e| FieldError::InvalidValue {
            kind: T::KIND,
            field: name.to_string(),
            reason: e.to_string(),
        })?;

    // The value may only differ in spelling (e.g. a timezone offset).
    if fields_of(&updated)?.get(name) == Some(&before) {
        return Ok(false);
    }

    *item = updated;
    Ok(true)
}

macro_rules! impl_from_item {
    ($($kind:ident),*) => {
        $(
            impl From<$kind> for ModelItem {
                fn from(item: $kind) -> Self {
                    Self::$kind(item)
                }
            }
        )*
    };
}

impl_from_item!(Account, Room, Member, Event, Upload, Device, AccountOrRoom);
