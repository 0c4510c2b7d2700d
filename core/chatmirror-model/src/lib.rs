//! Item records for the chatmirror model store.
//!
//! Defines the records mirrored from the chat backend and the ordering each
//! collection keeps them in:
//! - [`Account`], [`Room`], [`Member`], [`Event`], [`Upload`], [`Device`]:
//!   the per-kind records
//! - [`AccountOrRoom`]: the flattened account/room tree row built by
//!   aggregating proxies
//! - [`ModelItem`]: the sum type a collection stores, with its total order
//!   and the field read/write surface
//!
//! Fields cross the presentation boundary as [`chatmirror_types::FieldValue`]s,
//! produced through each record's serde representation.

mod account;
mod account_or_room;
mod device;
mod error;
mod event;
mod item;
mod member;
mod order;
mod room;
mod upload;

pub use account::Account;
pub use account_or_room::AccountOrRoom;
pub use device::Device;
pub use error::FieldError;
pub use event::{Event, TypeSpecifier};
pub use item::{Item, ItemKind, ModelItem};
pub use member::Member;
pub use room::Room;
pub use upload::{Upload, UploadStatus};
