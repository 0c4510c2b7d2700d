//! Concrete proxies aggregating several streams into one view.

use crate::error::{StoreError, StoreResult};
use crate::model::Model;
use crate::proxy::ProxyRules;
use chatmirror_model::{AccountOrRoom, ModelItem};
use chatmirror_types::{FieldValue, ItemKey, SyncId};
use std::sync::Arc;
use tracing::debug;

/// Stream id of the merged account/room tree.
pub const ACCOUNT_ROOMS: &str = "account_rooms";
/// Stream id of every account's rooms merged into one list.
pub const ALL_ROOMS: &str = "all_rooms";
/// Stream id of the logged in accounts.
pub const ACCOUNTS: &str = "accounts";
/// Kind of the per-account room streams.
pub const ROOMS: &str = "rooms";

fn is_rooms_source(source: &SyncId) -> bool {
    matches!(source, SyncId::Account(_, kind) if kind == ROOMS)
}

/// Flattens the accounts and every account's rooms into one sorted tree of
/// [`AccountOrRoom`] rows.
pub struct AccountRooms {
    accounts: Arc<Model>,
}

impl AccountRooms {
    /// `accounts` is read to place each room under its account.
    pub fn new(accounts: Arc<Model>) -> Self {
        Self { accounts }
    }

    fn sync_id() -> SyncId {
        SyncId::named(ACCOUNT_ROOMS)
    }
}

impl ProxyRules for AccountRooms {
    fn accept_source(&self, source: &SyncId) -> bool {
        *source == SyncId::named(ACCOUNTS) || is_rooms_source(source)
    }

    fn convert_item(&self, _source: &SyncId, item: &ModelItem) -> StoreResult<ModelItem> {
        match item {
            ModelItem::Account(account) => Ok(AccountOrRoom::from_account(account).into()),
            ModelItem::Room(room) => {
                let account = match self.accounts.get(&ItemKey::id(room.for_account.as_str())) {
                    Some(ModelItem::Account(account)) => Some(account),
                    _ => None,
                };
                Ok(AccountOrRoom::from_room(room, account.as_ref()).into())
            }
            other => Err(StoreError::UnsupportedItem {
                proxy: Self::sync_id(),
                kind: other.kind(),
            }),
        }
    }

    /// Re-sorts an account's room rows when the account's sort key changed.
    fn after_source_set(&self, proxy: &Model, _source: &SyncId, item: &ModelItem) -> StoreResult<()> {
        let ModelItem::Account(account) = item else {
            return Ok(());
        };
        let order = account.sort_name();

        let stale: Vec<ItemKey> = proxy
            .snapshot()
            .into_iter()
            .filter(|(_, row)| match row {
                ModelItem::AccountOrRoom(row) => {
                    !row.is_account()
                        && row.account_id == account.id
                        && row.account_order != order
                }
                _ => false,
            })
            .map(|(key, _)| key)
            .collect();

        if !stale.is_empty() {
            debug!("Re-sorting {} rooms of {}", stale.len(), account.id);
        }
        for key in stale {
            proxy.update_field(&key, "account_order", FieldValue::String(order.clone()))?;
        }
        Ok(())
    }
}

/// Merges the rooms of every account into one room list.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllRooms;

impl ProxyRules for AllRooms {
    fn accept_source(&self, source: &SyncId) -> bool {
        is_rooms_source(source)
    }

    fn convert_item(&self, _source: &SyncId, item: &ModelItem) -> StoreResult<ModelItem> {
        match item {
            ModelItem::Room(_) => Ok(item.clone()),
            other => Err(StoreError::UnsupportedItem {
                proxy: SyncId::named(ALL_ROOMS),
                kind: other.kind(),
            }),
        }
    }
}
