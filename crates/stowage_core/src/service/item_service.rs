//! Item catalog use-case service.
//!
//! # Invariants
//! - `(owner, name)` is unique across an owner's items.
//! - Items are only visible to mutations by their owner; foreign items are
//!   reported as `NotFound`.
//! - Deletion goes through [`IntegrityGuard::ensure_item_deletable`].

use crate::model::item::{Item, ItemDetailsUpdate, ItemId};
use crate::repo::item_repo::{ItemRepository, SqliteItemRepository};
use crate::service::integrity::IntegrityGuard;
use crate::service::user_service::ensure_user_exists;
use crate::service::{
    normalize_optional, normalize_required, run_write, EntityKind, ServiceError, ServiceResult,
};
use rusqlite::Connection;

/// Item catalog service facade.
pub struct ItemService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ItemService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Creates one item for `owner`.
    pub fn create_item(
        &self,
        owner: &str,
        name: &str,
        description: Option<&str>,
        category: Option<&str>,
    ) -> ServiceResult<Item> {
        let owner = owner.trim();
        let mut item = Item::new(owner, normalize_required(name, "item name")?);
        item.description = normalize_optional(description);
        item.category = normalize_optional(category);

        run_write(self.conn, "item", "item_create", |conn| {
            ensure_user_exists(conn, owner)?;
            let repo = SqliteItemRepository::new(conn);
            if repo.find_by_name(owner, &item.name)?.is_some() {
                return Err(ServiceError::DuplicateName {
                    kind: EntityKind::Item,
                    owner: owner.to_string(),
                    name: item.name.clone(),
                });
            }
            repo.insert_item(&item)?;
            Ok(item)
        })
    }

    /// Applies a partial detail update.
    ///
    /// An empty update succeeds without writing.
    pub fn update_item_details(
        &self,
        owner: &str,
        item: ItemId,
        update: &ItemDetailsUpdate,
    ) -> ServiceResult<()> {
        let owner = owner.trim();
        let new_name = update
            .name
            .as_deref()
            .map(|value| normalize_required(value, "item name"))
            .transpose()?;

        run_write(self.conn, "item", "item_update", |conn| {
            let repo = SqliteItemRepository::new(conn);
            let mut current = load_owned(&repo, owner, item)?;
            if update.is_empty() {
                return Ok(());
            }

            if let Some(name) = new_name {
                if name != current.name {
                    if let Some(other) = repo.find_by_name(owner, &name)? {
                        if other != item {
                            return Err(ServiceError::DuplicateName {
                                kind: EntityKind::Item,
                                owner: owner.to_string(),
                                name,
                            });
                        }
                    }
                    current.name = name;
                }
            }
            if update.description.is_some() {
                current.description = normalize_optional(update.description.as_deref());
            }
            if update.category.is_some() {
                current.category = normalize_optional(update.category.as_deref());
            }

            repo.update_item(&current)?;
            Ok(())
        })
    }

    /// Deletes one item that is neither placed nor bundled.
    pub fn delete_item(&self, owner: &str, item: ItemId) -> ServiceResult<()> {
        let owner = owner.trim();
        run_write(self.conn, "item", "item_delete", |conn| {
            let repo = SqliteItemRepository::new(conn);
            load_owned(&repo, owner, item)?;
            IntegrityGuard::new(conn).ensure_item_deletable(item)?;
            repo.delete_item(item)?;
            Ok(())
        })
    }

    pub fn get_item(&self, item: ItemId) -> ServiceResult<Option<Item>> {
        Ok(SqliteItemRepository::new(self.conn).get_item(item)?)
    }

    pub fn get_items(&self) -> ServiceResult<Vec<Item>> {
        Ok(SqliteItemRepository::new(self.conn).list_items()?)
    }

    pub fn get_items_by_user(&self, owner: &str) -> ServiceResult<Vec<Item>> {
        Ok(SqliteItemRepository::new(self.conn).list_items_by_owner(owner.trim())?)
    }

    pub fn get_items_string(&self) -> ServiceResult<Vec<String>> {
        Ok(self.get_items()?.into_iter().map(|item| item.name).collect())
    }

    pub fn get_item_owner(&self, item: ItemId) -> ServiceResult<Option<String>> {
        Ok(self.get_item(item)?.map(|found| found.owner))
    }

    pub fn get_item_name(&self, item: ItemId) -> ServiceResult<Option<String>> {
        Ok(self.get_item(item)?.map(|found| found.name))
    }

    pub fn get_item_description(&self, item: ItemId) -> ServiceResult<Option<String>> {
        Ok(self.get_item(item)?.and_then(|found| found.description))
    }

    pub fn get_item_category(&self, item: ItemId) -> ServiceResult<Option<String>> {
        Ok(self.get_item(item)?.and_then(|found| found.category))
    }
}

/// Loads an item owned by `owner`; anything else is `NotFound`.
pub(crate) fn load_owned(
    repo: &impl ItemRepository,
    owner: &str,
    item: ItemId,
) -> ServiceResult<Item> {
    repo.get_item(item)?
        .filter(|found| found.owner == owner)
        .ok_or_else(|| ServiceError::not_found(EntityKind::Item, item))
}
