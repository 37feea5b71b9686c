//! Bundle manager use-case service.
//!
//! # Invariants
//! - `(user, name)` is unique across bundles.
//! - Members are items owned by the bundle owner, each at most once.

use crate::model::bundle::Bundle;
use crate::model::item::ItemId;
use crate::repo::bundle_repo::{BundleRepository, SqliteBundleRepository};
use crate::repo::item_repo::SqliteItemRepository;
use crate::service::item_service;
use crate::service::user_service::ensure_user_exists;
use crate::service::{normalize_required, run_write, EntityKind, ServiceError, ServiceResult};
use rusqlite::Connection;

/// Bundle manager service facade.
pub struct BundleService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> BundleService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Creates an empty bundle.
    pub fn create_bundle(&self, user: &str, name: &str) -> ServiceResult<Bundle> {
        let user = user.trim();
        let name = normalize_required(name, "bundle name")?;

        run_write(self.conn, "bundle", "bundle_create", |conn| {
            ensure_user_exists(conn, user)?;
            let repo = SqliteBundleRepository::new(conn);
            if repo.bundle_exists(user, &name)? {
                return Err(ServiceError::DuplicateName {
                    kind: EntityKind::Bundle,
                    owner: user.to_string(),
                    name,
                });
            }
            repo.insert_bundle(user, &name)?;
            Ok(Bundle::new(user, name))
        })
    }

    /// Deletes a bundle together with its membership.
    pub fn delete_bundle(&self, user: &str, name: &str) -> ServiceResult<()> {
        let user = user.trim();
        let name = name.trim();
        run_write(self.conn, "bundle", "bundle_delete", |conn| {
            let repo = SqliteBundleRepository::new(conn);
            ensure_bundle(&repo, user, name)?;
            repo.delete_bundle(user, name)?;
            Ok(())
        })
    }

    pub fn add_item_to_bundle(
        &self,
        user: &str,
        item: ItemId,
        bundle_name: &str,
    ) -> ServiceResult<()> {
        let user = user.trim();
        let bundle_name = bundle_name.trim();
        run_write(self.conn, "bundle", "bundle_add_item", |conn| {
            let repo = SqliteBundleRepository::new(conn);
            ensure_bundle(&repo, user, bundle_name)?;
            item_service::load_owned(&SqliteItemRepository::new(conn), user, item)?;
            if repo.is_member(user, bundle_name, item)? {
                return Err(ServiceError::AlreadyMember {
                    bundle: bundle_name.to_string(),
                    item,
                });
            }
            repo.add_member(user, bundle_name, item)?;
            Ok(())
        })
    }

    pub fn remove_item_from_bundle(
        &self,
        user: &str,
        item: ItemId,
        bundle_name: &str,
    ) -> ServiceResult<()> {
        let user = user.trim();
        let bundle_name = bundle_name.trim();
        run_write(self.conn, "bundle", "bundle_remove_item", |conn| {
            let repo = SqliteBundleRepository::new(conn);
            ensure_bundle(&repo, user, bundle_name)?;
            item_service::load_owned(&SqliteItemRepository::new(conn), user, item)?;
            if !repo.is_member(user, bundle_name, item)? {
                return Err(ServiceError::NotMember {
                    bundle: bundle_name.to_string(),
                    item,
                });
            }
            repo.remove_member(user, bundle_name, item)?;
            Ok(())
        })
    }

    pub fn get_bundle(&self, user: &str, name: &str) -> ServiceResult<Option<Bundle>> {
        Ok(SqliteBundleRepository::new(self.conn).get_bundle(user.trim(), name.trim())?)
    }

    pub fn get_bundles(&self) -> ServiceResult<Vec<Bundle>> {
        Ok(SqliteBundleRepository::new(self.conn).list_bundles()?)
    }

    pub fn get_bundles_by_user(&self, user: &str) -> ServiceResult<Vec<Bundle>> {
        Ok(SqliteBundleRepository::new(self.conn).list_bundles_by_owner(user.trim())?)
    }
}

fn ensure_bundle(repo: &impl BundleRepository, user: &str, name: &str) -> ServiceResult<()> {
    if repo.bundle_exists(user, name)? {
        Ok(())
    } else {
        Err(ServiceError::not_found(
            EntityKind::Bundle,
            format!("{user}/{name}"),
        ))
    }
}
