//! Cross-component delete guard.
//!
//! Physical deletes of spaces and items must pass through this guard inside
//! the same write transaction as the delete itself.

use crate::model::item::ItemId;
use crate::model::space::SpaceId;
use crate::repo::bundle_repo::{BundleRepository, SqliteBundleRepository};
use crate::repo::location_repo::{LocationRepository, SqliteLocationRepository};
use crate::repo::space_repo::{SpaceRepository, SqliteSpaceRepository};
use crate::service::{EntityKind, ServiceError, ServiceResult};
use rusqlite::Connection;

/// Checks that no dependent record still points at an aggregate.
pub struct IntegrityGuard<'conn> {
    conn: &'conn Connection,
}

impl<'conn> IntegrityGuard<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// A space may go once it has no children and holds no item.
    ///
    /// Appearing in some item's history does not block deletion.
    pub fn ensure_space_deletable(&self, space: SpaceId) -> ServiceResult<()> {
        if SqliteSpaceRepository::new(self.conn).count_children(space)? > 0 {
            return Err(ServiceError::HasChildren(space));
        }
        if SqliteLocationRepository::new(self.conn).count_at_space(space)? > 0 {
            return Err(ServiceError::InUse {
                kind: EntityKind::Space,
                key: space.to_string(),
                dependent: "location log",
            });
        }
        Ok(())
    }

    /// An item may go once it has no location log and no bundle membership.
    pub fn ensure_item_deletable(&self, item: ItemId) -> ServiceResult<()> {
        if SqliteLocationRepository::new(self.conn)
            .get_log(item)?
            .is_some()
        {
            return Err(ServiceError::InUse {
                kind: EntityKind::Item,
                key: item.to_string(),
                dependent: "location log",
            });
        }
        if SqliteBundleRepository::new(self.conn).count_memberships(item)? > 0 {
            return Err(ServiceError::InUse {
                kind: EntityKind::Item,
                key: item.to_string(),
                dependent: "bundle",
            });
        }
        Ok(())
    }
}
