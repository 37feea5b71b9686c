//! Location tracker use-case service.
//!
//! # Responsibility
//! - Record where each item is and where it has been.
//!
//! # Invariants
//! - An item and the space it sits in share an owner.
//! - Placing an item where it already is leaves history untouched.
//! - The history append and the current-space update commit together, inside
//!   the same transaction as the read of the previous space.

use crate::model::item::ItemId;
use crate::model::location::LocationLog;
use crate::model::space::SpaceId;
use crate::repo::item_repo::{ItemRepository, SqliteItemRepository};
use crate::repo::location_repo::{LocationRepository, SqliteLocationRepository};
use crate::repo::space_repo::{SpaceRepository, SqliteSpaceRepository};
use crate::service::{run_write, EntityKind, ServiceError, ServiceResult};
use log::debug;
use rusqlite::Connection;

/// What a successful `place_item` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementOutcome {
    /// No log existed; one was created.
    Created,
    /// Previous space was pushed onto history.
    Moved,
    /// Item was already in the target space.
    Unchanged,
}

/// Location tracker service facade.
pub struct LocationService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> LocationService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Starts tracking `item` at `initial_space`.
    ///
    /// # Errors
    /// - `NotFound` when the item or space is missing, or they belong to
    ///   different owners.
    /// - `AlreadyExists` when the item already has a log.
    pub fn create_log(&self, item: ItemId, initial_space: SpaceId) -> ServiceResult<LocationLog> {
        run_write(self.conn, "location", "log_create", |conn| {
            let item_owner = item_owner(conn, item)?;
            let space_owner = space_owner(conn, initial_space)?;
            if item_owner != space_owner {
                return Err(ServiceError::not_found(EntityKind::Space, initial_space));
            }

            let logs = SqliteLocationRepository::new(conn);
            if logs.get_log(item)?.is_some() {
                return Err(ServiceError::AlreadyExists {
                    kind: EntityKind::LocationLog,
                    key: item.to_string(),
                });
            }
            logs.insert_log(item, initial_space)?;
            Ok(LocationLog::new(item, initial_space))
        })
    }

    /// Moves `item` to `new_space`, creating the log on first placement.
    ///
    /// # Errors
    /// - `NotFound` when the item or space is missing.
    /// - `Ownership` when the space belongs to someone other than the item
    ///   owner.
    pub fn place_item(&self, item: ItemId, new_space: SpaceId) -> ServiceResult<PlacementOutcome> {
        run_write(self.conn, "location", "item_place", |conn| {
            let owner = item_owner(conn, item)?;
            if space_owner(conn, new_space)? != owner {
                return Err(ServiceError::Ownership {
                    kind: EntityKind::Space,
                    key: new_space.to_string(),
                    owner,
                });
            }

            let logs = SqliteLocationRepository::new(conn);
            let outcome = match logs.get_log(item)? {
                None => {
                    logs.insert_log(item, new_space)?;
                    PlacementOutcome::Created
                }
                Some(log) if log.current_space == new_space => PlacementOutcome::Unchanged,
                Some(log) => {
                    logs.record_move(item, log.current_space, new_space)?;
                    PlacementOutcome::Moved
                }
            };
            debug!("event=item_place module=location outcome={outcome:?}");
            Ok(outcome)
        })
    }

    /// Stops tracking `item`. Succeeds when no log exists.
    pub fn delete_log(&self, item: ItemId) -> ServiceResult<()> {
        run_write(self.conn, "location", "log_delete", |conn| {
            let existed = SqliteLocationRepository::new(conn).delete_log(item)?;
            debug!("event=log_delete module=location existed={existed}");
            Ok(())
        })
    }

    pub fn get_item_log(&self, item: ItemId) -> ServiceResult<Option<LocationLog>> {
        Ok(SqliteLocationRepository::new(self.conn).get_log(item)?)
    }

    pub fn get_logs(&self) -> ServiceResult<Vec<LocationLog>> {
        Ok(SqliteLocationRepository::new(self.conn).list_logs()?)
    }
}

fn item_owner(conn: &Connection, item: ItemId) -> ServiceResult<String> {
    SqliteItemRepository::new(conn)
        .get_item(item)?
        .map(|found| found.owner)
        .ok_or_else(|| ServiceError::not_found(EntityKind::Item, item))
}

fn space_owner(conn: &Connection, space: SpaceId) -> ServiceResult<String> {
    SqliteSpaceRepository::new(conn)
        .get_space(space)?
        .map(|found| found.owner)
        .ok_or_else(|| ServiceError::not_found(EntityKind::Space, space))
}
