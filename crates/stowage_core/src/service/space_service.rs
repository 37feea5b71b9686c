//! Space tree use-case service.
//!
//! # Responsibility
//! - Validate tree hierarchy invariants above repository layer.
//! - Provide space create, move, rename, delete and lookup operations.
//!
//! # Invariants
//! - A parent always belongs to the same owner as its child.
//! - Move operations must not create parent-child cycles.
//! - `(owner, name)` is unique across an owner's spaces.

use crate::model::space::{Space, SpaceId};
use crate::repo::space_repo::{SpaceRepository, SqliteSpaceRepository};
use crate::service::integrity::IntegrityGuard;
use crate::service::user_service::ensure_user_exists;
use crate::service::{normalize_required, run_write, EntityKind, ServiceError, ServiceResult};
use rusqlite::Connection;

/// Space tree service facade.
pub struct SpaceService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SpaceService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Creates one space under an optional parent and returns its id.
    ///
    /// # Errors
    /// - `NotFound` when `owner` is unknown or `parent` is not one of the
    ///   owner's spaces.
    /// - `DuplicateName` when the owner already has a space named `name`.
    pub fn create_space(
        &self,
        owner: &str,
        name: &str,
        space_type: &str,
        parent: Option<SpaceId>,
    ) -> ServiceResult<SpaceId> {
        let owner = owner.trim();
        let name = normalize_required(name, "space name")?;
        let space_type = normalize_required(space_type, "space type")?;

        run_write(self.conn, "space", "space_create", |conn| {
            ensure_user_exists(conn, owner)?;
            let repo = SqliteSpaceRepository::new(conn);
            if repo.find_by_name(owner, &name)?.is_some() {
                return Err(ServiceError::DuplicateName {
                    kind: EntityKind::Space,
                    owner: owner.to_string(),
                    name,
                });
            }
            if let Some(parent) = parent {
                match repo.get_space(parent)? {
                    Some(found) if found.owner == owner => {}
                    _ => return Err(ServiceError::not_found(EntityKind::Space, parent)),
                }
            }

            let space = Space::new(owner, name, space_type, parent);
            repo.insert_space(&space)?;
            Ok(space.id)
        })
    }

    /// Re-parents one space. `None` makes it a root.
    ///
    /// Moving to the current parent is a no-op.
    pub fn move_space(
        &self,
        owner: &str,
        space: SpaceId,
        new_parent: Option<SpaceId>,
    ) -> ServiceResult<()> {
        let owner = owner.trim();
        run_write(self.conn, "space", "space_move", |conn| {
            let repo = SqliteSpaceRepository::new(conn);
            let node = load_owned(&repo, owner, space)?;

            if let Some(parent) = new_parent {
                if parent == space {
                    return Err(ServiceError::Cycle {
                        space,
                        new_parent: parent,
                    });
                }
                load_owned(&repo, owner, parent)?;
                if node.parent == Some(parent) {
                    return Ok(());
                }
                let bound = repo.count_for_owner(owner)?;
                if would_create_cycle(&repo, space, parent, bound)? {
                    return Err(ServiceError::Cycle {
                        space,
                        new_parent: parent,
                    });
                }
            } else if node.is_root() {
                return Ok(());
            }

            repo.set_parent(space, new_parent)?;
            Ok(())
        })
    }

    /// Renames one space.
    pub fn rename_space(&self, owner: &str, space: SpaceId, new_name: &str) -> ServiceResult<()> {
        let owner = owner.trim();
        let new_name = normalize_required(new_name, "space name")?;

        run_write(self.conn, "space", "space_rename", |conn| {
            let repo = SqliteSpaceRepository::new(conn);
            let node = load_owned(&repo, owner, space)?;
            if node.name == new_name {
                return Ok(());
            }
            if let Some(other) = repo.find_by_name(owner, &new_name)? {
                if other != space {
                    return Err(ServiceError::DuplicateName {
                        kind: EntityKind::Space,
                        owner: owner.to_string(),
                        name: new_name,
                    });
                }
            }
            repo.set_name(space, &new_name)?;
            Ok(())
        })
    }

    /// Deletes one childless space that currently holds no item.
    pub fn delete_space(&self, owner: &str, space: SpaceId) -> ServiceResult<()> {
        let owner = owner.trim();
        run_write(self.conn, "space", "space_delete", |conn| {
            let repo = SqliteSpaceRepository::new(conn);
            load_owned(&repo, owner, space)?;
            IntegrityGuard::new(conn).ensure_space_deletable(space)?;
            repo.delete_space(space)?;
            Ok(())
        })
    }

    pub fn get_space(&self, space: SpaceId) -> ServiceResult<Option<Space>> {
        Ok(self.repo().get_space(space)?)
    }

    pub fn get_spaces(&self) -> ServiceResult<Vec<Space>> {
        Ok(self.repo().list_spaces()?)
    }

    pub fn get_spaces_by_owner(&self, owner: &str) -> ServiceResult<Vec<Space>> {
        Ok(self.repo().list_spaces_by_owner(owner.trim())?)
    }

    pub fn get_space_owner(&self, space: SpaceId) -> ServiceResult<Option<String>> {
        Ok(self.get_space(space)?.map(|found| found.owner))
    }

    pub fn get_space_name(&self, space: SpaceId) -> ServiceResult<Option<String>> {
        Ok(self.get_space(space)?.map(|found| found.name))
    }

    pub fn get_space_type(&self, space: SpaceId) -> ServiceResult<Option<String>> {
        Ok(self.get_space(space)?.map(|found| found.space_type))
    }

    /// Parent id; `None` both for roots and for unknown spaces.
    pub fn get_space_parent(&self, space: SpaceId) -> ServiceResult<Option<SpaceId>> {
        Ok(self.get_space(space)?.and_then(|found| found.parent))
    }

    pub fn get_space_children(&self, space: SpaceId) -> ServiceResult<Vec<SpaceId>> {
        Ok(self
            .repo()
            .list_children(space)?
            .into_iter()
            .map(|child| child.id)
            .collect())
    }

    pub fn get_space_children_names(&self, space: SpaceId) -> ServiceResult<Vec<String>> {
        Ok(self
            .repo()
            .list_children(space)?
            .into_iter()
            .map(|child| child.name)
            .collect())
    }

    fn repo(&self) -> SqliteSpaceRepository<'conn> {
        SqliteSpaceRepository::new(self.conn)
    }
}

/// Loads a space and checks that `owner` owns it.
fn load_owned(repo: &impl SpaceRepository, owner: &str, space: SpaceId) -> ServiceResult<Space> {
    let found = repo
        .get_space(space)?
        .ok_or_else(|| ServiceError::not_found(EntityKind::Space, space))?;
    if found.owner != owner {
        return Err(ServiceError::Ownership {
            kind: EntityKind::Space,
            key: space.to_string(),
            owner: owner.to_string(),
        });
    }
    Ok(found)
}

/// Walks from `candidate_parent` toward the root looking for `space`.
///
/// The walk is capped at `bound` steps (the owner's space count); running
/// past it means the stored chain already loops and is reported as a cycle.
fn would_create_cycle(
    repo: &impl SpaceRepository,
    space: SpaceId,
    candidate_parent: SpaceId,
    bound: u64,
) -> ServiceResult<bool> {
    let mut cursor = Some(candidate_parent);
    let mut steps = 0_u64;
    while let Some(current) = cursor {
        if current == space {
            return Ok(true);
        }
        steps += 1;
        if steps > bound {
            return Ok(true);
        }
        cursor = repo.get_space(current)?.and_then(|node| node.parent);
    }
    Ok(false)
}
