//! Space tree repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist spaces and their parent edges.
//! - Keep SQL details and ordering behavior inside repository boundary.
//!
//! # Invariants
//! - Listing is deterministic: `created_at ASC, name ASC`.
//! - `(owner, name)` uniqueness is backed by `idx_spaces_owner_name`.

use crate::model::space::{Space, SpaceId};
use crate::repo::{parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const SPACE_SELECT_SQL: &str = "SELECT
    space_uuid,
    owner,
    name,
    space_type,
    parent_uuid
FROM spaces";

/// Repository interface for space tree operations.
pub trait SpaceRepository {
    /// Inserts one space record.
    fn insert_space(&self, space: &Space) -> RepoResult<()>;
    /// Loads one space by id.
    fn get_space(&self, id: SpaceId) -> RepoResult<Option<Space>>;
    /// Resolves an `(owner, name)` pair to a space id.
    fn find_by_name(&self, owner: &str, name: &str) -> RepoResult<Option<SpaceId>>;
    /// Lists every space.
    fn list_spaces(&self) -> RepoResult<Vec<Space>>;
    /// Lists spaces of one owner.
    fn list_spaces_by_owner(&self, owner: &str) -> RepoResult<Vec<Space>>;
    /// Lists direct children of one space.
    fn list_children(&self, parent: SpaceId) -> RepoResult<Vec<Space>>;
    /// Counts direct children of one space.
    fn count_children(&self, parent: SpaceId) -> RepoResult<u64>;
    /// Counts all spaces of one owner.
    fn count_for_owner(&self, owner: &str) -> RepoResult<u64>;
    /// Rewrites the parent edge of one space.
    fn set_parent(&self, id: SpaceId, parent: Option<SpaceId>) -> RepoResult<()>;
    /// Renames one space.
    fn set_name(&self, id: SpaceId, name: &str) -> RepoResult<()>;
    /// Physically deletes one space.
    fn delete_space(&self, id: SpaceId) -> RepoResult<()>;
}

/// SQLite-backed space repository.
pub struct SqliteSpaceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSpaceRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_spaces(&self, sql: &str, param: Option<&str>) -> RepoResult<Vec<Space>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = match param {
            Some(value) => stmt.query([value])?,
            None => stmt.query([])?,
        };
        let mut spaces = Vec::new();
        while let Some(row) = rows.next()? {
            spaces.push(parse_space_row(row)?);
        }
        Ok(spaces)
    }
}

impl SpaceRepository for SqliteSpaceRepository<'_> {
    fn insert_space(&self, space: &Space) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO spaces (
                space_uuid,
                owner,
                name,
                space_type,
                parent_uuid
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                space.id.to_string(),
                space.owner.as_str(),
                space.name.as_str(),
                space.space_type.as_str(),
                space.parent.map(|value| value.to_string()),
            ],
        )?;
        Ok(())
    }

    fn get_space(&self, id: SpaceId) -> RepoResult<Option<Space>> {
        let mut spaces = self.query_spaces(
            &format!("{SPACE_SELECT_SQL} WHERE space_uuid = ?1;"),
            Some(id.to_string().as_str()),
        )?;
        Ok(spaces.pop())
    }

    fn find_by_name(&self, owner: &str, name: &str) -> RepoResult<Option<SpaceId>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT space_uuid FROM spaces WHERE owner = ?1 AND name = ?2;",
                params![owner, name],
                |row| row.get(0),
            )
            .optional()?;
        value
            .map(|text| parse_uuid(&text, "spaces.space_uuid"))
            .transpose()
    }

    fn list_spaces(&self) -> RepoResult<Vec<Space>> {
        self.query_spaces(
            &format!("{SPACE_SELECT_SQL} ORDER BY created_at ASC, owner ASC, name ASC;"),
            None,
        )
    }

    fn list_spaces_by_owner(&self, owner: &str) -> RepoResult<Vec<Space>> {
        self.query_spaces(
            &format!("{SPACE_SELECT_SQL} WHERE owner = ?1 ORDER BY created_at ASC, name ASC;"),
            Some(owner),
        )
    }

    fn list_children(&self, parent: SpaceId) -> RepoResult<Vec<Space>> {
        self.query_spaces(
            &format!(
                "{SPACE_SELECT_SQL} WHERE parent_uuid = ?1 ORDER BY created_at ASC, name ASC;"
            ),
            Some(parent.to_string().as_str()),
        )
    }

    fn count_children(&self, parent: SpaceId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM spaces WHERE parent_uuid = ?1;",
            [parent.to_string()],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    fn count_for_owner(&self, owner: &str) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM spaces WHERE owner = ?1;",
            [owner],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    fn set_parent(&self, id: SpaceId, parent: Option<SpaceId>) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE spaces
             SET parent_uuid = ?2,
                 updated_at = (CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER))
             WHERE space_uuid = ?1;",
            params![id.to_string(), parent.map(|value| value.to_string())],
        )?;
        ensure_changed(changed, id)
    }

    fn set_name(&self, id: SpaceId, name: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE spaces
             SET name = ?2,
                 updated_at = (CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER))
             WHERE space_uuid = ?1;",
            params![id.to_string(), name],
        )?;
        ensure_changed(changed, id)
    }

    fn delete_space(&self, id: SpaceId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM spaces WHERE space_uuid = ?1;", [id.to_string()])?;
        ensure_changed(changed, id)
    }
}

fn ensure_changed(changed: usize, id: SpaceId) -> RepoResult<()> {
    if changed == 0 {
        return Err(RepoError::NotFound {
            table: "spaces",
            key: id.to_string(),
        });
    }
    Ok(())
}

fn parse_space_row(row: &Row<'_>) -> RepoResult<Space> {
    let id_text: String = row.get("space_uuid")?;
    let parent = row
        .get::<_, Option<String>>("parent_uuid")?
        .map(|value| parse_uuid(&value, "spaces.parent_uuid"))
        .transpose()?;

    Ok(Space {
        id: parse_uuid(&id_text, "spaces.space_uuid")?,
        owner: row.get("owner")?,
        name: row.get("name")?,
        space_type: row.get("space_type")?,
        parent,
    })
}
