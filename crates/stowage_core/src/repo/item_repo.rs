//! Item catalog repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `(owner, name)` uniqueness is backed by `idx_items_owner_name`.
//! - Physical deletion happens only after the service-level integrity guard.

use crate::model::item::{Item, ItemId};
use crate::repo::{parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const ITEM_SELECT_SQL: &str = "SELECT
    item_uuid,
    owner,
    name,
    description,
    category
FROM items";

/// Repository interface for item catalog operations.
pub trait ItemRepository {
    fn insert_item(&self, item: &Item) -> RepoResult<()>;
    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>>;
    fn find_by_name(&self, owner: &str, name: &str) -> RepoResult<Option<ItemId>>;
    fn list_items(&self) -> RepoResult<Vec<Item>>;
    fn list_items_by_owner(&self, owner: &str) -> RepoResult<Vec<Item>>;
    /// Overwrites the mutable detail columns from `item`.
    fn update_item(&self, item: &Item) -> RepoResult<()>;
    fn delete_item(&self, id: ItemId) -> RepoResult<()>;
}

/// SQLite-backed item repository.
pub struct SqliteItemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ItemRepository for SqliteItemRepository<'_> {
    fn insert_item(&self, item: &Item) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO items (
                item_uuid,
                owner,
                name,
                description,
                category
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                item.id.to_string(),
                item.owner.as_str(),
                item.name.as_str(),
                item.description.as_deref(),
                item.category.as_deref(),
            ],
        )?;
        Ok(())
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ITEM_SELECT_SQL} WHERE item_uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_item_row(row)?));
        }
        Ok(None)
    }

    fn find_by_name(&self, owner: &str, name: &str) -> RepoResult<Option<ItemId>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT item_uuid FROM items WHERE owner = ?1 AND name = ?2;",
                params![owner, name],
                |row| row.get(0),
            )
            .optional()?;
        value
            .map(|text| parse_uuid(&text, "items.item_uuid"))
            .transpose()
    }

    fn list_items(&self) -> RepoResult<Vec<Item>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ITEM_SELECT_SQL} ORDER BY created_at ASC, owner ASC, name ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }
        Ok(items)
    }

    fn list_items_by_owner(&self, owner: &str) -> RepoResult<Vec<Item>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ITEM_SELECT_SQL} WHERE owner = ?1 ORDER BY created_at ASC, name ASC;"
        ))?;
        let mut rows = stmt.query([owner])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }
        Ok(items)
    }

    fn update_item(&self, item: &Item) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE items
             SET name = ?2,
                 description = ?3,
                 category = ?4,
                 updated_at = (CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER))
             WHERE item_uuid = ?1;",
            params![
                item.id.to_string(),
                item.name.as_str(),
                item.description.as_deref(),
                item.category.as_deref(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                table: "items",
                key: item.id.to_string(),
            });
        }
        Ok(())
    }

    fn delete_item(&self, id: ItemId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM items WHERE item_uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                table: "items",
                key: id.to_string(),
            });
        }
        Ok(())
    }
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<Item> {
    let id_text: String = row.get("item_uuid")?;
    Ok(Item {
        id: parse_uuid(&id_text, "items.item_uuid")?,
        owner: row.get("owner")?,
        name: row.get("name")?,
        description: row.get("description")?,
        category: row.get("category")?,
    })
}
