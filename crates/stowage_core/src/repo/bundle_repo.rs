//! Bundle repository contracts and SQLite implementation.
//!
//! # Invariants
//! - A bundle is keyed by `(owner, name)`.
//! - Membership rows are unique per `(owner, bundle_name, item_uuid)` and are
//!   removed together with their bundle.
//! - Members are listed in insertion order (`added_seq ASC`, counted per bundle).

use crate::model::bundle::Bundle;
use crate::model::item::ItemId;
use crate::repo::{parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection};
use std::collections::HashMap;

/// Repository interface for bundle operations.
pub trait BundleRepository {
    fn insert_bundle(&self, owner: &str, name: &str) -> RepoResult<()>;
    fn bundle_exists(&self, owner: &str, name: &str) -> RepoResult<bool>;
    /// Loads one bundle with members.
    fn get_bundle(&self, owner: &str, name: &str) -> RepoResult<Option<Bundle>>;
    /// Lists every bundle with members.
    fn list_bundles(&self) -> RepoResult<Vec<Bundle>>;
    /// Lists bundles of one owner with members.
    fn list_bundles_by_owner(&self, owner: &str) -> RepoResult<Vec<Bundle>>;
    fn delete_bundle(&self, owner: &str, name: &str) -> RepoResult<()>;
    fn is_member(&self, owner: &str, name: &str, item: ItemId) -> RepoResult<bool>;
    fn add_member(&self, owner: &str, name: &str, item: ItemId) -> RepoResult<()>;
    fn remove_member(&self, owner: &str, name: &str, item: ItemId) -> RepoResult<()>;
    /// Counts bundles (of any owner) that contain `item`.
    fn count_memberships(&self, item: ItemId) -> RepoResult<u64>;
}

/// SQLite-backed bundle repository.
pub struct SqliteBundleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBundleRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn load_bundles(&self, owner: Option<&str>) -> RepoResult<Vec<Bundle>> {
        let mut bundles = Vec::new();
        let mut index_by_key: HashMap<(String, String), usize> = HashMap::new();

        let (bundle_sql, member_sql) = if owner.is_some() {
            (
                "SELECT owner, name FROM bundles
                 WHERE owner = ?1
                 ORDER BY created_at ASC, name ASC;",
                "SELECT owner, bundle_name, item_uuid FROM bundle_members
                 WHERE owner = ?1
                 ORDER BY added_seq ASC;",
            )
        } else {
            (
                "SELECT owner, name FROM bundles
                 ORDER BY created_at ASC, owner ASC, name ASC;",
                "SELECT owner, bundle_name, item_uuid FROM bundle_members
                 ORDER BY added_seq ASC;",
            )
        };

        let mut stmt = self.conn.prepare(bundle_sql)?;
        let mut rows = match owner {
            Some(owner) => stmt.query([owner])?,
            None => stmt.query([])?,
        };
        while let Some(row) = rows.next()? {
            let bundle = Bundle::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?);
            index_by_key.insert((bundle.owner.clone(), bundle.name.clone()), bundles.len());
            bundles.push(bundle);
        }

        let mut stmt = self.conn.prepare(member_sql)?;
        let mut rows = match owner {
            Some(owner) => stmt.query([owner])?,
            None => stmt.query([])?,
        };
        while let Some(row) = rows.next()? {
            let key = (row.get::<_, String>(0)?, row.get::<_, String>(1)?);
            let item_text: String = row.get(2)?;
            let index = index_by_key.get(&key).copied().ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "membership row for missing bundle `{}/{}`",
                    key.0, key.1
                ))
            })?;
            bundles[index]
                .members
                .push(parse_uuid(&item_text, "bundle_members.item_uuid")?);
        }

        Ok(bundles)
    }
}

impl BundleRepository for SqliteBundleRepository<'_> {
    fn insert_bundle(&self, owner: &str, name: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO bundles (owner, name) VALUES (?1, ?2);",
            params![owner, name],
        )?;
        Ok(())
    }

    fn bundle_exists(&self, owner: &str, name: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM bundles WHERE owner = ?1 AND name = ?2);",
            params![owner, name],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn get_bundle(&self, owner: &str, name: &str) -> RepoResult<Option<Bundle>> {
        if !self.bundle_exists(owner, name)? {
            return Ok(None);
        }

        let mut bundle = Bundle::new(owner, name);
        let mut stmt = self.conn.prepare(
            "SELECT item_uuid FROM bundle_members
             WHERE owner = ?1 AND bundle_name = ?2
             ORDER BY added_seq ASC;",
        )?;
        let mut rows = stmt.query(params![owner, name])?;
        while let Some(row) = rows.next()? {
            let item_text: String = row.get(0)?;
            bundle
                .members
                .push(parse_uuid(&item_text, "bundle_members.item_uuid")?);
        }
        Ok(Some(bundle))
    }

    fn list_bundles(&self) -> RepoResult<Vec<Bundle>> {
        self.load_bundles(None)
    }

    fn list_bundles_by_owner(&self, owner: &str) -> RepoResult<Vec<Bundle>> {
        self.load_bundles(Some(owner))
    }

    fn delete_bundle(&self, owner: &str, name: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM bundles WHERE owner = ?1 AND name = ?2;",
            params![owner, name],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                table: "bundles",
                key: format!("{owner}/{name}"),
            });
        }
        Ok(())
    }

    fn is_member(&self, owner: &str, name: &str, item: ItemId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM bundle_members
                WHERE owner = ?1 AND bundle_name = ?2 AND item_uuid = ?3
            );",
            params![owner, name, item.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn add_member(&self, owner: &str, name: &str, item: ItemId) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO bundle_members (owner, bundle_name, item_uuid, added_seq)
             SELECT ?1, ?2, ?3, COALESCE(MAX(added_seq), -1) + 1
             FROM bundle_members
             WHERE owner = ?1 AND bundle_name = ?2;",
            params![owner, name, item.to_string()],
        )?;
        Ok(())
    }

    fn remove_member(&self, owner: &str, name: &str, item: ItemId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM bundle_members
             WHERE owner = ?1 AND bundle_name = ?2 AND item_uuid = ?3;",
            params![owner, name, item.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                table: "bundle_members",
                key: format!("{owner}/{name}/{item}"),
            });
        }
        Ok(())
    }

    fn count_memberships(&self, item: ItemId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM bundle_members WHERE item_uuid = ?1;",
            [item.to_string()],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}
