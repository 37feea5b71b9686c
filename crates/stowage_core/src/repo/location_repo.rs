//! Location tracker repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist the current placement per item and its ordered history.
//!
//! # Invariants
//! - History rows are append-only; `seq` grows by one per recorded move.
//! - `record_move` must run in the same transaction as the read that
//!   produced `previous`, otherwise racing writers can duplicate history.

use crate::model::item::ItemId;
use crate::model::location::LocationLog;
use crate::model::space::SpaceId;
use crate::repo::{parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;

/// Repository interface for location log operations.
pub trait LocationRepository {
    /// Loads one log with full history.
    fn get_log(&self, item: ItemId) -> RepoResult<Option<LocationLog>>;
    /// Lists every log with full history.
    fn list_logs(&self) -> RepoResult<Vec<LocationLog>>;
    /// Creates a log with empty history.
    fn insert_log(&self, item: ItemId, space: SpaceId) -> RepoResult<()>;
    /// Appends `previous` to history and points the log at `next`.
    fn record_move(&self, item: ItemId, previous: SpaceId, next: SpaceId) -> RepoResult<()>;
    /// Removes a log and its history. Returns whether a log existed.
    fn delete_log(&self, item: ItemId) -> RepoResult<bool>;
    /// Counts logs whose current space is `space`.
    fn count_at_space(&self, space: SpaceId) -> RepoResult<u64>;
}

/// SQLite-backed location repository.
pub struct SqliteLocationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLocationRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn load_history(&self, item: ItemId) -> RepoResult<Vec<SpaceId>> {
        let mut stmt = self.conn.prepare(
            "SELECT space_uuid
             FROM location_history
             WHERE item_uuid = ?1
             ORDER BY seq ASC;",
        )?;
        let mut rows = stmt.query([item.to_string()])?;
        let mut history = Vec::new();
        while let Some(row) = rows.next()? {
            let text: String = row.get(0)?;
            history.push(parse_uuid(&text, "location_history.space_uuid")?);
        }
        Ok(history)
    }
}

impl LocationRepository for SqliteLocationRepository<'_> {
    fn get_log(&self, item: ItemId) -> RepoResult<Option<LocationLog>> {
        let current: Option<String> = self
            .conn
            .query_row(
                "SELECT current_space_uuid FROM location_logs WHERE item_uuid = ?1;",
                [item.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(current) = current else {
            return Ok(None);
        };

        Ok(Some(LocationLog {
            this_item: item,
            current_space: parse_uuid(&current, "location_logs.current_space_uuid")?,
            location_history: self.load_history(item)?,
        }))
    }

    fn list_logs(&self) -> RepoResult<Vec<LocationLog>> {
        let mut logs = Vec::new();
        let mut index_by_item = HashMap::new();

        let mut stmt = self.conn.prepare(
            "SELECT item_uuid, current_space_uuid
             FROM location_logs
             ORDER BY created_at ASC, item_uuid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let item_text: String = row.get(0)?;
            let space_text: String = row.get(1)?;
            let item = parse_uuid(&item_text, "location_logs.item_uuid")?;
            index_by_item.insert(item, logs.len());
            logs.push(LocationLog::new(
                item,
                parse_uuid(&space_text, "location_logs.current_space_uuid")?,
            ));
        }

        let mut stmt = self.conn.prepare(
            "SELECT item_uuid, space_uuid
             FROM location_history
             ORDER BY item_uuid ASC, seq ASC;",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let item_text: String = row.get(0)?;
            let space_text: String = row.get(1)?;
            let item = parse_uuid(&item_text, "location_history.item_uuid")?;
            let index = index_by_item.get(&item).copied().ok_or_else(|| {
                RepoError::InvalidData(format!("history row for item `{item}` without a log"))
            })?;
            logs[index]
                .location_history
                .push(parse_uuid(&space_text, "location_history.space_uuid")?);
        }

        Ok(logs)
    }

    fn insert_log(&self, item: ItemId, space: SpaceId) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO location_logs (item_uuid, current_space_uuid) VALUES (?1, ?2);",
            params![item.to_string(), space.to_string()],
        )?;
        Ok(())
    }

    fn record_move(&self, item: ItemId, previous: SpaceId, next: SpaceId) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO location_history (item_uuid, seq, space_uuid)
             SELECT ?1, COALESCE(MAX(seq), -1) + 1, ?2
             FROM location_history
             WHERE item_uuid = ?1;",
            params![item.to_string(), previous.to_string()],
        )?;

        let changed = self.conn.execute(
            "UPDATE location_logs
             SET current_space_uuid = ?2,
                 updated_at = (CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER))
             WHERE item_uuid = ?1;",
            params![item.to_string(), next.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                table: "location_logs",
                key: item.to_string(),
            });
        }
        Ok(())
    }

    fn delete_log(&self, item: ItemId) -> RepoResult<bool> {
        self.conn.execute(
            "DELETE FROM location_history WHERE item_uuid = ?1;",
            [item.to_string()],
        )?;
        let changed = self.conn.execute(
            "DELETE FROM location_logs WHERE item_uuid = ?1;",
            [item.to_string()],
        )?;
        Ok(changed > 0)
    }

    fn count_at_space(&self, space: SpaceId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM location_logs WHERE current_space_uuid = ?1;",
            [space.to_string()],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}
