//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by core behavior.
//! - Trigger schema migrations before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - When WAL is requested, returned connections are in WAL mode.
//! - Returned connections have migrations fully applied.

use super::migrations::apply_migrations;
use super::{ConnectionOptions, DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::Instant;

/// Opens a SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Creates the file when it does not exist.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>, options: &ConnectionOptions) -> DbResult<Connection> {
    open_with("file", options, || Connection::open(path))
}

/// Opens an in-memory SQLite database and applies all pending migrations.
///
/// WAL is never enabled here; in-memory databases only support `memory`
/// journaling.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let options = ConnectionOptions {
        wal: false,
        ..ConnectionOptions::default()
    };
    open_with("memory", &options, Connection::open_in_memory)
}

fn open_with(
    mode: &'static str,
    options: &ConnectionOptions,
    opener: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match opener() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn, options) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection, options: &ConnectionOptions) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(options.busy_timeout)?;
    if options.wal {
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        ensure_journal_mode("wal", &mode)?;
    }
    apply_migrations(conn)?;
    Ok(())
}

fn ensure_journal_mode(requested: &'static str, actual: &str) -> DbResult<()> {
    if actual.eq_ignore_ascii_case(requested) {
        return Ok(());
    }
    Err(DbError::JournalMode {
        requested,
        actual: actual.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::ensure_journal_mode;
    use crate::db::DbError;

    #[test]
    fn journal_mode_check_ignores_case() {
        assert!(ensure_journal_mode("wal", "WAL").is_ok());
        assert!(ensure_journal_mode("wal", "wal").is_ok());
    }

    #[test]
    fn refused_wal_is_an_error() {
        let err = ensure_journal_mode("wal", "delete").unwrap_err();
        assert!(matches!(
            err,
            DbError::JournalMode { requested: "wal", ref actual } if actual == "delete"
        ));
        assert!(err.to_string().contains("delete"));
    }
}
