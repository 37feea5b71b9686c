//! Lifecycle-scoped handle over one database connection.
//!
//! # Responsibility
//! - Own the connection and credential verifier for a session.
//! - Hand out per-aggregate services borrowing that connection.
//!
//! # Invariants
//! - A `Store` only wraps connections at the latest schema version.
//! - One `Store` per thread; concurrent callers open their own on the same
//!   file and serialize through SQLite write locks.

use crate::config::CoreConfig;
use crate::db::{open_db, open_db_in_memory, ConnectionOptions, DbError};
use crate::repo::{ensure_connection_ready, RepoError};
use crate::service::bundle_service::BundleService;
use crate::service::credential::{Argon2Verifier, CredentialError, CredentialVerifier};
use crate::service::item_service::ItemService;
use crate::service::location_service::LocationService;
use crate::service::space_service::SpaceService;
use crate::service::user_service::UserService;
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Repo(RepoError),
    Credential(CredentialError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Credential(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Credential(err) => Some(err),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<CredentialError> for StoreError {
    fn from(value: CredentialError) -> Self {
        Self::Credential(value)
    }
}

pub struct Store {
    conn: Connection,
    verifier: Box<dyn CredentialVerifier>,
}

impl Store {
    /// Opens (and migrates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>, options: &ConnectionOptions) -> Result<Self, StoreError> {
        Ok(Self::with_connection(open_db(path, options)?))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self::with_connection(open_db_in_memory()?))
    }

    /// Opens the database and verifier described by `config`.
    ///
    /// Without `database.path` the store is in-memory.
    pub fn from_config(config: &CoreConfig) -> Result<Self, StoreError> {
        let verifier = Argon2Verifier::new(
            config.credentials.memory_kib,
            config.credentials.iterations,
        )?;
        let store = match config.database.path.as_deref() {
            Some(path) => Self::open(path, &config.connection_options())?,
            None => Self::open_in_memory()?,
        };
        Ok(store.with_verifier(verifier))
    }

    /// Wraps an already-open connection after checking its schema.
    pub fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        ensure_connection_ready(&conn)?;
        Ok(Self::with_connection(conn))
    }

    /// Replaces the credential verifier.
    pub fn with_verifier(mut self, verifier: impl CredentialVerifier + 'static) -> Self {
        self.verifier = Box::new(verifier);
        self
    }

    fn with_connection(conn: Connection) -> Self {
        Self {
            conn,
            verifier: Box::new(Argon2Verifier::default()),
        }
    }

    pub fn users(&self) -> UserService<'_> {
        UserService::new(&self.conn, self.verifier.as_ref())
    }

    pub fn spaces(&self) -> SpaceService<'_> {
        SpaceService::new(&self.conn)
    }

    pub fn items(&self) -> ItemService<'_> {
        ItemService::new(&self.conn)
    }

    pub fn locations(&self) -> LocationService<'_> {
        LocationService::new(&self.conn)
    }

    pub fn bundles(&self) -> BundleService<'_> {
        BundleService::new(&self.conn)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Closes the connection, surfacing any close failure.
    pub fn close(self) -> Result<(), StoreError> {
        self.conn
            .close()
            .map_err(|(_, err)| StoreError::Db(DbError::Sqlite(err)))?;
        info!("event=store_close module=core status=ok");
        Ok(())
    }
}
