//! User registry repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `username` is the primary key; callers check for duplicates first.
//! - The stored credential is an opaque verifier string and is only read
//!   back through `credential_for`.

use crate::model::user::User;
use crate::repo::RepoResult;
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for user registry operations.
pub trait UserRepository {
    /// Inserts one user with an already-hashed credential.
    fn insert_user(&self, username: &str, credential: &str) -> RepoResult<()>;
    /// Returns whether a user with this name exists.
    fn user_exists(&self, username: &str) -> RepoResult<bool>;
    /// Loads the stored credential verifier for one user.
    fn credential_for(&self, username: &str) -> RepoResult<Option<String>>;
    /// Lists all users ordered by registration time.
    fn list_users(&self) -> RepoResult<Vec<User>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn insert_user(&self, username: &str, credential: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO users (username, credential) VALUES (?1, ?2);",
            params![username, credential],
        )?;
        Ok(())
    }

    fn user_exists(&self, username: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1);",
            [username],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn credential_for(&self, username: &str) -> RepoResult<Option<String>> {
        let credential = self
            .conn
            .query_row(
                "SELECT credential FROM users WHERE username = ?1;",
                [username],
                |row| row.get(0),
            )
            .optional()?;
        Ok(credential)
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT username FROM users ORDER BY created_at ASC, username ASC;")?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(User::new(row.get::<_, String>(0)?));
        }
        Ok(users)
    }
}
