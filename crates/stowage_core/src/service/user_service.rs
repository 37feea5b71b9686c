//! User registry use-case service.
//!
//! # Responsibility
//! - Register users and check credentials.
//! - Provide the identity checks other components rely on.
//!
//! # Invariants
//! - Usernames are unique, trimmed and match `USERNAME_RE`.
//! - Plain credentials are never persisted or logged.
//! - Unknown usernames and wrong credentials fail identically.

use crate::model::user::User;
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::service::credential::CredentialVerifier;
use crate::service::{run_write, EntityKind, ServiceError, ServiceResult};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.@-]{1,64}$").expect("valid username regex"));

/// User registry service facade.
pub struct UserService<'conn> {
    conn: &'conn Connection,
    verifier: &'conn dyn CredentialVerifier,
}

impl<'conn> UserService<'conn> {
    pub fn new(conn: &'conn Connection, verifier: &'conn dyn CredentialVerifier) -> Self {
        Self { conn, verifier }
    }

    /// Registers one user.
    ///
    /// # Errors
    /// - `InvalidInput` for a malformed username or empty credential.
    /// - `DuplicateName` when the username is taken.
    pub fn register_user(&self, username: &str, credential: &str) -> ServiceResult<User> {
        let username = normalize_username(username)?;
        if credential.is_empty() {
            return Err(ServiceError::InvalidInput(
                "password must not be empty".to_string(),
            ));
        }
        // Hash before taking the write lock.
        let stored = self.verifier.hash_credential(credential)?;

        run_write(self.conn, "user", "user_register", |conn| {
            let repo = SqliteUserRepository::new(conn);
            if repo.user_exists(&username)? {
                return Err(ServiceError::DuplicateName {
                    kind: EntityKind::User,
                    owner: username.clone(),
                    name: username.clone(),
                });
            }
            repo.insert_user(&username, &stored)?;
            Ok(User::new(username.as_str()))
        })
    }

    /// Checks a username/credential pair.
    pub fn authenticate_user(&self, username: &str, credential: &str) -> ServiceResult<()> {
        let repo = SqliteUserRepository::new(self.conn);
        let Some(stored) = repo.credential_for(username.trim())? else {
            debug!("event=user_authenticate module=user status=error error_code=AuthenticationError");
            return Err(ServiceError::Authentication);
        };
        if self.verifier.verify_credential(credential, &stored)? {
            debug!("event=user_authenticate module=user status=ok");
            Ok(())
        } else {
            debug!("event=user_authenticate module=user status=error error_code=AuthenticationError");
            Err(ServiceError::Authentication)
        }
    }

    /// Returns the username when the user exists.
    pub fn get_user_name(&self, username: &str) -> ServiceResult<Option<String>> {
        let username = username.trim();
        let repo = SqliteUserRepository::new(self.conn);
        Ok(repo
            .user_exists(username)?
            .then(|| username.to_string()))
    }

    /// Lists all registered users.
    pub fn get_users(&self) -> ServiceResult<Vec<User>> {
        Ok(SqliteUserRepository::new(self.conn).list_users()?)
    }

    /// Lists all registered usernames.
    pub fn get_users_string(&self) -> ServiceResult<Vec<String>> {
        Ok(self
            .get_users()?
            .into_iter()
            .map(|user| user.username)
            .collect())
    }
}

/// Fails with `NotFound` unless `username` is registered.
pub(crate) fn ensure_user_exists(conn: &Connection, username: &str) -> ServiceResult<()> {
    if SqliteUserRepository::new(conn).user_exists(username)? {
        Ok(())
    } else {
        Err(ServiceError::not_found(EntityKind::User, username))
    }
}

fn normalize_username(value: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if !USERNAME_RE.is_match(trimmed) {
        return Err(ServiceError::InvalidInput(format!(
            "username `{trimmed}` must be 1-64 characters of letters, digits, `_`, `.`, `@` or `-`"
        )));
    }
    Ok(trimmed.to_string())
}
