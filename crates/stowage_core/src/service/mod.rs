//! Core use-case services.
//!
//! # Responsibility
//! - Validate cross-aggregate invariants above the repository layer.
//! - Run every mutation as one atomic write transaction.
//! - Keep boundary layers decoupled from storage details.
//!
//! # Invariants
//! - Mutations open `BEGIN IMMEDIATE` before their first validation read, so
//!   concurrent writers serialize and never act on stale state.
//! - A failed mutation rolls back completely.

use crate::db::DbError;
use crate::model::item::ItemId;
use crate::model::space::SpaceId;
use crate::repo::RepoError;
use log::{info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub mod bundle_service;
pub mod credential;
pub mod integrity;
pub mod item_service;
pub mod location_service;
pub mod space_service;
pub mod user_service;

use credential::CredentialError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Aggregate kinds named in service errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Space,
    Item,
    LocationLog,
    Bundle,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Space => "space",
            Self::Item => "item",
            Self::LocationLog => "location log",
            Self::Bundle => "bundle",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from service operations.
#[derive(Debug)]
pub enum ServiceError {
    /// Request input is malformed (blank names, bad identifiers).
    InvalidInput(String),
    /// Referenced entity is absent or not visible to the caller.
    NotFound { kind: EntityKind, key: String },
    /// `(owner, name)` is already taken.
    DuplicateName {
        kind: EntityKind,
        owner: String,
        name: String,
    },
    /// Move would make a space its own ancestor.
    Cycle { space: SpaceId, new_parent: SpaceId },
    /// Referenced entity belongs to another user.
    Ownership {
        kind: EntityKind,
        key: String,
        owner: String,
    },
    /// Space still has child spaces.
    HasChildren(SpaceId),
    /// Delete blocked by a dependent record.
    InUse {
        kind: EntityKind,
        key: String,
        dependent: &'static str,
    },
    /// Entity that must be unique per key already exists.
    AlreadyExists { kind: EntityKind, key: String },
    /// Item is already in the bundle.
    AlreadyMember { bundle: String, item: ItemId },
    /// Item is not in the bundle.
    NotMember { bundle: String, item: ItemId },
    /// Username/credential pair did not verify.
    Authentication,
    /// Credential capability failure.
    Credential(CredentialError),
    /// Repository-level failure.
    Repo(RepoError),
}

impl ServiceError {
    /// Stable wire name of the error class.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "InvalidInputError",
            Self::NotFound { .. } => "NotFoundError",
            Self::DuplicateName { .. } => "DuplicateNameError",
            Self::Cycle { .. } => "CycleError",
            Self::Ownership { .. } => "OwnershipError",
            Self::HasChildren(_) => "HasChildrenError",
            Self::InUse { .. } => "InUseError",
            Self::AlreadyExists { .. } => "AlreadyExistsError",
            Self::AlreadyMember { .. } => "AlreadyMemberError",
            Self::NotMember { .. } => "NotMemberError",
            Self::Authentication => "AuthenticationError",
            Self::Credential(_) => "InternalError",
            Self::Repo(_) => "StorageError",
        }
    }

    pub(crate) fn not_found(kind: EntityKind, key: impl ToString) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::NotFound { kind, key } => write!(f, "{kind} not found: {key}"),
            Self::DuplicateName { kind, owner, name } => {
                write!(f, "{kind} named `{name}` already exists for {owner}")
            }
            Self::Cycle { space, new_parent } => write!(
                f,
                "moving space {space} under {new_parent} would create a cycle"
            ),
            Self::Ownership { kind, key, owner } => {
                write!(f, "{kind} {key} is not owned by {owner}")
            }
            Self::HasChildren(space) => write!(f, "space {space} still has child spaces"),
            Self::InUse {
                kind,
                key,
                dependent,
            } => write!(f, "{kind} {key} is still referenced by a {dependent}"),
            Self::AlreadyExists { kind, key } => write!(f, "{kind} already exists for {key}"),
            Self::AlreadyMember { bundle, item } => {
                write!(f, "item {item} is already in bundle `{bundle}`")
            }
            Self::NotMember { bundle, item } => {
                write!(f, "item {item} is not in bundle `{bundle}`")
            }
            Self::Authentication => write!(f, "invalid username or password"),
            Self::Credential(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Credential(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { table, key } => Self::NotFound {
                kind: kind_for_table(table),
                key,
            },
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::Db(DbError::Sqlite(value)))
    }
}

impl From<CredentialError> for ServiceError {
    fn from(value: CredentialError) -> Self {
        Self::Credential(value)
    }
}

fn kind_for_table(table: &str) -> EntityKind {
    match table {
        "users" => EntityKind::User,
        "spaces" => EntityKind::Space,
        "items" => EntityKind::Item,
        "location_logs" => EntityKind::LocationLog,
        _ => EntityKind::Bundle,
    }
}

/// Runs `op` inside one immediate write transaction.
///
/// Commits on success; any error drops the transaction, which rolls back.
pub(crate) fn run_write<T>(
    conn: &Connection,
    module: &'static str,
    event: &'static str,
    op: impl FnOnce(&Connection) -> ServiceResult<T>,
) -> ServiceResult<T> {
    let started_at = Instant::now();
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    let outcome = match op(&tx) {
        Ok(value) => tx.commit().map(|()| value).map_err(ServiceError::from),
        Err(err) => Err(err),
    };

    match &outcome {
        Ok(_) => info!(
            "event={event} module={module} status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event={event} module={module} status=error duration_ms={} error_code={}",
            started_at.elapsed().as_millis(),
            err.code()
        ),
    }
    outcome
}

/// Trims and rejects blank identifiers such as names and types.
pub(crate) fn normalize_required(value: &str, field: &'static str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::InvalidInput(format!(
            "{field} must not be blank"
        )));
    }
    Ok(trimmed.to_string())
}

/// Trims optional free text; blank becomes `None`.
pub(crate) fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
