//! Core domain logic for stowage: users, nested spaces, items, item
//! placement history and bundles.
//! This crate is the single source of truth for business invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::bundle::Bundle;
pub use model::item::{Item, ItemDetailsUpdate, ItemId};
pub use model::location::LocationLog;
pub use model::space::{Space, SpaceId};
pub use model::user::User;
pub use repo::{RepoError, RepoResult};
pub use service::credential::{Argon2Verifier, CredentialError, CredentialVerifier};
pub use service::location_service::PlacementOutcome;
pub use service::{EntityKind, ServiceError, ServiceResult};
pub use store::{Store, StoreError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
