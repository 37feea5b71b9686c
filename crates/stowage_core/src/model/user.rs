//! User registry model.

use serde::{Deserialize, Serialize};

/// Public projection of a registered user.
///
/// The stored credential verifier never leaves the repository layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique, immutable identity key.
    pub username: String,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}
