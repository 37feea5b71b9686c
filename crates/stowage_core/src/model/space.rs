//! Space tree model.
//!
//! # Invariants
//! - `parent`, when set, names a space of the same `owner`.
//! - `(owner, name)` is unique across all spaces.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable space identifier.
pub type SpaceId = Uuid;

/// One node in an owner's space forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    pub id: SpaceId,
    /// Owning username.
    pub owner: String,
    pub name: String,
    /// Free-form classification such as `room` or `shelf`.
    pub space_type: String,
    /// `None` means this space is a root.
    pub parent: Option<SpaceId>,
}

impl Space {
    /// Creates a space record with a generated id.
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        space_type: impl Into<String>,
        parent: Option<SpaceId>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            name: name.into(),
            space_type: space_type.into(),
            parent,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
