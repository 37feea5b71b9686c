//! Item catalog model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable item identifier.
pub type ItemId = Uuid;

/// A physical thing a user keeps track of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// Owning username.
    pub owner: String,
    /// Unique per owner.
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
}

impl Item {
    /// Creates an item record with a generated id and no details.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            name: name.into(),
            description: None,
            category: None,
        }
    }
}

/// Partial update for `updateItemDetails`.
///
/// `None` leaves a field untouched. For `description` and `category`, a
/// blank value clears the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDetailsUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

impl ItemDetailsUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.category.is_none()
    }
}
