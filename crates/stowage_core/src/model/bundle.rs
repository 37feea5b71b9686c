//! Bundle model.

use crate::model::item::ItemId;
use serde::{Deserialize, Serialize};

/// Named, user-owned set of item references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    pub owner: String,
    /// Unique per owner.
    pub name: String,
    /// No duplicates. Listed in insertion order for stable output.
    pub members: Vec<ItemId>,
}

impl Bundle {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn contains(&self, item: ItemId) -> bool {
        self.members.contains(&item)
    }
}
