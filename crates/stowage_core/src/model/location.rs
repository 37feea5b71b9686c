//! Placement record model.
//!
//! # Invariants
//! - `location_history` is oldest-first and only ever grows.
//! - The last history entry is never equal to `current_space`.
//! - `location_history ++ [current_space]` is the full placement order.

use crate::model::item::ItemId;
use crate::model::space::SpaceId;
use serde::{Deserialize, Serialize};

/// Current location of one item plus every place it has been before.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationLog {
    pub this_item: ItemId,
    pub current_space: SpaceId,
    /// Historical identifiers; referenced spaces may no longer exist.
    pub location_history: Vec<SpaceId>,
}

impl LocationLog {
    /// Starts a log with empty history.
    pub fn new(this_item: ItemId, current_space: SpaceId) -> Self {
        Self {
            this_item,
            current_space,
            location_history: Vec::new(),
        }
    }

    /// Full chronological placement order, current space last.
    pub fn placements(&self) -> Vec<SpaceId> {
        let mut all = self.location_history.clone();
        all.push(self.current_space);
        all
    }
}
