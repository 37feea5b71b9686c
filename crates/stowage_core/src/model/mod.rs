//! Domain model for spaces, items, placements and bundles.
//!
//! # Responsibility
//! - Define canonical records shared by repositories, services and the wire
//!   boundary.
//! - Keep serialized field names aligned with the request/response contracts.
//!
//! # Invariants
//! - Spaces and items are identified by stable UUIDs.
//! - Users and bundles are identified by name (`username`, `owner + name`).

pub mod bundle;
pub mod item;
pub mod location;
pub mod space;
pub mod user;
