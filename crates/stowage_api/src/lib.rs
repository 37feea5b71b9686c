//! JSON request boundary for the stowage core.
//!
//! # Responsibility
//! - Decode route + JSON body pairs into service calls.
//! - Encode results as JSON payloads or `{ "error": <message> }`.
//!
//! # Invariants
//! - Dispatch never panics on client input.
//! - Zero-or-one lookups always leave this crate as arrays.

pub mod api;
pub mod wire;

pub use api::{dispatch, handle_request, ApiError, ApiResult, Route};
