//! Request shapes and response row encoding.
//!
//! Field names follow the camelCase client contracts.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use stowage_core::{ItemId, SpaceId};

/// A user given either as a bare username or as `{ "username": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    Name(String),
    Object { username: String },
}

impl UserRef {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Object { username } => username,
        }
    }
}

/// An item given either as its id or as an item record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ItemRef {
    Id(ItemId),
    Object { id: ItemId },
}

impl ItemRef {
    pub fn id(self) -> ItemId {
        match self {
            Self::Id(id) | Self::Object { id } => id,
        }
    }
}

/// A space given either as its id or as a space record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SpaceRef {
    Id(SpaceId),
    Object { id: SpaceId },
}

impl SpaceRef {
    pub fn id(self) -> SpaceId {
        match self {
            Self::Id(id) | Self::Object { id } => id,
        }
    }
}

/// Reads a field that must be present but may be `null`.
fn required_nullable<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateSpaceRequest {
    pub owner: UserRef,
    pub name: String,
    pub space_type: String,
    #[serde(default)]
    pub parent: Option<SpaceRef>,
}

/// `newParent` is required; `null` detaches the space to a root.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct MoveSpaceRequest {
    pub owner: UserRef,
    pub space: SpaceRef,
    #[serde(deserialize_with = "required_nullable")]
    pub new_parent: Option<SpaceRef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct RenameSpaceRequest {
    pub owner: UserRef,
    pub space: SpaceRef,
    pub new_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteSpaceRequest {
    pub owner: UserRef,
    pub space: SpaceRef,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateLogRequest {
    pub this_item: ItemRef,
    pub current_space: SpaceRef,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct PlaceItemRequest {
    pub link_item: ItemRef,
    pub link_space: SpaceRef,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct DeleteLogRequest {
    pub curr_item: ItemRef,
}

/// Body of `createBundle` and `deleteBundle`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleRequest {
    pub user: UserRef,
    pub name: String,
}

/// Body of `addItemToBundle` and `removeItemFromBundle`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct BundleItemRequest {
    pub user: UserRef,
    pub item: ItemRef,
    pub bundle_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateItemRequest {
    pub owner: UserRef,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateItemRequest {
    pub owner: UserRef,
    pub item: ItemRef,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteItemRequest {
    pub owner: UserRef,
    pub item: ItemRef,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpaceQuery {
    pub space: SpaceRef,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemQuery {
    pub item: ItemRef,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserQuery {
    pub user: UserRef,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OwnerQuery {
    pub owner: UserRef,
}

/// Encodes each value as a one-field object `{ <key>: value }`.
pub fn rows<T: Serialize>(
    key: &str,
    values: impl IntoIterator<Item = T>,
) -> serde_json::Result<Value> {
    values
        .into_iter()
        .map(|value| {
            let mut row = Map::new();
            row.insert(key.to_string(), serde_json::to_value(value)?);
            Ok(Value::Object(row))
        })
        .collect::<serde_json::Result<Vec<_>>>()
        .map(Value::Array)
}

/// Encodes full records as an array.
pub fn records<T: Serialize>(values: impl IntoIterator<Item = T>) -> serde_json::Result<Value> {
    values
        .into_iter()
        .map(serde_json::to_value)
        .collect::<serde_json::Result<Vec<_>>>()
        .map(Value::Array)
}
