//! Route dispatch.
//!
//! # Responsibility
//! - Resolve `/api/<Concept>/<action>` paths to service operations.
//! - Translate service errors into `{ "error": ... }` responses.
//!
//! # Invariants
//! - Unknown routes and undecodable bodies are `InvalidInputError`.
//! - Each call runs exactly one core operation; atomicity is the core's.

use crate::wire::{
    records, rows, BundleItemRequest, BundleRequest, CreateItemRequest, CreateLogRequest,
    CreateSpaceRequest, CredentialsRequest, DeleteItemRequest, DeleteLogRequest,
    DeleteSpaceRequest, ItemQuery, MoveSpaceRequest, OwnerQuery, PlaceItemRequest,
    RenameSpaceRequest, SpaceQuery, SpaceRef, UpdateItemRequest, UserQuery,
};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use stowage_core::{ItemDetailsUpdate, ServiceError, Store};

pub type ApiResult = Result<Value, ApiError>;

/// Failed request with its wire error class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self {
            code: "InvalidInputError",
            message: message.into(),
        }
    }

    /// `{ "error": "<code>: <message>" }`.
    pub fn to_json(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl Error for ApiError {}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        Self {
            code: value.code(),
            message: value.to_string(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        Self {
            code: "InternalError",
            message: format!("response encoding failed: {value}"),
        }
    }
}

/// Parsed `<Concept>/<action>` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route<'a> {
    pub concept: &'a str,
    pub action: &'a str,
}

impl<'a> Route<'a> {
    /// Accepts `/api/Space/createSpace`, `Space/createSpace` and
    /// `Space/_getSpaceName`; the leading `_` of queries is stripped.
    pub fn parse(path: &'a str) -> Result<Self, ApiError> {
        let trimmed = path.trim().trim_matches('/');
        let trimmed = trimmed.strip_prefix("api/").unwrap_or(trimmed);
        let mut parts = trimmed.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(concept), Some(action), None) if !concept.is_empty() && !action.is_empty() => {
                Ok(Self {
                    concept,
                    action: action.strip_prefix('_').unwrap_or(action),
                })
            }
            _ => Err(ApiError::invalid_input(format!("malformed route `{path}`"))),
        }
    }
}

/// Runs one request and returns the response body, error or not.
pub fn handle_request(store: &Store, path: &str, body: &Value) -> Value {
    match dispatch(store, path, body) {
        Ok(payload) => payload,
        Err(err) => err.to_json(),
    }
}

/// Runs one request.
pub fn dispatch(store: &Store, path: &str, body: &Value) -> ApiResult {
    let started_at = Instant::now();
    let result = Route::parse(path).and_then(|route| route_request(store, route, body));
    match &result {
        Ok(_) => debug!(
            "event=api_request module=api status=ok route={} duration_ms={}",
            path.trim(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event=api_request module=api status=error route={} duration_ms={} error_code={}",
            path.trim(),
            started_at.elapsed().as_millis(),
            err.code
        ),
    }
    result
}

fn route_request(store: &Store, route: Route<'_>, body: &Value) -> ApiResult {
    match route.concept {
        "Space" => space_route(store, route.action, body),
        "LocationLog" => location_route(store, route.action, body),
        "Bundle" => bundle_route(store, route.action, body),
        "Item" => item_route(store, route.action, body),
        "User" => user_route(store, route.action, body),
        other => Err(ApiError::invalid_input(format!("unknown concept `{other}`"))),
    }
}

fn space_route(store: &Store, action: &str, body: &Value) -> ApiResult {
    let spaces = store.spaces();
    match action {
        "createSpace" => {
            let req: CreateSpaceRequest = decode(body)?;
            let id = spaces.create_space(
                req.owner.as_str(),
                &req.name,
                &req.space_type,
                req.parent.map(SpaceRef::id),
            )?;
            Ok(json!({ "space": id }))
        }
        "moveSpace" => {
            let req: MoveSpaceRequest = decode(body)?;
            spaces.move_space(
                req.owner.as_str(),
                req.space.id(),
                req.new_parent.map(SpaceRef::id),
            )?;
            Ok(empty())
        }
        "renameSpace" => {
            let req: RenameSpaceRequest = decode(body)?;
            spaces.rename_space(req.owner.as_str(), req.space.id(), &req.new_name)?;
            Ok(empty())
        }
        "deleteSpace" => {
            let req: DeleteSpaceRequest = decode(body)?;
            spaces.delete_space(req.owner.as_str(), req.space.id())?;
            Ok(empty())
        }
        "getSpaceOwner" => {
            let SpaceQuery { space } = decode(body)?;
            Ok(rows("owner", spaces.get_space_owner(space.id())?)?)
        }
        "getSpaceName" => {
            let SpaceQuery { space } = decode(body)?;
            Ok(rows("name", spaces.get_space_name(space.id())?)?)
        }
        "getSpaceType" => {
            let SpaceQuery { space } = decode(body)?;
            Ok(rows("spaceType", spaces.get_space_type(space.id())?)?)
        }
        "getSpaceParent" => {
            let SpaceQuery { space } = decode(body)?;
            Ok(rows("parent", spaces.get_space_parent(space.id())?)?)
        }
        "getSpaceChildren" => {
            let SpaceQuery { space } = decode(body)?;
            Ok(rows("child", spaces.get_space_children(space.id())?)?)
        }
        "getSpaceChildrenString" => {
            let SpaceQuery { space } = decode(body)?;
            Ok(rows("childName", spaces.get_space_children_names(space.id())?)?)
        }
        "getSpace" => {
            let SpaceQuery { space } = decode(body)?;
            Ok(records(spaces.get_space(space.id())?)?)
        }
        "getSpaces" => Ok(records(spaces.get_spaces()?)?),
        "getSpacesByOwner" => {
            let OwnerQuery { owner } = decode(body)?;
            Ok(records(spaces.get_spaces_by_owner(owner.as_str())?)?)
        }
        other => Err(unknown_action("Space", other)),
    }
}

fn location_route(store: &Store, action: &str, body: &Value) -> ApiResult {
    let locations = store.locations();
    match action {
        "createLog" => {
            let req: CreateLogRequest = decode(body)?;
            let log = locations.create_log(req.this_item.id(), req.current_space.id())?;
            Ok(serde_json::to_value(log)?)
        }
        "placeItem" => {
            let req: PlaceItemRequest = decode(body)?;
            locations.place_item(req.link_item.id(), req.link_space.id())?;
            Ok(empty())
        }
        "deleteLog" => {
            let req: DeleteLogRequest = decode(body)?;
            locations.delete_log(req.curr_item.id())?;
            Ok(empty())
        }
        "getItemLog" => {
            let ItemQuery { item } = decode(body)?;
            Ok(records(locations.get_item_log(item.id())?)?)
        }
        "getLogs" => Ok(records(locations.get_logs()?)?),
        other => Err(unknown_action("LocationLog", other)),
    }
}

fn bundle_route(store: &Store, action: &str, body: &Value) -> ApiResult {
    let bundles = store.bundles();
    match action {
        "createBundle" => {
            let req: BundleRequest = decode(body)?;
            let bundle = bundles.create_bundle(req.user.as_str(), &req.name)?;
            Ok(json!({ "bundle": bundle }))
        }
        "deleteBundle" => {
            let req: BundleRequest = decode(body)?;
            bundles.delete_bundle(req.user.as_str(), &req.name)?;
            Ok(empty())
        }
        "addItemToBundle" => {
            let req: BundleItemRequest = decode(body)?;
            bundles.add_item_to_bundle(req.user.as_str(), req.item.id(), &req.bundle_name)?;
            Ok(empty())
        }
        "removeItemFromBundle" => {
            let req: BundleItemRequest = decode(body)?;
            bundles.remove_item_from_bundle(req.user.as_str(), req.item.id(), &req.bundle_name)?;
            Ok(empty())
        }
        "getBundles" => Ok(records(bundles.get_bundles()?)?),
        "getBundlesByUser" => {
            let UserQuery { user } = decode(body)?;
            Ok(records(bundles.get_bundles_by_user(user.as_str())?)?)
        }
        other => Err(unknown_action("Bundle", other)),
    }
}

fn item_route(store: &Store, action: &str, body: &Value) -> ApiResult {
    let items = store.items();
    match action {
        "createItem" => {
            let req: CreateItemRequest = decode(body)?;
            let item = items.create_item(
                req.owner.as_str(),
                &req.name,
                req.description.as_deref(),
                req.category.as_deref(),
            )?;
            Ok(json!({ "item": item }))
        }
        "updateItemDetails" => {
            let req: UpdateItemRequest = decode(body)?;
            let update = ItemDetailsUpdate {
                name: req.name,
                description: req.description,
                category: req.category,
            };
            items.update_item_details(req.owner.as_str(), req.item.id(), &update)?;
            Ok(empty())
        }
        "deleteItem" => {
            let req: DeleteItemRequest = decode(body)?;
            items.delete_item(req.owner.as_str(), req.item.id())?;
            Ok(empty())
        }
        "getItemOwner" => {
            let ItemQuery { item } = decode(body)?;
            Ok(rows("ownerUsername", items.get_item_owner(item.id())?)?)
        }
        "getItemName" => {
            let ItemQuery { item } = decode(body)?;
            Ok(rows("itemName", items.get_item_name(item.id())?)?)
        }
        "getItemDescription" => {
            let ItemQuery { item } = decode(body)?;
            Ok(rows("itemDescription", items.get_item_description(item.id())?)?)
        }
        "getItemCategory" => {
            let ItemQuery { item } = decode(body)?;
            Ok(rows("itemCategory", items.get_item_category(item.id())?)?)
        }
        "getItem" => {
            let ItemQuery { item } = decode(body)?;
            Ok(records(items.get_item(item.id())?)?)
        }
        "getItems" => Ok(records(items.get_items()?)?),
        "getItemsString" => Ok(rows("itemName", items.get_items_string()?)?),
        "getItemsByUser" => {
            let UserQuery { user } = decode(body)?;
            Ok(records(items.get_items_by_user(user.as_str())?)?)
        }
        other => Err(unknown_action("Item", other)),
    }
}

fn user_route(store: &Store, action: &str, body: &Value) -> ApiResult {
    let users = store.users();
    match action {
        "registerUser" => {
            let req: CredentialsRequest = decode(body)?;
            let user = users.register_user(&req.username, &req.password)?;
            Ok(json!({ "user": user }))
        }
        "authenticateUser" => {
            let req: CredentialsRequest = decode(body)?;
            users.authenticate_user(&req.username, &req.password)?;
            Ok(empty())
        }
        "getUserName" => {
            let UserQuery { user } = decode(body)?;
            Ok(rows("username", users.get_user_name(user.as_str())?)?)
        }
        "getUsers" => Ok(records(users.get_users()?)?),
        "getUsersString" => Ok(rows("username", users.get_users_string()?)?),
        other => Err(unknown_action("User", other)),
    }
}

fn decode<T: DeserializeOwned>(body: &Value) -> Result<T, ApiError> {
    serde_json::from_value(body.clone())
        .map_err(|err| ApiError::invalid_input(format!("bad request body: {err}")))
}

fn empty() -> Value {
    json!({})
}

fn unknown_action(concept: &str, action: &str) -> ApiError {
    ApiError::invalid_input(format!("unknown route `{concept}/{action}`"))
}
