//! HTTP request handlers, one module per resource.

mod achievements;
mod activities;
mod misc;
mod rewards;
mod users;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::types::{ApiError, ApiResponse, HandlerResult, UserQuery};
use crate::error::EngineError;

pub use achievements::{
    handle_achievement_check, handle_achievement_create, handle_achievement_status,
    handle_achievements_list,
};
pub use activities::{
    handle_challenge_complete, handle_challenge_create, handle_challenges_for_route,
    handle_path_create, handle_path_get, handle_path_tasks, handle_paths_list,
    handle_route_complete, handle_route_create, handle_route_waypoints, handle_routes_for_user,
    handle_task_create, handle_task_status,
};
pub use misc::{handle_chat, handle_health, handle_motivation, handle_seed};
pub use rewards::{handle_claim, handle_inventory, handle_item_create, handle_items_list};
pub use users::{handle_leaderboard, handle_user_create, handle_user_get};

/// Decode a JSON request body
pub(crate) fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(ApiError::invalid_json)
}

/// Decode a query string (without the leading `?`)
pub(crate) fn parse_query<T: DeserializeOwned>(query: &str) -> Result<T, ApiError> {
    serde_urlencoded::from_str(query).map_err(ApiError::invalid_query)
}

/// 200 response with a serialized body
pub(crate) fn ok_json<T: Serialize>(value: &T) -> HandlerResult {
    let body = serde_json::to_value(value).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(ApiResponse::ok(body))
}

/// The `user_id` query parameter, which the operation requires
pub(crate) fn required_user(query: &str) -> Result<String, ApiError> {
    let q: UserQuery = parse_query(query)?;
    q.user_id
        .ok_or_else(|| EngineError::invalid("user_id query parameter is required").into())
}
