//! Request routing
//!
//! [`dispatch`] maps a method, path, query string and body to an
//! [`ApiResponse`] without touching sockets, so every endpoint can be
//! exercised directly in tests.

use tracing::debug;

use super::handlers::*;
use super::types::{ApiError, ApiResponse, ApiState, HandlerResult};

/// Route one request to its handler
pub fn dispatch(state: &ApiState, method: &str, path: &str, query: &str, body: &str) -> ApiResponse {
    debug!("[trailquest:http] {} {}", method, path);
    route(state, method, path, query, body).unwrap_or_else(|err| err.into_response(method, path))
}

fn route(state: &ApiState, method: &str, path: &str, query: &str, body: &str) -> HandlerResult {
    let segments: Vec<&str> = path
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    let ["api", rest @ ..] = segments.as_slice() else {
        return Err(ApiError::NotFound);
    };

    match (method, rest) {
        ("GET", ["health"]) => handle_health(),

        ("POST", ["users"]) => handle_user_create(state, body),
        ("GET", ["users", id]) => handle_user_get(state, id),
        ("GET", ["leaderboard"]) => handle_leaderboard(state, query),

        ("POST", ["routes"]) => handle_route_create(state, body),
        ("GET", ["routes", "user", user_id]) => handle_routes_for_user(state, user_id),
        ("GET", ["routes", id, "waypoints"]) => handle_route_waypoints(state, id),
        ("PATCH", ["routes", id, "complete"]) => handle_route_complete(state, id, query),

        ("POST", ["challenges"]) => handle_challenge_create(state, body),
        ("GET", ["challenges", "route", route_id]) => handle_challenges_for_route(state, route_id),
        ("PATCH", ["challenges", id, "complete"]) => handle_challenge_complete(state, id, query),

        ("POST", ["paths"]) => handle_path_create(state, body),
        ("GET", ["paths"]) => handle_paths_list(state, query),
        ("GET", ["paths", id]) => handle_path_get(state, id),
        ("GET", ["paths", id, "tasks"]) => handle_path_tasks(state, id),

        ("POST", ["tasks"]) => handle_task_create(state, body),
        ("PATCH", ["tasks", id, "status"]) => handle_task_status(state, id, query),

        ("GET", ["achievements"]) => handle_achievements_list(state),
        ("POST", ["achievements"]) => handle_achievement_create(state, body),
        ("GET", ["achievements", "status"]) => handle_achievement_status(state, query),
        ("POST", ["achievements", "check"]) => handle_achievement_check(state, query),

        ("GET", ["rewards", "items"]) => handle_items_list(state),
        ("POST", ["rewards", "items"]) => handle_item_create(state, body),
        ("GET", ["rewards", "user", user_id, "inventory"]) => handle_inventory(state, user_id),
        ("POST", ["rewards", "claim"]) => handle_claim(state, body),

        ("GET", ["motivation"]) => handle_motivation(state, query),
        ("POST", ["chat"]) => handle_chat(state, body),
        ("POST", ["seed"]) => handle_seed(state),

        (_, rest) if is_known(rest) => Err(ApiError::MethodNotAllowed),
        _ => Err(ApiError::NotFound),
    }
}

/// Whether some method is routed for this path shape
fn is_known(rest: &[&str]) -> bool {
    matches!(
        rest,
        ["health"]
            | ["users"]
            | ["users", _]
            | ["leaderboard"]
            | ["routes"]
            | ["routes", "user", _]
            | ["routes", _, "waypoints" | "complete"]
            | ["challenges"]
            | ["challenges", "route", _]
            | ["challenges", _, "complete"]
            | ["paths"]
            | ["paths", _]
            | ["paths", _, "tasks"]
            | ["tasks"]
            | ["tasks", _, "status"]
            | ["achievements"]
            | ["achievements", "status" | "check"]
            | ["rewards", "items" | "claim"]
            | ["rewards", "user", _, "inventory"]
            | ["motivation"]
            | ["chat"]
            | ["seed"]
    )
}
