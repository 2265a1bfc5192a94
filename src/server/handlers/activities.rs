//! Routes, challenges, paths and tasks, including completion.

use serde::Serialize;
use serde_json::json;

use super::super::types::{ApiError, ApiState, HandlerResult, PathsQuery, TaskStatusQuery};
use super::{ok_json, parse_body, parse_query, required_user};
use crate::domain::{Difficulty, NewChallenge, NewPath, NewRoute, NewTask};
use crate::engine::{Completed, PathFilter};
use crate::error::EngineError;

pub fn handle_route_create(state: &ApiState, body: &str) -> HandlerResult {
    let route: NewRoute = parse_body(body)?;
    ok_json(&state.engine.activities().create_route(&route)?)
}

pub fn handle_routes_for_user(state: &ApiState, user_id: &str) -> HandlerResult {
    ok_json(&state.engine.activities().routes_for_user(user_id)?)
}

/// The full route record, for drawing it on a map
pub fn handle_route_waypoints(state: &ApiState, route_id: &str) -> HandlerResult {
    ok_json(&state.engine.activities().get_route(route_id)?)
}

pub fn handle_route_complete(state: &ApiState, route_id: &str, query: &str) -> HandlerResult {
    let user_id = required_user(query)?;
    let done = state.engine.completion().complete_route(route_id, &user_id)?;
    completion_body("route", "Route completed successfully", done)
}

pub fn handle_challenge_create(state: &ApiState, body: &str) -> HandlerResult {
    let challenge: NewChallenge = parse_body(body)?;
    ok_json(&state.engine.activities().create_challenge(&challenge)?)
}

pub fn handle_challenges_for_route(state: &ApiState, route_id: &str) -> HandlerResult {
    let challenges = state.engine.activities().challenges_for_route(route_id)?;
    ok_json(&json!({ "challenges": challenges }))
}

pub fn handle_challenge_complete(
    state: &ApiState,
    challenge_id: &str,
    query: &str,
) -> HandlerResult {
    let user_id = required_user(query)?;
    let done = state
        .engine
        .completion()
        .complete_challenge(challenge_id, &user_id)?;
    completion_body("challenge", "Challenge completed successfully", done)
}

pub fn handle_path_create(state: &ApiState, body: &str) -> HandlerResult {
    let path: NewPath = parse_body(body)?;
    ok_json(&state.engine.activities().create_path(&path)?)
}

pub fn handle_paths_list(state: &ApiState, query: &str) -> HandlerResult {
    let q: PathsQuery = parse_query(query)?;
    let difficulty = match q.difficulty.as_deref() {
        None => None,
        Some(raw) => Some(Difficulty::parse(raw).ok_or_else(|| {
            EngineError::invalid(format!(
                "invalid difficulty '{raw}' (expected Easy, Medium or Hard)"
            ))
        })?),
    };
    let filter = PathFilter {
        difficulty,
        ai_suggested: q.ai_suggested,
    };
    ok_json(&state.engine.activities().list_paths(filter)?)
}

pub fn handle_path_get(state: &ApiState, path_id: &str) -> HandlerResult {
    ok_json(&state.engine.activities().get_path(path_id)?)
}

pub fn handle_path_tasks(state: &ApiState, path_id: &str) -> HandlerResult {
    ok_json(&state.engine.activities().tasks_for_path(path_id)?)
}

pub fn handle_task_create(state: &ApiState, body: &str) -> HandlerResult {
    let task: NewTask = parse_body(body)?;
    ok_json(&state.engine.activities().create_task(&task)?)
}

pub fn handle_task_status(state: &ApiState, task_id: &str, query: &str) -> HandlerResult {
    let q: TaskStatusQuery = parse_query(query)?;
    let done = state
        .engine
        .completion()
        .update_task_status(task_id, &q.status, q.user_id.as_deref())?;
    ok_json(&json!({
        "task": done.record,
        "points_awarded": done.outcome.points_awarded,
        "achievement": done.outcome.achievement,
        "motivation": done.outcome.motivation,
        "already_completed": done.outcome.already_completed,
    }))
}

fn completion_body<T: Serialize>(key: &str, message: &str, done: Completed<T>) -> HandlerResult {
    let message = if done.outcome.already_completed {
        "Already completed"
    } else {
        message
    };
    let mut body = json!({
        "message": message,
        "points_awarded": done.outcome.points_awarded,
        "achievement": done.outcome.achievement,
        "motivation": done.outcome.motivation,
        "already_completed": done.outcome.already_completed,
    });
    body[key] = serde_json::to_value(&done.record).map_err(|e| ApiError::Internal(e.to_string()))?;
    ok_json(&body)
}
