//! User registration and the leaderboard.

use super::super::types::{ApiState, HandlerResult, LimitQuery};
use super::{ok_json, parse_body, parse_query};
use crate::domain::NewUser;

pub fn handle_user_create(state: &ApiState, body: &str) -> HandlerResult {
    let new_user: NewUser = parse_body(body)?;
    ok_json(&state.engine.users().create(&new_user)?)
}

pub fn handle_user_get(state: &ApiState, user_id: &str) -> HandlerResult {
    ok_json(&state.engine.users().get(user_id)?)
}

pub fn handle_leaderboard(state: &ApiState, query: &str) -> HandlerResult {
    let q: LimitQuery = parse_query(query)?;
    ok_json(&state.engine.leaderboard(q.limit)?)
}
