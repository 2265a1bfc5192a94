//! Achievement rules and per-user unlock state.

use super::super::types::{ApiState, HandlerResult};
use super::{ok_json, parse_body, required_user};
use crate::domain::NewAchievementRule;

pub fn handle_achievements_list(state: &ApiState) -> HandlerResult {
    ok_json(&state.engine.achievements().list()?)
}

pub fn handle_achievement_create(state: &ApiState, body: &str) -> HandlerResult {
    let rule: NewAchievementRule = parse_body(body)?;
    ok_json(&state.engine.catalog_admin().create_rule(&rule)?)
}

pub fn handle_achievement_status(state: &ApiState, query: &str) -> HandlerResult {
    let user_id = required_user(query)?;
    ok_json(&state.engine.achievements().status(&user_id)?)
}

pub fn handle_achievement_check(state: &ApiState, query: &str) -> HandlerResult {
    let user_id = required_user(query)?;
    ok_json(&state.engine.achievements().evaluate(&user_id)?)
}
