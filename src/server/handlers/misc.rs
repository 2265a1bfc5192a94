//! Health, motivation, advisory chat and seeding.

use serde_json::json;

use super::super::types::{ApiResponse, ApiState, ChatRequest, HandlerResult, Health, TriggerQuery};
use super::{ok_json, parse_body, parse_query};
use crate::advisory::{advise_or_placeholder, chat_prompt};
use crate::engine::TRIGGER_TASK_COMPLETED;

pub fn handle_health() -> HandlerResult {
    ok_json(&Health {
        status: "healthy",
        service: "trailquest",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn handle_motivation(state: &ApiState, query: &str) -> HandlerResult {
    let q: TriggerQuery = parse_query(query)?;
    let trigger = q.trigger.as_deref().unwrap_or(TRIGGER_TASK_COMPLETED);
    let message = state.engine.motivation().pick(trigger);
    Ok(ApiResponse::ok(json!({ "trigger": trigger, "message": message })))
}

/// Advisory text is best effort; failures become a placeholder, never an error
pub fn handle_chat(state: &ApiState, body: &str) -> HandlerResult {
    let req: ChatRequest = parse_body(body)?;
    let prompt = chat_prompt(&req.message, &req.user_context);
    let response = advise_or_placeholder(state.advisor.as_ref(), &prompt);
    Ok(ApiResponse::ok(json!({ "response": response })))
}

pub fn handle_seed(state: &ApiState) -> HandlerResult {
    let report = state.engine.seed()?;
    Ok(ApiResponse::ok(json!({
        "message": "Seeded sample data",
        "inserted": report,
    })))
}
