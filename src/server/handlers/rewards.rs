//! Reward shop: catalog, redemption and inventory.

use serde_json::json;

use super::super::types::{ApiResponse, ApiState, ClaimRequest, HandlerResult};
use super::{ok_json, parse_body};
use crate::domain::NewRewardItem;

pub fn handle_items_list(state: &ApiState) -> HandlerResult {
    ok_json(&state.engine.rewards().list_items()?)
}

pub fn handle_item_create(state: &ApiState, body: &str) -> HandlerResult {
    let item: NewRewardItem = parse_body(body)?;
    ok_json(&state.engine.catalog_admin().create_item(&item)?)
}

pub fn handle_inventory(state: &ApiState, user_id: &str) -> HandlerResult {
    ok_json(&state.engine.rewards().inventory(user_id)?)
}

pub fn handle_claim(state: &ApiState, body: &str) -> HandlerResult {
    let req: ClaimRequest = parse_body(body)?;
    let redemption = state.engine.rewards().redeem(&req.user_id, &req.item_id)?;
    Ok(ApiResponse::ok(json!({
        "message": "Reward claimed",
        "user": redemption.user,
        "item": redemption.item,
    })))
}
