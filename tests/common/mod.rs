//! Shared test utilities for engine integration tests

#![allow(dead_code)]

use tempfile::TempDir;

use trailquest::domain::{
    AchievementRule, Challenge, ConditionType, Location, NewAchievementRule, NewChallenge,
    NewRewardItem, NewRoute, NewUser, RewardItem, Route,
};
use trailquest::engine::{Engine, LedgerReason, RewardSettings};

/// An engine on a fresh database; the directory lives as long as the struct
pub struct TestEngine {
    pub dir: TempDir,
    pub engine: Engine,
}

/// Creates an engine backed by a temporary on-disk database
pub fn test_engine() -> TestEngine {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let engine = Engine::open(&dir.path().join("trailquest.db"), RewardSettings::default())
        .expect("Failed to open engine");
    TestEngine { dir, engine }
}

pub fn location(name: &str) -> Location {
    Location {
        latitude: 48.8566,
        longitude: 2.3522,
        name: name.to_string(),
    }
}

pub fn create_user(engine: &Engine, name: &str) -> String {
    engine
        .users()
        .create(&NewUser {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
        })
        .expect("Failed to create user")
        .id
}

/// Creates a user and credits `points` as an adjustment
pub fn funded_user(engine: &Engine, name: &str, points: i64) -> String {
    let id = create_user(engine, name);
    if points > 0 {
        engine
            .ledger()
            .credit(&id, points, LedgerReason::Adjustment)
            .expect("Failed to credit user");
    }
    id
}

pub fn create_route(engine: &Engine, user_id: &str) -> Route {
    engine
        .activities()
        .create_route(&NewRoute {
            user_id: user_id.to_string(),
            start: location("Gare du Nord"),
            end: location("Louvre"),
            waypoints: vec![location("Opéra")],
            route_type: "walking".to_string(),
            distance: Some(3.2),
            duration: Some(45.0),
        })
        .expect("Failed to create route")
}

pub fn create_challenge(engine: &Engine, route_id: &str, points: i64) -> Challenge {
    engine
        .activities()
        .create_challenge(&NewChallenge {
            route_id: route_id.to_string(),
            challenge_type: "photo".to_string(),
            title: "Photograph the pyramid".to_string(),
            description: "Get the glass pyramid in frame".to_string(),
            location: location("Louvre"),
            points: Some(points),
        })
        .expect("Failed to create challenge")
}

pub fn points_rule(engine: &Engine, title: &str, threshold: i64, reward: i64) -> AchievementRule {
    engine
        .catalog_admin()
        .create_rule(&NewAchievementRule {
            title: title.to_string(),
            condition_type: ConditionType::Points,
            condition_value: threshold,
            reward_points: reward,
            badge_icon: None,
        })
        .expect("Failed to create rule")
}

pub fn reward_item(engine: &Engine, name: &str, cost: i64) -> RewardItem {
    engine
        .catalog_admin()
        .create_item(&NewRewardItem {
            item_name: name.to_string(),
            cost,
            category: "Badge".to_string(),
        })
        .expect("Failed to create item")
}
