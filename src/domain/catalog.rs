//! Catalog entries: achievement rules, reward items and motivation messages
//!
//! All of these are immutable once created and read-only to the engine.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Largest point value a catalog or activity record may carry
pub const MAX_POINTS: i64 = 1_000_000_000;

/// Reject point values outside `0..=MAX_POINTS`
pub fn check_points(field: &str, value: i64) -> Result<(), EngineError> {
    if !(0..=MAX_POINTS).contains(&value) {
        return Err(EngineError::invalid(format!(
            "{field} must be between 0 and {MAX_POINTS}, got {value}"
        )));
    }
    Ok(())
}

/// Which progress counter an achievement rule compares against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    Points,
    RoutesCompleted,
}

impl ConditionType {
    /// Get the string ID for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Points => "points",
            Self::RoutesCompleted => "routes_completed",
        }
    }

    /// Parse from database string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "points" => Some(Self::Points),
            "routes_completed" => Some(Self::RoutesCompleted),
            _ => None,
        }
    }
}

/// Counters an achievement rule can be evaluated against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub total_points: i64,
    pub routes_completed: i64,
}

/// A named rule granting a one-time point reward at a threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementRule {
    pub id: String,
    /// Unique key, also the at-most-once token in a user's achievement set
    pub title: String,
    pub condition_type: ConditionType,
    pub condition_value: i64,
    pub reward_points: i64,
    pub badge_icon: Option<String>,
}

impl AchievementRule {
    /// Inclusive threshold check against a progress snapshot
    pub fn is_met(&self, progress: &ProgressSnapshot) -> bool {
        let counter = match self.condition_type {
            ConditionType::Points => progress.total_points,
            ConditionType::RoutesCompleted => progress.routes_completed,
        };
        counter >= self.condition_value
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAchievementRule {
    pub title: String,
    pub condition_type: ConditionType,
    pub condition_value: i64,
    #[serde(default)]
    pub reward_points: i64,
    pub badge_icon: Option<String>,
}

/// A purchasable catalog item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardItem {
    pub id: String,
    pub item_name: String,
    pub cost: i64,
    /// "Badge", "Boost" or "Cosmetic" (display only)
    pub category: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRewardItem {
    pub item_name: String,
    pub cost: i64,
    pub category: String,
}

/// Stored feedback string for a trigger event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotivationMessage {
    pub id: String,
    pub trigger_event: String,
    pub message_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(condition_type: ConditionType, value: i64) -> AchievementRule {
        AchievementRule {
            id: "r".to_string(),
            title: "Rule".to_string(),
            condition_type,
            condition_value: value,
            reward_points: 10,
            badge_icon: None,
        }
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let progress = ProgressSnapshot {
            total_points: 50,
            routes_completed: 4,
        };
        assert!(rule(ConditionType::Points, 50).is_met(&progress));
        assert!(!rule(ConditionType::Points, 51).is_met(&progress));
        assert!(!rule(ConditionType::RoutesCompleted, 5).is_met(&progress));
        assert!(rule(ConditionType::RoutesCompleted, 4).is_met(&progress));
    }

    #[test]
    fn test_point_bounds() {
        assert!(check_points("cost", 0).is_ok());
        assert!(check_points("cost", MAX_POINTS).is_ok());
        assert_eq!(check_points("cost", -1).unwrap_err().reason(), "invalid_argument");
        assert_eq!(
            check_points("reward_points", i64::MAX).unwrap_err().reason(),
            "invalid_argument"
        );
    }

    #[test]
    fn test_condition_type_roundtrip_names() {
        for ct in [ConditionType::Points, ConditionType::RoutesCompleted] {
            assert_eq!(ConditionType::from_str(ct.as_str()), Some(ct));
        }
        assert_eq!(ConditionType::from_str("streak"), None);
    }
}
