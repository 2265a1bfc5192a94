//! Core domain types for Trailquest

mod activity;
mod catalog;
mod ids;
mod user;

pub use activity::{
    ActivityKind, Challenge, Difficulty, Location, NewChallenge, NewPath, NewRoute, NewTask, Path,
    Route, Task, TaskStatus,
};
pub use catalog::{
    AchievementRule, ConditionType, MAX_POINTS, MotivationMessage, NewAchievementRule,
    NewRewardItem, ProgressSnapshot, RewardItem, check_points,
};
pub use ids::{new_id, parse_id};
pub use user::{NewUser, User};
