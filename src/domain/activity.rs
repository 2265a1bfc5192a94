//! Completable activity records: routes, challenges, paths and tasks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Named map coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
}

/// The kind of activity being completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Route,
    Challenge,
    Task,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Route => "route",
            Self::Challenge => "challenge",
            Self::Task => "task",
        }
    }

    /// Record label used in `NotFound` errors
    pub fn label(&self) -> &'static str {
        match self {
            Self::Route => "Route",
            Self::Challenge => "Challenge",
            Self::Task => "Task",
        }
    }

    /// Motivation trigger emitted on first completion
    pub fn trigger(&self) -> &'static str {
        match self {
            Self::Route => "route_completed",
            Self::Challenge | Self::Task => "task_completed",
        }
    }
}

/// A planned trip between two locations owned by one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub user_id: String,
    pub start: Location,
    pub end: Location,
    #[serde(default)]
    pub waypoints: Vec<Location>,
    /// "fastest", "scenic" or "cheapest"
    pub route_type: String,
    pub distance: Option<f64>,
    pub duration: Option<f64>,
    pub points_earned: i64,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRoute {
    pub user_id: String,
    pub start: Location,
    pub end: Location,
    #[serde(default)]
    pub waypoints: Vec<Location>,
    pub route_type: String,
    pub distance: Option<f64>,
    pub duration: Option<f64>,
}

/// A one-off objective attached to a route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    pub route_id: String,
    /// "photo", "food", "location" or "hidden_gem"
    #[serde(rename = "type")]
    pub challenge_type: String,
    pub title: String,
    pub description: String,
    pub location: Location,
    pub points: i64,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewChallenge {
    pub route_id: String,
    #[serde(rename = "type")]
    pub challenge_type: String,
    pub title: String,
    pub description: String,
    pub location: Location,
    pub points: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Easy" => Some(Self::Easy),
            "Medium" => Some(Self::Medium),
            "Hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

/// A curated walk that groups tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Path {
    pub id: String,
    pub name: String,
    pub start_point: Location,
    pub end_point: Location,
    pub difficulty: Difficulty,
    pub ai_suggested: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPath {
    pub name: String,
    pub start_point: Location,
    pub end_point: Location,
    #[serde(default = "default_difficulty")]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub ai_suggested: bool,
}

fn default_difficulty() -> Difficulty {
    Difficulty::Easy
}

/// Task lifecycle. Only the first entry into `Completed` has effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }

    /// Parse a wire value, rejecting anything outside the lifecycle
    pub fn parse(s: &str) -> Result<Self, EngineError> {
        match s {
            "Not Started" => Ok(Self::NotStarted),
            "In Progress" => Ok(Self::InProgress),
            "Completed" => Ok(Self::Completed),
            other => Err(EngineError::invalid(format!(
                "invalid status value '{other}' (expected Not Started, In Progress or Completed)"
            ))),
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub path_id: String,
    pub task_description: String,
    pub reward_points: i64,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub path_id: String,
    pub task_description: String,
    pub reward_points: Option<i64>,
}
