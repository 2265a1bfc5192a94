use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::Level;

/// A traveller and their progression state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Spendable balance, never negative
    pub total_points: i64,
    /// Display level derived from `total_points`
    pub level: u32,
    pub level_title: String,
    /// Titles shown on the profile (achievements plus activity badges)
    pub badges: Vec<String>,
    /// Granted achievement titles, one entry per title
    pub achievements: Vec<String>,
    pub routes_completed: i64,
    /// Reward item ids owned by this user
    pub rewards_owned: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Attach the display level for the current balance
    pub(crate) fn with_level(mut self) -> Self {
        let level = Level::for_points(self.total_points);
        self.level = level.level;
        self.level_title = level.title.to_string();
        self
    }

    pub fn has_achievement(&self, title: &str) -> bool {
        self.achievements.iter().any(|a| a == title)
    }
}

/// Registration payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}
