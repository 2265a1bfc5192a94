//! Level system
//!
//! Levels are a display projection of the point balance. Nothing in the
//! engine reads them back, so spending points can lower a level.

use serde::Serialize;

/// Level definition
#[derive(Debug, Clone, Serialize)]
pub struct Level {
    pub level: u32,
    pub points_required: i64,
    pub title: &'static str,
}

/// All level definitions (must be sorted by level)
pub static LEVELS: &[Level] = &[
    Level { level: 1, points_required: 0, title: "Wanderer" },
    Level { level: 2, points_required: 50, title: "Day Tripper" },
    Level { level: 3, points_required: 150, title: "Day Tripper" },
    Level { level: 4, points_required: 300, title: "Explorer" },
    Level { level: 5, points_required: 500, title: "Explorer" },
    Level { level: 6, points_required: 750, title: "Pathfinder" },
    Level { level: 7, points_required: 1000, title: "Pathfinder" },
    Level { level: 8, points_required: 1400, title: "Voyager" },
    Level { level: 9, points_required: 1900, title: "Voyager" },
    Level { level: 10, points_required: 2500, title: "Globetrotter" },
    Level { level: 11, points_required: 3500, title: "Globetrotter" },
    Level { level: 12, points_required: 5000, title: "Trailblazer" },
    Level { level: 13, points_required: 7000, title: "Trailblazer" },
    Level { level: 14, points_required: 10000, title: "Cartographer" },
    Level { level: 15, points_required: 15000, title: "Legend of the Road" },
];

impl Level {
    /// Level and title for a balance
    pub fn for_points(points: i64) -> &'static Level {
        LEVELS
            .iter()
            .rev()
            .find(|l| points >= l.points_required)
            .unwrap_or(&LEVELS[0])
    }

    /// Points needed for the next level (None at max level)
    pub fn points_for_next(current_level: u32) -> Option<i64> {
        LEVELS
            .iter()
            .find(|l| l.level == current_level + 1)
            .map(|l| l.points_required)
    }

    pub fn max_level() -> u32 {
        LEVELS.last().map(|l| l.level).unwrap_or(1)
    }
}

/// Level progress for a balance, as shown on profiles
#[derive(Debug, Clone, Serialize)]
pub struct LevelProgress {
    pub total_points: i64,
    pub level: u32,
    pub title: String,
    pub current_level_points: i64,
    pub next_level_points: Option<i64>,
}

impl LevelProgress {
    pub fn new(total_points: i64) -> Self {
        let level = Level::for_points(total_points);
        Self {
            total_points,
            level: level.level,
            title: level.title.to_string(),
            current_level_points: level.points_required,
            next_level_points: Level::points_for_next(level.level),
        }
    }

    /// Progress to the next level (0.0 - 1.0)
    pub fn progress_to_next(&self) -> f32 {
        match self.next_level_points {
            Some(next) => {
                let span = next - self.current_level_points;
                if span <= 0 {
                    1.0
                } else {
                    (self.total_points - self.current_level_points) as f32 / span as f32
                }
            }
            None => 1.0,
        }
    }

    pub fn is_max_level(&self) -> bool {
        self.next_level_points.is_none()
    }
}
