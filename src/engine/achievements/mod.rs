//! Achievement system
//!
//! Threshold rules evaluated after every completion, plus the display
//! levels derived from the point balance.

mod evaluator;
mod levels;

pub(crate) use evaluator::evaluate_in;
pub use evaluator::{AchievementEvaluator, AchievementResult, AchievementStatus};
pub use levels::{LEVELS, Level, LevelProgress};
