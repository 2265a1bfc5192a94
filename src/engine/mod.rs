//! Progression & rewards engine
//!
//! Owns every rule that moves points: completions credit the ledger once,
//! achievements unlock once per user, and redemptions debit atomically with
//! the affordability check. State lives in a SQLite database
//! (`~/.trailquest/trailquest.db` by default).
//!
//! # Architecture
//!
//! ```text
//!  complete_* ──► ActivityCompletion ──► ledger::credit_in
//!                        │                      ▲
//!                        ├──► evaluate_in ──────┘
//!                        └──► MotivationSelector (after commit)
//!
//!  redeem ──────► RewardShop ──► ledger::debit_in
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let engine = Engine::open(&db_path, RewardSettings::default())?;
//! let done = engine.completion().complete_route(&route_id, &user_id)?;
//! let bought = engine.rewards().redeem(&user_id, &item_id)?;
//! ```

mod activities;
pub mod achievements;
mod catalog;
mod completion;
mod db;
mod ledger;
mod motivation;
mod rewards;
mod seed;
mod users;

pub use achievements::{
    AchievementEvaluator, AchievementResult, AchievementStatus, LEVELS, Level, LevelProgress,
};
pub use activities::{ActivityStore, PathFilter};
pub use catalog::{CatalogRepository, SqliteCatalog};
pub use completion::{ActivityCompletion, Completed, CompletionOutcome};
pub use db::EngineDb;
pub use ledger::{Ledger, LedgerEntry, LedgerReason};
pub use motivation::{
    MotivationSelector, TRIGGER_DAILY_LOGIN, TRIGGER_ROUTE_COMPLETED, TRIGGER_TASK_COMPLETED,
};
pub use rewards::{Redemption, RewardShop};
pub use seed::{SeedReport, Seeder};
pub use users::UserDirectory;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;

/// Point values and limits applied by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardSettings {
    /// Credited on the first completion of any route
    pub route_completion_points: i64,
    /// Used when a challenge is created without `points`
    pub default_challenge_points: i64,
    /// Used when a task is created without `reward_points`
    pub default_task_points: i64,
    /// Badge granted on every first route completion
    pub route_badge: String,
    /// Upper bound for leaderboard requests
    pub leaderboard_max: usize,
}

impl Default for RewardSettings {
    fn default() -> Self {
        Self {
            route_completion_points: 50,
            default_challenge_points: 10,
            default_task_points: 10,
            route_badge: "Route Completer".to_string(),
            leaderboard_max: 100,
        }
    }
}

pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

/// Central handle to the engine
///
/// Cheap to clone; every component shares the same database connection and
/// catalog.
#[derive(Clone)]
pub struct Engine {
    db: EngineDb,
    catalog: Arc<dyn CatalogRepository>,
    admin: SqliteCatalog,
    settings: RewardSettings,
}

impl Engine {
    /// Open the engine on a database file, using the stored catalog
    pub fn open(path: &Path, settings: RewardSettings) -> Result<Self> {
        let db = EngineDb::open(path)?;
        let admin = SqliteCatalog::new(db.clone());
        Ok(Self {
            catalog: Arc::new(admin.clone()),
            db,
            admin,
            settings,
        })
    }

    /// Replace the catalog the progression rules read from
    pub fn with_catalog(mut self, catalog: Arc<dyn CatalogRepository>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn settings(&self) -> &RewardSettings {
        &self.settings
    }

    pub fn users(&self) -> UserDirectory {
        UserDirectory::new(self.db.clone())
    }

    pub fn ledger(&self) -> Ledger {
        Ledger::new(self.db.clone())
    }

    pub fn activities(&self) -> ActivityStore {
        ActivityStore::new(self.db.clone(), self.settings.clone())
    }

    pub fn achievements(&self) -> AchievementEvaluator {
        AchievementEvaluator::new(self.db.clone(), self.catalog.clone())
    }

    pub fn rewards(&self) -> RewardShop {
        RewardShop::new(self.db.clone(), self.catalog.clone())
    }

    pub fn motivation(&self) -> MotivationSelector {
        MotivationSelector::new(self.catalog.clone())
    }

    pub fn completion(&self) -> ActivityCompletion {
        ActivityCompletion::new(
            self.db.clone(),
            self.catalog.clone(),
            self.motivation(),
            self.settings.clone(),
        )
    }

    /// Authoring access to the stored catalog
    pub fn catalog_admin(&self) -> &SqliteCatalog {
        &self.admin
    }

    /// Users ranked by balance; `limit` is clamped to `1..=leaderboard_max`
    pub fn leaderboard(&self, limit: Option<usize>) -> EngineResult<Vec<crate::domain::User>> {
        let limit = limit
            .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
            .clamp(1, self.settings.leaderboard_max.max(1));
        self.users().leaderboard(limit)
    }

    /// Insert the sample catalog and paths where their tables are empty
    pub fn seed(&self) -> EngineResult<SeedReport> {
        Seeder::new(&self.db, &self.settings).run()
    }
}
