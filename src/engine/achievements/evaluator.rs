//! Achievement evaluation
//!
//! Rules are checked against one progress snapshot taken before any unlock,
//! so a batch of unlocks sees consistent thresholds. A rule's reward counts
//! only when its `(user, title)` row is inserted by this call, which keeps
//! concurrent evaluations from paying the same achievement twice.

use std::collections::HashSet;
use std::sync::Arc;

use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{AchievementRule, ProgressSnapshot, new_id, parse_id};
use crate::engine::catalog::CatalogRepository;
use crate::engine::db::EngineDb;
use crate::engine::ledger::{self, LedgerReason};
use crate::engine::users::{add_badge, load_user, now_ms};
use crate::error::{EngineError, EngineResult};

/// Outcome of one evaluation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AchievementResult {
    pub unlocked: Vec<String>,
    pub awarded_points: i64,
}

impl AchievementResult {
    pub fn is_empty(&self) -> bool {
        self.unlocked.is_empty()
    }
}

/// A rule together with whether a user already owns it
#[derive(Debug, Clone, Serialize)]
pub struct AchievementStatus {
    #[serde(flatten)]
    pub rule: AchievementRule,
    pub unlocked: bool,
}

/// Grants achievements whose thresholds a user has reached
#[derive(Clone)]
pub struct AchievementEvaluator {
    db: EngineDb,
    catalog: Arc<dyn CatalogRepository>,
}

impl AchievementEvaluator {
    pub fn new(db: EngineDb, catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { db, catalog }
    }

    /// Unlock every newly met rule for a user.
    ///
    /// Runs opportunistically after completions, so an unknown or malformed
    /// user id yields an empty result rather than an error.
    pub fn evaluate(&self, user_id: &str) -> EngineResult<AchievementResult> {
        let Ok(user_id) = parse_id("user", user_id) else {
            return Ok(AchievementResult::default());
        };
        let rules = self.catalog.achievement_rules()?;
        self.db
            .write(|tx| evaluate_in(tx, &user_id, &rules, now_ms()))
    }

    /// All rules in the catalog
    pub fn list(&self) -> EngineResult<Vec<AchievementRule>> {
        self.catalog.achievement_rules()
    }

    /// Every rule with the user's unlock state
    pub fn status(&self, user_id: &str) -> EngineResult<Vec<AchievementStatus>> {
        let user_id = parse_id("user", user_id)?;
        let user = {
            let conn = self.db.conn();
            load_user(&conn, &user_id)?
        }
        .ok_or_else(|| EngineError::not_found("User", &user_id))?;

        let statuses = self
            .catalog
            .achievement_rules()?
            .into_iter()
            .map(|rule| AchievementStatus {
                unlocked: user.has_achievement(&rule.title),
                rule,
            })
            .collect();
        Ok(statuses)
    }
}

/// Evaluate inside an open transaction
pub(crate) fn evaluate_in(
    conn: &Connection,
    user_id: &str,
    rules: &[AchievementRule],
    now: i64,
) -> EngineResult<AchievementResult> {
    let Some((progress, owned)) = snapshot(conn, user_id)? else {
        debug!("[trailquest:achievements] No user {}, skipping evaluation", user_id);
        return Ok(AchievementResult::default());
    };

    let newly_met: Vec<&AchievementRule> = rules
        .iter()
        .filter(|rule| !owned.contains(&rule.title) && rule.is_met(&progress))
        .collect();

    let mut result = AchievementResult::default();
    for rule in newly_met {
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO user_achievements (user_id, title, unlocked_at) VALUES (?1, ?2, ?3)",
            (user_id, &rule.title, now),
        )?;
        add_badge(conn, user_id, &rule.title, now)?;

        if inserted == 1 {
            result.unlocked.push(rule.title.clone());
            result.awarded_points += rule.reward_points;
        }
    }

    if result.awarded_points > 0 {
        let batch = new_id();
        ledger::credit_in(
            conn,
            user_id,
            result.awarded_points,
            LedgerReason::AchievementUnlocked,
            Some(&format!("{}:{}", batch, result.unlocked.join(","))),
        )?;
    }

    if !result.is_empty() {
        info!(
            "[trailquest:achievements] {} unlocked {:?} (+{} pts)",
            user_id, result.unlocked, result.awarded_points
        );
    }
    Ok(result)
}

/// Counters and owned titles as of now
fn snapshot(
    conn: &Connection,
    user_id: &str,
) -> EngineResult<Option<(ProgressSnapshot, HashSet<String>)>> {
    let progress = conn
        .query_row(
            "SELECT total_points, routes_completed FROM users WHERE id = ?1",
            [user_id],
            |r| {
                Ok(ProgressSnapshot {
                    total_points: r.get(0)?,
                    routes_completed: r.get(1)?,
                })
            },
        )
        .optional()?;
    let Some(progress) = progress else {
        return Ok(None);
    };

    let mut stmt = conn.prepare("SELECT title FROM user_achievements WHERE user_id = ?1")?;
    let owned = stmt
        .query_map([user_id], |r| r.get::<_, String>(0))?
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(Some((progress, owned)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConditionType, NewAchievementRule, NewUser};
    use crate::engine::catalog::SqliteCatalog;
    use crate::engine::ledger::Ledger;
    use crate::engine::users::UserDirectory;
    use tempfile::tempdir;

    struct Fixture {
        _dir: tempfile::TempDir,
        users: UserDirectory,
        ledger: Ledger,
        catalog: SqliteCatalog,
        evaluator: AchievementEvaluator,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let db = EngineDb::open(&dir.path().join("ach.db")).unwrap();
        let catalog = SqliteCatalog::new(db.clone());
        Fixture {
            users: UserDirectory::new(db.clone()),
            ledger: Ledger::new(db.clone()),
            evaluator: AchievementEvaluator::new(db, Arc::new(catalog.clone())),
            catalog,
            _dir: dir,
        }
    }

    fn add_rule(f: &Fixture, title: &str, condition_type: ConditionType, value: i64, reward: i64) {
        f.catalog
            .create_rule(&NewAchievementRule {
                title: title.to_string(),
                condition_type,
                condition_value: value,
                reward_points: reward,
                badge_icon: None,
            })
            .unwrap();
    }

    fn user(f: &Fixture) -> String {
        f.users
            .create(&NewUser {
                name: "Rae".to_string(),
                email: "rae@example.com".to_string(),
            })
            .unwrap()
            .id
    }

    #[test]
    fn test_unlock_once() {
        let f = fixture();
        add_rule(&f, "Explorer Badge", ConditionType::Points, 100, 50);
        let id = user(&f);
        f.ledger.credit(&id, 100, LedgerReason::Adjustment).unwrap();

        let first = f.evaluator.evaluate(&id).unwrap();
        assert_eq!(first.unlocked, vec!["Explorer Badge".to_string()]);
        assert_eq!(first.awarded_points, 50);

        let second = f.evaluator.evaluate(&id).unwrap();
        assert!(second.is_empty());
        assert_eq!(second.awarded_points, 0);

        let loaded = f.users.get(&id).unwrap();
        assert_eq!(loaded.total_points, 150);
        assert_eq!(loaded.achievements, vec!["Explorer Badge".to_string()]);
        assert_eq!(loaded.badges, vec!["Explorer Badge".to_string()]);
    }

    #[test]
    fn test_batch_uses_pre_evaluation_snapshot() {
        let f = fixture();
        // Reward of the first rule would satisfy the second if re-read
        add_rule(&f, "Fifty", ConditionType::Points, 50, 60);
        add_rule(&f, "Hundred", ConditionType::Points, 100, 10);
        let id = user(&f);
        f.ledger.credit(&id, 50, LedgerReason::Adjustment).unwrap();

        let result = f.evaluator.evaluate(&id).unwrap();
        assert_eq!(result.unlocked, vec!["Fifty".to_string()]);

        // The next pass sees the new balance
        let next = f.evaluator.evaluate(&id).unwrap();
        assert_eq!(next.unlocked, vec!["Hundred".to_string()]);
        assert_eq!(f.users.get(&id).unwrap().total_points, 120);
    }

    #[test]
    fn test_batch_is_a_single_credit() {
        let f = fixture();
        add_rule(&f, "A", ConditionType::Points, 10, 5);
        add_rule(&f, "B", ConditionType::Points, 20, 7);
        let id = user(&f);
        f.ledger.credit(&id, 20, LedgerReason::Adjustment).unwrap();

        let result = f.evaluator.evaluate(&id).unwrap();
        assert_eq!(result.awarded_points, 12);

        let entries = f.ledger.entries(&id, 10).unwrap();
        let unlock_credits: Vec<_> = entries
            .iter()
            .filter(|e| e.reason == LedgerReason::AchievementUnlocked)
            .collect();
        assert_eq!(unlock_credits.len(), 1);
        assert_eq!(unlock_credits[0].delta, 12);
    }

    #[test]
    fn test_zero_reward_rule_still_unlocks() {
        let f = fixture();
        add_rule(&f, "First Steps", ConditionType::RoutesCompleted, 0, 0);
        let id = user(&f);
        let result = f.evaluator.evaluate(&id).unwrap();
        assert_eq!(result.unlocked, vec!["First Steps".to_string()]);
        assert_eq!(result.awarded_points, 0);
        assert!(f.ledger.entries(&id, 10).unwrap().is_empty());
    }

    #[test]
    fn test_missing_or_malformed_user_is_noop() {
        let f = fixture();
        add_rule(&f, "Anything", ConditionType::Points, 0, 10);
        assert_eq!(
            f.evaluator.evaluate(&new_id()).unwrap(),
            AchievementResult::default()
        );
        assert_eq!(
            f.evaluator.evaluate("garbage").unwrap(),
            AchievementResult::default()
        );
    }

    #[test]
    fn test_status_flags() {
        let f = fixture();
        add_rule(&f, "Explorer Badge", ConditionType::Points, 100, 50);
        add_rule(&f, "Trailblazer Badge", ConditionType::RoutesCompleted, 5, 75);
        let id = user(&f);
        f.ledger.credit(&id, 100, LedgerReason::Adjustment).unwrap();
        f.evaluator.evaluate(&id).unwrap();

        let status = f.evaluator.status(&id).unwrap();
        assert_eq!(status.len(), 2);
        assert!(status[0].unlocked);
        assert!(!status[1].unlocked);

        assert_eq!(f.evaluator.status(&new_id()).unwrap_err().reason(), "not_found");
    }
}
