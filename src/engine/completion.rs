//! Idempotent completion of routes, challenges and tasks
//!
//! Each instance carries a nullable `completed_at`. The first completion
//! claims it with `UPDATE ... WHERE completed_at IS NULL`; whoever changes
//! the row pays out, everyone else gets a zero outcome. The claim, the
//! credit and the achievement pass share one transaction, so a failure
//! anywhere leaves the instance claimable again.

use std::sync::Arc;

use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info};

use super::RewardSettings;
use super::achievements::{AchievementResult, evaluate_in};
use super::activities::{load_challenge, load_route, load_task};
use super::catalog::CatalogRepository;
use super::db::EngineDb;
use super::ledger::{self, LedgerReason};
use super::motivation::MotivationSelector;
use super::users::{add_badge, now_ms, require_user};
use crate::domain::{
    AchievementRule, ActivityKind, Challenge, Route, Task, TaskStatus, parse_id,
};
use crate::error::{EngineError, EngineResult};

/// What a completion request produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct CompletionOutcome {
    pub points_awarded: i64,
    pub achievement: AchievementResult,
    pub motivation: Option<String>,
    /// The instance had already been completed; nothing was awarded
    pub already_completed: bool,
}

impl CompletionOutcome {
    fn replay() -> Self {
        Self {
            already_completed: true,
            ..Self::default()
        }
    }
}

/// The updated record together with its outcome
#[derive(Debug, Clone, Serialize)]
pub struct Completed<T> {
    pub record: T,
    #[serde(flatten)]
    pub outcome: CompletionOutcome,
}

/// Rewards earned inside the claiming transaction
struct Payout {
    points: i64,
    achievement: AchievementResult,
}

#[derive(Clone)]
pub struct ActivityCompletion {
    db: EngineDb,
    catalog: Arc<dyn CatalogRepository>,
    motivation: MotivationSelector,
    settings: RewardSettings,
}

impl ActivityCompletion {
    pub fn new(
        db: EngineDb,
        catalog: Arc<dyn CatalogRepository>,
        motivation: MotivationSelector,
        settings: RewardSettings,
    ) -> Self {
        Self {
            db,
            catalog,
            motivation,
            settings,
        }
    }

    /// Complete a route for a user.
    ///
    /// First completion credits the configured route points, bumps
    /// `routes_completed` and grants the route badge.
    pub fn complete_route(&self, route_id: &str, user_id: &str) -> EngineResult<Completed<Route>> {
        let route_id = parse_id("route", route_id)?;
        let user_id = parse_id("user", user_id)?;
        let rules = self.catalog.achievement_rules()?;
        let points = self.settings.route_completion_points;

        let (route, payout) = self.db.write(|tx| {
            if load_route(tx, &route_id)?.is_none() {
                return Err(EngineError::not_found("Route", &route_id));
            }
            require_user(tx, &user_id)?;

            let now = now_ms();
            let claimed = tx.execute(
                "UPDATE routes SET completed = 1, completed_at = ?1, points_earned = ?2
                 WHERE id = ?3 AND completed_at IS NULL",
                (now, points, &route_id),
            )? == 1;

            let payout = if claimed {
                tx.execute(
                    "UPDATE users SET routes_completed = routes_completed + 1 WHERE id = ?1",
                    [&user_id],
                )?;
                add_badge(tx, &user_id, &self.settings.route_badge, now)?;
                Some(self.pay_out(tx, ActivityKind::Route, &route_id, &user_id, points, &rules, now)?)
            } else {
                tx.execute("UPDATE routes SET completed = 1 WHERE id = ?1", [&route_id])?;
                None
            };

            let route = load_route(tx, &route_id)?
                .ok_or_else(|| EngineError::not_found("Route", &route_id))?;
            Ok((route, payout))
        })?;

        Ok(self.finish(ActivityKind::Route, &route_id, route, payout))
    }

    /// Complete a challenge for a user, crediting its own point value
    pub fn complete_challenge(
        &self,
        challenge_id: &str,
        user_id: &str,
    ) -> EngineResult<Completed<Challenge>> {
        let challenge_id = parse_id("challenge", challenge_id)?;
        let user_id = parse_id("user", user_id)?;
        let rules = self.catalog.achievement_rules()?;

        let (challenge, payout) = self.db.write(|tx| {
            let challenge = load_challenge(tx, &challenge_id)?
                .ok_or_else(|| EngineError::not_found("Challenge", &challenge_id))?;
            require_user(tx, &user_id)?;

            let now = now_ms();
            let claimed = tx.execute(
                "UPDATE challenges SET completed = 1, completed_at = ?1
                 WHERE id = ?2 AND completed_at IS NULL",
                (now, &challenge_id),
            )? == 1;

            let payout = if claimed {
                Some(self.pay_out(
                    tx,
                    ActivityKind::Challenge,
                    &challenge_id,
                    &user_id,
                    challenge.points,
                    &rules,
                    now,
                )?)
            } else {
                tx.execute(
                    "UPDATE challenges SET completed = 1 WHERE id = ?1",
                    [&challenge_id],
                )?;
                None
            };

            let challenge = load_challenge(tx, &challenge_id)?
                .ok_or_else(|| EngineError::not_found("Challenge", &challenge_id))?;
            Ok((challenge, payout))
        })?;

        Ok(self.finish(ActivityKind::Challenge, &challenge_id, challenge, payout))
    }

    /// Move a task through its lifecycle.
    ///
    /// Only the first entry into `Completed` has effects. Without a user the
    /// task is still consumed but nobody is credited. A completed task stays
    /// completed; later updates are replays.
    pub fn update_task_status(
        &self,
        task_id: &str,
        status: &str,
        user_id: Option<&str>,
    ) -> EngineResult<Completed<Task>> {
        let status = TaskStatus::parse(status)?;
        let task_id = parse_id("task", task_id)?;
        let user_id = user_id.map(|id| parse_id("user", id)).transpose()?;
        let rules = self.catalog.achievement_rules()?;

        let (task, payout, replay) = self.db.write(|tx| {
            let task = load_task(tx, &task_id)?
                .ok_or_else(|| EngineError::not_found("Task", &task_id))?;
            if let Some(user_id) = &user_id {
                require_user(tx, user_id)?;
            }

            if task.completed_at.is_some() {
                return Ok((task, None, true));
            }

            if status != TaskStatus::Completed {
                tx.execute(
                    "UPDATE tasks SET status = ?1 WHERE id = ?2 AND completed_at IS NULL",
                    (status.as_str(), &task_id),
                )?;
                let task = load_task(tx, &task_id)?
                    .ok_or_else(|| EngineError::not_found("Task", &task_id))?;
                return Ok((task, None, false));
            }

            let now = now_ms();
            let claimed = tx.execute(
                "UPDATE tasks SET status = ?1, completed_at = ?2
                 WHERE id = ?3 AND completed_at IS NULL",
                (TaskStatus::Completed.as_str(), now, &task_id),
            )? == 1;

            let payout = match (claimed, &user_id) {
                (false, _) => None,
                (true, Some(user_id)) => Some(self.pay_out(
                    tx,
                    ActivityKind::Task,
                    &task_id,
                    user_id,
                    task.reward_points,
                    &rules,
                    now,
                )?),
                (true, None) => {
                    info!(
                        "[trailquest:completion] Task {} completed without a user, nothing credited",
                        task_id
                    );
                    Some(Payout {
                        points: 0,
                        achievement: AchievementResult::default(),
                    })
                }
            };

            let task = load_task(tx, &task_id)?
                .ok_or_else(|| EngineError::not_found("Task", &task_id))?;
            let replay = !claimed;
            Ok((task, payout, replay))
        })?;

        if replay {
            debug!(
                "[trailquest:completion] Task {} already completed, status update ignored",
                task_id
            );
            return Ok(Completed {
                record: task,
                outcome: CompletionOutcome::replay(),
            });
        }
        if payout.is_none() {
            debug!("[trailquest:completion] Task {} -> {}", task_id, status);
            return Ok(Completed {
                record: task,
                outcome: CompletionOutcome::default(),
            });
        }
        Ok(self.finish(ActivityKind::Task, &task_id, task, payout))
    }

    /// Credit the reward and run the achievement pass inside the claim
    #[allow(clippy::too_many_arguments)]
    fn pay_out(
        &self,
        conn: &Connection,
        kind: ActivityKind,
        instance_id: &str,
        user_id: &str,
        points: i64,
        rules: &[AchievementRule],
        now: i64,
    ) -> EngineResult<Payout> {
        if points > 0 {
            ledger::credit_in(conn, user_id, points, reason_for(kind), Some(instance_id))?;
        }
        let achievement = evaluate_in(conn, user_id, rules, now)?;
        Ok(Payout {
            points,
            achievement,
        })
    }

    /// Attach motivation after commit and log the transition
    fn finish<T>(
        &self,
        kind: ActivityKind,
        instance_id: &str,
        record: T,
        payout: Option<Payout>,
    ) -> Completed<T> {
        let Some(payout) = payout else {
            debug!(
                "[trailquest:completion] {} {} already completed, nothing awarded",
                kind.label(),
                instance_id
            );
            return Completed {
                record,
                outcome: CompletionOutcome::replay(),
            };
        };

        info!(
            "[trailquest:completion] {} {} completed (+{} pts, {} achievement(s))",
            kind.label(),
            instance_id,
            payout.points,
            payout.achievement.unlocked.len()
        );
        Completed {
            record,
            outcome: CompletionOutcome {
                points_awarded: payout.points,
                achievement: payout.achievement,
                motivation: Some(self.motivation.pick(kind.trigger())),
                already_completed: false,
            },
        }
    }
}

fn reason_for(kind: ActivityKind) -> LedgerReason {
    match kind {
        ActivityKind::Route => LedgerReason::RouteCompleted,
        ActivityKind::Challenge => LedgerReason::ChallengeCompleted,
        ActivityKind::Task => LedgerReason::TaskCompleted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ConditionType, Location, NewAchievementRule, NewChallenge, NewPath, NewRoute, NewTask,
        NewUser, new_id,
    };
    use crate::engine::activities::ActivityStore;
    use crate::engine::catalog::SqliteCatalog;
    use crate::engine::users::UserDirectory;
    use tempfile::tempdir;

    struct Fixture {
        _dir: tempfile::TempDir,
        users: UserDirectory,
        store: ActivityStore,
        catalog: SqliteCatalog,
        completion: ActivityCompletion,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let db = EngineDb::open(&dir.path().join("completion.db")).unwrap();
        let catalog = SqliteCatalog::new(db.clone());
        let shared: Arc<dyn CatalogRepository> = Arc::new(catalog.clone());
        let settings = RewardSettings::default();
        Fixture {
            users: UserDirectory::new(db.clone()),
            store: ActivityStore::new(db.clone(), settings.clone()),
            completion: ActivityCompletion::new(
                db,
                shared.clone(),
                MotivationSelector::new(shared),
                settings,
            ),
            catalog,
            _dir: dir,
        }
    }

    fn loc() -> Location {
        Location {
            latitude: 0.0,
            longitude: 0.0,
            name: "Here".to_string(),
        }
    }

    fn user(f: &Fixture) -> String {
        f.users
            .create(&NewUser {
                name: "Kai".to_string(),
                email: "kai@example.com".to_string(),
            })
            .unwrap()
            .id
    }

    fn route(f: &Fixture, user_id: &str) -> Route {
        f.store
            .create_route(&NewRoute {
                user_id: user_id.to_string(),
                start: loc(),
                end: loc(),
                waypoints: vec![],
                route_type: "fastest".to_string(),
                distance: None,
                duration: None,
            })
            .unwrap()
    }

    fn task(f: &Fixture, points: i64) -> Task {
        let path = f
            .store
            .create_path(&NewPath {
                name: "Harbour".to_string(),
                start_point: loc(),
                end_point: loc(),
                difficulty: crate::domain::Difficulty::Easy,
                ai_suggested: false,
            })
            .unwrap();
        f.store
            .create_task(&NewTask {
                path_id: path.id,
                task_description: "Spot a lighthouse".to_string(),
                reward_points: Some(points),
            })
            .unwrap()
    }

    #[test]
    fn test_route_completes_once() {
        let f = fixture();
        let id = user(&f);
        let r = route(&f, &id);

        let first = f.completion.complete_route(&r.id, &id).unwrap();
        assert_eq!(first.outcome.points_awarded, 50);
        assert!(!first.outcome.already_completed);
        assert!(first.outcome.motivation.is_some());
        assert!(first.record.completed);
        assert_eq!(first.record.points_earned, 50);

        let second = f.completion.complete_route(&r.id, &id).unwrap();
        assert_eq!(second.outcome.points_awarded, 0);
        assert!(second.outcome.already_completed);
        assert!(second.outcome.motivation.is_none());

        let u = f.users.get(&id).unwrap();
        assert_eq!(u.total_points, 50);
        assert_eq!(u.routes_completed, 1);
        assert_eq!(u.badges, vec!["Route Completer".to_string()]);
    }

    #[test]
    fn test_route_triggers_achievements() {
        let f = fixture();
        f.catalog
            .create_rule(&NewAchievementRule {
                title: "Half Century".to_string(),
                condition_type: ConditionType::Points,
                condition_value: 50,
                reward_points: 20,
                badge_icon: None,
            })
            .unwrap();
        let id = user(&f);
        let r = route(&f, &id);

        let done = f.completion.complete_route(&r.id, &id).unwrap();
        assert_eq!(done.outcome.achievement.unlocked, vec!["Half Century".to_string()]);
        assert_eq!(done.outcome.achievement.awarded_points, 20);
        assert_eq!(f.users.get(&id).unwrap().total_points, 70);
    }

    #[test]
    fn test_not_found_before_any_write() {
        let f = fixture();
        let id = user(&f);
        let r = route(&f, &id);

        let err = f.completion.complete_route(&new_id(), &id).unwrap_err();
        assert!(matches!(err, EngineError::NotFound { kind: "Route", .. }));

        let err = f.completion.complete_route(&r.id, &new_id()).unwrap_err();
        assert!(matches!(err, EngineError::NotFound { kind: "User", .. }));
        // The failed attempt did not consume the route
        assert!(f.store.get_route(&r.id).unwrap().completed_at.is_none());
    }

    #[test]
    fn test_challenge_credits_its_points() {
        let f = fixture();
        let id = user(&f);
        let r = route(&f, &id);
        let c = f
            .store
            .create_challenge(&NewChallenge {
                route_id: r.id,
                challenge_type: "food".to_string(),
                title: "Try the local pastry".to_string(),
                description: String::new(),
                location: loc(),
                points: Some(25),
            })
            .unwrap();

        let done = f.completion.complete_challenge(&c.id, &id).unwrap();
        assert_eq!(done.outcome.points_awarded, 25);
        assert!(done.record.completed);
        let again = f.completion.complete_challenge(&c.id, &id).unwrap();
        assert_eq!(again.outcome.points_awarded, 0);

        let u = f.users.get(&id).unwrap();
        assert_eq!(u.total_points, 25);
        assert_eq!(u.routes_completed, 0);
    }

    #[test]
    fn test_task_lifecycle() {
        let f = fixture();
        let id = user(&f);
        let t = task(&f, 10);

        let started = f
            .completion
            .update_task_status(&t.id, "In Progress", Some(&id))
            .unwrap();
        assert_eq!(started.record.status, TaskStatus::InProgress);
        assert_eq!(started.outcome.points_awarded, 0);
        assert_eq!(f.users.get(&id).unwrap().total_points, 0);

        let done = f
            .completion
            .update_task_status(&t.id, "Completed", Some(&id))
            .unwrap();
        assert_eq!(done.record.status, TaskStatus::Completed);
        assert!(done.record.completed_at.is_some());
        assert_eq!(done.outcome.points_awarded, 10);

        let again = f
            .completion
            .update_task_status(&t.id, "Completed", Some(&id))
            .unwrap();
        assert_eq!(again.outcome.points_awarded, 0);
        assert!(again.outcome.already_completed);

        // Completed is terminal
        let back = f
            .completion
            .update_task_status(&t.id, "Not Started", Some(&id))
            .unwrap();
        assert_eq!(back.record.status, TaskStatus::Completed);
        assert_eq!(f.users.get(&id).unwrap().total_points, 10);
    }

    #[test]
    fn test_task_without_user_is_consumed() {
        let f = fixture();
        let id = user(&f);
        let t = task(&f, 10);

        let anon = f.completion.update_task_status(&t.id, "Completed", None).unwrap();
        assert_eq!(anon.outcome.points_awarded, 0);
        assert!(!anon.outcome.already_completed);
        assert!(anon.outcome.motivation.is_some());

        let late = f
            .completion
            .update_task_status(&t.id, "Completed", Some(&id))
            .unwrap();
        assert_eq!(late.outcome.points_awarded, 0);
        assert_eq!(f.users.get(&id).unwrap().total_points, 0);
    }

    #[test]
    fn test_task_rejects_unknown_status() {
        let f = fixture();
        let t = task(&f, 10);
        let err = f.completion.update_task_status(&t.id, "Done", None).unwrap_err();
        assert_eq!(err.reason(), "invalid_argument");
        assert_eq!(f.store.get_task(&t.id).unwrap().status, TaskStatus::NotStarted);
    }
}
