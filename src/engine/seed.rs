//! Sample catalog and activity data
//!
//! Each group is inserted only while its table is empty, so seeding twice
//! changes nothing.

use rusqlite::Connection;
use serde::Serialize;
use tracing::info;

use super::RewardSettings;
use super::activities::{create_path_in, create_task_in};
use super::catalog::{add_message_in, create_item_in, create_rule_in};
use super::db::EngineDb;
use super::motivation::{TRIGGER_DAILY_LOGIN, TRIGGER_ROUTE_COMPLETED, TRIGGER_TASK_COMPLETED};
use crate::domain::{
    ConditionType, Difficulty, Location, NewAchievementRule, NewPath, NewRewardItem, NewTask,
};
use crate::error::EngineResult;

/// How many rows each group inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub achievements: usize,
    pub reward_items: usize,
    pub motivation_messages: usize,
    pub paths: usize,
    pub tasks: usize,
}

impl SeedReport {
    pub fn total(&self) -> usize {
        self.achievements + self.reward_items + self.motivation_messages + self.paths + self.tasks
    }
}

pub struct Seeder<'a> {
    db: &'a EngineDb,
    settings: &'a RewardSettings,
}

impl<'a> Seeder<'a> {
    pub fn new(db: &'a EngineDb, settings: &'a RewardSettings) -> Self {
        Self { db, settings }
    }

    /// Seed every empty group in one transaction. A failure inserts nothing,
    /// and a concurrent seeder sees the committed rows.
    pub fn run(&self) -> EngineResult<SeedReport> {
        let report = self.db.write(|tx| self.seed_in(tx))?;
        info!("[trailquest:seed] Seeded {} rows {:?}", report.total(), report);
        Ok(report)
    }

    fn seed_in(&self, conn: &Connection) -> EngineResult<SeedReport> {
        let mut report = SeedReport::default();

        if is_empty(conn, "achievement_rules")? {
            for (title, condition_type, condition_value, reward_points) in [
                ("Explorer Badge", ConditionType::Points, 100, 50),
                ("Trailblazer Badge", ConditionType::RoutesCompleted, 5, 75),
            ] {
                create_rule_in(
                    conn,
                    &NewAchievementRule {
                        title: title.to_string(),
                        condition_type,
                        condition_value,
                        reward_points,
                        badge_icon: None,
                    },
                )?;
                report.achievements += 1;
            }
        }

        if is_empty(conn, "reward_items")? {
            for (item_name, cost, category) in [
                ("Golden Compass", 120, "Badge"),
                ("Speed Boost", 80, "Boost"),
                ("Premium Badge", 150, "Badge"),
            ] {
                create_item_in(
                    conn,
                    &NewRewardItem {
                        item_name: item_name.to_string(),
                        cost,
                        category: category.to_string(),
                    },
                )?;
                report.reward_items += 1;
            }
        }

        if is_empty(conn, "motivation_messages")? {
            for (trigger, text) in [
                (TRIGGER_TASK_COMPLETED, "🔥 You’re unstoppable! Keep going!"),
                (TRIGGER_ROUTE_COMPLETED, "🏁 Route complete! On to the next adventure."),
                (TRIGGER_DAILY_LOGIN, "Welcome back, explorer!"),
            ] {
                add_message_in(conn, trigger, text)?;
                report.motivation_messages += 1;
            }
        }

        if is_empty(conn, "paths")? {
            let scenic = create_path_in(
                conn,
                &NewPath {
                    name: "Scenic Mountain Trail".to_string(),
                    start_point: location(37.773, -122.431, "Trailhead"),
                    end_point: location(37.802, -122.448, "Summit"),
                    difficulty: Difficulty::Medium,
                    ai_suggested: true,
                },
            )?;
            let city = create_path_in(
                conn,
                &NewPath {
                    name: "City Landmark Walk".to_string(),
                    start_point: location(37.7749, -122.4194, "Downtown"),
                    end_point: location(37.7849, -122.4094, "Old Town"),
                    difficulty: Difficulty::Easy,
                    ai_suggested: false,
                },
            )?;
            report.paths += 2;

            for (path_id, description, points) in [
                (&scenic.id, "Reach the Lake Viewpoint", 20),
                (&scenic.id, "Take a photo of the summit landmark", 30),
                (&city.id, "Try a local delicacy", 15),
                (&city.id, "Find the hidden mural", 25),
            ] {
                create_task_in(
                    conn,
                    &NewTask {
                        path_id: path_id.clone(),
                        task_description: description.to_string(),
                        reward_points: Some(points),
                    },
                    self.settings.default_task_points,
                )?;
                report.tasks += 1;
            }
        }

        Ok(report)
    }
}

fn is_empty(conn: &Connection, table: &str) -> EngineResult<bool> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
    Ok(count == 0)
}

fn location(latitude: f64, longitude: f64, name: &str) -> Location {
    Location {
        latitude,
        longitude,
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::activities::{ActivityStore, PathFilter};
    use crate::engine::catalog::{CatalogRepository, SqliteCatalog};
    use tempfile::tempdir;

    #[test]
    fn test_seed_is_idempotent() {
        let dir = tempdir().unwrap();
        let db = EngineDb::open(&dir.path().join("seed.db")).unwrap();
        let settings = RewardSettings::default();
        let seeder = Seeder::new(&db, &settings);

        let first = seeder.run().unwrap();
        assert_eq!(
            first,
            SeedReport {
                achievements: 2,
                reward_items: 3,
                motivation_messages: 3,
                paths: 2,
                tasks: 4,
            }
        );
        assert_eq!(seeder.run().unwrap().total(), 0);

        let catalog = SqliteCatalog::new(db.clone());
        let activities = ActivityStore::new(db.clone(), settings.clone());
        assert_eq!(catalog.achievement_rules().unwrap().len(), 2);
        let paths = activities.list_paths(PathFilter::default()).unwrap();
        assert_eq!(paths[0].name, "Scenic Mountain Trail");
        assert_eq!(activities.tasks_for_path(&paths[1].id).unwrap().len(), 2);
    }

    #[test]
    fn test_failed_seed_inserts_nothing() {
        let dir = tempdir().unwrap();
        let db = EngineDb::open(&dir.path().join("seed.db")).unwrap();
        let settings = RewardSettings::default();
        db.conn()
            .execute_batch(
                "CREATE TRIGGER reject_tasks BEFORE INSERT ON tasks
                 BEGIN SELECT RAISE(ABORT, 'tasks are read-only'); END;",
            )
            .unwrap();

        assert!(Seeder::new(&db, &settings).run().is_err());
        for table in ["achievement_rules", "reward_items", "motivation_messages", "paths"] {
            assert!(is_empty(&db.conn(), table).unwrap(), "{table} was seeded");
        }

        db.conn().execute_batch("DROP TRIGGER reject_tasks;").unwrap();
        let report = Seeder::new(&db, &settings).run().unwrap();
        assert_eq!(report.paths, 2);
        assert_eq!(report.tasks, 4);
    }
}
