//! Activity records: routes, challenges, paths and tasks
//!
//! Creation and listing only. Completion lives in [`super::completion`].
//! Locations are stored as JSON documents in TEXT columns.

use rusqlite::{Connection, OptionalExtension, Row, types::Type};
use serde::{Serialize, de::DeserializeOwned};
use tracing::info;

use super::RewardSettings;
use super::db::EngineDb;
use super::users::{now_ms, require_user, to_datetime};
use crate::domain::{
    Challenge, Difficulty, NewChallenge, NewPath, NewRoute, NewTask, Path, Route, Task,
    TaskStatus, check_points, new_id, parse_id,
};
use crate::error::{EngineError, EngineResult};

/// Optional filters for [`ActivityStore::list_paths`]
#[derive(Debug, Clone, Copy, Default)]
pub struct PathFilter {
    pub difficulty: Option<Difficulty>,
    pub ai_suggested: Option<bool>,
}

#[derive(Clone)]
pub struct ActivityStore {
    db: EngineDb,
    settings: RewardSettings,
}

impl ActivityStore {
    pub fn new(db: EngineDb, settings: RewardSettings) -> Self {
        Self { db, settings }
    }

    // ========================================================================
    // Routes
    // ========================================================================

    pub fn create_route(&self, new: &NewRoute) -> EngineResult<Route> {
        let user_id = parse_id("user", &new.user_id)?;
        if new.route_type.trim().is_empty() {
            return Err(EngineError::invalid("route_type must not be empty"));
        }
        let start = to_json(&new.start)?;
        let end = to_json(&new.end)?;
        let waypoints = to_json(&new.waypoints)?;

        let id = new_id();
        let route = self.db.write(|tx| {
            require_user(tx, &user_id)?;
            tx.execute(
                "INSERT INTO routes (id, user_id, start_json, end_json, waypoints_json, route_type, distance, duration, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                (
                    &id,
                    &user_id,
                    &start,
                    &end,
                    &waypoints,
                    new.route_type.trim(),
                    new.distance,
                    new.duration,
                    now_ms(),
                ),
            )?;
            load_route(tx, &id)?.ok_or_else(|| EngineError::not_found("Route", &id))
        })?;

        info!(
            "[trailquest:activities] Created {} route {} for {}",
            route.route_type, route.id, route.user_id
        );
        Ok(route)
    }

    pub fn get_route(&self, route_id: &str) -> EngineResult<Route> {
        let route_id = parse_id("route", route_id)?;
        let conn = self.db.conn();
        load_route(&conn, &route_id)?.ok_or_else(|| EngineError::not_found("Route", route_id))
    }

    /// A user's routes, oldest first
    pub fn routes_for_user(&self, user_id: &str) -> EngineResult<Vec<Route>> {
        let user_id = parse_id("user", user_id)?;
        let conn = self.db.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ROUTE_COLUMNS} FROM routes WHERE user_id = ?1 ORDER BY created_at, rowid"
        ))?;
        let routes = stmt
            .query_map([&user_id], route_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(routes)
    }

    // ========================================================================
    // Challenges
    // ========================================================================

    pub fn create_challenge(&self, new: &NewChallenge) -> EngineResult<Challenge> {
        let route_id = parse_id("route", &new.route_id)?;
        let points = new.points.unwrap_or(self.settings.default_challenge_points);
        check_points("points", points)?;
        if new.title.trim().is_empty() {
            return Err(EngineError::invalid("title must not be empty"));
        }
        let location = to_json(&new.location)?;

        let id = new_id();
        let challenge = self.db.write(|tx| {
            if load_route(tx, &route_id)?.is_none() {
                return Err(EngineError::not_found("Route", &route_id));
            }
            tx.execute(
                "INSERT INTO challenges (id, route_id, challenge_type, title, description, location_json, points, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                (
                    &id,
                    &route_id,
                    &new.challenge_type,
                    new.title.trim(),
                    &new.description,
                    &location,
                    points,
                    now_ms(),
                ),
            )?;
            load_challenge(tx, &id)?.ok_or_else(|| EngineError::not_found("Challenge", &id))
        })?;

        info!(
            "[trailquest:activities] Created challenge '{}' ({} pts) on route {}",
            challenge.title, challenge.points, challenge.route_id
        );
        Ok(challenge)
    }

    pub fn challenges_for_route(&self, route_id: &str) -> EngineResult<Vec<Challenge>> {
        let route_id = parse_id("route", route_id)?;
        let conn = self.db.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CHALLENGE_COLUMNS} FROM challenges WHERE route_id = ?1 ORDER BY created_at, rowid"
        ))?;
        let challenges = stmt
            .query_map([&route_id], challenge_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(challenges)
    }

    // ========================================================================
    // Paths
    // ========================================================================

    pub fn create_path(&self, new: &NewPath) -> EngineResult<Path> {
        let path = self.db.write(|tx| create_path_in(tx, new))?;
        info!("[trailquest:activities] Created path '{}' ({})", path.name, path.id);
        Ok(path)
    }

    pub fn get_path(&self, path_id: &str) -> EngineResult<Path> {
        let path_id = parse_id("path", path_id)?;
        let conn = self.db.conn();
        load_path(&conn, &path_id)?.ok_or_else(|| EngineError::not_found("Path", path_id))
    }

    pub fn list_paths(&self, filter: PathFilter) -> EngineResult<Vec<Path>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PATH_COLUMNS} FROM paths
             WHERE (?1 IS NULL OR difficulty = ?1) AND (?2 IS NULL OR ai_suggested = ?2)
             ORDER BY created_at, rowid"
        ))?;
        let paths = stmt
            .query_map(
                (filter.difficulty.map(|d| d.as_str()), filter.ai_suggested),
                path_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(paths)
    }

    // ========================================================================
    // Tasks
    // ========================================================================

    pub fn create_task(&self, new: &NewTask) -> EngineResult<Task> {
        let default_points = self.settings.default_task_points;
        let task = self.db.write(|tx| create_task_in(tx, new, default_points))?;
        info!(
            "[trailquest:activities] Created task {} on path {}",
            task.id, task.path_id
        );
        Ok(task)
    }

    pub fn get_task(&self, task_id: &str) -> EngineResult<Task> {
        let task_id = parse_id("task", task_id)?;
        let conn = self.db.conn();
        load_task(&conn, &task_id)?.ok_or_else(|| EngineError::not_found("Task", task_id))
    }

    /// Tasks of an existing path, oldest first
    pub fn tasks_for_path(&self, path_id: &str) -> EngineResult<Vec<Task>> {
        let path_id = parse_id("path", path_id)?;
        let conn = self.db.conn();
        if load_path(&conn, &path_id)?.is_none() {
            return Err(EngineError::not_found("Path", path_id));
        }
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE path_id = ?1 ORDER BY created_at, rowid"
        ))?;
        let tasks = stmt
            .query_map([&path_id], task_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }
}

// ============================================================================
// Inserts inside an open transaction
// ============================================================================

pub(crate) fn create_path_in(conn: &Connection, new: &NewPath) -> EngineResult<Path> {
    let name = new.name.trim();
    if name.is_empty() {
        return Err(EngineError::invalid("name must not be empty"));
    }
    let start = to_json(&new.start_point)?;
    let end = to_json(&new.end_point)?;

    let id = new_id();
    conn.execute(
        "INSERT INTO paths (id, name, start_json, end_json, difficulty, ai_suggested, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            &id,
            name,
            &start,
            &end,
            new.difficulty.as_str(),
            new.ai_suggested,
            now_ms(),
        ),
    )?;
    load_path(conn, &id)?.ok_or_else(|| EngineError::not_found("Path", &id))
}

/// Insert a task on an existing path; `default_points` applies when the
/// request carries no `reward_points`
pub(crate) fn create_task_in(
    conn: &Connection,
    new: &NewTask,
    default_points: i64,
) -> EngineResult<Task> {
    let path_id = parse_id("path", &new.path_id)?;
    let reward_points = new.reward_points.unwrap_or(default_points);
    check_points("reward_points", reward_points)?;
    if new.task_description.trim().is_empty() {
        return Err(EngineError::invalid("task_description must not be empty"));
    }
    if load_path(conn, &path_id)?.is_none() {
        return Err(EngineError::not_found("Path", &path_id));
    }

    let id = new_id();
    conn.execute(
        "INSERT INTO tasks (id, path_id, task_description, reward_points, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (
            &id,
            &path_id,
            new.task_description.trim(),
            reward_points,
            TaskStatus::NotStarted.as_str(),
            now_ms(),
        ),
    )?;
    load_task(conn, &id)?.ok_or_else(|| EngineError::not_found("Task", &id))
}

// ============================================================================
// Row mapping
// ============================================================================

const ROUTE_COLUMNS: &str = "id, user_id, start_json, end_json, waypoints_json, route_type, \
     distance, duration, points_earned, completed, completed_at, created_at";
const CHALLENGE_COLUMNS: &str = "id, route_id, challenge_type, title, description, location_json, \
     points, completed, completed_at";
const PATH_COLUMNS: &str = "id, name, start_json, end_json, difficulty, ai_suggested, created_at";
const TASK_COLUMNS: &str = "id, path_id, task_description, reward_points, status, created_at, completed_at";

pub(crate) fn load_route(conn: &Connection, id: &str) -> EngineResult<Option<Route>> {
    let sql = format!("SELECT {ROUTE_COLUMNS} FROM routes WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], route_from_row).optional()?)
}

pub(crate) fn load_challenge(conn: &Connection, id: &str) -> EngineResult<Option<Challenge>> {
    let sql = format!("SELECT {CHALLENGE_COLUMNS} FROM challenges WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], challenge_from_row).optional()?)
}

pub(crate) fn load_path(conn: &Connection, id: &str) -> EngineResult<Option<Path>> {
    let sql = format!("SELECT {PATH_COLUMNS} FROM paths WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], path_from_row).optional()?)
}

pub(crate) fn load_task(conn: &Connection, id: &str) -> EngineResult<Option<Task>> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], task_from_row).optional()?)
}

fn route_from_row(r: &Row<'_>) -> rusqlite::Result<Route> {
    Ok(Route {
        id: r.get(0)?,
        user_id: r.get(1)?,
        start: json_col(r, 2)?,
        end: json_col(r, 3)?,
        waypoints: json_col(r, 4)?,
        route_type: r.get(5)?,
        distance: r.get(6)?,
        duration: r.get(7)?,
        points_earned: r.get(8)?,
        completed: r.get(9)?,
        completed_at: r.get::<_, Option<i64>>(10)?.map(to_datetime),
        created_at: to_datetime(r.get(11)?),
    })
}

fn challenge_from_row(r: &Row<'_>) -> rusqlite::Result<Challenge> {
    Ok(Challenge {
        id: r.get(0)?,
        route_id: r.get(1)?,
        challenge_type: r.get(2)?,
        title: r.get(3)?,
        description: r.get(4)?,
        location: json_col(r, 5)?,
        points: r.get(6)?,
        completed: r.get(7)?,
        completed_at: r.get::<_, Option<i64>>(8)?.map(to_datetime),
    })
}

fn path_from_row(r: &Row<'_>) -> rusqlite::Result<Path> {
    let difficulty: String = r.get(4)?;
    Ok(Path {
        id: r.get(0)?,
        name: r.get(1)?,
        start_point: json_col(r, 2)?,
        end_point: json_col(r, 3)?,
        difficulty: Difficulty::parse(&difficulty).unwrap_or(Difficulty::Easy),
        ai_suggested: r.get(5)?,
        created_at: to_datetime(r.get(6)?),
    })
}

fn task_from_row(r: &Row<'_>) -> rusqlite::Result<Task> {
    let status: String = r.get(4)?;
    let status = TaskStatus::parse(&status)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
    Ok(Task {
        id: r.get(0)?,
        path_id: r.get(1)?,
        task_description: r.get(2)?,
        reward_points: r.get(3)?,
        status,
        created_at: to_datetime(r.get(5)?),
        completed_at: r.get::<_, Option<i64>>(6)?.map(to_datetime),
    })
}

fn json_col<T: DeserializeOwned>(r: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = r.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn to_json<T: Serialize>(value: &T) -> EngineResult<String> {
    serde_json::to_string(value).map_err(|e| EngineError::invalid(e.to_string()))
}
