//! User registration, lookup and the leaderboard projection

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use super::db::EngineDb;
use crate::domain::{NewUser, User, new_id, parse_id};
use crate::error::{EngineError, EngineResult};

/// Current timestamp in milliseconds
pub(crate) fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub(crate) fn to_datetime(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

/// Reads and registers users
#[derive(Clone)]
pub struct UserDirectory {
    db: EngineDb,
}

impl UserDirectory {
    pub fn new(db: EngineDb) -> Self {
        Self { db }
    }

    /// Register a new user with a zero balance
    pub fn create(&self, new_user: &NewUser) -> EngineResult<User> {
        let name = new_user.name.trim();
        let email = new_user.email.trim();
        if name.is_empty() {
            return Err(EngineError::invalid("name must not be empty"));
        }
        if !email.contains('@') {
            return Err(EngineError::invalid(format!("invalid email '{email}'")));
        }

        let id = new_id();
        let user = self.db.write(|tx| {
            tx.execute(
                "INSERT INTO users (id, name, email, created_at) VALUES (?1, ?2, ?3, ?4)",
                (&id, name, email, now_ms()),
            )?;
            load_user(tx, &id)?.ok_or_else(|| EngineError::not_found("User", &id))
        })?;

        info!("[trailquest:users] Registered user {} ({})", user.id, user.name);
        Ok(user)
    }

    /// Get a user by id
    pub fn get(&self, user_id: &str) -> EngineResult<User> {
        let user_id = parse_id("user", user_id)?;
        let conn = self.db.conn();
        load_user(&conn, &user_id)?.ok_or_else(|| EngineError::not_found("User", user_id))
    }

    /// Users sorted by balance, highest first; earlier registration wins ties
    pub fn leaderboard(&self, limit: usize) -> EngineResult<Vec<User>> {
        let conn = self.db.conn();
        let ids: Vec<String> = {
            let mut stmt = conn.prepare(
                "SELECT id FROM users ORDER BY total_points DESC, created_at ASC, id ASC LIMIT ?1",
            )?;
            let ids = stmt
                .query_map([limit as i64], |r| r.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            ids
        };

        let mut users = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(user) = load_user(&conn, &id)? {
                users.push(user);
            }
        }
        Ok(users)
    }
}

pub(crate) fn user_exists(conn: &Connection, user_id: &str) -> EngineResult<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM users WHERE id = ?1", [user_id], |r| r.get(0))
        .optional()?;
    Ok(found.is_some())
}

/// Fail with `NotFound` unless the user exists
pub(crate) fn require_user(conn: &Connection, user_id: &str) -> EngineResult<()> {
    if user_exists(conn, user_id)? {
        Ok(())
    } else {
        Err(EngineError::not_found("User", user_id))
    }
}

/// Add a badge title; re-adding an existing title is a no-op
pub(crate) fn add_badge(conn: &Connection, user_id: &str, title: &str, now: i64) -> EngineResult<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO user_badges (user_id, title, granted_at) VALUES (?1, ?2, ?3)",
        (user_id, title, now),
    )?;
    Ok(inserted == 1)
}

/// Load a full user record, including its set-valued fields
pub(crate) fn load_user(conn: &Connection, user_id: &str) -> EngineResult<Option<User>> {
    let row = conn
        .query_row(
            "SELECT id, name, email, total_points, routes_completed, created_at FROM users WHERE id = ?1",
            [user_id],
            |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, i64>(3)?,
                    r.get::<_, i64>(4)?,
                    r.get::<_, i64>(5)?,
                ))
            },
        )
        .optional()?;

    let Some((id, name, email, total_points, routes_completed, created_at)) = row else {
        return Ok(None);
    };

    let badges = titles(
        conn,
        "SELECT title FROM user_badges WHERE user_id = ?1 ORDER BY granted_at, rowid",
        &id,
    )?;
    let achievements = titles(
        conn,
        "SELECT title FROM user_achievements WHERE user_id = ?1 ORDER BY unlocked_at, rowid",
        &id,
    )?;
    let rewards_owned = titles(
        conn,
        "SELECT item_id FROM user_rewards WHERE user_id = ?1 ORDER BY acquired_at, rowid",
        &id,
    )?;

    let user = User {
        id,
        name,
        email,
        total_points,
        level: 1,
        level_title: String::new(),
        badges,
        achievements,
        routes_completed,
        rewards_owned,
        created_at: to_datetime(created_at),
    };
    Ok(Some(user.with_level()))
}

fn titles(conn: &Connection, sql: &str, user_id: &str) -> EngineResult<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([user_id], |r| r.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(rows)
}
