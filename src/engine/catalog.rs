//! Read-only catalog access
//!
//! The engine reads achievement rules, reward items and motivation messages
//! through [`CatalogRepository`] so the source can be swapped (a fixed
//! in-process catalog, a remote service) without touching the rules.
//! [`SqliteCatalog`] is the database-backed implementation and also carries
//! the authoring operations used by the API and the seeder.

use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{info, warn};

use super::db::EngineDb;
use super::users::now_ms;
use crate::domain::{
    AchievementRule, ConditionType, MotivationMessage, NewAchievementRule, NewRewardItem,
    RewardItem, check_points, new_id,
};
use crate::error::{EngineError, EngineResult};

/// Read-only view of the catalog used by the progression rules
pub trait CatalogRepository: Send + Sync {
    /// All achievement rules, in creation order
    fn achievement_rules(&self) -> EngineResult<Vec<AchievementRule>>;

    /// All purchasable reward items, in creation order
    fn reward_items(&self) -> EngineResult<Vec<RewardItem>>;

    /// Look up a single reward item
    fn reward_item(&self, item_id: &str) -> EngineResult<Option<RewardItem>>;

    /// Stored feedback strings for a trigger event
    fn motivation_messages(&self, trigger: &str) -> EngineResult<Vec<MotivationMessage>>;
}

/// Catalog stored in the progression database
#[derive(Clone)]
pub struct SqliteCatalog {
    db: EngineDb,
}

impl SqliteCatalog {
    pub fn new(db: EngineDb) -> Self {
        Self { db }
    }

    /// Add an achievement rule; titles are unique
    pub fn create_rule(&self, rule: &NewAchievementRule) -> EngineResult<AchievementRule> {
        let created = self.db.write(|tx| create_rule_in(tx, rule))?;
        info!("[trailquest:catalog] Added achievement '{}'", created.title);
        Ok(created)
    }

    /// Add a reward item to the shop
    pub fn create_item(&self, item: &NewRewardItem) -> EngineResult<RewardItem> {
        let created = self.db.write(|tx| create_item_in(tx, item))?;
        info!(
            "[trailquest:catalog] Added reward '{}' ({} pts)",
            created.item_name, created.cost
        );
        Ok(created)
    }

    /// Store a feedback string for a trigger event
    pub fn add_message(&self, trigger: &str, text: &str) -> EngineResult<MotivationMessage> {
        self.db.write(|tx| add_message_in(tx, trigger, text))
    }
}

impl CatalogRepository for SqliteCatalog {
    fn achievement_rules(&self) -> EngineResult<Vec<AchievementRule>> {
        let conn = self.db.conn();
        load_rules(&conn)
    }

    fn reward_items(&self) -> EngineResult<Vec<RewardItem>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            "SELECT id, item_name, cost, category FROM reward_items ORDER BY created_at, rowid",
        )?;
        let items = stmt
            .query_map([], item_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn reward_item(&self, item_id: &str) -> EngineResult<Option<RewardItem>> {
        let conn = self.db.conn();
        let item = conn
            .query_row(
                "SELECT id, item_name, cost, category FROM reward_items WHERE id = ?1",
                [item_id],
                item_from_row,
            )
            .optional()?;
        Ok(item)
    }

    fn motivation_messages(&self, trigger: &str) -> EngineResult<Vec<MotivationMessage>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            "SELECT id, trigger_event, message_text FROM motivation_messages
             WHERE trigger_event = ?1 ORDER BY rowid",
        )?;
        let messages = stmt
            .query_map([trigger], |r| {
                Ok(MotivationMessage {
                    id: r.get(0)?,
                    trigger_event: r.get(1)?,
                    message_text: r.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(messages)
    }
}

fn item_from_row(r: &Row<'_>) -> rusqlite::Result<RewardItem> {
    Ok(RewardItem {
        id: r.get(0)?,
        item_name: r.get(1)?,
        cost: r.get(2)?,
        category: r.get(3)?,
    })
}

fn load_rules(conn: &Connection) -> EngineResult<Vec<AchievementRule>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, condition_type, condition_value, reward_points, badge_icon
         FROM achievement_rules ORDER BY created_at, rowid",
    )?;
    let rows = stmt
        .query_map([], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, i64>(3)?,
                r.get::<_, i64>(4)?,
                r.get::<_, Option<String>>(5)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut rules = Vec::with_capacity(rows.len());
    for (id, title, condition, condition_value, reward_points, badge_icon) in rows {
        // Rules written by a newer schema may use counters this build can't evaluate
        let Some(condition_type) = ConditionType::from_str(&condition) else {
            warn!(
                "[trailquest:catalog] Skipping achievement '{}' with unknown condition '{}'",
                title, condition
            );
            continue;
        };
        rules.push(AchievementRule {
            id,
            title,
            condition_type,
            condition_value,
            reward_points,
            badge_icon,
        });
    }
    Ok(rules)
}

pub(crate) fn create_rule_in(
    conn: &Connection,
    rule: &NewAchievementRule,
) -> EngineResult<AchievementRule> {
    let title = rule.title.trim();
    if title.is_empty() {
        return Err(EngineError::invalid("achievement title must not be empty"));
    }
    check_points("condition_value", rule.condition_value)?;
    check_points("reward_points", rule.reward_points)?;

    let created = AchievementRule {
        id: new_id(),
        title: title.to_string(),
        condition_type: rule.condition_type,
        condition_value: rule.condition_value,
        reward_points: rule.reward_points,
        badge_icon: rule.badge_icon.clone(),
    };
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO achievement_rules
         (id, title, condition_type, condition_value, reward_points, badge_icon, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            &created.id,
            &created.title,
            created.condition_type.as_str(),
            created.condition_value,
            created.reward_points,
            &created.badge_icon,
            now_ms(),
        ),
    )?;
    if inserted == 0 {
        return Err(EngineError::invalid(format!(
            "achievement '{}' already exists",
            created.title
        )));
    }
    Ok(created)
}

pub(crate) fn create_item_in(conn: &Connection, item: &NewRewardItem) -> EngineResult<RewardItem> {
    if item.item_name.trim().is_empty() {
        return Err(EngineError::invalid("item_name must not be empty"));
    }
    check_points("cost", item.cost)?;

    let created = RewardItem {
        id: new_id(),
        item_name: item.item_name.trim().to_string(),
        cost: item.cost,
        category: item.category.clone(),
    };
    conn.execute(
        "INSERT INTO reward_items (id, item_name, cost, category, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (&created.id, &created.item_name, created.cost, &created.category, now_ms()),
    )?;
    Ok(created)
}

pub(crate) fn add_message_in(
    conn: &Connection,
    trigger: &str,
    text: &str,
) -> EngineResult<MotivationMessage> {
    let message = MotivationMessage {
        id: new_id(),
        trigger_event: trigger.to_string(),
        message_text: text.to_string(),
    };
    conn.execute(
        "INSERT INTO motivation_messages (id, trigger_event, message_text) VALUES (?1, ?2, ?3)",
        (&message.id, &message.trigger_event, &message.message_text),
    )?;
    Ok(message)
}
