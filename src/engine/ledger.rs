//! Point ledger: the only code that changes a user's balance
//!
//! Credits and debits are single conditional statements against the stored
//! balance, journaled in `ledger_entries` within the same transaction.

use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use tracing::info;

use super::db::EngineDb;
use super::users::{now_ms, to_datetime, user_exists};
use crate::domain::parse_id;
use crate::error::{EngineError, EngineResult};

/// Why a balance changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerReason {
    RouteCompleted,
    ChallengeCompleted,
    TaskCompleted,
    AchievementUnlocked,
    RewardRedeemed,
    Adjustment,
}

impl LedgerReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RouteCompleted => "route_completed",
            Self::ChallengeCompleted => "challenge_completed",
            Self::TaskCompleted => "task_completed",
            Self::AchievementUnlocked => "achievement_unlocked",
            Self::RewardRedeemed => "reward_redeemed",
            Self::Adjustment => "adjustment",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "route_completed" => Some(Self::RouteCompleted),
            "challenge_completed" => Some(Self::ChallengeCompleted),
            "task_completed" => Some(Self::TaskCompleted),
            "achievement_unlocked" => Some(Self::AchievementUnlocked),
            "reward_redeemed" => Some(Self::RewardRedeemed),
            "adjustment" => Some(Self::Adjustment),
            _ => None,
        }
    }
}

/// One journaled balance change
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub delta: i64,
    pub reason: LedgerReason,
    pub reference: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Standalone balance operations, each in its own transaction
#[derive(Clone)]
pub struct Ledger {
    db: EngineDb,
}

impl Ledger {
    pub fn new(db: EngineDb) -> Self {
        Self { db }
    }

    /// Add `amount` points; returns the new balance
    pub fn credit(&self, user_id: &str, amount: i64, reason: LedgerReason) -> EngineResult<i64> {
        let user_id = parse_id("user", user_id)?;
        self.db
            .write(|tx| credit_in(tx, &user_id, amount, reason, None))
    }

    /// Remove `amount` points if the balance covers it; returns the new balance
    pub fn debit(&self, user_id: &str, amount: i64, reason: LedgerReason) -> EngineResult<i64> {
        let user_id = parse_id("user", user_id)?;
        self.db
            .write(|tx| debit_in(tx, &user_id, amount, reason, None))
    }

    /// Most recent journal entries for a user, newest first
    pub fn entries(&self, user_id: &str, limit: usize) -> EngineResult<Vec<LedgerEntry>> {
        let user_id = parse_id("user", user_id)?;
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            "SELECT delta, reason, reference, created_at FROM ledger_entries
             WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map((&user_id, limit as i64), |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, Option<String>>(2)?,
                    r.get::<_, i64>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .map(|(delta, reason, reference, created_at)| LedgerEntry {
                delta,
                reason: LedgerReason::from_str(&reason).unwrap_or(LedgerReason::Adjustment),
                reference,
                created_at: to_datetime(created_at),
            })
            .collect())
    }
}

fn require_positive(amount: i64) -> EngineResult<()> {
    if amount <= 0 {
        return Err(EngineError::invalid(format!(
            "amount must be positive, got {amount}"
        )));
    }
    Ok(())
}

/// Credit inside an open transaction
pub(crate) fn credit_in(
    conn: &Connection,
    user_id: &str,
    amount: i64,
    reason: LedgerReason,
    reference: Option<&str>,
) -> EngineResult<i64> {
    require_positive(amount)?;
    let balance: Option<i64> = conn
        .query_row(
            "UPDATE users SET total_points = total_points + ?1
             WHERE id = ?2 AND total_points <= 9223372036854775807 - ?1
             RETURNING total_points",
            (amount, user_id),
            |r| r.get(0),
        )
        .optional()?;

    let Some(balance) = balance else {
        return Err(if user_exists(conn, user_id)? {
            EngineError::invalid(format!(
                "crediting {amount} would overflow the balance of {user_id}"
            ))
        } else {
            EngineError::not_found("User", user_id)
        });
    };

    journal(conn, user_id, amount, reason, reference)?;
    info!(
        "[trailquest:ledger] +{} to {} ({}), balance {}",
        amount,
        user_id,
        reason.as_str(),
        balance
    );
    Ok(balance)
}

/// Debit inside an open transaction. The balance check and the decrement are
/// one statement, so concurrent debits can never overdraw.
pub(crate) fn debit_in(
    conn: &Connection,
    user_id: &str,
    amount: i64,
    reason: LedgerReason,
    reference: Option<&str>,
) -> EngineResult<i64> {
    require_positive(amount)?;
    let balance: Option<i64> = conn
        .query_row(
            "UPDATE users SET total_points = total_points - ?1
             WHERE id = ?2 AND total_points >= ?1 RETURNING total_points",
            (amount, user_id),
            |r| r.get(0),
        )
        .optional()?;

    let Some(balance) = balance else {
        let available: Option<i64> = conn
            .query_row(
                "SELECT total_points FROM users WHERE id = ?1",
                [user_id],
                |r| r.get(0),
            )
            .optional()?;
        return Err(match available {
            None => EngineError::not_found("User", user_id),
            Some(available) => EngineError::InsufficientFunds {
                needed: amount,
                available,
            },
        });
    };

    journal(conn, user_id, -amount, reason, reference)?;
    info!(
        "[trailquest:ledger] -{} from {} ({}), balance {}",
        amount,
        user_id,
        reason.as_str(),
        balance
    );
    Ok(balance)
}

fn journal(
    conn: &Connection,
    user_id: &str,
    delta: i64,
    reason: LedgerReason,
    reference: Option<&str>,
) -> EngineResult<()> {
    conn.execute(
        "INSERT INTO ledger_entries (user_id, delta, reason, reference, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (user_id, delta, reason.as_str(), reference, now_ms()),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewUser;
    use crate::engine::users::UserDirectory;
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, Ledger, String) {
        let dir = tempdir().unwrap();
        let db = EngineDb::open(&dir.path().join("ledger.db")).unwrap();
        let user = UserDirectory::new(db.clone())
            .create(&NewUser {
                name: "Lee".to_string(),
                email: "lee@example.com".to_string(),
            })
            .unwrap();
        (dir, Ledger::new(db), user.id)
    }

    #[test]
    fn test_credit_then_debit() {
        let (_dir, ledger, user) = setup();
        assert_eq!(ledger.credit(&user, 40, LedgerReason::Adjustment).unwrap(), 40);
        assert_eq!(ledger.debit(&user, 15, LedgerReason::Adjustment).unwrap(), 25);
        assert_eq!(ledger.debit(&user, 25, LedgerReason::Adjustment).unwrap(), 0);
    }

    #[test]
    fn test_debit_rejects_overdraw() {
        let (_dir, ledger, user) = setup();
        ledger.credit(&user, 10, LedgerReason::Adjustment).unwrap();

        match ledger.debit(&user, 11, LedgerReason::Adjustment) {
            Err(EngineError::InsufficientFunds { needed, available }) => {
                assert_eq!(needed, 11);
                assert_eq!(available, 10);
            }
            other => panic!("expected InsufficientFunds, got {:?}", other),
        }

        // Only the credit was journaled
        let entries = ledger.entries(&user, 10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].delta, 10);
    }

    #[test]
    fn test_amount_must_be_positive() {
        let (_dir, ledger, user) = setup();
        for amount in [0, -5] {
            let err = ledger.credit(&user, amount, LedgerReason::Adjustment).unwrap_err();
            assert_eq!(err.reason(), "invalid_argument");
            let err = ledger.debit(&user, amount, LedgerReason::Adjustment).unwrap_err();
            assert_eq!(err.reason(), "invalid_argument");
        }
    }

    #[test]
    fn test_unknown_user() {
        let (_dir, ledger, _user) = setup();
        let ghost = crate::domain::new_id();
        assert_eq!(
            ledger.credit(&ghost, 5, LedgerReason::Adjustment).unwrap_err().reason(),
            "not_found"
        );
        assert_eq!(
            ledger.debit(&ghost, 5, LedgerReason::Adjustment).unwrap_err().reason(),
            "not_found"
        );
    }

    #[test]
    fn test_credit_never_overflows_balance() {
        let (_dir, ledger, user) = setup();
        ledger.credit(&user, 10, LedgerReason::Adjustment).unwrap();

        let err = ledger
            .credit(&user, i64::MAX - 5, LedgerReason::Adjustment)
            .unwrap_err();
        assert_eq!(err.reason(), "invalid_argument");

        let entries = ledger.entries(&user, 10).unwrap();
        assert_eq!(entries.len(), 1);
        let top = ledger
            .credit(&user, i64::MAX - 10, LedgerReason::Adjustment)
            .unwrap();
        assert_eq!(top, i64::MAX);
    }

    #[test]
    fn test_entries_newest_first() {
        let (_dir, ledger, user) = setup();
        ledger.credit(&user, 5, LedgerReason::TaskCompleted).unwrap();
        ledger.debit(&user, 3, LedgerReason::RewardRedeemed).unwrap();
        let entries = ledger.entries(&user, 10).unwrap();
        assert_eq!(entries[0].reason, LedgerReason::RewardRedeemed);
        assert_eq!(entries[0].delta, -3);
        assert_eq!(entries[1].reason, LedgerReason::TaskCompleted);
    }
}
