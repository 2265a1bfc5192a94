//! Reward redemption
//!
//! Redeeming debits the item cost and records ownership in one transaction.
//! The debit is the conditional update in [`ledger::debit_in`], so two
//! concurrent redemptions cannot both spend the same points.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::catalog::CatalogRepository;
use super::db::EngineDb;
use super::ledger::{self, LedgerReason};
use super::users::{load_user, now_ms, require_user};
use crate::domain::{RewardItem, User, parse_id};
use crate::error::{EngineError, EngineResult};

/// Result of a successful redemption
#[derive(Debug, Clone, Serialize)]
pub struct Redemption {
    pub user: User,
    pub item: RewardItem,
}

#[derive(Clone)]
pub struct RewardShop {
    db: EngineDb,
    catalog: Arc<dyn CatalogRepository>,
}

impl RewardShop {
    pub fn new(db: EngineDb, catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { db, catalog }
    }

    pub fn list_items(&self) -> EngineResult<Vec<RewardItem>> {
        self.catalog.reward_items()
    }

    /// Spend points on a catalog item.
    ///
    /// Buying an owned item again charges again; ownership stays one entry.
    pub fn redeem(&self, user_id: &str, item_id: &str) -> EngineResult<Redemption> {
        let user_id = parse_id("user", user_id)?;
        let item_id = parse_id("item", item_id)?;
        // Resolved before `write`: catalog reads take the same connection lock
        let item = self.catalog.reward_item(&item_id)?;

        let (user, item) = self.db.write(|tx| {
            require_user(tx, &user_id)?;
            let item = item.ok_or_else(|| EngineError::not_found("Reward item", &item_id))?;

            if item.cost > 0 {
                ledger::debit_in(
                    tx,
                    &user_id,
                    item.cost,
                    LedgerReason::RewardRedeemed,
                    Some(&item.id),
                )?;
            }
            tx.execute(
                "INSERT OR IGNORE INTO user_rewards (user_id, item_id, acquired_at) VALUES (?1, ?2, ?3)",
                (&user_id, &item.id, now_ms()),
            )?;

            let user = load_user(tx, &user_id)?
                .ok_or_else(|| EngineError::not_found("User", &user_id))?;
            Ok((user, item))
        })?;

        info!(
            "[trailquest:rewards] {} redeemed '{}' for {} pts, balance {}",
            user.id, item.item_name, item.cost, user.total_points
        );
        Ok(Redemption { user, item })
    }

    /// Items the user owns, resolved against the catalog
    pub fn inventory(&self, user_id: &str) -> EngineResult<Vec<RewardItem>> {
        let user_id = parse_id("user", user_id)?;
        let owned = {
            let conn = self.db.conn();
            load_user(&conn, &user_id)?
                .ok_or_else(|| EngineError::not_found("User", &user_id))?
                .rewards_owned
        };

        let mut items = Vec::with_capacity(owned.len());
        for item_id in owned {
            match self.catalog.reward_item(&item_id)? {
                Some(item) => items.push(item),
                None => warn!(
                    "[trailquest:rewards] {} owns unknown item {}",
                    user_id, item_id
                ),
            }
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewRewardItem, NewUser, new_id};
    use crate::engine::catalog::SqliteCatalog;
    use crate::engine::ledger::Ledger;
    use crate::engine::users::UserDirectory;
    use tempfile::tempdir;

    struct Fixture {
        _dir: tempfile::TempDir,
        catalog: SqliteCatalog,
        users: UserDirectory,
        ledger: Ledger,
        shop: RewardShop,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let db = EngineDb::open(&dir.path().join("shop.db")).unwrap();
        let catalog = SqliteCatalog::new(db.clone());
        Fixture {
            users: UserDirectory::new(db.clone()),
            ledger: Ledger::new(db.clone()),
            shop: RewardShop::new(db, Arc::new(catalog.clone())),
            catalog,
            _dir: dir,
        }
    }

    fn item(f: &Fixture, name: &str, cost: i64) -> RewardItem {
        f.catalog
            .create_item(&NewRewardItem {
                item_name: name.to_string(),
                cost,
                category: "Badge".to_string(),
            })
            .unwrap()
    }

    fn user_with(f: &Fixture, points: i64) -> String {
        let id = f
            .users
            .create(&NewUser {
                name: "Mo".to_string(),
                email: "mo@example.com".to_string(),
            })
            .unwrap()
            .id;
        if points > 0 {
            f.ledger.credit(&id, points, LedgerReason::Adjustment).unwrap();
        }
        id
    }

    #[test]
    fn test_redeem_debits_and_records() {
        let f = fixture();
        let compass = item(&f, "Golden Compass", 120);
        let id = user_with(&f, 200);

        let r = f.shop.redeem(&id, &compass.id).unwrap();
        assert_eq!(r.user.total_points, 80);
        assert_eq!(r.user.rewards_owned, vec![compass.id.clone()]);
        assert_eq!(r.item, compass);
    }

    #[test]
    fn test_insufficient_funds_leaves_state() {
        let f = fixture();
        let costly = item(&f, "Premium Badge", 100);
        let id = user_with(&f, 95);

        let err = f.shop.redeem(&id, &costly.id).unwrap_err();
        assert_eq!(err.reason(), "insufficient_funds");

        let user = f.users.get(&id).unwrap();
        assert_eq!(user.total_points, 95);
        assert!(user.rewards_owned.is_empty());
    }

    #[test]
    fn test_repurchase_charges_but_owns_once() {
        let f = fixture();
        let boost = item(&f, "Speed Boost", 80);
        let id = user_with(&f, 200);

        f.shop.redeem(&id, &boost.id).unwrap();
        let r = f.shop.redeem(&id, &boost.id).unwrap();
        assert_eq!(r.user.total_points, 40);
        assert_eq!(r.user.rewards_owned.len(), 1);
    }

    #[test]
    fn test_zero_cost_item_skips_debit() {
        let f = fixture();
        let freebie = item(&f, "Sticker", 0);
        let id = user_with(&f, 0);

        let r = f.shop.redeem(&id, &freebie.id).unwrap();
        assert_eq!(r.user.total_points, 0);
        assert_eq!(r.user.rewards_owned, vec![freebie.id]);
        assert!(f.ledger.entries(&id, 10).unwrap().is_empty());
    }

    #[test]
    fn test_not_found_cases() {
        let f = fixture();
        let real_item = item(&f, "Golden Compass", 10);
        let id = user_with(&f, 50);

        let missing_item = f.shop.redeem(&id, &new_id()).unwrap_err();
        assert!(matches!(missing_item, EngineError::NotFound { kind: "Reward item", .. }));

        let missing_user = f.shop.redeem(&new_id(), &real_item.id).unwrap_err();
        assert!(matches!(missing_user, EngineError::NotFound { kind: "User", .. }));

        assert_eq!(f.shop.redeem(&id, "x").unwrap_err().reason(), "invalid_argument");
    }

    #[test]
    fn test_inventory() {
        let f = fixture();
        let a = item(&f, "Golden Compass", 10);
        let b = item(&f, "Speed Boost", 10);
        let id = user_with(&f, 50);
        f.shop.redeem(&id, &b.id).unwrap();
        f.shop.redeem(&id, &a.id).unwrap();

        let names: Vec<_> = f
            .shop
            .inventory(&id)
            .unwrap()
            .into_iter()
            .map(|i| i.item_name)
            .collect();
        assert_eq!(names, vec!["Speed Boost", "Golden Compass"]);
        assert_eq!(f.shop.inventory(&new_id()).unwrap_err().reason(), "not_found");
    }
}
