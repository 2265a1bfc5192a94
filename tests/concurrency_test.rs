//! Races on completions, redemptions and achievement evaluation

mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use common::*;
use trailquest::engine::{Engine, RewardSettings};

const THREADS: usize = 8;

/// Runs `op` on `THREADS` threads released together; returns how many succeeded
fn race<F>(op: F) -> usize
where
    F: Fn(usize) -> bool + Send + Sync + 'static,
{
    let barrier = Arc::new(Barrier::new(THREADS));
    let op = Arc::new(op);
    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let barrier = barrier.clone();
            let op = op.clone();
            thread::spawn(move || {
                barrier.wait();
                op(i)
            })
        })
        .collect();
    handles
        .into_iter()
        .map(|h| h.join().expect("worker panicked"))
        .filter(|ok| *ok)
        .count()
}

#[test]
fn test_concurrent_route_completion_credits_once() {
    let t = test_engine();
    let user = create_user(&t.engine, "Ola");
    let route = create_route(&t.engine, &user);

    let engine = t.engine.clone();
    let (route_id, user_id) = (route.id.clone(), user.clone());
    let paid = race(move |_| {
        let done = engine
            .completion()
            .complete_route(&route_id, &user_id)
            .expect("complete_route failed");
        done.outcome.points_awarded > 0
    });

    assert_eq!(paid, 1);
    let u = t.engine.users().get(&user).unwrap();
    assert_eq!(u.total_points, 50);
    assert_eq!(u.routes_completed, 1);
}

#[test]
fn test_separate_connections_complete_once() {
    let t = test_engine();
    let user = create_user(&t.engine, "Ola");
    let route = create_route(&t.engine, &user);
    let db_path = t.dir.path().join("trailquest.db");
    let engines: Arc<Vec<Engine>> = Arc::new(
        (0..THREADS)
            .map(|_| Engine::open(&db_path, RewardSettings::default()).expect("Failed to open engine"))
            .collect(),
    );

    let (route_id, user_id) = (route.id.clone(), user.clone());
    let paid = race(move |i| {
        let done = engines[i]
            .completion()
            .complete_route(&route_id, &user_id)
            .expect("complete_route failed");
        done.outcome.points_awarded > 0
    });

    assert_eq!(paid, 1);
    assert_eq!(t.engine.users().get(&user).unwrap().total_points, 50);
}

#[test]
fn test_concurrent_redeems_never_overdraw() {
    let t = test_engine();
    let item = reward_item(&t.engine, "Boat Ticket", 30);
    let user = funded_user(&t.engine, "Pia", 100);

    let engine = t.engine.clone();
    let (item_id, user_id) = (item.id.clone(), user.clone());
    let bought = race(move |_| engine.rewards().redeem(&user_id, &item_id).is_ok());

    assert_eq!(bought, 3);
    let u = t.engine.users().get(&user).unwrap();
    assert_eq!(u.total_points, 10);
    assert_eq!(u.rewards_owned, vec![item.id]);
}

#[test]
fn test_concurrent_evaluation_unlocks_once() {
    let t = test_engine();
    points_rule(&t.engine, "Explorer Badge", 100, 50);
    let user = funded_user(&t.engine, "Quinn", 130);

    let engine = t.engine.clone();
    let user_id = user.clone();
    let unlocked = race(move |_| {
        !engine
            .achievements()
            .evaluate(&user_id)
            .expect("evaluate failed")
            .is_empty()
    });

    assert_eq!(unlocked, 1);
    let u = t.engine.users().get(&user).unwrap();
    assert_eq!(u.total_points, 180);
    assert_eq!(u.achievements, vec!["Explorer Badge".to_string()]);
}

#[test]
fn test_concurrent_seeding_inserts_catalog_once() {
    let t = test_engine();
    let db_path = t.dir.path().join("trailquest.db");
    let engines: Arc<Vec<Engine>> = Arc::new(
        (0..THREADS)
            .map(|_| Engine::open(&db_path, RewardSettings::default()).expect("Failed to open engine"))
            .collect(),
    );

    let seeded = race(move |i| engines[i].seed().expect("seed failed").total() > 0);

    assert_eq!(seeded, 1);
    assert_eq!(t.engine.rewards().list_items().unwrap().len(), 3);
    assert_eq!(t.engine.achievements().list().unwrap().len(), 2);
}
