//! Concurrency tests for queue request processing
//!
//! These tests validate that the queue's mutual exclusion holds up under
//! genuinely parallel joins, leaves, and ticks: no player is ever paired
//! twice, and no entry is duplicated.

mod fixtures;

use proptest::prelude::*;
use quickmatch::queue::{MatchCoordinator, WaitingQueue};
use quickmatch::types::{MatchPreferences, Player};
use quickmatch::utils::current_timestamp;
use std::collections::HashMap;
use std::sync::Arc;

use fixtures::{player, MockEventPublisher};

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_joins_never_double_match() {
    let event_publisher = Arc::new(MockEventPublisher::new());
    let coordinator = Arc::new(MatchCoordinator::new(
        WaitingQueue::default(),
        event_publisher.clone(),
    ));

    // 100 players join from parallel tasks
    let mut handles = Vec::new();
    for i in 0..100 {
        let coordinator = coordinator.clone();
        handles.push(tokio::spawn(async move {
            coordinator
                .join_queue(player(&format!("player_{i}"), 1000.0 + i as f64))
                .await
                .unwrap()
        }));
    }

    let mut matched_players: Vec<String> = Vec::new();
    for handle in handles {
        if let Some(matched) = handle.await.unwrap() {
            matched_players.extend(matched.players.iter().map(|p| p.id.clone()));
        }
    }

    // Drain whatever the interleaving left behind
    for matched in coordinator.tick().await.unwrap() {
        matched_players.extend(matched.players.iter().map(|p| p.id.clone()));
    }

    // Every player appears in at most one match, and matched + waiting
    // accounts for all 100
    let mut counts: HashMap<String, usize> = HashMap::new();
    for id in &matched_players {
        *counts.entry(id.clone()).or_default() += 1;
    }
    for (id, count) in &counts {
        assert_eq!(*count, 1, "player {} was matched {} times", id, count);
    }
    assert_eq!(
        matched_players.len() + coordinator.queue_depth().unwrap(),
        100
    );

    // Everyone is unconstrained, so nothing should still be waiting
    assert_eq!(coordinator.queue_depth().unwrap(), 0);

    println!("✅ Concurrent join test passed");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_joins_and_ticks() {
    let event_publisher = Arc::new(MockEventPublisher::new());
    let coordinator = Arc::new(MatchCoordinator::new(
        WaitingQueue::default(),
        event_publisher.clone(),
    ));

    // Joins race against ticks; the per-queue lock must keep every pairing
    // consistent
    let mut handles = Vec::new();
    for i in 0..40 {
        let coordinator = coordinator.clone();
        handles.push(tokio::spawn(async move {
            coordinator
                .join_queue(player(&format!("racer_{i}"), 500.0 + i as f64))
                .await
                .unwrap();
        }));

        if i % 5 == 0 {
            let coordinator = coordinator.clone();
            handles.push(tokio::spawn(async move {
                coordinator.tick().await.unwrap();
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap();
    }
    coordinator.tick().await.unwrap();

    // Every announced match holds two distinct players, and no player was
    // announced twice
    let announced = event_publisher.announced_matches();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for found in &announced {
        let [a, b] = &found.match_record.players;
        assert_ne!(a.id, b.id, "self-paired match {}", found.match_record.id);
        *counts.entry(a.id.clone()).or_default() += 1;
        *counts.entry(b.id.clone()).or_default() += 1;
    }
    for (id, count) in &counts {
        assert_eq!(*count, 1, "player {} was matched {} times", id, count);
    }

    assert_eq!(
        counts.len() + coordinator.queue_depth().unwrap(),
        40,
        "matched and waiting players must account for every join"
    );

    println!("✅ Concurrent join/tick test passed");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_leaves_are_safe() {
    let event_publisher = Arc::new(MockEventPublisher::new());
    let coordinator = Arc::new(MatchCoordinator::new(
        WaitingQueue::default(),
        event_publisher,
    ));

    // Constrain everyone to a distinct difficulty so no joins pair
    for i in 0..20 {
        let mut p = player(&format!("leaver_{i}"), 100.0 * i as f64);
        p.preferences = MatchPreferences::with_difficulty(format!("tier_{i}"));
        coordinator.join_queue(p).await.unwrap();
    }
    assert_eq!(coordinator.queue_depth().unwrap(), 20);

    // Everyone leaves at once, some twice
    let mut handles = Vec::new();
    for i in 0..20 {
        let coordinator = coordinator.clone();
        handles.push(tokio::spawn(async move {
            coordinator.leave_queue(&format!("leaver_{i}")).await.unwrap()
        }));

        let coordinator = coordinator.clone();
        handles.push(tokio::spawn(async move {
            coordinator.leave_queue(&format!("leaver_{i}")).await.unwrap()
        }));
    }

    let mut removals = 0;
    for handle in handles {
        if handle.await.unwrap() {
            removals += 1;
        }
    }

    // Exactly one of each duplicate pair observed the removal
    assert_eq!(removals, 20);
    assert_eq!(coordinator.queue_depth().unwrap(), 0);

    println!("✅ Concurrent leave test passed");
}

proptest! {
    /// Any interleaving of joins with a small id space keeps at most one
    /// entry per id, holding the most recent rating.
    #[test]
    fn prop_rejoin_keeps_single_entry(
        ops in prop::collection::vec((0u8..5, 0u16..3000), 1..50)
    ) {
        let mut queue = WaitingQueue::default();
        let mut latest: HashMap<String, f64> = HashMap::new();

        for (id_index, rating) in ops {
            let id = format!("player_{id_index}");
            let rating = rating as f64;
            queue.add_player(Player {
                id: id.clone(),
                rating,
                preferences: MatchPreferences::any(),
                joined_at: current_timestamp(),
            });
            latest.insert(id, rating);
        }

        let players = queue.players();
        prop_assert_eq!(players.len(), latest.len());
        for p in players {
            prop_assert_eq!(Some(&p.rating), latest.get(&p.id));
        }
    }
}
