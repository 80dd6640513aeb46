//! Integration tests for the quickmatch matchmaking service
//!
//! These tests validate the engine working end to end:
//! - The join → queue → match workflow across several players
//! - Preference gating and the greedy adjacent-pair limitation
//! - Tick draining of a large compatible pool
//! - Event publishing, including tolerance of publisher failures

mod fixtures;

use quickmatch::queue::{MatchCoordinator, WaitingQueue};
use std::sync::Arc;

use fixtures::{player, player_with_difficulty, FailingEventPublisher, MockEventPublisher};

/// Integration test setup that creates a coordinator with a capturing publisher
fn create_test_system() -> (MatchCoordinator, Arc<MockEventPublisher>) {
    let event_publisher = Arc::new(MockEventPublisher::new());
    let coordinator = MatchCoordinator::new(WaitingQueue::default(), event_publisher.clone());

    (coordinator, event_publisher)
}

#[tokio::test]
async fn test_join_match_workflow() {
    let (coordinator, event_publisher) = create_test_system();

    // A joins alone: queued, no match
    let result = coordinator.join_queue(player("A", 1000.0)).await.unwrap();
    assert!(result.is_none());
    assert_eq!(coordinator.queue_depth().unwrap(), 1);
    assert_eq!(event_publisher.last_announced_depth(), Some(1));

    // B joins close in skill: immediate match, queue drains
    let matched = coordinator
        .join_queue(player("B", 1050.0))
        .await
        .unwrap()
        .expect("A and B should pair");
    assert!(matched.contains_player("A"));
    assert!(matched.contains_player("B"));
    assert_eq!(coordinator.queue_depth().unwrap(), 0);
    assert_eq!(event_publisher.count_events_of_type("MatchFound"), 1);
    assert_eq!(event_publisher.last_announced_depth(), Some(0));

    // C and D join with conflicting difficulties: both stay queued
    let result = coordinator
        .join_queue(player_with_difficulty("C", 900.0, "hard"))
        .await
        .unwrap();
    assert!(result.is_none());
    let result = coordinator
        .join_queue(player_with_difficulty("D", 950.0, "easy"))
        .await
        .unwrap();
    assert!(result.is_none());
    assert_eq!(coordinator.queue_depth().unwrap(), 2);

    // E is compatible with C but D sits between them in skill order; the
    // greedy adjacent-pair scan stops short of that pairing, so everyone
    // keeps waiting. Known limitation of the scan, kept deliberately.
    let result = coordinator
        .join_queue(player_with_difficulty("E", 960.0, "hard"))
        .await
        .unwrap();
    assert!(result.is_none());
    assert_eq!(coordinator.queue_depth().unwrap(), 3);

    // F slots in next to D with a matching difficulty, unblocking the pool:
    // D pairs with F, which finally leaves C and E adjacent
    let matched = coordinator
        .join_queue(player_with_difficulty("F", 955.0, "easy"))
        .await
        .unwrap()
        .expect("D and F should pair");
    assert!(matched.contains_player("D"));
    assert!(matched.contains_player("F"));
    assert_eq!(coordinator.queue_depth().unwrap(), 2);

    // The next tick resolves C and E without any new join
    let matches = coordinator.tick().await.unwrap();
    assert_eq!(matches.len(), 1);
    assert!(matches[0].contains_player("C"));
    assert!(matches[0].contains_player("E"));
    assert_eq!(coordinator.queue_depth().unwrap(), 0);

    println!("✅ Join/match workflow test passed");
}

#[tokio::test]
async fn test_tick_drains_large_pool() {
    // Seed six mutually compatible, pairwise-adjacent players before the
    // coordinator starts driving the queue
    let mut queue = WaitingQueue::default();
    for (id, rating) in [
        ("p1", 100.0),
        ("p2", 110.0),
        ("p3", 200.0),
        ("p4", 210.0),
        ("p5", 300.0),
        ("p6", 310.0),
    ] {
        queue.add_player(player(id, rating));
    }

    let event_publisher = Arc::new(MockEventPublisher::new());
    let coordinator = MatchCoordinator::new(queue, event_publisher.clone());

    // One tick resolves all three pairs
    let matches = coordinator.tick().await.unwrap();
    assert_eq!(matches.len(), 3);
    assert_eq!(coordinator.queue_depth().unwrap(), 0);

    let announced = event_publisher.announced_matches();
    assert_eq!(announced.len(), 3);

    // All six players ended up in exactly one match each
    let mut seen: Vec<String> = announced
        .iter()
        .flat_map(|found| {
            found
                .match_record
                .players
                .iter()
                .map(|p| p.id.clone())
                .collect::<Vec<_>>()
        })
        .collect();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 6);

    println!("✅ Tick draining test passed");
}

#[tokio::test]
async fn test_publisher_failure_does_not_fail_joins() {
    let coordinator =
        MatchCoordinator::new(WaitingQueue::default(), Arc::new(FailingEventPublisher::new()));

    // Every announcement fails, yet joins and the resulting match succeed
    assert!(coordinator
        .join_queue(player("alice", 1000.0))
        .await
        .unwrap()
        .is_none());

    let matched = coordinator
        .join_queue(player("bob", 1010.0))
        .await
        .unwrap();
    assert!(matched.is_some());
    assert_eq!(coordinator.queue_depth().unwrap(), 0);

    // Ticks tolerate the failing publisher too
    assert!(coordinator.tick().await.unwrap().is_empty());

    println!("✅ Publisher failure tolerance test passed");
}

#[tokio::test]
async fn test_match_records_are_complete() {
    let (coordinator, event_publisher) = create_test_system();

    coordinator.join_queue(player("alice", 1000.0)).await.unwrap();
    let matched = coordinator
        .join_queue(player("bob", 1010.0))
        .await
        .unwrap()
        .unwrap();

    // Fresh id, both players, creation timestamp
    assert_eq!(matched.players.len(), 2);
    assert_ne!(matched.players[0].id, matched.players[1].id);

    // The announced payload carries the same match
    let announced = event_publisher.announced_matches();
    assert_eq!(announced.len(), 1);
    assert_eq!(announced[0].match_record.id, matched.id);

    println!("✅ Match record completeness test passed");
}
