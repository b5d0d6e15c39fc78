use std::sync::Arc;
use std::thread;

use achievelog_core::{CompletionEvent, PlayerId};
use achievelog_engine::{EngineError, Outcome};
use achievelog_harness::{Tables, TestHost};
use achievelog_storage::{StorageError, WriteStep};

fn sequential_id() -> PlayerId {
    PlayerId::from_bytes([
        0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
        0x10,
    ])
}

// ============================================================================
// Recording
// ============================================================================

#[test]
fn alice_completes_story_root() -> Result<(), Box<dyn std::error::Error>> {
    let host = TestHost::new()?;
    let event = CompletionEvent::new(sequential_id(), "Alice", "story/root")
        .with_achievement_name("Minecraft");

    let outcome = host.complete_event(&event);
    assert!(matches!(outcome, Outcome::Recorded(_)));

    assert_eq!(
        host.tables()?,
        Tables {
            players: 1,
            achievements: 1,
            completions: 1
        }
    );
    assert_eq!(host.player_ids()?, vec![sequential_id()]);
    assert_eq!(host.player_name(sequential_id())?.as_deref(), Some("Alice"));
    assert_eq!(host.achievement_name("story/root")?.as_deref(), Some("Minecraft"));
    assert_eq!(
        host.completions()?,
        vec![(sequential_id(), "story/root".to_string())]
    );
    Ok(())
}

#[test]
fn duplicate_event_records_once() -> Result<(), Box<dyn std::error::Error>> {
    let host = TestHost::new()?;
    let player = PlayerId::new_random();

    let first = host.complete(player, "Alice", "story/root");
    let second = host.complete(player, "Alice", "story/root");

    assert!(matches!(first, Outcome::Recorded(_)));
    assert!(matches!(second, Outcome::AlreadyRecorded(_)));
    assert_eq!(
        host.tables()?,
        Tables {
            players: 1,
            achievements: 1,
            completions: 1
        }
    );
    Ok(())
}

#[test]
fn one_player_two_achievements_share_player_row() -> Result<(), Box<dyn std::error::Error>> {
    let host = TestHost::new()?;
    let player = PlayerId::new_random();

    let Outcome::Recorded(a) = host.complete(player, "Alice", "story/root") else {
        panic!("first completion not recorded");
    };
    let Outcome::Recorded(b) = host.complete(player, "Alice", "story/mine_stone") else {
        panic!("second completion not recorded");
    };

    assert_eq!(a.player_row, b.player_row);
    assert_ne!(a.achievement_row, b.achievement_row);
    assert_eq!(
        host.tables()?,
        Tables {
            players: 1,
            achievements: 2,
            completions: 2
        }
    );
    Ok(())
}

#[test]
fn two_players_share_achievement_row_first_name_wins() -> Result<(), Box<dyn std::error::Error>> {
    let host = TestHost::new()?;
    let alice = PlayerId::new_random();
    let bob = PlayerId::new_random();

    host.complete_event(
        &CompletionEvent::new(alice, "Alice", "story/root").with_achievement_name("Minecraft"),
    );
    host.complete_event(
        &CompletionEvent::new(bob, "Bob", "story/root").with_achievement_name("Root of it all"),
    );

    assert_eq!(
        host.tables()?,
        Tables {
            players: 2,
            achievements: 1,
            completions: 2
        }
    );
    assert_eq!(host.achievement_name("story/root")?.as_deref(), Some("Minecraft"));
    Ok(())
}

#[test]
fn player_keeps_first_seen_name() -> Result<(), Box<dyn std::error::Error>> {
    let host = TestHost::new()?;
    let player = PlayerId::new_random();

    host.complete(player, "Alice", "story/root");
    host.complete(player, "Alice_2", "story/mine_stone");

    assert_eq!(host.player_name(player)?.as_deref(), Some("Alice"));
    Ok(())
}

#[test]
fn derived_display_name_is_stored() -> Result<(), Box<dyn std::error::Error>> {
    let host = TestHost::new()?;
    host.complete(PlayerId::new_random(), "Alice", "nether/find_fortress");
    assert_eq!(
        host.achievement_name("nether/find_fortress")?.as_deref(),
        Some("Achievement(nether/find_fortress)")
    );
    Ok(())
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn restart_keeps_facts_and_schema() -> Result<(), Box<dyn std::error::Error>> {
    let mut host = TestHost::new()?;
    let player = PlayerId::new_random();
    host.complete(player, "Alice", "story/root");

    host.restart()?;
    host.restart()?;

    assert!(matches!(
        host.complete(player, "Alice", "story/root"),
        Outcome::AlreadyRecorded(_)
    ));
    assert_eq!(host.tables()?.completions, 1);
    Ok(())
}

#[test]
fn shutdown_twice_is_harmless() -> Result<(), Box<dyn std::error::Error>> {
    let mut host = TestHost::new()?;
    host.adapter.shutdown();
    host.adapter.shutdown();
    assert!(!host.adapter.ledger().is_open());
    Ok(())
}

#[test]
fn restart_on_unreadable_file_keeps_the_storage_error() -> Result<(), Box<dyn std::error::Error>> {
    let mut host = TestHost::new()?;
    host.adapter.shutdown();
    host.corrupt_database()?;

    let err = host.restart().unwrap_err();
    assert!(
        matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::Storage(StorageError::SchemaInitialization(_)))
        ),
        "got {err:?}"
    );
    Ok(())
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn store_fault_is_reported_and_leaves_no_fact() -> Result<(), Box<dyn std::error::Error>> {
    let host = TestHost::new()?;
    let player = PlayerId::new_random();
    host.inject_fault()?;

    let outcome = host.complete(player, "Alice", "story/root");
    assert_eq!(
        outcome,
        Outcome::Failed {
            step: Some(WriteStep::Completion)
        }
    );
    assert_eq!(
        host.tables()?,
        Tables {
            players: 0,
            achievements: 0,
            completions: 0
        }
    );
    // The announcement still went out.
    assert_eq!(
        host.announcements(),
        vec!["Alice completed the achievement story/root".to_string()]
    );

    host.clear_fault()?;
    assert!(matches!(
        host.complete(player, "Alice", "story/root"),
        Outcome::Recorded(_)
    ));
    assert!(matches!(
        host.complete(player, "Alice", "story/root"),
        Outcome::AlreadyRecorded(_)
    ));
    assert_eq!(host.tables()?.completions, 1);
    Ok(())
}

#[test]
fn fault_after_first_record_never_duplicates() -> Result<(), Box<dyn std::error::Error>> {
    let host = TestHost::new()?;
    let player = PlayerId::new_random();
    host.complete(player, "Alice", "story/root");

    host.inject_fault()?;
    // Conflicting inserts still hit the trigger, so the repeat fails loudly.
    assert!(host.complete(player, "Alice", "story/root").is_failure());
    host.clear_fault()?;

    assert_eq!(
        host.tables()?,
        Tables {
            players: 1,
            achievements: 1,
            completions: 1
        }
    );
    Ok(())
}

#[test]
fn oversized_name_fails_without_rows() -> Result<(), Box<dyn std::error::Error>> {
    let host = TestHost::new()?;
    let outcome = host.complete(PlayerId::new_random(), &"x".repeat(33), "story/root");
    assert_eq!(
        outcome,
        Outcome::Failed {
            step: Some(WriteStep::Player)
        }
    );
    assert_eq!(host.tables()?.players, 0);
    Ok(())
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn concurrent_duplicates_record_once() -> Result<(), Box<dyn std::error::Error>> {
    let host = Arc::new(TestHost::new()?);
    let player = PlayerId::new_random();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let host = Arc::clone(&host);
            thread::spawn(move || host.complete(player, "Alice", "story/root"))
        })
        .collect();
    let outcomes: Vec<Outcome> = handles
        .into_iter()
        .map(|h| h.join().expect("worker panicked"))
        .collect();

    let recorded = outcomes
        .iter()
        .filter(|o| matches!(o, Outcome::Recorded(_)))
        .count();
    assert_eq!(recorded, 1);
    assert!(outcomes.iter().all(|o| !o.is_failure()));
    assert_eq!(host.tables()?.completions, 1);
    Ok(())
}

#[test]
fn concurrent_players_share_reference_rows() -> Result<(), Box<dyn std::error::Error>> {
    let host = Arc::new(TestHost::new()?);
    let players: Vec<PlayerId> = (0..6).map(|_| PlayerId::new_random()).collect();

    let handles: Vec<_> = players
        .iter()
        .enumerate()
        .map(|(i, &player)| {
            let host = Arc::clone(&host);
            thread::spawn(move || {
                let name = format!("player{i}");
                host.complete(player, &name, "story/root");
                host.complete(player, &name, "story/mine_stone");
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker panicked");
    }

    assert_eq!(
        host.tables()?,
        Tables {
            players: 6,
            achievements: 2,
            completions: 12
        }
    );
    Ok(())
}

#[test]
fn separate_connections_rely_on_pair_key() -> Result<(), Box<dyn std::error::Error>> {
    let host = TestHost::new()?;
    let player = PlayerId::new_random();
    let event = CompletionEvent::new(player, "Alice", "story/root");

    let handles = (0..4)
        .map(|_| -> Result<_, EngineError> {
            let ledger = host.second_ledger()?;
            let event = event.clone();
            Ok(thread::spawn(move || {
                (0..5)
                    .map(|_| ledger.record(&event).map(|r| r.newly_recorded))
                    .collect::<Vec<_>>()
            }))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut newly = 0;
    for handle in handles {
        for result in handle.join().expect("worker panicked") {
            if result? {
                newly += 1;
            }
        }
    }
    assert_eq!(newly, 1);
    assert_eq!(host.tables()?.completions, 1);
    Ok(())
}
