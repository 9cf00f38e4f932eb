//! Integration test: hint unlock rituals under paused time.
//!
//! Exercises each friction mode end to end, and checks that a ritual that
//! was cancelled or replaced can never grant its hint later.

use std::sync::Arc;
use std::time::Duration;

use hacklab_engine::catalog::default_catalog;
use hacklab_engine::config::EngineConfig;
use hacklab_engine::registry::PuzzleRegistry;
use hacklab_engine::unlock::{IgnoreReason, UnlockEvent, UnlockRequest};
use hacklab_engine::Lab;
use hacklab_store::Persistence;
use hacklab_types::{Puzzle, UnlockMode};

fn lab(mode: UnlockMode) -> Lab {
    let registry = Arc::new(PuzzleRegistry::new(default_catalog()).expect("catalog"));
    let (store, _) = Persistence::in_memory();
    Lab::with_selector(
        registry,
        store,
        EngineConfig::default(),
        Arc::new(move |_: &Puzzle| mode),
    )
}

#[tokio::test(start_paused = true)]
async fn timed_ritual_counts_down_then_grants() {
    let lab = lab(UnlockMode::Timed);
    let mut events = lab.hints().subscribe();
    assert_eq!(
        lab.request_unlock("scan", 1),
        UnlockRequest::Started(UnlockMode::Timed)
    );

    tokio::time::sleep(Duration::from_millis(5500)).await;
    assert_eq!(lab.unlocked_hints("scan").len(), 1);

    let mut ticks = Vec::new();
    let mut granted = false;
    while let Ok(event) = events.try_recv() {
        match event {
            UnlockEvent::Tick { remaining_secs } => ticks.push(remaining_secs),
            UnlockEvent::Granted { .. } => granted = true,
            _ => {}
        }
    }
    assert_eq!(ticks, vec![4, 3, 2, 1, 0]);
    assert!(granted);
}

#[tokio::test(start_paused = true)]
async fn cancelled_timed_ritual_never_grants() {
    let lab = lab(UnlockMode::Timed);
    lab.request_unlock("scan", 1);
    tokio::time::sleep(Duration::from_millis(4900)).await;
    assert!(lab.cancel());

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(lab.unlocked_hints("scan").is_empty());
    assert_eq!(lab.progress().hint_usage("scan"), 0);
}

#[tokio::test(start_paused = true)]
async fn replacing_a_timed_ritual_discards_it() {
    let lab = lab(UnlockMode::Timed);
    lab.request_unlock("scan", 1);
    tokio::time::sleep(Duration::from_secs(3)).await;
    lab.request_unlock("cookie", 1);

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(lab.progress().hint_usage("scan"), 0);
    assert_eq!(lab.progress().hint_usage("cookie"), 0);

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(lab.progress().hint_usage("scan"), 0);
    assert_eq!(lab.progress().hint_usage("cookie"), 1);
}

#[tokio::test(start_paused = true)]
async fn challenge_needs_three_taps() {
    let lab = lab(UnlockMode::Challenge);
    lab.request_unlock("console", 1);
    assert!(!lab.tap());
    assert!(!lab.tap());
    assert!(lab.tap());
    assert_eq!(lab.unlocked_hints("console")[0].text, "Open the developer tools.");
}

#[tokio::test(start_paused = true)]
async fn secret_puzzle_unlocks_through_the_terminal() {
    let lab = lab(UnlockMode::Confirm);
    let terminal = lab.terminal();
    terminal.boot().await;

    assert_eq!(
        lab.request_unlock("awakening", 1),
        UnlockRequest::Started(UnlockMode::Command)
    );
    assert!(!lab.confirm());

    terminal.submit("unlock hint 2").await;
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(lab.progress().hint_usage("awakening"), 0);

    terminal.submit("Unlock Hint 1").await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    let view = lab.ritual().expect("pending");
    assert!(view.verified);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(lab.progress().hint_usage("awakening"), 1);

    assert_eq!(
        lab.request_unlock("awakening", 1),
        UnlockRequest::Ignored(IgnoreReason::AlreadyUnlocked)
    );
}

#[tokio::test(start_paused = true)]
async fn unmounted_terminal_cannot_complete_a_command_ritual() {
    let lab = lab(UnlockMode::Confirm);
    let terminal = lab.terminal();
    terminal.boot().await;
    lab.request_unlock("vault", 1);
    terminal.unmount();

    assert_eq!(
        terminal.submit("unlock hint 1").await,
        hacklab_engine::terminal::SubmitOutcome::Unmounted
    );
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(lab.progress().hint_usage("vault"), 0);
    assert!(lab.ritual().is_some());
    assert!(lab.cancel());
}
