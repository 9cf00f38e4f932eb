//! Progress tracking: solved flags, badge ledger, hint usage and
//! hidden-puzzle visibility.
//!
//! All state lives in the store; the tracker only caches the sticky
//! reveal-all flag, which holds for the rest of the session once fired.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hacklab_store::Persistence;
use hacklab_types::{
    solved_key, BadgeId, Puzzle, PuzzleId, BADGES_KEY, HINT_USAGE_KEY, SOLVED_FLAG,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::registry::PuzzleRegistry;

/// Hint usage as persisted: puzzle id -> highest unlocked tier.
pub type HintUsage = BTreeMap<PuzzleId, u32>;

/// Derived progress counts for rendering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub solved: usize,
    pub total: usize,
    /// Every non-hidden puzzle has been solved this session.
    pub reveal_all: bool,
    /// Hidden puzzles currently listed.
    pub visible_hidden: Vec<PuzzleId>,
}

/// In-process progress notifications.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgressEvent {
    Solved { puzzle_id: PuzzleId, badge: BadgeId },
    BadgeGranted { badge: BadgeId },
    HintUnlocked { puzzle_id: PuzzleId, tier: u32 },
    RevealAll,
    ExternalSync(ProgressSnapshot),
}

struct TrackerInner {
    registry: Arc<PuzzleRegistry>,
    store: Persistence,
    reveal_all: AtomicBool,
    events: broadcast::Sender<ProgressEvent>,
}

/// Reads and writes progress through the persistence port.
#[derive(Clone)]
pub struct ProgressTracker {
    inner: Arc<TrackerInner>,
}

impl ProgressTracker {
    pub fn new(registry: Arc<PuzzleRegistry>, store: Persistence) -> Self {
        let (events, _) = broadcast::channel(128);
        let tracker = Self {
            inner: Arc::new(TrackerInner {
                registry,
                store,
                reveal_all: AtomicBool::new(false),
                events,
            }),
        };
        tracker.refresh();
        tracker
    }

    /// Whether the persisted flag for `id` is set. False when unreadable.
    pub fn is_solved(&self, id: &str) -> bool {
        self.inner.store.get(&solved_key(id)).as_deref() == Some(SOLVED_FLAG)
    }

    /// Set the solved flag and grant the puzzle's badge.
    ///
    /// Idempotent. Returns `true` only when this call solved the puzzle and
    /// the flag reached the store. Unknown ids are ignored.
    pub fn mark_solved(&self, id: &str) -> bool {
        let Some(puzzle) = self.inner.registry.find(id) else {
            debug!(puzzle_id = id, "mark_solved on unknown puzzle ignored");
            return false;
        };

        let newly_solved =
            !self.is_solved(id) && self.inner.store.set(&solved_key(id), SOLVED_FLAG);
        let badge = puzzle.badge().to_string();
        self.append_badge(&badge);

        if newly_solved {
            info!(puzzle_id = id, badge = %badge, "puzzle solved");
            self.emit(ProgressEvent::Solved {
                puzzle_id: id.to_string(),
                badge,
            });
            self.refresh();
        }
        newly_solved
    }

    /// Append a side-quest badge. Returns `true` if it was new.
    pub fn grant_badge(&self, badge: &str) -> bool {
        let added = self.append_badge(badge);
        if added {
            info!(badge, "badge granted");
            self.emit(ProgressEvent::BadgeGranted {
                badge: badge.to_string(),
            });
        }
        added
    }

    /// The badge ledger in grant order.
    pub fn badges(&self) -> Vec<BadgeId> {
        self.inner.store.get_json(BADGES_KEY)
    }

    /// Highest unlocked hint tier for `id` (0 = none).
    pub fn hint_usage(&self, id: &str) -> u32 {
        let usage: HintUsage = self.inner.store.get_json(HINT_USAGE_KEY);
        usage.get(id).copied().unwrap_or(0)
    }

    /// Raise hint usage to `max(current, tier)`. Returns the resulting tier.
    pub fn raise_hint_usage(&self, id: &str, tier: u32) -> u32 {
        let mut raised = false;
        let usage: HintUsage = self.inner.store.update_json(HINT_USAGE_KEY, |usage: &mut HintUsage| {
            let current = usage.entry(id.to_string()).or_insert(0);
            if tier > *current {
                *current = tier;
                raised = true;
            }
            raised
        });
        if raised {
            self.emit(ProgressEvent::HintUnlocked {
                puzzle_id: id.to_string(),
                tier,
            });
        }
        usage.get(id).copied().unwrap_or(0)
    }

    /// Whether every prerequisite of `puzzle` is solved.
    pub fn dependencies_met(&self, puzzle: &Puzzle) -> bool {
        puzzle.depends_on.iter().all(|dep| self.is_solved(dep))
    }

    /// Listing rule: not hidden, or reveal-all fired, or a non-empty
    /// dependency set is fully solved.
    pub fn is_visible(&self, puzzle: &Puzzle) -> bool {
        !puzzle.hidden
            || self.reveal_all_fired()
            || (puzzle.is_gated() && self.dependencies_met(puzzle))
    }

    /// Puzzles to list right now, in catalog order.
    pub fn visible_puzzles(&self) -> Vec<&Puzzle> {
        self.inner
            .registry
            .iter()
            .filter(|p| self.is_visible(p))
            .collect()
    }

    pub fn solved_count(&self) -> usize {
        self.inner
            .registry
            .iter()
            .filter(|p| self.is_solved(&p.id))
            .count()
    }

    pub fn total(&self) -> usize {
        self.inner.registry.len()
    }

    pub fn reveal_all_fired(&self) -> bool {
        self.inner.reveal_all.load(Ordering::SeqCst)
    }

    /// Re-evaluate the reveal-all condition. Returns whether it fired now.
    pub fn refresh(&self) -> bool {
        if self.reveal_all_fired() {
            return false;
        }
        let all_visible_solved = self
            .inner
            .registry
            .iter()
            .filter(|p| !p.hidden)
            .all(|p| self.is_solved(&p.id));
        if !all_visible_solved {
            return false;
        }
        if self.inner.reveal_all.swap(true, Ordering::SeqCst) {
            return false;
        }
        info!("all visible puzzles solved, revealing hidden puzzles");
        self.emit(ProgressEvent::RevealAll);
        true
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            solved: self.solved_count(),
            total: self.total(),
            reveal_all: self.reveal_all_fired(),
            visible_hidden: self
                .inner
                .registry
                .iter()
                .filter(|p| p.hidden && self.is_visible(p))
                .map(|p| p.id.clone())
                .collect(),
        }
    }

    /// Subscribe to in-process progress events.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.inner.events.subscribe()
    }

    /// Recompute derived state whenever another view writes to the store,
    /// then hand `callback` a fresh snapshot.
    ///
    /// Listening stops when the returned guard is dropped.
    pub fn on_external_change<F>(&self, callback: F) -> SyncGuard
    where
        F: Fn(ProgressSnapshot) + Send + 'static,
    {
        let mut changes = self.inner.store.subscribe();
        let tracker = self.clone();
        let handle = tokio::spawn(async move {
            while let Some(change) = changes.recv().await {
                debug!(key = %change.key, "external storage change");
                tracker.refresh();
                let snapshot = tracker.snapshot();
                tracker.emit(ProgressEvent::ExternalSync(snapshot.clone()));
                callback(snapshot);
            }
        });
        SyncGuard { handle }
    }

    fn append_badge(&self, badge: &str) -> bool {
        let mut added = false;
        self.inner
            .store
            .update_json(BADGES_KEY, |badges: &mut Vec<BadgeId>| {
                if !badges.iter().any(|b| b == badge) {
                    badges.push(badge.to_string());
                    added = true;
                }
                added
            });
        added
    }

    fn emit(&self, event: ProgressEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.inner.events.send(event);
    }
}

/// Keeps an external-change listener alive.
pub struct SyncGuard {
    handle: JoinHandle<()>,
}

impl Drop for SyncGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use hacklab_store::{KvStore, MemoryStore};

    use super::*;
    use crate::registry::tests::puzzle;
    use crate::registry::Catalog;

    fn tracker_with(puzzles: Vec<Puzzle>) -> (ProgressTracker, Arc<MemoryStore>, Persistence) {
        let registry = Arc::new(
            PuzzleRegistry::new(Catalog {
                help_puzzle: None,
                puzzles,
                actions: vec![],
            })
            .expect("registry"),
        );
        let (port, store) = Persistence::in_memory();
        (ProgressTracker::new(registry, port.clone()), store, port)
    }

    #[test]
    fn test_mark_solved_is_idempotent() {
        let (tracker, store, _) = tracker_with(vec![puzzle("p1", "FOO")]);
        assert!(tracker.mark_solved("p1"));
        for _ in 0..5 {
            assert!(!tracker.mark_solved("p1"));
        }
        assert!(tracker.is_solved("p1"));
        assert_eq!(tracker.badges(), vec!["p1"]);
        assert_eq!(
            store.snapshot().get("puzzle_solved_p1").map(String::as_str),
            Some("1")
        );
    }

    #[test]
    fn test_badge_uses_badge_id() {
        let mut p = puzzle("scan", "x");
        p.badge_id = Some("netrunner".to_string());
        let (tracker, _, _) = tracker_with(vec![p]);
        tracker.mark_solved("scan");
        assert_eq!(tracker.badges(), vec!["netrunner"]);
    }

    #[test]
    fn test_unknown_puzzle_not_marked() {
        let (tracker, store, _) = tracker_with(vec![puzzle("p1", "x")]);
        assert!(!tracker.mark_solved("nope"));
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_solved_flag_requires_exact_value() {
        let (tracker, store, _) = tracker_with(vec![puzzle("p1", "x")]);
        store.set("puzzle_solved_p1", "true").expect("seed");
        assert!(!tracker.is_solved("p1"));
        store.set("puzzle_solved_p1", "1").expect("seed");
        assert!(tracker.is_solved("p1"));
    }

    #[test]
    fn test_storage_unavailable_fails_open() {
        let (tracker, store, _) = tracker_with(vec![puzzle("p1", "x")]);
        store.set_unavailable(true);
        assert!(!tracker.is_solved("p1"));
        assert!(!tracker.mark_solved("p1"));
        assert!(tracker.badges().is_empty());
        assert_eq!(tracker.hint_usage("p1"), 0);
    }

    #[test]
    fn test_grant_badge_deduplicates() {
        let (tracker, _, _) = tracker_with(vec![puzzle("p1", "x")]);
        assert!(tracker.grant_badge("boot_sequence"));
        assert!(!tracker.grant_badge("boot_sequence"));
        tracker.mark_solved("p1");
        assert_eq!(tracker.badges(), vec!["boot_sequence", "p1"]);
    }

    #[test]
    fn test_hint_usage_is_monotonic() {
        let (tracker, _, _) = tracker_with(vec![puzzle("p1", "x")]);
        assert_eq!(tracker.raise_hint_usage("p1", 2), 2);
        assert_eq!(tracker.raise_hint_usage("p1", 1), 2);
        assert_eq!(tracker.hint_usage("p1"), 2);
        assert_eq!(tracker.raise_hint_usage("p1", 3), 3);
        assert_eq!(tracker.hint_usage("other"), 0);
    }

    #[test]
    fn test_gated_hidden_puzzle_visible_once_dependencies_solved() {
        let p1 = puzzle("p1", "x");
        let p2 = puzzle("p2", "y");
        let mut gated = puzzle("gated", "z");
        gated.hidden = true;
        gated.depends_on = vec!["p1".to_string()];
        let (tracker, _, _) = tracker_with(vec![p1, p2, gated]);

        let ids = |t: &ProgressTracker| -> Vec<String> {
            t.visible_puzzles().iter().map(|p| p.id.clone()).collect()
        };
        assert_eq!(ids(&tracker), vec!["p1", "p2"]);
        tracker.mark_solved("p1");
        assert_eq!(ids(&tracker), vec!["p1", "p2", "gated"]);
        assert!(!tracker.reveal_all_fired());
    }

    #[test]
    fn test_reveal_all_fires_and_sticks() {
        let p1 = puzzle("p1", "x");
        let mut p4 = puzzle("p4", "boo");
        p4.hidden = true;
        let (tracker, store, _) = tracker_with(vec![p1, p4]);
        let mut events = tracker.subscribe();

        assert_eq!(tracker.visible_puzzles().len(), 1);
        tracker.mark_solved("p1");
        assert!(tracker.reveal_all_fired());
        assert_eq!(tracker.visible_puzzles().len(), 2);
        assert_eq!(tracker.snapshot().visible_hidden, vec!["p4"]);

        let mut saw_reveal = false;
        while let Ok(event) = events.try_recv() {
            saw_reveal |= event == ProgressEvent::RevealAll;
        }
        assert!(saw_reveal);

        // Losing the flag behind the tracker's back does not un-reveal.
        store.remove("puzzle_solved_p1").expect("remove");
        tracker.refresh();
        assert!(tracker.reveal_all_fired());
    }

    #[test]
    fn test_reveal_all_from_previous_session() {
        let (port, store) = Persistence::in_memory();
        store.set("puzzle_solved_p1", "1").expect("seed");
        let mut p4 = puzzle("p4", "boo");
        p4.hidden = true;
        let registry = Arc::new(
            PuzzleRegistry::new(Catalog {
                help_puzzle: None,
                puzzles: vec![puzzle("p1", "x"), p4],
                actions: vec![],
            })
            .expect("registry"),
        );
        let tracker = ProgressTracker::new(registry, port);
        assert!(tracker.reveal_all_fired());
    }

    #[tokio::test]
    async fn test_external_change_recomputes() {
        let p1 = puzzle("p1", "x");
        let mut p4 = puzzle("p4", "boo");
        p4.hidden = true;
        let puzzles = vec![p1, p4];
        let (tab_a, _, port) = tracker_with(puzzles.clone());
        let registry = Arc::new(
            PuzzleRegistry::new(Catalog {
                help_puzzle: None,
                puzzles,
                actions: vec![],
            })
            .expect("registry"),
        );
        let tab_b = ProgressTracker::new(registry, port.open_view());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _guard = tab_b.on_external_change(move |snapshot| {
            sink.lock().expect("lock").push(snapshot);
        });
        tokio::task::yield_now().await;

        tab_a.mark_solved("p1");

        for _ in 0..50 {
            if tab_b.reveal_all_fired() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(tab_b.reveal_all_fired());
        assert!(tab_b.is_solved("p1"));
        let last = seen.lock().expect("lock").last().cloned().expect("snapshot");
        assert_eq!(last.solved, 1);
        assert!(last.reveal_all);
    }

    #[tokio::test]
    async fn test_own_writes_do_not_trigger_external_sync() {
        let (tracker, _, _) = tracker_with(vec![puzzle("p1", "x"), puzzle("p2", "y")]);
        let seen = Arc::new(Mutex::new(0u32));
        let sink = seen.clone();
        let _guard = tracker.on_external_change(move |_| {
            *sink.lock().expect("lock") += 1;
        });
        tracker.mark_solved("p1");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(*seen.lock().expect("lock"), 0);
    }
}
