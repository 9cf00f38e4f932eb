//! Solution checking.

use std::sync::Arc;

use hacklab_store::Persistence;
use hacklab_types::{Puzzle, PuzzleKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::progress::ProgressTracker;
use crate::registry::PuzzleRegistry;

pub const MSG_NOT_FOUND: &str = "puzzle not found";
pub const MSG_ACCEPTED: &str = "access granted. puzzle solved.";
pub const MSG_KEY_STORED: &str = "key accepted and stored. puzzle solved.";
pub const MSG_REJECTED: &str = "access denied. try again.";
pub const MSG_PREREQUISITES: &str = "prerequisites missing. solve the earlier puzzles first.";

/// Result of a solution attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub accepted: bool,
    /// This attempt flipped the solved flag. False for repeats and when the
    /// flag could not be written.
    pub newly_solved: bool,
    pub message: String,
}

impl CheckOutcome {
    fn accepted(message: &str, newly_solved: bool) -> Self {
        Self {
            accepted: true,
            newly_solved,
            message: message.to_string(),
        }
    }

    fn rejected(message: &str) -> Self {
        Self {
            accepted: false,
            newly_solved: false,
            message: message.to_string(),
        }
    }
}

/// Matches attempts against a puzzle's solutions and records solves.
#[derive(Clone)]
pub struct SolutionChecker {
    registry: Arc<PuzzleRegistry>,
    progress: ProgressTracker,
    store: Persistence,
}

impl SolutionChecker {
    pub fn new(registry: Arc<PuzzleRegistry>, progress: ProgressTracker, store: Persistence) -> Self {
        Self {
            registry,
            progress,
            store,
        }
    }

    /// Check `attempt` against puzzle `puzzle_id`. Never fails; malformed
    /// or empty input is simply a non-match.
    pub fn check(&self, puzzle_id: &str, attempt: &str) -> CheckOutcome {
        let Some(puzzle) = self.registry.find(puzzle_id) else {
            return CheckOutcome::rejected(MSG_NOT_FOUND);
        };

        if !self.progress.dependencies_met(puzzle) {
            debug!(puzzle_id, "solution attempt before prerequisites");
            return CheckOutcome::rejected(MSG_PREREQUISITES);
        }

        if puzzle.kind == PuzzleKind::StoredKeyValue {
            if let Some((key, value)) = key_value_match(puzzle, attempt) {
                self.store.set(&key, &value);
                let newly_solved = self.progress.mark_solved(&puzzle.id);
                debug!(puzzle_id, key = %key, "key-value solution stored");
                return CheckOutcome::accepted(MSG_KEY_STORED, newly_solved);
            }
        }

        if matches_solution(puzzle, attempt) {
            let newly_solved = self.progress.mark_solved(&puzzle.id);
            return CheckOutcome::accepted(MSG_ACCEPTED, newly_solved);
        }

        debug!(puzzle_id, "solution attempt rejected");
        CheckOutcome::rejected(MSG_REJECTED)
    }
}

fn normalize(puzzle: &Puzzle, text: &str) -> String {
    if puzzle.case_insensitive {
        text.to_lowercase()
    } else {
        text.to_string()
    }
}

/// Exact match against any solution, honoring the case rule.
fn matches_solution(puzzle: &Puzzle, attempt: &str) -> bool {
    let attempt = attempt.trim();
    if attempt.is_empty() {
        return false;
    }
    let attempt = normalize(puzzle, attempt);
    puzzle
        .solutions
        .iter()
        .any(|solution| normalize(puzzle, solution) == attempt)
}

/// For `key=value` attempts with exactly one `=`, the trimmed pair when it
/// matches a solution.
fn key_value_match(puzzle: &Puzzle, attempt: &str) -> Option<(String, String)> {
    if attempt.matches('=').count() != 1 {
        return None;
    }
    let (key, value) = attempt.split_once('=')?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() {
        return None;
    }
    let rebuilt = format!("{key}={value}");
    matches_solution(puzzle, &rebuilt).then(|| (key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use hacklab_store::MemoryStore;

    use super::*;
    use crate::registry::tests::puzzle;
    use crate::registry::Catalog;

    fn checker_with(puzzles: Vec<Puzzle>) -> (SolutionChecker, ProgressTracker, Arc<MemoryStore>) {
        let registry = Arc::new(
            PuzzleRegistry::new(Catalog {
                help_puzzle: None,
                puzzles,
                actions: vec![],
            })
            .expect("registry"),
        );
        let (port, store) = Persistence::in_memory();
        let progress = ProgressTracker::new(registry.clone(), port.clone());
        (SolutionChecker::new(registry, progress.clone(), port), progress, store)
    }

    fn key_value_puzzle(id: &str, solution: &str) -> Puzzle {
        let mut p = puzzle(id, solution);
        p.kind = PuzzleKind::StoredKeyValue;
        p
    }

    #[test]
    fn test_case_sensitive_rejects_case_variant() {
        let (checker, progress, _) = checker_with(vec![puzzle("p1", "FOO")]);
        let outcome = checker.check("p1", "foo");
        assert!(!outcome.accepted);
        assert_eq!(outcome.message, MSG_REJECTED);
        assert!(!progress.is_solved("p1"));

        let outcome = checker.check("p1", "FOO");
        assert!(outcome.accepted);
        assert_eq!(outcome.message, MSG_ACCEPTED);
        assert!(progress.is_solved("p1"));
        assert_eq!(progress.badges(), vec!["p1"]);
    }

    #[test]
    fn test_case_insensitive_accepts_case_variant() {
        let mut p = puzzle("p1", "FOO");
        p.case_insensitive = true;
        let (checker, _, _) = checker_with(vec![p]);
        assert!(checker.check("p1", "foo").accepted);
    }

    #[test]
    fn test_any_solution_wins() {
        let mut p = puzzle("p1", "alpha");
        p.solutions.push("beta".to_string());
        let (checker, _, _) = checker_with(vec![p]);
        assert!(checker.check("p1", "beta").accepted);
    }

    #[test]
    fn test_unknown_puzzle() {
        let (checker, _, store) = checker_with(vec![puzzle("p1", "x")]);
        let outcome = checker.check("missing", "x");
        assert!(!outcome.accepted);
        assert_eq!(outcome.message, MSG_NOT_FOUND);
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_empty_and_malformed_attempts_are_non_matches() {
        let (checker, _, _) = checker_with(vec![key_value_puzzle("p3", "KEY=VAL")]);
        for attempt in ["", "   ", "=", "==", "KEY=VAL=", "=VAL", "\u{0}"] {
            assert!(!checker.check("p3", attempt).accepted, "attempt {attempt:?}");
        }
    }

    #[test]
    fn test_key_value_stores_pair() {
        let (checker, progress, store) = checker_with(vec![key_value_puzzle("p3", "KEY=VAL")]);
        let outcome = checker.check("p3", "KEY=VAL");
        assert!(outcome.accepted);
        assert_eq!(outcome.message, MSG_KEY_STORED);
        assert_ne!(MSG_KEY_STORED, MSG_ACCEPTED);
        assert_eq!(store.snapshot().get("KEY").map(String::as_str), Some("VAL"));
        assert!(progress.is_solved("p3"));
    }

    #[test]
    fn test_key_value_trims_sides() {
        let (checker, _, store) = checker_with(vec![key_value_puzzle("p3", "KEY=VAL")]);
        assert!(checker.check("p3", "  KEY = VAL ").accepted);
        assert_eq!(store.snapshot().get("KEY").map(String::as_str), Some("VAL"));
    }

    #[test]
    fn test_key_value_only_for_stored_kind() {
        let (checker, _, store) = checker_with(vec![puzzle("p1", "KEY=VAL")]);
        assert!(checker.check("p1", "KEY=VAL").accepted);
        assert!(!store.snapshot().contains_key("KEY"));
    }

    #[test]
    fn test_repeated_solve_is_idempotent() {
        let (checker, progress, _) = checker_with(vec![puzzle("p1", "x")]);
        assert!(checker.check("p1", "x").newly_solved);
        for _ in 0..3 {
            let outcome = checker.check("p1", "x");
            assert!(outcome.accepted);
            assert!(!outcome.newly_solved);
        }
        assert_eq!(progress.badges(), vec!["p1"]);
    }

    #[test]
    fn test_gated_puzzle_rejected_until_dependencies_solved() {
        let mut gated = puzzle("p2", "cracked");
        gated.depends_on = vec!["p1".to_string()];
        let (checker, progress, store) = checker_with(vec![puzzle("p1", "FOO"), gated]);

        let outcome = checker.check("p2", "cracked");
        assert!(!outcome.accepted);
        assert!(!outcome.newly_solved);
        assert_eq!(outcome.message, MSG_PREREQUISITES);
        assert!(!progress.is_solved("p2"));
        assert!(store.snapshot().is_empty());

        assert!(checker.check("p1", "FOO").accepted);
        let outcome = checker.check("p2", "cracked");
        assert!(outcome.accepted);
        assert!(outcome.newly_solved);
        assert_eq!(progress.badges(), vec!["p1", "p2"]);
    }

    #[test]
    fn test_gated_key_value_puzzle_writes_nothing() {
        let mut gated = key_value_puzzle("p3", "KEY=VAL");
        gated.depends_on = vec!["p1".to_string()];
        let (checker, progress, store) = checker_with(vec![puzzle("p1", "FOO"), gated]);

        let outcome = checker.check("p3", "KEY=VAL");
        assert_eq!(outcome.message, MSG_PREREQUISITES);
        assert!(!store.snapshot().contains_key("KEY"));
        assert!(!progress.is_solved("p3"));
    }

    #[test]
    fn test_unwritable_solve_is_not_new() {
        let (checker, progress, store) = checker_with(vec![puzzle("p1", "x")]);
        store.set_unavailable(true);
        let outcome = checker.check("p1", "x");
        assert!(outcome.accepted);
        assert!(!outcome.newly_solved);
        store.set_unavailable(false);
        assert!(!progress.is_solved("p1"));
    }
}
