//! # hacklab-types
//!
//! Shared domain types used across the Hacklab workspace: puzzle
//! definitions, hint tiers, unlock rituals as seen by renderers, and the
//! command-dispatch payload. The persisted key schema lives here too so
//! every crate agrees on it.

pub mod events;
pub mod puzzle;
pub mod unlock;

pub use events::CommandDispatched;
pub use puzzle::{ActionAttempt, Difficulty, HintTier, Puzzle, PuzzleKind, TerminalAction};
pub use unlock::{RitualView, UnlockMode};

/// Common type aliases.
pub type PuzzleId = String;
pub type BadgeId = String;

/// Prefix of the per-puzzle solved flag key.
pub const SOLVED_KEY_PREFIX: &str = "puzzle_solved_";

/// Value stored under a solved flag key. Anything else reads as unsolved.
pub const SOLVED_FLAG: &str = "1";

/// JSON object: puzzle id -> highest unlocked hint tier.
pub const HINT_USAGE_KEY: &str = "puzzle_hint_usage";

/// JSON array of badge ids, append-only.
pub const BADGES_KEY: &str = "portfolio_badges";

/// JSON array of terminal log lines (cosmetic restore only).
pub const TERMINAL_HISTORY_KEY: &str = "terminal_history";

/// Maximum hint tiers per puzzle.
pub const MAX_HINT_TIERS: usize = 3;

/// Badge granted when the terminal boot sequence completes.
pub const BOOT_BADGE: &str = "boot_sequence";

/// Storage key of the solved flag for `id`.
pub fn solved_key(id: &str) -> String {
    format!("{SOLVED_KEY_PREFIX}{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solved_key() {
        assert_eq!(solved_key("scan"), "puzzle_solved_scan");
    }

    #[test]
    #[ignore] // Run manually to generate bindings
    fn export_ts_bindings() {
        use ts_rs::TS;
        let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../bindings");
        std::fs::create_dir_all(&dir).expect("create bindings dir");
        crate::puzzle::Puzzle::export_all_to(&dir).expect("export");
        crate::puzzle::HintTier::export_all_to(&dir).expect("export");
        crate::unlock::RitualView::export_all_to(&dir).expect("export");
        crate::events::CommandDispatched::export_all_to(&dir).expect("export");
    }
}
