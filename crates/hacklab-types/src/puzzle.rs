//! Puzzle definitions and catalog entries.

use serde::{Deserialize, Serialize};

use crate::{BadgeId, PuzzleId};

/// How a puzzle is discovered and solved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum PuzzleKind {
    /// Solved by running a terminal verb.
    TerminalTriggered,
    /// Solved by storing a `key=value` pair.
    StoredKeyValue,
    /// Solved by visiting an unlisted route.
    HiddenRoute,
    /// Answer is printed to the developer console.
    ConsolePrinted,
}

/// Puzzle difficulty. Drives hint unlock mode selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Secret,
}

impl Difficulty {
    /// Hard and secret puzzles only unlock hints through a typed command.
    pub fn requires_command_unlock(self) -> bool {
        matches!(self, Difficulty::Hard | Difficulty::Secret)
    }
}

/// One puzzle in the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Puzzle {
    pub id: PuzzleId,
    pub title: String,
    #[serde(default)]
    pub short_hint: String,
    #[serde(default)]
    pub description: String,
    pub kind: PuzzleKind,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub case_insensitive: bool,
    /// Accepted answers. Any match wins.
    pub solutions: Vec<String>,
    /// Hint tiers in disclosure order (1..=3 entries).
    pub hints: Vec<String>,
    /// Badge granted on first solve. Defaults to the puzzle id.
    #[serde(default)]
    pub badge_id: Option<BadgeId>,
    /// Puzzles that must be solved first.
    #[serde(default)]
    pub depends_on: Vec<PuzzleId>,
    #[serde(default)]
    pub hidden: bool,
}

impl Puzzle {
    /// Badge id granted when this puzzle is solved.
    pub fn badge(&self) -> &str {
        self.badge_id.as_deref().unwrap_or(&self.id)
    }

    /// Number of hint tiers.
    pub fn tier_count(&self) -> u32 {
        u32::try_from(self.hints.len()).unwrap_or(u32::MAX)
    }

    /// Hint text for a 1-based tier.
    pub fn hint(&self, tier: u32) -> Option<&str> {
        let index = usize::try_from(tier).ok()?.checked_sub(1)?;
        self.hints.get(index).map(String::as_str)
    }

    /// All hint tiers, numbered from 1.
    pub fn hint_tiers(&self) -> Vec<HintTier> {
        self.hints
            .iter()
            .zip(1u32..)
            .map(|(text, tier)| HintTier {
                tier,
                text: text.clone(),
            })
            .collect()
    }

    /// Whether any prerequisite gates this puzzle.
    pub fn is_gated(&self) -> bool {
        !self.depends_on.is_empty()
    }
}

/// A numbered hint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct HintTier {
    pub tier: u32,
    pub text: String,
}

/// What a terminal action submits to the solution checker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "phrase", rename_all = "snake_case")]
pub enum ActionAttempt {
    /// A fixed phrase particular to the command.
    Fixed(String),
    /// The command's own arguments, joined by single spaces.
    Arguments,
}

/// Binds a terminal verb to a puzzle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalAction {
    /// Lowercase first token.
    pub verb: String,
    /// Required first argument (e.g. the file name for `cat`).
    #[serde(default)]
    pub argument: Option<String>,
    pub puzzle_id: PuzzleId,
    pub attempt: ActionAttempt,
    /// Printed after the simulated processing delay.
    #[serde(default)]
    pub progress: Vec<String>,
    /// Printed when the checker accepts.
    #[serde(default)]
    pub success: Vec<String>,
    /// Printed when the checker rejects.
    #[serde(default = "default_denial")]
    pub denial: String,
}

fn default_denial() -> String {
    "[x] access denied".to_string()
}

impl TerminalAction {
    /// Whether this action handles `verb` with `args`.
    pub fn handles(&self, verb: &str, args: &[String]) -> bool {
        if !self.verb.eq_ignore_ascii_case(verb) {
            return false;
        }
        match &self.argument {
            Some(expected) => args
                .first()
                .is_some_and(|arg| arg.eq_ignore_ascii_case(expected)),
            None => true,
        }
    }

    /// The attempt string for a given invocation.
    pub fn attempt_for(&self, args: &[String]) -> String {
        match &self.attempt {
            ActionAttempt::Fixed(phrase) => phrase.clone(),
            ActionAttempt::Arguments => args.join(" "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Puzzle {
        Puzzle {
            id: "scan".to_string(),
            title: "Port Scan".to_string(),
            short_hint: String::new(),
            description: String::new(),
            kind: PuzzleKind::TerminalTriggered,
            difficulty: Difficulty::Easy,
            case_insensitive: false,
            solutions: vec!["ports open".to_string()],
            hints: vec!["one".to_string(), "two".to_string()],
            badge_id: None,
            depends_on: vec![],
            hidden: false,
        }
    }

    #[test]
    fn test_badge_defaults_to_id() {
        let mut puzzle = sample();
        assert_eq!(puzzle.badge(), "scan");
        puzzle.badge_id = Some("netrunner".to_string());
        assert_eq!(puzzle.badge(), "netrunner");
    }

    #[test]
    fn test_hint_lookup_is_one_based() {
        let puzzle = sample();
        assert_eq!(puzzle.hint(0), None);
        assert_eq!(puzzle.hint(1), Some("one"));
        assert_eq!(puzzle.hint(2), Some("two"));
        assert_eq!(puzzle.hint(3), None);
        assert_eq!(puzzle.hint_tiers()[1].tier, 2);
    }

    #[test]
    fn test_difficulty_command_policy() {
        assert!(!Difficulty::Easy.requires_command_unlock());
        assert!(!Difficulty::Medium.requires_command_unlock());
        assert!(Difficulty::Hard.requires_command_unlock());
        assert!(Difficulty::Secret.requires_command_unlock());
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&PuzzleKind::StoredKeyValue).expect("serialize");
        assert_eq!(json, "\"stored-key-value\"");
    }

    #[test]
    fn test_action_argument_matching() {
        let action = TerminalAction {
            verb: "cat".to_string(),
            argument: Some("secret.txt".to_string()),
            puzzle_id: "fs".to_string(),
            attempt: ActionAttempt::Fixed("read".to_string()),
            progress: vec![],
            success: vec![],
            denial: default_denial(),
        };
        assert!(action.handles("CAT", &["Secret.TXT".to_string()]));
        assert!(!action.handles("cat", &["readme.md".to_string()]));
        assert!(!action.handles("cat", &[]));
        assert_eq!(action.attempt_for(&[]), "read");
    }

    #[test]
    fn test_action_argument_attempt() {
        let action = TerminalAction {
            verb: "unlock".to_string(),
            argument: None,
            puzzle_id: "vault".to_string(),
            attempt: ActionAttempt::Arguments,
            progress: vec![],
            success: vec![],
            denial: default_denial(),
        };
        let args = vec!["0xDEAD".to_string(), "BEEF".to_string()];
        assert_eq!(action.attempt_for(&args), "0xDEAD BEEF");
    }
}
