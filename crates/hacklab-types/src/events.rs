//! Command-dispatch payload shared by the terminal and the hint unlock
//! controller.

use serde::{Deserialize, Serialize};

/// One processed terminal line, broadcast to every interested subscriber.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct CommandDispatched {
    /// Raw text as typed (trimmed).
    pub command: String,
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
}

impl CommandDispatched {
    /// Case-insensitive comparison against an expected command phrase.
    pub fn matches(&self, expected: &str) -> bool {
        self.command.trim().eq_ignore_ascii_case(expected.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_ignores_case_and_padding() {
        let cmd = CommandDispatched {
            command: "  UNLOCK Hint 2 ".to_string(),
            timestamp: 0,
        };
        assert!(cmd.matches("unlock hint 2"));
        assert!(!cmd.matches("unlock hint 3"));
    }
}
