//! Meta commands for driving the puzzle panel from the console.
//!
//! Lines starting with `:` act on the hint unlock controller. Everything
//! else goes to the terminal.

use hacklab_engine::unlock::{IgnoreReason, UnlockEvent, UnlockRequest};
use hacklab_types::{RitualView, UnlockMode};

/// A parsed meta command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Meta {
    /// Request the next hint tier, or a specific one.
    Unlock { puzzle_id: String, tier: Option<u32> },
    Confirm,
    Tap,
    Cancel,
    Ritual,
    Help,
    Quit,
}

/// Parse a meta command. `None` when `line` is not a meta command.
pub fn parse_meta(line: &str) -> Option<Result<Meta, String>> {
    let rest = line.trim().strip_prefix(':')?;
    let mut tokens = rest.split_whitespace();
    let name = tokens.next().unwrap_or_default().to_lowercase();
    let parsed = match name.as_str() {
        "unlock" => match (tokens.next(), tokens.next()) {
            (Some(id), None) => Ok(Meta::Unlock {
                puzzle_id: id.to_string(),
                tier: None,
            }),
            (Some(id), Some(tier)) => tier
                .parse()
                .map(|tier| Meta::Unlock {
                    puzzle_id: id.to_string(),
                    tier: Some(tier),
                })
                .map_err(|_| format!("invalid tier: {tier}")),
            (None, _) => Err("usage: :unlock <puzzle-id> [tier]".to_string()),
        },
        "confirm" => Ok(Meta::Confirm),
        "tap" => Ok(Meta::Tap),
        "cancel" => Ok(Meta::Cancel),
        "ritual" => Ok(Meta::Ritual),
        "help" | "?" => Ok(Meta::Help),
        "quit" | "exit" | "q" => Ok(Meta::Quit),
        other => Err(format!("unknown meta command: :{other}")),
    };
    Some(parsed)
}

pub const META_HELP: &[&str] = &[
    ":unlock <id> [tier]   start a hint unlock ritual",
    ":confirm              confirm the pending ritual",
    ":tap                  tap the challenge button",
    ":cancel               dismiss the pending ritual",
    ":ritual               show the pending ritual",
    ":quit                 leave the lab",
];

/// Describe a request outcome.
pub fn describe_request(puzzle_id: &str, tier: u32, request: UnlockRequest) -> String {
    match request {
        UnlockRequest::Started(mode) => format!("unlocking hint {tier} of {puzzle_id} ({})", mode_name(mode)),
        UnlockRequest::Ignored(IgnoreReason::UnknownPuzzle) => format!("no such puzzle: {puzzle_id}"),
        UnlockRequest::Ignored(IgnoreReason::AlreadyUnlocked) => {
            format!("hint {tier} of {puzzle_id} is already unlocked")
        }
        UnlockRequest::Ignored(IgnoreReason::OutOfSequence) => {
            format!("unlock the earlier hints of {puzzle_id} first")
        }
        UnlockRequest::Ignored(IgnoreReason::NoSuchTier) => {
            format!("{puzzle_id} has no hint {tier}")
        }
    }
}

/// What the player has to do to finish a ritual.
pub fn describe_ritual(view: &RitualView) -> String {
    match view.mode {
        UnlockMode::Confirm => "are you sure? type :confirm or :cancel".to_string(),
        UnlockMode::Timed => format!(
            "revealing in {}s, :cancel to abort",
            view.remaining_secs.unwrap_or_default()
        ),
        UnlockMode::Challenge => format!(
            "prove it: :tap {} times ({} so far)",
            view.taps_required.unwrap_or_default(),
            view.taps.unwrap_or_default()
        ),
        UnlockMode::Command if view.verified => "command verified, decrypting...".to_string(),
        UnlockMode::Command => format!(
            "type `{}` in the terminal",
            view.required_command.as_deref().unwrap_or_default()
        ),
    }
}

/// One-line rendering of an unlock event. `None` for events not worth
/// printing.
pub fn describe_event(event: &UnlockEvent) -> Option<String> {
    match event {
        UnlockEvent::Started { .. } => None,
        UnlockEvent::Tick { remaining_secs } => Some(format!("  ... {remaining_secs}")),
        UnlockEvent::Verified { tier, .. } => Some(format!("  unlock hint {tier} verified")),
        UnlockEvent::Granted { puzzle_id, tier } => {
            Some(format!("  hint {tier} of {puzzle_id} unlocked"))
        }
        UnlockEvent::Cancelled { puzzle_id, tier } => {
            Some(format!("  unlock of hint {tier} for {puzzle_id} dismissed"))
        }
    }
}

fn mode_name(mode: UnlockMode) -> &'static str {
    match mode {
        UnlockMode::Confirm => "confirm",
        UnlockMode::Timed => "timed",
        UnlockMode::Challenge => "challenge",
        UnlockMode::Command => "command",
    }
}
