//! Hint unlock ritual types, as rendered by the presentation layer.

use serde::{Deserialize, Serialize};

use crate::PuzzleId;

/// Interaction required to unlock one hint tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UnlockMode {
    /// One button press.
    Confirm,
    /// A countdown that grants on reaching zero.
    Timed,
    /// Repeated activations of a control.
    Challenge,
    /// A phrase typed into the terminal.
    Command,
}

impl UnlockMode {
    /// Modes available to easy and medium puzzles.
    pub const FRICTION: [UnlockMode; 3] =
        [UnlockMode::Confirm, UnlockMode::Timed, UnlockMode::Challenge];
}

/// Read-only snapshot of the active ritual.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct RitualView {
    pub puzzle_id: PuzzleId,
    pub tier: u32,
    pub mode: UnlockMode,
    /// Seconds left on a timed ritual.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub remaining_secs: Option<u32>,
    /// Activations so far on a challenge ritual.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub taps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub taps_required: Option<u32>,
    /// Phrase to type for a command ritual.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub required_command: Option<String>,
    /// The command was seen; grant is imminent.
    pub verified: bool,
}
