//! Engine timing and terminal configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Engine configuration, embedded in the binary's config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Hint unlock ritual settings.
    #[serde(default)]
    pub unlock: UnlockConfig,
    /// Terminal settings.
    #[serde(default)]
    pub terminal: TerminalConfig,
}

/// Hint unlock ritual configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockConfig {
    /// Ticks in a timed ritual.
    #[serde(default = "default_countdown_secs")]
    pub countdown_secs: u32,
    /// Length of one countdown tick.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Activations needed to pass a challenge ritual.
    #[serde(default = "default_challenge_taps")]
    pub challenge_taps: u32,
    /// Pause between seeing the unlock command and granting.
    #[serde(default = "default_verify_delay_ms")]
    pub verify_delay_ms: u64,
}

/// Terminal configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Prompt echoed before every submitted line.
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Lines printed by the boot sequence, in order.
    #[serde(default = "default_boot_lines")]
    pub boot_lines: Vec<String>,
    /// Delay before each boot line.
    #[serde(default = "default_boot_line_delay_ms")]
    pub boot_line_delay_ms: u64,
    /// Simulated processing time of puzzle verbs.
    #[serde(default = "default_action_delay_ms")]
    pub action_delay_ms: u64,
    /// Mirror the log to the store for cosmetic restore.
    #[serde(default = "default_true")]
    pub persist_history: bool,
    /// Most recent lines kept in the mirror.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

// Default value functions

fn default_countdown_secs() -> u32 {
    5
}

fn default_tick_ms() -> u64 {
    1000
}

fn default_challenge_taps() -> u32 {
    3
}

fn default_verify_delay_ms() -> u64 {
    800
}

fn default_prompt() -> String {
    "guest@portfolio:~$".to_string()
}

fn default_boot_lines() -> Vec<String> {
    [
        "[boot] portfolio-os v2.4.1 (tty1)",
        "[ ok ] mounting /dev/curiosity",
        "[ ok ] loading kernel modules: rust, tokio, sqlite",
        "[ ok ] starting hint daemon",
        "[ ok ] restoring session state",
        "[warn] 3 anomalies detected in /var/lab",
        "type 'help' to list available commands.",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_boot_line_delay_ms() -> u64 {
    150
}

fn default_action_delay_ms() -> u64 {
    900
}

fn default_true() -> bool {
    true
}

fn default_history_limit() -> usize {
    200
}

impl Default for UnlockConfig {
    fn default() -> Self {
        Self {
            countdown_secs: default_countdown_secs(),
            tick_ms: default_tick_ms(),
            challenge_taps: default_challenge_taps(),
            verify_delay_ms: default_verify_delay_ms(),
        }
    }
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            boot_lines: default_boot_lines(),
            boot_line_delay_ms: default_boot_line_delay_ms(),
            action_delay_ms: default_action_delay_ms(),
            persist_history: true,
            history_limit: default_history_limit(),
        }
    }
}

impl UnlockConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn verify_delay(&self) -> Duration {
        Duration::from_millis(self.verify_delay_ms)
    }
}

impl TerminalConfig {
    pub fn boot_line_delay(&self) -> Duration {
        Duration::from_millis(self.boot_line_delay_ms)
    }

    pub fn action_delay(&self) -> Duration {
        Duration::from_millis(self.action_delay_ms)
    }
}
