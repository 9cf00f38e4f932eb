//! Terminal command interpreter.
//!
//! Runs a paced boot sequence, then accepts one line at a time. Each line
//! is echoed, published on the [`CommandBus`] and dispatched. Puzzle verbs
//! come from the catalog's terminal actions; everything else is built in.
//!
//! All scheduled work runs inside the terminal's [`TaskScope`], so
//! unmounting stops the boot sequence and any in-flight command.

mod commands;
pub mod parser;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hacklab_store::Persistence;
use hacklab_types::{BOOT_BADGE, TERMINAL_HISTORY_KEY};
use tracing::{debug, info};

use crate::bus::CommandBus;
use crate::checker::SolutionChecker;
use crate::config::TerminalConfig;
use crate::progress::ProgressTracker;
use crate::registry::PuzzleRegistry;
use crate::scope::TaskScope;

/// Result of [`Terminal::submit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The line was echoed, broadcast and dispatched.
    Handled,
    /// Blank input.
    Ignored,
    /// The boot sequence has not finished.
    Booting,
    /// A previous line is still being handled.
    Busy,
    /// The terminal was unmounted.
    Unmounted,
}

#[derive(Default)]
struct TermState {
    log: Vec<String>,
    booting: bool,
    booted: bool,
    busy: bool,
    denial_pulses: u64,
}

struct Shared {
    registry: Arc<PuzzleRegistry>,
    progress: ProgressTracker,
    checker: SolutionChecker,
    bus: CommandBus,
    store: Persistence,
    config: TerminalConfig,
    state: Mutex<TermState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, TermState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push_line(&self, line: impl Into<String>) {
        let mirror = {
            let mut state = self.lock();
            state.log.push(line.into());
            self.config.persist_history.then(|| {
                let start = state.log.len().saturating_sub(self.config.history_limit);
                state.log[start..].to_vec()
            })
        };
        if let Some(lines) = mirror {
            self.store.set_json(TERMINAL_HISTORY_KEY, &lines);
        }
    }

    fn clear(&self) {
        self.lock().log.clear();
        if self.config.persist_history {
            self.store.remove(TERMINAL_HISTORY_KEY);
        }
    }

    /// Visual denial feedback for renderers.
    fn pulse(&self) {
        let pulses = {
            let mut state = self.lock();
            state.denial_pulses += 1;
            state.denial_pulses
        };
        debug!(pulses, "denial pulse");
    }

    async fn boot(&self, scope: &TaskScope) {
        for line in &self.config.boot_lines {
            if !scope.sleep(self.config.boot_line_delay()).await {
                return;
            }
            self.push_line(line.as_str());
        }
        {
            let mut state = self.lock();
            state.booting = false;
            state.booted = true;
        }
        self.progress.grant_badge(BOOT_BADGE);
        info!("terminal boot complete");
    }
}

/// Clears the busy flag when a submission finishes or is dropped.
struct BusyGuard<'a>(&'a Shared);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.lock().busy = false;
    }
}

/// One mounted terminal.
pub struct Terminal {
    shared: Arc<Shared>,
    scope: TaskScope,
}

impl Terminal {
    /// Create an unmounted terminal. The log is restored from the history
    /// mirror when enabled.
    pub fn new(
        registry: Arc<PuzzleRegistry>,
        progress: ProgressTracker,
        checker: SolutionChecker,
        bus: CommandBus,
        store: Persistence,
        config: TerminalConfig,
    ) -> Self {
        let log = if config.persist_history {
            store.get_json::<Vec<String>>(TERMINAL_HISTORY_KEY)
        } else {
            Vec::new()
        };
        Self {
            shared: Arc::new(Shared {
                registry,
                progress,
                checker,
                bus,
                store,
                config,
                state: Mutex::new(TermState {
                    log,
                    ..TermState::default()
                }),
            }),
            scope: TaskScope::new(),
        }
    }

    /// Start the boot sequence in the background. Runs at most once.
    pub fn mount(&self) {
        if !self.begin_boot() {
            return;
        }
        let shared = self.shared.clone();
        let scope = self.scope.clone();
        self.scope.spawn(async move {
            shared.boot(&scope).await;
        });
    }

    /// Run the boot sequence inline. Runs at most once.
    pub async fn boot(&self) {
        if self.begin_boot() {
            self.shared.boot(&self.scope).await;
        }
    }

    /// Cancel every scheduled task. Later submissions are refused.
    pub fn unmount(&self) {
        if self.scope.is_alive() {
            debug!("terminal unmounted");
        }
        self.scope.cancel();
        self.shared.lock().booting = false;
    }

    /// Process one line. Resolves once handling, including any simulated
    /// delay, has finished.
    pub async fn submit(&self, line: &str) -> SubmitOutcome {
        if !self.scope.is_alive() {
            return SubmitOutcome::Unmounted;
        }
        let Some(cmd) = parser::parse(line) else {
            return SubmitOutcome::Ignored;
        };
        {
            let mut state = self.shared.lock();
            if !state.booted {
                return SubmitOutcome::Booting;
            }
            if state.busy {
                return SubmitOutcome::Busy;
            }
            state.busy = true;
        }
        let _busy = BusyGuard(&self.shared);

        self.shared
            .push_line(format!("{} {}", self.shared.config.prompt, cmd.raw));
        self.shared.bus.dispatch(&cmd.raw);
        debug!(verb = %cmd.verb, "terminal command");

        if commands::dispatch(&self.shared, &self.scope, &cmd).await {
            SubmitOutcome::Handled
        } else {
            SubmitOutcome::Unmounted
        }
    }

    /// Current log lines.
    pub fn log(&self) -> Vec<String> {
        self.shared.lock().log.clone()
    }

    pub fn is_booting(&self) -> bool {
        self.shared.lock().booting
    }

    /// Whether the boot sequence has completed and input is enabled.
    pub fn is_ready(&self) -> bool {
        self.shared.lock().booted && self.scope.is_alive()
    }

    /// Number of denial pulses so far.
    pub fn denial_pulses(&self) -> u64 {
        self.shared.lock().denial_pulses
    }

    fn begin_boot(&self) -> bool {
        if !self.scope.is_alive() {
            return false;
        }
        let mut state = self.shared.lock();
        if state.booting || state.booted {
            return false;
        }
        state.booting = true;
        true
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}
