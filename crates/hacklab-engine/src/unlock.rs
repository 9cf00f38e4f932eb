//! Hint unlock controller.
//!
//! Revealing a hint tier takes a short ritual. The controller runs at most
//! one ritual at a time:
//!
//! ```text
//! idle -> requested -> confirm | timed | challenge | command -> granted
//!                                                           \-> cancelled
//! ```
//!
//! Timers and the command-bus subscription of a ritual live in its own
//! [`TaskScope`]. Every task also re-checks the ritual generation before
//! touching state, so a cancelled or replaced ritual can never grant.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use hacklab_types::{HintTier, Puzzle, PuzzleId, RitualView, UnlockMode};
use rand::seq::SliceRandom;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::bus::CommandBus;
use crate::config::UnlockConfig;
use crate::progress::ProgressTracker;
use crate::registry::PuzzleRegistry;
use crate::scope::TaskScope;

/// Chooses the unlock mode for a puzzle that is not hard or secret.
pub trait ModeSelector: Send + Sync {
    fn select(&self, puzzle: &Puzzle) -> UnlockMode;
}

impl<F> ModeSelector for F
where
    F: Fn(&Puzzle) -> UnlockMode + Send + Sync,
{
    fn select(&self, puzzle: &Puzzle) -> UnlockMode {
        self(puzzle)
    }
}

/// Picks uniformly among confirm, timed and challenge.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomModeSelector;

impl ModeSelector for RandomModeSelector {
    fn select(&self, _puzzle: &Puzzle) -> UnlockMode {
        UnlockMode::FRICTION
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(UnlockMode::Confirm)
    }
}

/// Phrase a command ritual waits for.
pub fn required_command(tier: u32) -> String {
    format!("unlock hint {tier}")
}

/// Outcome of [`HintUnlockController::request_unlock`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnlockRequest {
    Started(UnlockMode),
    Ignored(IgnoreReason),
}

/// Why a request was ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    UnknownPuzzle,
    /// The tier is already unlocked.
    AlreadyUnlocked,
    /// The tier skips one that is still locked.
    OutOfSequence,
    /// The puzzle has fewer tiers.
    NoSuchTier,
}

/// Ritual lifecycle notifications for renderers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnlockEvent {
    Started { puzzle_id: PuzzleId, tier: u32, mode: UnlockMode },
    Tick { remaining_secs: u32 },
    Verified { puzzle_id: PuzzleId, tier: u32 },
    Granted { puzzle_id: PuzzleId, tier: u32 },
    Cancelled { puzzle_id: PuzzleId, tier: u32 },
}

enum RitualState {
    Confirm,
    Timed { remaining: u32 },
    Challenge { taps: u32 },
    Command { required: String, verified: bool },
}

struct ActiveRitual {
    generation: u64,
    puzzle_id: PuzzleId,
    tier: u32,
    state: RitualState,
    scope: TaskScope,
}

impl ActiveRitual {
    fn mode(&self) -> UnlockMode {
        match self.state {
            RitualState::Confirm => UnlockMode::Confirm,
            RitualState::Timed { .. } => UnlockMode::Timed,
            RitualState::Challenge { .. } => UnlockMode::Challenge,
            RitualState::Command { .. } => UnlockMode::Command,
        }
    }
}

struct ControllerInner {
    registry: Arc<PuzzleRegistry>,
    progress: ProgressTracker,
    bus: CommandBus,
    selector: Arc<dyn ModeSelector>,
    config: UnlockConfig,
    ritual: Mutex<Option<ActiveRitual>>,
    generation: AtomicU64,
    events: broadcast::Sender<UnlockEvent>,
}

/// Runs hint unlock rituals. Clones share the same controller.
#[derive(Clone)]
pub struct HintUnlockController {
    inner: Arc<ControllerInner>,
}

impl HintUnlockController {
    pub fn new(
        registry: Arc<PuzzleRegistry>,
        progress: ProgressTracker,
        bus: CommandBus,
        selector: Arc<dyn ModeSelector>,
        config: UnlockConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(ControllerInner {
                registry,
                progress,
                bus,
                selector,
                config,
                ritual: Mutex::new(None),
                generation: AtomicU64::new(0),
                events,
            }),
        }
    }

    /// Start a ritual for `tier` of `puzzle_id`.
    ///
    /// `tier` must be exactly one above the current usage. A pending ritual
    /// is cancelled and replaced.
    pub fn request_unlock(&self, puzzle_id: &str, tier: u32) -> UnlockRequest {
        let Some(puzzle) = self.inner.registry.find(puzzle_id) else {
            return UnlockRequest::Ignored(IgnoreReason::UnknownPuzzle);
        };
        let current = self.inner.progress.hint_usage(puzzle_id);
        if tier <= current {
            return UnlockRequest::Ignored(IgnoreReason::AlreadyUnlocked);
        }
        if tier > puzzle.tier_count() {
            return UnlockRequest::Ignored(IgnoreReason::NoSuchTier);
        }
        if tier != current + 1 {
            return UnlockRequest::Ignored(IgnoreReason::OutOfSequence);
        }

        let mode = if puzzle.difficulty.requires_command_unlock() {
            UnlockMode::Command
        } else {
            self.inner.selector.select(puzzle)
        };

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let scope = TaskScope::new();
        let state = match mode {
            UnlockMode::Confirm => RitualState::Confirm,
            UnlockMode::Timed => RitualState::Timed {
                remaining: self.inner.config.countdown_secs,
            },
            UnlockMode::Challenge => RitualState::Challenge { taps: 0 },
            UnlockMode::Command => RitualState::Command {
                required: required_command(tier),
                verified: false,
            },
        };

        let previous = self.lock().replace(ActiveRitual {
            generation,
            puzzle_id: puzzle_id.to_string(),
            tier,
            state,
            scope: scope.clone(),
        });
        if let Some(previous) = previous {
            debug!(puzzle_id = %previous.puzzle_id, tier = previous.tier, "pending ritual replaced");
            self.release(previous);
        }

        match mode {
            UnlockMode::Timed => self.start_countdown(&scope, generation),
            UnlockMode::Command => self.start_command_watch(&scope, generation, tier),
            UnlockMode::Confirm | UnlockMode::Challenge => {}
        }

        // A zero-length countdown grants immediately.
        if mode == UnlockMode::Timed && self.inner.config.countdown_secs == 0 {
            self.inner.finish(generation);
        }

        debug!(puzzle_id, tier, ?mode, "hint unlock requested");
        self.inner.emit(UnlockEvent::Started {
            puzzle_id: puzzle_id.to_string(),
            tier,
            mode,
        });
        UnlockRequest::Started(mode)
    }

    /// Confirm a confirm-mode ritual. Returns whether the hint was granted.
    pub fn confirm(&self) -> bool {
        let generation = match &*self.lock() {
            Some(ritual) if matches!(ritual.state, RitualState::Confirm) => ritual.generation,
            _ => return false,
        };
        self.inner.finish(generation)
    }

    /// One activation of a challenge ritual. Returns whether this
    /// activation granted the hint.
    pub fn tap(&self) -> bool {
        let generation = {
            let mut guard = self.lock();
            let Some(ritual) = guard.as_mut() else {
                return false;
            };
            let RitualState::Challenge { taps } = &mut ritual.state else {
                return false;
            };
            *taps += 1;
            if *taps < self.inner.config.challenge_taps {
                return false;
            }
            ritual.generation
        };
        self.inner.finish(generation)
    }

    /// Dismiss the pending ritual. Its timers and subscription are released
    /// and nothing is granted.
    pub fn cancel(&self) -> bool {
        let Some(ritual) = self.lock().take() else {
            return false;
        };
        debug!(puzzle_id = %ritual.puzzle_id, tier = ritual.tier, "hint unlock cancelled");
        self.release(ritual);
        true
    }

    /// Snapshot of the pending ritual.
    pub fn ritual(&self) -> Option<RitualView> {
        let taps_required = self.inner.config.challenge_taps;
        self.lock().as_ref().map(|ritual| {
            let mut view = RitualView {
                puzzle_id: ritual.puzzle_id.clone(),
                tier: ritual.tier,
                mode: ritual.mode(),
                remaining_secs: None,
                taps: None,
                taps_required: None,
                required_command: None,
                verified: false,
            };
            match &ritual.state {
                RitualState::Confirm => {}
                RitualState::Timed { remaining } => view.remaining_secs = Some(*remaining),
                RitualState::Challenge { taps } => {
                    view.taps = Some(*taps);
                    view.taps_required = Some(taps_required);
                }
                RitualState::Command { required, verified } => {
                    view.required_command = Some(required.clone());
                    view.verified = *verified;
                }
            }
            view
        })
    }

    /// Hint tiers of `puzzle_id` unlocked so far.
    pub fn unlocked_hints(&self, puzzle_id: &str) -> Vec<HintTier> {
        let Some(puzzle) = self.inner.registry.find(puzzle_id) else {
            return Vec::new();
        };
        let usage = self.inner.progress.hint_usage(puzzle_id);
        puzzle
            .hint_tiers()
            .into_iter()
            .filter(|hint| hint.tier <= usage)
            .collect()
    }

    /// Subscribe to ritual lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<UnlockEvent> {
        self.inner.events.subscribe()
    }

    fn start_countdown(&self, scope: &TaskScope, generation: u64) {
        let weak = Arc::downgrade(&self.inner);
        let tick = self.inner.config.tick();
        let task_scope = scope.clone();
        scope.spawn(async move {
            loop {
                if !task_scope.sleep(tick).await {
                    return;
                }
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                if inner.tick(generation) {
                    return;
                }
            }
        });
    }

    fn start_command_watch(&self, scope: &TaskScope, generation: u64, tier: u32) {
        // Subscribe before returning so a command typed right after the
        // request is not missed.
        let mut commands = self.inner.bus.subscribe();
        let weak: Weak<ControllerInner> = Arc::downgrade(&self.inner);
        let required = required_command(tier);
        let verify_delay = self.inner.config.verify_delay();
        let task_scope = scope.clone();
        scope.spawn(async move {
            loop {
                match commands.recv().await {
                    Ok(command) if command.matches(&required) => break,
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
            drop(commands);
            match weak.upgrade() {
                Some(inner) if inner.mark_verified(generation) => {}
                _ => return,
            }
            if !task_scope.sleep(verify_delay).await {
                return;
            }
            if let Some(inner) = weak.upgrade() {
                inner.finish(generation);
            }
        });
    }

    fn release(&self, ritual: ActiveRitual) {
        ritual.scope.cancel();
        self.inner.emit(UnlockEvent::Cancelled {
            puzzle_id: ritual.puzzle_id,
            tier: ritual.tier,
        });
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActiveRitual>> {
        self.inner.lock()
    }
}

impl ControllerInner {
    fn lock(&self) -> MutexGuard<'_, Option<ActiveRitual>> {
        self.ritual.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// One countdown tick. Returns `true` when the countdown task should stop.
    fn tick(&self, generation: u64) -> bool {
        let remaining = {
            let mut guard = self.lock();
            let Some(ritual) = guard.as_mut().filter(|r| r.generation == generation) else {
                return true;
            };
            let RitualState::Timed { remaining } = &mut ritual.state else {
                return true;
            };
            *remaining = remaining.saturating_sub(1);
            *remaining
        };
        self.emit(UnlockEvent::Tick {
            remaining_secs: remaining,
        });
        if remaining == 0 {
            self.finish(generation);
            return true;
        }
        false
    }

    fn mark_verified(&self, generation: u64) -> bool {
        let (puzzle_id, tier) = {
            let mut guard = self.lock();
            let Some(ritual) = guard.as_mut().filter(|r| r.generation == generation) else {
                return false;
            };
            let RitualState::Command { verified, .. } = &mut ritual.state else {
                return false;
            };
            *verified = true;
            (ritual.puzzle_id.clone(), ritual.tier)
        };
        debug!(puzzle_id = %puzzle_id, tier, "unlock command verified");
        self.emit(UnlockEvent::Verified { puzzle_id, tier });
        true
    }

    /// Grant the ritual if it is still the active one.
    fn finish(&self, generation: u64) -> bool {
        let ritual = {
            let mut guard = self.lock();
            if guard.as_ref().map(|r| r.generation) != Some(generation) {
                return false;
            }
            guard.take()
        };
        let Some(ritual) = ritual else {
            return false;
        };
        ritual.scope.cancel();
        let usage = self.progress.raise_hint_usage(&ritual.puzzle_id, ritual.tier);
        info!(puzzle_id = %ritual.puzzle_id, tier = ritual.tier, usage, "hint unlocked");
        self.emit(UnlockEvent::Granted {
            puzzle_id: ritual.puzzle_id,
            tier: ritual.tier,
        });
        true
    }

    fn emit(&self, event: UnlockEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.events.send(event);
    }
}
