//! # hacklab-engine
//!
//! Puzzle engine for the interactive portfolio: registry, solution checking,
//! progress tracking, hint unlock rituals and the terminal interpreter.
//!
//! Every component talks to persisted state through one
//! [`hacklab_store::Persistence`] view, so several [`Lab`]s opened over the
//! same store behave like browser tabs sharing local storage.
//!
//! ## Wiring
//!
//! - terminal lines -> [`bus::CommandBus`] -> hint unlock controller
//! - terminal actions / puzzle panel -> [`checker::SolutionChecker`] ->
//!   [`progress::ProgressTracker`] -> store

pub mod bus;
pub mod catalog;
pub mod checker;
pub mod config;
pub mod progress;
pub mod registry;
pub mod scope;
pub mod terminal;
pub mod unlock;

use std::sync::Arc;

use hacklab_store::Persistence;
use hacklab_types::{HintTier, Puzzle, RitualView};

use crate::bus::CommandBus;
use crate::checker::{CheckOutcome, SolutionChecker};
use crate::config::EngineConfig;
use crate::progress::ProgressTracker;
use crate::registry::PuzzleRegistry;
use crate::terminal::Terminal;
use crate::unlock::{HintUnlockController, ModeSelector, RandomModeSelector, UnlockRequest};

/// One view of the puzzle lab.
#[derive(Clone)]
pub struct Lab {
    registry: Arc<PuzzleRegistry>,
    store: Persistence,
    progress: ProgressTracker,
    checker: SolutionChecker,
    bus: CommandBus,
    hints: HintUnlockController,
    config: EngineConfig,
}

impl Lab {
    /// Build a lab with random friction modes.
    pub fn new(registry: Arc<PuzzleRegistry>, store: Persistence, config: EngineConfig) -> Self {
        Self::with_selector(registry, store, config, Arc::new(RandomModeSelector))
    }

    /// Build a lab with a custom unlock mode selector.
    pub fn with_selector(
        registry: Arc<PuzzleRegistry>,
        store: Persistence,
        config: EngineConfig,
        selector: Arc<dyn ModeSelector>,
    ) -> Self {
        let progress = ProgressTracker::new(registry.clone(), store.clone());
        let checker = SolutionChecker::new(registry.clone(), progress.clone(), store.clone());
        let bus = CommandBus::default();
        let hints = HintUnlockController::new(
            registry.clone(),
            progress.clone(),
            bus.clone(),
            selector,
            config.unlock.clone(),
        );
        Self {
            registry,
            store,
            progress,
            checker,
            bus,
            hints,
            config,
        }
    }

    /// Catalog listing, independent of progress.
    pub fn list_puzzles(&self, include_hidden: bool) -> Vec<&Puzzle> {
        self.registry.list(include_hidden)
    }

    /// Puzzles currently listed for this player.
    pub fn visible_puzzles(&self) -> Vec<&Puzzle> {
        self.progress.visible_puzzles()
    }

    pub fn find_puzzle(&self, id: &str) -> Option<&Puzzle> {
        self.registry.find(id)
    }

    pub fn is_solved(&self, id: &str) -> bool {
        self.progress.is_solved(id)
    }

    pub fn mark_solved(&self, id: &str) -> bool {
        self.progress.mark_solved(id)
    }

    pub fn check_solution(&self, id: &str, attempt: &str) -> CheckOutcome {
        self.checker.check(id, attempt)
    }

    /// Every hint tier of `id`, locked or not. Empty for unknown ids.
    pub fn get_hints(&self, id: &str) -> Vec<HintTier> {
        self.registry
            .find(id)
            .map(Puzzle::hint_tiers)
            .unwrap_or_default()
    }

    pub fn unlocked_hints(&self, id: &str) -> Vec<HintTier> {
        self.hints.unlocked_hints(id)
    }

    pub fn request_unlock(&self, id: &str, tier: u32) -> UnlockRequest {
        self.hints.request_unlock(id, tier)
    }

    pub fn confirm(&self) -> bool {
        self.hints.confirm()
    }

    pub fn tap(&self) -> bool {
        self.hints.tap()
    }

    pub fn cancel(&self) -> bool {
        self.hints.cancel()
    }

    pub fn ritual(&self) -> Option<RitualView> {
        self.hints.ritual()
    }

    /// A fresh, unmounted terminal wired to this lab.
    pub fn terminal(&self) -> Terminal {
        Terminal::new(
            self.registry.clone(),
            self.progress.clone(),
            self.checker.clone(),
            self.bus.clone(),
            self.store.clone(),
            self.config.terminal.clone(),
        )
    }

    pub fn registry(&self) -> &Arc<PuzzleRegistry> {
        &self.registry
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn hints(&self) -> &HintUnlockController {
        &self.hints
    }

    pub fn bus(&self) -> &CommandBus {
        &self.bus
    }

    pub fn store(&self) -> &Persistence {
        &self.store
    }
}
