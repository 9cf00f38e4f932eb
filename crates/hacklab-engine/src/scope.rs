//! Cancellable scheduled tasks tied to an owner's lifetime.
//!
//! A [`TaskScope`] owns every timer a component schedules. Cancelling the
//! scope aborts the tasks and clears a liveness flag. Tasks also check the
//! flag after each suspension point, so a callback that was already
//! running when `cancel` raced it still cannot mutate state.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

struct ScopeInner {
    alive: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// Handle to a group of scheduled tasks. Clones share the same scope.
#[derive(Clone)]
pub struct TaskScope {
    inner: Arc<ScopeInner>,
}

impl TaskScope {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                alive: AtomicBool::new(true),
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Whether the scope has not been cancelled.
    pub fn is_alive(&self) -> bool {
        self.inner.alive.load(Ordering::SeqCst)
    }

    /// Spawn `future` inside the scope. No-op once cancelled.
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self
            .inner
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !self.is_alive() {
            return;
        }
        tasks.retain(|handle| !handle.is_finished());
        tasks.push(tokio::spawn(future));
    }

    /// Sleep for `duration`. Returns whether the scope is still alive.
    pub async fn sleep(&self, duration: Duration) -> bool {
        tokio::time::sleep(duration).await;
        self.is_alive()
    }

    /// Abort every task and mark the scope dead. Idempotent.
    pub fn cancel(&self) {
        self.inner.alive.store(false, Ordering::SeqCst);
        let tasks = std::mem::take(
            &mut *self
                .inner
                .tasks
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for handle in tasks {
            handle.abort();
        }
    }

    /// Tasks spawned and not yet finished.
    pub fn pending(&self) -> usize {
        self.inner
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }
}

impl Default for TaskScope {
    fn default() -> Self {
        Self::new()
    }
}
