//! Command-dispatch channel.
//!
//! Every processed terminal line is published here. The hint unlock
//! controller listens for its required phrase without knowing anything
//! about the terminal's own dispatch table.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hacklab_types::CommandDispatched;
use tokio::sync::broadcast;

/// Broadcast bus for dispatched commands.
#[derive(Clone)]
pub struct CommandBus {
    sender: broadcast::Sender<CommandDispatched>,
    sequence: Arc<AtomicU64>,
}

impl CommandBus {
    /// Create a new bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Stamp `command` with the current time and publish it.
    pub fn dispatch(&self, command: &str) -> CommandDispatched {
        let event = CommandDispatched {
            command: command.to_string(),
            timestamp: unix_millis(),
        };
        self.emit(event.clone());
        event
    }

    /// Publish an already-built event to all subscribers.
    pub fn emit(&self, event: CommandDispatched) {
        self.sequence.fetch_add(1, Ordering::SeqCst);
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to commands published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<CommandDispatched> {
        self.sender.subscribe()
    }

    /// Number of commands published so far.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new(64)
    }
}

fn unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}
