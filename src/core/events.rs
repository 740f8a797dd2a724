use std::sync::Mutex;

use crossbeam::channel::{Receiver, Sender, unbounded};
use serde::Serialize;

use super::lock::lock_mutex;
use super::source::FacingMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Recording,
}

/// Change notifications for whatever surface renders the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MemoryEvent {
    StateChanged { state: SessionState },
    UsageChanged { percent: u8 },
    ModeChanged { mode: FacingMode },
    CaptureStalled { consecutive: u64 },
    Cleared,
}

/// Fan-out of `MemoryEvent`s to any number of subscribers.
#[derive(Default)]
pub struct EventHub {
    subscribers: Mutex<Vec<Sender<MemoryEvent>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<MemoryEvent> {
        let (tx, rx) = unbounded();
        lock_mutex(&self.subscribers, "EventHub::subscribe").push(tx);
        rx
    }

    pub fn publish(&self, event: MemoryEvent) {
        let mut subscribers = lock_mutex(&self.subscribers, "EventHub::publish");
        // Getrennte Receiver fliegen raus
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        lock_mutex(&self.subscribers, "EventHub::subscriber_count").len()
    }
}
