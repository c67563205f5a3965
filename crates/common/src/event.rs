use crate::Origin;
use crossbeam::channel::{Receiver, Sender, TrySendError, unbounded};
use std::sync::Mutex;

/// One of the five diagnostic events the subsystem emits: `read`, `write`,
/// `queue`, `checkpoint`, `recovery`. Every variant is also logged through
/// `tracing` at the point of emission; this type exists so tests can assert
/// on the same signal mechanically instead of scraping log output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A page was served from the Memory Store or loaded from disk.
    Read { position: u64, origin: Origin },
    /// A page reached its backing stream.
    Write { position: u64, origin: Origin },
    /// The writer queue changed depth.
    Queue { depth: usize },
    /// A checkpoint began; `pages` is the number of confirmed pages about
    /// to be migrated into the data file.
    Checkpoint { pages: usize },
    /// Recovery ran at open; `confirmed` pages were promoted, `discarded`
    /// pages belonged to transactions that never confirmed.
    Recovery { confirmed: usize, discarded: usize },
}

impl Event {
    /// The event name as used in `tracing` fields and in spec §6.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Read { .. } => "read",
            Event::Write { .. } => "write",
            Event::Queue { .. } => "queue",
            Event::Checkpoint { .. } => "checkpoint",
            Event::Recovery { .. } => "recovery",
        }
    }
}

/// Fan-out point for diagnostic events.
///
/// Every emitted event is logged via `tracing::debug!` and, if any receivers
/// are subscribed, sent on their channel. A full or disconnected subscriber
/// is dropped silently on the next emit rather than blocking the emitter —
/// diagnostics must never become a second writer queue.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: std::sync::Arc<Mutex<Vec<Sender<Event>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber and return its receiving end.
    pub fn subscribe(&self) -> Receiver<Event> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }

    /// Emit an event to `tracing` and to every live subscriber.
    pub fn emit(&self, event: Event) {
        tracing::debug!(event = event.name(), ?event, "paged-file diagnostic");

        let mut subs = self.subscribers.lock().unwrap();
        subs.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Disconnected(_)) => false,
            Err(TrySendError::Full(_)) => true,
        });
    }
}
