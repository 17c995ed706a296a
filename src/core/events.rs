//! Thread events - Fire-and-forget signals for notification fan-out
//!
//! The engine emits an event after each successful membership change. Nothing
//! in the engine waits for, or depends on, the delivery of an event.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, instrument};

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ThreadEvent {
    ThreadCreated {
        thread_id: i64,
        participant_ids: Vec<i64>,
        by: i64,
    },
    ParticipantsAdded {
        thread_id: i64,
        participant_ids: Vec<i64>,
        by: i64,
    },
    ParticipantRemoved {
        thread_id: i64,
        participant_id: i64,
        by: i64,
    },
}

impl ThreadEvent {
    pub fn thread_id(&self) -> i64 {
        match self {
            ThreadEvent::ThreadCreated { thread_id, .. }
            | ThreadEvent::ParticipantsAdded { thread_id, .. }
            | ThreadEvent::ParticipantRemoved { thread_id, .. } => *thread_id,
        }
    }
}

pub trait EventSink: Send + Sync {
    /// Publishes the event. Must not block and must not fail.
    fn emit(&self, event: ThreadEvent);
}

/// Default sink: a broadcast channel any number of consumers can subscribe to.
pub struct BroadcastEventSink {
    tx: broadcast::Sender<ThreadEvent>,
}

impl BroadcastEventSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ThreadEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastEventSink {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventSink for BroadcastEventSink {
    #[instrument(skip(self, event), fields(thread_id = event.thread_id()))]
    fn emit(&self, event: ThreadEvent) {
        match self.tx.send(event) {
            Ok(receivers) => debug!("Thread event delivered to {} subscribers", receivers),
            Err(_) => debug!("No subscriber for thread event, dropped"),
        }
    }
}
