// src/engine/queue.rs

use std::collections::VecDeque;
use std::path::PathBuf;

use tracing::debug;

use crate::types::ChangeKind;

/// A filesystem event held back because a build was running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

/// Events that arrive while a build is executing.
///
/// Semantics:
/// - Events are kept verbatim and in arrival order; nothing is coalesced
///   here (the debounce timer does that once they are replayed).
/// - When the build pipeline becomes idle, the runtime drains the queue and
///   replays every event through classification in the original order.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<PendingEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn push(&mut self, path: PathBuf, kind: ChangeKind) {
        debug!(?path, %kind, queued = self.events.len() + 1, "build in progress; queued event");
        self.events.push_back(PendingEvent { path, kind });
    }

    /// Take every queued event, oldest first, leaving the queue empty.
    pub fn drain_pending(&mut self) -> Vec<PendingEvent> {
        let events: Vec<PendingEvent> = self.events.drain(..).collect();
        if !events.is_empty() {
            debug!(drained = events.len(), "replaying queued events");
        }
        events
    }
}
