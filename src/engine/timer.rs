// src/engine/timer.rs

use tokio::time::Instant;
use tracing::debug;

use crate::types::TargetKind;

/// What to do when the timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Build this target (an app build may chain into tests).
    Build(TargetKind),
    /// Dependency configuration changed: fully re-initialize.
    Reinitialize,
}

/// The engine's single debounce timer.
///
/// Arming always replaces whatever was armed before; that replacement is the
/// only cancellation there is. A burst of events therefore produces one
/// firing, for the last action armed, one delay after the last event.
#[derive(Debug, Default)]
pub struct TimerSlot {
    armed: Option<(Instant, TimerAction)>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, deadline: Instant, action: TimerAction) {
        if let Some((_, previous)) = self.armed {
            debug!(?previous, next = ?action, "re-arming timer; previous trigger cancelled");
        }
        self.armed = Some((deadline, action));
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.armed.map(|(deadline, _)| deadline)
    }

    pub fn action(&self) -> Option<TimerAction> {
        self.armed.map(|(_, action)| action)
    }

    /// Take the armed action if its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<TimerAction> {
        match self.armed {
            Some((deadline, action)) if deadline <= now => {
                self.armed = None;
                Some(action)
            }
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.armed = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }
}
