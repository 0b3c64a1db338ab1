//! Session lifecycle events and notification delivery.

use serde::{Deserialize, Serialize};

use super::FocusSession;

/// Every lifecycle transition and distraction verdict produces one event.
/// Events fire in the order transitions are applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    SessionStarted {
        session: FocusSession,
    },
    /// The current session was cleared. `manual` is true only for a
    /// user-initiated stop; superseding restarts and natural expiry
    /// report `false`.
    SessionStopped {
        manual: bool,
    },
    /// The session ran to its natural end. Fires after the corresponding
    /// `SessionStopped`, and never after a manual stop.
    SessionFinished {
        session: FocusSession,
    },
    DistractionDetected {
        description: String,
        goal: String,
    },
}

/// Downstream consumer of session events: a UI bridge, a log, an LLM
/// trigger.
///
/// Sinks are invoked synchronously, in registration order, while the
/// monitor holds its state lock -- deliveries must be quick and must not
/// call back into the monitor. A failing sink is logged and does not
/// prevent delivery to the remaining sinks.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, event: &SessionEvent) -> Result<(), Box<dyn std::error::Error>>;
}
