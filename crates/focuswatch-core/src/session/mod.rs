//! Focus session state machine.
//!
//! [`FocusMonitor`] owns the current session, if any. `start` supersedes
//! any prior session atomically, natural expiry runs on a cancellable
//! tokio timer, and attention summaries feed a single-flight distraction
//! check whose stale results are discarded by session id.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Focusing -> Idle (manual stop | natural expiry | superseded)
//! ```
//!
//! Summaries that arrive while a classification is in flight are dropped,
//! not queued; a distraction during a long-running model call surfaces at
//! the next cadence tick at the earliest. This is a deliberate throttle,
//! not a bug.

mod events;

pub use events::{NotificationSink, SessionEvent};

use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::activity::AttentionSummary;
use crate::classifier::{DistractionClassifier, Verdict};
use crate::error::{CoreError, Result};

/// Snapshot of a focus session. Constructed only by the monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusSession {
    /// Monotonic per monitor; changes on every start, including restarts
    /// with identical parameters, so stale in-flight work can be dropped.
    pub id: u64,
    pub goal: String,
    pub notes: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub ends_at: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    session: Option<FocusSession>,
    /// Single-flight flag: a classification is outstanding for the
    /// current session.
    handling: bool,
    session_seq: u64,
    timer: Option<JoinHandle<()>>,
}

struct Shared {
    state: Mutex<State>,
    sinks: RwLock<Vec<Box<dyn NotificationSink>>>,
    classifier: Arc<dyn DistractionClassifier>,
}

/// The session state machine and scheduling core.
///
/// Cheap to clone; all clones share state. Mutating operations are
/// linearized through an internal lock that is never held across a
/// suspension point: the classifier call runs lock-free and is reconciled
/// afterwards via the session-id check.
///
/// `start` must be called from within a tokio runtime -- expiry is a
/// spawned timer task.
#[derive(Clone)]
pub struct FocusMonitor {
    shared: Arc<Shared>,
}

impl FocusMonitor {
    pub fn new(classifier: Arc<dyn DistractionClassifier>) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::default()),
                sinks: RwLock::new(Vec::new()),
                classifier,
            }),
        }
    }

    /// Register a lifecycle listener. Sinks fire in registration order.
    pub fn add_sink(&self, sink: Box<dyn NotificationSink>) {
        self.shared
            .sinks
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(sink);
    }

    /// Start a focus session, superseding any current one.
    ///
    /// Fails with [`CoreError::InvalidDuration`] for non-positive
    /// durations, leaving the current state untouched.
    pub fn start(
        &self,
        duration_ms: i64,
        goal: impl Into<String>,
        notes: Option<String>,
    ) -> Result<FocusSession> {
        if duration_ms <= 0 {
            return Err(CoreError::InvalidDuration(duration_ms));
        }
        let duration_ms = duration_ms as u64;

        let mut state = self.lock_state();
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        if state.session.take().is_some() {
            self.notify(&SessionEvent::SessionStopped { manual: false });
        }
        state.handling = false;

        state.session_seq += 1;
        let id = state.session_seq;
        let started_at = Utc::now();
        let session = FocusSession {
            id,
            goal: goal.into(),
            notes,
            started_at,
            duration_ms,
            ends_at: started_at + Duration::milliseconds(duration_ms as i64),
        };
        state.session = Some(session.clone());

        let monitor = self.clone();
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(StdDuration::from_millis(duration_ms)).await;
            monitor.expire(id);
        }));

        self.notify(&SessionEvent::SessionStarted {
            session: session.clone(),
        });
        Ok(session)
    }

    /// Stop the current session. No-op when idle. A manual stop never
    /// produces a `SessionFinished` event.
    pub fn stop(&self, manual: bool) {
        let mut state = self.lock_state();
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        if state.session.take().is_none() {
            return;
        }
        state.handling = false;
        self.notify(&SessionEvent::SessionStopped { manual });
    }

    /// Timer callback for natural expiry. Re-validates the session id in
    /// case a stop or restart raced with the timer firing.
    fn expire(&self, id: u64) {
        let mut state = self.lock_state();
        if state.session.as_ref().map(|s| s.id) != Some(id) {
            return;
        }
        let Some(session) = state.session.take() else {
            return;
        };
        state.handling = false;
        state.timer = None;
        self.notify(&SessionEvent::SessionStopped { manual: false });
        self.notify(&SessionEvent::SessionFinished { session });
    }

    /// Feed one attention summary into the monitor.
    ///
    /// No-op when idle. If a classification is already in flight the
    /// summary is dropped (see the module docs). Otherwise the classifier
    /// runs against the session captured at call time; a `Suspicious`
    /// verdict produces one `DistractionDetected` event, classifier
    /// failures are logged and treated like a dropped summary.
    pub async fn on_attention_summary(&self, summary: AttentionSummary) {
        let (id, goal, notes) = {
            let mut state = self.lock_state();
            let Some(session) = state.session.as_ref() else {
                return;
            };
            if state.handling {
                return;
            }
            let captured = (session.id, session.goal.clone(), session.notes.clone());
            state.handling = true;
            captured
        };

        // State lock released while the classifier is suspended; the id
        // check below reconciles any stop or restart that happened
        // meanwhile.
        let outcome = self
            .shared
            .classifier
            .classify(&summary, &goal, notes.as_deref())
            .await;

        let mut state = self.lock_state();
        if state.session.as_ref().map(|s| s.id) != Some(id) {
            // Stale result: the session it was computed for is gone and
            // its teardown already reset the in-flight flag.
            return;
        }
        state.handling = false;
        match outcome {
            Ok(Verdict::Suspicious(description)) => {
                self.notify(&SessionEvent::DistractionDetected { description, goal });
            }
            Ok(Verdict::Clear) => {}
            Err(e) => tracing::warn!("distraction check failed: {e}"),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_focusing(&self) -> bool {
        self.lock_state().session.is_some()
    }

    pub fn current_session(&self) -> Option<FocusSession> {
        self.lock_state().session.clone()
    }

    /// Milliseconds until natural expiry, 0 when idle.
    pub fn remaining_ms(&self) -> u64 {
        self.lock_state()
            .session
            .as_ref()
            .map(|s| (s.ends_at - Utc::now()).num_milliseconds().max(0) as u64)
            .unwrap_or(0)
    }

    /// Total length of the current session, 0 when idle.
    pub fn duration_ms(&self) -> u64 {
        self.lock_state()
            .session
            .as_ref()
            .map(|s| s.duration_ms)
            .unwrap_or(0)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn lock_state(&self) -> MutexGuard<'_, State> {
        // A sink or classifier panic must not wedge the monitor.
        self.shared.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn notify(&self, event: &SessionEvent) {
        let sinks = self.shared.sinks.read().unwrap_or_else(|e| e.into_inner());
        for sink in sinks.iter() {
            if let Err(e) = sink.deliver(event) {
                tracing::warn!("notification sink failed: {e}");
            }
        }
    }
}
