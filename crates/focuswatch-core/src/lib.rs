//! # Focuswatch Core Library
//!
//! This library provides the core logic for Focuswatch, a focus-session
//! monitor built on top of an ActivityWatch-style window tracker. The CLI
//! binary is a thin layer over this crate; any GUI would be as well.
//!
//! ## Architecture
//!
//! - **Activity**: a read-only REST client for the tracker's buckets/events
//!   API, a pure interval aggregator, and a summary source that turns both
//!   into per-window attention totals
//! - **Classifier**: a threshold-gated distraction check backed by an
//!   opaque language-model collaborator
//! - **Session**: the focus session state machine -- one current session,
//!   cancellable expiry timer, single-flight distraction checks
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`FocusMonitor`]: session state machine and scheduling core
//! - [`SummarySource`]: periodic producer of [`AttentionSummary`] values
//! - [`ThresholdClassifier`]: cost-controlled distraction classification
//! - [`Config`]: application configuration management

pub mod activity;
pub mod classifier;
pub mod error;
pub mod session;
pub mod storage;

pub use activity::{ActivityClient, AttentionSummary, SummarySource};
pub use classifier::{
    ChatModel, DistractionClassifier, LanguageModel, ThresholdClassifier, Verdict,
};
pub use error::{ConfigError, CoreError, Result};
pub use session::{FocusMonitor, FocusSession, NotificationSink, SessionEvent};
pub use storage::Config;
