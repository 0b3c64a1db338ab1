//! Distraction classification over attention summaries.
//!
//! [`ThresholdClassifier`] is the cost-control layer: the language model is
//! consulted only when some window key accumulated more active time than
//! the threshold within the summary window. Single-flight throttling lives
//! in the session monitor, not here.

mod model;

pub use model::{ChatModel, CompleteFuture, LanguageModel};

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::activity::AttentionSummary;
use crate::error::Result;

/// Active time a single window key must exceed before a model call is
/// worth making.
pub const DEFAULT_THRESHOLD_MS: u64 = 30_000;

/// Outcome of a distraction check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "description")]
pub enum Verdict {
    Clear,
    Suspicious(String),
}

pub type ClassifyFuture<'a> = Pin<Box<dyn Future<Output = Result<Verdict>> + Send + 'a>>;

/// A single distraction check against one summary.
///
/// Implementations only ever see one call at a time per monitor; the
/// monitor enforces single-flight and discards stale results.
pub trait DistractionClassifier: Send + Sync {
    fn classify<'a>(
        &'a self,
        summary: &'a AttentionSummary,
        goal: &'a str,
        notes: Option<&'a str>,
    ) -> ClassifyFuture<'a>;
}

const SYSTEM_PROMPT: &str = "\
You are a focus coach helping the user stay on their current task.
You receive one window-activity entry in `title - app` format, meaning the
user spent most of the last aggregation window on that activity, together
with their focus goal.
If the activity looks like a distraction from the goal, describe in one
short phrase (under 50 characters) what the user seems to be doing instead.
If the activity is consistent with the goal, reply with exactly: OK";

/// Threshold-gated classifier backed by a language model.
pub struct ThresholdClassifier<M> {
    model: M,
    threshold_ms: u64,
}

impl<M: LanguageModel> ThresholdClassifier<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            threshold_ms: DEFAULT_THRESHOLD_MS,
        }
    }

    pub fn with_threshold_ms(mut self, threshold_ms: u64) -> Self {
        self.threshold_ms = threshold_ms;
        self
    }

    /// Heaviest key strictly above the threshold, if any. Ranked order
    /// makes the pick deterministic when several keys qualify.
    fn suspicious_key(&self, summary: &AttentionSummary) -> Option<String> {
        summary
            .ranked()
            .into_iter()
            .find(|(_, total_ms)| *total_ms > self.threshold_ms)
            .map(|(key, _)| key)
    }
}

impl<M: LanguageModel> DistractionClassifier for ThresholdClassifier<M> {
    fn classify<'a>(
        &'a self,
        summary: &'a AttentionSummary,
        goal: &'a str,
        notes: Option<&'a str>,
    ) -> ClassifyFuture<'a> {
        Box::pin(async move {
            let Some(key) = self.suspicious_key(summary) else {
                // Nothing crossed the threshold: skip the model call.
                return Ok(Verdict::Clear);
            };

            let mut user = format!("Window activity: {key}\nFocus goal: {goal}");
            if let Some(notes) = notes {
                user.push_str("\nNotes: ");
                user.push_str(notes);
            }

            let reply = self.model.complete(SYSTEM_PROMPT, &user).await?;
            let reply = reply.trim();
            if reply == "OK" {
                Ok(Verdict::Clear)
            } else {
                Ok(Verdict::Suspicious(reply.to_string()))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeModel {
        reply: String,
        calls: AtomicUsize,
        last_user: Mutex<String>,
    }

    impl FakeModel {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
                last_user: Mutex::new(String::new()),
            }
        }
    }

    impl LanguageModel for FakeModel {
        fn complete<'a>(&'a self, _system: &'a str, user: &'a str) -> CompleteFuture<'a> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_user.lock().unwrap() = user.to_string();
            Box::pin(async move { Ok(self.reply.clone()) })
        }
    }

    fn summary(totals: &[(&str, u64)]) -> AttentionSummary {
        let window_end = Utc::now();
        AttentionSummary {
            window_start: window_end - Duration::minutes(1),
            window_end,
            totals_by_key: totals
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[tokio::test]
    async fn below_threshold_short_circuits_without_model_call() {
        let classifier = ThresholdClassifier::new(FakeModel::new("should not be seen"));
        let verdict = classifier
            .classify(&summary(&[("video - mpv", 29_999)]), "write report", None)
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Clear);
        assert_eq!(classifier.model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn ok_reply_is_clear() {
        let classifier = ThresholdClassifier::new(FakeModel::new("OK"));
        let verdict = classifier
            .classify(&summary(&[("YouTube - video", 45_000)]), "write report", None)
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Clear);
        assert_eq!(classifier.model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn other_reply_is_suspicious_and_trimmed() {
        let classifier = ThresholdClassifier::new(FakeModel::new("  Browsing YouTube \n"));
        let verdict = classifier
            .classify(&summary(&[("YouTube - video", 45_000)]), "write report", None)
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Suspicious("Browsing YouTube".to_string()));
    }

    #[tokio::test]
    async fn heaviest_qualifying_key_is_sent_to_the_model() {
        let classifier = ThresholdClassifier::new(FakeModel::new("OK"));
        classifier
            .classify(
                &summary(&[("Docs - firefox", 40_000), ("YouTube - video", 50_000)]),
                "write report",
                Some("deadline friday"),
            )
            .await
            .unwrap();
        let user = classifier.model.last_user.lock().unwrap().clone();
        assert!(user.contains("Window activity: YouTube - video"));
        assert!(user.contains("Focus goal: write report"));
        assert!(user.contains("Notes: deadline friday"));
    }

    #[tokio::test]
    async fn custom_threshold_is_respected() {
        let classifier = ThresholdClassifier::new(FakeModel::new("OK")).with_threshold_ms(10_000);
        classifier
            .classify(&summary(&[("video - mpv", 15_000)]), "", None)
            .await
            .unwrap();
        assert_eq!(classifier.model.calls.load(Ordering::SeqCst), 1);
    }
}
