use std::sync::Arc;
use std::time::Duration;

use clap::Subcommand;
use focuswatch_core::{
    ActivityClient, ChatModel, Config, DistractionClassifier, FocusMonitor, NotificationSink,
    SessionEvent, SummarySource, ThresholdClassifier, Verdict,
};

#[derive(Subcommand)]
pub enum FocusAction {
    /// Run a monitored focus session in the foreground
    Run {
        /// Session length in minutes
        #[arg(long)]
        minutes: u32,
        /// What you intend to work on
        #[arg(long, default_value = "")]
        goal: String,
        /// Extra context for the distraction check
        #[arg(long)]
        notes: Option<String>,
    },
    /// One-shot distraction check against current activity
    Check {
        #[arg(long, default_value = "")]
        goal: String,
        #[arg(long)]
        notes: Option<String>,
    },
}

struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn deliver(&self, event: &SessionEvent) -> Result<(), Box<dyn std::error::Error>> {
        match event {
            SessionEvent::SessionStarted { session } => {
                println!(
                    "focusing on '{}' for {} min",
                    session.goal,
                    session.duration_ms / 60_000
                );
            }
            SessionEvent::SessionStopped { manual: true } => println!("session stopped"),
            SessionEvent::SessionStopped { manual: false } => {}
            SessionEvent::SessionFinished { session } => {
                println!("session finished: '{}' -- well done", session.goal);
            }
            SessionEvent::DistractionDetected { description, goal } => {
                if goal.is_empty() {
                    println!("distraction: {description}");
                } else {
                    println!("distraction: {description} (goal: {goal})");
                }
            }
        }
        Ok(())
    }
}

fn build_classifier(
    config: &Config,
) -> Result<ThresholdClassifier<ChatModel>, Box<dyn std::error::Error>> {
    let api_key = config
        .api_key()
        .ok_or_else(|| format!("set {} to enable distraction checks", config.model.api_key_env))?;
    let model = ChatModel::new(&config.model.base_url, api_key, &config.model.name);
    Ok(ThresholdClassifier::new(model).with_threshold_ms(config.focus.threshold_ms))
}

pub async fn run(action: FocusAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let client = ActivityClient::new(&config.tracker.base_url);
    let source = SummarySource::new(client)
        .with_bucket_prefix(&config.tracker.bucket_prefix)
        .with_event_limit(config.tracker.event_limit);

    match action {
        FocusAction::Run { minutes, goal, notes } => {
            let classifier = Arc::new(build_classifier(&config)?);
            let monitor = FocusMonitor::new(classifier);
            monitor.add_sink(Box::new(ConsoleSink));
            monitor.start(i64::from(minutes) * 60_000, goal, notes)?;

            let mut cadence =
                tokio::time::interval(Duration::from_millis(config.focus.cadence_ms.max(1)));
            cadence.tick().await; // the first tick fires immediately

            while monitor.is_focusing() {
                // Wake shortly after expiry so the loop ends without
                // waiting out a full cadence tick.
                let until_end = Duration::from_millis(monitor.remaining_ms() + 50);
                tokio::select! {
                    _ = cadence.tick() => {
                        if !monitor.is_focusing() {
                            break;
                        }
                        match source.poll(config.tracker.past_ms).await {
                            Ok(summary) => monitor.on_attention_summary(summary).await,
                            // Transient tracker failures wait for the next tick.
                            Err(e) => tracing::warn!("activity poll failed: {e}"),
                        }
                    }
                    _ = tokio::time::sleep(until_end) => {}
                    _ = tokio::signal::ctrl_c() => {
                        monitor.stop(true);
                        break;
                    }
                }
            }
        }
        FocusAction::Check { goal, notes } => {
            let classifier = build_classifier(&config)?;
            let summary = source.poll(config.tracker.past_ms).await?;
            match classifier.classify(&summary, &goal, notes.as_deref()).await? {
                Verdict::Clear => println!("OK"),
                Verdict::Suspicious(description) => println!("suspicious: {description}"),
            }
        }
    }
    Ok(())
}
