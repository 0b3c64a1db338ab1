use clap::Subcommand;
use focuswatch_core::{ActivityClient, Config, SummarySource};

#[derive(Subcommand)]
pub enum ActivityAction {
    /// List tracker buckets
    Buckets,
    /// Ranked window totals over a trailing window
    Top {
        /// Trailing window in seconds
        #[arg(long, default_value = "60")]
        past_secs: u32,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(action: ActivityAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let client = ActivityClient::new(&config.tracker.base_url);

    match action {
        ActivityAction::Buckets => {
            for bucket in client.list_buckets().await? {
                println!("{bucket}");
            }
        }
        ActivityAction::Top { past_secs, json } => {
            let source = SummarySource::new(client)
                .with_bucket_prefix(&config.tracker.bucket_prefix)
                .with_event_limit(config.tracker.event_limit);
            let summary = source.poll(i64::from(past_secs) * 1000).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                for (key, total_ms) in summary.ranked() {
                    println!("{:>8.1}s  {key}", total_ms as f64 / 1000.0);
                }
            }
        }
    }
    Ok(())
}
