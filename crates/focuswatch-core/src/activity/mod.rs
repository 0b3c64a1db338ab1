//! Window activity: tracker client, interval aggregation, attention summaries.

mod aggregate;
mod client;
mod summary;

pub use aggregate::{aggregate, composite_key, ranked};
pub use client::{ActivityClient, EventQuery, EventSort, TrackerEvent, WindowData};
pub use summary::{AttentionSummary, SummarySource, DEFAULT_BUCKET_PREFIX};
