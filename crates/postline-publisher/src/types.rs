use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One metrics reading for a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSample {
    pub follower_count: i64,
    /// Week-over-week follower growth, percent.
    pub growth_rate: Decimal,
    /// Interactions per impression, percent.
    pub engagement_rate: Decimal,
}

/// Content handed to a platform for a one-off publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundPost {
    pub content: String,
    pub hashtags: Vec<String>,
    pub media_urls: Vec<String>,
    pub scheduled_for: DateTime<Utc>,
}

/// What a platform returns for an accepted publish job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleReceipt {
    pub external_id: String,
}
