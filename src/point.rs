use crate::decode::{SampleRecord, Timing};
use chrono::{DateTime, Utc};

/// One timestamped metric point bound for the sink.
///
/// The timestamp is assigned at decode time, not parsed from the line; the
/// upstream process is trusted to emit summaries in order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    pub measurement: String,
    /// Tag value identifying the probed host.
    pub host: String,
    /// `loss` field, integer percent, unclamped.
    pub loss: i64,
    /// `min`/`avg`/`max` fields; omitted entirely when no probe got a reply.
    pub timing: Option<Timing>,
    pub timestamp: DateTime<Utc>,
}

impl MetricPoint {
    /// Map a decoded sample to a point under the configured measurement.
    pub fn from_sample(sample: &SampleRecord, measurement: &str, now: DateTime<Utc>) -> Self {
        Self {
            measurement: measurement.to_string(),
            host: sample.host.clone(),
            loss: sample.loss_percent,
            timing: sample.timing,
            timestamp: now,
        }
    }
}
