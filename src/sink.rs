//! InfluxDB write path: line-protocol encoding and the HTTP sink.
//!
//! Each point is sent as its own one-point batch at nanosecond precision;
//! there is no buffering or coalescing across samples. A point that cannot
//! be encoded is dropped by the caller; a transport failure is fatal to the
//! whole run (durability is the external scheduler's problem, not ours).
use crate::point::MetricPoint;
use std::future::Future;

/// Errors from encoding or transmitting a point.
#[derive(Debug)]
pub enum WriteError {
    /// The point cannot be represented in line protocol.
    InvalidPoint(String),
    /// The HTTP request itself failed (connect, timeout, protocol).
    Http(reqwest::Error),
    /// The sink answered with a non-success status.
    Status { code: u16, body: String },
}

impl std::fmt::Display for WriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteError::InvalidPoint(reason) => write!(f, "invalid point: {}", reason),
            WriteError::Http(source) => write!(f, "influxdb write failed: {}", source),
            WriteError::Status { code, body } => {
                write!(f, "influxdb write rejected with status {}: {}", code, body)
            }
        }
    }
}

impl std::error::Error for WriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WriteError::Http(source) => Some(source),
            _ => None,
        }
    }
}

/// Destination for metric points, one point per call.
///
/// The decode loop only sees this trait, so tests can substitute a
/// recording sink for the HTTP client.
pub trait PointSink {
    fn write(&self, point: &MetricPoint)
        -> impl Future<Output = Result<(), WriteError>> + Send;
}

/// Render one point as an InfluxDB line-protocol record with a nanosecond
/// timestamp: `measurement,host=h loss=0i[,min=..,avg=..,max=..] <ns>`.
pub fn encode_line(point: &MetricPoint) -> Result<String, WriteError> {
    if point.measurement.is_empty() {
        return Err(WriteError::InvalidPoint("empty measurement".to_string()));
    }
    if point.host.is_empty() {
        return Err(WriteError::InvalidPoint("empty host tag".to_string()));
    }
    let nanos = point
        .timestamp
        .timestamp_nanos_opt()
        .ok_or_else(|| WriteError::InvalidPoint("timestamp out of range".to_string()))?;

    let mut fields = format!("loss={}i", point.loss);
    if let Some(timing) = &point.timing {
        fields.push_str(&format!(
            ",min={},avg={},max={}",
            timing.min, timing.avg, timing.max
        ));
    }

    Ok(format!(
        "{},host={} {} {}",
        escape_key(&point.measurement),
        escape_tag_value(&point.host),
        fields,
        nanos
    ))
}

fn escape_key(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

fn escape_tag_value(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ").replace('=', "\\=")
}

/// HTTP sink writing to an InfluxDB 1.x `/write` endpoint.
pub struct InfluxSink {
    client: reqwest::Client,
    write_url: String,
    database: String,
    username: String,
    password: String,
}

impl InfluxSink {
    pub fn new(config: &crate::config::InfluxConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            write_url: format!("{}/write", config.url.trim_end_matches('/')),
            database: config.database.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }
}

impl PointSink for InfluxSink {
    async fn write(&self, point: &MetricPoint) -> Result<(), WriteError> {
        let body = encode_line(point)?;

        let mut request = self
            .client
            .post(&self.write_url)
            .query(&[("db", self.database.as_str()), ("precision", "ns")])
            .body(body);
        if !self.username.is_empty() {
            request = request.basic_auth(&self.username, Some(&self.password));
        }

        let response = request.send().await.map_err(WriteError::Http)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WriteError::Status {
                code: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
