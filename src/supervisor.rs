//! fping process lifecycle: spawn with both pipes wired, decode stderr
//! concurrently, wait for exit, then drain one stdout line for operators.
//!
//! Single-shot by design: the run either completes or fails, and an
//! external scheduler decides when to invoke the collector again.
use crate::config::FpingConfig;
use crate::decode;
use crate::point::MetricPoint;
use crate::sink::{PointSink, WriteError};
use chrono::Utc;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Errors that end a collection run.
#[derive(Debug)]
pub enum SupervisorError {
    /// The fping binary is not present at the configured path.
    MissingBinary { path: PathBuf },
    /// Failed to spawn the fping subprocess (pipe setup included).
    Spawn { source: std::io::Error },
    /// A piped stream was not handed back after spawn.
    Pipe { stream: &'static str },
    /// The decode task hit an unrecoverable sink failure.
    Sink(WriteError),
}

impl std::fmt::Display for SupervisorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SupervisorError::MissingBinary { path } => {
                write!(f, "fping binary not found at {}", path.display())
            }
            SupervisorError::Spawn { source } => {
                write!(f, "failed to spawn fping: {}", source)
            }
            SupervisorError::Pipe { stream } => {
                write!(f, "failed to acquire fping {} pipe", stream)
            }
            SupervisorError::Sink(source) => write!(f, "{}", source),
        }
    }
}

impl std::error::Error for SupervisorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SupervisorError::Spawn { source } => Some(source),
            SupervisorError::Sink(source) => Some(source),
            _ => None,
        }
    }
}

/// Build the fping argument list: fixed operational flags, then one
/// argument per target host.
///
/// `-B 1` no backoff growth, `-r 0` no per-probe retries, `-O 0` no ToS
/// override, `-Q`/`-p` summary interval and probe period from config,
/// `-l` loop forever, `-D` per-line timestamps only when configured.
pub fn build_args(config: &FpingConfig) -> Vec<String> {
    let mut args: Vec<String> = [
        "-B", "1", "-r", "0", "-O", "0",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.push("-Q".to_string());
    args.push(config.summary_interval_secs.to_string());
    args.push("-p".to_string());
    args.push(config.period_ms.to_string());
    args.push("-l".to_string());
    if config.timestamp_lines {
        args.push("-D".to_string());
    }
    args.extend(config.hosts.iter().cloned());
    args
}

/// Run one collection pass: spawn fping, decode its stderr into points,
/// and forward each point to the sink. Returns the number of points
/// written.
///
/// Process wait failures are logged and tolerated; a sink transmission
/// failure aborts the run. The decode task is joined before the final
/// stdout read so no in-flight summary lines are lost.
pub async fn run<S>(
    config: &FpingConfig,
    measurement: &str,
    sink: S,
) -> Result<u64, SupervisorError>
where
    S: PointSink + Send + 'static,
{
    if !config.binary.exists() {
        return Err(SupervisorError::MissingBinary {
            path: config.binary.clone(),
        });
    }

    let args = build_args(config);
    tracing::info!(
        binary = %config.binary.display(),
        hosts = ?config.hosts,
        "spawning fping"
    );

    let mut child = Command::new(&config.binary)
        .args(&args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| SupervisorError::Spawn { source: e })?;

    let stdout = child
        .stdout
        .take()
        .ok_or(SupervisorError::Pipe { stream: "stdout" })?;
    let stderr = child
        .stderr
        .take()
        .ok_or(SupervisorError::Pipe { stream: "stderr" })?;

    tracing::info!(pid = child.id().unwrap_or(0), "fping started");

    let drain = tokio::spawn(drain_summaries(stderr, measurement.to_string(), sink));

    // Best effort: a wait failure still leaves the streams drainable.
    match child.wait().await {
        Ok(status) => tracing::info!(exit_code = ?status.code(), "fping exited"),
        Err(e) => tracing::warn!(error = %e, "failed to wait for fping"),
    }

    // Explicit join: stderr stays open until fping is gone, and the run is
    // not complete until every emitted summary line has been decoded.
    let written = match drain.await {
        Ok(Ok(written)) => written,
        Ok(Err(e)) => return Err(SupervisorError::Sink(e)),
        Err(e) => {
            tracing::warn!(error = %e, "decode task failed to complete");
            0
        }
    };

    // One stdout line post-exit, surfaced for operators, never parsed.
    let mut stdout_lines = BufReader::new(stdout).lines();
    match stdout_lines.next_line().await {
        Ok(Some(line)) => tracing::info!(stdout = %line, "fping output"),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "failed to read fping stdout"),
    }

    Ok(written)
}

/// Decode loop over the diagnostic stream: line → sample → point → sink,
/// in emission order, one point per line.
async fn drain_summaries<S: PointSink>(
    stderr: tokio::process::ChildStderr,
    measurement: String,
    sink: S,
) -> Result<u64, WriteError> {
    let mut lines = BufReader::new(stderr).lines();
    let mut written = 0u64;
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "error reading fping stderr");
                break;
            }
        };

        let Some(sample) = decode::decode(&line) else {
            continue;
        };
        tracing::debug!(
            host = %sample.host,
            sent = sample.sent,
            recv = sample.recv,
            loss = sample.loss_percent,
            timing = ?sample.timing,
            "decoded summary"
        );

        let point = MetricPoint::from_sample(&sample, &measurement, Utc::now());
        match sink.write(&point).await {
            Ok(()) => written += 1,
            Err(WriteError::InvalidPoint(reason)) => {
                tracing::warn!(host = %point.host, reason = %reason, "dropping point");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(written)
}
