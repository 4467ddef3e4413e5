mod config;
mod decode;
mod point;
mod sink;
mod supervisor;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Drives fping in loop mode against a configured set of hosts, decodes
/// its per-interval loss/latency summaries, and writes one point per
/// summary to InfluxDB. Single-shot: meant to be kept alive by an
/// external scheduler.
#[derive(Parser, Debug)]
#[command(name = "infping", version, about)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Validate config and print the resolved fping invocation, don't run
    #[arg(long)]
    dry_run: bool,

    /// Extra logging (per-sample decode details)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = match config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "configuration load failed");
            std::process::exit(1);
        }
    };

    if cli.dry_run {
        println!("infping v{}", env!("CARGO_PKG_VERSION"));
        println!("Config file: {}", cli.config.display());
        println!(
            "fping invocation: {} {}",
            config.fping.binary.display(),
            supervisor::build_args(&config.fping).join(" ")
        );
        println!(
            "InfluxDB: {} db={} measurement={}",
            config.influxdb.url, config.influxdb.database, config.influxdb.measurement
        );
        return;
    }

    tracing::info!(hosts = ?config.fping.hosts, "going to ping the following hosts");

    let sink = sink::InfluxSink::new(&config.influxdb);
    match supervisor::run(&config.fping, &config.influxdb.measurement, sink).await {
        Ok(written) => tracing::info!(points = written, "collection run complete"),
        Err(e) => {
            tracing::error!(error = %e, "collection run failed");
            std::process::exit(1);
        }
    }
}
