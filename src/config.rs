use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration loaded from config.toml.
#[derive(Debug, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Config {
    pub fping: FpingConfig,
    pub influxdb: InfluxConfig,
}

/// How the fping subprocess is invoked.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FpingConfig {
    pub binary: PathBuf,
    pub hosts: Vec<String>,
    /// Seconds between per-interval summary lines (`-Q`).
    pub summary_interval_secs: u64,
    /// Milliseconds between probes to the same host (`-p`).
    pub period_ms: u64,
    /// Prefix output lines with a timestamp (`-D`).
    pub timestamp_lines: bool,
}

/// InfluxDB write endpoint and point naming.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct InfluxConfig {
    pub url: String,
    pub database: String,
    pub measurement: String,
    pub username: String,
    pub password: String,
}

impl Default for FpingConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("/usr/bin/fping"),
            hosts: Vec::new(),
            summary_interval_secs: 10,
            period_ms: 1000,
            timestamp_lines: false,
        }
    }
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8086".to_string(),
            database: "infping".to_string(),
            measurement: "ping".to_string(),
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse the config file as TOML.
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// No probe targets configured.
    NoHosts,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config {}: {}", path.display(), source)
            }
            ConfigError::NoHosts => {
                write!(f, "no hosts configured under [fping].hosts")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::NoHosts => None,
        }
    }
}

/// Load and validate configuration from a TOML file.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    if config.fping.hosts.is_empty() {
        return Err(ConfigError::NoHosts);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_full_config() {
        let (_dir, path) = write_config(
            r#"
[fping]
binary = "/opt/fping"
hosts = ["host1", "host2"]
summary_interval_secs = 30
period_ms = 500
timestamp_lines = true

[influxdb]
url = "http://influx.example:8086"
database = "netprobe"
measurement = "latency"
username = "probe"
password = "secret"
"#,
        );
        let config = load(&path).unwrap();
        assert_eq!(config.fping.binary, PathBuf::from("/opt/fping"));
        assert_eq!(config.fping.hosts, vec!["host1", "host2"]);
        assert_eq!(config.fping.summary_interval_secs, 30);
        assert_eq!(config.fping.period_ms, 500);
        assert!(config.fping.timestamp_lines);
        assert_eq!(config.influxdb.url, "http://influx.example:8086");
        assert_eq!(config.influxdb.database, "netprobe");
        assert_eq!(config.influxdb.measurement, "latency");
        assert_eq!(config.influxdb.username, "probe");
        assert_eq!(config.influxdb.password, "secret");
    }

    #[test]
    fn test_load_applies_defaults() {
        let (_dir, path) = write_config("[fping]\nhosts = [\"host1\"]\n");
        let config = load(&path).unwrap();
        assert_eq!(config.fping.binary, PathBuf::from("/usr/bin/fping"));
        assert_eq!(config.fping.summary_interval_secs, 10);
        assert_eq!(config.fping.period_ms, 1000);
        assert!(!config.fping.timestamp_lines);
        assert_eq!(config.influxdb.url, "http://localhost:8086");
        assert_eq!(config.influxdb.measurement, "ping");
        assert!(config.influxdb.username.is_empty());
    }

    #[test]
    fn test_load_rejects_empty_host_list() {
        let (_dir, path) = write_config("[influxdb]\ndatabase = \"x\"\n");
        let err = load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::NoHosts));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load(Path::new("/nonexistent-dir/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("failed to read config"));
    }

    #[test]
    fn test_load_invalid_toml() {
        let (_dir, path) = write_config("[fping\nhosts = [");
        let err = load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
