//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dwell_core::TrackerConfig;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Collector endpoint that receives finished visits.
    pub collector_url: String,
    /// Idle-detection sampling interval handed to the browser at startup.
    pub idle_detection_interval_secs: u64,
    /// Visits shorter than this are dropped without delivery.
    pub min_visit_ms: u64,
    /// Timeout for each delivery request.
    pub request_timeout_secs: u64,
    /// Path to the provisioned user identity.
    pub identity_path: PathBuf,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("collector_url", &self.collector_url)
            .field("idle_detection_interval_secs", &self.idle_detection_interval_secs)
            .field("min_visit_ms", &self.min_visit_ms)
            .field("identity_path", &self.identity_path)
            .finish_non_exhaustive()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            collector_url: "http://localhost:5001/api/visits".to_string(),
            idle_detection_interval_secs: 15,
            min_visit_ms: TrackerConfig::default().min_visit_ms,
            request_timeout_secs: 10,
            identity_path: data_dir.join("identity.json"),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (DWELL_*)
        figment = figment.merge(Env::prefixed("DWELL_"));

        figment.extract()
    }

    /// State machine settings derived from this configuration.
    pub const fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            min_visit_ms: self.min_visit_ms,
        }
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Returns the platform-specific config directory for dwell.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("dwell"))
}

/// Returns the platform-specific data directory for dwell.
///
/// On Linux: `~/.local/share/dwell`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("dwell"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    #[test]
    fn test_dirs_data_path_ends_with_dwell() {
        let path = dirs_data_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "dwell");
    }

    #[test]
    fn test_default_config_uses_data_dir_for_identity() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.identity_path, data_dir.join("identity.json"));
    }

    #[test]
    fn test_defaults_match_collector_contract() {
        let config = Config::default();
        assert_eq!(config.collector_url, "http://localhost:5001/api/visits");
        assert_eq!(config.idle_detection_interval_secs, 15);
        assert_eq!(config.tracker_config(), TrackerConfig { min_visit_ms: 1_000 });
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"collector_url = "https://collector.example/api/visits"
min_visit_ms = 2500"#
        )
        .unwrap();
        file.flush().unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();
        assert_eq!(config.collector_url, "https://collector.example/api/visits");
        assert_eq!(config.min_visit_ms, 2_500);
        assert_eq!(config.idle_detection_interval_secs, 15);
    }
}
