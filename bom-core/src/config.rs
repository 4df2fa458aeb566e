use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{model::StationEntry, pipeline::Selection, timestamp::TimeMode};

pub const DEFAULT_OUTPUT: &str = "bom_weather.geojson";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// The upstream answers 403 to generic client agents, so a browser string is sent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const DEFAULT_STATIONS: &[(&str, &str)] = &[
    ("Canungra", "http://www.bom.gov.au/fwo/IDQ60801/IDQ60801.94418.json"),
    ("Amberley", "http://www.bom.gov.au/fwo/IDQ60801/IDQ60801.94568.json"),
    ("Greenbank", "http://www.bom.gov.au/fwo/IDQ60801/IDQ60801.94419.json"),
    ("Tin Can Bay", "http://www.bom.gov.au/fwo/IDQ60801/IDQ60801.94420.json"),
    ("Brisbane", "http://www.bom.gov.au/fwo/IDQ60801/IDQ60801.94576.json"),
];

/// Top-level configuration stored on disk.
///
/// Every key is optional; anything left out falls back to the built-in default.
///
/// Example TOML:
/// ```toml
/// output = "bom_weather.geojson"
/// selection = "first"
/// time_mode = "utc"
/// heartbeat = false
///
/// [[stations]]
/// name = "Brisbane"
/// url = "http://www.bom.gov.au/fwo/IDQ60801/IDQ60801.94576.json"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the FeatureCollection is written.
    pub output: PathBuf,

    /// Which element of `observations.data` counts as the latest reading.
    pub selection: Selection,

    /// How timestamps are presented.
    pub time_mode: TimeMode,

    /// Add a `last_updated` wall-clock property so every run changes the file.
    pub heartbeat: bool,

    pub timeout_secs: u64,

    pub user_agent: String,

    pub stations: Vec<StationEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT),
            selection: Selection::default(),
            time_mode: TimeMode::default(),
            heartbeat: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            stations: default_stations(),
        }
    }
}

pub fn default_stations() -> Vec<StationEntry> {
    DEFAULT_STATIONS.iter().map(|(name, url)| StationEntry::new(*name, *url)).collect()
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Load config from the platform location, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load config from an explicit path, or return defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        if cfg.stations.is_empty() {
            tracing::warn!("config {} lists no stations", path.display());
        }

        Ok(cfg)
    }

    /// Save config, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "bom-geojson", "bom-geojson")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn station(&self, name: &str) -> Option<&StationEntry> {
        self.stations.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_five_stations() {
        let cfg = Config::default();

        assert_eq!(cfg.stations.len(), 5);
        assert_eq!(cfg.output, PathBuf::from("bom_weather.geojson"));
        assert_eq!(cfg.selection, Selection::First);
        assert_eq!(cfg.time_mode, TimeMode::Utc);
        assert!(!cfg.heartbeat);
        assert_eq!(cfg.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn station_lookup_ignores_case() {
        let cfg = Config::default();

        let station = cfg.station("tin can bay").expect("station must exist");
        assert!(station.url.ends_with("94420.json"));
        assert!(cfg.station("Sydney").is_none());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
selection = "last"
time_mode = "aest"

[[stations]]
name = "Local"
url = "http://localhost/obs.json"
"#,
        )
        .unwrap();

        let cfg = Config::load_from(&path).unwrap();

        assert_eq!(cfg.selection, Selection::Last);
        assert_eq!(cfg.time_mode, TimeMode::Aest);
        assert_eq!(cfg.stations, vec![StationEntry::new("Local", "http://localhost/obs.json")]);
        assert_eq!(cfg.output, PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(cfg.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let cfg = Config {
            heartbeat: true,
            timeout_secs: 3,
            output: PathBuf::from("out/weather.geojson"),
            ..Config::default()
        };
        cfg.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "selection = \"middle\"").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
