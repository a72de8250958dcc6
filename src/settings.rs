//! Layered runtime settings.
//!
//! Values come from built-in defaults, then an optional settings file, then
//! `HZWATCH_*` environment variables. Command-line flags are applied on top
//! by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::data::duration::parse_duration;
use crate::rules::ConfigSource;

/// Rule files read when nothing else is configured.
pub const DEFAULT_RULE_FILES: &[&str] = &[
    "/opt/drs/record_topics_ecu0.yaml",
    "/opt/drs/record_topics_ecu1.yaml",
];

/// Emitter whose records carry the statistics.
pub const DEFAULT_TARGET_NODE: &str = "rosbag_checker_live";

pub const DEFAULT_REFRESH: &str = "1s";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub rule_files: Vec<PathBuf>,
    pub target_node: String,
    /// Poll interval as a duration string, e.g. `500ms`.
    pub refresh: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rule_files: DEFAULT_RULE_FILES.iter().map(PathBuf::from).collect(),
            target_node: DEFAULT_TARGET_NODE.to_string(),
            refresh: DEFAULT_REFRESH.to_string(),
        }
    }
}

impl Settings {
    /// Load settings, reading `path` if given and present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("rule_files", DEFAULT_RULE_FILES.to_vec())?
            .set_default("target_node", DEFAULT_TARGET_NODE)?
            .set_default("refresh", DEFAULT_REFRESH)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("HZWATCH")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("rule_files"),
            )
            .build()
            .context("Failed to read settings")?;

        let settings: Settings = config.try_deserialize().context("Invalid settings")?;
        // Fail early on a bad interval rather than at first use
        settings.refresh_interval()?;
        Ok(settings)
    }

    /// The poll interval.
    pub fn refresh_interval(&self) -> Result<Duration> {
        parse_duration(&self.refresh)
            .with_context(|| format!("Invalid refresh interval '{}'", self.refresh))
    }

    /// Rule files as configuration sources, in load order.
    pub fn rule_sources(&self) -> Vec<ConfigSource> {
        self.rule_files.iter().map(ConfigSource::file).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.rule_files.len(), 2);
        assert_eq!(settings.target_node, "rosbag_checker_live");
        assert_eq!(settings.refresh_interval().unwrap(), Duration::from_secs(1));
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let settings = Settings::load(Some(Path::new("/nonexistent/hzwatch.toml"))).unwrap();
        assert_eq!(settings.rule_files, Settings::default().rule_files);
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "rule_files = [\"/etc/rules/a.yaml\"]\ntarget_node = \"checker\"\nrefresh = \"250ms\""
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.rule_files, vec![PathBuf::from("/etc/rules/a.yaml")]);
        assert_eq!(settings.target_node, "checker");
        assert_eq!(settings.refresh_interval().unwrap(), Duration::from_millis(250));
        assert_eq!(
            settings.rule_sources(),
            vec![ConfigSource::file("/etc/rules/a.yaml")]
        );
    }

    #[test]
    fn test_load_rejects_bad_refresh() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "refresh = \"soon\"").unwrap();
        assert!(Settings::load(Some(file.path())).is_err());
    }
}
