//! Monitor configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use synthmon_diff::Style;

use crate::error::{RunnerError, RunnerResult};

/// Top-level configuration, usually read from `synthmon.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Settings handed to every step
    pub run: RunSettings,

    /// Comparison configuration
    pub compare: CompareConfig,

    /// Report rendering configuration
    pub report: ReportConfig,
}

/// Per-run settings passed to every step's `handle`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Budget a step should give its own I/O. The pipeline does not enforce it.
    pub timeout_ms: u64,

    /// User agent for HTTP and browser checks
    pub user_agent: String,

    /// Stop a pipeline after its first failed step
    pub stop_on_failure: bool,

    /// Follow HTTP redirects
    pub follow_redirects: bool,

    /// Check-specific settings
    pub extra: BTreeMap<String, String>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            user_agent: format!("synthmon/{}", env!("CARGO_PKG_VERSION")),
            stop_on_failure: false,
            follow_redirects: true,
            extra: BTreeMap::new(),
        }
    }
}

impl RunSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn extra(&self, name: &str) -> Option<&str> {
        self.extra.get(name).map(String::as_str)
    }
}

/// Comparison configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Duration changes up to this many milliseconds are not reported
    pub duration_tolerance_ms: u64,

    /// Skip the duration facets entirely
    pub ignore_durations: bool,
}

impl CompareConfig {
    pub fn duration_tolerance(&self) -> Duration {
        Duration::from_millis(self.duration_tolerance_ms)
    }
}

/// Report rendering configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// `markdown`, `ansi` or `plain`
    pub style: Style,

    /// Heading for comparison reports
    pub title: Option<String>,
}

impl MonitorConfig {
    /// Load configuration from file, falling back to defaults when it does
    /// not exist
    pub fn load(path: &Path) -> RunnerResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> RunnerResult<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> RunnerResult<()> {
        if self.run.timeout_ms == 0 {
            return Err(RunnerError::InvalidConfig(
                "run.timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = MonitorConfig::load(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config, MonitorConfig::default());
        assert_eq!(config.run.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("synthmon.toml");

        let mut config = MonitorConfig::default();
        config.run.stop_on_failure = true;
        config.run.extra.insert("expect_status".to_string(), "200".to_string());
        config.compare.duration_tolerance_ms = 250;
        config.report.style = Style::Ansi;
        config.save(&path).unwrap();

        let loaded = MonitorConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.run.extra("expect_status"), Some("200"));
    }

    #[test]
    fn test_partial_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("synthmon.toml");
        std::fs::write(&path, "[compare]\nignore_durations = true\n").unwrap();

        let config = MonitorConfig::load(&path).unwrap();
        assert!(config.compare.ignore_durations);
        assert_eq!(config.run, RunSettings::default());
    }

    #[test]
    fn test_report_style_names_match_the_cli() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("synthmon.toml");
        std::fs::write(&path, "[report]\nstyle = \"plain\"\n").unwrap();

        let config = MonitorConfig::load(&path).unwrap();
        assert_eq!(config.report.style, Style::Plain);
        assert_eq!(config.report.style, "plain".parse::<Style>().unwrap());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("synthmon.toml");
        std::fs::write(&path, "[run]\ntimeout_ms = 0\n").unwrap();

        assert!(matches!(MonitorConfig::load(&path), Err(RunnerError::InvalidConfig(_))));
    }
}
