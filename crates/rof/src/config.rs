//! Configuration for rof.
//!
//! Configuration is loaded from multiple sources, later ones winning:
//! 1. Built-in defaults
//! 2. Global config: `~/.config/rof/config.json`
//! 3. Environment overrides: `ROF_SNAPSHOT_DIR`, `ROF_SHELL`, `ROF_LOG_LEVEL`
//!
//! A broken config file is reported and ignored; it never keeps the
//! command from running. A snapshot directory that is not a plain name
//! (`.`, `..`, absolute or nested paths) falls back to the default.

use crate::log::LogLevel;
use anyhow::Context;
use rof_snapshot::{SnapshotConfig, DEFAULT_SNAPSHOT_DIR};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Shell used to interpret the command line.
pub const DEFAULT_SHELL: &str = "sh";

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Snapshot directory name, relative to the working directory.
    pub snapshot_dir: String,

    /// Shell that runs the command (`<shell> -c <command>`).
    pub shell: String,

    /// Log level for rof's own diagnostics.
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapshot_dir: DEFAULT_SNAPSHOT_DIR.to_string(),
            shell: DEFAULT_SHELL.to_string(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Logging is not set up yet when this runs, so problems are returned
    /// alongside the config for the caller to report.
    pub async fn load() -> (Self, Vec<String>) {
        let mut config = Config::default();
        let mut issues = Vec::new();

        if let Some(path) = Self::global_config_dir().map(|d| d.join("config.json")) {
            if path.exists() {
                match Self::load_file(&path).await {
                    Ok(loaded) => config = loaded,
                    Err(e) => issues.push(format!("Ignoring config {}: {:#}", path.display(), e)),
                }
            }
        }

        let config = config.with_env_overrides(|key| std::env::var(key).ok(), &mut issues);
        (config, issues)
    }

    /// Get the global config directory.
    pub fn global_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("rof"))
    }

    /// Load configuration from a file.
    pub async fn load_file(path: &Path) -> anyhow::Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse configuration from JSON. Missing keys keep their defaults.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        serde_json::from_str(content).context("invalid config JSON")
    }

    /// Apply `ROF_*` overrides read through `lookup`.
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
        issues: &mut Vec<String>,
    ) -> Self {
        if let Some(dir) = lookup("ROF_SNAPSHOT_DIR").filter(|v| !v.is_empty()) {
            self.snapshot_dir = dir;
        }
        if let Some(shell) = lookup("ROF_SHELL").filter(|v| !v.is_empty()) {
            self.shell = shell;
        }
        if let Some(level) = lookup("ROF_LOG_LEVEL") {
            match LogLevel::parse(&level) {
                Some(level) => self.log_level = level,
                None => issues.push(format!("Ignoring unknown ROF_LOG_LEVEL: {level}")),
            }
        }
        if let Err(e) = self.snapshot_config().validate() {
            issues.push(format!("{e}, using {DEFAULT_SNAPSHOT_DIR}"));
            self.snapshot_dir = DEFAULT_SNAPSHOT_DIR.to_string();
        }
        self
    }

    /// Snapshot store settings.
    pub fn snapshot_config(&self) -> SnapshotConfig {
        SnapshotConfig {
            dir_name: self.snapshot_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.snapshot_dir, ".rof_snapshots");
        assert_eq!(config.shell, "sh");
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_parse_partial() {
        let config = Config::parse(r#"{"shell": "bash"}"#).unwrap();
        assert_eq!(config.shell, "bash");
        assert_eq!(config.snapshot_dir, ".rof_snapshots");
    }

    #[test]
    fn test_parse_log_level() {
        let config = Config::parse(r#"{"log_level": "warn"}"#).unwrap();
        assert_eq!(config.log_level, LogLevel::Warn);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Config::parse("{not json").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut issues = Vec::new();
        let config = Config::default().with_env_overrides(
            env(&[
                ("ROF_SNAPSHOT_DIR", ".snaps"),
                ("ROF_SHELL", "/bin/bash"),
                ("ROF_LOG_LEVEL", "debug"),
            ]),
            &mut issues,
        );
        assert!(issues.is_empty());
        assert_eq!(config.snapshot_dir, ".snaps");
        assert_eq!(config.shell, "/bin/bash");
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_empty_and_unknown_env_values_ignored() {
        let mut issues = Vec::new();
        let config = Config::default().with_env_overrides(
            env(&[("ROF_SNAPSHOT_DIR", ""), ("ROF_LOG_LEVEL", "chatty")]),
            &mut issues,
        );
        assert_eq!(config, Config::default());
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("chatty"));
    }

    #[test]
    fn test_unsafe_snapshot_dir_falls_back_to_default() {
        for bad in [".", "..", "/tmp/snaps", "docs/snaps"] {
            let mut issues = Vec::new();
            let config = Config::default()
                .with_env_overrides(env(&[("ROF_SNAPSHOT_DIR", bad)]), &mut issues);
            assert_eq!(config.snapshot_dir, ".rof_snapshots", "{bad:?}");
            assert_eq!(issues.len(), 1);
            assert!(issues[0].contains("Invalid snapshot directory name"));
        }
    }

    #[test]
    fn test_unsafe_snapshot_dir_from_file_falls_back_to_default() {
        let mut issues = Vec::new();
        let config = Config::parse(r#"{"snapshot_dir": "."}"#)
            .unwrap()
            .with_env_overrides(env(&[]), &mut issues);
        assert_eq!(config.snapshot_dir, ".rof_snapshots");
        assert_eq!(issues.len(), 1);
    }

    #[tokio::test]
    async fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        tokio::fs::write(&path, r#"{"snapshot_dir": ".backup"}"#)
            .await
            .unwrap();

        let config = Config::load_file(&path).await.unwrap();
        assert_eq!(config.snapshot_config().dir_name, ".backup");
    }
}
