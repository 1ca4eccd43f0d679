use anyhow::{Context, Result};
use directories::ProjectDirs;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::scanner::DEFAULT_WORKERS;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanSettings,

    #[serde(default)]
    pub exclusions: Exclusions,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanSettings {
    /// Number of locations measured concurrently.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Exclusions {
    /// Glob patterns; matching files and directories are neither counted nor deleted.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

impl Config {
    /// Path of the config file, e.g. `~/.config/junksweep/config.toml` or
    /// `%APPDATA%\junksweep\config\config.toml`.
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "junksweep")
            .context("could not determine the configuration directory")?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load config from the default location or return defaults.
    pub fn load() -> Self {
        match Self::config_path() {
            Ok(path) if path.exists() => Self::load_from(&path),
            _ => Self::default(),
        }
    }

    /// Load config from `path`, falling back to defaults on any error.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to parse config file, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read config file, using defaults");
                Self::default()
            }
        }
    }

    /// Save config to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("failed to create config directory")?;
        }

        let toml = toml::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(path, toml)
            .with_context(|| format!("failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply CLI option overrides
    pub fn apply_cli_overrides(&mut self, workers: Option<usize>, exclude: &[String]) {
        if let Some(workers) = workers {
            self.scan.workers = workers.max(1);
        }
        self.exclusions.patterns.extend(exclude.iter().cloned());
    }

    /// Compile the exclusion patterns. Invalid patterns are skipped with a warning.
    pub fn exclusion_set(&self) -> ExclusionSet {
        let mut valid = Vec::with_capacity(self.exclusions.patterns.len());
        for pattern in &self.exclusions.patterns {
            match Glob::new(pattern) {
                Ok(_) => valid.push(pattern.clone()),
                Err(e) => warn!(%pattern, error = %e, "ignoring invalid exclusion pattern"),
            }
        }
        ExclusionSet::new(&valid).unwrap_or_default()
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        self.exclusion_set().is_excluded(path)
    }
}

/// Compiled exclusion globs shared by the scan and clean engines.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    set: Option<GlobSet>,
}

impl ExclusionSet {
    pub fn new(patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            return Ok(Self::default());
        }
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(
                Glob::new(pattern)
                    .with_context(|| format!("invalid exclusion pattern: {}", pattern))?,
            );
        }
        let set = builder.build().context("failed to compile exclusion patterns")?;
        Ok(Self { set: Some(set) })
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        match &self.set {
            Some(set) => set.is_match(path),
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.set.as_ref().map_or(true, |s| s.is_empty())
    }
}
