//! Persistent configuration.
//!
//! Stored as TOML under the platform config directory. Every field has a
//! default so a missing or partial file never blocks a run.

use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{GrevError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory per-run output folders are created under.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Launch the browser with a visible window. Headed is the default
    /// because the review surfaces bot-detect headless sessions more often.
    #[serde(default = "default_headed")]
    pub headed: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_headed() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            headed: default_headed(),
        }
    }
}

impl Config {
    /// Load the config file, falling back to defaults when absent.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(&path)?;
        let config = toml::from_str(&contents)
            .map_err(|e| GrevError::Config(format!("failed to parse {}: {e}", path.display())))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| GrevError::Config(format!("failed to serialize config: {e}")))?;
        fs::write(&path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let dirs = project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// App data directory; holds the generated driver script.
    pub fn data_dir() -> Result<PathBuf> {
        let dirs = project_dirs()?;
        let dir = dirs.data_dir().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Resolved output directory. `GREV_OUTPUT_DIR` overrides the configured
    /// value, which keeps tests away from real output.
    pub fn output_dir(&self) -> PathBuf {
        match std::env::var("GREV_OUTPUT_DIR") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => self.output_dir.clone(),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "grev")
        .ok_or_else(|| GrevError::Config("could not determine home directory".to_string()))
}
