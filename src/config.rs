//! Application configuration
//!
//! Read from `config.toml` in the user config directory
//! (e.g. `~/.config/flashmaster/config.toml`). Every field has a default,
//! so a missing file or a partial file is fine.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flashcards::algorithm::{PolicyKind, MIN_EASE_FACTOR};
use crate::flashcards::Scheduler;

const APP_DIR: &str = "flashmaster";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Could not determine data directory")]
    DataDirNotFound,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where projects are stored; defaults to the platform data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub scheduler: SchedulerConfig,
    pub review: ReviewConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub policy: PolicyKind,
    pub sm2: Sm2Config,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sm2Config {
    pub minimum_ease: f32,
}

impl Default for Sm2Config {
    fn default() -> Self {
        Self {
            minimum_ease: MIN_EASE_FACTOR,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Maximum cards per learn session (unlimited when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_limit: Option<usize>,
}

impl AppConfig {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_DIR).join("config.toml"))
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path` if given, else from the default location
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => match Self::default_path() {
                Some(p) => Self::load(&p),
                None => Ok(Self::default()),
            },
        }
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Configured data directory, or the platform default
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        dirs::data_local_dir()
            .map(|p| p.join(APP_DIR))
            .ok_or(ConfigError::DataDirNotFound)
    }

    /// Scheduler running the configured policy
    pub fn scheduler(&self) -> Scheduler {
        Scheduler::with_kind(self.scheduler.policy, self.scheduler.sm2.minimum_ease)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.scheduler.policy, PolicyKind::Fixed);
        assert_eq!(config.scheduler.sm2.minimum_ease, MIN_EASE_FACTOR);
        assert!(config.review.session_limit.is_none());
        assert_eq!(config.scheduler().policy_name(), "fixed");
    }

    #[test]
    fn test_partial_file() {
        let config = AppConfig::from_toml(
            r#"
            data_dir = "/tmp/cards"

            [scheduler]
            policy = "sm2"
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/cards")));
        assert_eq!(config.scheduler.policy, PolicyKind::Sm2);
        assert_eq!(config.scheduler.sm2.minimum_ease, MIN_EASE_FACTOR);
        assert_eq!(config.resolve_data_dir().unwrap(), PathBuf::from("/tmp/cards"));
        assert_eq!(config.scheduler().policy_name(), "sm2");
    }

    #[test]
    fn test_unknown_policy_rejected() {
        assert!(AppConfig::from_toml("[scheduler]\npolicy = \"leitner\"\n").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::load(&temp.path().join("config.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[review]\nsession_limit = 20\n").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.review.session_limit, Some(20));

        fs::write(&path, "review = [").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(ConfigError::Parse { .. })));
    }
}
