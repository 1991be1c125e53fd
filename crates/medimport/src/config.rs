use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root of the date-bucketed archive imports land in.
    #[serde(default = "default_live_data_dir")]
    pub live_data_dir: PathBuf,

    /// Processor allow-list by name; empty means every compiled-in
    /// processor is active.
    #[serde(default)]
    pub enabled_processors: Vec<String>,

    /// When set, every import behaves as a dry run regardless of what the
    /// request asked for.
    #[serde(default)]
    pub force_dry_run: bool,
}

fn default_live_data_dir() -> PathBuf {
    PathBuf::from("./uploads")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            live_data_dir: default_live_data_dir(),
            enabled_processors: Vec::new(),
            force_dry_run: false,
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_yaml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.live_data_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation {
            message: "live_data_dir must not be empty".to_string(),
        });
    }

    for name in &config.enabled_processors {
        if !crate::processor::is_known_processor(name) {
            return Err(ConfigError::Validation {
                message: format!("Unknown processor in enabled_processors: '{}'", name),
            });
        }
    }

    Ok(())
}

/// Default config location under the platform config directory, e.g.
/// `~/.config/medimport/config.yml` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("medimport").join("config.yml"))
}
