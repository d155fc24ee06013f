//! Configuration File Loading
//!
//! Handles locating and loading TOML configuration files with fallback to
//! built-in defaults when no file exists.

use super::Config;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "replbridge.toml";

/// Configuration file loader
pub struct ConfigLoader {
    /// Search paths for configuration files
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader with default search paths
    pub fn new() -> Self {
        Self {
            search_paths: Self::get_search_paths(),
        }
    }

    /// Load configuration from the first file found in the search paths.
    ///
    /// A missing file is not an error; defaults are returned instead. A file
    /// that exists but fails to parse is an error.
    pub fn load() -> Result<Config> {
        let loader = Self::new();
        for path in &loader.search_paths {
            if path.exists() {
                debug!("Loading configuration from {}", path.display());
                return Self::load_from(path);
            }
        }
        debug!("No configuration file found, using defaults");
        Ok(Config::default())
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Config> {
        let contents = fs::read_to_string(path).map_err(|e| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&contents).map_err(|e| Error::ConfigParseFailed {
            format: "TOML".to_string(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to a specific file
    pub fn save_to(config: &Config, path: &Path) -> Result<()> {
        let contents =
            toml::to_string_pretty(config).map_err(|e| Error::ConfigParseFailed {
                format: "TOML".to_string(),
                reason: e.to_string(),
            })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
        Ok(())
    }

    /// Default search locations: working directory, then the user config dir
    fn get_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("replbridge").join(CONFIG_FILE_NAME));
        }

        paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
