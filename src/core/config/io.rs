use crate::core::config::data::{path_display, ConfigFile, RuntimeConfig};
use crate::core::config::defaults::CONFIG_TEMPLATE;
use crate::storage::write_atomically;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Errors that can occur when loading configuration from disk.
#[derive(Debug)]
pub enum ConfigError {
    /// No configuration file exists at the expected location.
    Missing {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Failed to read the configuration file from disk.
    Read {
        /// Path to the configuration file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the configuration file as valid TOML.
    Parse {
        /// Path to the configuration file with invalid TOML.
        path: PathBuf,
        /// The TOML deserialization error.
        source: toml::de::Error,
    },

    /// The file parsed but its values are inconsistent.
    Invalid { path: PathBuf, reason: String },

    /// Failed to write the configuration template.
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ConfigError {
    fn display_path(path: &Path) -> String {
        path_display(path)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing { path } => {
                write!(f, "No config found at {}", Self::display_path(path))
            }
            ConfigError::Read { path, source } => {
                write!(
                    f,
                    "Failed to read config at {}: {}",
                    Self::display_path(path),
                    source
                )
            }
            ConfigError::Parse { path, source } => {
                write!(
                    f,
                    "Failed to parse config at {}: {}",
                    Self::display_path(path),
                    source
                )
            }
            ConfigError::Invalid { path, reason } => {
                write!(
                    f,
                    "Invalid config at {}: {}",
                    Self::display_path(path),
                    reason
                )
            }
            ConfigError::Write { path, source } => {
                write!(
                    f,
                    "Failed to write config template at {}: {}",
                    Self::display_path(path),
                    source
                )
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Missing { .. } => None,
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Invalid { .. } => None,
            ConfigError::Write { source, .. } => Some(source),
        }
    }
}

impl ConfigFile {
    pub fn load_from_path(config_path: &Path) -> Result<ConfigFile, ConfigError> {
        let contents = match fs::read_to_string(config_path) {
            Ok(contents) => contents,
            Err(source) if source.kind() == ErrorKind::NotFound => {
                return Err(ConfigError::Missing {
                    path: config_path.to_path_buf(),
                })
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: config_path.to_path_buf(),
                    source,
                })
            }
        };
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source,
        })
    }

    /// Loads and validates in one step, yielding the credential and the
    /// reloadable settings.
    pub fn load_runtime(config_path: &Path) -> Result<(String, RuntimeConfig), ConfigError> {
        Self::load_from_path(config_path)?
            .into_runtime()
            .map_err(|reason| ConfigError::Invalid {
                path: config_path.to_path_buf(),
                reason,
            })
    }
}

/// Writes the commented template unless a config already exists.
///
/// Returns `true` when a new file was created.
pub fn write_template_if_missing(config_path: &Path) -> Result<bool, ConfigError> {
    if config_path.exists() {
        return Ok(false);
    }
    write_atomically(config_path, CONFIG_TEMPLATE).map_err(|source| ConfigError::Write {
        path: config_path.to_path_buf(),
        source,
    })?;
    Ok(true)
}
