//! Durable records: the character table and named context snapshots.
//!
//! Both stores write through [`write_atomically`], so a crash mid-save leaves
//! either the previous file or the new one on disk, never a torn mix.

pub mod characters;
pub mod contexts;

pub use characters::{Character, CharacterStore};
pub use contexts::{ContextSnapshot, ContextStore};

use crate::core::config::data::path_display;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Errors raised while reading or writing character and context records.
#[derive(Debug)]
pub enum StorageError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Serialize(toml::ser::Error),
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A record name that cannot safely become a file name.
    InvalidName(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Read { path, source } => {
                write!(f, "Failed to read {}: {}", path_display(path), source)
            }
            StorageError::Parse { path, source } => {
                write!(f, "Failed to parse {}: {}", path_display(path), source)
            }
            StorageError::Serialize(err) => write!(f, "Failed to serialize record: {err}"),
            StorageError::Write { path, source } => {
                write!(f, "Failed to write {}: {}", path_display(path), source)
            }
            StorageError::InvalidName(name) => write!(f, "Invalid name '{name}'"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Read { source, .. } => Some(source),
            StorageError::Parse { source, .. } => Some(source),
            StorageError::Serialize(err) => Some(err),
            StorageError::Write { source, .. } => Some(source),
            StorageError::InvalidName(_) => None,
        }
    }
}

/// Replaces `path` with `contents` via a synced temp file in the same directory.
pub fn write_atomically(path: &Path, contents: &str) -> std::io::Result<()> {
    let parent = path.parent().filter(|dir| !dir.as_os_str().is_empty());

    if let Some(dir) = parent {
        fs::create_dir_all(dir)?;
    }

    let mut temp_file = match parent {
        Some(dir) => NamedTempFile::new_in(dir)?,
        None => NamedTempFile::new_in(".")?,
    };

    temp_file.write_all(contents.as_bytes())?;
    temp_file.as_file_mut().sync_all()?;
    temp_file.persist(path).map_err(|err| err.error)?;
    Ok(())
}

/// Rejects names that would escape the storage directory or produce odd files.
pub(crate) fn validate_record_name(name: &str) -> Result<(), StorageError> {
    let invalid = name.is_empty()
        || name == "."
        || name.contains("..")
        || name
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control());
    if invalid {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_parent_directories() {
        let dir = TempDir::new().expect("tempdir");
        let target = dir.path().join("nested").join("record.toml");

        write_atomically(&target, "a = 1\n").expect("write");
        assert_eq!(fs::read_to_string(&target).unwrap(), "a = 1\n");

        write_atomically(&target, "a = 2\n").expect("overwrite");
        assert_eq!(fs::read_to_string(&target).unwrap(), "a = 2\n");
    }

    #[test]
    fn record_names_cannot_escape_the_directory() {
        assert!(validate_record_name("campaign-1").is_ok());
        assert!(validate_record_name("with space").is_ok());
        for bad in ["", ".", "..", "../etc", "a/b", "a\\b", "tab\there"] {
            assert!(
                matches!(validate_record_name(bad), Err(StorageError::InvalidName(_))),
                "expected {bad:?} to be rejected"
            );
        }
    }
}
