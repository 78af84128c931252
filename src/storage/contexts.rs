use super::{validate_record_name, write_atomically, StorageError};
use crate::core::message::ConversationTurn;
use crate::transport::ChannelId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

/// A named, persisted copy of one channel's conversation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub channel_id: ChannelId,
    /// Whatever the session's active model was at save time. Stored under
    /// `character` for compatibility with older snapshot files.
    #[serde(rename = "character", default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_character: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub conversation: Vec<ConversationTurn>,
}

/// One `<name>.toml` file per saved context inside the contexts directory.
pub struct ContextStore {
    dir: PathBuf,
}

impl ContextStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, name: &str) -> Result<PathBuf, StorageError> {
        validate_record_name(name)?;
        Ok(self.dir.join(format!("{name}.toml")))
    }

    pub fn exists(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.path_for(name)?.is_file())
    }

    pub fn save(&self, name: &str, snapshot: &ContextSnapshot) -> Result<(), StorageError> {
        let path = self.path_for(name)?;
        let contents = toml::to_string_pretty(snapshot).map_err(StorageError::Serialize)?;
        write_atomically(&path, &contents).map_err(|source| StorageError::Write {
            path: path.clone(),
            source,
        })?;
        debug!(
            name,
            turns = snapshot.conversation.len(),
            "context snapshot written"
        );
        Ok(())
    }

    /// `Ok(None)` when no snapshot with that name exists.
    pub fn load(&self, name: &str) -> Result<Option<ContextSnapshot>, StorageError> {
        let path = self.path_for(name)?;
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::Read { path, source }),
        };
        toml::from_str(&contents)
            .map(Some)
            .map_err(|source| StorageError::Parse { path, source })
    }
}
