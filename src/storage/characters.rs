use super::{validate_record_name, write_atomically, StorageError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// A named persona preset: the model to talk to and the system prompt that
/// opens every conversation with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    pub name: String,
    pub model: String,
    pub prompt: String,
    /// Replaces the configured notice shown while retrying after a "500".
    pub error_override: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CharacterRecord {
    model: String,
    prompt: String,
    #[serde(
        default,
        rename = "error_500_message",
        skip_serializing_if = "Option::is_none"
    )]
    error_override: Option<String>,
}

type CharacterTable = BTreeMap<String, CharacterRecord>;

impl CharacterRecord {
    fn into_character(self, name: String) -> Character {
        Character {
            name,
            model: self.model,
            prompt: self.prompt,
            error_override: self.error_override.filter(|text| !text.trim().is_empty()),
        }
    }
}

/// The `characters.toml` table, keyed by character name.
///
/// Every operation rereads the file so hand edits are picked up without a
/// restart. Writes are serialized within the process and last-writer-wins
/// across processes.
pub struct CharacterStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CharacterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_table(&self) -> Result<CharacterTable, StorageError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(CharacterTable::new()),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        toml::from_str(&contents).map_err(|source| StorageError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn write_table(&self, table: &CharacterTable) -> Result<(), StorageError> {
        let contents = toml::to_string_pretty(table).map_err(StorageError::Serialize)?;
        write_atomically(&self.path, &contents).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// All characters, ordered by name.
    pub fn list(&self) -> Result<Vec<Character>, StorageError> {
        Ok(self
            .read_table()?
            .into_iter()
            .map(|(name, record)| record.into_character(name))
            .collect())
    }

    pub fn get(&self, name: &str) -> Result<Option<Character>, StorageError> {
        Ok(self
            .read_table()?
            .remove(name)
            .map(|record| record.into_character(name.to_string())))
    }

    /// Creates or replaces a character. An existing error override survives
    /// when the new definition does not carry one.
    pub fn upsert(&self, character: Character) -> Result<(), StorageError> {
        validate_record_name(&character.name)?;
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut table = self.read_table()?;
        let previous_override = table
            .get(&character.name)
            .and_then(|existing| existing.error_override.clone());
        table.insert(
            character.name.clone(),
            CharacterRecord {
                model: character.model,
                prompt: character.prompt,
                error_override: character.error_override.or(previous_override),
            },
        );
        self.write_table(&table)?;
        debug!(name = %character.name, "character saved");
        Ok(())
    }

    /// Returns `false` when no such character existed.
    pub fn remove(&self, name: &str) -> Result<bool, StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut table = self.read_table()?;
        if table.remove(name).is_none() {
            return Ok(false);
        }
        self.write_table(&table)?;
        debug!(name, "character deleted");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn bob() -> Character {
        Character {
            name: "Bob".to_string(),
            model: "gpt-x".to_string(),
            prompt: "You are Bob".to_string(),
            error_override: None,
        }
    }

    #[test]
    fn missing_file_reads_as_empty_table() {
        let dir = TempDir::new().expect("tempdir");
        let store = CharacterStore::new(dir.path().join("characters.toml"));
        assert!(store.list().unwrap().is_empty());
        assert_eq!(store.get("Bob").unwrap(), None);
    }

    #[test]
    fn upsert_then_get_returns_stored_record() {
        let dir = TempDir::new().expect("tempdir");
        let store = CharacterStore::new(dir.path().join("characters.toml"));

        store.upsert(bob()).unwrap();

        assert_eq!(store.get("Bob").unwrap(), Some(bob()));
        let on_disk = fs::read_to_string(store.path()).unwrap();
        assert!(on_disk.contains("[Bob]"));
        assert!(on_disk.contains("model = \"gpt-x\""));
    }

    #[test]
    fn upsert_keeps_hand_written_error_override() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("characters.toml");
        fs::write(
            &path,
            "[Bob]\nmodel = \"old\"\nprompt = \"old\"\nerror_500_message = \"Bob is thinking\"\n",
        )
        .unwrap();
        let store = CharacterStore::new(&path);

        store.upsert(bob()).unwrap();

        let stored = store.get("Bob").unwrap().unwrap();
        assert_eq!(stored.model, "gpt-x");
        assert_eq!(stored.error_override.as_deref(), Some("Bob is thinking"));
    }

    #[test]
    fn remove_reports_whether_anything_was_deleted() {
        let dir = TempDir::new().expect("tempdir");
        let store = CharacterStore::new(dir.path().join("characters.toml"));
        store.upsert(bob()).unwrap();

        assert!(store.remove("Bob").unwrap());
        assert!(!store.remove("Bob").unwrap());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn list_is_sorted_by_name() {
        let dir = TempDir::new().expect("tempdir");
        let store = CharacterStore::new(dir.path().join("characters.toml"));
        for name in ["zed", "Alice", "mallory"] {
            store
                .upsert(Character {
                    name: name.to_string(),
                    ..bob()
                })
                .unwrap();
        }
        let names: Vec<_> = store.list().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Alice", "mallory", "zed"]);
    }

    #[test]
    fn unparsable_table_is_a_parse_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("characters.toml");
        fs::write(&path, "not = [valid").unwrap();
        let store = CharacterStore::new(&path);
        assert!(matches!(store.list(), Err(StorageError::Parse { .. })));
    }
}
