use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.toml";
const CHARACTERS_FILE: &str = "characters.toml";
const CONTEXTS_DIR: &str = "contexts";

/// Locations of every durable record, rooted at one data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The platform configuration directory, e.g. `~/.config/relaybot` on Linux.
    pub fn platform_default() -> Option<Self> {
        ProjectDirs::from("org", "relaybot", "relaybot").map(|dirs| Self::new(dirs.config_dir()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn characters_file(&self) -> PathBuf {
        self.root.join(CHARACTERS_FILE)
    }

    pub fn contexts_dir(&self) -> PathBuf {
        self.root.join(CONTEXTS_DIR)
    }
}
