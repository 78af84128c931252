use crate::core::config::data::{ConfigFile, RuntimeConfig};
use crate::core::config::io::ConfigError;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// Process-wide, atomically replaceable runtime configuration.
///
/// Readers take a [`snapshot`](Self::snapshot) once and work from that value;
/// a reload swaps the whole `Arc`, so nobody observes a mix of old and new
/// fields.
#[derive(Clone)]
pub struct ConfigHandle {
    path: PathBuf,
    current: Arc<RwLock<Arc<RuntimeConfig>>>,
    version: Arc<AtomicU64>,
}

impl ConfigHandle {
    pub fn new(path: impl Into<PathBuf>, initial: RuntimeConfig) -> Self {
        Self {
            path: path.into(),
            current: Arc::new(RwLock::new(Arc::new(initial))),
            version: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> Arc<RuntimeConfig> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub fn replace(&self, config: RuntimeConfig) -> u64 {
        let fresh = Arc::new(config);
        {
            let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
            *guard = fresh;
        }
        self.version.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Rereads the config file and swaps it in. On any failure the previous
    /// configuration stays active.
    pub fn reload(&self) -> Result<u64, ConfigError> {
        match ConfigFile::load_runtime(&self.path) {
            Ok((_token, runtime)) => {
                let version = self.replace(runtime);
                info!(version, "configuration reloaded");
                Ok(version)
            }
            Err(err) => {
                warn!(error = %err, "configuration reload failed; keeping previous settings");
                Err(err)
            }
        }
    }
}
