//! Runtime configuration: the on-disk `config.toml` record, the validated
//! [`RuntimeConfig`] derived from it, and the swappable [`ConfigHandle`]
//! that the reload command replaces.

pub mod data;
pub mod defaults;
pub mod handle;
pub mod io;
pub mod paths;

pub use data::{ConfigFile, RuntimeConfig};
pub use handle::ConfigHandle;
pub use io::ConfigError;
pub use paths::DataPaths;
