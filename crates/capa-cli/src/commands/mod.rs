//! Subcommands of the `capa` binary.

pub mod batch;
pub mod config;
pub mod extract;
pub mod render;

use std::path::{Path, PathBuf};

use capa_core::CapaConfig;
use tracing::debug;

/// Configuration from `-c FILE`, or the defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<CapaConfig> {
    match config_path {
        Some(path) => {
            debug!("Loading configuration from {}", path);
            Ok(CapaConfig::from_file(Path::new(path))?)
        }
        None => Ok(CapaConfig::default()),
    }
}

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("capa")
        .join("config.json")
}

/// Lowercased file extension, empty when there is none.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}
