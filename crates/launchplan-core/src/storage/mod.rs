mod config;
pub mod migrations;
mod placement_db;

pub use config::{Config, CycleConfig};
pub use placement_db::PlacementDb;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/launchplan[-dev]/` based on LAUNCHPLAN_ENV.
///
/// Set LAUNCHPLAN_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("LAUNCHPLAN_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("launchplan-dev")
    } else {
        base_dir.join("launchplan")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
