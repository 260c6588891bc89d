//! Storage layer: SQLite practice database and TOML configuration.
//!
//! The engine modules (`srs`, `readiness`, `planner`, `stats`) are pure;
//! this layer owns all I/O. It loads spot/piece/project snapshots, hands
//! them to the engine, and writes the engine's outputs back.

mod config;
pub mod database;
pub mod migrations;

pub use config::Config;
pub use database::PracticeDb;

use std::path::PathBuf;

use crate::error::{CoreError, Result};

/// Returns `~/.config/woodshed[-dev]/` based on WOODSHED_ENV.
///
/// Set WOODSHED_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("WOODSHED_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("woodshed-dev")
    } else {
        base_dir.join("woodshed")
    };

    std::fs::create_dir_all(&dir).map_err(CoreError::Io)?;
    Ok(dir)
}
