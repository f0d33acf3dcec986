//! Helpers shared by subcommands.

use anyhow::{Context, Result};

use eld_db::Database;

use crate::Config;

/// Opens the configured database, ensuring the parent directory exists.
pub(crate) fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}
