//! Driver identity management.
//!
//! The driver ID assigned by the carrier is stored in `driver.json` and
//! stamped onto every record this machine creates.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Driver identity stored in `driver.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverIdentity {
    /// The driver ID assigned by the carrier.
    pub driver_id: String,
    /// Human-friendly label (e.g. the driver's name).
    pub label: String,
}

/// Returns the path to driver.json in the XDG data directory.
pub fn driver_json_path() -> Result<PathBuf> {
    let data_dir = crate::config::dirs_data_path().context("could not determine data directory")?;
    Ok(data_dir.join("driver.json"))
}

/// Loads driver identity from driver.json.
///
/// Returns `None` if the file doesn't exist.
/// Returns an error if the file exists but is unreadable/unparseable.
pub fn load_driver_identity() -> Result<Option<DriverIdentity>> {
    load_from(&driver_json_path()?)
}

/// Loads driver identity from a specific path.
fn load_from(path: &Path) -> Result<Option<DriverIdentity>> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let identity: DriverIdentity =
                serde_json::from_str(&content).context("failed to parse driver.json")?;
            Ok(Some(identity))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).context("failed to read driver.json"),
    }
}

/// Loads driver identity, failing with a helpful message if not found.
///
/// Use this in commands that require an identity (duty, amend, reject).
pub fn require_driver_identity() -> Result<DriverIdentity> {
    load_driver_identity()?.context("No driver identity found. Run 'eld init --driver <id>' first.")
}

/// Initializes driver identity.
///
/// If driver.json already exists, the stored record is updated with the
/// given ID and label; otherwise a new one is written.
pub fn init_driver(driver_id: &str, label: Option<&str>) -> Result<DriverIdentity> {
    init_driver_at(&driver_json_path()?, driver_id, label)
}

/// Initializes driver identity at a specific path.
///
/// `pub(crate)` so tests in other modules can use it.
pub(crate) fn init_driver_at(
    path: &Path,
    driver_id: &str,
    label: Option<&str>,
) -> Result<DriverIdentity> {
    let identity = if let Some(mut existing) = load_from(path)? {
        existing.driver_id = driver_id.to_string();
        if let Some(new_label) = label {
            existing.label = new_label.to_string();
        }
        save_to(path, &existing)?;
        existing
    } else {
        let identity = DriverIdentity {
            driver_id: driver_id.to_string(),
            label: label.unwrap_or(driver_id).to_string(),
        };
        save_to(path, &identity)?;
        identity
    };

    Ok(identity)
}

/// Writes driver identity to a specific path.
fn save_to(path: &Path, identity: &DriverIdentity) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("failed to create data directory")?;
    }
    let json = serde_json::to_string_pretty(identity).context("failed to serialize identity")?;
    std::fs::write(path, json).context("failed to write driver.json")?;
    Ok(())
}
