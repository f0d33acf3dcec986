//! Per-driver mutual exclusion for timeline changes.
//!
//! A merge is computed against a snapshot of the timeline and applied
//! afterwards, so the whole read-compute-apply-queue sequence must run with
//! at most one writer per driver. An advisory file lock in the state
//! directory provides that scope across processes.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

/// Returns the lock file path for a driver.
fn lock_path(state_dir: &Path, driver_id: &str) -> PathBuf {
    state_dir.join(format!("{driver_id}.lock"))
}

/// Runs `f` while holding the driver's exclusive lock.
///
/// Blocks until the lock is available. The lock is released when the guard
/// file handle drops, even if `f` fails.
pub fn with_driver_lock<T>(driver_id: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let state_dir =
        crate::config::dirs_state_path().context("could not determine state directory")?;
    with_driver_lock_in(&state_dir, driver_id, f)
}

/// Like [`with_driver_lock`], with an explicit lock directory.
pub(crate) fn with_driver_lock_in<T>(
    state_dir: &Path,
    driver_id: &str,
    f: impl FnOnce() -> Result<T>,
) -> Result<T> {
    std::fs::create_dir_all(state_dir)
        .with_context(|| format!("failed to create {}", state_dir.display()))?;
    let path = lock_path(state_dir, driver_id);
    let file =
        File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
    file.lock_exclusive()
        .with_context(|| format!("failed to lock {}", path.display()))?;

    let result = f();

    if let Err(err) = fs2::FileExt::unlock(&file) {
        tracing::warn!(path = %path.display(), %err, "failed to unlock driver lock");
    }
    result
}
