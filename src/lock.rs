//! File-based locking for the recovery run.
//!
//! Recovery assumes exclusive ownership of both the live and the staging
//! paths (the node process must be stopped). An advisory exclusive lock on
//! <base>/LOCK turns that assumption into an enforced invariant instead of
//! caller discipline.
//!
//! Cross-platform (fs2). Lock is released on Drop.

use anyhow::Context;
use fs2::FileExt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::consts::LOCK_FILE;
use crate::errors::RecoverError;

pub struct LockGuard {
    file: std::fs::File,
    path: PathBuf,
}

impl LockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        // fs2 unlock errors on drop are ignored deliberately.
        let _ = self.file.unlock();
    }
}

/// Take the exclusive recovery lock under base. Fails immediately (no
/// blocking wait) if another recovery holds it.
pub fn acquire_exclusive_lock(base: &Path) -> Result<LockGuard, RecoverError> {
    let path = base.join(LOCK_FILE);
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(&path)
        .map_err(RecoverError::Io)?;
    file.try_lock_exclusive()
        .with_context(|| format!("lock {} (is another recovery running?)", path.display()))
        .map_err(|e| RecoverError::Staging(format!("{:#}", e)))?;
    Ok(LockGuard { file, path })
}
