//! Advisory build lock keyed by artifact name
//!
//! Only the index stage takes it. Queries read artifacts without locking.

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::HarnessError;
use crate::paths;

/// Held while an artifact is being written; the lock file is removed on drop
#[derive(Debug)]
pub struct ArtifactLock {
    path: PathBuf,
}

impl ArtifactLock {
    /// Create `<artifact>.lock` exclusively, recording who holds it
    pub fn acquire(artifact_path: &Path, holder: &str) -> Result<Self> {
        if let Some(parent) = artifact_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create index folder {}", parent.display()))?;
        }

        let path = paths::artifact_lock(artifact_path);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                writeln!(file, "pid={} {}", std::process::id(), holder)
                    .with_context(|| format!("Failed to write lock {}", path.display()))?;
                Ok(Self { path })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let holder = fs::read_to_string(&path)
                    .map(|s| s.trim().to_string())
                    .unwrap_or_else(|_| "unknown holder".to_string());
                Err(HarnessError::ArtifactLocked {
                    artifact: artifact_path.display().to_string(),
                    holder,
                }
                .into())
            }
            Err(e) => {
                Err(e).with_context(|| format!("Failed to create lock {}", path.display()))
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ArtifactLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
