//! Version-control provenance of the engine checkout
//!
//! Recorded into `git.output` before anything is built, so every run
//! directory says which code produced its numbers.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::HarnessError;

/// Branch and commit of the checkout being benchmarked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub branch: String,
    pub commit: String,
}

impl Revision {
    /// Contents of `git.output`
    pub fn render(&self) -> String {
        format!("Current Branch: {}\nCommit ID: {}\n", self.branch, self.commit)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render())
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

/// Where provenance comes from
pub trait ProvenanceSource {
    fn capture(&self) -> Result<Revision>;
}

/// Reads branch and commit with `git rev-parse` inside `repo`
pub struct GitProvenance {
    pub repo: PathBuf,
}

impl GitProvenance {
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self { repo: repo.into() }
    }

    fn rev_parse(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .arg("rev-parse")
            .args(args)
            .current_dir(&self.repo)
            .output()
            .map_err(|e| HarnessError::Provenance(format!("failed to run git: {e}")))?;

        if !output.status.success() {
            return Err(HarnessError::Provenance(format!(
                "git rev-parse {} failed in {}: {}",
                args.join(" "),
                self.repo.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            ))
            .into());
        }

        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if value.is_empty() {
            return Err(HarnessError::Provenance(format!(
                "git rev-parse {} returned nothing",
                args.join(" ")
            ))
            .into());
        }
        Ok(value)
    }
}

impl ProvenanceSource for GitProvenance {
    fn capture(&self) -> Result<Revision> {
        Ok(Revision {
            branch: self.rev_parse(&["--abbrev-ref", "HEAD"])?,
            commit: self.rev_parse(&["HEAD"])?,
        })
    }
}

/// Fixed revision, for runs outside a checkout and for tests
pub struct StaticProvenance(pub Revision);

impl ProvenanceSource for StaticProvenance {
    fn capture(&self) -> Result<Revision> {
        Ok(self.0.clone())
    }
}
