//! Experiment document - the single configuration value of a run
//!
//! Public interface:
//! - `load()` / `parse()` - read and validate an experiment TOML document
//! - `ExperimentConfig` and its sections
//!
//! The document is parsed once and then threaded by reference through every
//! stage; nothing reads configuration from global state.

mod internal;

pub use internal::{
    ExperimentConfig, FilenameSection, FolderSection, IndexingParameters, Number, QueryVariant,
    Settings,
};

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Load an experiment document from disk
///
/// Unreadable files, TOML errors and missing keys all surface as
/// `HarnessError::Configuration` naming the file.
pub fn load(path: &Path) -> Result<ExperimentConfig> {
    internal::load(path)
}

/// Parse an experiment document from a string
pub fn parse(text: &str) -> Result<ExperimentConfig> {
    internal::parse(text)
}

impl ExperimentConfig {
    pub fn dataset_path(&self) -> PathBuf {
        self.folder.data.join(&self.filename.dataset)
    }

    pub fn queries_path(&self) -> PathBuf {
        self.folder.data.join(&self.filename.queries)
    }

    pub fn groundtruth_path(&self) -> PathBuf {
        self.folder.data.join(&self.filename.groundtruth)
    }
}
