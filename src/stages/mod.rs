//! Pipeline stages that drive external processes
//!
//! - `build` - compile the native engine
//! - `index` - (re)build the index artifact
//! - `query` - sweep query variants, time them and score recall
//!
//! Every stage takes the experiment config and the engine by reference and
//! writes its logs into the run directory. A non-zero exit from a driven
//! process comes back as `HarnessError::ExternalProcess`.

pub mod build;
pub mod index;
pub mod query;

use std::path::{Path, PathBuf};

use crate::paths;
use crate::process::ExternalCommand;

/// The engine checkout and the commands used to build and drive it
#[derive(Debug, Clone)]
pub struct Engine {
    /// Working directory for every engine command
    pub root: PathBuf,
    pub build: ExternalCommand,
    pub index_builder: ExternalCommand,
    pub query_runner: ExternalCommand,
    /// Prefix applied to the query runner when `settings.NUMA` is set
    pub numa_wrapper: ExternalCommand,
}

impl Engine {
    /// Seismic's cargo build and release binaries under `root`
    pub fn seismic(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            build: ExternalCommand::new("cargo")
                .args(["build", "--release"])
                .env("RUSTFLAGS", "-C target-cpu=native"),
            index_builder: ExternalCommand::new(binary(&root, paths::INDEX_BUILDER_BIN)),
            query_runner: ExternalCommand::new(binary(&root, paths::QUERY_RUNNER_BIN)),
            numa_wrapper: ExternalCommand::new("numactl")
                .args(["--physcpubind=0-15", "--localalloc"]),
            root,
        }
    }
}

fn binary(root: &Path, relative: &str) -> String {
    root.join(relative).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seismic_binaries_resolve_under_root() {
        let engine = Engine::seismic("/src/seismic");
        assert_eq!(
            engine.index_builder.program,
            "/src/seismic/target/release/build_inverted_index"
        );
        assert_eq!(
            engine.query_runner.program,
            "/src/seismic/target/release/query_inverted_index"
        );
        assert_eq!(
            engine.build.to_string(),
            "RUSTFLAGS='-C target-cpu=native' cargo build --release"
        );
    }
}
