//! Single source of truth for the experiment filesystem layout.
//!
//! This module defines WHERE things live. It has no I/O and no business logic.
//!
//! # Run directory (`<folder.experiment>/<name>_<timestamp>/`)
//!
//! ```text
//! <name>_2024-05-01_12:34:56.123456/
//! ├── experiment.toml          # Copy of the document the run was started with
//! ├── git.output               # Branch + commit of the engine checkout
//! ├── compiler.output          # Native build log
//! ├── building.output          # Index builder log (only when settings.build)
//! ├── log_<variant>            # Query runner log, one per variant
//! ├── results_<variant>        # Query runner result rows, one per variant
//! └── report.tsv               # <variant> \t <latency µs> \t <recall>
//! ```
//!
//! # Engine checkout (`--engine-dir`)
//!
//! ```text
//! <engine>/target/release/
//! ├── build_inverted_index
//! └── query_inverted_index
//! ```

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

pub const EXPERIMENT_COPY: &str = "experiment.toml";
pub const PROVENANCE_FILE: &str = "git.output";
pub const COMPILER_LOG: &str = "compiler.output";
pub const BUILDING_LOG: &str = "building.output";
pub const REPORT_FILE: &str = "report.tsv";

/// Suffix the index builder appends to `--output-file`
pub const INDEX_FILE_EXTENSION: &str = "index.seismic";

pub const INDEX_BUILDER_BIN: &str = "target/release/build_inverted_index";
pub const QUERY_RUNNER_BIN: &str = "target/release/query_inverted_index";

/// Run directory leaf name: `<name>_<YYYY-MM-DD_HH:MM:SS.ffffff>`
pub fn run_dir_name(experiment_name: &str, started: DateTime<Local>) -> String {
    format!(
        "{}_{}",
        experiment_name,
        started.format("%Y-%m-%d_%H:%M:%S%.6f")
    )
}

pub fn query_log(run_dir: &Path, variant: &str) -> PathBuf {
    run_dir.join(format!("log_{variant}"))
}

pub fn query_results(run_dir: &Path, variant: &str) -> PathBuf {
    run_dir.join(format!("results_{variant}"))
}

/// Path passed to the query runner's `--index-file`
pub fn index_file(artifact_path: &Path) -> PathBuf {
    let mut name = artifact_path.as_os_str().to_owned();
    name.push(".");
    name.push(INDEX_FILE_EXTENSION);
    PathBuf::from(name)
}

/// Advisory build lock sitting next to the artifact
pub fn artifact_lock(artifact_path: &Path) -> PathBuf {
    let mut name = artifact_path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_run_dir_name_includes_microseconds() {
        let started = Local
            .with_ymd_and_hms(2024, 5, 1, 12, 34, 56)
            .unwrap()
            .with_nanosecond(123_456_000)
            .unwrap();
        assert_eq!(
            run_dir_name("splade", started),
            "splade_2024-05-01_12:34:56.123456"
        );
    }

    #[test]
    fn test_index_file_appends_extension() {
        let artifact = Path::new("/idx/msmarco_n-postings_4000");
        assert_eq!(
            index_file(artifact),
            PathBuf::from("/idx/msmarco_n-postings_4000.index.seismic")
        );
        assert_eq!(
            artifact_lock(artifact),
            PathBuf::from("/idx/msmarco_n-postings_4000.lock")
        );
    }

    #[test]
    fn test_variant_files() {
        let run = Path::new("/runs/a");
        assert_eq!(query_log(run, "fast"), PathBuf::from("/runs/a/log_fast"));
        assert_eq!(
            query_results(run, "fast"),
            PathBuf::from("/runs/a/results_fast")
        );
    }
}
