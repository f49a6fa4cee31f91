//! Index artifact construction
//!
//! Only runs when `settings.build` is set; otherwise the orchestrator reuses
//! whatever artifact already carries this experiment's artifact name.
//! A failed build leaves the artifact untrusted and stops the run.

use anyhow::{Context, Result};
use std::path::Path;

use super::Engine;
use crate::artifact::{self, ArtifactLock};
use crate::config::ExperimentConfig;
use crate::error::HarnessError;
use crate::paths;
use crate::process::{self, ExternalCommand};

/// Index builder invocation with every indexing parameter as a flag
pub fn command(config: &ExperimentConfig, engine: &Engine) -> ExternalCommand {
    let params = &config.indexing_parameters;
    let cmd = engine
        .index_builder
        .clone()
        .flag("--input-file", config.dataset_path().display())
        .flag("--output-file", artifact::path(config).display())
        .flag("--n-postings", params.n_postings)
        .flag("--summary-energy", params.summary_energy)
        .flag("--centroid-fraction", params.centroid_fraction)
        .flag("--knn", params.knn)
        .flag("--kmeans-pruning-factor", params.kmeans_pruning_factor)
        .flag("--kmeans-doc-cut", params.kmeans_doc_cut);

    if params.kmeans_approx {
        cmd.arg("--kmeans-approx")
    } else {
        cmd
    }
}

/// Build the index artifact, capturing output to `building.output`
pub fn run(config: &ExperimentConfig, engine: &Engine, run_dir: &Path) -> Result<()> {
    let artifact_path = artifact::path(config);
    println!("📂 Dataset: {}", config.dataset_path().display());
    println!("📦 Index artifact: {}", artifact_path.display());

    let _lock = ArtifactLock::acquire(&artifact_path, &format!("run={}", run_dir.display()))?;

    let cmd = command(config, engine);
    let log = run_dir.join(paths::BUILDING_LOG);
    println!("🏗️  Building index with command:");
    println!("{cmd}");

    let outcome = process::run(&cmd, &engine.root, &log, None)
        .context("Index builder could not run")?;

    if !outcome.success() {
        return Err(HarnessError::process_exit("Index building", outcome.code(), log).into());
    }

    println!("✅ Index built successfully");
    Ok(())
}
