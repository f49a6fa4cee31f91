//! Native build of the engine binaries

use anyhow::{Context, Result};
use std::path::Path;

use super::Engine;
use crate::error::HarnessError;
use crate::paths;
use crate::process;

/// Run the engine's build command, capturing its output to `compiler.output`
pub fn run(engine: &Engine, run_dir: &Path) -> Result<()> {
    let log = run_dir.join(paths::COMPILER_LOG);

    println!("🔨 Compiling engine: {}", engine.build);
    let outcome = process::run(&engine.build, &engine.root, &log, None)
        .context("Native build could not run")?;

    if !outcome.success() {
        return Err(HarnessError::process_exit("Native build", outcome.code(), log).into());
    }

    println!("✅ Engine compiled successfully");
    Ok(())
}
