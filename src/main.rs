use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use seismic_bench::config;
use seismic_bench::orchestrator::Orchestrator;
use seismic_bench::provenance::GitProvenance;
use seismic_bench::stages::Engine;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Run a Seismic experiment on a dataset and query it", long_about = None)]
struct Cli {
    /// Path to the experiment configuration TOML file
    #[arg(long)]
    exp: PathBuf,

    /// Engine checkout to build, query and record provenance from
    #[arg(long, default_value = ".")]
    engine_dir: PathBuf,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let experiment = config::load(&cli.exp)?;
    let engine = Engine::seismic(&cli.engine_dir);
    let provenance = Box::new(GitProvenance::new(&cli.engine_dir));

    let outcome = Orchestrator::new(&experiment, engine, provenance)
        .with_document(&cli.exp)
        .run();

    match outcome {
        Ok(done) => {
            println!("✅ Experiment complete: {}", done.run_dir.display());
            Ok(())
        }
        Err(failed) => {
            eprintln!("❌ {failed}");
            if let Some(run_dir) = &failed.run_dir {
                eprintln!("   Partial results kept in {}", run_dir.display());
            }
            std::process::exit(1);
        }
    }
}
