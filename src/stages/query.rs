//! Query sweep: run each variant, read its timing frame, score its recall
//!
//! Variants run strictly one after another in document order. The index
//! artifact and the pinned cores belong to one query process at a time.

use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use super::Engine;
use crate::artifact;
use crate::config::{ExperimentConfig, QueryVariant};
use crate::error::HarnessError;
use crate::evaluate::{self, Ranking};
use crate::paths;
use crate::process::{self, ExternalCommand, LineClassifier};
use crate::report::ReportRow;

/// Progress notifications for whoever drives the sweep
#[derive(Debug)]
pub enum SweepEvent<'a> {
    Started(&'a QueryVariant),
    Finished(&'a ReportRow),
}

/// Query runner invocation for one variant
pub fn command(
    config: &ExperimentConfig,
    engine: &Engine,
    variant: &QueryVariant,
    run_dir: &Path,
) -> ExternalCommand {
    let index_file = paths::index_file(&artifact::path(config));
    let cmd = engine
        .query_runner
        .clone()
        .flag("--index-file", index_file.display())
        .flag("-k", config.settings.k)
        .flag("--query-file", config.queries_path().display())
        .flag("--query-cut", variant.query_cut)
        .flag("--heap-factor", variant.heap_factor)
        .flag("--n-runs", config.settings.n_runs)
        .flag(
            "--output-path",
            paths::query_results(run_dir, &variant.name).display(),
        );

    if config.settings.numa {
        cmd.wrapped_by(&engine.numa_wrapper)
    } else {
        cmd
    }
}

/// Run every variant in order, returning one row per variant.
///
/// The first failing variant stops the sweep; no row is produced for it or
/// for any variant after it.
pub fn run(
    config: &ExperimentConfig,
    engine: &Engine,
    run_dir: &Path,
    mut observe: impl FnMut(SweepEvent<'_>) -> Result<()>,
) -> Result<Vec<ReportRow>> {
    let mut rows = Vec::with_capacity(config.query.len());
    if config.query.is_empty() {
        return Ok(rows);
    }

    let groundtruth_path = config.groundtruth_path();
    let groundtruth = Ranking::load(&groundtruth_path)?;
    tracing::info!(
        path = %groundtruth_path.display(),
        rows = groundtruth.rows(),
        queries = groundtruth.queries(),
        "groundtruth loaded"
    );

    for variant in &config.query {
        observe(SweepEvent::Started(variant))?;
        let row = run_variant(config, engine, run_dir, variant, &groundtruth)
            .with_context(|| format!("Query variant '{}'", variant.name))?;
        observe(SweepEvent::Finished(&row))?;
        rows.push(row);
    }
    Ok(rows)
}

fn run_variant(
    config: &ExperimentConfig,
    engine: &Engine,
    run_dir: &Path,
    variant: &QueryVariant,
    groundtruth: &Ranking,
) -> Result<ReportRow> {
    let cmd = command(config, engine, variant, run_dir);
    let log = paths::query_log(run_dir, &variant.name);
    let results = paths::query_results(run_dir, &variant.name);
    let stage = format!("Query variant '{}'", variant.name);

    println!("🔎 Executing query for variant '{}' with command:", variant.name);
    println!("{cmd}");

    let mut timing = TimingFrame::default();
    let outcome = process::run(&cmd, &engine.root, &log, Some(&mut timing))
        .context("Query runner could not run")?;

    if !outcome.success() {
        return Err(HarnessError::process_exit(stage, outcome.code(), log).into());
    }
    if let Some(e) = outcome.classifier_error {
        return Err(HarnessError::unreadable_output(
            stage,
            format!("malformed metrics frame: {e:#}"),
            log,
        )
        .into());
    }

    let latency_us = match timing.latency_us() {
        Some(latency) => latency,
        None => {
            tracing::warn!(
                variant = %variant.name,
                log = %log.display(),
                "no timing line in query output, reporting latency 0"
            );
            0
        }
    };

    let result = Ranking::load(&results)?;
    let recall = evaluate::recall(&result, groundtruth)
        .with_context(|| format!("Scoring {}", results.display()))?;

    println!(
        "✅ Variant '{}': {} µs/query, recall {:.4}",
        variant.name, latency_us, recall
    );

    Ok(ReportRow {
        variant: variant.name.clone(),
        latency_us,
        recall,
    })
}

/// Picks `Time <n> ... microsecs per query` out of query runner output.
/// The last frame seen wins.
#[derive(Debug, Default)]
pub struct TimingFrame {
    latency_us: Option<u64>,
}

impl TimingFrame {
    pub fn latency_us(&self) -> Option<u64> {
        self.latency_us
    }
}

fn timing_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^Time .*microsecs per query\s*$").expect("Invalid timing frame regex")
    })
}

impl LineClassifier for TimingFrame {
    fn classify(&mut self, line: &str) -> Result<()> {
        if !timing_regex().is_match(line) {
            return Ok(());
        }
        let token = line.split_whitespace().nth(1).unwrap_or_default();
        let value = token
            .parse::<u64>()
            .with_context(|| format!("expected an integer after 'Time' in {line:?}"))?;
        self.latency_us = Some(value);
        Ok(())
    }
}
