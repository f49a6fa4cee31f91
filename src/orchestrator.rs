//! Experiment state machine
//!
//! ```text
//! INIT → PROVENANCE → BUILD → (INDEX | SKIP_INDEX) → QUERY_SWEEP → REPORT → DONE
//!   └──────────┴─────────┴──────────┴──────────────────────┴──→ FAILED
//! ```
//!
//! Linear, no back-edges. The first failure ends the run: the state it
//! happened in and the error are returned as a `FailedRun`. There is no retry
//! and no resume; a new invocation always gets a fresh run directory.

use anyhow::{Context, Result};
use chrono::Local;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ExperimentConfig;
use crate::error::HarnessError;
use crate::paths;
use crate::provenance::ProvenanceSource;
use crate::report::{self, ReportRow, ReportWriter};
use crate::stages::query::SweepEvent;
use crate::stages::{build, index, query, Engine};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Init,
    Provenance,
    Build,
    Index,
    SkipIndex,
    QuerySweep { variant: Option<String> },
    Report,
    Done,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Init => write!(f, "INIT"),
            RunState::Provenance => write!(f, "PROVENANCE"),
            RunState::Build => write!(f, "BUILD"),
            RunState::Index => write!(f, "INDEX"),
            RunState::SkipIndex => write!(f, "SKIP_INDEX"),
            RunState::QuerySweep { variant: Some(v) } => write!(f, "QUERY_SWEEP[{v}]"),
            RunState::QuerySweep { variant: None } => write!(f, "QUERY_SWEEP"),
            RunState::Report => write!(f, "REPORT"),
            RunState::Done => write!(f, "DONE"),
        }
    }
}

/// A run that reached DONE
#[derive(Debug)]
pub struct CompletedRun {
    pub run_dir: PathBuf,
    pub rows: Vec<ReportRow>,
    /// States visited, in order
    pub trace: Vec<RunState>,
}

/// A run that ended in FAILED
#[derive(Debug)]
pub struct FailedRun {
    /// State the failure happened in
    pub state: RunState,
    /// Run directory, if it had been created
    pub run_dir: Option<PathBuf>,
    pub error: anyhow::Error,
    pub trace: Vec<RunState>,
}

impl FailedRun {
    pub fn kind(&self) -> Option<&HarnessError> {
        self.error.downcast_ref::<HarnessError>()
    }
}

impl fmt::Display for FailedRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run failed in {}: {:#}", self.state, self.error)
    }
}

pub struct Orchestrator<'a> {
    config: &'a ExperimentConfig,
    engine: Engine,
    provenance: Box<dyn ProvenanceSource + 'a>,
    document: Option<PathBuf>,
    state: RunState,
    trace: Vec<RunState>,
    run_dir: Option<PathBuf>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a ExperimentConfig,
        engine: Engine,
        provenance: Box<dyn ProvenanceSource + 'a>,
    ) -> Self {
        Self {
            config,
            engine,
            provenance,
            document: None,
            state: RunState::Init,
            trace: vec![RunState::Init],
            run_dir: None,
        }
    }

    /// Copy this document into the run directory as `experiment.toml`
    pub fn with_document(mut self, path: impl Into<PathBuf>) -> Self {
        self.document = Some(path.into());
        self
    }

    /// Drive the run to DONE or FAILED
    pub fn run(mut self) -> std::result::Result<CompletedRun, FailedRun> {
        match self.drive() {
            Ok(rows) => {
                self.enter(RunState::Done);
                Ok(CompletedRun {
                    // drive() only succeeds after INIT created the directory
                    run_dir: self.run_dir.unwrap_or_default(),
                    rows,
                    trace: self.trace,
                })
            }
            Err(error) => {
                let message = format!("{error:#}");
                tracing::error!(state = %self.state, error = %message, "run failed");
                Err(FailedRun {
                    state: self.state,
                    run_dir: self.run_dir,
                    error,
                    trace: self.trace,
                })
            }
        }
    }

    fn enter(&mut self, state: RunState) {
        transition(&mut self.state, &mut self.trace, state);
    }

    fn drive(&mut self) -> Result<Vec<ReportRow>> {
        println!("🧪 Running experiment: {}", self.config.name);
        self.preflight()?;
        let run_dir = self.create_run_dir()?;
        println!("   Run directory: {}", run_dir.display());

        self.enter(RunState::Provenance);
        println!("🔖 Retrieving provenance...");
        let revision = self.provenance.capture()?;
        revision.write(&run_dir.join(paths::PROVENANCE_FILE))?;
        println!("   Current Branch: {}", revision.branch);
        println!("   Commit ID: {}", revision.commit);

        self.enter(RunState::Build);
        build::run(&self.engine, &run_dir)?;

        if self.config.settings.build {
            self.enter(RunState::Index);
            index::run(self.config, &self.engine, &run_dir)?;
        } else {
            self.enter(RunState::SkipIndex);
            println!(
                "♻️  Index is already built, reusing {}",
                crate::artifact::path(self.config).display()
            );
        }

        self.enter(RunState::QuerySweep { variant: None });
        let mut writer = ReportWriter::create(&run_dir.join(paths::REPORT_FILE))?;
        let state = &mut self.state;
        let trace = &mut self.trace;
        let rows = query::run(self.config, &self.engine, &run_dir, |event| match event {
            SweepEvent::Started(variant) => {
                let next = RunState::QuerySweep {
                    variant: Some(variant.name.clone()),
                };
                transition(state, trace, next);
                Ok(())
            }
            SweepEvent::Finished(row) => writer.append(row),
        })?;

        self.enter(RunState::Report);
        report::print_summary(&self.config.name, &rows);
        println!("📄 Report written to {}", writer.path().display());

        Ok(rows)
    }

    fn preflight(&self) -> Result<()> {
        let settings = &self.config.settings;
        if settings.numa && !self.config.query.is_empty() {
            which::which(&self.engine.numa_wrapper.program).map_err(|_| {
                HarnessError::Configuration(format!(
                    "settings.NUMA is set but `{}` was not found in PATH",
                    self.engine.numa_wrapper.program
                ))
            })?;
        }
        Ok(())
    }

    /// `<folder.experiment>/<name>_<timestamp>`, never reused
    fn create_run_dir(&mut self) -> Result<PathBuf> {
        let parent = &self.config.folder.experiment;
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create experiment folder {}", parent.display()))?;

        let run_dir = parent.join(paths::run_dir_name(&self.config.name, Local::now()));
        fs::create_dir(&run_dir)
            .with_context(|| format!("Failed to create run directory {}", run_dir.display()))?;
        self.run_dir = Some(run_dir.clone());

        if let Some(document) = &self.document {
            copy_document(document, &run_dir)?;
        }
        Ok(run_dir)
    }
}

fn transition(state: &mut RunState, trace: &mut Vec<RunState>, next: RunState) {
    tracing::info!(from = %state, to = %next, "state transition");
    trace.push(next.clone());
    *state = next;
}

fn copy_document(document: &Path, run_dir: &Path) -> Result<()> {
    let target = run_dir.join(paths::EXPERIMENT_COPY);
    fs::copy(document, &target).with_context(|| {
        format!(
            "Failed to copy {} to {}",
            document.display(),
            target.display()
        )
    })?;
    Ok(())
}
