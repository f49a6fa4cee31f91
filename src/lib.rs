pub mod artifact;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod orchestrator;
pub mod paths;
pub mod process;
pub mod provenance;
pub mod render;
pub mod report;
pub mod stages;

// Re-export commonly used types
pub use config::ExperimentConfig;
pub use error::HarnessError;
pub use orchestrator::{CompletedRun, FailedRun, Orchestrator, RunState};
pub use report::ReportRow;
