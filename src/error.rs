//! Failure taxonomy for an experiment run
//!
//! Every fatal condition ends up as one of these. Stages return
//! `anyhow::Result` and attach one of these as the root cause so the
//! orchestrator can classify a failure without string matching.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    /// Missing/unreadable experiment document or a missing/mistyped key
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A driven process exited non-zero, or emitted a metrics frame we could not read
    #[error("{stage} failed ({reason}); output kept in {}", log.display())]
    ExternalProcess {
        stage: String,
        /// Exit status; `None` when killed by a signal or when the process succeeded
        /// but its output could not be read
        code: Option<i32>,
        reason: String,
        log: PathBuf,
    },

    /// Version-control metadata could not be retrieved
    #[error("Provenance error: {0}")]
    Provenance(String),

    /// Groundtruth or result file cannot be scored
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Another run holds the build lock for this artifact
    #[error("Index artifact {artifact} is locked by another run ({holder})")]
    ArtifactLocked { artifact: String, holder: String },
}

impl HarnessError {
    pub fn process_exit(stage: impl Into<String>, code: Option<i32>, log: impl Into<PathBuf>) -> Self {
        let reason = match code {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        };
        Self::ExternalProcess {
            stage: stage.into(),
            code,
            reason,
            log: log.into(),
        }
    }

    /// The process exited 0 but emitted output we could not interpret
    pub fn unreadable_output(
        stage: impl Into<String>,
        reason: impl Into<String>,
        log: impl Into<PathBuf>,
    ) -> Self {
        Self::ExternalProcess {
            stage: stage.into(),
            code: None,
            reason: reason.into(),
            log: log.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_exit_keeps_code() {
        let err = HarnessError::process_exit("Index building", Some(137), "/run/building.output");
        match &err {
            HarnessError::ExternalProcess { code, reason, .. } => {
                assert_eq!(*code, Some(137));
                assert_eq!(reason, "exit status 137");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "Index building failed (exit status 137); output kept in /run/building.output"
        );
    }

    #[test]
    fn test_signal_has_no_code() {
        let err = HarnessError::process_exit("Native build", None, "/run/compiler.output");
        assert!(matches!(
            err,
            HarnessError::ExternalProcess { code: None, .. }
        ));
        assert!(err.to_string().contains("terminated by signal"));
    }
}
