//! Streaming runner for external processes
//!
//! Public interface:
//! - `ExternalCommand` - program, arguments and environment of one invocation
//! - `LineClassifier` - hook that pulls structured facts out of output lines
//! - `run()` - launch, mirror output to console + capture file, report exit status
//!
//! stdout and stderr share a single pipe, so lines arrive in the order the
//! process wrote them. Each line is forwarded as soon as it is read; the
//! runner never holds the whole output in memory.

mod internal;

use anyhow::Result;
use std::fmt;
use std::path::Path;
use std::process::ExitStatus;

/// One invocation of an external program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// `--name value` as two arguments
    pub fn flag(self, name: &str, value: impl fmt::Display) -> Self {
        self.arg(name).arg(value.to_string())
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Run this command through `wrapper` (e.g. `numactl ... <self>`)
    pub fn wrapped_by(self, wrapper: &ExternalCommand) -> Self {
        let mut args = wrapper.args.clone();
        args.push(self.program);
        args.extend(self.args);
        let mut envs = wrapper.envs.clone();
        envs.extend(self.envs);
        Self {
            program: wrapper.program.clone(),
            args,
            envs,
        }
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.envs {
            write!(f, "{}={} ", key, quote(value))?;
        }
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn quote(s: &str) -> String {
    if !s.is_empty() && !s.contains(|c: char| c.is_whitespace() || c == '\'' || c == '"') {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

/// Observes every output line without altering the stream
pub trait LineClassifier {
    /// An error here is kept and reported after the process ends; streaming continues
    fn classify(&mut self, line: &str) -> Result<()>;
}

impl<F> LineClassifier for F
where
    F: FnMut(&str) -> Result<()>,
{
    fn classify(&mut self, line: &str) -> Result<()> {
        self(line)
    }
}

/// What a finished process left behind
#[derive(Debug)]
pub struct ProcessOutcome {
    pub status: ExitStatus,
    /// Number of lines forwarded to console and capture file
    pub lines: usize,
    /// First error raised by the classifier, if any
    pub classifier_error: Option<anyhow::Error>,
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code; `None` when terminated by a signal
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }
}

/// Run `command` in `cwd`, echoing each line to stdout, appending it verbatim
/// to `capture`, and passing it to `classifier`.
///
/// Blocks until the output stream is exhausted and the process has exited.
/// A non-zero exit is returned to the caller, not treated as an error here;
/// `Err` means the process could not be launched or output could not be written.
pub fn run(
    command: &ExternalCommand,
    cwd: &Path,
    capture: &Path,
    classifier: Option<&mut dyn LineClassifier>,
) -> Result<ProcessOutcome> {
    internal::run(command, cwd, capture, classifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_quotes_only_when_needed() {
        let cmd = ExternalCommand::new("cargo")
            .args(["build", "--release"])
            .env("RUSTFLAGS", "-C target-cpu=native");
        assert_eq!(
            cmd.to_string(),
            "RUSTFLAGS='-C target-cpu=native' cargo build --release"
        );
    }

    #[test]
    fn test_flag_pushes_name_and_value() {
        let cmd = ExternalCommand::new("q").flag("-k", 10).flag("--heap-factor", 0.7);
        assert_eq!(cmd.args, vec!["-k", "10", "--heap-factor", "0.7"]);
    }

    #[test]
    fn test_wrapped_by_prefixes_program() {
        let wrapper = ExternalCommand::new("numactl").args(["--physcpubind=0-15", "--localalloc"]);
        let cmd = ExternalCommand::new("./query").flag("-k", 10).wrapped_by(&wrapper);
        assert_eq!(cmd.program, "numactl");
        assert_eq!(
            cmd.args,
            vec!["--physcpubind=0-15", "--localalloc", "./query", "-k", "10"]
        );
    }
}
