//! Internal implementation for process module

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader, LineWriter, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use super::{ExternalCommand, LineClassifier, ProcessOutcome};

pub fn run(
    command: &ExternalCommand,
    cwd: &Path,
    capture: &Path,
    classifier: Option<&mut dyn LineClassifier>,
) -> Result<ProcessOutcome> {
    let capture_file = File::create(capture)
        .with_context(|| format!("Failed to create capture file {}", capture.display()))?;
    let mut capture_out = LineWriter::new(capture_file);

    let (reader, writer) = io::pipe().context("Failed to create output pipe")?;

    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .envs(command.envs.iter().map(|(k, v)| (k, v)))
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(writer.try_clone().context("Failed to share output pipe")?)
        .stderr(writer);

    tracing::debug!(command = %command, cwd = %cwd.display(), "spawning");
    let mut child = cmd
        .spawn()
        .with_context(|| format!("Failed to launch `{command}`"))?;
    // Command keeps its copies of the write end alive; EOF only arrives once they are gone
    drop(cmd);

    let streamed = stream(BufReader::new(reader), &mut capture_out, capture, classifier);
    let (lines, classifier_error) = match streamed {
        Ok(streamed) => streamed,
        Err(e) => {
            // Nobody reads the pipe any more; stop the child and reap it
            let _ = child.kill();
            let _ = child.wait();
            return Err(e);
        }
    };

    let status = child
        .wait()
        .with_context(|| format!("Failed to wait for `{command}`"))?;
    tracing::debug!(command = %command, %status, lines, "process finished");

    Ok(ProcessOutcome {
        status,
        lines,
        classifier_error,
    })
}

/// Forward every line to the console, the capture file and the classifier.
/// Returns the line count and the first classifier error, if any.
fn stream(
    mut reader: impl BufRead,
    capture_out: &mut impl Write,
    capture: &Path,
    mut classifier: Option<&mut dyn LineClassifier>,
) -> Result<(usize, Option<anyhow::Error>)> {
    let mut buf = Vec::new();
    let mut lines = 0usize;
    let mut classifier_error = None;

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .context("Failed to read process output")?;
        if n == 0 {
            break;
        }
        lines += 1;

        {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(&buf)
                .and_then(|()| stdout.flush())
                .context("Failed to echo process output")?;
        }
        capture_out
            .write_all(&buf)
            .with_context(|| format!("Failed to write {}", capture.display()))?;

        if let Some(classifier) = classifier.as_deref_mut() {
            if classifier_error.is_none() {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']);
                if let Err(e) = classifier.classify(line) {
                    classifier_error = Some(e);
                }
            }
        }
    }
    capture_out
        .flush()
        .with_context(|| format!("Failed to write {}", capture.display()))?;

    Ok((lines, classifier_error))
}
