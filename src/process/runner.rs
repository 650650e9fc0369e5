//! External command execution with streamed output.
//!
//! # Output handling
//!
//! [`ProcessRunner::run`] hands the child a single OS pipe as both stdout and
//! stderr, so interleaved output arrives in exactly the order the child wrote
//! it. The pipe is drained one line at a time on the calling thread and each
//! line is echoed to the [`Reporter`]. Stdin is always closed.
//!
//! [`ProcessRunner::capture_output`] keeps stdout to itself and returns it as a
//! string; stderr is kept only for the error message.
//!
//! # Failure policy
//!
//! | Outcome | `FailurePolicy::Fatal` | `FailurePolicy::Tolerate` |
//! |---------|------------------------|---------------------------|
//! | spawn fails | `Err(ProcessError::Spawn)` | one warning, `Ok(Tolerated)` |
//! | non-zero exit | `Err(ProcessError::ExitStatus)` | one warning, `Ok(Tolerated)` |
//! | dry run | `Ok(DryRun)`, nothing spawned | `Ok(DryRun)`, nothing spawned |

use super::Invocation;
use crate::error::{ProcessError, Result};
use crate::report::Reporter;
use std::io::{self, BufRead, BufReader};
use std::process::{Command, Stdio};
use std::sync::Arc;

/// What to do when a command cannot be started or exits unsuccessfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Failure aborts the pipeline (returned as an error)
    Fatal,
    /// Failure is reported as a warning and execution continues
    Tolerate,
}

/// How a [`ProcessRunner::run`] call ended when it did not return an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The command ran and exited successfully
    Completed,
    /// Dry run: the command was only logged
    DryRun,
    /// The command failed but the policy allowed continuing
    Tolerated,
}

/// Runs external commands one at a time.
#[derive(Clone)]
pub struct ProcessRunner {
    dry_run: bool,
    reporter: Arc<dyn Reporter>,
}

impl std::fmt::Debug for ProcessRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessRunner")
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl ProcessRunner {
    /// Create a runner. With `dry_run` set, [`run`](Self::run) never spawns anything.
    pub fn new(dry_run: bool, reporter: Arc<dyn Reporter>) -> Self {
        Self { dry_run, reporter }
    }

    /// Whether commands are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Reporter that receives streamed output and warnings
    pub fn reporter(&self) -> &dyn Reporter {
        self.reporter.as_ref()
    }

    /// Run a command to completion, streaming its merged output.
    ///
    /// # Returns
    ///
    /// * `Ok(RunOutcome::Completed)` - process exited with status 0
    /// * `Ok(RunOutcome::DryRun)` - dry run, nothing was spawned
    /// * `Ok(RunOutcome::Tolerated)` - failed under [`FailurePolicy::Tolerate`]
    /// * `Err` - failed under [`FailurePolicy::Fatal`], or `argv` was empty
    pub fn run(&self, invocation: &Invocation, policy: FailurePolicy) -> Result<RunOutcome> {
        let program = invocation.program().ok_or(ProcessError::EmptyCommand)?;

        if self.dry_run {
            self.reporter
                .info(&format!("Would run command \"{invocation}\""));
            return Ok(RunOutcome::DryRun);
        }

        log::debug!("Running command \"{invocation}\"");
        match self.stream(invocation, program) {
            Ok(()) => Ok(RunOutcome::Completed),
            Err(err) => match policy {
                FailurePolicy::Fatal => Err(err.into()),
                FailurePolicy::Tolerate => {
                    self.reporter.warn(&err.to_string());
                    Ok(RunOutcome::Tolerated)
                }
            },
        }
    }

    /// Run a command and return its standard output.
    ///
    /// Any failure is an error; there is no tolerant mode because callers use
    /// the output to make further decisions. Captures are read-only queries
    /// and are executed even in dry-run mode.
    pub fn capture_output(&self, invocation: &Invocation) -> Result<String> {
        let program = invocation.program().ok_or(ProcessError::EmptyCommand)?;
        log::debug!("Capturing output of \"{invocation}\"");

        let output = build_command(invocation, program)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ProcessError::Spawn {
                command: invocation.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(ProcessError::ExitStatus {
                command: invocation.to_string(),
                status: output.status,
                stderr: Some(String::from_utf8_lossy(&output.stderr).into_owned()),
            }
            .into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn stream(&self, invocation: &Invocation, program: &str) -> std::result::Result<(), ProcessError> {
        let io_error = |operation: &'static str| {
            move |source: io::Error| ProcessError::Io {
                command: invocation.to_string(),
                operation,
                source,
            }
        };

        let (reader, writer) = io::pipe().map_err(io_error("creating output pipe"))?;
        let writer_for_stderr = writer
            .try_clone()
            .map_err(io_error("creating output pipe"))?;

        // The Command owns our copies of the write end; it must be dropped
        // right after spawning or the read loop never sees EOF.
        let mut child = {
            let mut command = build_command(invocation, program);
            command
                .stdin(Stdio::null())
                .stdout(writer)
                .stderr(writer_for_stderr);
            command.spawn().map_err(|source| ProcessError::Spawn {
                command: invocation.to_string(),
                source,
            })?
        };

        let read_result = self.echo_lines(reader);
        let status = child.wait().map_err(io_error("waiting for exit"))?;
        read_result.map_err(io_error("reading output"))?;

        if status.success() {
            Ok(())
        } else {
            Err(ProcessError::ExitStatus {
                command: invocation.to_string(),
                status,
                stderr: None,
            })
        }
    }

    fn echo_lines(&self, reader: io::PipeReader) -> io::Result<()> {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => return Ok(()),
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    self.reporter.line(line.trim_end_matches(['\n', '\r']));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

fn build_command(invocation: &Invocation, program: &str) -> Command {
    let mut command = Command::new(program);
    command
        .args(&invocation.argv()[1..])
        .envs(invocation.overlay());
    if let Some(dir) = invocation.working_dir() {
        command.current_dir(dir);
    }
    command
}
