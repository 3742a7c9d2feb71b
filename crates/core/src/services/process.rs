//! Subprocess execution for external tools: optional launcher prefix,
//! captured output, and an optional wall-clock timeout.

use std::ffi::OsStr;
use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{resolve_executable, ResolveError};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("{program} is not installed or not found: {source}")]
    NotFound {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} timed out after {}s", .after.as_secs_f64())]
    TimedOut { program: String, after: Duration },
}

/// How to launch an external tool: the program itself, optionally behind a
/// launcher such as `wine` that receives the program as its first argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    pub program: PathBuf,
    pub launcher: Option<PathBuf>,
}

impl ToolCommand {
    pub fn native(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), launcher: None }
    }

    pub fn launched(launcher: impl Into<PathBuf>, program: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), launcher: Some(launcher.into()) }
    }

    /// Check that the executables this command needs can be found.
    ///
    /// With a launcher, only the launcher must be on `PATH`; the program is
    /// handed to the launcher verbatim and checked only when it is a path.
    pub fn preflight(&self) -> Result<(), ResolveError> {
        match &self.launcher {
            Some(launcher) => {
                resolve_executable(launcher)?;
                if is_path_like(&self.program) && !self.program.is_file() {
                    return Err(ResolveError::MissingFile(self.program.clone()));
                }
                Ok(())
            }
            None => resolve_executable(&self.program).map(|_| ()),
        }
    }

    /// Run with `args` appended, capturing stdout and stderr.
    pub fn run<I, S>(&self, args: I, timeout: Option<Duration>) -> Result<CapturedOutput, ProcessError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = match &self.launcher {
            Some(launcher) => {
                let mut command = Command::new(launcher);
                command.arg(&self.program);
                command
            }
            None => Command::new(&self.program),
        };
        command.args(args);
        run_captured(command, &self.to_string(), timeout)
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.launcher {
            Some(launcher) => write!(f, "{} {}", launcher.display(), self.program.display()),
            None => write!(f, "{}", self.program.display()),
        }
    }
}

fn is_path_like(program: &Path) -> bool {
    program.is_absolute() || program.components().count() > 1
}

/// Exit status plus everything the child wrote.
#[derive(Debug)]
pub struct CapturedOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CapturedOutput {
    /// First non-empty stderr line, for short failure messages.
    pub fn stderr_summary(&self) -> Option<String> {
        String::from_utf8_lossy(&self.stderr)
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
    }
}

/// Spawn `command`, drain its pipes on background threads, and wait for it.
///
/// When `timeout` elapses the child is killed and [`ProcessError::TimedOut`]
/// is returned; the pipe readers are detached rather than joined since a
/// grandchild may still hold the pipes open.
pub fn run_captured(
    mut command: Command,
    program: &str,
    timeout: Option<Duration>,
) -> Result<CapturedOutput, ProcessError> {
    tracing::debug!(command = ?command, "spawning external tool");
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ProcessError::NotFound { program: program.to_string(), source }
            } else {
                ProcessError::Spawn { program: program.to_string(), source }
            }
        })?;

    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let status = match timeout {
        None => child.wait(),
        Some(limit) => match wait_with_deadline(&mut child, limit) {
            Ok(Some(status)) => Ok(status),
            Ok(None) => {
                tracing::warn!(program, timeout_secs = limit.as_secs_f64(), "killed external tool");
                return Err(ProcessError::TimedOut { program: program.to_string(), after: limit });
            }
            Err(err) => Err(err),
        },
    }
    .map_err(|source| ProcessError::Wait { program: program.to_string(), source })?;

    Ok(CapturedOutput { status, stdout: join(stdout), stderr: join(stderr) })
}

fn wait_with_deadline(child: &mut Child, limit: Duration) -> io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn join(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}
