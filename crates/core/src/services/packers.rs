//! Adapters for the supported third-party packing tools.
//!
//! Every tool follows the same shape (run one executable against one file,
//! succeed on exit status zero), so a single [`ExternalPacker`] is
//! parameterized by [`PackerTool`], which fixes the argument contract.

use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::corpus::CorpusError;
use crate::services::process::{ProcessError, ToolCommand};

/// Supported packing tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackerTool {
    Upx,
    Mpress,
    Pecompact,
    Molebox,
    Petite,
}

impl PackerTool {
    pub const ALL: [PackerTool; 5] = [
        PackerTool::Upx,
        PackerTool::Mpress,
        PackerTool::Pecompact,
        PackerTool::Molebox,
        PackerTool::Petite,
    ];

    /// Lowercase name, also used as the output directory suffix.
    pub fn name(&self) -> &'static str {
        match self {
            PackerTool::Upx => "upx",
            PackerTool::Mpress => "mpress",
            PackerTool::Pecompact => "pecompact",
            PackerTool::Molebox => "molebox",
            PackerTool::Petite => "petite",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PackerTool::Upx => "UPX",
            PackerTool::Mpress => "MPRESS",
            PackerTool::Pecompact => "PECompact",
            PackerTool::Molebox => "MoleBox",
            PackerTool::Petite => "Petite",
        }
    }

    pub fn default_program(&self) -> &'static str {
        self.name()
    }

    /// Windows-only tools that need a launcher on other hosts.
    pub fn needs_launcher(&self) -> bool {
        !cfg!(windows) && !matches!(self, PackerTool::Upx)
    }

    /// Fixed arguments placed before the target path.
    pub fn leading_args(&self) -> &'static [&'static str] {
        match self {
            // Best compression, and overwrite even if UPX thinks it should not.
            PackerTool::Upx => &["-9", "--force"],
            PackerTool::Mpress | PackerTool::Pecompact | PackerTool::Molebox | PackerTool::Petite => {
                &[]
            }
        }
    }

    /// Full argument list for packing `target`.
    pub fn args_for(&self, target: &Path) -> Vec<OsString> {
        self.leading_args()
            .iter()
            .map(OsString::from)
            .chain(std::iter::once(target.as_os_str().to_os_string()))
            .collect()
    }
}

impl fmt::Display for PackerTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PackerTool {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lowered = value.to_ascii_lowercase();
        PackerTool::ALL.into_iter().find(|tool| tool.name() == lowered).ok_or_else(|| {
            let names: Vec<&str> = PackerTool::ALL.iter().map(PackerTool::name).collect();
            format!("Unsupported packer '{}'. Allowed: {}", value, names.join(", "))
        })
    }
}

#[derive(Debug, Error)]
pub enum PackError {
    #[error("Directory does not exist: {}", .0.display())]
    InvalidRoot(PathBuf),
    #[error("Cannot derive an output directory for {}", .0.display())]
    NoOutputRoot(PathBuf),
    #[error("{} is not installed or not found: {message}", .tool.display_name())]
    ToolMissing { tool: PackerTool, message: String },
    #[error("Failed to pack {}: {tool} exited with {status}{}", .path.display(), detail_suffix(.detail))]
    ToolFailed { tool: PackerTool, path: PathBuf, status: String, detail: Option<String> },
    #[error("Failed to pack {}: {tool} timed out after {}s", .path.display(), .after.as_secs_f64())]
    TimedOut { tool: PackerTool, path: PathBuf, after: Duration },
    #[error("Failed to run {tool} on {}: {source}", .path.display())]
    Process {
        tool: PackerTool,
        path: PathBuf,
        #[source]
        source: ProcessError,
    },
    #[error("Failed to stage {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Corpus(#[from] CorpusError),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_ref().map(|d| format!(" ({d})")).unwrap_or_default()
}

impl PackError {
    /// Errors after which no further file in the run can succeed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PackError::ToolMissing { .. } | PackError::NoOutputRoot(_))
    }
}

/// Packs a single, already-staged file in place.
pub trait Packer {
    fn pack(&self, target: &Path) -> Result<(), PackError>;
    fn tool(&self) -> PackerTool;

    /// Verify the tool can be launched before any file is touched.
    fn preflight(&self) -> Result<(), PackError> {
        Ok(())
    }
}

/// Packer backed by an external executable.
#[derive(Debug, Clone)]
pub struct ExternalPacker {
    tool: PackerTool,
    command: ToolCommand,
    timeout: Option<Duration>,
}

impl ExternalPacker {
    pub fn new(tool: PackerTool, command: ToolCommand) -> Self {
        Self { tool, command, timeout: None }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn command(&self) -> &ToolCommand {
        &self.command
    }
}

impl Packer for ExternalPacker {
    fn pack(&self, target: &Path) -> Result<(), PackError> {
        let tool = self.tool;
        let output = self.command.run(tool.args_for(target), self.timeout).map_err(|err| match err {
            ProcessError::NotFound { source, .. } => {
                PackError::ToolMissing { tool, message: source.to_string() }
            }
            ProcessError::TimedOut { after, .. } => {
                PackError::TimedOut { tool, path: target.to_path_buf(), after }
            }
            other => PackError::Process { tool, path: target.to_path_buf(), source: other },
        })?;

        if !output.status.success() {
            return Err(PackError::ToolFailed {
                tool,
                path: target.to_path_buf(),
                status: output.status.to_string(),
                detail: output.stderr_summary(),
            });
        }
        Ok(())
    }

    fn tool(&self) -> PackerTool {
        self.tool
    }

    fn preflight(&self) -> Result<(), PackError> {
        self.command
            .preflight()
            .map_err(|err| PackError::ToolMissing { tool: self.tool, message: err.to_string() })
    }
}
