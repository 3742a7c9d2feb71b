//! Packing pipeline: mirror every PE file of a corpus into a sibling
//! `<root>_<tool>` tree and run a packer on each copy in place.

use std::fs::{self, File, FileTimes};
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::corpus::{CorpusError, CorpusWalker};
use crate::model::PackJob;
use crate::pe::is_pe_file;
use crate::services::packers::{PackError, Packer, PackerTool};

/// What to do after a file fails to pack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the batch at the first failure.
    #[default]
    Abort,
    /// Record the failure and move on to the next file.
    Continue,
}

/// Terminal state of one discovered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Not a PE file (or unreadable); nothing was written.
    Skipped { source: PathBuf },
    Packed { source: PathBuf, output: PathBuf },
    Failed { source: PathBuf, output: PathBuf, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedFile {
    pub path: PathBuf,
    pub error: String,
}

/// Bookkeeping for a finished (or aborted) packing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackSummary {
    pub tool: PackerTool,
    pub source_root: PathBuf,
    pub output_root: PathBuf,
    pub policy: FailurePolicy,
    pub packed: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<FailedFile>,
    /// True when the abort policy stopped the batch early.
    pub aborted: bool,
    pub started_at: String,
    pub finished_at: String,
}

impl PackSummary {
    fn new(tool: PackerTool, source_root: &Path, output_root: &Path, policy: FailurePolicy) -> Self {
        Self {
            tool,
            source_root: source_root.to_path_buf(),
            output_root: output_root.to_path_buf(),
            policy,
            packed: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            aborted: false,
            started_at: Utc::now().to_rfc3339(),
            finished_at: String::new(),
        }
    }

    fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Skipped { source } => self.skipped.push(source.clone()),
            FileOutcome::Packed { output, .. } => self.packed.push(output.clone()),
            FileOutcome::Failed { output, error, .. } => {
                self.failed.push(FailedFile { path: output.clone(), error: error.clone() })
            }
        }
    }

    pub fn is_success(&self) -> bool {
        !self.aborted && self.failed.is_empty()
    }
}

/// `<parent>/<basename>_<tool>` for a corpus root.
pub fn output_root_for(source_root: &Path, tool: PackerTool) -> Result<PathBuf, PackError> {
    let base = source_root
        .file_name()
        .ok_or_else(|| PackError::NoOutputRoot(source_root.to_path_buf()))?;
    let mut dir_name = base.to_os_string();
    dir_name.push("_");
    dir_name.push(tool.name());
    Ok(source_root.with_file_name(dir_name))
}

/// Create the mirrored parent directories and copy the source into place.
pub fn stage(job: &PackJob) -> Result<PathBuf, PackError> {
    let source = job.source_path();
    let output = job.output_path();
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .map_err(|source| PackError::Io { path: parent.to_path_buf(), source })?;
    }
    copy_with_metadata(&source, &output)
        .map_err(|err| PackError::Io { path: output.clone(), source: err })?;
    Ok(output)
}

/// Copy content and permissions, then carry over access/modify times.
fn copy_with_metadata(from: &Path, to: &Path) -> io::Result<()> {
    fs::copy(from, to)?;
    let meta = fs::metadata(from)?;
    let times = FileTimes::new().set_accessed(meta.accessed()?).set_modified(meta.modified()?);
    // Read-only sources produce read-only copies; timestamps are best effort there.
    match File::options().write(true).open(to).and_then(|dest| dest.set_times(times)) {
        Ok(()) => {}
        Err(err) => tracing::debug!(path = %to.display(), error = %err, "could not copy timestamps"),
    }
    Ok(())
}

/// Drives one packer over a corpus.
pub struct PackingPipeline<'a> {
    pub packer: &'a dyn Packer,
    pub policy: FailurePolicy,
}

impl<'a> PackingPipeline<'a> {
    pub fn new(packer: &'a dyn Packer) -> Self {
        Self { packer, policy: FailurePolicy::default() }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Process one discovered file.
    ///
    /// Fatal errors (tool missing) come back as `Err`; everything else is a
    /// [`FileOutcome`].
    pub fn process_file(
        &self,
        source_root: &Path,
        output_root: &Path,
        path: &Path,
    ) -> Result<FileOutcome, PackError> {
        if !is_pe_file(path) {
            return Ok(FileOutcome::Skipped { source: path.to_path_buf() });
        }
        let Some(job) = PackJob::for_file(source_root, output_root, path) else {
            tracing::warn!(path = %path.display(), "file is outside the corpus root; skipping");
            return Ok(FileOutcome::Skipped { source: path.to_path_buf() });
        };

        let output = job.output_path();
        let packed = stage(&job).and_then(|staged| self.packer.pack(&staged));
        match packed {
            Ok(()) => Ok(FileOutcome::Packed { source: job.source_path(), output }),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => Ok(FileOutcome::Failed {
                source: job.source_path(),
                output,
                error: err.to_string(),
            }),
        }
    }

    /// Pack every PE file under `source_root`, calling `on_outcome` per file.
    ///
    /// Returns the summary even when the abort policy stopped the batch;
    /// check [`PackSummary::aborted`].
    pub fn run(
        &self,
        source_root: &Path,
        mut on_outcome: impl FnMut(&FileOutcome),
    ) -> Result<PackSummary, PackError> {
        if !source_root.is_dir() {
            return Err(PackError::InvalidRoot(source_root.to_path_buf()));
        }
        let tool = self.packer.tool();
        let output_root = output_root_for(source_root, tool)?;
        self.packer.preflight()?;

        fs::create_dir_all(&output_root)
            .map_err(|source| PackError::Io { path: output_root.clone(), source })?;
        tracing::info!(
            tool = tool.name(),
            source = %source_root.display(),
            output = %output_root.display(),
            "packing corpus"
        );

        let mut summary = PackSummary::new(tool, source_root, &output_root, self.policy);
        let walker = CorpusWalker::new(source_root)?;
        for entry in walker.files() {
            let outcome = match entry {
                Ok(path) => self.process_file(source_root, &output_root, &path)?,
                Err(CorpusError::Entry { path, message }) => {
                    tracing::warn!(path = %path.display(), %message, "corpus entry unreadable");
                    FileOutcome::Skipped { source: path }
                }
                Err(other) => return Err(other.into()),
            };
            on_outcome(&outcome);
            summary.record(&outcome);

            if matches!(outcome, FileOutcome::Failed { .. }) && self.policy == FailurePolicy::Abort
            {
                summary.aborted = true;
                break;
            }
        }

        summary.finished_at = Utc::now().to_rfc3339();
        Ok(summary)
    }
}
