//! Core data model for analysis results and packing jobs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Packer-name placeholder for "no name". A detector label spelled this way
/// is read as unnamed, which keeps it unambiguous in the text table.
pub const NO_PACKER: &str = "None";

/// Outcome of running the packer detector against one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Detection {
    /// The detector reported a packer. The name is absent when the output
    /// mentioned a packer without a parseable `Packer:` line.
    Packed { packer: Option<String> },
    NotPacked,
}

impl Detection {
    pub fn packed(name: impl Into<String>) -> Self {
        Detection::Packed { packer: Some(name.into()) }.normalized()
    }

    /// Fold a `None` packer label into an unnamed packer.
    pub fn normalized(self) -> Self {
        match self {
            Detection::Packed { packer: Some(name) } if name == NO_PACKER => {
                Detection::Packed { packer: None }
            }
            other => other,
        }
    }

    pub fn is_packed(&self) -> bool {
        matches!(self, Detection::Packed { .. })
    }
}

/// Flat status column shared by both table formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    Packed,
    NotPacked,
    Error,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Packed => "Packed",
            RecordStatus::NotPacked => "Not Packed",
            RecordStatus::Error => "Error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Packed" => Some(RecordStatus::Packed),
            "Not Packed" => Some(RecordStatus::NotPacked),
            "Error" => Some(RecordStatus::Error),
            _ => None,
        }
    }
}

/// One row of the result table. Exactly one is produced per corpus file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FileRecord {
    /// The file was hashed and classified.
    Scanned { digest: String, filename: String, detection: Detection },
    /// Hashing or detection failed; only the name and the error survive.
    Failed { filename: String, message: String },
}

impl FileRecord {
    pub fn scanned(
        digest: impl Into<String>,
        filename: impl Into<String>,
        detection: Detection,
    ) -> Self {
        FileRecord::Scanned {
            digest: digest.into(),
            filename: filename.into(),
            detection: detection.normalized(),
        }
    }

    /// Same record with its detection passed through [`Detection::normalized`].
    pub fn normalized(self) -> Self {
        match self {
            FileRecord::Scanned { digest, filename, detection } => {
                FileRecord::Scanned { digest, filename, detection: detection.normalized() }
            }
            failed => failed,
        }
    }

    pub fn failed(filename: impl Into<String>, message: impl Into<String>) -> Self {
        FileRecord::Failed { filename: filename.into(), message: message.into() }
    }

    pub fn filename(&self) -> &str {
        match self {
            FileRecord::Scanned { filename, .. } | FileRecord::Failed { filename, .. } => filename,
        }
    }

    pub fn digest(&self) -> Option<&str> {
        match self {
            FileRecord::Scanned { digest, .. } => Some(digest),
            FileRecord::Failed { .. } => None,
        }
    }

    pub fn status(&self) -> RecordStatus {
        match self {
            FileRecord::Scanned { detection: Detection::Packed { .. }, .. } => RecordStatus::Packed,
            FileRecord::Scanned { detection: Detection::NotPacked, .. } => RecordStatus::NotPacked,
            FileRecord::Failed { .. } => RecordStatus::Error,
        }
    }

    pub fn packer_name(&self) -> Option<&str> {
        match self {
            FileRecord::Scanned { detection: Detection::Packed { packer }, .. } => {
                packer.as_deref()
            }
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            FileRecord::Failed { message, .. } => Some(message),
            FileRecord::Scanned { .. } => None,
        }
    }
}

/// Counts per status, used for end-of-run reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordTally {
    pub packed: usize,
    pub not_packed: usize,
    pub errors: usize,
}

impl RecordTally {
    pub fn from_records(records: &[FileRecord]) -> Self {
        let mut tally = Self::default();
        for record in records {
            match record.status() {
                RecordStatus::Packed => tally.packed += 1,
                RecordStatus::NotPacked => tally.not_packed += 1,
                RecordStatus::Error => tally.errors += 1,
            }
        }
        tally
    }

    pub fn total(&self) -> usize {
        self.packed + self.not_packed + self.errors
    }
}

/// A single file scheduled for repacking.
///
/// Built per eligible file during traversal and dropped once the packer has
/// run. The relative path is preserved verbatim under the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackJob {
    pub source_root: PathBuf,
    pub output_root: PathBuf,
    pub relative_path: PathBuf,
}

impl PackJob {
    pub fn source_path(&self) -> PathBuf {
        self.source_root.join(&self.relative_path)
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_root.join(&self.relative_path)
    }

    /// Build a job for `file`, which must live under `source_root`.
    pub fn for_file(source_root: &Path, output_root: &Path, file: &Path) -> Option<Self> {
        let relative_path = file.strip_prefix(source_root).ok()?.to_path_buf();
        Some(Self {
            source_root: source_root.to_path_buf(),
            output_root: output_root.to_path_buf(),
            relative_path,
        })
    }
}
