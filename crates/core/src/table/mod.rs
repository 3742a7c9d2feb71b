//! ResultTable persistence.
//!
//! The same in-memory records are written twice: a CSV for people and a CBOR
//! file for programs. Either artifact loads back into the same
//! `Vec<FileRecord>` in the same order.

mod binary;
mod text;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::{FileRecord, RecordTally};

pub use binary::{load_binary_table, write_binary_table, BINARY_FORMAT_VERSION};
pub use text::{load_text_table, write_text_table, NO_PACKER, TEXT_HEADER};

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Failed to access table file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to encode binary table: {0}")]
    Encode(String),
    #[error("Failed to decode binary table: {0}")]
    Decode(String),
    #[error("Unexpected CSV header: {0}")]
    Header(String),
    #[error("Malformed table row {row}: {message}")]
    Malformed { row: usize, message: String },
    #[error("Unsupported binary table version {found}; expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
}

/// Ordered, append-only sequence of per-file results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTable {
    records: Vec<FileRecord>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: FileRecord) {
        self.records.push(record.normalized());
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<FileRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn tally(&self) -> RecordTally {
        RecordTally::from_records(&self.records)
    }

    /// Write the CSV and the binary artifact from this table.
    pub fn persist(&self, text_path: &Path, binary_path: &Path) -> Result<(), TableError> {
        write_text_table(text_path, &self.records)?;
        write_binary_table(binary_path, &self.records)?;
        tracing::info!(
            rows = self.records.len(),
            text = %text_path.display(),
            binary = %binary_path.display(),
            "persisted result table"
        );
        Ok(())
    }
}

impl From<Vec<FileRecord>> for ResultTable {
    fn from(records: Vec<FileRecord>) -> Self {
        Self { records: records.into_iter().map(FileRecord::normalized).collect() }
    }
}

/// Load a table, picking the format from the extension (`.csv` is text,
/// anything else is binary).
pub fn load_table(path: &Path) -> Result<Vec<FileRecord>, TableError> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if is_csv {
        load_text_table(path)
    } else {
        load_binary_table(path)
    }
}
