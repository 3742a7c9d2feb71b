//! Analysis pipeline: fingerprint and classify every file under a corpus root.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::corpus::{CorpusError, CorpusWalker};
use crate::fingerprint::sha256_file;
use crate::model::{FileRecord, RecordTally};
use crate::services::detector::{Detector, DetectorError};
use crate::table::{ResultTable, TableError};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Corpus(#[from] CorpusError),
    #[error(transparent)]
    Detector(#[from] DetectorError),
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Where the two table artifacts go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOutputs {
    pub text: PathBuf,
    pub binary: PathBuf,
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub table: ResultTable,
    pub tally: RecordTally,
}

/// Runs the detector over a corpus, one file at a time.
///
/// Failures on a single file (unreadable, vanished, detector crash, bad
/// output encoding) become [`FileRecord::Failed`] rows and the run carries
/// on. Only a missing corpus root, an unavailable detector, or a failure to
/// write the tables end the run.
pub struct AnalysisPipeline<'a> {
    pub detector: &'a dyn Detector,
}

impl<'a> AnalysisPipeline<'a> {
    pub fn new(detector: &'a dyn Detector) -> Self {
        Self { detector }
    }

    /// Hash then classify one file. Never fails; errors become the record.
    pub fn analyze_file(&self, path: &Path) -> FileRecord {
        let filename = display_name(path);
        let digest = match sha256_file(path) {
            Ok(digest) => digest,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to fingerprint file");
                return FileRecord::failed(filename, err.to_string());
            }
        };
        match self.detector.detect(path) {
            Ok(detection) => FileRecord::scanned(digest, filename, detection),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "detector failed");
                FileRecord::failed(filename, err.to_string())
            }
        }
    }

    /// Analyze every file under `root`, calling `on_record` after each one.
    pub fn run_with_progress(
        &self,
        root: &Path,
        mut on_record: impl FnMut(&Path, &FileRecord),
    ) -> Result<ResultTable, AnalysisError> {
        let walker = CorpusWalker::new(root)?;
        self.detector.preflight()?;

        let mut table = ResultTable::new();
        for entry in walker.files() {
            let (path, record) = match entry {
                Ok(path) => {
                    let record = self.analyze_file(&path);
                    (path, record)
                }
                Err(CorpusError::Entry { path, message }) => {
                    tracing::warn!(path = %path.display(), %message, "corpus entry unreadable");
                    let record = FileRecord::failed(display_name(&path), message);
                    (path, record)
                }
                Err(other) => return Err(other.into()),
            };
            on_record(&path, &record);
            table.push(record);
        }
        Ok(table)
    }

    pub fn run(&self, root: &Path) -> Result<ResultTable, AnalysisError> {
        self.run_with_progress(root, |_, _| {})
    }

    /// Analyze `root` and write both table artifacts.
    pub fn run_and_persist(
        &self,
        root: &Path,
        outputs: &TableOutputs,
        on_record: impl FnMut(&Path, &FileRecord),
    ) -> Result<AnalysisReport, AnalysisError> {
        let table = self.run_with_progress(root, on_record)?;
        table.persist(&outputs.text, &outputs.binary)?;
        let tally = table.tally();
        Ok(AnalysisReport { table, tally })
    }
}

/// File name used in the `Filename` column.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
