use std::path::Path;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use super::TableError;
pub use crate::model::NO_PACKER;
use crate::model::{Detection, FileRecord, RecordStatus};

pub const TEXT_HEADER: [&str; 4] = ["SHA256", "Filename", "Packed Status", "Packer Name"];

pub fn write_text_table(path: &Path, records: &[FileRecord]) -> Result<(), TableError> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record(TEXT_HEADER)?;
    for record in records {
        writer.write_record(row_for(record))?;
    }
    writer.flush().map_err(|source| TableError::Io { path: path.to_path_buf(), source })?;
    Ok(())
}

fn row_for(record: &FileRecord) -> [&str; 4] {
    match record {
        FileRecord::Scanned { digest, filename, detection } => {
            let packer = match detection {
                Detection::Packed { packer } => packer.as_deref().unwrap_or(NO_PACKER),
                Detection::NotPacked => NO_PACKER,
            };
            [digest.as_str(), filename.as_str(), record.status().as_str(), packer]
        }
        FileRecord::Failed { filename, message } => {
            ["", filename.as_str(), RecordStatus::Error.as_str(), message.as_str()]
        }
    }
}

/// Read a CSV written by [`write_text_table`].
///
/// Three-column `filename,Error,message` rows are accepted too, which is
/// the error-row shape older tables used.
pub fn load_text_table(path: &Path) -> Result<Vec<FileRecord>, TableError> {
    let mut reader = ReaderBuilder::new().has_headers(true).flexible(true).from_path(path)?;

    let header = reader.headers()?.clone();
    if header.iter().ne(TEXT_HEADER) {
        return Err(TableError::Header(header.iter().collect::<Vec<_>>().join(",")));
    }

    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let row = row?;
        // Row numbers are 1-based and count the header.
        records.push(parse_row(&row, idx + 2)?);
    }
    Ok(records)
}

fn parse_row(row: &StringRecord, row_no: usize) -> Result<FileRecord, TableError> {
    let malformed = |message: String| TableError::Malformed { row: row_no, message };

    if row.len() == 3 && row.get(1) == Some(RecordStatus::Error.as_str()) {
        return Ok(FileRecord::failed(&row[0], &row[2]));
    }
    if row.len() != 4 {
        return Err(malformed(format!("expected 4 columns, found {}", row.len())));
    }

    let status = RecordStatus::parse(&row[2])
        .ok_or_else(|| malformed(format!("unknown status '{}'", &row[2])))?;
    let packer = match &row[3] {
        "" | NO_PACKER => None,
        name => Some(name.to_string()),
    };

    Ok(match status {
        RecordStatus::Packed => FileRecord::scanned(&row[0], &row[1], Detection::Packed { packer }),
        RecordStatus::NotPacked => FileRecord::scanned(&row[0], &row[1], Detection::NotPacked),
        RecordStatus::Error => FileRecord::failed(&row[1], &row[3]),
    })
}
