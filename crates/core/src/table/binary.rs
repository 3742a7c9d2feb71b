use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::TableError;
use crate::model::FileRecord;

/// Bumped whenever the stored shape of [`FileRecord`] changes.
pub const BINARY_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoredTable {
    format_version: u32,
    records: Vec<FileRecord>,
}

/// Write `records` as CBOR.
pub fn write_binary_table(path: &Path, records: &[FileRecord]) -> Result<(), TableError> {
    let io_err = |source| TableError::Io { path: path.to_path_buf(), source };
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);

    let stored = StoredTable { format_version: BINARY_FORMAT_VERSION, records: records.to_vec() };
    ciborium::ser::into_writer(&stored, &mut writer)
        .map_err(|e| TableError::Encode(e.to_string()))?;
    writer.flush().map_err(io_err)?;
    Ok(())
}

pub fn load_binary_table(path: &Path) -> Result<Vec<FileRecord>, TableError> {
    let file =
        File::open(path).map_err(|source| TableError::Io { path: path.to_path_buf(), source })?;
    let stored: StoredTable = ciborium::de::from_reader(BufReader::new(file))
        .map_err(|e| TableError::Decode(e.to_string()))?;
    if stored.format_version != BINARY_FORMAT_VERSION {
        return Err(TableError::UnsupportedVersion {
            found: stored.format_version,
            expected: BINARY_FORMAT_VERSION,
        });
    }
    Ok(stored.records)
}
