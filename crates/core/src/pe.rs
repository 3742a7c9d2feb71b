use std::fs::File;
use std::io::Read;
use std::path::Path;

/// DOS header magic that every PE image starts with.
pub const PE_MAGIC: [u8; 2] = *b"MZ";

/// Returns true when the file at `path` begins with the `MZ` magic.
///
/// Any I/O failure (missing file, permission denied, fewer than two bytes)
/// reports `false` so one unreadable file never aborts a batch.
pub fn is_pe_file(path: &Path) -> bool {
    let mut magic = [0u8; 2];
    match File::open(path).and_then(|mut file| file.read_exact(&mut magic)) {
        Ok(()) => magic == PE_MAGIC,
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "PE gate could not read magic");
            false
        }
    }
}
