use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

/// Block size used when streaming file content into the hasher.
pub const BLOCK_SIZE: usize = 4096;

/// Compute the SHA-256 of a file and return it as a lowercase hex string.
///
/// The file is read in fixed [`BLOCK_SIZE`] blocks so memory use does not
/// depend on file size.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    sha256_reader(file)
}

/// Hash everything readable from `reader`.
pub fn sha256_reader(mut reader: impl Read) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; BLOCK_SIZE];

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
