use std::fs::File;
use std::io::{Read, BufReader};
use std::path::Path;
use sha2::{Sha256, Digest};
use memmap2::MmapOptions;
use crate::error::{Result, StoreError};

const MMAP_THRESHOLD: u64 = 500 * 1024 * 1024; // 500 MB

/// Hex-encoded SHA-256 of an in-memory byte slice.
pub fn digest_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Content identity of the file at `path`.
///
/// Any open or read error is reported as `ReadFailure`; callers treat it as
/// fatal for the operation in progress.
pub fn calculate_hash(path: &Path) -> Result<String> {
    let read_failure = |source: std::io::Error| StoreError::ReadFailure {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(read_failure)?;
    let len = file.metadata().map_err(read_failure)?.len();

    let mut hasher = Sha256::new();

    if len > MMAP_THRESHOLD {
        // The file must not be truncated while mapped.
        let mmap = unsafe { MmapOptions::new().map(&file) }.map_err(read_failure)?;
        hasher.update(&mmap);
    } else {
        let mut reader = BufReader::new(file);
        let mut buffer = [0; 8192];
        loop {
            let count = reader.read(&mut buffer).map_err(read_failure)?;
            if count == 0 {
                break;
            }
            hasher.update(&buffer[..count]);
        }
    }

    Ok(hex::encode(hasher.finalize()))
}
