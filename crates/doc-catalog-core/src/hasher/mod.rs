use crate::error::SkipReason;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::hash::Hasher as _;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use twox_hash::XxHash64;

/// Content hash algorithms supported for file checksums.
///
/// BLAKE3 is the default; XXH64 trades collision resistance for speed on
/// trees where the catalog is only used locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Blake3,
    Sha256,
    Xxh64,
}

impl HashAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Blake3 => "blake3",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Xxh64 => "xxh64",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blake3" => Ok(HashAlgorithm::Blake3),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "xxh64" => Ok(HashAlgorithm::Xxh64),
            other => Err(format!("unknown hash algorithm '{}'", other)),
        }
    }
}

/// A file's resolved identity: byte size plus content checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentity {
    pub size: u64,
    pub checksum: String,
}

enum StreamingHasher {
    Blake3(blake3::Hasher),
    Sha256(Sha256),
    Xxh64(XxHash64),
}

impl StreamingHasher {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Blake3 => StreamingHasher::Blake3(blake3::Hasher::new()),
            HashAlgorithm::Sha256 => StreamingHasher::Sha256(Sha256::new()),
            HashAlgorithm::Xxh64 => StreamingHasher::Xxh64(XxHash64::with_seed(0)),
        }
    }

    fn update(&mut self, chunk: &[u8]) {
        match self {
            StreamingHasher::Blake3(h) => {
                h.update(chunk);
            }
            StreamingHasher::Sha256(h) => h.update(chunk),
            StreamingHasher::Xxh64(h) => h.write(chunk),
        }
    }

    fn finalize(self) -> String {
        match self {
            StreamingHasher::Blake3(h) => h.finalize().to_hex().to_string(),
            StreamingHasher::Sha256(h) => format!("{:x}", h.finalize()),
            StreamingHasher::Xxh64(h) => format!("{:016x}", h.finish()),
        }
    }
}

/// Resolve a file's size and content checksum in one streaming pass.
///
/// Reads `buffer_size` bytes at a time; never holds more than one chunk.
/// Failure to open or read returns a `SkipReason` so callers can keep the
/// file as present-but-unidentified instead of aborting the walk.
pub fn resolve(
    path: &Path,
    algorithm: HashAlgorithm,
    buffer_size: usize,
) -> Result<FileIdentity, SkipReason> {
    let mut file = File::open(path).map_err(|err| SkipReason::from(&err))?;
    let mut hasher = StreamingHasher::new(algorithm);
    let mut buf = vec![0u8; buffer_size];
    let mut size = 0u64;

    loop {
        let read = file.read(&mut buf).map_err(|err| SkipReason::from(&err))?;
        if read == 0 {
            break;
        }
        size += read as u64;
        hasher.update(&buf[..read]);
    }

    Ok(FileIdentity {
        size,
        checksum: hasher.finalize(),
    })
}

/// Derived record key: BLAKE3 over `absolute_path ‖ checksum`.
///
/// Stable for a given (path, checksum) pair; a missing checksum contributes
/// the empty string so the key is still total. Always BLAKE3, independent of
/// the content algorithm, so keys stay comparable across runs.
pub fn file_key(path: &Path, checksum: Option<&str>) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(path.to_string_lossy().as_bytes());
    hasher.update(checksum.unwrap_or("").as_bytes());
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn resolve_reports_size_and_stable_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        fs::write(&path, b"hello checksum").unwrap();

        let first = resolve(&path, HashAlgorithm::Blake3, 4).unwrap();
        let second = resolve(&path, HashAlgorithm::Blake3, 4096).unwrap();

        assert_eq!(first.size, 14);
        // Chunk size must not affect the digest.
        assert_eq!(first.checksum, second.checksum);
    }

    #[test]
    fn algorithms_produce_distinct_checksums() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        fs::write(&path, b"same bytes").unwrap();

        let blake = resolve(&path, HashAlgorithm::Blake3, 64).unwrap();
        let sha = resolve(&path, HashAlgorithm::Sha256, 64).unwrap();
        let xxh = resolve(&path, HashAlgorithm::Xxh64, 64).unwrap();

        assert_ne!(blake.checksum, sha.checksum);
        assert_ne!(sha.checksum, xxh.checksum);
        assert_eq!(xxh.checksum.len(), 16);
    }

    #[test]
    fn resolve_missing_file_is_a_skip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");
        assert_eq!(
            resolve(&path, HashAlgorithm::Blake3, 64),
            Err(SkipReason::NotFound)
        );
    }

    #[test]
    fn file_key_is_deterministic_and_content_sensitive() {
        let path = Path::new("/data/report.txt");
        let a = file_key(path, Some("abc"));
        let b = file_key(path, Some("abc"));
        let c = file_key(path, Some("def"));
        let d = file_key(Path::new("/other/report.txt"), Some("abc"));

        assert_eq!(a, b);
        // Same path, different content.
        assert_ne!(a, c);
        // Different path, same content.
        assert_ne!(a, d);
    }
}
