use crate::error::SkipReason;
use crate::hasher::{self, FileIdentity, HashAlgorithm};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const SIZE_SUFFIXES: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Marks where a record came from. Existing records are loaded from a prior
/// catalog and sit before all New records in the admitted sequence, which is
/// what makes the duplicate tie-break reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Existing,
    New,
}

/// Memoized checksum. A record's checksum is computed at most once per run;
/// a failed computation is remembered and never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecksumState {
    NotComputed,
    Known(String),
    Unavailable(SkipReason),
}

/// One catalogued file. A single value type covers all construction sources
/// (walk, import row, store row); `origin` carries the distinction.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Absolute path as discovered or imported.
    pub path: PathBuf,
    /// Path relative to the base directory; falls back to the absolute path
    /// when the file is not under the base directory.
    pub relative_path: PathBuf,
    pub name: String,
    pub extension: String,
    pub size: Option<u64>,
    checksum: ChecksumState,
    pub duplicate: bool,
    pub origin: Origin,
    /// Opaque attributes carried through from an imported source, in column
    /// order. Never interpreted, preserved verbatim on export.
    pub extra: Vec<(String, String)>,
}

impl FileRecord {
    pub fn from_walk(path: PathBuf, base_dir: &Path) -> Self {
        let relative_path = relative_to(&path, base_dir);
        let (name, extension) = name_and_extension(&path);
        Self {
            path,
            relative_path,
            name,
            extension,
            size: None,
            checksum: ChecksumState::NotComputed,
            duplicate: false,
            origin: Origin::New,
            extra: Vec::new(),
        }
    }

    /// Build from a tabular import row. An already-present checksum is
    /// trusted without recomputation.
    pub fn from_import_row(
        path: PathBuf,
        base_dir: &Path,
        size: Option<u64>,
        checksum: Option<String>,
        duplicate: bool,
        extra: Vec<(String, String)>,
    ) -> Self {
        let relative_path = relative_to(&path, base_dir);
        let (name, extension) = name_and_extension(&path);
        Self {
            path,
            relative_path,
            name,
            extension,
            size,
            checksum: checksum.map_or(ChecksumState::NotComputed, ChecksumState::Known),
            duplicate,
            origin: Origin::Existing,
            extra,
        }
    }

    /// Build from a prior persisted store row. The caller decides whether the
    /// stored checksum can be trusted (`None` forces a lazy re-hash).
    pub fn from_store_row(
        path: PathBuf,
        relative_path: PathBuf,
        name: String,
        extension: String,
        size: Option<u64>,
        checksum: Option<String>,
    ) -> Self {
        Self {
            path,
            relative_path,
            name,
            extension,
            size,
            checksum: checksum.map_or(ChecksumState::NotComputed, ChecksumState::Known),
            duplicate: false,
            origin: Origin::Existing,
            extra: Vec::new(),
        }
    }

    pub fn checksum(&self) -> Option<&str> {
        match &self.checksum {
            ChecksumState::Known(checksum) => Some(checksum),
            _ => None,
        }
    }

    pub fn checksum_state(&self) -> &ChecksumState {
        &self.checksum
    }

    /// Compute the checksum if it has never been attempted. Returns the
    /// checksum if known, whether freshly computed or memoized.
    pub fn ensure_checksum(
        &mut self,
        algorithm: HashAlgorithm,
        buffer_size: usize,
    ) -> Option<&str> {
        if matches!(self.checksum, ChecksumState::NotComputed) {
            match hasher::resolve(&self.path, algorithm, buffer_size) {
                Ok(identity) => self.apply_identity(identity),
                Err(reason) => {
                    warn!("checksum unavailable for {}: {}", self.path.display(), reason);
                    self.checksum = ChecksumState::Unavailable(reason);
                }
            }
        }
        self.checksum()
    }

    /// Record an identity resolved out of band (e.g. by a parallel hashing
    /// chunk). A skip keeps the record present-but-unidentified.
    pub fn set_identity(&mut self, identity: Result<FileIdentity, SkipReason>) {
        match identity {
            Ok(identity) => self.apply_identity(identity),
            Err(reason) => {
                warn!("checksum unavailable for {}: {}", self.path.display(), reason);
                self.checksum = ChecksumState::Unavailable(reason);
            }
        }
    }

    fn apply_identity(&mut self, identity: FileIdentity) {
        self.size = Some(identity.size);
        self.checksum = ChecksumState::Known(identity.checksum);
    }

    /// Fill in the size from file metadata without touching the checksum.
    pub fn load_size(&mut self) {
        if self.size.is_none() {
            if let Ok(metadata) = fs::metadata(&self.path) {
                self.size = Some(metadata.len());
            }
        }
    }

    /// Derived key over `absolute_path ‖ checksum`. Unique per record within
    /// a catalog; stable for a given (path, checksum) pair.
    pub fn key(&self) -> String {
        hasher::file_key(&self.path, self.checksum())
    }

    pub fn human_readable_size(&self) -> Option<String> {
        self.size.map(|size| human_readable(size, 0))
    }

    /// Components of the relative path, filename excluded.
    pub fn subdirectories(&self) -> Vec<String> {
        match self.relative_path.parent() {
            Some(parent) => parent
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect(),
            None => Vec::new(),
        }
    }
}

fn relative_to(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

fn name_and_extension(path: &Path) -> (String, String) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    (name, extension)
}

/// Bytes to a human-readable string, to the given precision.
pub fn human_readable(size: u64, precision: usize) -> String {
    let mut value = size as f64;
    let mut index = 0;
    while value > 1024.0 && index < SIZE_SUFFIXES.len() - 1 {
        value /= 1024.0;
        index += 1;
    }
    format!("{:.*}{}", precision, value, SIZE_SUFFIXES[index])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_readable_scales_suffixes() {
        assert_eq!(human_readable(512, 0), "512B");
        assert_eq!(human_readable(2048, 0), "2KB");
        assert_eq!(human_readable(5 * 1024 * 1024, 0), "5MB");
        assert_eq!(human_readable(3 * 1024 * 1024 * 1024, 1), "3.0GB");
    }

    #[test]
    fn walk_record_derives_relative_path_and_parts() {
        let record = FileRecord::from_walk(
            PathBuf::from("/data/archive/2017/report.txt"),
            Path::new("/data"),
        );
        assert_eq!(record.relative_path, PathBuf::from("archive/2017/report.txt"));
        assert_eq!(record.name, "report.txt");
        assert_eq!(record.extension, ".txt");
        assert_eq!(record.subdirectories(), vec!["archive", "2017"]);
        assert_eq!(record.origin, Origin::New);
    }

    #[test]
    fn relative_path_falls_back_outside_base() {
        let record = FileRecord::from_walk(
            PathBuf::from("/elsewhere/file.bin"),
            Path::new("/data"),
        );
        assert_eq!(record.relative_path, PathBuf::from("/elsewhere/file.bin"));
    }

    #[test]
    fn imported_checksum_is_trusted() {
        let record = FileRecord::from_import_row(
            PathBuf::from("/data/a.txt"),
            Path::new("/data"),
            Some(10),
            Some("cafe".to_string()),
            true,
            vec![("Owner".to_string(), "cd".to_string())],
        );
        assert_eq!(record.checksum(), Some("cafe"));
        assert!(record.duplicate);
        assert_eq!(record.origin, Origin::Existing);
    }

    #[test]
    fn key_distinguishes_content_at_same_path() {
        let mut a = FileRecord::from_walk(PathBuf::from("/d/x.txt"), Path::new("/d"));
        let mut b = a.clone();
        a.set_identity(Ok(FileIdentity {
            size: 1,
            checksum: "one".to_string(),
        }));
        b.set_identity(Ok(FileIdentity {
            size: 1,
            checksum: "two".to_string(),
        }));
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn failed_identity_is_memoized() {
        let mut record =
            FileRecord::from_walk(PathBuf::from("/nowhere/gone.txt"), Path::new("/nowhere"));
        record.set_identity(Err(SkipReason::NotFound));
        assert_eq!(record.checksum(), None);
        assert_eq!(
            record.checksum_state(),
            &ChecksumState::Unavailable(SkipReason::NotFound)
        );
        // ensure_checksum must not retry a remembered failure
        assert_eq!(record.ensure_checksum(HashAlgorithm::Blake3, 64), None);
    }
}
