use super::models::{CatalogSession, FileRow, StoredFile};
use super::sqlite::Database;
use crate::config::ConflictPolicy;
use crate::error::Error;
use crate::hasher::HashAlgorithm;
use crate::record::FileRecord;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Buffered, append-only persistence for one catalog run.
///
/// Newly admitted records accumulate in memory; crossing the flush threshold
/// writes them as one batch transaction and clears the buffer. A single
/// writer owns the store for the duration of the run.
pub struct CatalogStore {
    db: Database,
    buffer: Vec<FileRow>,
    flush_threshold: usize,
    flushed: usize,
}

impl CatalogStore {
    /// Open or create the destination store. A pre-existing destination
    /// requires an explicit policy; the store never merges silently.
    pub fn open(
        path: &Path,
        policy: ConflictPolicy,
        flush_threshold: usize,
    ) -> Result<Self, Error> {
        if path.exists() {
            match policy {
                ConflictPolicy::Error => {
                    return Err(Error::StoreConflict(path.to_path_buf()))
                }
                ConflictPolicy::Overwrite => {
                    info!("overwriting existing store {}", path.display());
                    remove_store_files(path)?;
                }
                ConflictPolicy::Append => {
                    info!("appending to existing store {}", path.display());
                }
            }
        }

        let db = Database::open(path)?;
        Ok(Self {
            db,
            buffer: Vec::new(),
            flush_threshold,
            flushed: 0,
        })
    }

    pub fn persist_session(&self, session: &CatalogSession) -> Result<(), Error> {
        self.db.insert_session(session)?;
        Ok(())
    }

    /// Queue one newly admitted row. Crossing the threshold flushes in
    /// place; the returned count is the number of rows written (0 when the
    /// batch is still accumulating).
    pub fn enqueue(&mut self, row: FileRow) -> Result<usize, Error> {
        self.buffer.push(row);
        if self.buffer.len() >= self.flush_threshold {
            self.flush()
        } else {
            Ok(0)
        }
    }

    /// Write all pending rows as one batch and clear the buffer.
    pub fn flush(&mut self) -> Result<usize, Error> {
        if self.buffer.is_empty() {
            return Ok(0);
        }
        let written = self.db.insert_file_rows(&self.buffer)?;
        self.flushed += written;
        self.buffer.clear();
        debug!("flushed {} rows ({} total)", written, self.flushed);
        Ok(written)
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Rows durably written so far.
    pub fn flushed(&self) -> usize {
        self.flushed
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Load prior records from a persisted store: a sessions⋈files join,
    /// optionally narrowed to one session. A missing store is a SchemaError
    /// when `required`, an empty result otherwise.
    pub fn load_existing(
        path: &Path,
        session_id: Option<&str>,
        algorithm: HashAlgorithm,
        required: bool,
    ) -> Result<Vec<FileRecord>, Error> {
        if !path.is_file() {
            if required {
                return Err(Error::Schema(format!(
                    "prior store '{}' does not exist",
                    path.display()
                )));
            }
            return Ok(Vec::new());
        }

        let db = Database::open(path)?;
        let rows = db.load_session_files(session_id)?;
        debug!("loaded {} rows from prior store {}", rows.len(), path.display());
        Ok(rows
            .into_iter()
            .map(|row| record_from_store(row, algorithm))
            .collect())
    }
}

/// A stored checksum is only trusted when it was computed with the currently
/// configured algorithm; a mismatch discards it so the record re-hashes
/// lazily instead of mixing algorithms across runs.
fn record_from_store(row: StoredFile, algorithm: HashAlgorithm) -> FileRecord {
    let checksum = match (row.checksum, row.hash_algorithm) {
        (Some(checksum), Some(stored)) if stored == algorithm.name() => Some(checksum),
        (Some(_), stored) => {
            warn!(
                "discarding checksum for '{}': stored algorithm {:?} != configured {}",
                row.relative_path,
                stored,
                algorithm.name()
            );
            None
        }
        (None, _) => None,
    };

    let base = PathBuf::from(row.base_dir);
    let path = base.join(&row.relative_path);
    FileRecord::from_store_row(
        path,
        PathBuf::from(row.relative_path),
        row.filename,
        row.extension,
        row.size_bytes.map(|size| size as u64),
        checksum,
    )
}

fn remove_store_files(path: &Path) -> Result<(), Error> {
    fs::remove_file(path)?;
    // WAL sidecars, if any
    for suffix in ["-wal", "-shm"] {
        let mut name = OsString::from(path.as_os_str());
        name.push(suffix);
        let _ = fs::remove_file(PathBuf::from(name));
    }
    Ok(())
}
