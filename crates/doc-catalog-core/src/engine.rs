use crate::config::CatalogConfig;
use crate::dedupe;
use crate::error::Error;
use crate::export::{self, ExportTable};
use crate::hasher;
use crate::progress::ProgressReporter;
use crate::record::{ChecksumState, FileRecord};
use crate::storage::import;
use crate::storage::models::{CatalogSession, FileRow};
use crate::storage::CatalogStore;
use crate::walker::DirectoryWalker;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

/// Candidate paths are hashed in parallel a chunk at a time; admission then
/// re-serializes the chunk in traversal order, so the store sees one writer
/// and the duplicate tie-break stays reproducible.
const WALK_CHUNK: usize = 128;

/// Where the engine is in its run. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Init,
    LoadingExisting,
    Walking,
    Deduplicating,
    Flushing,
    Exporting,
    Done,
    Failed,
}

/// Summary of one completed run.
#[derive(Debug)]
pub struct RunReport {
    pub session_id: String,
    pub existing_files: usize,
    pub new_files: usize,
    pub duplicate_files: usize,
    pub skipped_files: u64,
    /// Rows durably written to the store.
    pub flushed_rows: usize,
    pub load_duration: Duration,
    pub walk_duration: Duration,
    /// The final ordered, column-normalized record set for the export
    /// boundary.
    pub export: ExportTable,
}

/// Orchestrates one cataloging run: load prior state, walk, admit, buffer,
/// deduplicate, flush, normalize for export.
pub struct CatalogEngine {
    config: CatalogConfig,
    state: EngineState,
    cancel: Arc<AtomicBool>,
}

impl CatalogEngine {
    pub fn new(config: CatalogConfig) -> Self {
        Self {
            config,
            state: EngineState::Init,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Cooperative cancellation, checked at chunk and flush boundaries.
    /// Cancelling flushes the pending buffer first; already-flushed rows are
    /// never lost.
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn run(&mut self, reporter: &dyn ProgressReporter) -> Result<RunReport, Error> {
        match self.run_inner(reporter) {
            Ok(report) => {
                self.state = EngineState::Done;
                Ok(report)
            }
            Err(err) => {
                self.state = EngineState::Failed;
                Err(err)
            }
        }
    }

    fn run_inner(&mut self, reporter: &dyn ProgressReporter) -> Result<RunReport, Error> {
        self.state = EngineState::Init;
        self.config.validate()?;

        let mut store = CatalogStore::open(
            &self.config.store_path,
            self.config.conflict_policy,
            self.config.flush_threshold,
        )?;
        let session_id = self
            .config
            .session_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        let session = CatalogSession::new(&self.config, session_id.clone());
        store.persist_session(&session)?;
        info!("catalog session {}", session_id);

        self.state = EngineState::LoadingExisting;
        reporter.on_load_start();
        let load_start = Instant::now();

        let mut catalog: Vec<FileRecord> = Vec::new();
        let mut seen_keys: HashSet<String> = HashSet::new();
        let mut seen_paths: HashSet<PathBuf> = HashSet::new();

        if let Some(import_path) = &self.config.existing_catalog {
            for mut record in import::read_catalog(import_path, &self.config.base_dir)? {
                if try_admit(&self.config, &mut record, &mut seen_keys, &mut seen_paths) {
                    catalog.push(record);
                }
            }
        }
        if let Some(store_path) = &self.config.existing_store {
            let loaded = CatalogStore::load_existing(
                store_path,
                None,
                self.config.hash_algorithm,
                true,
            )?;
            for mut record in loaded {
                if try_admit(&self.config, &mut record, &mut seen_keys, &mut seen_paths) {
                    catalog.push(record);
                }
            }
        }

        let existing_files = catalog.len();
        let load_duration = load_start.elapsed();
        reporter.on_load_complete(existing_files);
        debug!("loaded {} existing records", existing_files);

        self.state = EngineState::Walking;
        reporter.on_walk_start();
        let walk_start = Instant::now();

        let walker = DirectoryWalker::new(
            self.config.search_dirs.clone(),
            &self.config.exclude_dirs,
        );
        let mut walk = walker.files();
        let mut new_files = 0usize;
        let mut skipped = 0u64;

        loop {
            if self.cancel.load(Ordering::Relaxed) {
                store.flush()?;
                return Err(Error::Cancelled);
            }

            let chunk: Vec<PathBuf> = walk.by_ref().take(WALK_CHUNK).collect();
            if chunk.is_empty() {
                break;
            }

            for mut record in resolve_chunk(&self.config, chunk) {
                if !try_admit(&self.config, &mut record, &mut seen_keys, &mut seen_paths) {
                    continue;
                }
                if matches!(record.checksum_state(), ChecksumState::Unavailable(_)) {
                    skipped += 1;
                }
                reporter.on_file_admitted(&record.path);
                let row =
                    FileRow::from_record(&record, &session_id, self.config.hash_algorithm);
                let written = store.enqueue(row)?;
                if written > 0 {
                    reporter.on_flush(written);
                }
                catalog.push(record);
                new_files += 1;
            }
        }

        skipped += walk.skipped();
        let walk_duration = walk_start.elapsed();
        reporter.on_walk_complete(new_files, skipped);

        self.state = EngineState::Deduplicating;
        let duplicate_files = if self.config.check_contents {
            dedupe::mark_duplicates(&mut catalog)
        } else {
            0
        };
        reporter.on_dedupe_complete(duplicate_files);

        self.state = EngineState::Flushing;
        let written = store.flush()?;
        if written > 0 {
            reporter.on_flush(written);
        }
        if self.cancel.load(Ordering::Relaxed) {
            return Err(Error::Cancelled);
        }

        self.state = EngineState::Exporting;
        let export_table = export::build_table(&catalog, &self.config.base_dir);
        reporter.on_export_ready(export_table.rows.len());

        Ok(RunReport {
            session_id,
            existing_files,
            new_files,
            duplicate_files,
            skipped_files: skipped,
            flushed_rows: store.flushed(),
            load_duration,
            walk_duration,
            export: export_table,
        })
    }
}

/// Resolve one chunk of candidates. With content checking on, identities are
/// hashed in parallel; the collected Vec preserves traversal order. With it
/// off only the size is read, sequentially.
fn resolve_chunk(config: &CatalogConfig, paths: Vec<PathBuf>) -> Vec<FileRecord> {
    if config.check_contents {
        paths
            .into_par_iter()
            .map(|path| {
                let mut record = FileRecord::from_walk(path, &config.base_dir);
                let identity = hasher::resolve(
                    &record.path,
                    config.hash_algorithm,
                    config.hash_buffer_size,
                );
                record.set_identity(identity);
                record
            })
            .collect()
    } else {
        paths
            .into_iter()
            .map(|path| {
                let mut record = FileRecord::from_walk(path, &config.base_dir);
                record.load_size();
                record
            })
            .collect()
    }
}

/// Admission under the identity rule: with content checking, a record is
/// already known when an admitted record carries the same (path, checksum)
/// key, both checksums known; without it, when the relative paths match.
/// Unidentified records are never equal to anything and always admit.
fn try_admit(
    config: &CatalogConfig,
    record: &mut FileRecord,
    seen_keys: &mut HashSet<String>,
    seen_paths: &mut HashSet<PathBuf>,
) -> bool {
    if config.check_contents {
        let known = record
            .ensure_checksum(config.hash_algorithm, config.hash_buffer_size)
            .is_some();
        if !known {
            return true;
        }
        let key = record.key();
        if seen_keys.contains(&key) {
            return false;
        }
        seen_keys.insert(key);
        true
    } else {
        if seen_paths.contains(&record.relative_path) {
            return false;
        }
        seen_paths.insert(record.relative_path.clone());
        true
    }
}
