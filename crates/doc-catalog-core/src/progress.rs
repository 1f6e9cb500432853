use std::path::Path;

/// Trait for reporting catalog progress.
///
/// The CLI implements this with indicatif; tests use `SilentReporter`.
/// All methods have default no-op implementations. `on_file_admitted` fires
/// for New records only — existing records never produce per-file output.
pub trait ProgressReporter: Send + Sync {
    fn on_load_start(&self) {}
    fn on_load_complete(&self, _existing_files: usize) {}
    fn on_walk_start(&self) {}
    fn on_file_admitted(&self, _path: &Path) {}
    fn on_walk_complete(&self, _new_files: usize, _skipped: u64) {}
    fn on_dedupe_complete(&self, _duplicates: usize) {}
    fn on_flush(&self, _rows: usize) {}
    fn on_export_ready(&self, _rows: usize) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
