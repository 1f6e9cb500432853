use doc_catalog_core::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Mutex;

/// Progress reporter backed by an indicatif spinner.
///
/// Verbose mode prints each newly admitted file above the spinner instead of
/// folding it into the tick message.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
    verbose: bool,
}

impl CliReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            verbose,
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }

    fn spinner(message: &'static str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message(message);
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        pb
    }
}

impl ProgressReporter for CliReporter {
    fn on_load_start(&self) {
        self.set_bar(Self::spinner("Loading existing catalog..."));
    }

    fn on_load_complete(&self, existing_files: usize) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Existing files loaded: {}",
            existing_files
        );
    }

    fn on_walk_start(&self) {
        self.set_bar(Self::spinner("Searching..."));
    }

    fn on_file_admitted(&self, path: &Path) {
        let guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            if self.verbose {
                pb.suspend(|| println!("{}", path.display()));
            } else {
                pb.set_message(format!("Searching... {}", path.display()));
            }
        }
    }

    fn on_walk_complete(&self, new_files: usize, skipped: u64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m New files loaded: {} ({} skipped)",
            new_files, skipped
        );
    }

    fn on_dedupe_complete(&self, duplicates: usize) {
        eprintln!("  \x1b[32m✓\x1b[0m Duplicates flagged: {}", duplicates);
    }

    fn on_export_ready(&self, rows: usize) {
        eprintln!("  \x1b[32m✓\x1b[0m Catalog rows: {}", rows);
    }
}
