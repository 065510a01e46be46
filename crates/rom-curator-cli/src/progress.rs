use indicatif::{ProgressBar, ProgressStyle};
use rom_curator_core::ProgressReporter;
use std::sync::Mutex;

/// CLI progress reporter using indicatif progress bars.
///
/// - Scan phase: spinner (unknown total files upfront)
/// - Fingerprint phase: progress bar (total known from the scan)
/// - Match phase: progress bar
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
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

    fn spinner(&self, message: &'static str) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message(message);
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn counted_bar(&self, template: &str) {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::with_template(template)
                .unwrap()
                .progress_chars("━╸─")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn advance(&self, done: usize, total: usize) {
        let guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            if pb.length() != Some(total as u64) {
                pb.set_length(total as u64);
            }
            pb.set_position(done as u64);
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_scan_start(&self) {
        self.spinner("Scanning files...");
    }

    fn on_scan_progress(&self, files_found: usize, _current_path: &str) {
        let guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            pb.set_message(format!("Scanning... {} files found", files_found));
        }
    }

    fn on_scan_complete(&self, total_files: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Scan complete: {} files in {:.2}s",
            total_files, duration_secs
        );
    }

    fn on_fingerprint_start(&self) {
        self.counted_bar(
            "  {spinner:.cyan} Fingerprinting [{bar:30.cyan/dim}] {pos}/{len} files ({eta} remaining)",
        );
    }

    fn on_fingerprint_progress(&self, files_done: usize, total_files: usize) {
        self.advance(files_done, total_files);
    }

    fn on_fingerprint_complete(&self, fingerprinted: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Fingerprinting complete: {} checksums in {:.2}s",
            fingerprinted, duration_secs
        );
    }

    fn on_match_start(&self, _total_items: usize) {
        self.counted_bar(
            "  {spinner:.cyan} Matching [{bar:30.cyan/dim}] {pos}/{len} items ({eta} remaining)",
        );
    }

    fn on_match_progress(&self, items_matched: usize, total_items: usize) {
        self.advance(items_matched, total_items);
    }

    fn on_match_complete(&self, resolved: usize, unresolved: usize) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Matching complete: {} resolved, {} unresolved",
            resolved, unresolved
        );
    }
}
