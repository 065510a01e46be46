/// Trait for reporting scan and match progress.
///
/// The CLI implements this with indicatif bars; tests and embedders that
/// want silence use `SilentReporter`. All methods have default no-op
/// implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self) {}
    fn on_scan_progress(&self, _files_found: usize, _current_path: &str) {}
    fn on_scan_complete(&self, _total_files: usize, _duration_secs: f64) {}
    fn on_fingerprint_start(&self) {}
    fn on_fingerprint_progress(&self, _files_done: usize, _total_files: usize) {}
    fn on_fingerprint_complete(&self, _fingerprinted: usize, _duration_secs: f64) {}
    fn on_match_start(&self, _total_items: usize) {}
    fn on_match_progress(&self, _items_matched: usize, _total_items: usize) {}
    fn on_match_complete(&self, _resolved: usize, _unresolved: usize) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
