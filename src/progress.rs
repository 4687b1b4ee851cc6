//! Progress-callback trait for batch conversion events.
//!
//! Pass an [`Arc<dyn BatchProgressCallback>`] to [`crate::batch::run_batch`]
//! to receive events as each file is converted. The `docconv` binary uses
//! this to drive a terminal progress bar; a server could forward the events
//! to a notification channel instead.
//!
//! # Example
//!
//! ```rust
//! use edgequake_docconv::{BatchProgressCallback, FileOutcome};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Counter {
//!     done: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for Counter {
//!     fn on_file_complete(&self, index: usize, total: usize, outcome: &FileOutcome) {
//!         let done = self.done.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("{}/{} {}", done, total, outcome.file.display());
//!         let _ = index;
//!     }
//! }
//!
//! let progress: Arc<dyn BatchProgressCallback> = Arc::new(Counter {
//!     done: AtomicUsize::new(0),
//! });
//! ```

use crate::batch::FileOutcome;
use std::path::Path;
use std::sync::Arc;

/// Called by the batch runner as it processes each file.
///
/// Files are converted concurrently (up to
/// [`crate::ServerConfig::batch_concurrency`] at a time), so `on_file_start`
/// and `on_file_complete` may be called from different tasks in any order.
/// All methods have default no-op implementations.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after the directory has been enumerated.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called before a file is converted.
    ///
    /// # Arguments
    /// * `index` — 0-based position of the file in enumeration order
    /// * `total` — number of matched files
    /// * `file`  — the input file
    fn on_file_start(&self, index: usize, total: usize, file: &Path) {
        let _ = (index, total, file);
    }

    /// Called after a file has been converted, skipped, or has failed.
    fn on_file_complete(&self, index: usize, total: usize, outcome: &FileOutcome) {
        let _ = (index, total, outcome);
    }

    /// Called once after every file has been attempted.
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopBatchProgress;

impl BatchProgressCallback for NoopBatchProgress {}

/// Shared handle to a progress callback.
pub type BatchProgress = Arc<dyn BatchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::FileStatus;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        started_total: AtomicUsize,
        starts: AtomicUsize,
        successes: AtomicUsize,
        failures: AtomicUsize,
        completed_success: AtomicUsize,
    }

    impl BatchProgressCallback for TrackingCallback {
        fn on_batch_start(&self, total_files: usize) {
            self.started_total.store(total_files, Ordering::SeqCst);
        }

        fn on_file_start(&self, _index: usize, _total: usize, _file: &Path) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_complete(&self, _index: usize, _total: usize, outcome: &FileOutcome) {
            if outcome.status == FileStatus::Succeeded {
                self.successes.fetch_add(1, Ordering::SeqCst);
            } else {
                self.failures.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn on_batch_complete(&self, _total_files: usize, success_count: usize) {
            self.completed_success.store(success_count, Ordering::SeqCst);
        }
    }

    fn outcome(status: FileStatus) -> FileOutcome {
        FileOutcome {
            file: PathBuf::from("a.md"),
            status,
            output_path: None,
            message: String::new(),
            error_kind: None,
            strategy: None,
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopBatchProgress;
        cb.on_batch_start(2);
        cb.on_file_start(0, 2, Path::new("a.md"));
        cb.on_file_complete(0, 2, &outcome(FileStatus::Succeeded));
        cb.on_batch_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_batch_start(3);
        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 3);

        tracker.on_file_start(0, 3, Path::new("a.md"));
        tracker.on_file_complete(0, 3, &outcome(FileStatus::Succeeded));
        tracker.on_file_start(1, 3, Path::new("b.md"));
        tracker.on_file_complete(1, 3, &outcome(FileStatus::Failed));
        tracker.on_file_start(2, 3, Path::new("c.md"));
        tracker.on_file_complete(2, 3, &outcome(FileStatus::Skipped));

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.successes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.failures.load(Ordering::SeqCst), 2);

        tracker.on_batch_complete(3, 1);
        assert_eq!(tracker.completed_success.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: BatchProgress = Arc::new(NoopBatchProgress);
        cb.on_batch_start(10);
        cb.on_file_start(0, 10, Path::new("x.txt"));
    }
}
