//! Callback traits for watermarking and compression-download events.
//!
//! Inject an `Arc<dyn …>` to receive events as an operation runs. Callers
//! can forward them to a terminal progress bar, a log, or a UI notification
//! area without the library knowing how the host presents them. Every
//! method has a default no-op body so implementors override only what they
//! care about.
//!
//! # Example
//!
//! ```rust
//! use docstamp::{WatermarkConfig, WatermarkProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Counter(AtomicUsize);
//!
//! impl WatermarkProgressCallback for Counter {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("stamped {page_num}/{total_pages}");
//!     }
//! }
//!
//! let config = WatermarkConfig::builder()
//!     .progress_callback(Arc::new(Counter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use crate::compression::JobHandle;
use std::sync::Arc;

/// Called by the watermark pipeline as it processes each page.
///
/// Pages are handled strictly one after another on a blocking worker
/// thread, so events arrive in page order but not on the caller's thread.
pub trait WatermarkProgressCallback: Send + Sync {
    /// Called once after the document is opened.
    ///
    /// # Arguments
    /// * `total_pages` — number of pages that will be stamped
    fn on_document_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called after a page has been rendered, stamped and embedded.
    fn on_page_complete(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page is skipped because it failed.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after every selected page has been attempted.
    fn on_document_complete(&self, total_pages: usize, stamped: usize) {
        let _ = (total_pages, stamped);
    }
}

/// Receives events from the compression start / poll / download flow.
///
/// The `on_not_ready`, `on_timed_out` and `on_rejected` events are the
/// user-facing notices of the flow; a CLI prints them, a service might log
/// them.
pub trait DownloadObserver: Send + Sync {
    /// The server accepted a new compression job.
    fn on_job_started(&self, handle: &JobHandle) {
        let _ = handle;
    }

    /// A status poll finished. Failed polls report `(0.0, false)`.
    fn on_progress(&self, progress: f64, is_completed: bool) {
        let _ = (progress, is_completed);
    }

    /// A status poll could not be answered; the job state is unknown.
    fn on_probe_failed(&self, reason: &str) {
        let _ = reason;
    }

    /// The job is not finished yet; the flow will keep checking.
    fn on_not_ready(&self, handle: &JobHandle) {
        let _ = handle;
    }

    /// A re-poll is about to be issued (`attempt` is 1-based).
    fn on_retry(&self, attempt: u32, max_retries: u32) {
        let _ = (attempt, max_retries);
    }

    /// The job did not finish within the re-poll cap.
    fn on_timed_out(&self, attempts: u32) {
        let _ = attempts;
    }

    /// The server refused to start the job or to hand out the file.
    fn on_rejected(&self, message: &str) {
        let _ = message;
    }

    /// The archive was received.
    fn on_downloaded(&self, filename: &str, bytes: usize) {
        let _ = (filename, bytes);
    }
}

/// A no-op implementation for callers that don't need events.
pub struct NoopProgressCallback;

impl WatermarkProgressCallback for NoopProgressCallback {}
impl DownloadObserver for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::WatermarkConfig`].
pub type WatermarkCallback = Arc<dyn WatermarkProgressCallback>;
