//! Progress reporting for conversion runs.
//!
//! [`Progress`] is the value the pipeline publishes after each page; the
//! [`ConversionProgressCallback`] trait lets hosts (a terminal progress bar,
//! a GUI, a test recorder) observe a run without the library knowing how the
//! host displays it.
//!
//! # Example
//!
//! ```rust
//! use pdf2img::{ConversionProgressCallback, Progress};
//! use std::sync::Mutex;
//!
//! #[derive(Default)]
//! struct Recorder {
//!     fractions: Mutex<Vec<f64>>,
//! }
//!
//! impl ConversionProgressCallback for Recorder {
//!     fn on_progress(&self, progress: Progress) {
//!         self.fractions.lock().unwrap().push(progress.fraction());
//!     }
//! }
//!
//! let rec = Recorder::default();
//! rec.on_progress(Progress { page: 1, processed: 1, total: 2 });
//! assert_eq!(*rec.fractions.lock().unwrap(), vec![0.5]);
//! ```

use serde::{Deserialize, Serialize};

/// Completed / total pages of one conversion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Page that just completed (0 before the first page).
    pub page: usize,
    /// Pages fully processed so far.
    pub processed: usize,
    /// Pages in the run.
    pub total: usize,
}

impl Progress {
    /// The reset value at the start of a run over `total` pages.
    pub fn start(total: usize) -> Self {
        Self {
            page: 0,
            processed: 0,
            total,
        }
    }

    /// `processed / total`; 0 for an empty run.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.processed as f64 / self.total as f64
        }
    }

    /// Rounded percentage, as shown next to a progress bar.
    pub fn percent(&self) -> u8 {
        (self.fraction() * 100.0).round() as u8
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.processed == self.total
    }
}

/// Called by the conversion pipeline as it processes each page.
///
/// Pages are processed strictly one after another, so events for one run
/// never overlap. All methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before the first page; progress is back at zero.
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page is rendered.
    ///
    /// # Arguments
    /// * `page_num` — 1-indexed page number
    /// * `index`    — 1-indexed position of the page within the run
    /// * `total`    — pages in the run
    fn on_page_start(&self, page_num: usize, index: usize, total: usize) {
        let _ = (page_num, index, total);
    }

    /// Called after a page's entry has been added to the archive.
    fn on_progress(&self, progress: Progress) {
        let _ = progress;
    }

    /// Called once every page is in the archive, before it is finalised.
    fn on_finalizing(&self, entries: usize) {
        let _ = entries;
    }

    /// Called when the run ends, successfully or not.
    fn on_conversion_end(&self, error: Option<&str>) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}
