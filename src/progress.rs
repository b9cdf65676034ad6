//! Progress-callback trait for per-page extraction and render events.
//!
//! Inject an [`Arc<dyn ReflowProgressCallback>`] via
//! [`crate::config::ReflowConfigBuilder::progress_callback`] to receive
//! events as the pipeline walks the document. The library keeps no progress
//! state of its own; the callback owns whatever it needs.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdfedit::{ReflowConfig, ReflowProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter {
//!     pages: AtomicUsize,
//! }
//!
//! impl ReflowProgressCallback for PageCounter {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, block_count: usize) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{}: {} blocks", page_num, total_pages, block_count);
//!     }
//! }
//!
//! let counter = Arc::new(PageCounter { pages: AtomicUsize::new(0) });
//! let config = ReflowConfig::builder()
//!     .progress_callback(counter as Arc<dyn ReflowProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync` because the
/// async wrappers run the pipeline on a blocking worker thread.
pub trait ReflowProgressCallback: Send + Sync {
    /// Called once after the input is opened, before any page is extracted.
    fn on_extraction_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called before a page is extracted (1-indexed).
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page produced its blocks.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — total pages
    /// * `block_count` — number of text blocks found on the page
    fn on_page_complete(&self, page_num: usize, total_pages: usize, block_count: usize) {
        let _ = (page_num, total_pages, block_count);
    }

    /// Called when a page could not be read and was kept empty.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after every page has been attempted.
    ///
    /// # Arguments
    /// * `total_pages`     — pages in the document
    /// * `pages_with_text` — pages that yielded at least one block
    fn on_extraction_complete(&self, total_pages: usize, pages_with_text: usize) {
        let _ = (total_pages, pages_with_text);
    }

    /// Called after the output PDF has been serialised.
    fn on_render_complete(&self, total_pages: usize, byte_len: usize) {
        let _ = (total_pages, byte_len);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ReflowProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ReflowConfig`].
pub type ProgressCallback = Arc<dyn ReflowProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        started_total: AtomicUsize,
        completes: AtomicUsize,
        blocks: AtomicUsize,
        errors: AtomicUsize,
        with_text: AtomicUsize,
    }

    impl ReflowProgressCallback for TrackingCallback {
        fn on_extraction_start(&self, total_pages: usize) {
            self.started_total.store(total_pages, Ordering::SeqCst);
        }

        fn on_page_complete(&self, _page_num: usize, _total_pages: usize, block_count: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
            self.blocks.fetch_add(block_count, Ordering::SeqCst);
        }

        fn on_page_error(&self, _page_num: usize, _total_pages: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_extraction_complete(&self, _total_pages: usize, pages_with_text: usize) {
            self.with_text.store(pages_with_text, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_extraction_start(5);
        cb.on_page_start(1, 5);
        cb.on_page_complete(1, 5, 12);
        cb.on_page_error(2, 5, "unreadable");
        cb.on_extraction_complete(5, 4);
        cb.on_render_complete(5, 2048);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_extraction_start(3);
        tracker.on_page_complete(1, 3, 4);
        tracker.on_page_complete(2, 3, 6);
        tracker.on_page_error(3, 3, "text layer unreadable");
        tracker.on_extraction_complete(3, 2);

        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.blocks.load(Ordering::SeqCst), 10);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.with_text.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_extraction_start(10);
        cb.on_page_complete(1, 10, 3);
    }
}
