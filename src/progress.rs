//! Progress-callback trait for conversion stage events.
//!
//! The pipeline is a short, sequential chain (upload → OCR → assemble), so
//! progress is reported per stage rather than per work item. Inject an
//! [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::OcrConfigBuilder::progress_callback`] to receive events;
//! the CLI uses this to drive its spinner, and host applications can forward
//! events to whatever channel they like without the library knowing about it.
//!
//! All methods have default no-op implementations so callers only override
//! what they care about.

use std::sync::Arc;

/// Called by the conversion pipeline as it moves through its stages.
///
/// Implementations must be `Send + Sync`; conversions may run on any Tokio
/// worker thread.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once the input has been resolved, before the upload begins.
    fn on_upload_start(&self, file_name: &str, size_bytes: usize) {
        let _ = (file_name, size_bytes);
    }

    /// Called after the provider accepted the upload.
    fn on_upload_complete(&self, file_id: &str) {
        let _ = file_id;
    }

    /// Called just before the OCR request is sent.
    fn on_ocr_start(&self, model: &str) {
        let _ = model;
    }

    /// Called when the OCR response arrived.
    fn on_ocr_complete(&self, page_count: usize) {
        let _ = page_count;
    }

    /// Called for each page as its placeholders are resolved.
    fn on_page_assembled(&self, page_num: usize, total_pages: usize, markdown_len: usize) {
        let _ = (page_num, total_pages, markdown_len);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::OcrConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        uploads: AtomicUsize,
        ocr_pages: AtomicUsize,
        assembled: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_upload_complete(&self, _file_id: &str) {
            self.uploads.fetch_add(1, Ordering::SeqCst);
        }

        fn on_ocr_complete(&self, page_count: usize) {
            self.ocr_pages.store(page_count, Ordering::SeqCst);
        }

        fn on_page_assembled(&self, _page_num: usize, _total: usize, _len: usize) {
            self.assembled.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_upload_start("scan.pdf", 1024);
        cb.on_upload_complete("file-1");
        cb.on_ocr_start("mistral-ocr-latest");
        cb.on_ocr_complete(3);
        cb.on_page_assembled(1, 3, 42);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            uploads: AtomicUsize::new(0),
            ocr_pages: AtomicUsize::new(0),
            assembled: AtomicUsize::new(0),
        };

        tracker.on_upload_start("scan.pdf", 2048);
        tracker.on_upload_complete("file-1");
        tracker.on_ocr_start("mistral-ocr-latest");
        tracker.on_ocr_complete(2);
        tracker.on_page_assembled(1, 2, 100);
        tracker.on_page_assembled(2, 2, 200);

        assert_eq!(tracker.uploads.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.ocr_pages.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.assembled.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn ConversionProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_upload_start("a.png", 10);
        cb.on_ocr_complete(1);
    }
}
