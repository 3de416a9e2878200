//! Progress-callback trait for per-item conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events while a batch runs. Callers can forward them to a progress bar, a
//! channel or a UI; the library does not care how they are rendered.
//!
//! # Example
//!
//! ```rust
//! use heic2jpg::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_item_complete(&self, index: usize, total: usize, output_name: &str, size: u64) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} {} ({} bytes)", index + 1, total, output_name, size);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the orchestrator as it processes each item.
///
/// All methods default to no-ops. Indices are 0-based roster positions.
///
/// # Thread safety
///
/// With `concurrency > 1` the per-item methods may be called from several
/// tasks at once; protect shared state accordingly.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before the first item, only for non-empty rosters.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called just before the codec is invoked for an item.
    fn on_item_start(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called when an item converted successfully.
    ///
    /// * `output_name` — derived artifact name
    /// * `size`        — encoded size in bytes
    fn on_item_complete(&self, index: usize, total: usize, output_name: &str, size: u64) {
        let _ = (index, total, output_name, size);
    }

    /// Called when the codec failed for an item.
    ///
    /// `error` is for diagnostics only; the batch result keeps no per-item
    /// detail.
    fn on_item_error(&self, index: usize, total: usize, name: &str, error: &str) {
        let _ = (index, total, name, error);
    }

    /// Called once after every item has been attempted.
    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
