//! Progress-callback trait for per-page and per-order parsing events.
//!
//! Inject an [`Arc<dyn ParseProgressCallback>`] via
//! [`crate::config::ParseConfigBuilder::progress_callback`] to receive
//! events while a document is parsed.
//!
//! # Example
//!
//! ```rust
//! use pauta_extract::{ParseConfig, ParseProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct OrderCounter {
//!     orders: AtomicUsize,
//! }
//!
//! impl ParseProgressCallback for OrderCounter {
//!     fn on_order_complete(&self, order_code: &str, task_count: usize) {
//!         self.orders.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("order {order_code}: {task_count} tasks");
//!     }
//! }
//!
//! let counter = Arc::new(OrderCounter { orders: AtomicUsize::new(0) });
//!
//! let config = ParseConfig::builder()
//!     .progress_callback(counter as Arc<dyn ParseProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the parsing pipeline as it works through a document.
///
/// Implementations must be `Send + Sync`: [`crate::stream::parse_many`]
/// parses several documents at once and shares one config (and therefore one
/// callback) between them. All methods have default no-op implementations.
pub trait ParseProgressCallback: Send + Sync {
    /// Called once after the document is opened.
    ///
    /// # Arguments
    /// * `total_pages` — pages the document reader reports
    fn on_document_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called when a page has been reconstructed into text.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — total pages in the document
    /// * `line_count`  — reconstructed lines (0 for a blank page)
    fn on_page_complete(&self, page_num: usize, total_pages: usize, line_count: usize) {
        let _ = (page_num, total_pages, line_count);
    }

    /// Called when a page is skipped because its words could not be read.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once per order after its record is fully built.
    fn on_order_complete(&self, order_code: &str, task_count: usize) {
        let _ = (order_code, task_count);
    }

    /// Called once after every order of the document is built.
    ///
    /// # Arguments
    /// * `total_pages` — pages in the document
    /// * `order_count` — distinct orders found
    fn on_document_complete(&self, total_pages: usize, order_count: usize) {
        let _ = (total_pages, order_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ParseProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ParseConfig`].
pub type ProgressCallback = Arc<dyn ParseProgressCallback>;
