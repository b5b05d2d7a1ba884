//! Page text production: one text blob per readable, non-empty page.
//!
//! Every page goes through [`crate::pipeline::lines::reconstruct_lines`] and
//! its lines are joined with `\n`. A page whose words cannot be read, or whose
//! geometry is broken, is recorded in its [`PageResult`] and skipped; it never
//! aborts the document.

use crate::config::ParseConfig;
use crate::output::PageResult;
use crate::pipeline::lines::reconstruct_lines;
use crate::pipeline::reader::DocumentSource;
use tracing::{debug, warn};

/// The reconstructed text of one page. `text` is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    /// 0-based page index in the source document.
    pub page_index: usize,
    pub text: String,
}

/// Text pages plus one [`PageResult`] per page of the document.
#[derive(Debug, Default)]
pub struct PageExtraction {
    pub texts: Vec<PageText>,
    pub results: Vec<PageResult>,
}

/// Reconstruct every page of `source`, in document order.
pub fn produce_page_texts(source: &dyn DocumentSource, config: &ParseConfig) -> PageExtraction {
    let total = source.page_count();
    let mut out = PageExtraction::default();

    for page_index in 0..total {
        let page_num = page_index + 1;
        let lines = source
            .page_words(page_index)
            .and_then(|words| reconstruct_lines(&words, config.y_tolerance, config.word_gap));

        match lines {
            Ok(lines) => {
                let text = lines.join("\n");
                debug!("Page {}/{}: {} lines", page_num, total, lines.len());
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_complete(page_num, total, lines.len());
                }
                out.results.push(PageResult {
                    page_num,
                    line_count: lines.len(),
                    char_count: text.chars().count(),
                    error: None,
                });
                if !text.is_empty() {
                    out.texts.push(PageText { page_index, text });
                }
            }
            Err(e) => {
                warn!("Skipping page {}/{}: {}", page_num, total, e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_error(page_num, total, &e.to_string());
                }
                out.results.push(PageResult {
                    page_num,
                    line_count: 0,
                    char_count: 0,
                    error: Some(e),
                });
            }
        }
    }
    out
}
