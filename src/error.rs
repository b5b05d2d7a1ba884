//! Error types for the pauta-extract library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PautaError`] — **Fatal**: the document cannot be parsed at all
//!   (missing file, not a PDF, wrong password, pdfium not available, broken
//!   configuration). Returned as `Err(PautaError)` from the top-level
//!   `parse*` functions.
//!
//! * [`PageError`] — **Non-fatal**: a single page could not be turned into
//!   text but every other page is fine. Stored inside
//!   [`crate::output::PageResult`] so one bad page never costs the caller
//!   the orders found on the remaining pages.
//!
//! Field misses, unparsable dates or hours, and a task row that matches no
//! grammar are not errors at all: they fall back to documented defaults.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pauta-extract library.
///
/// Page-level failures use [`PageError`] and are stored in
/// [`crate::output::PageResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum PautaError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// A JSON word dump could not be decoded.
    #[error("Invalid word dump '{path}': {detail}")]
    InvalidWordDump { path: PathBuf, detail: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium (or pass --pdfium-lib) to use a\n\
specific copy, or install libpdfium where the system loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A field rule carries a pattern that does not compile.
    #[error("Invalid pattern for field '{field}': {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output JSON file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// The page is skipped and contributes nothing to any order; parsing of the
/// remaining pages continues.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The document reader could not produce the page's words.
    #[error("Page {page}: text extraction failed: {detail}")]
    ExtractionFailed { page: usize, detail: String },

    /// A word carried a NaN or infinite coordinate.
    #[error("Page {page}: word {word:?} has non-finite geometry")]
    InvalidGeometry { page: usize, word: String },
}

impl PageError {
    /// 1-indexed page number the error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::ExtractionFailed { page, .. } | PageError::InvalidGeometry { page, .. } => {
                *page
            }
        }
    }
}
