//! Document readers: everything that turns a source document into
//! [`PositionedWord`]s, one list per page.
//!
//! The pipeline only ever talks to the [`DocumentSource`] trait. Two readers
//! ship with the crate:
//!
//! * [`WordDocument`] — words already extracted by some upstream tool, held
//!   in memory or loaded from a JSON word dump.
//! * [`with_pdf_document`] — opens a PDF through pdfium and exposes its pages
//!   as a `DocumentSource` for the duration of a closure.
//!
//! ## Why a closure instead of returning the PDF reader?
//!
//! `pdfium-render` documents borrow the `Pdfium` bindings they were loaded
//! from. Handing both back to the caller would need a self-referential
//! struct; scoping the document to a closure keeps the borrow local and
//! guarantees the document is closed before the bindings are dropped.

use crate::error::{PageError, PautaError};
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One word token with its bounding box, top-left origin (y grows downward).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedWord {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub text: String,
    #[serde(default)]
    pub page_index: usize,
    #[serde(default)]
    pub block_index: usize,
    #[serde(default)]
    pub line_index: usize,
    #[serde(default)]
    pub word_index: usize,
}

impl PositionedWord {
    /// A word on page 0 with zeroed block/line/word indices.
    pub fn new(text: impl Into<String>, x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x0,
            y0,
            x1,
            y1,
            text: text.into(),
            page_index: 0,
            block_index: 0,
            line_index: 0,
            word_index: 0,
        }
    }

    /// Vertical centre of the bounding box.
    pub fn y_center(&self) -> f64 {
        (self.y0 + self.y1) / 2.0
    }

    pub fn is_finite(&self) -> bool {
        self.x0.is_finite() && self.y0.is_finite() && self.x1.is_finite() && self.y1.is_finite()
    }
}

/// A document that yields positioned words page by page.
///
/// A page that cannot be read returns a [`PageError`]; the pipeline skips it
/// and moves on to the next page.
pub trait DocumentSource {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Words of the page at 0-based `page_index`, in any order.
    fn page_words(&self, page_index: usize) -> Result<Vec<PositionedWord>, PageError>;
}

// ── In-memory / JSON word dumps ──────────────────────────────────────────

/// Pages of words that were extracted ahead of time.
///
/// The JSON form is `{"pages": [[{"x0": .., "y0": .., "x1": .., "y1": ..,
/// "text": ".."}, ..], ..]}`; index fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WordDocument {
    pub pages: Vec<Vec<PositionedWord>>,
}

impl WordDocument {
    pub fn new(pages: Vec<Vec<PositionedWord>>) -> Self {
        Self { pages }
    }

    /// Load a JSON word dump from disk.
    pub fn from_json_file(path: &Path) -> Result<Self, PautaError> {
        let raw = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PautaError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => PautaError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => PautaError::InvalidWordDump {
                path: path.to_path_buf(),
                detail: e.to_string(),
            },
        })?;
        let doc: Self = serde_json::from_str(&raw).map_err(|e| PautaError::InvalidWordDump {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        debug!("Loaded word dump {} ({} pages)", path.display(), doc.pages.len());
        Ok(doc)
    }
}

impl DocumentSource for WordDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_words(&self, page_index: usize) -> Result<Vec<PositionedWord>, PageError> {
        self.pages
            .get(page_index)
            .cloned()
            .ok_or_else(|| PageError::ExtractionFailed {
                page: page_index + 1,
                detail: format!("page out of range (document has {} pages)", self.pages.len()),
            })
    }
}

// ── PDF via pdfium ───────────────────────────────────────────────────────

/// Bind the pdfium library: explicit path, then `PDFIUM_LIB_PATH`, then the
/// system library.
pub fn bind_pdfium(explicit: Option<&Path>) -> Result<Pdfium, PautaError> {
    let from_env = std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from);
    let bindings = match explicit.map(Path::to_path_buf).or(from_env) {
        Some(path) => {
            // A directory means "the platform library inside it".
            let lib = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            debug!("Binding pdfium from {}", lib.display());
            Pdfium::bind_to_library(&lib)
        }
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| PautaError::PdfiumBindingFailed(format!("{e:?}")))?;
    Ok(Pdfium::new(bindings))
}

/// A pdfium document seen through [`DocumentSource`].
struct PdfiumSource<'a> {
    document: PdfDocument<'a>,
}

impl DocumentSource for PdfiumSource<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_words(&self, page_index: usize) -> Result<Vec<PositionedWord>, PageError> {
        let failed = |detail: String| PageError::ExtractionFailed {
            page: page_index + 1,
            detail,
        };
        let index = PdfPageIndex::try_from(page_index)
            .map_err(|_| failed(format!("page index {page_index} exceeds pdfium's range")))?;
        let page = self
            .document
            .pages()
            .get(index)
            .map_err(|e| failed(format!("{e:?}")))?;
        let text = page.text().map_err(|e| failed(format!("{e:?}")))?;

        let mut builder = WordBuilder::new(page_index, page.height().value as f64);
        for ch in text.chars().iter() {
            let Some(c) = ch.unicode_char() else {
                continue;
            };
            if c == '\n' || c == '\r' {
                builder.end_line();
                continue;
            }
            if c.is_whitespace() {
                builder.end_word();
                continue;
            }
            let bounds = ch.loose_bounds().map_err(|e| failed(format!("{e:?}")))?;
            builder.push_char(
                c,
                bounds.left().value as f64,
                bounds.top().value as f64,
                bounds.right().value as f64,
                bounds.bottom().value as f64,
            );
        }
        Ok(builder.finish())
    }
}

/// Assemble pdfium characters into words.
///
/// pdfium reports characters in content-stream order with a bottom-left
/// origin; words end at whitespace, at line breaks, or when the next
/// character jumps backwards on the page.
struct WordBuilder {
    page_index: usize,
    page_height: f64,
    line_index: usize,
    word_index: usize,
    words: Vec<PositionedWord>,
    current: Option<PositionedWord>,
}

impl WordBuilder {
    fn new(page_index: usize, page_height: f64) -> Self {
        Self {
            page_index,
            page_height,
            line_index: 0,
            word_index: 0,
            words: Vec::new(),
            current: None,
        }
    }

    fn push_char(&mut self, c: char, left: f64, top: f64, right: f64, bottom: f64) {
        let (y0, y1) = (self.page_height - top, self.page_height - bottom);
        if let Some(word) = &self.current {
            if left + 0.5 < word.x0 {
                self.end_word();
            }
        }
        match &mut self.current {
            Some(word) => {
                word.text.push(c);
                word.x0 = word.x0.min(left);
                word.x1 = word.x1.max(right);
                word.y0 = word.y0.min(y0);
                word.y1 = word.y1.max(y1);
            }
            None => {
                self.current = Some(PositionedWord {
                    x0: left,
                    y0,
                    x1: right,
                    y1,
                    text: c.to_string(),
                    page_index: self.page_index,
                    block_index: 0,
                    line_index: self.line_index,
                    word_index: self.word_index,
                });
            }
        }
    }

    fn end_word(&mut self) {
        if let Some(word) = self.current.take() {
            self.words.push(word);
            self.word_index += 1;
        }
    }

    fn end_line(&mut self) {
        self.end_word();
        self.line_index += 1;
        self.word_index = 0;
    }

    fn finish(mut self) -> Vec<PositionedWord> {
        self.end_word();
        self.words
    }
}

/// Open a PDF and run `f` with it as a [`DocumentSource`].
///
/// Opening failures are fatal and mapped to typed errors; page-level failures
/// surface later through [`DocumentSource::page_words`].
pub fn with_pdf_document<R>(
    pdf_path: &Path,
    password: Option<&str>,
    pdfium_lib: Option<&Path>,
    f: impl FnOnce(&dyn DocumentSource) -> R,
) -> Result<R, PautaError> {
    let pdfium = bind_pdfium(pdfium_lib)?;

    let document = pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                PautaError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                PautaError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            PautaError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })?;

    let source = PdfiumSource { document };
    info!("PDF loaded: {} pages", source.page_count());
    Ok(f(&source))
}
