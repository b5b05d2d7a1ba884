//! Document-level entry points.
//!
//! ## Why spawn_blocking?
//!
//! pdfium keeps thread-local state and every pipeline stage is CPU-bound, so
//! a whole document is parsed on tokio's blocking pool. The async functions
//! here only validate input on the calling task and await the blocking job.
//! Use [`crate::stream::parse_many`] to parse several documents with bounded
//! concurrency.

use crate::config::ParseConfig;
use crate::error::PautaError;
use crate::output::{DocumentInfo, ParseOutput, ParseStats};
use crate::parser::PautaParser;
use crate::pipeline::input::{self, ResolvedInput};
use crate::pipeline::reader::{with_pdf_document, DocumentSource, WordDocument};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Parse a PDF or JSON word dump into order records.
///
/// # Returns
/// `Ok(ParseOutput)` even when some pages were unreadable (see
/// `output.stats.failed_pages`).
///
/// # Errors
/// Only for fatal problems: missing or unreadable file, not a PDF, wrong
/// password, pdfium unavailable, or a configuration pattern that does not
/// compile.
pub async fn parse_file(
    path: impl AsRef<Path>,
    config: &ParseConfig,
) -> Result<ParseOutput, PautaError> {
    let path = path.as_ref();
    info!("Starting parse: {}", path.display());
    let resolved = input::resolve_input(path)?;
    let config = config.clone();

    tokio::task::spawn_blocking(move || parse_resolved(&resolved, &config))
        .await
        .map_err(|e| PautaError::Internal(format!("Parse task panicked: {}", e)))?
}

/// Synchronous wrapper around [`parse_file`].
///
/// Creates a temporary tokio runtime internally; do not call it from inside
/// an async context.
pub fn parse_sync(
    path: impl AsRef<Path>,
    config: &ParseConfig,
) -> Result<ParseOutput, PautaError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PautaError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(parse_file(path, config))
}

/// Parse an in-memory document on the current thread.
pub fn parse_source(
    source: &dyn DocumentSource,
    config: &ParseConfig,
) -> Result<ParseOutput, PautaError> {
    Ok(PautaParser::new(config)?.parse_document(source))
}

/// Parse a document and write its orders as pretty JSON.
///
/// Uses atomic write (temp file + rename) so readers never see a partial
/// file. With `summary` set, the typed [`crate::output::OrderSummary`] map is written
/// instead of the full records.
pub async fn parse_to_file(
    path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ParseConfig,
    summary: bool,
) -> Result<ParseStats, PautaError> {
    let output = parse_file(path, config).await?;
    let out = output_path.as_ref();
    if summary {
        write_json_atomic(out, &output.summaries()).await?;
    } else {
        write_json_atomic(out, &output.orders).await?;
    }
    Ok(output.stats)
}

/// Page count and order codes of a document, without field extraction.
pub async fn inspect(
    path: impl AsRef<Path>,
    config: &ParseConfig,
) -> Result<DocumentInfo, PautaError> {
    let resolved = input::resolve_input(path.as_ref())?;
    let config = config.clone();
    tokio::task::spawn_blocking(move || {
        let parser = PautaParser::new(&config)?;
        with_source(&resolved, &config, |source| parser.inspect_document(source))
    })
    .await
    .map_err(|e| PautaError::Internal(format!("Inspect task panicked: {}", e)))?
}

/// Reconstructed text of every readable page as `(page_num, text)`.
pub async fn page_texts(
    path: impl AsRef<Path>,
    config: &ParseConfig,
) -> Result<Vec<(usize, String)>, PautaError> {
    let resolved = input::resolve_input(path.as_ref())?;
    let config = config.clone();
    tokio::task::spawn_blocking(move || {
        let parser = PautaParser::new(&config)?;
        with_source(&resolved, &config, |source| parser.page_texts(source))
    })
    .await
    .map_err(|e| PautaError::Internal(format!("Text task panicked: {}", e)))?
}

/// Serialise `value` as pretty JSON to `path`, atomically.
pub async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), PautaError> {
    let write_err = |source: std::io::Error| PautaError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let json = serde_json::to_vec_pretty(value)
        .map_err(|e| PautaError::Internal(format!("JSON serialisation failed: {e}")))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &json).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Blocking body shared by the async entry points.
pub(crate) fn parse_resolved(
    resolved: &ResolvedInput,
    config: &ParseConfig,
) -> Result<ParseOutput, PautaError> {
    let parser = PautaParser::new(config)?;
    let output = with_source(resolved, config, |source| parser.parse_document(source))?;
    info!(
        "Parse complete: {}: {} orders, {} failed pages",
        resolved.path().display(),
        output.stats.order_count,
        output.stats.failed_pages
    );
    Ok(output)
}

/// Open the resolved input and run `f` over it.
fn with_source<R>(
    resolved: &ResolvedInput,
    config: &ParseConfig,
    f: impl FnOnce(&dyn DocumentSource) -> R,
) -> Result<R, PautaError> {
    match resolved {
        ResolvedInput::WordDump(path) => {
            let doc = WordDocument::from_json_file(path)?;
            Ok(f(&doc))
        }
        ResolvedInput::Pdf(path) => with_pdf_document(
            path,
            config.password.as_deref(),
            config.pdfium_lib_path.as_deref(),
            f,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::reader::PositionedWord;

    fn dump(dir: &Path) -> std::path::PathBuf {
        let words = vec![
            PositionedWord::new("Número", 10.0, 10.0, 50.0, 20.0),
            PositionedWord::new("orden", 55.0, 10.0, 80.0, 20.0),
            PositionedWord::new("42", 85.0, 10.0, 95.0, 20.0),
        ];
        let path = dir.join("words.json");
        std::fs::write(&path, serde_json::to_string(&WordDocument::new(vec![words])).unwrap())
            .unwrap();
        path
    }

    #[test]
    fn parse_file_reads_word_dumps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dump(dir.path());
        let output = tokio_test::block_on(parse_file(&path, &ParseConfig::default())).unwrap();
        assert_eq!(output.orders.keys().collect::<Vec<_>>(), vec!["42"]);
        assert_eq!(output.stats.text_pages, 1);
    }

    #[test]
    fn parse_to_file_writes_json_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let input = dump(dir.path());
        let out = dir.path().join("nested/orders.json");
        let stats =
            tokio_test::block_on(parse_to_file(&input, &out, &ParseConfig::default(), false))
                .unwrap();
        assert_eq!(stats.order_count, 1);
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(json["42"]["Numero orden"], "42");
        assert!(!out.with_extension("json.tmp").exists());
    }

    #[test]
    fn missing_input_is_fatal() {
        let err = tokio_test::block_on(parse_file("/no/such.pdf", &ParseConfig::default()))
            .unwrap_err();
        assert!(matches!(err, PautaError::FileNotFound { .. }));
    }
}
