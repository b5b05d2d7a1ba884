//! Streaming batch API: parse many documents, emit each as it completes.
//!
//! ## Why stream?
//!
//! A maintenance export is often dozens of PDFs. [`parse_many`] parses up to
//! `config.concurrency` of them at once, each on its own blocking thread with
//! its own [`crate::parser::PautaParser`], and yields results as soon as a
//! document finishes so callers can write files or update progress bars
//! incrementally. Results arrive in completion order, not input order.

use crate::config::ParseConfig;
use crate::error::PautaError;
use crate::output::ParseOutput;
use crate::parse::parse_file;
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// Outcome of one document in a batch.
#[derive(Debug)]
pub struct DocumentResult {
    pub path: PathBuf,
    pub result: Result<ParseOutput, PautaError>,
}

/// A boxed stream of per-document results.
pub type DocumentStream = Pin<Box<dyn Stream<Item = DocumentResult> + Send>>;

/// Parse every path with bounded concurrency.
///
/// A fatal error for one document is reported in its [`DocumentResult`] and
/// does not stop the others.
pub fn parse_many<I, P>(paths: I, config: &ParseConfig) -> DocumentStream
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    let paths: Vec<PathBuf> = paths.into_iter().map(Into::into).collect();
    info!(
        "Starting batch: {} documents, concurrency {}",
        paths.len(),
        config.concurrency
    );
    let concurrency = config.concurrency.max(1);
    let config = config.clone();

    let s = stream::iter(paths.into_iter().map(move |path| {
        let cfg = config.clone();
        async move {
            let result = parse_file(&path, &cfg).await;
            DocumentResult { path, result }
        }
    }))
    .buffer_unordered(concurrency);

    Box::pin(s)
}
