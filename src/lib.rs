//! # pauta-extract
//!
//! Turn maintenance-schedule PDFs ("pautas") into structured work-order
//! records.
//!
//! ## Why this crate?
//!
//! A pauta export carries no markup at all: every page is a cloud of
//! positioned words. The order header, the task table, and the per-task
//! safety protocols are only recognisable by where the words sit and by the
//! fixed labels of the template. This crate rebuilds the reading order from
//! word geometry and then reads each order the way the template lays it out.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / word dump
//!  │
//!  ├─ 1. Input     validate path, %PDF magic or JSON dump
//!  ├─ 2. Reader    positioned words per page (pdfium, spawn_blocking)
//!  ├─ 3. Lines     words → reading-order lines (vertical bands, gap rule)
//!  ├─ 4. Pages     one text blob per readable page
//!  ├─ 5. Segment   pages → one text block per order code
//!  └─ 6. Extract   field table · task table · protocol state machine
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pauta_extract::{parse_file, ParseConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ParseConfig::default();
//!     let output = parse_file("pautas.pdf", &config).await?;
//!     for (code, order) in &output.orders {
//!         println!("{code}: {} tasks, {} h", order.task_count, order.total_estimated_hours);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pauta2json` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pauta-extract = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod parse;
pub mod parser;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ParseConfig, ParseConfigBuilder, DEFAULT_FOOTER_MARKERS, DEFAULT_ORDER_ANCHOR};
pub use error::{PageError, PautaError};
pub use output::{
    DocumentInfo, OrderRecord, OrderSummary, PageResult, ParseOutput, ParseStats,
};
pub use parse::{inspect, page_texts, parse_file, parse_source, parse_sync, parse_to_file};
pub use parser::PautaParser;
pub use pipeline::fields::{default_field_rules, FieldKind, FieldRule, FieldValue};
pub use pipeline::reader::{DocumentSource, PositionedWord, WordDocument};
pub use pipeline::tasks::TaskRow;
pub use progress::{NoopProgressCallback, ParseProgressCallback, ProgressCallback};
pub use stream::{parse_many, DocumentResult, DocumentStream};
