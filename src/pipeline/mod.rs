//! Pipeline stages for pauta-to-record parsing.
//!
//! Each submodule implements exactly one transformation step and is pure
//! apart from [`reader`], which owns the only document I/O.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ reader ──▶ lines ──▶ pages ──▶ segment ──┬──▶ fields
//! (path)   (pdfium)  (words→    (page     (order     ├──▶ tasks ──┐
//!                     lines)     text)     blocks)   └────────────┴──▶ protocols
//! ```
//!
//! 1. [`input`]     — validate the user-supplied path and decide how to read it
//! 2. [`reader`]    — produce positioned words per page (PDF or JSON dump)
//! 3. [`lines`]     — rebuild reading-order lines from word geometry
//! 4. [`pages`]     — one text blob per readable, non-empty page
//! 5. [`segment`]   — group pages into one text block per order code
//! 6. [`fields`]    — ordered anchored-pattern table for scalar fields
//! 7. [`tasks`]     — fixed-offset task table with two row grammars
//! 8. [`protocols`] — state machine assigning safety blocks to tasks

pub mod fields;
pub mod input;
pub mod lines;
pub mod pages;
pub mod protocols;
pub mod reader;
pub mod segment;
pub mod tasks;
