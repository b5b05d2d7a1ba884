//! Configuration types for pauta parsing.
//!
//! All parsing behaviour is controlled through [`ParseConfig`], built via its
//! [`ParseConfigBuilder`]. The config is plain data: patterns are kept as
//! strings here and compiled once per document by
//! [`crate::parser::PautaParser`], so two documents parsed at the same time
//! never share compiled state.

use crate::error::PautaError;
use crate::output::RECORD_KEYS;
use crate::pipeline::fields::{default_field_rules, FieldRule};
use crate::progress::ProgressCallback;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

/// Footer phrases that close the printable part of every pauta page.
pub const DEFAULT_FOOTER_MARKERS: [&str; 3] = ["OT Generadas", "Realizado por:", "Firma:"];

/// Order-identifier anchor. The single capture group is the order code.
pub const DEFAULT_ORDER_ANCHOR: &str = r"Número orden (\d+)";

/// Configuration for parsing one or more pauta documents.
///
/// Built via [`ParseConfig::builder()`] or using [`ParseConfig::default()`].
///
/// # Example
/// ```rust
/// use pauta_extract::ParseConfig;
///
/// let config = ParseConfig::builder()
///     .task_table_offset(17)
///     .y_tolerance(5.0)
///     .concurrency(4)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ParseConfig {
    /// Maximum distance between a word's vertical centre and the running
    /// centre of the current line for the word to join it. Default: 5.0.
    pub y_tolerance: f64,

    /// Horizontal gap above which two neighbouring words are separated by a
    /// space. Gaps at or below it glue kerning fragments back together.
    /// Default: 1.0.
    pub word_gap: f64,

    /// 0-based index of the first task-table line inside an order's text.
    /// Default: 17 (the 18th line of the pauta template).
    pub task_table_offset: usize,

    /// Header lines dropped from every continuation page. Default: 3.
    pub continuation_header_lines: usize,

    /// Footer phrases stripped from continuation pages and used to cut the
    /// protocol text.
    pub footer_markers: Vec<String>,

    /// Regex locating the order code on a page; group 1 is the code.
    pub order_anchor: String,

    /// Ordered scalar-field table.
    pub field_rules: Vec<FieldRule>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Explicit pdfium shared library. Falls back to `PDFIUM_LIB_PATH`, then
    /// to the system library.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Documents parsed at the same time by [`crate::stream::parse_many`].
    /// Default: 4.
    pub concurrency: usize,

    /// Optional per-page / per-order progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            y_tolerance: 5.0,
            word_gap: 1.0,
            task_table_offset: 17,
            continuation_header_lines: 3,
            footer_markers: DEFAULT_FOOTER_MARKERS.iter().map(|m| m.to_string()).collect(),
            order_anchor: DEFAULT_ORDER_ANCHOR.to_string(),
            field_rules: default_field_rules(),
            password: None,
            pdfium_lib_path: None,
            concurrency: 4,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ParseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseConfig")
            .field("y_tolerance", &self.y_tolerance)
            .field("word_gap", &self.word_gap)
            .field("task_table_offset", &self.task_table_offset)
            .field("continuation_header_lines", &self.continuation_header_lines)
            .field("footer_markers", &self.footer_markers)
            .field("order_anchor", &self.order_anchor)
            .field("field_rules", &self.field_rules.len())
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("concurrency", &self.concurrency)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ParseProgressCallback>"),
            )
            .finish()
    }
}

impl ParseConfig {
    /// Create a new builder for `ParseConfig`.
    pub fn builder() -> ParseConfigBuilder {
        ParseConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ParseConfig`].
#[derive(Debug)]
pub struct ParseConfigBuilder {
    config: ParseConfig,
}

impl ParseConfigBuilder {
    pub fn y_tolerance(mut self, tolerance: f64) -> Self {
        self.config.y_tolerance = tolerance;
        self
    }

    pub fn word_gap(mut self, gap: f64) -> Self {
        self.config.word_gap = gap;
        self
    }

    pub fn task_table_offset(mut self, offset: usize) -> Self {
        self.config.task_table_offset = offset;
        self
    }

    pub fn continuation_header_lines(mut self, n: usize) -> Self {
        self.config.continuation_header_lines = n;
        self
    }

    pub fn footer_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.footer_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    pub fn order_anchor(mut self, pattern: impl Into<String>) -> Self {
        self.config.order_anchor = pattern.into();
        self
    }

    /// Replace the whole scalar-field table.
    pub fn field_rules(mut self, rules: Vec<FieldRule>) -> Self {
        self.config.field_rules = rules;
        self
    }

    /// Append one rule to the end of the field table.
    pub fn field_rule(mut self, rule: FieldRule) -> Self {
        self.config.field_rules.push(rule);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// Patterns are only checked for shape here (non-empty, unique names);
    /// they are compiled by [`crate::parser::PautaParser::new`].
    pub fn build(self) -> Result<ParseConfig, PautaError> {
        let c = &self.config;
        if !c.y_tolerance.is_finite() || c.y_tolerance < 0.0 {
            return Err(PautaError::InvalidConfig(format!(
                "y_tolerance must be a finite value ≥ 0, got {}",
                c.y_tolerance
            )));
        }
        if !c.word_gap.is_finite() || c.word_gap < 0.0 {
            return Err(PautaError::InvalidConfig(format!(
                "word_gap must be a finite value ≥ 0, got {}",
                c.word_gap
            )));
        }
        if c.concurrency == 0 {
            return Err(PautaError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if c.footer_markers.iter().any(|m| m.is_empty()) {
            return Err(PautaError::InvalidConfig(
                "Footer markers must not be empty strings".into(),
            ));
        }
        if c.order_anchor.is_empty() {
            return Err(PautaError::InvalidConfig("Order anchor must not be empty".into()));
        }

        let mut seen = HashSet::new();
        for rule in &c.field_rules {
            if rule.name.is_empty() {
                return Err(PautaError::InvalidConfig("Field rule without a name".into()));
            }
            if RECORD_KEYS.contains(&rule.name.as_str()) {
                return Err(PautaError::InvalidConfig(format!(
                    "Field rule '{}' collides with an order record key",
                    rule.name
                )));
            }
            if !seen.insert(rule.name.as_str()) {
                return Err(PautaError::InvalidConfig(format!(
                    "Duplicate field rule '{}'",
                    rule.name
                )));
            }
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_pauta_template() {
        let c = ParseConfig::default();
        assert_eq!(c.y_tolerance, 5.0);
        assert_eq!(c.word_gap, 1.0);
        assert_eq!(c.task_table_offset, 17);
        assert_eq!(c.continuation_header_lines, 3);
        assert_eq!(c.footer_markers, vec!["OT Generadas", "Realizado por:", "Firma:"]);
        assert!(!c.field_rules.is_empty());
    }

    #[test]
    fn builder_rejects_negative_tolerance() {
        let err = ParseConfig::builder().y_tolerance(-1.0).build().unwrap_err();
        assert!(matches!(err, PautaError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_nan_gap() {
        assert!(ParseConfig::builder().word_gap(f64::NAN).build().is_err());
    }

    #[test]
    fn builder_rejects_zero_concurrency() {
        let err = ParseConfig::builder().concurrency(0).build().unwrap_err();
        assert!(matches!(err, PautaError::InvalidConfig(_)));
        assert_eq!(ParseConfig::builder().concurrency(1).build().unwrap().concurrency, 1);
    }

    #[test]
    fn builder_rejects_field_named_like_a_record_key() {
        for key in ["Tareas", "Hs Estim", "Protocolos", "Observacion"] {
            let err = ParseConfig::builder()
                .field_rule(FieldRule::text(key, r"x (.+)"))
                .build()
                .unwrap_err();
            assert!(err.to_string().contains("collides"), "{key}: {err}");
        }
    }

    #[test]
    fn builder_rejects_duplicate_field_names() {
        let err = ParseConfig::builder()
            .field_rule(FieldRule::text("Clase", r"Clase (.+?)\n"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Duplicate field rule 'Clase'"), "got: {err}");
    }

    #[test]
    fn debug_redacts_password() {
        let c = ParseConfig::builder().password("s3cret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("s3cret"));
        assert!(dbg.contains("<redacted>"));
    }
}
