//! Order segmentation: page texts → one text block per order code.
//!
//! A pauta order usually fits on one page, but long task lists spill onto
//! continuation pages that repeat the page header and the signature footer.
//! The first page of an order is kept verbatim; every later page carrying the
//! same code loses its footer phrases and its header lines before being
//! appended.

use crate::config::ParseConfig;
use crate::error::PautaError;
use crate::pipeline::pages::PageText;
use indexmap::IndexMap;
use regex::Regex;
use tracing::debug;

/// All text belonging to one order, pages concatenated in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTextBlock {
    pub order_code: String,
    pub text: String,
}

/// Compiled anchor and footer patterns for one pipeline instance.
#[derive(Debug, Clone)]
pub struct Segmenter {
    anchor: Regex,
    /// `None` when no footer markers are configured.
    footer: Option<Regex>,
    header_lines: usize,
}

impl Segmenter {
    pub fn new(config: &ParseConfig) -> Result<Self, PautaError> {
        let anchor =
            Regex::new(&config.order_anchor).map_err(|source| PautaError::InvalidPattern {
                field: "order anchor".into(),
                source,
            })?;
        if anchor.captures_len() < 2 {
            return Err(PautaError::InvalidConfig(format!(
                "Order anchor '{}' needs a capture group for the order code",
                config.order_anchor
            )));
        }

        let footer = if config.footer_markers.is_empty() {
            None
        } else {
            let alternatives: Vec<String> =
                config.footer_markers.iter().map(|m| regex::escape(m)).collect();
            let pattern = format!(r"\n(?:{})", alternatives.join("|"));
            Some(Regex::new(&pattern).map_err(|source| PautaError::InvalidPattern {
                field: "footer markers".into(),
                source,
            })?)
        };

        Ok(Self {
            anchor,
            footer,
            header_lines: config.continuation_header_lines,
        })
    }

    /// Order code of the first anchor match on the page, if any.
    pub fn order_code<'t>(&self, page_text: &'t str) -> Option<&'t str> {
        self.anchor
            .captures(page_text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }

    /// Strip footer phrases (with their preceding newline) and the repeated
    /// header lines from a continuation page.
    pub fn strip_continuation(&self, page_text: &str) -> String {
        let without_footer = match &self.footer {
            Some(re) => re.replace_all(page_text, ""),
            None => page_text.into(),
        };
        without_footer
            .split('\n')
            .skip(self.header_lines)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Group page texts into order blocks, in first-seen order.
    pub fn segment(&self, pages: &[PageText]) -> Vec<OrderTextBlock> {
        let mut blocks: IndexMap<String, String> = IndexMap::new();

        for page in pages {
            let Some(code) = self.order_code(&page.text) else {
                debug!("Page {} has no order anchor", page.page_index + 1);
                continue;
            };
            match blocks.get_mut(code) {
                Some(text) => {
                    debug!("Page {} continues order {}", page.page_index + 1, code);
                    text.push('\n');
                    text.push_str(&self.strip_continuation(&page.text));
                }
                None => {
                    debug!("Page {} starts order {}", page.page_index + 1, code);
                    blocks.insert(code.to_string(), page.text.clone());
                }
            }
        }

        blocks
            .into_iter()
            .map(|(order_code, text)| OrderTextBlock { order_code, text })
            .collect()
    }
}
