//! The synchronous document pipeline.
//!
//! A [`PautaParser`] compiles every pattern of a [`ParseConfig`] once and
//! then parses any number of documents. It holds no mutable state, so one
//! parser can serve many threads; [`crate::stream::parse_many`] builds one per
//! document instead, keeping each pipeline instance fully independent.

use crate::config::ParseConfig;
use crate::error::PautaError;
use crate::output::{DocumentInfo, OrderRecord, ParseOutput, ParseStats};
use crate::pipeline::fields::{self, FieldExtractor, SERVICE_TYPE_FIELD, SPECIALTY_FIELD};
use crate::pipeline::pages::produce_page_texts;
use crate::pipeline::protocols::ProtocolAssigner;
use crate::pipeline::reader::DocumentSource;
use crate::pipeline::segment::{OrderTextBlock, Segmenter};
use crate::pipeline::tasks::TaskTableParser;
use indexmap::IndexMap;
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct PautaParser {
    config: ParseConfig,
    segmenter: Segmenter,
    fields: FieldExtractor,
    tasks: TaskTableParser,
    protocols: ProtocolAssigner,
}

impl PautaParser {
    /// Compile the configuration. Fails on any pattern that does not compile
    /// or lacks its capture group.
    pub fn new(config: &ParseConfig) -> Result<Self, PautaError> {
        Ok(Self {
            segmenter: Segmenter::new(config)?,
            fields: FieldExtractor::new(&config.field_rules)?,
            tasks: TaskTableParser::new(config.task_table_offset)?,
            protocols: ProtocolAssigner::new(&config.footer_markers)?,
            config: config.clone(),
        })
    }

    /// Build the record of one order from its text block.
    pub fn parse_order(&self, block: &OrderTextBlock) -> OrderRecord {
        let extracted = self.fields.extract(&block.text);
        let table = self.tasks.parse(&block.text);
        let task_count = table.task_count();
        let protocol_sections = self
            .protocols
            .sections(&block.text, self.tasks.offset() + task_count);

        if !extracted.missing.is_empty() {
            debug!(
                "Order {}: {} fields without a match: {}",
                block.order_code,
                extracted.missing.len(),
                extracted.missing.join(", ")
            );
        }

        let specialty_id = fields::specialty_id(extracted.text(SPECIALTY_FIELD));
        let priority = fields::priority(extracted.text(SERVICE_TYPE_FIELD));

        OrderRecord {
            fields: extracted.values,
            tasks: table.rows,
            task_count,
            total_estimated_hours: table.total_hours,
            protocol_sections,
            specialty_id,
            priority,
            observation: String::new(),
            missing_fields: extracted.missing,
        }
    }

    /// Run the whole pipeline over a document.
    pub fn parse_document(&self, source: &dyn DocumentSource) -> ParseOutput {
        let start = Instant::now();
        let total_pages = source.page_count();
        let cb = self.config.progress_callback.as_ref();
        if let Some(cb) = cb {
            cb.on_document_start(total_pages);
        }

        let extraction = produce_page_texts(source, &self.config);
        let blocks = self.segmenter.segment(&extraction.texts);

        let mut orders = IndexMap::with_capacity(blocks.len());
        for block in &blocks {
            let record = self.parse_order(block);
            debug!(
                "Order {}: {} tasks, {} h, {} protocol sections",
                block.order_code,
                record.task_count,
                record.total_estimated_hours,
                record.protocol_sections.len()
            );
            if let Some(cb) = cb {
                cb.on_order_complete(&block.order_code, record.task_count);
            }
            orders.insert(block.order_code.clone(), record);
        }

        let failed_pages = extraction.results.iter().filter(|p| p.error.is_some()).count();
        let text_pages = extraction.texts.len();
        let stats = ParseStats {
            total_pages,
            text_pages,
            empty_pages: total_pages.saturating_sub(text_pages + failed_pages),
            failed_pages,
            order_count: orders.len(),
            task_count: orders.values().map(|o: &OrderRecord| o.task_count).sum(),
            total_duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            "Parsed {} orders ({} tasks) from {}/{} pages in {}ms",
            stats.order_count, stats.task_count, text_pages, total_pages, stats.total_duration_ms
        );
        if let Some(cb) = cb {
            cb.on_document_complete(total_pages, stats.order_count);
        }

        ParseOutput {
            orders,
            pages: extraction.results,
            stats,
        }
    }

    /// Page texts and order codes only, no field extraction.
    pub fn inspect_document(&self, source: &dyn DocumentSource) -> DocumentInfo {
        let extraction = produce_page_texts(source, &self.config);
        let blocks = self.segmenter.segment(&extraction.texts);
        DocumentInfo {
            page_count: source.page_count(),
            text_pages: extraction.texts.len(),
            failed_pages: extraction.results.iter().filter(|p| p.error.is_some()).count(),
            order_codes: blocks.into_iter().map(|b| b.order_code).collect(),
        }
    }

    /// Reconstructed text of every readable page, for debugging templates.
    pub fn page_texts(&self, source: &dyn DocumentSource) -> Vec<(usize, String)> {
        produce_page_texts(source, &self.config)
            .texts
            .into_iter()
            .map(|p| (p.page_index + 1, p.text))
            .collect()
    }
}
