//! Output types: what a parse returns and how it serialises.
//!
//! [`ParseOutput::orders`] serialises with the column names printed on the
//! pauta itself (`Tareas`, `Hs Estim`, `Protocolos`, ...), which is the shape
//! downstream consumers already store. [`OrderSummary`] is the narrower,
//! typed projection used to create work orders.

use crate::error::PageError;
use crate::pipeline::fields::{parse_date, FieldValue};
use crate::pipeline::tasks::TaskRow;
use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Outcome of reconstructing one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed page number.
    pub page_num: usize,
    pub line_count: usize,
    pub char_count: usize,
    /// Set when the page was skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<PageError>,
}

/// JSON keys an [`OrderRecord`] writes next to its flattened scalar fields.
pub const RECORD_KEYS: [&str; 7] = [
    "Tareas",
    "Numero de Tareas",
    "Hs Estim",
    "Protocolos",
    "Especialidad_id",
    "prioridad",
    "Observacion",
];

/// The structured record of one maintenance order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Scalar fields in table order; `None` serialises as `null`.
    #[serde(flatten)]
    pub fields: IndexMap<String, Option<FieldValue>>,

    #[serde(rename = "Tareas")]
    pub tasks: Vec<TaskRow>,

    #[serde(rename = "Numero de Tareas")]
    pub task_count: usize,

    #[serde(rename = "Hs Estim")]
    pub total_estimated_hours: f64,

    /// Section *i* (1-based) belongs to task *i*.
    #[serde(rename = "Protocolos")]
    pub protocol_sections: Vec<String>,

    #[serde(rename = "Especialidad_id")]
    pub specialty_id: u8,

    #[serde(rename = "prioridad")]
    pub priority: u8,

    /// Free-text observation, always empty on a freshly parsed order.
    #[serde(rename = "Observacion", default)]
    pub observation: String,

    /// Required fields whose pattern did not match.
    #[serde(skip)]
    pub missing_fields: Vec<String>,
}

impl OrderRecord {
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name).and_then(Option::as_ref)
    }
}

/// Aggregate statistics for one parsed document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseStats {
    pub total_pages: usize,
    /// Pages that produced non-empty text.
    pub text_pages: usize,
    pub empty_pages: usize,
    pub failed_pages: usize,
    pub order_count: usize,
    pub task_count: usize,
    pub total_duration_ms: u64,
}

/// The complete result of parsing one document.
#[derive(Debug, Clone, Serialize)]
pub struct ParseOutput {
    /// Orders keyed by code, in first-seen order.
    pub orders: IndexMap<String, OrderRecord>,
    pub pages: Vec<PageResult>,
    pub stats: ParseStats,
}

/// Page and order layout of a document, without field extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub page_count: usize,
    pub text_pages: usize,
    pub failed_pages: usize,
    /// Order codes in first-seen order.
    pub order_codes: Vec<String>,
}

/// Typed projection of an [`OrderRecord`] for work-order creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub code: i64,
    pub fecha_inicial: Option<NaiveDate>,
    pub fecha_vencimiento: Option<NaiveDate>,
    /// `None` when missing or zero.
    pub frecuencia_dias: Option<i64>,
    pub horas_estimadas: f64,
    pub task_number: usize,
    pub prioridad: u8,
    pub speciality: String,
    pub specialty_id: u8,
    pub obs_orden: String,
}

/// Coerce a field into a date, accepting the pauta forms and ISO forms.
fn to_date(value: Option<&FieldValue>) -> Option<NaiveDate> {
    let value = value?;
    value.as_date().or_else(|| {
        let s = value.as_str()?;
        parse_date(s)
            .or_else(|| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .or_else(|| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                    .ok()
                    .map(|dt| dt.date())
            })
    })
}

fn to_frequency(value: Option<&FieldValue>) -> Option<i64> {
    let value = value?;
    let days = match value.as_integer() {
        Some(n) => n,
        None => value.as_str()?.trim().parse().ok()?,
    };
    (days != 0).then_some(days)
}

impl OrderSummary {
    /// Build the summary; `None` when the order code is not numeric.
    pub fn from_record(code: &str, record: &OrderRecord) -> Option<Self> {
        let code: i64 = code.trim().parse().ok()?;
        Some(Self {
            code,
            fecha_inicial: to_date(record.field("F inicial")),
            fecha_vencimiento: to_date(record.field("Fecha Venc.")),
            frecuencia_dias: to_frequency(record.field("Frec. Dias")),
            horas_estimadas: record.total_estimated_hours,
            task_number: record.task_count,
            prioridad: record.priority,
            speciality: record
                .field("Especialidad")
                .map(ToString::to_string)
                .unwrap_or_default(),
            specialty_id: record.specialty_id,
            obs_orden: record.observation.clone(),
        })
    }
}

impl ParseOutput {
    /// Summaries of every order with a numeric code, keyed by that code.
    pub fn summaries(&self) -> IndexMap<i64, OrderSummary> {
        self.orders
            .iter()
            .filter_map(|(code, record)| OrderSummary::from_record(code, record))
            .map(|s| (s.code, s))
            .collect()
    }
}
