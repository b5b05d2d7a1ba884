//! Task table parsing.
//!
//! The table starts at a fixed line of the order text and runs until the
//! first line that matches neither row grammar:
//!
//! ```text
//! full:  <workshop> <sequence> <standard task> <description> <hours> <expected value>
//! short: <workshop> <sequence> <standard task> <description>
//! ```
//!
//! Hours must look like `d.ddd` or `.ddd`; a short row has no hours (0.0) and
//! reuses its description as the expected value.

use crate::error::PautaError;
use regex::Regex;
use serde::{Deserialize, Serialize};

const FULL_ROW: &str =
    r"^([A-ZÁÉÍÓÚÑa-z0-9]+)\s+(\S+)\s+(\d+)\s+(.*)\s+(\d\.\d+|\.\d+)\s+(.+)";
const SHORT_ROW: &str = r"^([A-ZÁÉÍÓÚÑa-z0-9]+)\s+([\d.]+)\s+(\d+)\s+(.+)";

/// One row of the task table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRow {
    /// 1-based position in the table.
    #[serde(rename = "Numero")]
    pub task_number: usize,
    #[serde(rename = "Taller")]
    pub workshop_code: String,
    #[serde(rename = "Numero sec oper")]
    pub operation_sequence: String,
    #[serde(rename = "Tarea Standard")]
    pub standard_task_id: String,
    #[serde(rename = "Descripcion")]
    pub description: String,
    #[serde(rename = "Hs Estim")]
    pub estimated_hours: f64,
    #[serde(rename = "Valor esperado")]
    pub expected_value: String,
}

/// Rows of one order plus their aggregate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskTable {
    pub rows: Vec<TaskRow>,
    /// Sum of row hours rounded to 3 decimals; 0.0 if the sum is not finite.
    pub total_hours: f64,
}

impl TaskTable {
    pub fn task_count(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Clone)]
pub struct TaskTableParser {
    full: Regex,
    short: Regex,
    offset: usize,
}

impl TaskTableParser {
    /// `offset` is the 0-based index of the first table line.
    pub fn new(offset: usize) -> Result<Self, PautaError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|source| PautaError::InvalidPattern {
                field: "task row".into(),
                source,
            })
        };
        Ok(Self {
            full: compile(FULL_ROW)?,
            short: compile(SHORT_ROW)?,
            offset,
        })
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    fn parse_row(&self, line: &str, task_number: usize) -> Option<TaskRow> {
        if let Some(c) = self.full.captures(line) {
            return Some(TaskRow {
                task_number,
                workshop_code: c[1].to_string(),
                operation_sequence: c[2].to_string(),
                standard_task_id: c[3].to_string(),
                description: c[4].to_string(),
                estimated_hours: c[5].parse().unwrap_or(0.0),
                expected_value: c[6].to_string(),
            });
        }
        self.short.captures(line).map(|c| TaskRow {
            task_number,
            workshop_code: c[1].to_string(),
            operation_sequence: c[2].to_string(),
            standard_task_id: c[3].to_string(),
            description: c[4].to_string(),
            estimated_hours: 0.0,
            expected_value: c[4].to_string(),
        })
    }

    /// Parse the table of one order text.
    pub fn parse(&self, text: &str) -> TaskTable {
        let mut rows = Vec::new();
        for line in text.split('\n').skip(self.offset) {
            match self.parse_row(line, rows.len() + 1) {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        let total_hours = round_hours(rows.iter().map(|r| r.estimated_hours).sum());
        TaskTable { rows, total_hours }
    }
}

/// Round to 3 decimals from the exact binary value, so `1.0005` (stored just
/// below the tie) gives `1.0` and an exact tie such as `0.0625` goes to the
/// even digit.
fn round_hours(sum: f64) -> f64 {
    if !sum.is_finite() {
        return 0.0;
    }
    format!("{sum:.3}").parse().unwrap_or(0.0)
}
