//! Protocol section assignment.
//!
//! After the task table an order lists the protocol text for each task. A
//! section starts at a task heading (`T1`, `T2`, ...) and a safety block
//! (`SEGURIDAD ...`) belongs to the task around it: a safety block printed
//! before a task heading is prepended to that task's section, one printed
//! inside a task stays there.
//!
//! The assignment is an explicit state machine over the lines:
//!
//! | state              | task line               | safety line              | other line     |
//! |--------------------|-------------------------|--------------------------|----------------|
//! | `None`             | start task → `InTask`   | start safety → `InSafety`| discard        |
//! | `InTask`           | flush, start task       | append → `InTaskWithSafety` | append      |
//! | `InTaskWithSafety` | flush, start task → `InTask` | flush, start safety → `InSafety` | append |
//! | `InSafety`         | start task, keep safety → `InTask` | append      | append to safety |
//!
//! Flushing emits `safety + "\n" + task` when a safety block is pending and
//! clears both buffers.

use crate::error::PautaError;
use regex::Regex;

const TASK_ANCHOR: &str = r"(?i)^.{0,2}T\d+";
const SAFETY_ANCHOR: &str = r"(?i)^.{0,2}(?:SEGURIDAD|SGURIDAD)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolState {
    None,
    InTask,
    InTaskWithSafety,
    InSafety,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Task,
    Safety,
    Other,
}

/// Buffers and state of one assignment pass.
#[derive(Debug)]
struct SectionBuilder {
    state: ProtocolState,
    task_buf: String,
    safety_buf: String,
    sections: Vec<String>,
}

fn append(buf: &mut String, line: &str) {
    buf.push('\n');
    buf.push_str(line);
}

impl SectionBuilder {
    fn new() -> Self {
        Self {
            state: ProtocolState::None,
            task_buf: String::new(),
            safety_buf: String::new(),
            sections: Vec::new(),
        }
    }

    fn emit(&mut self, section: String) {
        let trimmed = section.trim();
        if !trimmed.is_empty() {
            self.sections.push(trimmed.to_string());
        }
    }

    /// Emit the open task merged with any pending safety block.
    fn flush_task(&mut self) {
        let task = std::mem::take(&mut self.task_buf);
        let safety = std::mem::take(&mut self.safety_buf);
        let merged = if safety.is_empty() {
            task
        } else {
            format!("{safety}\n{task}")
        };
        self.emit(merged);
    }

    fn step(&mut self, kind: LineKind, line: &str) {
        use LineKind as L;
        use ProtocolState as S;

        self.state = match (self.state, kind) {
            (S::InTask | S::InTaskWithSafety, L::Task) => {
                self.flush_task();
                self.task_buf = line.to_string();
                S::InTask
            }
            (S::None | S::InSafety, L::Task) => {
                self.task_buf = line.to_string();
                S::InTask
            }
            (S::InTask, L::Safety) => {
                append(&mut self.task_buf, line);
                S::InTaskWithSafety
            }
            (S::InTaskWithSafety, L::Safety) => {
                self.flush_task();
                self.safety_buf = line.to_string();
                S::InSafety
            }
            (S::None, L::Safety) => {
                self.safety_buf = line.to_string();
                S::InSafety
            }
            (S::InSafety, L::Safety | L::Other) => {
                append(&mut self.safety_buf, line);
                S::InSafety
            }
            (state @ (S::InTask | S::InTaskWithSafety), L::Other) => {
                append(&mut self.task_buf, line);
                state
            }
            (S::None, L::Other) => S::None,
        };
    }

    fn finish(mut self) -> Vec<String> {
        match self.state {
            ProtocolState::InTask | ProtocolState::InTaskWithSafety => self.flush_task(),
            ProtocolState::InSafety => {
                let safety = std::mem::take(&mut self.safety_buf);
                self.emit(safety);
            }
            ProtocolState::None => {}
        }
        self.sections
    }
}

/// Compiled anchors plus the footer markers that end the protocol text.
#[derive(Debug, Clone)]
pub struct ProtocolAssigner {
    task: Regex,
    safety: Regex,
    footer_markers: Vec<String>,
}

impl ProtocolAssigner {
    pub fn new(footer_markers: &[String]) -> Result<Self, PautaError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|source| PautaError::InvalidPattern {
                field: "protocol anchor".into(),
                source,
            })
        };
        Ok(Self {
            task: compile(TASK_ANCHOR)?,
            safety: compile(SAFETY_ANCHOR)?,
            footer_markers: footer_markers.to_vec(),
        })
    }

    /// Task anchor wins over safety anchor.
    pub fn classify(&self, line: &str) -> LineKind {
        if self.task.is_match(line) {
            LineKind::Task
        } else if self.safety.is_match(line) {
            LineKind::Safety
        } else {
            LineKind::Other
        }
    }

    /// The protocol text: every line from `start_line` on, trimmed and cut at
    /// the earliest footer marker.
    pub fn isolate(&self, text: &str, start_line: usize) -> String {
        let tail = text
            .split('\n')
            .skip(start_line)
            .collect::<Vec<_>>()
            .join("\n");
        let tail = tail.trim();
        let cut = self
            .footer_markers
            .iter()
            .filter_map(|m| tail.find(m.as_str()))
            .min();
        match cut {
            Some(idx) => tail[..idx].trim().to_string(),
            None => tail.to_string(),
        }
    }

    /// Partition already-isolated protocol text into sections.
    pub fn assign(&self, protocol_text: &str) -> Vec<String> {
        let mut builder = SectionBuilder::new();
        for line in protocol_text.split('\n') {
            builder.step(self.classify(line), line);
        }
        builder.finish()
    }

    /// Isolate and assign in one go.
    pub fn sections(&self, order_text: &str, start_line: usize) -> Vec<String> {
        self.assign(&self.isolate(order_text, start_line))
    }
}
