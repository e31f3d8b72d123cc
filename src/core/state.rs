//! # Prompt State
//!
//! The mutable record behind one prompt. Owned by exactly one controller,
//! never shared across prompts.
//!
//! ```text
//! PromptState
//! ├── kind / name / message       // identity + question text
//! ├── header / footer / hint      // decoration around the prompt line
//! ├── error: Option<String>       // inline validation message
//! ├── input + cursor              // edit buffer (cursor is a char index)
//! ├── index                       // focused choice (list prompts)
//! ├── submitted | cancelled       // terminal, one-way, mutually exclusive
//! ├── validating                  // submit in flight
//! ├── buffer + rows_below         // last paint, for the renderer's erase step
//! ├── required: BTreeSet<String>  // fields that must be non-empty
//! └── timers: BTreeMap            // latest tick snapshot per named timer
//! ```
//!
//! `status()` is derived. Nothing sets it directly.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::core::editable::Editable;
use crate::core::timer::TimerSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Submitted,
    Cancelled,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PromptState {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub message: String,
    pub header: String,
    pub footer: String,
    pub error: Option<String>,
    pub hint: Option<String>,
    /// What `reset`/`next` restore the edit buffer to.
    pub initial: String,
    pub input: String,
    pub cursor: usize,
    pub index: usize,
    pub validating: bool,
    pub required: BTreeSet<String>,
    pub timers: BTreeMap<String, TimerSnapshot>,
    #[serde(skip)]
    pub buffer: String,
    /// Rows between the caret and the bottom of the last paint.
    #[serde(skip)]
    pub rows_below: usize,
    #[serde(skip)]
    pub clipboard: Vec<String>,
    #[serde(skip)]
    pub prev_cursor: Option<usize>,
    #[serde(skip)]
    pub keypressed: bool,
    submitted: bool,
    cancelled: bool,
    #[serde(skip)]
    closed: bool,
}

impl PromptState {
    pub fn new(kind: &str, name: &str, message: &str) -> Self {
        Self {
            kind: kind.to_string(),
            name: name.to_string(),
            message: message.to_string(),
            ..Default::default()
        }
    }

    pub fn status(&self) -> Status {
        if self.submitted {
            Status::Submitted
        } else if self.cancelled {
            Status::Cancelled
        } else {
            Status::Pending
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status() == Status::Pending
    }

    pub fn submitted(&self) -> bool {
        self.submitted
    }

    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    /// Move to `submitted`. Returns false if a terminal state was already reached.
    pub fn mark_submitted(&mut self) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.validating = false;
        self.submitted = true;
        true
    }

    /// Move to `cancelled`. Returns false if a terminal state was already reached.
    pub fn mark_cancelled(&mut self) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.validating = false;
        self.cancelled = true;
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Returns true the first time only.
    pub fn close(&mut self) -> bool {
        !std::mem::replace(&mut self.closed, true)
    }

    /// Restore the edit buffer to `initial`, caret at the end.
    pub fn reset_input(&mut self) {
        let initial = self.initial.clone();
        let cursor = initial.chars().count();
        self.set_text(initial, cursor);
    }
}

impl Editable for PromptState {
    fn text(&self) -> &str {
        &self.input
    }

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn set_text(&mut self, text: String, cursor: usize) {
        self.cursor = cursor.min(text.chars().count());
        self.input = text;
    }
}
