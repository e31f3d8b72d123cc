//! # Prompts
//!
//! The Prompt Controller plus every concrete prompt variant.
//!
//! ```text
//!   bytes ──► keypress::decode ──► Keymap::resolve ──► Prompt (controller)
//!                                                       │
//!                              ┌────────────────────────┤ handle(action, key)
//!                              ▼                        │
//!                     dyn PromptKind ── Effect ─────────┘
//!                     (Text, Select, Form, ...)         │
//!                                                       ▼
//!                                         render::paint ──► Terminal
//! ```
//!
//! A variant is a plain struct implementing [`PromptKind`] and only the
//! capabilities it needs: [`Editable`](crate::core::editable::Editable) for
//! typed input, [`Selectable`] for anything backed by a `ChoiceList`,
//! [`Validatable`] for built-in submit checks. The controller owns
//! everything else: ordering, hooks, rendering, lifecycle.
//!
//! ## Variants
//!
//! | type | struct | answer |
//! |------|--------|--------|
//! | `input`, `text`, `password`, `invisible` | [`text::Text`] | string |
//! | `list` | [`text::Text`] | array of strings |
//! | `number` | [`number::NumberPrompt`] | number |
//! | `confirm` | [`boolean::Confirm`] | bool |
//! | `toggle` | [`boolean::Toggle`] | bool |
//! | `select`, `multiselect`, `sort`, `quiz` | [`select::Select`] | value / array / object |
//! | `autocomplete` | [`autocomplete::Autocomplete`] | value |
//! | `form` | [`form::Form`] | object |

pub mod autocomplete;
pub mod boolean;
pub mod controller;
pub mod form;
pub mod number;
pub mod questionnaire;
pub mod select;
pub mod text;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::sync::Arc;
use tokio::time::Instant;

use crate::core::action::{Action, Effect};
use crate::core::choice::{Choice, ChoiceSource};
use crate::core::choice_list::ChoiceList;
use crate::core::keymap::{KeyEvent, KeymapOverrides};
use crate::core::lifecycle::ExitSignal;
use crate::core::state::PromptState;
use crate::core::timer::TimerSpec;
use crate::tui::render::Margin;
use crate::tui::theme::Theme;

pub use controller::Prompt;
pub use questionnaire::{QuestionSpec, Questionnaire};

/// A prompt's final value.
pub type Answer = Value;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum PromptError {
    /// The user cancelled (escape, ctrl+c).
    Cancelled,
    /// The process was told to exit while the prompt was running.
    Terminated(ExitSignal),
    /// The prompt can't be built from its options. Raised before `run()`.
    Config(String),
    Io(io::Error),
    /// The input stream ended before the prompt settled.
    InputClosed,
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::Cancelled => write!(f, "prompt cancelled"),
            PromptError::Terminated(signal) => write!(f, "terminated by {signal}"),
            PromptError::Config(msg) => write!(f, "config error: {msg}"),
            PromptError::Io(e) => write!(f, "terminal I/O error: {e}"),
            PromptError::InputClosed => write!(f, "input closed before the prompt was answered"),
        }
    }
}

impl std::error::Error for PromptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PromptError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for PromptError {
    fn from(e: io::Error) -> Self {
        PromptError::Io(e)
    }
}

impl PromptError {
    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            PromptError::Cancelled => 130,
            PromptError::Terminated(signal) => signal.exit_code(),
            PromptError::Config(_) => 1,
            PromptError::Io(_) | PromptError::InputClosed => 1,
        }
    }
}

// ============================================================================
// Hooks
// ============================================================================

/// Outcome of a validation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    /// Shown inline under the prompt.
    Invalid(String),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }
}

impl From<bool> for Validation {
    fn from(ok: bool) -> Self {
        if ok {
            Validation::Valid
        } else {
            Validation::Invalid("Invalid input".to_string())
        }
    }
}

/// Caller-supplied validation. May suspend (look something up, ask a server).
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, value: &Answer, state: &PromptState) -> Validation;
}

#[async_trait]
impl<F> Validator for F
where
    F: Fn(&Answer, &PromptState) -> Validation + Send + Sync,
{
    async fn validate(&self, value: &Answer, state: &PromptState) -> Validation {
        self(value, state)
    }
}

/// Caller-supplied rewrite of the submitted value.
#[async_trait]
pub trait Transform: Send + Sync {
    async fn transform(&self, value: Answer) -> Answer;
}

#[async_trait]
impl<F> Transform for F
where
    F: Fn(Answer) -> Answer + Send + Sync,
{
    async fn transform(&self, value: Answer) -> Answer {
        self(value)
    }
}

/// `on_submit` / `on_cancel` callback: `(prompt name, current value)`.
#[async_trait]
pub trait Listener: Send + Sync {
    async fn call(&self, name: &str, value: &Answer);
}

#[async_trait]
impl<F> Listener for F
where
    F: Fn(&str, &Answer) + Send + Sync,
{
    async fn call(&self, name: &str, value: &Answer) {
        self(name, value)
    }
}

/// Display text for the submitted value.
pub type FormatFn = Arc<dyn Fn(&Answer, &PromptState) -> String + Send + Sync>;

/// Decides from the answers collected so far whether to skip a prompt.
pub type SkipFn = Arc<dyn Fn(&Answer) -> bool + Send + Sync>;

#[derive(Clone, Default)]
pub struct Hooks {
    pub validate: Option<Arc<dyn Validator>>,
    pub format: Option<FormatFn>,
    pub result: Option<Arc<dyn Transform>>,
    pub on_submit: Option<Arc<dyn Listener>>,
    pub on_cancel: Option<Arc<dyn Listener>>,
    pub skip: Option<SkipFn>,
}

// ============================================================================
// Options
// ============================================================================

/// Everything a prompt can be configured with. Each variant reads the fields
/// it understands and ignores the rest.
#[derive(Default)]
pub struct PromptOptions {
    pub name: String,
    pub message: String,
    pub initial: Option<Answer>,
    pub choices: ChoiceSource,
    pub multiple: bool,
    pub limit: Option<usize>,
    pub max_selected: Option<usize>,
    pub required: bool,
    pub hint: Option<String>,
    pub header: Option<String>,
    pub footer: Option<String>,
    /// `number`: bounds.
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// `quiz`: 0-based index of the right answer.
    pub correct_choice: Option<usize>,
    /// `toggle`: labels for true / false.
    pub enabled: Option<String>,
    pub disabled: Option<String>,
    pub actions: KeymapOverrides,
    pub styles: BTreeMap<String, String>,
    pub symbols: BTreeMap<String, String>,
    pub margin: Margin,
    pub timers: BTreeMap<String, TimerSpec>,
    pub hooks: Hooks,
}

impl PromptOptions {
    pub fn new(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            message: message.to_string(),
            ..Default::default()
        }
    }

    /// `initial` as display text (strings unquoted).
    pub fn initial_text(&self) -> String {
        self.initial.as_ref().map(answer_text).unwrap_or_default()
    }
}

// ============================================================================
// Events
// ============================================================================

/// Lifecycle notifications, tagged with the prompt's name.
#[derive(Debug, Clone)]
pub enum PromptEvent {
    Start { name: String },
    Run { name: String },
    Keypress { name: String, key: KeyEvent },
    State { name: String, state: PromptState },
    Choice { name: String, choice: Choice },
    Alert { name: String },
    Submit { name: String, value: Answer },
    Cancel { name: String },
    Close { name: String },
}

impl PromptEvent {
    pub fn name(&self) -> &str {
        match self {
            PromptEvent::Start { name }
            | PromptEvent::Run { name }
            | PromptEvent::Keypress { name, .. }
            | PromptEvent::State { name, .. }
            | PromptEvent::Choice { name, .. }
            | PromptEvent::Alert { name }
            | PromptEvent::Submit { name, .. }
            | PromptEvent::Cancel { name }
            | PromptEvent::Close { name } => name,
        }
    }

    /// Short label for logs (`"submit"`, `"keypress"`, ...).
    pub fn kind(&self) -> &'static str {
        match self {
            PromptEvent::Start { .. } => "start",
            PromptEvent::Run { .. } => "run",
            PromptEvent::Keypress { .. } => "keypress",
            PromptEvent::State { .. } => "state",
            PromptEvent::Choice { .. } => "choice",
            PromptEvent::Alert { .. } => "alert",
            PromptEvent::Submit { .. } => "submit",
            PromptEvent::Cancel { .. } => "cancel",
            PromptEvent::Close { .. } => "close",
        }
    }
}

// ============================================================================
// Variant capabilities
// ============================================================================

/// What a variant can see and change: its state record and the theme.
pub struct PromptCore {
    pub state: PromptState,
    pub theme: Theme,
}

/// One concrete prompt type.
pub trait PromptKind: Send + Sync {
    fn type_name(&self) -> &'static str;

    /// Hide the terminal caret while this prompt runs.
    fn hides_cursor(&self) -> bool {
        false
    }

    /// Seed the fresh state record (initial text, cursor, focus).
    fn init_state(&self, _state: &mut PromptState) {}

    /// React to one key. `action` is `None` when no keymap tier bound the key.
    /// Submit and cancel never reach here.
    fn handle(&mut self, core: &mut PromptCore, action: Option<Action>, key: &KeyEvent) -> Effect;

    /// The candidate value (what validation sees and what submit returns).
    fn value(&self, core: &PromptCore) -> Answer;

    /// Live value for the prompt line and the caret column inside it.
    fn render_value(&self, core: &PromptCore) -> (String, Option<usize>);

    /// The prompt line's value once submitted.
    fn render_answer(&self, core: &PromptCore, value: &Answer) -> String {
        core.theme.styles.primary(&answer_text(value))
    }

    /// Rows under the prompt line while pending.
    fn body(&self, _core: &PromptCore) -> String {
        String::new()
    }

    /// Final shape of the answer after a successful submit.
    fn result(&self, _core: &PromptCore, value: Answer) -> Answer {
        value
    }

    /// When the variant next wants `expire()` called without a keypress.
    fn deadline(&self) -> Option<Instant> {
        None
    }

    fn expire(&mut self, _core: &mut PromptCore) -> Effect {
        Effect::None
    }

    fn selectable(&self) -> Option<&dyn Selectable> {
        None
    }

    fn selectable_mut(&mut self) -> Option<&mut dyn Selectable> {
        None
    }

    fn validatable(&self) -> Option<&dyn Validatable> {
        None
    }
}

/// Variants backed by a choice list.
pub trait Selectable {
    fn choices(&self) -> &ChoiceList;
    fn choices_mut(&mut self) -> &mut ChoiceList;
}

/// Variants with a built-in submit check (required fields, number ranges).
/// Runs before the caller's own `validate` hook.
pub trait Validatable {
    fn check(&self, core: &PromptCore, value: &Answer) -> Validation;
}

/// Display text for an answer: strings unquoted, arrays comma-joined.
pub fn answer_text(value: &Answer) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(answer_text).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

/// The shared `required` check: a required prompt can't submit an empty answer.
pub fn check_required(core: &PromptCore, value: &Answer) -> Validation {
    let state = &core.state;
    if state.required.contains(&state.name) && is_empty_answer(value) {
        return Validation::Invalid("A value is required".to_string());
    }
    Validation::Valid
}

/// True for `null`, `""`, `[]` and `{}`.
pub fn is_empty_answer(value: &Answer) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
