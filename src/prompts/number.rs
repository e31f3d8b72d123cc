//! `number` prompt: typed digits plus up/down stepping.
//!
//! `↑`/`↓` step by one, `shift+↑`/`shift+↓` by ten. Steps that would leave
//! `[min, max]` are rejected with the bell; typed values are range-checked
//! on submit instead.

use serde_json::{Number, Value};

use crate::core::action::{Action, Effect};
use crate::core::editable::Editable;
use crate::core::keymap::KeyEvent;
use crate::core::state::PromptState;
use crate::prompts::text::{caret_column, edit};
use crate::prompts::{
    Answer, PromptCore, PromptError, PromptKind, PromptOptions, Validatable, Validation,
    check_required,
};
use crate::tui::theme::Role;

const MINOR_STEP: f64 = 1.0;
const MAJOR_STEP: f64 = 10.0;

pub struct NumberPrompt {
    min: Option<f64>,
    max: Option<f64>,
    initial: String,
}

/// JSON form of `n`: integral values stay integers.
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        return Value::from(n as i64);
    }
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

fn format_number(n: f64) -> String {
    match number_value(n) {
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl NumberPrompt {
    pub fn new(options: &PromptOptions) -> Result<Self, PromptError> {
        if let (Some(min), Some(max)) = (options.min, options.max) {
            if min > max {
                return Err(PromptError::Config(format!(
                    "number prompt {:?}: min {min} is greater than max {max}",
                    options.name
                )));
            }
        }
        let initial = match &options.initial {
            None | Some(Value::Null) => String::new(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) if s.trim().parse::<f64>().is_ok() => s.trim().to_string(),
            Some(other) => {
                return Err(PromptError::Config(format!(
                    "number prompt {:?}: initial {other} is not a number",
                    options.name
                )));
            }
        };
        Ok(Self {
            min: options.min,
            max: options.max,
            initial,
        })
    }

    fn parsed(&self, state: &PromptState) -> Option<f64> {
        let raw = if state.input.is_empty() {
            &self.initial
        } else {
            &state.input
        };
        raw.parse::<f64>().ok().filter(|n| n.is_finite())
    }

    fn in_range(&self, n: f64) -> bool {
        self.min.is_none_or(|min| n >= min) && self.max.is_none_or(|max| n <= max)
    }

    fn step(&self, state: &mut PromptState, by: f64) -> Effect {
        let next = self.parsed(state).unwrap_or(0.0) + by;
        if !self.in_range(next) {
            return Effect::Alert;
        }
        let text = format_number(next);
        let cursor = text.chars().count();
        state.set_text(text, cursor);
        Effect::Render
    }

    /// Only digits, one leading sign and one decimal point are accepted.
    fn accepts(state: &PromptState, ch: &str) -> bool {
        match ch {
            "-" | "+" => state.cursor == 0 && !state.input.starts_with(['-', '+']),
            "." => !state.input.contains('.'),
            _ => ch.chars().all(|c| c.is_ascii_digit()),
        }
    }
}

impl PromptKind for NumberPrompt {
    fn type_name(&self) -> &'static str {
        "number"
    }

    fn init_state(&self, state: &mut PromptState) {
        state.initial = self.initial.clone();
        state.reset_input();
    }

    fn handle(&mut self, core: &mut PromptCore, action: Option<Action>, key: &KeyEvent) -> Effect {
        let state = &mut core.state;
        match action {
            Some(Action::Up) => self.step(state, MINOR_STEP),
            Some(Action::Down) => self.step(state, -MINOR_STEP),
            Some(Action::ShiftUp) => self.step(state, MAJOR_STEP),
            Some(Action::ShiftDown) => self.step(state, -MAJOR_STEP),
            Some(Action::Reset) => {
                state.reset_input();
                Effect::Render
            }
            Some(Action::Space) => Effect::Alert,
            Some(Action::Number) | None => match key.printable() {
                Some(ch) if Self::accepts(state, ch) => {
                    state.insert(ch);
                    Effect::Render
                }
                _ => Effect::Alert,
            },
            _ => {
                let mut clipboard = std::mem::take(&mut state.clipboard);
                let effect = edit(state, &mut clipboard, action, key);
                state.clipboard = clipboard;
                effect.unwrap_or(Effect::Alert)
            }
        }
    }

    fn value(&self, core: &PromptCore) -> Answer {
        self.parsed(&core.state).map(number_value).unwrap_or(Value::Null)
    }

    fn render_value(&self, core: &PromptCore) -> (String, Option<usize>) {
        let state = &core.state;
        let shown = core.theme.styles.paint(Role::Info, &state.input);
        (shown, Some(caret_column(&state.input, state.cursor)))
    }

    fn validatable(&self) -> Option<&dyn Validatable> {
        Some(self)
    }
}

impl Validatable for NumberPrompt {
    fn check(&self, core: &PromptCore, value: &Answer) -> Validation {
        let required = check_required(core, value);
        if !required.is_valid() {
            return required;
        }
        let typed = !core.state.input.is_empty();
        match value.as_f64() {
            None if typed => Validation::Invalid("Please enter a valid number".to_string()),
            None => Validation::Valid,
            Some(n) => match (self.min, self.max) {
                (Some(min), _) if n < min => {
                    Validation::Invalid(format!("Number must be at least {}", format_number(min)))
                }
                (_, Some(max)) if n > max => {
                    Validation::Invalid(format!("Number must be at most {}", format_number(max)))
                }
                _ => Validation::Valid,
            },
        }
    }
}
