//! Free-text prompts: `input`, `password`, `invisible` and `list`.
//!
//! All four share one edit buffer (`PromptState::input`) and the full
//! editing vocabulary from [`Editable`]. They differ only in how the buffer
//! is shown and what the answer looks like.
//!
//! `initial` is a placeholder: shown dimmed while the buffer is empty,
//! submitted when nothing was typed, and completed into the buffer by `tab`.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::core::action::{Action, Effect};
use crate::core::editable::Editable;
use crate::core::keymap::KeyEvent;
use crate::core::state::PromptState;
use crate::prompts::{
    Answer, PromptCore, PromptKind, PromptOptions, Validatable, Validation, check_required,
};
use crate::tui::ansi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMode {
    Plain,
    /// Shown as one mask symbol per char.
    Password,
    /// Nothing shown at all.
    Invisible,
    /// Comma-separated, answered as an array.
    List,
}

pub struct Text {
    mode: TextMode,
    initial: String,
}

fn list_separator() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r", *").expect("list separator regex should compile"))
}

/// Split list input on commas. Empty input is an empty list.
pub fn split_list(input: &str) -> Vec<String> {
    if input.is_empty() {
        return Vec::new();
    }
    list_separator().split(input).map(str::to_string).collect()
}

/// Display columns of the first `cursor` chars of `text`.
pub(crate) fn caret_column(text: &str, cursor: usize) -> usize {
    let before: String = text.chars().take(cursor).collect();
    ansi::display_width(&before)
}

/// The editing actions shared by every prompt with a text buffer.
///
/// Returns `None` for actions that aren't about editing, so the caller can
/// try its own bindings.
pub(crate) fn edit<E: Editable>(
    buffer: &mut E,
    clipboard: &mut Vec<String>,
    action: Option<Action>,
    key: &KeyEvent,
) -> Option<Effect> {
    let effect = match action {
        Some(Action::Left | Action::Backward) => Effect::render_or_alert(buffer.move_left()),
        Some(Action::Right | Action::Forward) => Effect::render_or_alert(buffer.move_right()),
        Some(Action::Delete) => Effect::render_or_alert(buffer.delete_back()),
        Some(Action::DeleteForward) => Effect::render_or_alert(buffer.delete_forward()),
        Some(Action::CutForward) => match buffer.cut_forward() {
            Some(cut) => {
                clipboard.push(cut);
                Effect::Render
            }
            None => Effect::Alert,
        },
        Some(Action::CutLeft) => match buffer.cut_left() {
            Some(cut) => {
                clipboard.push(cut);
                Effect::Render
            }
            None => Effect::Alert,
        },
        Some(Action::Paste) => match clipboard.pop() {
            Some(text) => {
                buffer.insert(&text);
                Effect::Render
            }
            None => Effect::Alert,
        },
        Some(Action::First) => {
            buffer.move_first();
            Effect::Render
        }
        Some(Action::Last) => {
            buffer.move_last();
            Effect::Render
        }
        Some(Action::Space | Action::Number) | None => match key.printable() {
            Some(text) => {
                buffer.insert(text);
                Effect::Render
            }
            None => Effect::Alert,
        },
        Some(_) => return None,
    };
    Some(effect)
}

impl Text {
    pub fn new(mode: TextMode, options: &PromptOptions) -> Self {
        Self {
            mode,
            initial: options.initial_text(),
        }
    }

    fn raw_value(&self, state: &PromptState) -> String {
        if state.input.is_empty() {
            self.initial.clone()
        } else {
            state.input.clone()
        }
    }

    fn toggle_cursor(state: &mut PromptState) {
        match state.prev_cursor.take() {
            Some(prev) => state.set_cursor(prev),
            None => {
                state.prev_cursor = Some(state.cursor);
                state.set_cursor(0);
            }
        }
    }
}

impl PromptKind for Text {
    fn type_name(&self) -> &'static str {
        match self.mode {
            TextMode::Plain => "input",
            TextMode::Password => "password",
            TextMode::Invisible => "invisible",
            TextMode::List => "list",
        }
    }

    fn init_state(&self, state: &mut PromptState) {
        state.initial = self.initial.clone();
    }

    fn handle(&mut self, core: &mut PromptCore, action: Option<Action>, key: &KeyEvent) -> Effect {
        let state = &mut core.state;
        match action {
            Some(Action::ToggleCursor) => {
                Self::toggle_cursor(state);
                Effect::Render
            }
            Some(Action::Home) => {
                state.move_first();
                Effect::Render
            }
            Some(Action::End) => {
                state.move_last();
                Effect::Render
            }
            // Complete the buffer from `initial`.
            Some(Action::Next) => {
                let input = state.input.clone();
                if self.initial.is_empty()
                    || !self.initial.starts_with(&input)
                    || input == self.initial
                {
                    return Effect::Alert;
                }
                state.reset_input();
                Effect::Render
            }
            Some(Action::Prev) => {
                if state.input.is_empty() {
                    return Effect::Alert;
                }
                state.set_text(String::new(), 0);
                Effect::Render
            }
            Some(Action::Reset) => {
                state.set_text(String::new(), 0);
                Effect::Render
            }
            _ => {
                let mut clipboard = std::mem::take(&mut state.clipboard);
                let effect = edit(state, &mut clipboard, action, key);
                state.clipboard = clipboard;
                effect.unwrap_or(Effect::Alert)
            }
        }
    }

    fn value(&self, core: &PromptCore) -> Answer {
        let raw = self.raw_value(&core.state);
        match self.mode {
            TextMode::List => Value::Array(split_list(&raw).into_iter().map(Value::String).collect()),
            _ => Value::String(raw),
        }
    }

    fn render_value(&self, core: &PromptCore) -> (String, Option<usize>) {
        let state = &core.state;
        let styles = &core.theme.styles;
        match self.mode {
            TextMode::Invisible => (String::new(), Some(0)),
            TextMode::Password => {
                if !state.keypressed {
                    return (String::new(), Some(0));
                }
                let mask = &core.theme.symbols.asterisk;
                let shown = mask.repeat(state.char_len());
                let column = ansi::display_width(mask) * state.cursor;
                (styles.muted(&shown), Some(column))
            }
            TextMode::Plain | TextMode::List => {
                if state.input.is_empty() && !self.initial.is_empty() {
                    return (styles.muted(&self.initial), Some(0));
                }
                (state.input.clone(), Some(caret_column(&state.input, state.cursor)))
            }
        }
    }

    fn render_answer(&self, core: &PromptCore, value: &Answer) -> String {
        let styles = &core.theme.styles;
        match self.mode {
            TextMode::Invisible => String::new(),
            TextMode::Password => {
                let len = self.raw_value(&core.state).chars().count();
                styles.primary(&core.theme.symbols.asterisk.repeat(len))
            }
            TextMode::Plain | TextMode::List => styles.primary(&crate::prompts::answer_text(value)),
        }
    }

    fn validatable(&self) -> Option<&dyn Validatable> {
        Some(self)
    }
}

impl Validatable for Text {
    fn check(&self, core: &PromptCore, value: &Answer) -> Validation {
        check_required(core, value)
    }
}
