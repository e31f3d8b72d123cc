//! `autocomplete`: a select whose list narrows as you type.
//!
//! The typed text lives in the state's edit buffer. Every edit re-filters
//! the list to choices whose message contains the text (case-insensitive);
//! the answer is the focused survivor.

use log::debug;
use serde_json::Value;

use crate::core::action::{Action, Effect};
use crate::core::choice::{Choice, ChoiceConfig};
use crate::core::choice_list::{ChoiceList, ListOptions};
use crate::core::keymap::KeyEvent;
use crate::core::state::PromptState;
use crate::prompts::text::{caret_column, edit};
use crate::prompts::{
    Answer, PromptCore, PromptError, PromptKind, PromptOptions, Selectable, Validatable,
    Validation, check_required,
};
use crate::tui::ansi;

pub struct Autocomplete {
    list: ChoiceList,
}

fn matches(choice: &Choice, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    !choice.is_unselectable() && choice.message.to_lowercase().contains(query)
}

impl Autocomplete {
    pub fn new(
        options: &PromptOptions,
        choices: &[ChoiceConfig],
        limit: Option<usize>,
    ) -> Result<Self, PromptError> {
        let list = ChoiceList::new(
            choices,
            &ListOptions {
                limit,
                ..Default::default()
            },
        );
        if list.choices().iter().all(Choice::is_unselectable) {
            return Err(PromptError::Config(format!(
                "prompt {:?} has no selectable choices",
                options.name
            )));
        }
        Ok(Self { list })
    }

    fn refilter(&mut self, state: &PromptState) {
        let query = state.input.to_lowercase();
        self.list.filter(|choice| matches(choice, &query));
        debug!("autocomplete {:?}: {} matches", query, self.list.len());
    }
}

impl PromptKind for Autocomplete {
    fn type_name(&self) -> &'static str {
        "autocomplete"
    }

    fn handle(&mut self, core: &mut PromptCore, action: Option<Action>, key: &KeyEvent) -> Effect {
        let list = &mut self.list;
        match action {
            Some(Action::Up) => Effect::render_or_alert(list.up()),
            Some(Action::Down) => Effect::render_or_alert(list.down()),
            Some(Action::Next) => Effect::render_or_alert(list.next()),
            Some(Action::Prev) => Effect::render_or_alert(list.prev()),
            Some(Action::PageUp) => Effect::render_or_alert(list.page_up()),
            Some(Action::PageDown) => Effect::render_or_alert(list.page_down()),
            Some(Action::Reset) => {
                core.state.reset_input();
                self.refilter(&core.state);
                Effect::Render
            }
            _ => {
                let state = &mut core.state;
                let before = state.input.clone();
                let mut clipboard = std::mem::take(&mut state.clipboard);
                let effect = edit(state, &mut clipboard, action, key);
                state.clipboard = clipboard;
                if state.input != before {
                    self.refilter(&core.state);
                }
                effect.unwrap_or(Effect::Alert)
            }
        }
    }

    fn value(&self, _core: &PromptCore) -> Answer {
        self.list
            .focused()
            .map(|c| c.value.clone())
            .unwrap_or(Value::Null)
    }

    fn render_value(&self, core: &PromptCore) -> (String, Option<usize>) {
        let state = &core.state;
        (state.input.clone(), Some(caret_column(&state.input, state.cursor)))
    }

    fn render_answer(&self, core: &PromptCore, _value: &Answer) -> String {
        let shown = self.list.focused().map(|c| c.message.as_str()).unwrap_or_default();
        core.theme.styles.primary(shown)
    }

    fn body(&self, core: &PromptCore) -> String {
        let styles = &core.theme.styles;
        if self.list.is_empty() {
            return styles.muted("No matching choices");
        }
        let pointer = &core.theme.symbols.pointer;
        let pad = " ".repeat(ansi::display_width(pointer));
        let focused = self.list.focused_id();
        self.list
            .visible()
            .map(|choice| {
                if Some(choice.index) == focused {
                    format!("{} {}", styles.primary(pointer), styles.primary(&choice.message))
                } else if choice.is_unselectable() {
                    format!("{pad} {}", styles.muted(&choice.message))
                } else {
                    format!("{pad} {}", choice.message)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn selectable(&self) -> Option<&dyn Selectable> {
        Some(self)
    }

    fn selectable_mut(&mut self) -> Option<&mut dyn Selectable> {
        Some(self)
    }

    fn validatable(&self) -> Option<&dyn Validatable> {
        Some(self)
    }
}

impl Selectable for Autocomplete {
    fn choices(&self) -> &ChoiceList {
        &self.list
    }

    fn choices_mut(&mut self) -> &mut ChoiceList {
        &mut self.list
    }
}

impl Validatable for Autocomplete {
    fn check(&self, core: &PromptCore, value: &Answer) -> Validation {
        if self.list.is_empty() {
            return Validation::Invalid("No matching choice".to_string());
        }
        check_required(core, value)
    }
}
