//! `form`: several named text fields answered together.
//!
//! Each choice is a field with its own edit buffer (`Choice` is
//! [`Editable`]). `↑`/`↓` move between fields; typing edits the focused one.
//! A field's `initial` is a placeholder, completed into the buffer by `tab`,
//! exactly like the single-line `input` prompt.

use serde_json::{Map, Value};

use crate::core::action::{Action, Effect};
use crate::core::choice::{Choice, ChoiceConfig, ChoiceId};
use crate::core::choice_list::{ChoiceList, ListOptions};
use crate::core::editable::Editable;
use crate::core::keymap::KeyEvent;
use crate::prompts::text::edit;
use crate::prompts::{
    Answer, PromptCore, PromptError, PromptKind, PromptOptions, Selectable, Validatable,
    Validation,
};
use crate::tui::ansi;
use crate::tui::theme::{Role, Styles, Theme};

pub struct Form {
    fields: ChoiceList,
    /// Placeholder per field, by arena index.
    initials: Vec<String>,
}

impl Form {
    pub fn new(options: &PromptOptions, choices: &[ChoiceConfig]) -> Result<Self, PromptError> {
        let mut fields = ChoiceList::new(
            choices,
            &ListOptions {
                scroll: false,
                ..Default::default()
            },
        );
        if fields.choices().iter().all(Choice::is_unselectable) {
            return Err(PromptError::Config(format!(
                "form {:?} has no editable fields",
                options.name
            )));
        }
        let initials = fields.choices().iter().map(|c| c.input.clone()).collect();
        for i in 0..fields.choices().len() {
            if let Some(field) = fields.get_mut(ChoiceId(i)) {
                field.set_text(String::new(), 0);
            }
        }
        Ok(Self { fields, initials })
    }

    fn initial_of(&self, field: &Choice) -> &str {
        self.initials
            .get(field.index.0)
            .map(String::as_str)
            .unwrap_or_default()
    }

    fn field_value(&self, field: &Choice) -> String {
        if field.input.is_empty() {
            self.initial_of(field).to_string()
        } else {
            field.input.clone()
        }
    }

    /// `tab`: fill an untouched field from its placeholder, otherwise move on.
    fn complete_or_next(&mut self) -> Effect {
        let Some(field) = self.fields.focused() else {
            return Effect::Alert;
        };
        let initial = self.initial_of(field).to_string();
        if field.input.is_empty() && !initial.is_empty() {
            let cursor = initial.chars().count();
            if let Some(field) = self.fields.focused_mut() {
                field.set_text(initial, cursor);
            }
            return Effect::Render;
        }
        Effect::render_or_alert(self.fields.down())
    }

    fn line(&self, theme: &Theme, field: &Choice, focused: bool) -> String {
        let styles = &theme.styles;
        let pointer = &theme.symbols.pointer;
        if field.is_unselectable() {
            let pad = " ".repeat(ansi::display_width(pointer));
            return format!("{pad} {}", styles.muted(&field.message));
        }
        let gutter = if focused {
            styles.primary(pointer)
        } else {
            " ".repeat(ansi::display_width(pointer))
        };
        let label = if focused {
            styles.primary(&field.message)
        } else {
            field.message.clone()
        };
        let value = if field.input.is_empty() {
            let placeholder = styles.muted(self.initial_of(field));
            if focused {
                format!("{}{placeholder}", styles.paint(Role::Highlight, " "))
            } else {
                placeholder
            }
        } else if focused {
            with_caret(styles, &field.input, field.cursor)
        } else {
            field.input.clone()
        };
        format!("{gutter} {label}: {value}")
    }
}

/// Draw the caret as a highlighted cell, since the terminal caret stays on
/// the prompt line.
fn with_caret(styles: &Styles, text: &str, cursor: usize) -> String {
    let before: String = text.chars().take(cursor).collect();
    let at: String = text.chars().nth(cursor).map(String::from).unwrap_or_else(|| " ".into());
    let after: String = text.chars().skip(cursor + 1).collect();
    format!("{before}{}{after}", styles.paint(Role::Highlight, &at))
}

impl PromptKind for Form {
    fn type_name(&self) -> &'static str {
        "form"
    }

    fn hides_cursor(&self) -> bool {
        true
    }

    fn handle(&mut self, core: &mut PromptCore, action: Option<Action>, key: &KeyEvent) -> Effect {
        match action {
            Some(Action::Up) => Effect::render_or_alert(self.fields.up()),
            Some(Action::Down) => Effect::render_or_alert(self.fields.down()),
            Some(Action::Next) => self.complete_or_next(),
            Some(Action::Prev | Action::Reset) => match self.fields.focused_mut() {
                Some(field) if !field.input.is_empty() => {
                    field.set_text(String::new(), 0);
                    Effect::Render
                }
                _ => Effect::Alert,
            },
            _ => {
                let Some(field) = self.fields.focused_mut() else {
                    return Effect::Alert;
                };
                let clipboard = &mut core.state.clipboard;
                edit(field, clipboard, action, key).unwrap_or(Effect::Alert)
            }
        }
    }

    fn value(&self, _core: &PromptCore) -> Answer {
        let map: Map<String, Value> = self
            .fields
            .choices()
            .iter()
            .filter(|f| !f.is_unselectable())
            .map(|f| (f.name.clone(), Value::String(self.field_value(f))))
            .collect();
        Value::Object(map)
    }

    fn render_value(&self, _core: &PromptCore) -> (String, Option<usize>) {
        (String::new(), None)
    }

    fn render_answer(&self, core: &PromptCore, _value: &Answer) -> String {
        let shown: Vec<String> = self
            .fields
            .choices()
            .iter()
            .filter(|f| !f.is_unselectable())
            .map(|f| self.field_value(f))
            .collect();
        core.theme.styles.primary(&shown.join(", "))
    }

    fn body(&self, core: &PromptCore) -> String {
        let focused = self.fields.focused_id();
        self.fields
            .visible()
            .map(|field| self.line(&core.theme, field, Some(field.index) == focused))
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

impl Selectable for Form {
    fn choices(&self) -> &ChoiceList {
        &self.fields
    }

    fn choices_mut(&mut self) -> &mut ChoiceList {
        &mut self.fields
    }
}

impl Validatable for Form {
    /// A required form needs every field filled.
    fn check(&self, core: &PromptCore, _value: &Answer) -> Validation {
        if !core.state.required.contains(&core.state.name) {
            return Validation::Valid;
        }
        let missing = self
            .fields
            .choices()
            .iter()
            .filter(|f| !f.is_unselectable())
            .find(|f| self.field_value(f).is_empty());
        match missing {
            Some(field) => Validation::Invalid(format!("{} is required", field.message)),
            None => Validation::Valid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::PromptState;
    use crate::tui::keypress::decode;
    use serde_json::json;

    fn field(name: &str, initial: Option<&str>) -> ChoiceConfig {
        ChoiceConfig {
            name: Some(name.into()),
            message: Some(format!("{name}?")),
            initial: initial.map(String::from),
            ..Default::default()
        }
    }

    fn form() -> (Form, PromptCore) {
        let configs = vec![field("first", Some("Jon")), field("last", None)];
        let form = Form::new(&PromptOptions::new("user", "Who?"), &configs).unwrap();
        let core = PromptCore {
            state: PromptState::new("form", "user", "Who?"),
            theme: Theme::plain(),
        };
        (form, core)
    }

    fn typed(f: &mut Form, core: &mut PromptCore, text: &str) {
        for ch in text.chars() {
            assert_eq!(f.handle(core, None, &decode(&ch.to_string())), Effect::Render);
        }
    }

    #[test]
    fn test_fields_edit_independently() {
        let (mut f, mut core) = form();
        typed(&mut f, &mut core, "Al");
        f.handle(&mut core, Some(Action::Down), &decode("\x1b[B"));
        typed(&mut f, &mut core, "Smith");
        f.handle(&mut core, Some(Action::Delete), &decode("\x7f"));
        assert_eq!(f.value(&core), json!({ "first": "Al", "last": "Smit" }));
    }

    #[test]
    fn test_placeholder_answers_and_completes() {
        let (mut f, mut core) = form();
        assert_eq!(f.value(&core), json!({ "first": "Jon", "last": "" }));
        assert_eq!(f.handle(&mut core, Some(Action::Next), &decode("\t")), Effect::Render);
        assert_eq!(f.fields.focused().map(|c| c.input.as_str()), Some("Jon"));
        assert_eq!(f.handle(&mut core, Some(Action::Next), &decode("\t")), Effect::Render);
        assert_eq!(f.fields.focused().map(|c| c.name.as_str()), Some("last"));
    }

    #[test]
    fn test_required_form_names_missing_field() {
        let (f, mut core) = form();
        core.state.required.insert("user".into());
        let verdict = f.check(&core, &f.value(&core));
        assert_eq!(verdict, Validation::Invalid("last? is required".to_string()));
    }

    #[test]
    fn test_body_shows_labels_and_values() {
        let (mut f, mut core) = form();
        typed(&mut f, &mut core, "Al");
        let body = f.body(&core);
        assert!(body.contains("first?: Al"));
        assert!(body.contains("last?: "));
    }
}
