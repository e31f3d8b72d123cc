//! Yes/no prompts.
//!
//! `confirm` answers on the first y/n key. `toggle` flips between two labels
//! and waits for enter.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::core::action::{Action, Effect};
use crate::core::keymap::KeyEvent;
use crate::prompts::{Answer, PromptCore, PromptKind, PromptOptions};
use crate::tui::theme::Role;

fn truthy() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^[ty1]").expect("truthy key regex should compile"))
}

fn falsy() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^[fn0]").expect("falsy key regex should compile"))
}

/// `Some(true)` for y/t/1, `Some(false)` for n/f/0, case-insensitive.
fn parse_key(key: &KeyEvent) -> Option<bool> {
    let text = key.printable()?;
    if truthy().is_match(text) {
        Some(true)
    } else if falsy().is_match(text) {
        Some(false)
    } else {
        None
    }
}

fn initial_bool(options: &PromptOptions) -> bool {
    match &options.initial {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => truthy().is_match(s),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    }
}

// ============================================================================
// Confirm
// ============================================================================

pub struct Confirm {
    value: bool,
}

impl Confirm {
    pub fn new(options: &PromptOptions) -> Self {
        Self {
            value: initial_bool(options),
        }
    }
}

impl PromptKind for Confirm {
    fn type_name(&self) -> &'static str {
        "confirm"
    }

    fn hides_cursor(&self) -> bool {
        true
    }

    fn handle(&mut self, _core: &mut PromptCore, _action: Option<Action>, key: &KeyEvent) -> Effect {
        match parse_key(key) {
            Some(value) => {
                self.value = value;
                Effect::Submit
            }
            None => Effect::Alert,
        }
    }

    fn value(&self, _core: &PromptCore) -> Answer {
        Value::Bool(self.value)
    }

    fn render_value(&self, core: &PromptCore) -> (String, Option<usize>) {
        let hint = if self.value { "(Y/n)" } else { "(y/N)" };
        (core.theme.styles.muted(hint), None)
    }

    fn render_answer(&self, core: &PromptCore, value: &Answer) -> String {
        let shown = if value.as_bool().unwrap_or(false) { "yes" } else { "no" };
        core.theme.styles.primary(shown)
    }
}

// ============================================================================
// Toggle
// ============================================================================

pub struct Toggle {
    value: bool,
    initial: bool,
    enabled: String,
    disabled: String,
}

impl Toggle {
    pub fn new(options: &PromptOptions) -> Self {
        let initial = initial_bool(options);
        Self {
            value: initial,
            initial,
            enabled: options.enabled.clone().unwrap_or_else(|| "yes".to_string()),
            disabled: options.disabled.clone().unwrap_or_else(|| "no".to_string()),
        }
    }

    fn set(&mut self, value: bool) -> Effect {
        if self.value == value {
            return Effect::Alert;
        }
        self.value = value;
        Effect::Render
    }
}

impl PromptKind for Toggle {
    fn type_name(&self) -> &'static str {
        "toggle"
    }

    fn hides_cursor(&self) -> bool {
        true
    }

    fn handle(&mut self, _core: &mut PromptCore, action: Option<Action>, key: &KeyEvent) -> Effect {
        match action {
            Some(
                Action::Up
                | Action::Down
                | Action::Left
                | Action::Right
                | Action::Next
                | Action::Prev
                | Action::Space,
            ) => self.set(!self.value),
            Some(Action::Reset) => {
                self.value = self.initial;
                Effect::Render
            }
            Some(Action::Number) | None => match parse_key(key) {
                Some(value) => self.set(value),
                None => Effect::Alert,
            },
            Some(_) => Effect::Alert,
        }
    }

    fn value(&self, _core: &PromptCore) -> Answer {
        Value::Bool(self.value)
    }

    fn render_value(&self, core: &PromptCore) -> (String, Option<usize>) {
        let styles = &core.theme.styles;
        let label = |text: &str, active: bool| {
            if active {
                styles.paint(Role::Primary, text)
            } else {
                styles.muted(text)
            }
        };
        let shown = format!(
            "{} {} {}",
            label(&self.disabled, !self.value),
            styles.muted("/"),
            label(&self.enabled, self.value),
        );
        (shown, None)
    }

    fn render_answer(&self, core: &PromptCore, value: &Answer) -> String {
        let shown = if value.as_bool().unwrap_or(false) {
            &self.enabled
        } else {
            &self.disabled
        };
        core.theme.styles.primary(shown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::PromptState;
    use crate::tui::keypress::decode;
    use crate::tui::theme::Theme;
    use serde_json::json;

    fn core(kind: &str) -> PromptCore {
        PromptCore {
            state: PromptState::new(kind, "ok", "Continue?"),
            theme: Theme::plain(),
        }
    }

    #[test]
    fn test_confirm_answers_on_key() {
        let mut core = core("confirm");
        let mut confirm = Confirm::new(&PromptOptions::new("ok", "Continue?"));
        assert_eq!(confirm.value(&core), json!(false));
        assert_eq!(confirm.handle(&mut core, None, &decode("Y")), Effect::Submit);
        assert_eq!(confirm.value(&core), json!(true));
        assert_eq!(confirm.handle(&mut core, Some(Action::Number), &decode("0")), Effect::Submit);
        assert_eq!(confirm.value(&core), json!(false));
        assert_eq!(confirm.handle(&mut core, None, &decode("x")), Effect::Alert);
    }

    #[test]
    fn test_confirm_hint_follows_default() {
        let core = core("confirm");
        let mut options = PromptOptions::new("ok", "?");
        options.initial = Some(json!(true));
        assert_eq!(Confirm::new(&options).render_value(&core).0, "(Y/n)");
        assert_eq!(Confirm::new(&PromptOptions::new("ok", "?")).render_value(&core).0, "(y/N)");
    }

    #[test]
    fn test_toggle_flips_and_rejects_no_ops() {
        let mut core = core("toggle");
        let mut options = PromptOptions::new("ok", "?");
        options.enabled = Some("on".into());
        options.disabled = Some("off".into());
        let mut toggle = Toggle::new(&options);
        assert_eq!(toggle.render_value(&core).0, "off / on");

        assert_eq!(toggle.handle(&mut core, Some(Action::Right), &decode("\x1b[C")), Effect::Render);
        assert_eq!(toggle.value(&core), json!(true));
        assert_eq!(toggle.handle(&mut core, None, &decode("y")), Effect::Alert);
        assert_eq!(toggle.handle(&mut core, None, &decode("n")), Effect::Render);
        assert_eq!(toggle.handle(&mut core, Some(Action::Delete), &decode("\x7f")), Effect::Alert);
        assert_eq!(toggle.render_answer(&core, &json!(false)), "off");
    }

    #[test]
    fn test_toggle_reset_restores_initial() {
        let mut core = core("toggle");
        let mut options = PromptOptions::new("ok", "?");
        options.initial = Some(json!(true));
        let mut toggle = Toggle::new(&options);
        toggle.handle(&mut core, Some(Action::Space), &decode(" "));
        assert_eq!(toggle.value(&core), json!(false));
        toggle.handle(&mut core, Some(Action::Reset), &decode("\x07"));
        assert_eq!(toggle.value(&core), json!(true));
    }
}
