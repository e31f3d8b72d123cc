//! # List Prompts
//!
//! `select`, `multiselect`, `sort` and `quiz` are one struct over a
//! [`ChoiceList`]; the mode decides what space does and what the answer is.
//!
//! ```text
//! mode      space        shift+↑/↓          answer
//! Single    bell         scroll window      focused value
//! Multiple  toggle       scroll window      [selected values]
//! Sort      bell         move focused item  [values in display order]
//! Quiz      bell         scroll window      { selectedAnswer, correctAnswer, correct }
//! ```
//!
//! Digits quick-jump in every mode (see [`QuickJump`]).

use log::debug;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::time::Instant;

use crate::core::action::{Action, Effect};
use crate::core::choice::{Choice, ChoiceConfig, Role as ChoiceRole};
use crate::core::choice_list::{ChoiceList, ListOptions};
use crate::core::keymap::KeyEvent;
use crate::core::quick_jump::{JumpDecision, QuickJump};
use crate::prompts::{
    Answer, PromptCore, PromptError, PromptKind, PromptOptions, Selectable, Validatable,
    Validation, answer_text, check_required,
};
use crate::tui::ansi;
use crate::tui::theme::{Role, Theme};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    Single,
    Multiple,
    Sort,
    Quiz,
}

pub struct Select {
    mode: SelectMode,
    list: ChoiceList,
    jump: QuickJump,
    correct: Option<usize>,
}

/// Names (or indices) named by `initial`: a string, a number or an array of either.
fn preselection(initial: Option<&Value>) -> Vec<String> {
    match initial {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(answer_text).collect(),
        Some(other) => vec![answer_text(other)],
    }
}

impl Select {
    pub fn new(
        mode: SelectMode,
        options: &PromptOptions,
        choices: &[ChoiceConfig],
        limit: Option<usize>,
        delay: Duration,
    ) -> Result<Self, PromptError> {
        let preselect = preselection(options.initial.as_ref());
        let list_options = ListOptions {
            multiple: mode == SelectMode::Multiple,
            limit,
            max_selected: options.max_selected,
            scroll: true,
            sort: mode == SelectMode::Sort,
            preselect: preselect.clone(),
        };
        let mut list = ChoiceList::new(choices, &list_options);

        if mode == SelectMode::Quiz {
            let Some(correct) = options.correct_choice else {
                return Err(PromptError::Config(
                    "Please specify the index of the correct answer from the list of choices"
                        .to_string(),
                ));
            };
            if list.len() < 2 {
                return Err(PromptError::Config(
                    "Please give at least two choices to the user".to_string(),
                ));
            }
            if correct >= list.len() {
                return Err(PromptError::Config(
                    "Please specify the index of the correct answer from the list of choices"
                        .to_string(),
                ));
            }
        }
        if list.choices().iter().all(Choice::is_unselectable) {
            return Err(PromptError::Config(format!(
                "prompt {:?} has no selectable choices",
                options.name
            )));
        }

        if mode != SelectMode::Multiple {
            if let Some(name) = preselect.first() {
                if !list.focus_named(name) {
                    debug!("initial {name:?} matches no selectable choice");
                }
            }
        }

        Ok(Self {
            mode,
            list,
            jump: QuickJump::new(delay),
            correct: options.correct_choice,
        })
    }

    fn quick_jump(&mut self, key: &KeyEvent) -> Effect {
        let Some(digit) = key.sequence.chars().next() else {
            return Effect::Alert;
        };
        match self.jump.push(digit, self.list.len(), Instant::now()) {
            JumpDecision::Flush(number) => Effect::render_or_alert(self.list.jump_to(number)),
            JumpDecision::Wait(_) => Effect::Render,
            JumpDecision::Reject => Effect::Alert,
        }
    }

    /// Single-letter commands of multi-select.
    fn letter(&mut self, key: &KeyEvent) -> Effect {
        if self.mode != SelectMode::Multiple || key.ctrl || key.meta {
            return Effect::Alert;
        }
        let changed = match key.name.as_deref() {
            Some("a") => self.list.toggle_all(),
            Some("i") => self.list.invert(),
            Some("g") => self.list.toggle_group(),
            _ => false,
        };
        Effect::render_or_alert(changed)
    }

    fn line(&self, theme: &Theme, choice: &Choice) -> String {
        let styles = &theme.styles;
        let symbols = &theme.symbols;
        let focused = self.list.focused_id() == Some(choice.index);
        let gutter = if focused {
            styles.primary(&symbols.pointer)
        } else {
            " ".repeat(ansi::display_width(&symbols.pointer))
        };
        let indent = choice.indent();

        match choice.role {
            ChoiceRole::Separator => {
                return format!("{gutter} {indent}{}", styles.muted(&choice.message));
            }
            ChoiceRole::Heading => {
                return format!("{gutter} {indent}{}", styles.paint(Role::Heading, &choice.message));
            }
            ChoiceRole::Option => {}
        }

        let indicator = match self.mode {
            SelectMode::Multiple if choice.enabled => format!("{} ", styles.success(&symbols.radio_on)),
            SelectMode::Multiple => format!("{} ", styles.muted(&symbols.radio_off)),
            SelectMode::Sort => format!("{} ", styles.muted(&symbols.identical_to)),
            SelectMode::Single | SelectMode::Quiz => String::new(),
        };
        let label = if choice.disabled {
            styles.disabled(&choice.message)
        } else if choice.is_group() {
            styles.strong(&choice.message)
        } else if focused {
            styles.primary(&choice.message)
        } else {
            choice.message.clone()
        };
        let hint = match &choice.hint {
            Some(hint) => format!(" {}", styles.muted(hint)),
            None => String::new(),
        };
        format!("{gutter} {indent}{indicator}{label}{hint}")
    }

    fn values<'a>(choices: impl Iterator<Item = &'a Choice>) -> Answer {
        Value::Array(choices.map(|c| c.value.clone()).collect())
    }
}

impl PromptKind for Select {
    fn type_name(&self) -> &'static str {
        match self.mode {
            SelectMode::Single => "select",
            SelectMode::Multiple => "multiselect",
            SelectMode::Sort => "sort",
            SelectMode::Quiz => "quiz",
        }
    }

    fn hides_cursor(&self) -> bool {
        true
    }

    fn handle(&mut self, _core: &mut PromptCore, action: Option<Action>, key: &KeyEvent) -> Effect {
        if action != Some(Action::Number) {
            self.jump.clear();
        }
        let list = &mut self.list;
        match action {
            Some(Action::Up) => Effect::render_or_alert(list.up()),
            Some(Action::Down) => Effect::render_or_alert(list.down()),
            Some(Action::Next) => Effect::render_or_alert(list.next()),
            Some(Action::Prev) => Effect::render_or_alert(list.prev()),
            Some(Action::Home) => Effect::render_or_alert(list.home()),
            Some(Action::End) => Effect::render_or_alert(list.end()),
            Some(Action::First) => Effect::render_or_alert(list.first()),
            Some(Action::Last) => Effect::render_or_alert(list.last()),
            Some(Action::PageUp) => Effect::render_or_alert(list.page_up()),
            Some(Action::PageDown) => Effect::render_or_alert(list.page_down()),
            Some(Action::ShiftUp) => Effect::render_or_alert(list.shift_up()),
            Some(Action::ShiftDown) => Effect::render_or_alert(list.shift_down()),
            Some(Action::Space) => Effect::render_or_alert(list.toggle_focused()),
            Some(Action::Number) => self.quick_jump(key),
            None => self.letter(key),
            Some(_) => Effect::Alert,
        }
    }

    fn value(&self, _core: &PromptCore) -> Answer {
        match self.mode {
            SelectMode::Single | SelectMode::Quiz => self
                .list
                .focused()
                .map(|c| c.value.clone())
                .unwrap_or(Value::Null),
            SelectMode::Multiple => Self::values(self.list.selected().into_iter()),
            SelectMode::Sort => Self::values(self.list.ordered().filter(|c| !c.is_unselectable())),
        }
    }

    fn render_value(&self, core: &PromptCore) -> (String, Option<usize>) {
        let shown = self
            .jump
            .pending()
            .map(|digits| core.theme.styles.muted(digits))
            .unwrap_or_default();
        (shown, None)
    }

    fn render_answer(&self, core: &PromptCore, _value: &Answer) -> String {
        let styles = &core.theme.styles;
        let labels: Vec<String> = match self.mode {
            SelectMode::Single | SelectMode::Quiz => {
                self.list.focused().map(|c| c.message.clone()).into_iter().collect()
            }
            SelectMode::Multiple => self.list.selected().iter().map(|c| c.message.clone()).collect(),
            SelectMode::Sort => self
                .list
                .ordered()
                .filter(|c| !c.is_unselectable())
                .map(|c| c.message.clone())
                .collect(),
        };
        if self.mode == SelectMode::Multiple && labels.is_empty() {
            return styles.danger("No items were selected");
        }
        styles.primary(&labels.join(", "))
    }

    fn body(&self, core: &PromptCore) -> String {
        self.list
            .visible()
            .map(|choice| self.line(&core.theme, choice))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn result(&self, _core: &PromptCore, value: Answer) -> Answer {
        if self.mode != SelectMode::Quiz {
            return value;
        }
        let correct_answer = self
            .correct
            .and_then(|i| self.list.choices().get(i))
            .map(|c| c.value.clone())
            .unwrap_or(Value::Null);
        let correct = self.list.focused().map(|c| c.index.0) == self.correct;
        json!({
            "selectedAnswer": value,
            "correctAnswer": correct_answer,
            "correct": correct,
        })
    }

    fn deadline(&self) -> Option<Instant> {
        self.jump.deadline()
    }

    fn expire(&mut self, _core: &mut PromptCore) -> Effect {
        match self.jump.expire() {
            Some(number) => Effect::render_or_alert(self.list.jump_to(number)),
            None => Effect::Render,
        }
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

impl Selectable for Select {
    fn choices(&self) -> &ChoiceList {
        &self.list
    }

    fn choices_mut(&mut self) -> &mut ChoiceList {
        &mut self.list
    }
}

impl Validatable for Select {
    fn check(&self, core: &PromptCore, value: &Answer) -> Validation {
        check_required(core, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::choice::Disabled;
    use crate::core::state::PromptState;
    use crate::tui::keypress::decode;

    const DELAY: Duration = Duration::from_millis(400);

    fn configs(names: &[&str]) -> Vec<ChoiceConfig> {
        names.iter().map(|n| ChoiceConfig::from(*n)).collect()
    }

    fn core() -> PromptCore {
        PromptCore {
            state: PromptState::new("select", "pick", "Pick"),
            theme: Theme::plain(),
        }
    }

    fn select(mode: SelectMode, options: &PromptOptions, names: &[&str]) -> Select {
        Select::new(mode, options, &configs(names), None, DELAY).unwrap()
    }

    fn press(s: &mut Select, core: &mut PromptCore, action: Option<Action>, raw: &str) -> Effect {
        s.handle(core, action, &decode(raw))
    }

    #[test]
    fn test_single_answers_focused_value() {
        let mut core = core();
        let mut s = select(SelectMode::Single, &PromptOptions::new("pick", "Pick"), &["a", "b", "c"]);
        press(&mut s, &mut core, Some(Action::Down), "\x1b[B");
        assert_eq!(s.value(&core), json!("b"));
        assert_eq!(press(&mut s, &mut core, Some(Action::Space), " "), Effect::Alert);
    }

    #[test]
    fn test_initial_focuses_named_choice() {
        let core = core();
        let mut options = PromptOptions::new("pick", "Pick");
        options.initial = Some(json!("c"));
        let s = select(SelectMode::Single, &options, &["a", "b", "c"]);
        assert_eq!(s.value(&core), json!("c"));
    }

    #[test]
    fn test_multiple_toggles_and_letters() {
        let mut core = core();
        let mut s = select(SelectMode::Multiple, &PromptOptions::new("pick", "Pick"), &["a", "b", "c"]);
        assert_eq!(press(&mut s, &mut core, Some(Action::Space), " "), Effect::Render);
        assert_eq!(s.value(&core), json!(["a"]));
        assert_eq!(press(&mut s, &mut core, None, "i"), Effect::Render);
        assert_eq!(s.value(&core), json!(["b", "c"]));
        assert_eq!(press(&mut s, &mut core, None, "a"), Effect::Render);
        assert_eq!(s.value(&core), json!(["a", "b", "c"]));
        assert_eq!(press(&mut s, &mut core, None, "z"), Effect::Alert);
    }

    #[test]
    fn test_multiple_empty_answer_shows_error() {
        let core = core();
        let s = select(SelectMode::Multiple, &PromptOptions::new("pick", "Pick"), &["a", "b"]);
        assert_eq!(s.render_answer(&core, &json!([])), "No items were selected");
    }

    #[test]
    fn test_sort_moves_focused_choice() {
        let mut core = core();
        let mut s = select(SelectMode::Sort, &PromptOptions::new("pick", "Pick"), &["a", "b", "c"]);
        assert_eq!(press(&mut s, &mut core, Some(Action::ShiftDown), "\x1b[1;2B"), Effect::Render);
        assert_eq!(s.value(&core), json!(["b", "a", "c"]));
    }

    #[test]
    fn test_quiz_result_shape() {
        let mut core = core();
        let mut options = PromptOptions::new("q", "2+2?");
        options.correct_choice = Some(1);
        let mut s = select(SelectMode::Quiz, &options, &["3", "4", "5"]);
        press(&mut s, &mut core, Some(Action::Down), "\x1b[B");
        let value = s.value(&core);
        assert_eq!(
            s.result(&core, value),
            json!({ "selectedAnswer": "4", "correctAnswer": "4", "correct": true })
        );
    }

    #[test]
    fn test_quiz_config_errors() {
        let mut options = PromptOptions::new("q", "?");
        let missing = Select::new(SelectMode::Quiz, &options, &configs(&["a", "b"]), None, DELAY);
        assert!(matches!(missing, Err(PromptError::Config(m)) if m.contains("index of the correct")));

        options.correct_choice = Some(0);
        let few = Select::new(SelectMode::Quiz, &options, &configs(&["a"]), None, DELAY);
        assert!(matches!(few, Err(PromptError::Config(m)) if m.contains("at least two")));

        options.correct_choice = Some(5);
        let out = Select::new(SelectMode::Quiz, &options, &configs(&["a", "b"]), None, DELAY);
        assert!(out.is_err());
    }

    #[test]
    fn test_no_selectable_choices_is_config_error() {
        let options = PromptOptions::new("pick", "Pick");
        let only_disabled = vec![ChoiceConfig {
            name: Some("x".into()),
            disabled: Some(Disabled::Flag(true)),
            ..Default::default()
        }];
        let built = Select::new(SelectMode::Single, &options, &only_disabled, None, DELAY);
        assert!(matches!(built, Err(PromptError::Config(_))));
        let empty = Select::new(SelectMode::Single, &options, &[], None, DELAY);
        assert!(empty.is_err());
    }

    #[test]
    fn test_quick_jump_waits_then_flushes() {
        let mut core = core();
        let names: Vec<String> = (1..=20).map(|i| format!("item{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut s = select(SelectMode::Single, &PromptOptions::new("pick", "Pick"), &refs);
        assert_eq!(press(&mut s, &mut core, Some(Action::Number), "1"), Effect::Render);
        assert!(s.deadline().is_some());
        assert_eq!(press(&mut s, &mut core, Some(Action::Number), "2"), Effect::Render);
        assert_eq!(s.value(&core), json!("item12"));
        assert!(s.deadline().is_none());

        assert_eq!(press(&mut s, &mut core, Some(Action::Number), "0"), Effect::Alert);
        press(&mut s, &mut core, Some(Action::Number), "2");
        assert_eq!(s.expire(&mut core), Effect::Render);
        assert_eq!(s.value(&core), json!("item2"));
    }

    #[test]
    fn test_body_marks_focus_and_selection() {
        let core = core();
        let mut s = select(SelectMode::Multiple, &PromptOptions::new("pick", "Pick"), &["a", "b"]);
        s.list.toggle_focused();
        let body = s.body(&core);
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(&core.theme.symbols.pointer));
        assert!(lines[0].contains(&core.theme.symbols.radio_on));
        assert!(lines[1].contains(&core.theme.symbols.radio_off));
    }
}
