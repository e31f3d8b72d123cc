//! # Questionnaire
//!
//! Runs prompts one after another and collects every answer into a single
//! JSON record.
//!
//! ```text
//! [[questions]]            Prompt::build ──► run_with(answers) ──► answers["user"]["name"]
//! name = "user.name"              │                                     ▲
//! type = "input"                  └── events ──► forwarded as-is ───────┘ (tagged by name)
//! ```
//!
//! Dotted names nest: `user.name` and `user.age` land in one `user` object.
//! Each prompt sees the answers so far, so its `skip` hook can depend on them.

use log::{debug, info};
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::core::choice::{ChoiceConfig, ChoiceSource};
use crate::core::config::ResolvedConfig;
use crate::core::lifecycle::LifecycleRegistry;
use crate::core::state::PromptState;
use crate::core::timer::TimerSpec;
use crate::prompts::{
    Answer, Prompt, PromptError, PromptEvent, PromptOptions, Validation, Validator, answer_text,
};
use crate::tui::render::Margin;
use crate::tui::terminal::Terminal;

// ============================================================================
// Questions file
// ============================================================================

/// A choice in a questions file: a bare name or a full table.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ChoiceSpec {
    Name(String),
    Table(ChoiceConfig),
}

impl From<ChoiceSpec> for ChoiceConfig {
    fn from(spec: ChoiceSpec) -> Self {
        match spec {
            ChoiceSpec::Name(name) => ChoiceConfig::from(name),
            ChoiceSpec::Table(config) => config,
        }
    }
}

/// One `[[questions]]` table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionSpec {
    #[serde(rename = "type", default = "default_type")]
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub initial: Option<Value>,
    #[serde(default)]
    pub choices: Vec<ChoiceSpec>,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub max_selected: Option<usize>,
    #[serde(default)]
    pub required: bool,
    /// Regex the answer text must match.
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub correct_choice: Option<usize>,
    #[serde(default)]
    pub enabled: Option<String>,
    #[serde(default)]
    pub disabled: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub footer: Option<String>,
    #[serde(default)]
    pub skip: bool,
    #[serde(default)]
    pub margin: Option<Margin>,
    #[serde(default)]
    pub timers: BTreeMap<String, TimerSpec>,
}

fn default_type() -> String {
    "input".to_string()
}

#[derive(Debug, Deserialize)]
struct QuestionsFile {
    #[serde(default)]
    questions: Vec<QuestionSpec>,
}

/// Parse a questions file (`[[questions]]` tables).
pub fn parse_questions(contents: &str) -> Result<Vec<QuestionSpec>, PromptError> {
    let file: QuestionsFile = toml::from_str(contents)
        .map_err(|e| PromptError::Config(format!("invalid questions file: {e}")))?;
    Ok(file.questions)
}

/// Validator for a `pattern` key.
fn pattern_validator(pattern: &str) -> Result<Arc<dyn Validator>, PromptError> {
    let re = Regex::new(pattern)
        .map_err(|e| PromptError::Config(format!("invalid pattern {pattern:?}: {e}")))?;
    let message = format!("Value must match {pattern}");
    Ok(Arc::new(move |value: &Answer, _: &PromptState| {
        if re.is_match(&answer_text(value)) {
            Validation::Valid
        } else {
            Validation::Invalid(message.clone())
        }
    }))
}

impl QuestionSpec {
    /// Turn the table into prompt options. Fails on a bad `pattern`.
    pub fn into_options(self) -> Result<PromptOptions, PromptError> {
        let message = self.message.unwrap_or_else(|| self.name.clone());
        let mut options = PromptOptions::new(&self.name, &message);
        options.initial = self.initial;
        options.choices = ChoiceSource::literal(self.choices);
        options.multiple = self.multiple;
        options.limit = self.limit;
        options.max_selected = self.max_selected;
        options.required = self.required;
        options.min = self.min;
        options.max = self.max;
        options.correct_choice = self.correct_choice;
        options.enabled = self.enabled;
        options.disabled = self.disabled;
        options.hint = self.hint;
        options.header = self.header;
        options.footer = self.footer;
        options.margin = self.margin.unwrap_or_default();
        options.timers = self.timers;
        if let Some(pattern) = &self.pattern {
            options.hooks.validate = Some(pattern_validator(pattern)?);
        }
        if self.skip {
            options.hooks.skip = Some(Arc::new(|_: &Answer| true));
        }
        Ok(options)
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

struct Question {
    kind: String,
    options: PromptOptions,
}

pub struct Questionnaire {
    questions: Vec<Question>,
    config: ResolvedConfig,
    lifecycle: LifecycleRegistry,
    events: Option<mpsc::UnboundedSender<PromptEvent>>,
}

impl Questionnaire {
    pub fn new(config: ResolvedConfig, lifecycle: LifecycleRegistry) -> Self {
        Self {
            questions: Vec::new(),
            config,
            lifecycle,
            events: None,
        }
    }

    /// Build from parsed `[[questions]]` tables.
    pub fn from_specs(
        specs: Vec<QuestionSpec>,
        config: ResolvedConfig,
        lifecycle: LifecycleRegistry,
    ) -> Result<Self, PromptError> {
        let mut questionnaire = Self::new(config, lifecycle);
        for spec in specs {
            let kind = spec.kind.clone();
            questionnaire = questionnaire.question(&kind, spec.into_options()?);
        }
        Ok(questionnaire)
    }

    /// Append a prompt of type `kind`.
    pub fn question(mut self, kind: &str, options: PromptOptions) -> Self {
        self.questions.push(Question {
            kind: kind.to_string(),
            options,
        });
        self
    }

    /// Forward every prompt's lifecycle notifications to `events`.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<PromptEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Ask everything in order. The first cancel or termination ends the run.
    pub async fn run(self, terminal: &mut Terminal) -> Result<Answer, PromptError> {
        let mut answers = Value::Object(Map::new());
        info!("questionnaire: {} questions", self.len());
        for question in self.questions {
            let name = question.options.name.clone();
            let mut prompt = Prompt::build(
                &question.kind,
                question.options,
                &self.config,
                self.lifecycle.clone(),
            )
            .await?;
            if let Some(events) = &self.events {
                prompt = prompt.with_events(events.clone());
            }
            let value = prompt.run_with(terminal, &answers).await?;
            debug!("answer {name:?} = {value}");
            set_path(&mut answers, &name, value);
        }
        Ok(answers)
    }
}

/// Store `value` under a dotted `path`, creating (or replacing non-object)
/// intermediate levels.
pub fn set_path(root: &mut Value, path: &str, value: Value) {
    let mut node = root;
    let mut parts = path.split('.').peekable();
    while let Some(part) = parts.next() {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Value::Object(map) = node else {
            return;
        };
        if parts.peek().is_none() {
            map.insert(part.to_string(), value);
            return;
        }
        node = map.entry(part.to_string()).or_insert_with(|| Value::Object(Map::new()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_path_nests_dotted_names() {
        let mut answers = json!({});
        set_path(&mut answers, "user.name", json!("jo"));
        set_path(&mut answers, "user.age", json!(30));
        set_path(&mut answers, "ok", json!(true));
        assert_eq!(answers, json!({ "user": { "name": "jo", "age": 30 }, "ok": true }));

        set_path(&mut answers, "ok.really", json!(false));
        assert_eq!(answers["ok"], json!({ "really": false }));
    }

    #[test]
    fn test_parse_questions_file() {
        let specs = parse_questions(
            r#"
            [[questions]]
            type = "select"
            name = "color"
            message = "Favourite colour?"
            choices = ["red", { name = "green", hint = "(go)" }]

            [[questions]]
            name = "nick"
            pattern = "^[a-z]+$"
            skip = true
            "#,
        )
        .unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].kind, "select");
        assert_eq!(specs[0].choices.len(), 2);
        assert_eq!(specs[1].kind, "input");
        assert!(specs[1].skip);
    }

    #[test]
    fn test_bad_questions_file_is_config_error() {
        let err = parse_questions("[[questions]]\ntype = 3").unwrap_err();
        assert!(matches!(err, PromptError::Config(_)));
    }

    #[tokio::test]
    async fn test_pattern_becomes_validator() {
        let spec = QuestionSpec {
            name: "nick".into(),
            pattern: Some("^[a-z]+$".into()),
            ..Default::default()
        };
        let options = spec.into_options().unwrap();
        let validate = options.hooks.validate.unwrap();
        let state = PromptState::default();
        assert!(validate.validate(&json!("abc"), &state).await.is_valid());
        assert!(!validate.validate(&json!("ABC"), &state).await.is_valid());

        let bad = QuestionSpec {
            name: "x".into(),
            pattern: Some("(".into()),
            ..Default::default()
        };
        assert!(bad.into_options().is_err());
    }
}
