//! # Choices
//!
//! Raw choice entries come in four shapes and all end up as a normalized
//! [`Choice`] record stored in the list's arena:
//!
//! ```text
//! ChoiceEntry::Config(ChoiceConfig)        literal / config table
//! ChoiceEntry::Producer(FnOnce)            called once at normalization
//! ChoiceEntry::Pending(BoxFuture)          awaited at normalization
//!             │
//!             ▼  resolve() → ChoiceConfig → Choice::pending() → normalize()
//! Choice { index, parent: Option<ChoiceId>, children: Vec<ChoiceId>, ... }
//! ```
//!
//! `parent` and `children` are arena handles, not owning references.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::editable::Editable;

/// Stable handle into a choice arena. Equal to the choice's flattened index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ChoiceId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Option,
    /// Section title. Never focusable, never selectable.
    Heading,
    /// Divider line. Never focusable, never selectable.
    Separator,
}

/// `disabled = true` or `disabled = "reason shown as hint"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Disabled {
    Flag(bool),
    Reason(String),
}

/// A choice as the caller describes it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ChoiceConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub disabled: Option<Disabled>,
    #[serde(default)]
    pub role: Role,
    /// Initial edit buffer (form fields).
    #[serde(default)]
    pub initial: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChoiceConfig>,
}

impl From<&str> for ChoiceConfig {
    fn from(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }
}

impl From<String> for ChoiceConfig {
    fn from(name: String) -> Self {
        Self {
            name: Some(name),
            ..Default::default()
        }
    }
}

/// One raw entry in a prompt's choice source.
pub enum ChoiceEntry {
    Config(ChoiceConfig),
    Producer(Box<dyn FnOnce() -> ChoiceConfig + Send>),
    Pending(BoxFuture<'static, ChoiceConfig>),
}

impl ChoiceEntry {
    pub async fn resolve(self) -> ChoiceConfig {
        match self {
            ChoiceEntry::Config(config) => config,
            ChoiceEntry::Producer(produce) => produce(),
            ChoiceEntry::Pending(future) => future.await,
        }
    }
}

impl From<ChoiceConfig> for ChoiceEntry {
    fn from(config: ChoiceConfig) -> Self {
        ChoiceEntry::Config(config)
    }
}

impl From<&str> for ChoiceEntry {
    fn from(name: &str) -> Self {
        ChoiceEntry::Config(name.into())
    }
}

/// Where a list prompt gets its choices from.
pub enum ChoiceSource {
    List(Vec<ChoiceEntry>),
    /// Produces the whole list asynchronously (e.g. loaded from disk).
    Deferred(BoxFuture<'static, Vec<ChoiceEntry>>),
}

impl Default for ChoiceSource {
    fn default() -> Self {
        ChoiceSource::List(Vec::new())
    }
}

impl ChoiceSource {
    pub fn literal<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ChoiceConfig>,
    {
        ChoiceSource::List(items.into_iter().map(|c| ChoiceEntry::Config(c.into())).collect())
    }

    pub async fn resolve(self) -> Vec<ChoiceConfig> {
        let entries = match self {
            ChoiceSource::List(entries) => entries,
            ChoiceSource::Deferred(future) => future.await,
        };
        let mut configs = Vec::with_capacity(entries.len());
        for entry in entries {
            configs.push(entry.resolve().await);
        }
        configs
    }
}

/// Inputs that normalization needs from the owning list.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeContext<'a> {
    pub index: ChoiceId,
    pub parent: Option<ChoiceId>,
    pub level: usize,
    pub multiple: bool,
    /// Names (or decimal indices) the prompt's `initial` preselects.
    pub preselect: &'a [String],
}

/// A normalized choice record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choice {
    pub index: ChoiceId,
    pub name: String,
    pub message: String,
    pub value: Value,
    pub hint: Option<String>,
    pub enabled: bool,
    pub disabled: bool,
    pub role: Role,
    #[serde(skip)]
    pub parent: Option<ChoiceId>,
    #[serde(skip)]
    pub children: Vec<ChoiceId>,
    pub level: usize,
    pub input: String,
    pub cursor: usize,
    /// Raw `disabled` as configured, consumed by `normalize`.
    #[serde(skip)]
    raw_disabled: Option<Disabled>,
    #[serde(skip)]
    normalized: bool,
}

impl Choice {
    /// An un-normalized record carrying the config's own fields. Children are
    /// attached by the list when it flattens the tree.
    pub fn pending(config: &ChoiceConfig) -> Self {
        let initial = config.initial.clone().unwrap_or_default();
        let cursor = initial.chars().count();
        Self {
            index: ChoiceId(0),
            name: config.name.clone().unwrap_or_default(),
            message: config.message.clone().unwrap_or_default(),
            value: config.value.clone().unwrap_or(Value::Null),
            hint: config.hint.clone(),
            enabled: config.enabled,
            disabled: false,
            role: config.role,
            parent: None,
            children: Vec::new(),
            level: 1,
            input: initial,
            cursor,
            raw_disabled: config.disabled.clone(),
            normalized: false,
        }
    }

    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    /// Fill defaults and tag the record with its index. A second call is a no-op.
    pub fn normalize(&mut self, cx: NormalizeContext<'_>) {
        if self.normalized {
            return;
        }
        self.normalized = true;

        match self.raw_disabled.take() {
            Some(Disabled::Reason(reason)) => {
                if self.hint.is_none() {
                    self.hint = Some(reason);
                }
                self.disabled = true;
            }
            Some(Disabled::Flag(flag)) => self.disabled = flag,
            None => {}
        }
        if self.disabled && self.hint.is_none() {
            self.hint = Some("(disabled)".to_string());
        }

        if self.name.is_empty() {
            self.name = match &self.value {
                Value::String(s) => s.clone(),
                Value::Null => self.message.clone(),
                other => other.to_string(),
            };
        }
        if self.message.is_empty() {
            self.message = self.name.clone();
        }
        if self.role == Role::Separator && self.message.is_empty() {
            self.message = "─".repeat(12);
        }
        if self.value.is_null() {
            self.value = Value::String(self.name.clone());
        }

        self.index = cx.index;
        self.parent = cx.parent;
        self.level = cx.level;

        let preselected = cx
            .preselect
            .iter()
            .any(|v| *v == self.name || v.parse::<usize>().ok() == Some(cx.index.0));
        self.enabled = cx.multiple && !self.is_unselectable() && (self.enabled || preselected);
    }

    /// Disabled, heading or separator: skipped by focus, never toggled.
    pub fn is_unselectable(&self) -> bool {
        self.disabled || self.role != Role::Option
    }

    pub fn is_group(&self) -> bool {
        !self.children.is_empty()
    }

    /// The label a render shows, indented by nesting level.
    pub fn indent(&self) -> String {
        "  ".repeat(self.level.saturating_sub(1))
    }
}

impl Editable for Choice {
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cx(index: usize) -> NormalizeContext<'static> {
        NormalizeContext {
            index: ChoiceId(index),
            parent: None,
            level: 1,
            multiple: true,
            preselect: &[],
        }
    }

    #[test]
    fn test_name_defaults_message_and_value() {
        let mut choice = Choice::pending(&"red".into());
        choice.normalize(cx(3));
        assert_eq!(choice.message, "red");
        assert_eq!(choice.value, json!("red"));
        assert_eq!(choice.index, ChoiceId(3));
    }

    #[test]
    fn test_value_only_choice_gets_name() {
        let config = ChoiceConfig {
            value: Some(json!(42)),
            ..Default::default()
        };
        let mut choice = Choice::pending(&config);
        choice.normalize(cx(0));
        assert_eq!(choice.name, "42");
        assert_eq!(choice.value, json!(42));
    }

    #[test]
    fn test_disabled_reason_becomes_hint() {
        let config = ChoiceConfig {
            name: Some("blue".into()),
            disabled: Some(Disabled::Reason("out of stock".into())),
            enabled: true,
            ..Default::default()
        };
        let mut choice = Choice::pending(&config);
        choice.normalize(cx(0));
        assert!(choice.disabled);
        assert_eq!(choice.hint.as_deref(), Some("out of stock"));
        assert!(!choice.enabled);
    }

    #[test]
    fn test_disabled_flag_gets_default_hint() {
        let config = ChoiceConfig {
            name: Some("green".into()),
            disabled: Some(Disabled::Flag(true)),
            ..Default::default()
        };
        let mut choice = Choice::pending(&config);
        choice.normalize(cx(0));
        assert_eq!(choice.hint.as_deref(), Some("(disabled)"));
    }

    #[test]
    fn test_normalize_twice_is_noop() {
        let config = ChoiceConfig {
            name: Some("a".into()),
            disabled: Some(Disabled::Reason("nope".into())),
            ..Default::default()
        };
        let mut choice = Choice::pending(&config);
        choice.normalize(cx(1));
        let once = choice.clone();
        choice.normalize(cx(7));
        assert_eq!(choice, once);
        assert!(choice.is_normalized());
    }

    #[test]
    fn test_single_select_never_starts_enabled() {
        let config = ChoiceConfig {
            name: Some("a".into()),
            enabled: true,
            ..Default::default()
        };
        let mut choice = Choice::pending(&config);
        choice.normalize(NormalizeContext {
            multiple: false,
            ..cx(0)
        });
        assert!(!choice.enabled);
    }

    #[test]
    fn test_preselect_by_name_or_index() {
        let preselect = vec!["b".to_string(), "2".to_string()];
        let mut by_name = Choice::pending(&"b".into());
        by_name.normalize(NormalizeContext {
            preselect: &preselect,
            ..cx(1)
        });
        assert!(by_name.enabled);

        let mut by_index = Choice::pending(&"c".into());
        by_index.normalize(NormalizeContext {
            preselect: &preselect,
            ..cx(2)
        });
        assert!(by_index.enabled);
    }

    #[test]
    fn test_config_parses_string_or_bool_disabled() {
        let config: ChoiceConfig = toml::from_str(
            r#"
name = "x"
disabled = "coming soon"
"#,
        )
        .unwrap();
        assert_eq!(config.disabled, Some(Disabled::Reason("coming soon".into())));

        let config: ChoiceConfig = toml::from_str("name = \"y\"\ndisabled = true").unwrap();
        assert_eq!(config.disabled, Some(Disabled::Flag(true)));
    }

    #[tokio::test]
    async fn test_source_resolves_every_entry_shape() {
        let source = ChoiceSource::List(vec![
            ChoiceEntry::from("literal"),
            ChoiceEntry::Producer(Box::new(|| ChoiceConfig::from("produced"))),
            ChoiceEntry::Pending(Box::pin(async { ChoiceConfig::from("awaited") })),
        ]);
        let names: Vec<_> = source
            .resolve()
            .await
            .into_iter()
            .filter_map(|c| c.name)
            .collect();
        assert_eq!(names, ["literal", "produced", "awaited"]);
    }
}
