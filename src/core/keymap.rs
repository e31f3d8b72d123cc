//! # Keymap
//!
//! Resolves a decoded [`KeyEvent`] into an [`Action`] name.
//!
//! Four tiers are consulted; the first tier whose modifier is set wins, even
//! when it has no entry for the key (the prompt then falls back to its default
//! handler, e.g. "insert this character"):
//!
//! 1. `ctrl`   — when `ctrl` is set
//! 2. `option` — when `option` is set and the tier is non-empty
//! 3. `shift`  — when `shift` is set
//! 4. `keys`   — plain lookup by key name
//!
//! Overrides from `config.toml` or from a prompt's options are merged per
//! entry, so one custom binding never has to redefine the whole tier.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::action::Action;

/// One decoded keypress. Immutable once produced by the decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEvent {
    /// The raw text of the chunk that produced this event.
    pub sequence: String,
    /// Logical key name (`"up"`, `"return"`, `"a"`, `"number"`, ...).
    pub name: Option<String>,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub option: bool,
    /// Raw escape code for function/arrow keys (`"[A"`, `"[15~"`, ...).
    pub code: Option<String>,
}

impl KeyEvent {
    pub fn named(name: &str) -> Self {
        Self {
            sequence: String::new(),
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }

    /// The printable text this key would insert, if any.
    ///
    /// Control, escape and function keys produce nothing.
    pub fn printable(&self) -> Option<&str> {
        if self.sequence.is_empty() || self.ctrl || self.code.is_some() {
            return None;
        }
        if self.sequence.chars().any(|c| c.is_control()) {
            return None;
        }
        Some(&self.sequence)
    }
}

/// Caller-supplied bindings, merged entry-by-entry over the defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct KeymapOverrides {
    #[serde(default)]
    pub ctrl: HashMap<String, Action>,
    #[serde(default)]
    pub shift: HashMap<String, Action>,
    #[serde(default)]
    pub option: HashMap<String, Action>,
    #[serde(default)]
    pub keys: HashMap<String, Action>,
}

impl KeymapOverrides {
    pub fn is_empty(&self) -> bool {
        self.ctrl.is_empty()
            && self.shift.is_empty()
            && self.option.is_empty()
            && self.keys.is_empty()
    }

    /// Layer `other` on top of `self` (entries in `other` win).
    pub fn merged_with(&self, other: &KeymapOverrides) -> KeymapOverrides {
        let layer = |base: &HashMap<String, Action>, top: &HashMap<String, Action>| {
            let mut out = base.clone();
            out.extend(top.iter().map(|(k, v)| (k.clone(), *v)));
            out
        };
        KeymapOverrides {
            ctrl: layer(&self.ctrl, &other.ctrl),
            shift: layer(&self.shift, &other.shift),
            option: layer(&self.option, &other.option),
            keys: layer(&self.keys, &other.keys),
        }
    }
}

/// The resolved keymap a prompt dispatches against.
#[derive(Debug, Clone)]
pub struct Keymap {
    ctrl: HashMap<String, Action>,
    shift: HashMap<String, Action>,
    option: HashMap<String, Action>,
    keys: HashMap<String, Action>,
}

fn table(entries: &[(&str, Action)]) -> HashMap<String, Action> {
    entries.iter().map(|(k, a)| (k.to_string(), *a)).collect()
}

impl Default for Keymap {
    fn default() -> Self {
        use Action::*;
        Self {
            ctrl: table(&[
                ("a", First),
                ("b", Backward),
                ("c", Cancel),
                ("d", DeleteForward),
                ("e", Last),
                ("f", Forward),
                ("g", Reset),
                ("i", Tab),
                ("k", CutForward),
                ("l", Reset),
                ("n", NewItem),
                ("m", Cancel),
                ("j", Submit),
                ("p", Search),
                ("r", Remove),
                ("s", Save),
                ("u", Undo),
                ("w", CutLeft),
                ("x", ToggleCursor),
                ("v", Paste),
            ]),
            shift: table(&[
                ("up", ShiftUp),
                ("down", ShiftDown),
                ("left", ShiftLeft),
                ("right", ShiftRight),
                ("tab", Prev),
            ]),
            option: table(&[
                ("b", Backward),
                ("f", Forward),
                ("d", CutRight),
                ("left", CutLeft),
                ("up", AltUp),
                ("down", AltDown),
            ]),
            keys: table(&[
                ("pageup", PageUp),
                ("pagedown", PageDown),
                ("home", Home),
                ("end", End),
                ("cancel", Cancel),
                ("delete", DeleteForward),
                ("backspace", Delete),
                ("down", Down),
                ("enter", Submit),
                ("escape", Cancel),
                ("left", Left),
                ("space", Space),
                ("number", Number),
                ("return", Submit),
                ("right", Right),
                ("tab", Next),
                ("up", Up),
            ]),
        }
    }
}

impl Keymap {
    /// Default tiers with `overrides` merged over them entry-by-entry.
    pub fn with_overrides(overrides: &KeymapOverrides) -> Self {
        let mut keymap = Self::default();
        keymap.ctrl.extend(overrides.ctrl.iter().map(|(k, v)| (k.clone(), *v)));
        keymap.shift.extend(overrides.shift.iter().map(|(k, v)| (k.clone(), *v)));
        keymap.option.extend(overrides.option.iter().map(|(k, v)| (k.clone(), *v)));
        keymap.keys.extend(overrides.keys.iter().map(|(k, v)| (k.clone(), *v)));
        keymap
    }

    /// Resolve the action for a key event. `None` means "no binding".
    pub fn resolve(&self, key: &KeyEvent) -> Option<Action> {
        let name = key.name.as_deref()?;
        if key.ctrl {
            return self.ctrl.get(name).copied();
        }
        if key.option && !self.option.is_empty() {
            return self.option.get(name).copied();
        }
        if key.shift {
            return self.shift.get(name).copied();
        }
        self.keys.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> KeyEvent {
        KeyEvent::named(name)
    }

    #[test]
    fn test_plain_keys_resolve() {
        let keymap = Keymap::default();
        assert_eq!(keymap.resolve(&key("up")), Some(Action::Up));
        assert_eq!(keymap.resolve(&key("return")), Some(Action::Submit));
        assert_eq!(keymap.resolve(&key("backspace")), Some(Action::Delete));
        assert_eq!(keymap.resolve(&key("number")), Some(Action::Number));
        assert_eq!(keymap.resolve(&key("q")), None);
    }

    #[test]
    fn test_ctrl_tier_wins_over_everything() {
        let keymap = Keymap::default();
        let mut k = key("c");
        k.ctrl = true;
        k.shift = true;
        assert_eq!(keymap.resolve(&k), Some(Action::Cancel));

        // ctrl wins even without an entry: no fallthrough to plain keys
        let mut k = key("up");
        k.ctrl = true;
        assert_eq!(keymap.resolve(&k), None);
    }

    #[test]
    fn test_option_tier_before_shift() {
        let keymap = Keymap::default();
        let mut k = key("up");
        k.option = true;
        k.shift = true;
        assert_eq!(keymap.resolve(&k), Some(Action::AltUp));
    }

    #[test]
    fn test_empty_option_tier_is_skipped() {
        let mut keymap = Keymap::default();
        keymap.option.clear();
        let mut k = key("up");
        k.option = true;
        k.shift = true;
        assert_eq!(keymap.resolve(&k), Some(Action::ShiftUp));
    }

    #[test]
    fn test_shift_tier() {
        let keymap = Keymap::default();
        let mut k = key("tab");
        k.shift = true;
        assert_eq!(keymap.resolve(&k), Some(Action::Prev));

        // Shifted letters have no binding and fall to the default handler
        let mut k = key("a");
        k.shift = true;
        assert_eq!(keymap.resolve(&k), None);
    }

    #[test]
    fn test_override_replaces_single_entry() {
        let mut overrides = KeymapOverrides::default();
        overrides.ctrl.insert("x".to_string(), Action::Submit);
        let keymap = Keymap::with_overrides(&overrides);

        let mut x = key("x");
        x.ctrl = true;
        assert_eq!(keymap.resolve(&x), Some(Action::Submit));

        // The rest of the ctrl tier survives
        let mut c = key("c");
        c.ctrl = true;
        assert_eq!(keymap.resolve(&c), Some(Action::Cancel));
    }

    #[test]
    fn test_overrides_merge_layers() {
        let mut base = KeymapOverrides::default();
        base.keys.insert("q".to_string(), Action::Cancel);
        let mut top = KeymapOverrides::default();
        top.keys.insert("q".to_string(), Action::Submit);
        top.ctrl.insert("o".to_string(), Action::Paste);

        let merged = base.merged_with(&top);
        assert_eq!(merged.keys.get("q"), Some(&Action::Submit));
        assert_eq!(merged.ctrl.get("o"), Some(&Action::Paste));
        assert!(!merged.is_empty());
    }

    #[test]
    fn test_overrides_parse_from_toml() {
        let overrides: KeymapOverrides = toml::from_str(
            r#"
[ctrl]
x = "toggleCursor"

[keys]
q = "cancel"
"#,
        )
        .unwrap();
        assert_eq!(overrides.ctrl.get("x"), Some(&Action::ToggleCursor));
        assert_eq!(overrides.keys.get("q"), Some(&Action::Cancel));
    }

    #[test]
    fn test_printable() {
        let mut k = key("a");
        k.sequence = "a".to_string();
        assert_eq!(k.printable(), Some("a"));

        k.ctrl = true;
        assert_eq!(k.printable(), None);

        let mut esc = key("escape");
        esc.sequence = "\x1b".to_string();
        assert_eq!(esc.printable(), None);
    }
}
