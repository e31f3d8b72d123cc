//! # Theme
//!
//! Style roles and symbols. Prompts never pick raw colours; they ask for a
//! role (`primary`, `danger`, ...) and the theme decides what that looks like.
//! Both tables can be overridden per entry from `[styles]` / `[symbols]` in
//! the config file or from a prompt's own options.
//!
//! With colour disabled (`--no-color`, `NO_COLOR`) every role renders plain text.

use crossterm::style::{Attribute, Color, ContentStyle, Stylize};
use log::warn;
use std::collections::{BTreeMap, HashMap};

use crate::core::state::Status;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Primary,
    Success,
    Danger,
    Warning,
    Info,
    Muted,
    Disabled,
    Dark,
    Strong,
    Em,
    Heading,
    Placeholder,
    Highlight,
}

impl Role {
    pub fn from_name(name: &str) -> Option<Role> {
        let role = match name {
            "primary" => Role::Primary,
            "success" => Role::Success,
            "danger" => Role::Danger,
            "warning" => Role::Warning,
            "info" => Role::Info,
            "muted" => Role::Muted,
            "disabled" => Role::Disabled,
            "dark" => Role::Dark,
            "strong" => Role::Strong,
            "em" => Role::Em,
            "heading" => Role::Heading,
            "placeholder" => Role::Placeholder,
            "highlight" => Role::Highlight,
            _ => return None,
        };
        Some(role)
    }

    /// Role used for the prefix symbol in each status.
    pub fn for_status(status: Status) -> Role {
        match status {
            Status::Pending => Role::Primary,
            Status::Submitted => Role::Success,
            Status::Cancelled => Role::Danger,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Styles {
    enabled: bool,
    roles: HashMap<Role, ContentStyle>,
}

impl Default for Styles {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Styles {
    pub fn new(enabled: bool) -> Self {
        let base = ContentStyle::new();
        let roles = HashMap::from([
            (Role::Primary, base.with(Color::Cyan)),
            (Role::Success, base.with(Color::Green)),
            (Role::Danger, base.with(Color::Magenta)),
            (Role::Warning, base.with(Color::Yellow)),
            (Role::Info, base.with(Color::Cyan)),
            (Role::Muted, base.attribute(Attribute::Dim)),
            (Role::Disabled, base.with(Color::DarkGrey)),
            (Role::Dark, base.with(Color::DarkGrey)),
            (Role::Strong, base.attribute(Attribute::Bold)),
            (Role::Em, base.attribute(Attribute::Italic)),
            (
                Role::Heading,
                base.attribute(Attribute::Dim).attribute(Attribute::Underlined),
            ),
            (
                Role::Placeholder,
                base.with(Color::Cyan).attribute(Attribute::Dim),
            ),
            (Role::Highlight, base.attribute(Attribute::Reverse)),
        ]);
        Self { enabled, roles }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Replace the colour of individual roles (`primary = "blue"`).
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, String>) -> Self {
        for (name, colour) in overrides {
            let Some(role) = Role::from_name(name) else {
                warn!("Unknown style role {name:?}, ignoring");
                continue;
            };
            match Color::try_from(colour.as_str()) {
                Ok(colour) => {
                    self.roles.insert(role, ContentStyle::new().with(colour));
                }
                Err(_) => warn!("Unknown colour {colour:?} for style {name:?}, ignoring"),
            }
        }
        self
    }

    pub fn paint(&self, role: Role, text: &str) -> String {
        if !self.enabled || text.is_empty() {
            return text.to_string();
        }
        match self.roles.get(&role) {
            Some(style) => style.apply(text).to_string(),
            None => text.to_string(),
        }
    }

    pub fn primary(&self, text: &str) -> String {
        self.paint(Role::Primary, text)
    }

    pub fn success(&self, text: &str) -> String {
        self.paint(Role::Success, text)
    }

    pub fn danger(&self, text: &str) -> String {
        self.paint(Role::Danger, text)
    }

    pub fn muted(&self, text: &str) -> String {
        self.paint(Role::Muted, text)
    }

    pub fn disabled(&self, text: &str) -> String {
        self.paint(Role::Disabled, text)
    }

    pub fn strong(&self, text: &str) -> String {
        self.paint(Role::Strong, text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbols {
    pub question: String,
    pub asterisk: String,
    pub check: String,
    pub cross: String,
    pub pointer: String,
    pub pointer_small: String,
    pub middot: String,
    pub ellipsis: String,
    pub radio_on: String,
    pub radio_off: String,
    pub identical_to: String,
    pub line: String,
}

/// Plain-ASCII fallbacks for consoles without the glyphs.
fn glyph(unicode: &str, ascii: &str) -> String {
    let chosen = if cfg!(windows) { ascii } else { unicode };
    chosen.to_string()
}

impl Default for Symbols {
    fn default() -> Self {
        Self {
            question: "?".into(),
            asterisk: "*".into(),
            check: glyph("✔", "√"),
            cross: glyph("✖", "×"),
            pointer: glyph("❯", ">"),
            pointer_small: glyph("›", "»"),
            middot: "·".into(),
            ellipsis: "…".into(),
            radio_on: glyph("◉", "(*)"),
            radio_off: glyph("◯", "( )"),
            identical_to: "≡".into(),
            line: "─".into(),
        }
    }
}

impl Symbols {
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, String>) -> Self {
        for (name, text) in overrides {
            let slot = match name.as_str() {
                "question" => &mut self.question,
                "asterisk" => &mut self.asterisk,
                "check" => &mut self.check,
                "cross" => &mut self.cross,
                "pointer" => &mut self.pointer,
                "pointer_small" => &mut self.pointer_small,
                "middot" => &mut self.middot,
                "ellipsis" => &mut self.ellipsis,
                "radio_on" => &mut self.radio_on,
                "radio_off" => &mut self.radio_off,
                "identical_to" => &mut self.identical_to,
                "line" => &mut self.line,
                _ => {
                    warn!("Unknown symbol {name:?}, ignoring");
                    continue;
                }
            };
            *slot = text.clone();
        }
        self
    }

    /// Prefix symbol for a status.
    pub fn prefix(&self, status: Status) -> &str {
        match status {
            Status::Pending => &self.question,
            Status::Submitted => &self.check,
            Status::Cancelled => &self.cross,
        }
    }

    /// Separator between message and value for a status.
    pub fn separator(&self, status: Status) -> &str {
        match status {
            Status::Pending => &self.pointer_small,
            Status::Submitted | Status::Cancelled => &self.middot,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Theme {
    pub styles: Styles,
    pub symbols: Symbols,
}

impl Theme {
    pub fn new(
        color: bool,
        styles: &BTreeMap<String, String>,
        symbols: &BTreeMap<String, String>,
    ) -> Self {
        Self {
            styles: Styles::new(color).with_overrides(styles),
            symbols: Symbols::default().with_overrides(symbols),
        }
    }

    /// Plain-text theme with default symbols.
    pub fn plain() -> Self {
        Self {
            styles: Styles::new(false),
            symbols: Symbols::default(),
        }
    }

    /// Layer per-prompt overrides over this theme.
    pub fn merged(
        &self,
        styles: &BTreeMap<String, String>,
        symbols: &BTreeMap<String, String>,
    ) -> Self {
        Self {
            styles: self.styles.clone().with_overrides(styles),
            symbols: self.symbols.clone().with_overrides(symbols),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::ansi;

    #[test]
    fn test_disabled_styles_are_plain() {
        let styles = Styles::new(false);
        assert_eq!(styles.primary("hi"), "hi");
        assert_eq!(styles.danger("err"), "err");
    }

    #[test]
    fn test_enabled_styles_wrap_text() {
        let styles = Styles::new(true);
        let painted = styles.primary("hi");
        assert_ne!(painted, "hi");
        assert!(painted.contains("hi"));
        assert_eq!(ansi::strip(&painted), "hi");
    }

    #[test]
    fn test_style_override() {
        let mut overrides = BTreeMap::new();
        overrides.insert("primary".to_string(), "blue".to_string());
        overrides.insert("nonsense".to_string(), "red".to_string());
        overrides.insert("danger".to_string(), "not-a-colour".to_string());
        let styles = Styles::new(true).with_overrides(&overrides);
        let expected = ContentStyle::new().with(Color::Blue).apply("x").to_string();
        assert_eq!(styles.primary("x"), expected);
        // Bad colour keeps the default
        assert_eq!(styles.danger("x"), Styles::new(true).danger("x"));
    }

    #[test]
    fn test_symbol_override() {
        let mut overrides = BTreeMap::new();
        overrides.insert("pointer".to_string(), ">".to_string());
        let symbols = Symbols::default().with_overrides(&overrides);
        assert_eq!(symbols.pointer, ">");
        assert_eq!(symbols.question, "?");
    }

    #[test]
    fn test_status_symbols() {
        let symbols = Symbols::default();
        assert_eq!(symbols.prefix(Status::Pending), "?");
        assert_eq!(symbols.separator(Status::Submitted), "·");
        assert_eq!(Role::for_status(Status::Cancelled), Role::Danger);
    }
}
