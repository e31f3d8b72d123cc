//! # Actions
//!
//! Every keypress becomes an `Action` before it reaches a prompt.
//! User presses `↓`? That's `Action::Down`. Ctrl+C? That's `Action::Cancel`.
//!
//! A prompt variant handles an action by mutating its own state and returning
//! an `Effect`. The controller is the only place that turns effects into I/O:
//!
//! ```text
//! State + Action  →  handle()  →  Effect  →  controller (render / bell / submit / cancel)
//! ```
//!
//! Handlers never write to the terminal themselves, which keeps every prompt
//! variant testable without a terminal attached.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic operation resolved from a key event via the keymap tiers.
///
/// The serialized names match the keymap override tables in `config.toml`
/// (`[actions.ctrl] x = "toggleCursor"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    // Focus / cursor movement
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    First,
    Last,
    Next,
    Prev,
    Backward,
    Forward,
    PageUp,
    PageDown,
    ShiftUp,
    ShiftDown,
    ShiftLeft,
    ShiftRight,
    AltUp,
    AltDown,

    // Editing
    Delete,
    DeleteForward,
    CutForward,
    CutLeft,
    CutRight,
    Paste,
    ToggleCursor,
    Undo,
    Reset,

    // Selection
    Space,
    Number,

    // Lifecycle
    Submit,
    Cancel,

    // Bound by the default keymap but with no built-in handler
    Tab,
    NewItem,
    Search,
    Remove,
    Save,
}

impl Action {
    /// The keymap name of this action (`deleteForward`, `pageUp`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            Action::Up => "up",
            Action::Down => "down",
            Action::Left => "left",
            Action::Right => "right",
            Action::Home => "home",
            Action::End => "end",
            Action::First => "first",
            Action::Last => "last",
            Action::Next => "next",
            Action::Prev => "prev",
            Action::Backward => "backward",
            Action::Forward => "forward",
            Action::PageUp => "pageUp",
            Action::PageDown => "pageDown",
            Action::ShiftUp => "shiftUp",
            Action::ShiftDown => "shiftDown",
            Action::ShiftLeft => "shiftLeft",
            Action::ShiftRight => "shiftRight",
            Action::AltUp => "altUp",
            Action::AltDown => "altDown",
            Action::Delete => "delete",
            Action::DeleteForward => "deleteForward",
            Action::CutForward => "cutForward",
            Action::CutLeft => "cutLeft",
            Action::CutRight => "cutRight",
            Action::Paste => "paste",
            Action::ToggleCursor => "toggleCursor",
            Action::Undo => "undo",
            Action::Reset => "reset",
            Action::Space => "space",
            Action::Number => "number",
            Action::Submit => "submit",
            Action::Cancel => "cancel",
            Action::Tab => "tab",
            Action::NewItem => "newItem",
            Action::Search => "search",
            Action::Remove => "remove",
            Action::Save => "save",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the controller should do after a handler ran.
///
/// Handlers mutate state first and report the effect second; the render that
/// follows always observes the finished mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Nothing changed on screen.
    None,
    /// State changed, repaint the prompt region.
    Render,
    /// The action was rejected. Ring the bell, leave state untouched.
    Alert,
    /// Start the (possibly asynchronous) validate-and-submit sequence.
    Submit,
    /// Cancel the prompt.
    Cancel,
}

impl Effect {
    /// Map a "did anything change" flag onto `Render` / `Alert`.
    pub fn render_or_alert(changed: bool) -> Self {
        if changed { Effect::Render } else { Effect::Alert }
    }
}
