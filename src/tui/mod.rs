//! # TUI Adapter
//!
//! The terminal-specific layer. Turns raw bytes into `KeyEvent`s, turns
//! `Frame`s into escape sequences, and owns the streams themselves.
//!
//! This is the only module that knows about crossterm. Prompts hand it a
//! frame and get bytes back; they never ask the terminal anything.
//!
//! ## Repaint Strategy
//!
//! Every render is a full logical repaint of the prompt's own region:
//! erase exactly what the last paint covered, write the new frame, move the
//! caret back to the edit point. No diffing, no cursor-position queries.
//! Row counts come from display widths (wide chars count two columns), so
//! the erase stays correct for CJK input and wrapped lines.

pub mod ansi;
pub mod keypress;
pub mod render;
pub mod terminal;
pub mod theme;

pub use render::{Frame, Margin};
pub use terminal::{Terminal, VirtualTerminal};
pub use theme::Theme;
