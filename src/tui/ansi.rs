//! Escape-sequence vocabulary and display-width math.
//!
//! Everything returns a `String` so the renderer can assemble a whole frame
//! before a single write. Sequences come from crossterm's `Command::write_ansi`.
//! A zero-count move yields `""`, because `CSI 0 A` still moves one row on
//! most terminals.

use crossterm::Command;
use crossterm::cursor::{Hide, MoveDown, MoveToColumn, MoveUp, Show};
use crossterm::terminal::{Clear, ClearType};
use unicode_width::UnicodeWidthStr;

pub const BELL: &str = "\x07";

fn ansi(command: impl Command) -> String {
    let mut out = String::new();
    // Writing into a String can't fail.
    let _ = command.write_ansi(&mut out);
    out
}

fn clamp(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

pub fn cursor_up(n: usize) -> String {
    if n == 0 { String::new() } else { ansi(MoveUp(clamp(n))) }
}

pub fn cursor_down(n: usize) -> String {
    if n == 0 { String::new() } else { ansi(MoveDown(clamp(n))) }
}

/// 0-based column.
pub fn cursor_to_column(col: usize) -> String {
    ansi(MoveToColumn(clamp(col)))
}

pub fn erase_line() -> String {
    ansi(Clear(ClearType::CurrentLine))
}

pub fn hide_cursor() -> String {
    ansi(Hide)
}

pub fn show_cursor() -> String {
    ansi(Show)
}

/// Erase `count` rows upward from the caret's row and leave the caret at
/// column 0 of the topmost one.
pub fn erase_lines(count: usize) -> String {
    let mut out = String::new();
    for i in 0..count {
        out.push_str(&erase_line());
        if i + 1 < count {
            out.push_str(&cursor_up(1));
        }
    }
    if count > 0 {
        out.push_str(&cursor_to_column(0));
    }
    out
}

/// Terminal columns `text` occupies, ignoring escape sequences and counting
/// wide characters as two.
pub fn display_width(text: &str) -> usize {
    let plain = strip_ansi_escapes::strip_str(text);
    UnicodeWidthStr::width(plain.as_str())
}

/// Physical rows a single logical line wraps to at `columns`.
pub fn line_rows(line: &str, columns: usize) -> usize {
    let columns = columns.max(1);
    let width = display_width(line);
    if width == 0 { 1 } else { 1 + (width - 1) / columns }
}

/// Physical rows a block of text occupies at `columns`.
pub fn rows(text: &str, columns: usize) -> usize {
    text.split('\n').map(|line| line_rows(line, columns)).sum()
}

/// Strip escape sequences (for logs and plain-text assertions).
pub fn strip(text: &str) -> String {
    strip_ansi_escapes::strip_str(text)
}
