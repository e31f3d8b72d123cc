//! # Renderer
//!
//! Turns a [`Frame`] into the bytes that repaint a prompt's screen region.
//! Pure: the previous paint goes in, the new paint comes out, and nothing
//! ever asks the terminal where its cursor is.
//!
//! ```text
//!   ┌──────────────────────────────┐
//!   │ (top margin)                 │
//!   │ header                       │
//!   │ ? Name › jon█                │ ← prompt line, caret restored here
//!   │ body (choices / hint)        │ ┐
//!   │ footer                       │ ├ rows_below
//!   │ (bottom margin)              │ ┘
//!   └──────────────────────────────┘
//! ```
//!
//! Each paint:
//! 1. moves down `rows_below` to the last row of the previous paint,
//! 2. erases exactly as many physical rows as that paint wrapped to,
//! 3. writes the new region top to bottom,
//! 4. moves the caret back up to the edit point on the prompt line.

use serde::Deserialize;

use crate::tui::ansi;

/// Everything a prompt wants on screen, already styled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub header: String,
    /// Prefix + message + separator.
    pub prompt: String,
    /// Live value (or the final answer once submitted).
    pub value: String,
    /// Display columns into `value` where the caret belongs. `None` leaves the
    /// caret at the end of the region.
    pub cursor: Option<usize>,
    pub body: String,
    pub footer: String,
}

/// Blank space around the region: top/bottom in rows, left/right in columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Margin {
    #[serde(default)]
    pub top: usize,
    #[serde(default)]
    pub right: usize,
    #[serde(default)]
    pub bottom: usize,
    #[serde(default)]
    pub left: usize,
}

/// What the renderer remembers between paints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Painted {
    /// The text (with styles) of the last paint, without cursor movement.
    pub buffer: String,
    /// Rows between the restored caret and the last row of the paint.
    pub rows_below: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paint {
    /// Bytes to write.
    pub output: String,
    pub painted: Painted,
}

/// Erase sequence that undoes `prev` from wherever its caret was left.
pub fn clear(prev: &Painted, columns: usize) -> String {
    let mut out = ansi::cursor_down(prev.rows_below);
    out.push_str(&ansi::erase_lines(ansi::rows(&prev.buffer, columns)));
    out
}

fn pad(line: &str, margin: &Margin) -> String {
    format!(
        "{}{}{}",
        " ".repeat(margin.left),
        line,
        " ".repeat(margin.right)
    )
}

/// Paint `frame` over `prev`.
pub fn paint(prev: &Painted, frame: &Frame, margin: &Margin, columns: usize) -> Paint {
    let columns = columns.max(1);

    let mut above: Vec<String> = vec![String::new(); margin.top];
    if !frame.header.is_empty() {
        above.extend(frame.header.split('\n').map(|l| pad(l, margin)));
    }

    let prompt_line = pad(&format!("{}{}", frame.prompt, frame.value), margin);

    let mut below: Vec<String> = Vec::new();
    if !frame.body.is_empty() {
        below.extend(frame.body.split('\n').map(|l| pad(l, margin)));
    }
    if !frame.footer.is_empty() {
        below.extend(frame.footer.split('\n').map(|l| pad(l, margin)));
    }
    below.extend(std::iter::repeat_n(String::new(), margin.bottom));

    let mut lines = above;
    lines.push(prompt_line.clone());
    lines.extend(below.iter().cloned());
    let buffer = lines.join("\n");

    let mut output = clear(prev, columns);
    output.push_str(&buffer);

    let rows_below = match frame.cursor {
        Some(offset) => {
            let rows_after: usize = below.iter().map(|l| ansi::line_rows(l, columns)).sum();
            let prompt_rows = ansi::line_rows(&prompt_line, columns);
            let before_caret = margin.left + ansi::display_width(&frame.prompt) + offset;
            // A caret just past a full last row stays on that row's last column.
            let (caret_row, caret_col) = if before_caret / columns >= prompt_rows {
                (prompt_rows - 1, columns - 1)
            } else {
                (before_caret / columns, before_caret % columns)
            };
            let up = rows_after + (prompt_rows - 1 - caret_row);
            output.push_str(&ansi::cursor_up(up));
            output.push_str(&ansi::cursor_to_column(caret_col));
            up
        }
        None => 0,
    };

    Paint {
        output,
        painted: Painted { buffer, rows_below },
    }
}

/// Leave the region for good: caret to the line after the last row.
pub fn finish(prev: &Painted) -> String {
    let mut out = ansi::cursor_down(prev.rows_below);
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(prompt: &str, value: &str, cursor: Option<usize>, body: &str) -> Frame {
        Frame {
            prompt: prompt.to_string(),
            value: value.to_string(),
            cursor,
            body: body.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_paint_clears_one_line() {
        let p = paint(&Painted::default(), &frame("? Name ", "jon", None, ""), &Margin::default(), 80);
        assert!(p.output.starts_with("\x1b[2K\x1b[1G"));
        assert!(p.output.ends_with("? Name jon"));
        assert_eq!(p.painted.buffer, "? Name jon");
        assert_eq!(p.painted.rows_below, 0);
    }

    #[test]
    fn test_caret_restored_above_body() {
        let p = paint(
            &Painted::default(),
            &frame("? Pick ", "ab", Some(1), "  red\n  blue"),
            &Margin::default(),
            80,
        );
        // 2 body rows below; caret at column 7 + 1
        assert!(p.output.ends_with("\x1b[2A\x1b[9G"));
        assert_eq!(p.painted.rows_below, 2);
    }

    #[test]
    fn test_caret_on_wrapped_prompt_line() {
        // 10 columns, prompt+value = 15 chars → 2 rows; caret after 12 → row 1, col 2
        let p = paint(
            &Painted::default(),
            &frame("0123456789", "abcde", Some(2), ""),
            &Margin::default(),
            10,
        );
        assert!(p.output.ends_with("\x1b[3G"));
        assert_eq!(p.painted.rows_below, 0);

        // caret in the first row of the wrapped line → one row up
        let p = paint(
            &Painted::default(),
            &frame("01234", "abcdefghij", Some(1), ""),
            &Margin::default(),
            10,
        );
        assert!(p.output.ends_with("\x1b[1A\x1b[7G"));
        assert_eq!(p.painted.rows_below, 1);
    }

    #[test]
    fn test_caret_after_line_that_fills_the_width() {
        let p = paint(
            &Painted::default(),
            &frame("? N ", "abcdef", Some(6), ""),
            &Margin::default(),
            10,
        );
        assert!(p.output.ends_with("? N abcdef\x1b[10G"));
        assert_eq!(p.painted.rows_below, 0);
    }

    #[test]
    fn test_repaint_erases_previous_rows() {
        let prev = Painted {
            buffer: "? Pick \n  red\n  blue".to_string(),
            rows_below: 2,
        };
        let p = paint(&prev, &frame("? Pick ", "", None, ""), &Margin::default(), 80);
        let expected_clear = format!("\x1b[2B{}", ansi::erase_lines(3));
        assert!(p.output.starts_with(&expected_clear));
    }

    #[test]
    fn test_clear_counts_wide_chars() {
        let prev = Painted {
            buffer: "日本語日本語".to_string(), // 12 columns
            rows_below: 0,
        };
        assert_eq!(clear(&prev, 10), ansi::erase_lines(2));
    }

    #[test]
    fn test_margins() {
        let margin = Margin {
            top: 1,
            left: 2,
            bottom: 1,
            right: 0,
        };
        let p = paint(&Painted::default(), &frame("? ", "x", Some(1), ""), &margin, 80);
        assert_eq!(p.painted.buffer, "\n  ? x\n");
        // one bottom-margin row below the caret, caret after "  ? x"
        assert!(p.output.ends_with("\x1b[1A\x1b[6G"));
    }

    #[test]
    fn test_header_and_footer_order() {
        let f = Frame {
            header: "HEAD".into(),
            prompt: "? ".into(),
            value: "v".into(),
            body: "BODY".into(),
            footer: "FOOT".into(),
            cursor: None,
        };
        let p = paint(&Painted::default(), &f, &Margin::default(), 80);
        assert_eq!(p.painted.buffer, "HEAD\n? v\nBODY\nFOOT");
    }

    #[test]
    fn test_finish_moves_below_region() {
        let prev = Painted {
            buffer: "a\nb".into(),
            rows_below: 1,
        };
        assert_eq!(finish(&prev), "\x1b[1B\n");
    }
}
