//! Single-line edit buffer operations shared by every prompt that takes typed input.
//!
//! `Editable` owns no data. Implementors expose their text and cursor and get
//! the editing vocabulary for free. The cursor is a *char* index into the text
//! (`0..=text.chars().count()`), never a byte offset, so multi-byte input can't
//! split a code point.

/// Byte offset of the char at `char_idx` (or `text.len()` past the end).
pub fn byte_offset(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

pub trait Editable {
    fn text(&self) -> &str;
    fn cursor(&self) -> usize;
    /// Replace the buffer. Implementations must store the cursor clamped.
    fn set_text(&mut self, text: String, cursor: usize);

    fn char_len(&self) -> usize {
        self.text().chars().count()
    }

    fn set_cursor(&mut self, cursor: usize) {
        let text = self.text().to_string();
        self.set_text(text, cursor);
    }

    /// Insert `chunk` at the cursor and advance past it.
    fn insert(&mut self, chunk: &str) {
        let text = self.text();
        let at = byte_offset(text, self.cursor());
        let mut next = String::with_capacity(text.len() + chunk.len());
        next.push_str(&text[..at]);
        next.push_str(chunk);
        next.push_str(&text[at..]);
        let cursor = self.cursor() + chunk.chars().count();
        self.set_text(next, cursor);
    }

    /// Backspace. Returns false at the start of the buffer.
    fn delete_back(&mut self) -> bool {
        let cursor = self.cursor();
        if cursor == 0 {
            return false;
        }
        let text = self.text();
        let start = byte_offset(text, cursor - 1);
        let end = byte_offset(text, cursor);
        let next = format!("{}{}", &text[..start], &text[end..]);
        self.set_text(next, cursor - 1);
        true
    }

    /// Delete the char under the cursor. Returns false at the end of the buffer.
    fn delete_forward(&mut self) -> bool {
        let cursor = self.cursor();
        if cursor >= self.char_len() {
            return false;
        }
        let text = self.text();
        let start = byte_offset(text, cursor);
        let end = byte_offset(text, cursor + 1);
        let next = format!("{}{}", &text[..start], &text[end..]);
        self.set_text(next, cursor);
        true
    }

    fn move_left(&mut self) -> bool {
        let cursor = self.cursor();
        if cursor == 0 {
            return false;
        }
        self.set_cursor(cursor - 1);
        true
    }

    fn move_right(&mut self) -> bool {
        let cursor = self.cursor();
        if cursor >= self.char_len() {
            return false;
        }
        self.set_cursor(cursor + 1);
        true
    }

    fn move_first(&mut self) {
        self.set_cursor(0);
    }

    fn move_last(&mut self) {
        let len = self.char_len();
        self.set_cursor(len);
    }

    /// Remove everything after the cursor and return it.
    fn cut_forward(&mut self) -> Option<String> {
        let cursor = self.cursor();
        if cursor >= self.char_len() {
            return None;
        }
        let text = self.text();
        let at = byte_offset(text, cursor);
        let cut = text[at..].to_string();
        let kept = text[..at].to_string();
        self.set_text(kept, cursor);
        Some(cut)
    }

    /// Remove the word left of the cursor (back to the previous space) and return it.
    fn cut_left(&mut self) -> Option<String> {
        let cursor = self.cursor();
        if cursor == 0 {
            return None;
        }
        let text = self.text();
        let at = byte_offset(text, cursor);
        let (before, after) = text.split_at(at);
        let (kept, cut) = match before.rfind(' ') {
            Some(space) => (&before[..space], &before[space + 1..]),
            None => ("", before),
        };
        let cut = cut.to_string();
        let cursor = kept.chars().count();
        let next = format!("{kept}{after}");
        self.set_text(next, cursor);
        Some(cut)
    }
}
