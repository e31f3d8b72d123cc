//! # Key Decoder
//!
//! Raw terminal bytes → [`KeyEvent`].
//!
//! Decoding is synchronous over bytes that have already arrived. There is no
//! timer that waits to see whether a lone `ESC` is the start of a longer
//! sequence: a sequence split across two reads decodes as a bare escape
//! followed by literal text.
//!
//! ```text
//! "\r"            → return          "\x1b[A"     → up (code "[A")
//! "\x7f"          → backspace       "\x1b[1;5C"  → right + ctrl
//! "\x03"          → c + ctrl        "\x1bb"      → b + meta
//! "7"             → number          "\x1b\x1b[D" → left + option
//! "Q"             → q + shift       0xE2 (1 byte)→ "\x1bb" (high-bit meta)
//! ```
//!
//! Modifier parameters follow the xterm `1 + bits` convention, decoded as
//! `m - 1` with shift = bit 0, ctrl = bit 2, and meta = bits 1 or 3.

use regex::Regex;
use std::sync::OnceLock;

use crate::core::keymap::KeyEvent;

const ESC: char = '\x1b';

fn meta_key_re() -> &'static Regex {
    static META_KEY_RE: OnceLock<Regex> = OnceLock::new();
    META_KEY_RE.get_or_init(|| {
        Regex::new(r"^\x1b([a-zA-Z0-9])$").expect("meta key regex should compile")
    })
}

fn fn_key_re() -> &'static Regex {
    static FN_KEY_RE: OnceLock<Regex> = OnceLock::new();
    FN_KEY_RE.get_or_init(|| {
        Regex::new(r"^(?:\x1b+)(O|N|\[|\[\[)(?:(\d+)(?:;(\d+))?([~^$])|(?:1;)?(\d+)?([a-zA-Z]))")
            .expect("function key regex should compile")
    })
}

/// Logical name for a raw escape code.
fn key_name(code: &str) -> Option<&'static str> {
    let name = match code {
        "OP" | "[11~" | "[[A" => "f1",
        "OQ" | "[12~" | "[[B" => "f2",
        "OR" | "[13~" | "[[C" => "f3",
        "OS" | "[14~" | "[[D" => "f4",
        "[[E" | "[15~" => "f5",
        "[17~" => "f6",
        "[18~" => "f7",
        "[19~" => "f8",
        "[20~" => "f9",
        "[21~" => "f10",
        "[23~" => "f11",
        "[24~" => "f12",

        "[A" | "OA" | "[a" | "Oa" => "up",
        "[B" | "OB" | "[b" | "Ob" => "down",
        "[C" | "OC" | "[c" | "Oc" => "right",
        "[D" | "OD" | "[d" | "Od" => "left",
        "[E" | "OE" | "[e" | "Oe" => "clear",
        "[F" | "OF" => "end",
        "[H" | "OH" => "home",

        "[1~" | "[7~" | "[7$" | "[7^" => "home",
        "[4~" | "[8~" | "[8$" | "[8^" => "end",
        "[2~" | "[2$" | "[2^" => "insert",
        "[3~" | "[3$" | "[3^" => "delete",
        "[5~" | "[[5~" | "[5$" | "[5^" => "pageup",
        "[6~" | "[[6~" | "[6$" | "[6^" => "pagedown",

        "[Z" => "tab",
        _ => return None,
    };
    Some(name)
}

/// rxvt-style codes that imply shift without a modifier parameter.
fn is_shift_code(code: &str) -> bool {
    matches!(
        code,
        "[a" | "[b" | "[c" | "[d" | "[e" | "[2$" | "[3$" | "[5$" | "[6$" | "[7$" | "[8$" | "[Z"
    )
}

/// rxvt-style codes that imply ctrl without a modifier parameter.
fn is_ctrl_code(code: &str) -> bool {
    matches!(
        code,
        "Oa" | "Ob" | "Oc" | "Od" | "Oe" | "[2^" | "[3^" | "[5^" | "[6^" | "[7^" | "[8^"
    )
}

/// Decode one key unit.
pub fn decode(s: &str) -> KeyEvent {
    let mut key = KeyEvent {
        sequence: s.to_string(),
        ..Default::default()
    };
    let first = s.chars().next();

    match s {
        "\r" => key.name = Some("return".into()),
        "\n" => key.name = Some("enter".into()),
        "\t" => key.name = Some("tab".into()),
        "\x08" | "\x7f" | "\x1b\x7f" | "\x1b\x08" => {
            key.name = Some("backspace".into());
            key.meta = first == Some(ESC);
        }
        "\x1b" | "\x1b\x1b" => {
            key.name = Some("escape".into());
            key.meta = s.len() == 2;
        }
        " " | "\x1b " => {
            key.name = Some("space".into());
            key.meta = s.len() == 2;
        }
        _ => decode_other(s, first, &mut key),
    }
    key
}

fn decode_other(s: &str, first: Option<char>, key: &mut KeyEvent) {
    let single = s.chars().count() == 1;
    match first {
        Some(c) if c <= '\x1a' => {
            // ctrl+letter: 0x01 → a ... 0x1a → z (NUL reads as ctrl+`)
            let letter = char::from(b'a' - 1 + c as u8);
            key.name = Some(letter.to_string());
            key.ctrl = true;
            return;
        }
        Some(c) if single && c.is_ascii_digit() => {
            key.name = Some("number".into());
            return;
        }
        Some(c) if single && c.is_ascii_lowercase() => {
            key.name = Some(c.to_string());
            return;
        }
        Some(c) if single && c.is_ascii_uppercase() => {
            key.name = Some(c.to_ascii_lowercase().to_string());
            key.shift = true;
            return;
        }
        None => return,
        _ => {}
    }

    if let Some(caps) = meta_key_re().captures(s) {
        key.meta = true;
        key.shift = caps[1].chars().all(|c| c.is_ascii_uppercase());
        key.name = Some(caps[1].to_ascii_lowercase());
        return;
    }

    if let Some(caps) = fn_key_re().captures(s) {
        if s.starts_with("\x1b\x1b") {
            key.option = true;
        }
        let code: String = [1, 2, 4, 6]
            .iter()
            .filter_map(|i| caps.get(*i).map(|m| m.as_str()))
            .collect();
        let modifier = caps
            .get(3)
            .or_else(|| caps.get(5))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(1)
            .saturating_sub(1);
        key.ctrl = modifier & 4 != 0 || is_ctrl_code(&code);
        key.meta = modifier & 10 != 0;
        key.shift = modifier & 1 != 0 || is_shift_code(&code);
        key.name = key_name(&code).map(str::to_string);
        key.code = Some(code);
    }
}

/// Decode a raw read. A lone byte above 127 is the high-bit form of meta and
/// is rewritten as `ESC` + `(byte - 128)` first.
pub fn decode_bytes(bytes: &[u8]) -> Vec<KeyEvent> {
    if let [b] = bytes {
        if *b > 127 {
            let s: String = [ESC, char::from(b - 128)].iter().collect();
            return vec![decode(&s)];
        }
    }
    let text = String::from_utf8_lossy(bytes);
    split_keys(&text).into_iter().map(decode).collect()
}

/// Split one read into key units.
///
/// Escape sequences stay whole. Everything else is one unit per char, so fast
/// typing that lands in a single read still dispatches key by key.
pub fn split_keys(text: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut rest = text;
    while let Some(first) = rest.chars().next() {
        let len = if first == ESC {
            escape_unit_len(rest)
        } else {
            first.len_utf8()
        };
        units.push(&rest[..len]);
        rest = &rest[len..];
    }
    units
}

fn escape_unit_len(s: &str) -> usize {
    if let Some(m) = fn_key_re().find(s) {
        return m.end();
    }
    match s[1..].chars().next() {
        Some(c) if c.is_ascii_alphanumeric() || matches!(c, '\x7f' | '\x08' | ' ' | ESC) => {
            1 + c.len_utf8()
        }
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(key: &KeyEvent) -> &str {
        key.name.as_deref().unwrap_or("")
    }

    #[test]
    fn test_literal_keys() {
        assert_eq!(name(&decode("\r")), "return");
        assert_eq!(name(&decode("\n")), "enter");
        assert_eq!(name(&decode("\t")), "tab");
        assert_eq!(name(&decode(" ")), "space");
        assert_eq!(name(&decode("\x1b")), "escape");
        assert!(!decode("\x1b").meta);
        assert!(decode("\x1b\x1b").meta);
    }

    #[test]
    fn test_backspace_variants() {
        for s in ["\x08", "\x7f"] {
            let key = decode(s);
            assert_eq!(name(&key), "backspace");
            assert!(!key.meta);
        }
        let key = decode("\x1b\x7f");
        assert_eq!(name(&key), "backspace");
        assert!(key.meta);
    }

    #[test]
    fn test_ctrl_letters() {
        let key = decode("\x03");
        assert_eq!(name(&key), "c");
        assert!(key.ctrl);
        let key = decode("\x01");
        assert_eq!(name(&key), "a");
        assert!(key.ctrl);
    }

    #[test]
    fn test_printable_letters_and_digits() {
        let key = decode("q");
        assert_eq!(name(&key), "q");
        assert!(!key.shift);

        let key = decode("Q");
        assert_eq!(name(&key), "q");
        assert!(key.shift);

        assert_eq!(name(&decode("7")), "number");
        assert_eq!(decode("7").sequence, "7");
    }

    #[test]
    fn test_meta_letter() {
        let key = decode("\x1bb");
        assert_eq!(name(&key), "b");
        assert!(key.meta);
        assert!(!key.shift);

        let key = decode("\x1bB");
        assert!(key.meta);
        assert!(key.shift);
    }

    #[test]
    fn test_arrows() {
        for (seq, expected) in [
            ("\x1b[A", "up"),
            ("\x1b[B", "down"),
            ("\x1b[C", "right"),
            ("\x1b[D", "left"),
            ("\x1bOA", "up"),
            ("\x1b[H", "home"),
            ("\x1b[F", "end"),
        ] {
            let key = decode(seq);
            assert_eq!(name(&key), expected, "{seq:?}");
            assert!(!key.ctrl && !key.shift && !key.meta);
        }
        assert_eq!(decode("\x1b[A").code.as_deref(), Some("[A"));
    }

    #[test]
    fn test_tilde_codes() {
        assert_eq!(name(&decode("\x1b[3~")), "delete");
        assert_eq!(name(&decode("\x1b[5~")), "pageup");
        assert_eq!(name(&decode("\x1b[6~")), "pagedown");
        assert_eq!(name(&decode("\x1b[15~")), "f5");
        assert_eq!(name(&decode("\x1b[24~")), "f12");
        assert_eq!(name(&decode("\x1b[[A")), "f1");
        assert_eq!(name(&decode("\x1bOP")), "f1");
    }

    #[test]
    fn test_modifier_parameter() {
        let key = decode("\x1b[1;5C");
        assert_eq!(name(&key), "right");
        assert!(key.ctrl);
        assert!(!key.shift);

        let key = decode("\x1b[1;2A");
        assert_eq!(name(&key), "up");
        assert!(key.shift);

        // 3 - 1 = 2 → meta
        let key = decode("\x1b[1;3B");
        assert!(key.meta);

        let key = decode("\x1b[3;5~");
        assert_eq!(name(&key), "delete");
        assert!(key.ctrl);
    }

    #[test]
    fn test_quirk_tables() {
        let key = decode("\x1b[a");
        assert_eq!(name(&key), "up");
        assert!(key.shift);

        let key = decode("\x1bOc");
        assert_eq!(name(&key), "right");
        assert!(key.ctrl);

        let key = decode("\x1b[Z");
        assert_eq!(name(&key), "tab");
        assert!(key.shift);

        let key = decode("\x1b[5^");
        assert_eq!(name(&key), "pageup");
        assert!(key.ctrl);
    }

    #[test]
    fn test_double_escape_sets_option() {
        let key = decode("\x1b\x1b[D");
        assert_eq!(name(&key), "left");
        assert!(key.option);
    }

    #[test]
    fn test_unknown_sequence_has_no_name() {
        let key = decode("\x1b[99~");
        assert_eq!(key.name, None);
        assert_eq!(key.code.as_deref(), Some("[99~"));
    }

    #[test]
    fn test_high_bit_meta() {
        let keys = decode_bytes(&[b'b' + 128]);
        assert_eq!(keys.len(), 1);
        assert_eq!(name(&keys[0]), "b");
        assert!(keys[0].meta);
    }

    #[test]
    fn test_split_keys() {
        assert_eq!(split_keys("12"), ["1", "2"]);
        assert_eq!(split_keys("\x1b[A\x1b[B"), ["\x1b[A", "\x1b[B"]);
        assert_eq!(split_keys("a\x1bbc"), ["a", "\x1bb", "c"]);
        assert_eq!(split_keys("\x1b"), ["\x1b"]);
        assert_eq!(split_keys("é\r"), ["é", "\r"]);
        assert_eq!(split_keys("\x1b\x1b"), ["\x1b\x1b"]);
    }

    #[test]
    fn test_decode_bytes_utf8() {
        let keys = decode_bytes("日".as_bytes());
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].sequence, "日");
        assert_eq!(keys[0].printable(), Some("日"));
    }
}
