//! Escape sequence classification
//!
//! The scanner treats `\` plus one character as an atom. The sandbox needs
//! more: whether a whole escape sequence denotes one character or a set, and
//! whether it ends before it is complete (so text spliced after it would
//! change what it means).

use crate::scanner::Context;

/// What an escape sequence denotes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeKind {
    /// Exactly one character: `\n`, `\x41`, `\u{1F600}`, `\cA`, `\]`
    Char,
    /// The null escape `\0`; a following digit would change it
    Null,
    /// A set of characters or strings: `\d`, `\p{L}`, `\q{a|bc}`
    Set,
    /// Numbered backreference; following digits extend it
    Backref,
    /// Named backreference `\k<name>`
    NamedBackref,
    /// Subroutine reference `\g<name>`
    Subroutine,
    /// Zero-width assertion `\b`, `\B`
    Assertion,
    /// The text ends before the sequence is finished
    Incomplete,
}

/// One classified escape sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Escape {
    /// What the sequence denotes
    pub kind: EscapeKind,
    /// Length in bytes, including the backslash
    pub len: usize,
}

impl Escape {
    fn new(kind: EscapeKind, len: usize) -> Self {
        Escape { kind, len }
    }

    /// Whether a digit written right after this escape would be absorbed by it
    pub fn absorbs_digits(&self) -> bool {
        matches!(self.kind, EscapeKind::Null | EscapeKind::Backref)
    }

    /// Whether the sequence denotes exactly one character
    pub fn is_single_char(&self) -> bool {
        matches!(self.kind, EscapeKind::Char | EscapeKind::Null)
    }
}

/// Classify the escape sequence whose backslash sits at byte offset `pos`
pub fn read_escape(text: &str, pos: usize, context: Context) -> Escape {
    let rest = &text[pos + 1..];
    let Some(c) = rest.chars().next() else {
        return Escape::new(EscapeKind::Incomplete, 1);
    };
    let after = &rest[c.len_utf8()..];
    let simple = 1 + c.len_utf8();

    match c {
        '1'..='9' => {
            let digits = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            Escape::new(EscapeKind::Backref, 1 + digits)
        }
        '0' => Escape::new(EscapeKind::Null, 2),
        'd' | 'D' | 'w' | 'W' | 's' | 'S' => Escape::new(EscapeKind::Set, 2),
        'p' | 'P' | 'q' => match enclosed(after, '{', '}') {
            Enclosed::Complete(len) => Escape::new(EscapeKind::Set, simple + len),
            Enclosed::Unterminated => Escape::new(EscapeKind::Incomplete, 1 + rest.len()),
            Enclosed::Absent => cut_off(after, EscapeKind::Set, simple),
        },
        'k' => match enclosed(after, '<', '>') {
            Enclosed::Complete(len) => Escape::new(EscapeKind::NamedBackref, simple + len),
            Enclosed::Unterminated => Escape::new(EscapeKind::Incomplete, 1 + rest.len()),
            Enclosed::Absent => cut_off(after, EscapeKind::Char, simple),
        },
        'g' => match enclosed(after, '<', '>') {
            Enclosed::Complete(len) => Escape::new(EscapeKind::Subroutine, simple + len),
            Enclosed::Unterminated => Escape::new(EscapeKind::Incomplete, 1 + rest.len()),
            Enclosed::Absent => cut_off(after, EscapeKind::Char, simple),
        },
        'x' => fixed_hex(after, 2, simple),
        'u' => match enclosed(after, '{', '}') {
            Enclosed::Complete(len) => Escape::new(EscapeKind::Char, simple + len),
            Enclosed::Unterminated => Escape::new(EscapeKind::Incomplete, 1 + rest.len()),
            Enclosed::Absent => fixed_hex(after, 4, simple),
        },
        'c' => match after.chars().next() {
            Some(l) if l.is_ascii_alphabetic() => Escape::new(EscapeKind::Char, simple + 1),
            Some(_) => Escape::new(EscapeKind::Char, simple),
            None => Escape::new(EscapeKind::Incomplete, simple),
        },
        'b' if context == Context::CharacterClass => Escape::new(EscapeKind::Char, 2),
        'B' if context == Context::CharacterClass => Escape::new(EscapeKind::Set, 2),
        'b' | 'B' => Escape::new(EscapeKind::Assertion, 2),
        _ => Escape::new(EscapeKind::Char, simple),
    }
}

enum Enclosed {
    /// Delimited body present; length includes both delimiters
    Complete(usize),
    /// Opening delimiter present but the text ends first
    Unterminated,
    /// No opening delimiter
    Absent,
}

fn enclosed(text: &str, open: char, close: char) -> Enclosed {
    if !text.starts_with(open) {
        return Enclosed::Absent;
    }
    match text[1..].find(close) {
        Some(end) => Enclosed::Complete(1 + end + 1),
        None => Enclosed::Unterminated,
    }
}

/// `\p`, `\k` and friends at the very end of the text still expect their argument
fn cut_off(after: &str, kind: EscapeKind, len: usize) -> Escape {
    if after.is_empty() {
        Escape::new(EscapeKind::Incomplete, len)
    } else {
        Escape::new(kind, len)
    }
}

/// `\xHH` / `\uHHHH`: incomplete only when the text runs out mid-sequence
fn fixed_hex(text: &str, width: usize, prefix: usize) -> Escape {
    let digits = text
        .chars()
        .take(width)
        .take_while(char::is_ascii_hexdigit)
        .count();
    if digits == width {
        Escape::new(EscapeKind::Char, prefix + width)
    } else if digits == text.len() {
        Escape::new(EscapeKind::Incomplete, prefix + digits)
    } else {
        Escape::new(EscapeKind::Char, prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(text: &str) -> EscapeKind {
        read_escape(text, 0, Context::Default).kind
    }

    fn class_kind(text: &str) -> EscapeKind {
        read_escape(text, 0, Context::CharacterClass).kind
    }

    #[test]
    fn test_single_char_escapes() {
        for text in [r"\t", r"\n", r"\x01", r"\u0001", r"\u{10000}", r"\cA", r"\]", r"\\", r"\^"] {
            assert_eq!(kind(text), EscapeKind::Char, "{text}");
            assert_eq!(read_escape(text, 0, Context::Default).len, text.len(), "{text}");
        }
    }

    #[test]
    fn test_set_escapes() {
        for text in [r"\d", r"\W", r"\p{L}", r"\P{Script=Greek}", r"\q{a|bc}"] {
            assert_eq!(kind(text), EscapeKind::Set, "{text}");
            assert_eq!(read_escape(text, 0, Context::Default).len, text.len(), "{text}");
        }
    }

    #[test]
    fn test_incomplete_escapes() {
        for text in ["\\", r"\x", r"\x4", r"\u", r"\u12", r"\u{1", r"\p{L", r"\k<na", r"\c"] {
            assert_eq!(kind(text), EscapeKind::Incomplete, "{text}");
        }
    }

    #[test]
    fn test_argument_escapes_cut_off_at_end() {
        for text in [r"\p", r"\P", r"\q", r"\k", r"\g"] {
            assert_eq!(kind(text), EscapeKind::Incomplete, "{text}");
            assert_eq!(class_kind(text), EscapeKind::Incomplete, "{text}");
            assert_eq!(read_escape(text, 0, Context::Default).len, 2, "{text}");
        }
        assert_eq!(kind(r"\ka"), EscapeKind::Char);
        assert_eq!(kind(r"\pa"), EscapeKind::Set);
    }

    #[test]
    fn test_identity_after_bad_hex() {
        // `\xg` is complete; the engine decides whether it is valid
        let escape = read_escape(r"\xg", 0, Context::Default);
        assert_eq!(escape.kind, EscapeKind::Char);
        assert_eq!(escape.len, 2);
    }

    #[test]
    fn test_backrefs_absorb_digits() {
        let escape = read_escape(r"\12a", 0, Context::Default);
        assert_eq!(escape.kind, EscapeKind::Backref);
        assert_eq!(escape.len, 3);
        assert!(escape.absorbs_digits());
        assert!(read_escape(r"\0", 0, Context::Default).absorbs_digits());
        assert!(!read_escape(r"\k<a>", 0, Context::Default).absorbs_digits());
    }

    #[test]
    fn test_word_boundary_depends_on_context() {
        assert_eq!(kind(r"\b"), EscapeKind::Assertion);
        assert_eq!(class_kind(r"\b"), EscapeKind::Char);
        assert_eq!(class_kind(r"\B"), EscapeKind::Set);
    }

    #[test]
    fn test_offset_into_text() {
        let escape = read_escape(r"ab\x41c", 2, Context::Default);
        assert_eq!(escape, Escape::new(EscapeKind::Char, 4));
    }
}
