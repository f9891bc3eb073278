//! Interpolation sandbox
//!
//! Decides how a fragment is spliced into the pattern assembled so far. The
//! decision depends on the context at the splice point, found by lexing all
//! prior text, and on the tokens on either side of it:
//!
//! - default context: the fragment is wrapped in `(?:...)` unless it is a
//!   single atom whose boundaries are safe, and it must balance its own groups
//! - class context: the fragment must balance its own nested classes, may only
//!   be a single character at a range endpoint, and may not form a
//!   double-punctuator set operator with itself or its neighbors
//!
//! In both contexts an unfinished token before the splice point, or a dangling
//! escape at the end of the fragment, is rejected.
//!
//! The context at the splice point is taken from [`Scanner`], the tokenizer
//! the subroutine pass uses. The private lexer here only classifies tokens
//! (whole escape sequences, quantifiers, unfinished openers) for the boundary
//! rules; the scanner does not need that detail.

use std::borrow::Cow;
use std::ops::Range;

use crate::error::{BoundaryViolation, CompileError, Result};
use crate::escape::{Escape, EscapeKind, read_escape};
use crate::fragment::Fragment;
use crate::scanner::{Context, Scanner};

/// Characters that form a set operator when doubled inside a class
pub const DOUBLE_PUNCTUATORS: &str = "&!#$%*+,.:;<=>?@^`~";

/// Characters that need a backslash to be literal inside a class
const CLASS_SYNTAX_CHARS: &str = "()[]{}/-\\|";

/// Characters that need a backslash to be literal outside classes
const SYNTAX_CHARS: &str = "^$\\.*+?()[]{}|/";

fn is_double_punctuator(c: char) -> bool {
    DOUBLE_PUNCTUATORS.contains(c)
}

/// One unit of pattern text as the sandbox sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lexeme {
    Literal(char),
    Escape(Escape),
    GroupOpen,
    GroupClose,
    ClassOpen,
    ClassClose,
    Quantifier,
    Alternation,
    /// Group opener or interval quantifier cut off by the end of the text
    Incomplete,
}

impl Lexeme {
    fn is_incomplete(&self) -> bool {
        matches!(
            self,
            Lexeme::Incomplete
                | Lexeme::Escape(Escape {
                    kind: EscapeKind::Incomplete,
                    ..
                })
        )
    }
}

#[derive(Debug, Clone)]
struct Lexed {
    lexeme: Lexeme,
    span: Range<usize>,
    /// Class depth before the lexeme
    depth: usize,
}

/// Lex `text` starting inside `depth` classes; returns the lexemes and the final depth
fn lex(text: &str, mut depth: usize) -> (Vec<Lexed>, usize) {
    let mut lexed = Vec::new();
    let mut pos = 0;
    while let Some(c) = text[pos..].chars().next() {
        let rest = &text[pos..];
        let context = if depth == 0 {
            Context::Default
        } else {
            Context::CharacterClass
        };
        let (lexeme, len) = match (c, context) {
            ('\\', _) => {
                let escape = read_escape(text, pos, context);
                (Lexeme::Escape(escape), escape.len)
            }
            ('[', _) => (Lexeme::ClassOpen, 1 + usize::from(rest[1..].starts_with('^'))),
            (']', Context::CharacterClass) => (Lexeme::ClassClose, 1),
            (_, Context::CharacterClass) => (Lexeme::Literal(c), c.len_utf8()),
            ('(', _) => group_open(rest),
            (')', _) => (Lexeme::GroupClose, 1),
            ('|', _) => (Lexeme::Alternation, 1),
            ('*' | '+' | '?', _) => (Lexeme::Quantifier, 1),
            ('{', _) => interval(rest),
            _ => (Lexeme::Literal(c), c.len_utf8()),
        };
        let before = depth;
        match lexeme {
            Lexeme::ClassOpen => depth += 1,
            Lexeme::ClassClose => depth -= 1,
            _ => {}
        }
        lexed.push(Lexed {
            lexeme,
            span: pos..pos + len,
            depth: before,
        });
        pos += len;
    }
    (lexed, depth)
}

fn group_open(rest: &str) -> (Lexeme, usize) {
    let Some(after) = rest.strip_prefix("(?") else {
        return (Lexeme::GroupOpen, 1);
    };
    if after.starts_with([':', '=', '!']) {
        return (Lexeme::GroupOpen, 3);
    }
    if let Some(name) = after.strip_prefix('<') {
        if name.starts_with(['=', '!']) {
            return (Lexeme::GroupOpen, 4);
        }
        return match name.find('>') {
            Some(end) => (Lexeme::GroupOpen, 3 + end + 1),
            None => (Lexeme::Incomplete, rest.len()),
        };
    }
    // Modifier groups: `(?i:`, `(?i-m:`
    let flags = after
        .find(|c: char| !(c.is_ascii_alphabetic() || c == '-'))
        .unwrap_or(after.len());
    if flags == after.len() {
        (Lexeme::Incomplete, rest.len())
    } else {
        (
            Lexeme::GroupOpen,
            2 + flags + usize::from(after[flags..].starts_with(':')),
        )
    }
}

fn interval(rest: &str) -> (Lexeme, usize) {
    let body = &rest[1..];
    let end = body
        .find(|c: char| !(c.is_ascii_digit() || c == ','))
        .unwrap_or(body.len());
    if end == body.len() {
        return (Lexeme::Incomplete, rest.len());
    }
    if end > 0 && body.starts_with(|c: char| c.is_ascii_digit()) && body[end..].starts_with('}') {
        (Lexeme::Quantifier, end + 2)
    } else {
        (Lexeme::Literal('{'), 1)
    }
}

/// The token just before a splice point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tail {
    /// Nothing precedes the splice
    Start,
    /// An unfinished token the fragment would complete
    Incomplete,
    /// Right after `[` or `[^`
    ClassStart,
    /// A `-` that makes the fragment a range endpoint
    RangeOperator,
    /// `\0` or `\N`, which a leading digit would extend
    AbsorbsDigits,
    /// An unescaped character
    Literal(char),
    Other,
}

/// What the assembled text looks like at the splice point
#[derive(Debug, Clone, Copy)]
struct Boundary {
    context: Context,
    tail: Tail,
}

impl Boundary {
    fn before(assembled: &str) -> Self {
        // The context comes from the shared scanner so the subroutine pass
        // sees the same class nesting; the lexer only classifies the tail.
        let mut scanner = Scanner::new(assembled);
        scanner.by_ref().for_each(drop);
        let context = scanner.context();
        let (lexed, _) = lex(assembled, 0);
        let tail = match lexed.as_slice() {
            [] => Tail::Start,
            [.., prev, last] if is_range_operator(prev, last) => Tail::RangeOperator,
            [.., last] => match last.lexeme {
                lexeme if lexeme.is_incomplete() => Tail::Incomplete,
                Lexeme::Escape(escape) if escape.absorbs_digits() => Tail::AbsorbsDigits,
                Lexeme::ClassOpen => Tail::ClassStart,
                Lexeme::Literal(c) => Tail::Literal(c),
                _ => Tail::Other,
            },
        };
        Boundary { context, tail }
    }
}

fn is_range_operator(prev: &Lexed, last: &Lexed) -> bool {
    last.lexeme == Lexeme::Literal('-')
        && last.depth > 0
        && match prev.lexeme {
            Lexeme::Literal(c) => c != '-',
            Lexeme::Escape(_) => true,
            _ => false,
        }
}

/// One splice point in a template
#[derive(Debug, Clone, Copy)]
pub struct Splice<'a> {
    /// Zero-based index of the fragment
    pub index: usize,
    /// Pattern text assembled before the splice point
    pub assembled: &'a str,
    /// Raw template segment immediately before the splice point
    pub preceding: &'a str,
    /// Raw template segment immediately after the splice point
    pub following: &'a str,
}

impl Splice<'_> {
    fn position(&self) -> usize {
        self.assembled.len()
    }

    fn violation(&self, violation: BoundaryViolation) -> CompileError {
        CompileError::UnsafeFragmentBoundary {
            index: self.index,
            position: self.position(),
            violation,
        }
    }

    fn following_starts_with_digit(&self) -> bool {
        self.following.starts_with(|c: char| c.is_ascii_digit())
    }

    /// Whether the text after the splice makes the fragment a range start
    fn following_starts_range(&self) -> bool {
        match self.following.strip_prefix('-') {
            Some(after) => !after.starts_with([']', '-']),
            None => false,
        }
    }
}

/// Render a fragment for its splice point
///
/// Literal fragments pass through unchanged; partial and escaped fragments
/// are validated and wrapped for the context at the splice point.
#[tracing::instrument(level = "trace", skip_all, fields(index = splice.index))]
pub fn sandbox(splice: Splice<'_>, fragment: &Fragment) -> Result<String> {
    let backslashes = splice
        .preceding
        .chars()
        .rev()
        .take_while(|&c| c == '\\')
        .count();
    if backslashes % 2 == 1 {
        return Err(splice.violation(BoundaryViolation::EscapedSpliceMarker));
    }

    let boundary = Boundary::before(splice.assembled);
    let value: Cow<'_, str> = match fragment {
        Fragment::Literal(value) => return Ok(value.clone()),
        Fragment::Partial(value) => Cow::Borrowed(value),
        Fragment::Escaped(value) => Cow::Owned(escape(value, boundary.context)),
    };
    if boundary.tail == Tail::Incomplete {
        return Err(splice.violation(BoundaryViolation::IncompleteToken));
    }

    match boundary.context {
        Context::Default => sandbox_default(&splice, boundary, &value),
        Context::CharacterClass => sandbox_class(&splice, boundary, &value),
    }
}

fn check_trailing(splice: &Splice<'_>, lexed: &[Lexed]) -> Result<()> {
    match lexed.last().map(|l| l.lexeme) {
        Some(Lexeme::Escape(Escape {
            kind: EscapeKind::Incomplete,
            len: 1,
        })) => Err(splice.violation(BoundaryViolation::TrailingBackslash)),
        Some(lexeme) if lexeme.is_incomplete() => {
            Err(splice.violation(BoundaryViolation::IncompleteTrailingToken))
        }
        _ => Ok(()),
    }
}

fn sandbox_default(splice: &Splice<'_>, boundary: Boundary, value: &str) -> Result<String> {
    let (lexed, depth) = lex(value, 0);
    if depth > 0 {
        return Err(CompileError::UnbalancedClassDelimiter {
            index: splice.index,
            position: splice.position(),
            value: value.to_string(),
        });
    }

    let mut open_groups = 0usize;
    let mut alternation = false;
    for l in &lexed {
        match l.lexeme {
            Lexeme::GroupOpen => open_groups += 1,
            Lexeme::GroupClose if open_groups == 0 => {
                return Err(splice.violation(BoundaryViolation::UnmatchedGroupClose));
            }
            Lexeme::GroupClose => open_groups -= 1,
            Lexeme::Alternation if open_groups == 0 => alternation = true,
            _ => {}
        }
    }
    if open_groups > 0 {
        return Err(splice.violation(BoundaryViolation::UnclosedGroup));
    }
    check_trailing(splice, &lexed)?;

    let leading_digit =
        boundary.tail == Tail::AbsorbsDigits && value.starts_with(|c: char| c.is_ascii_digit());
    let trailing_digit = splice.following_starts_with_digit()
        && matches!(lexed.last().map(|l| l.lexeme), Some(Lexeme::Escape(e)) if e.absorbs_digits());
    let wrap = alternation || !is_atomic(&lexed) || leading_digit || trailing_digit;

    tracing::debug!(
        index = splice.index,
        alternation,
        leading_digit,
        trailing_digit,
        wrap,
        "sandboxed fragment in default context"
    );
    Ok(if wrap {
        format!("(?:{value})")
    } else {
        value.to_string()
    })
}

/// Whether the lexemes form one unit a quantifier binds to as a whole
fn is_atomic(lexed: &[Lexed]) -> bool {
    match lexed {
        [] => false,
        [single] => match single.lexeme {
            Lexeme::Literal(c) => c != '^' && c != '$',
            Lexeme::Escape(escape) => !matches!(
                escape.kind,
                EscapeKind::Assertion | EscapeKind::Incomplete
            ),
            _ => false,
        },
        [first, ..] => {
            let closes_at = match first.lexeme {
                Lexeme::GroupOpen => {
                    let mut open = 0usize;
                    lexed.iter().position(|l| {
                        match l.lexeme {
                            Lexeme::GroupOpen => open += 1,
                            Lexeme::GroupClose => open -= 1,
                            _ => return false,
                        }
                        open == 0
                    })
                }
                Lexeme::ClassOpen => lexed
                    .iter()
                    .position(|l| l.lexeme == Lexeme::ClassClose && l.depth == 1),
                _ => None,
            };
            closes_at == Some(lexed.len() - 1)
        }
    }
}

fn sandbox_class(splice: &Splice<'_>, boundary: Boundary, value: &str) -> Result<String> {
    let unbalanced = || CompileError::UnbalancedClassDelimiter {
        index: splice.index,
        position: splice.position(),
        value: value.to_string(),
    };
    let (lexed, depth) = lex(value, 1);
    if lexed
        .iter()
        .any(|l| l.lexeme == Lexeme::ClassClose && l.depth == 1)
        || depth != 1
    {
        return Err(unbalanced());
    }
    check_trailing(splice, &lexed)?;

    let doubled = lexed.windows(2).any(|pair| match (pair[0].lexeme, pair[1].lexeme) {
        (Lexeme::Literal(a), Lexeme::Literal(b)) => a == b && is_double_punctuator(a),
        _ => false,
    });
    if doubled {
        return Err(CompileError::AmbiguousClassSet {
            index: splice.index,
            position: splice.position(),
            value: value.to_string(),
        });
    }

    let invalid_range = || CompileError::InvalidRangeBoundary {
        index: splice.index,
        position: splice.position(),
        value: value.to_string(),
    };
    let edge_hyphen = [lexed.first(), lexed.last()]
        .into_iter()
        .flatten()
        .any(|l| l.lexeme == Lexeme::Literal('-') && l.depth == 1);
    if edge_hyphen {
        return Err(invalid_range());
    }

    let range_end = boundary.tail == Tail::RangeOperator;
    let range_start = splice.following_starts_range();
    if (range_end || range_start) && !denotes_one_char(&lexed) {
        return Err(invalid_range());
    }

    let following = splice.following.chars().next();
    let last = lexed.len().saturating_sub(1);
    let mut rendered = String::with_capacity(value.len() + 4);
    for (i, l) in lexed.iter().enumerate() {
        let text = &value[l.span.clone()];
        let top = l.depth == 1;
        match l.lexeme {
            Lexeme::Literal(c)
                if top
                    && is_double_punctuator(c)
                    && ((i == 0 && (c == '^' || boundary.tail == Tail::Literal(c)))
                        || (i == last && following == Some(c))) =>
            {
                rendered.push_str(&hex_escape(c));
            }
            Lexeme::Literal(c)
                if i == 0 && top && c.is_ascii_digit() && boundary.tail == Tail::AbsorbsDigits =>
            {
                rendered.push_str(&hex_escape(c));
            }
            Lexeme::Escape(Escape {
                kind: EscapeKind::Null,
                ..
            }) if i == last && splice.following_starts_with_digit() => {
                rendered.push_str(r"\x00");
            }
            _ => rendered.push_str(text),
        }
    }

    tracing::debug!(
        index = splice.index,
        range_start,
        range_end,
        changed = rendered != value,
        "sandboxed fragment in class context"
    );
    Ok(rendered)
}

/// Whether the lexemes are one class item denoting exactly one character
fn denotes_one_char(lexed: &[Lexed]) -> bool {
    match lexed {
        [single] => match single.lexeme {
            Lexeme::Literal(c) => !CLASS_SYNTAX_CHARS.contains(c),
            Lexeme::Escape(escape) => escape.is_single_char(),
            _ => false,
        },
        _ => false,
    }
}

fn hex_escape(c: char) -> String {
    format!("\\x{:02X}", u32::from(c))
}

/// Escape text so it matches literally in the given context
///
/// # Example
/// ```
/// use rexpand_core::{Context, escape};
///
/// assert_eq!(escape("a.b", Context::Default), r"a\.b");
/// assert_eq!(escape("a-~", Context::CharacterClass), r"a\-\x7E");
/// ```
pub fn escape(value: &str, context: Context) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match context {
            Context::Default if SYNTAX_CHARS.contains(c) => {
                escaped.push('\\');
                escaped.push(c);
            }
            Context::CharacterClass if CLASS_SYNTAX_CHARS.contains(c) => {
                escaped.push('\\');
                escaped.push(c);
            }
            Context::CharacterClass if is_double_punctuator(c) => {
                escaped.push_str(&hex_escape(c));
            }
            _ => escaped.push(c),
        }
    }
    escaped
}
