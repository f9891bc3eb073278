//! Context scanner for extended regex patterns
//!
//! The scanner walks a pattern left to right and recognizes one token at a
//! time, tracking whether each position lies in the default pattern body or
//! inside a character class. Class context is depth-counted rather than
//! parsed: every unescaped `[` opens a level and every unescaped `]` closes
//! one, which is all the sandbox and the subroutine engine need.
//!
//! Recognition priority at each position:
//! 1. subroutine reference `\g<name>` (name may not contain `&` or `>`)
//! 2. capturing group open `(` or `(?<name>`, never a lookbehind `(?<=`/`(?<!`
//! 3. numbered backreference `\1`, `\12`
//! 4. named backreference `\k<name>`
//! 5. an atom: an optional backslash plus exactly one character
//!
//! The scanner never fails. Malformed input is reported by its consumers.

use std::fmt;
use std::ops::Range;

/// Lexical context of a scan position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    /// Outside any character class
    Default,
    /// Inside at least one character class
    CharacterClass,
}

/// A token recognized at one position of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Subroutine reference `\g<name>`
    SubroutineRef(&'a str),
    /// Capturing group open, `(` or `(?<name>`
    CapturingGroupOpen(Option<&'a str>),
    /// Any other group open: `(?:`, lookaround, modifiers
    GroupOpen,
    /// Group close `)`
    GroupClose,
    /// Numbered backreference `\N`
    NumberedBackref(u32),
    /// Named backreference `\k<name>`
    NamedBackref(&'a str),
    /// Class open `[`
    ClassOpen,
    /// Class close `]`
    ClassClose,
    /// One literal character or one backslash plus the character it escapes
    Atom(&'a str),
}

impl Token<'_> {
    /// Whether this token opens a group of any kind
    pub fn opens_group(&self) -> bool {
        matches!(self, Token::CapturingGroupOpen(_) | Token::GroupOpen)
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::SubroutineRef(name) => write!(f, "subroutine `\\g<{}>`", name),
            Token::CapturingGroupOpen(Some(name)) => write!(f, "named group `(?<{}>`", name),
            Token::CapturingGroupOpen(None) => write!(f, "capturing group `(`"),
            Token::GroupOpen => write!(f, "group `(?`"),
            Token::GroupClose => write!(f, "`)`"),
            Token::NumberedBackref(n) => write!(f, "backref `\\{}`", n),
            Token::NamedBackref(name) => write!(f, "backref `\\k<{}>`", name),
            Token::ClassOpen => write!(f, "`[`"),
            Token::ClassClose => write!(f, "`]`"),
            Token::Atom(text) => write!(f, "atom `{}`", text),
        }
    }
}

/// A token together with where it was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scanned<'a> {
    /// The recognized token
    pub token: Token<'a>,
    /// Byte range of the token in the scanned pattern
    pub span: Range<usize>,
    /// Context in effect where the token starts
    pub context: Context,
}

/// Recognize the token starting at byte offset `pos`
///
/// Returns the token and the byte offset just past it, or `None` at the end
/// of the pattern. Recognition does not depend on context; callers decide
/// which tokens are meaningful where.
pub fn token_at(pattern: &str, pos: usize) -> Option<(Token<'_>, usize)> {
    let rest = pattern.get(pos..)?;
    let first = rest.chars().next()?;
    let (token, len) = match first {
        '\\' => read_backslash(rest),
        '(' => read_group_open(rest),
        ')' => (Token::GroupClose, 1),
        '[' => (Token::ClassOpen, 1),
        ']' => (Token::ClassClose, 1),
        c => (Token::Atom(&rest[..c.len_utf8()]), c.len_utf8()),
    };
    Some((token, pos + len))
}

/// Read a token that starts with a backslash
fn read_backslash(rest: &str) -> (Token<'_>, usize) {
    if let Some(name_rest) = rest.strip_prefix("\\g<")
        && let Some(end) = name_rest.find(['>', '&'])
        && end > 0
        && name_rest[end..].starts_with('>')
    {
        return (Token::SubroutineRef(&name_rest[..end]), 3 + end + 1);
    }

    let after = &rest[1..];
    if after.starts_with(|c: char| ('1'..='9').contains(&c)) {
        let digits = after
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(after.len());
        if let Ok(num) = after[..digits].parse::<u32>() {
            return (Token::NumberedBackref(num), 1 + digits);
        }
    }

    if let Some(name_rest) = rest.strip_prefix("\\k<")
        && let Some(end) = name_rest.find('>')
        && end > 0
    {
        return (Token::NamedBackref(&name_rest[..end]), 3 + end + 1);
    }

    match after.chars().next() {
        Some(c) => {
            let len = 1 + c.len_utf8();
            (Token::Atom(&rest[..len]), len)
        }
        None => (Token::Atom(rest), 1),
    }
}

/// Read a token that starts with `(`
fn read_group_open(rest: &str) -> (Token<'_>, usize) {
    if !rest[1..].starts_with('?') {
        return (Token::CapturingGroupOpen(None), 1);
    }
    if let Some(after) = rest.strip_prefix("(?<")
        && !after.starts_with(['=', '!'])
        && let Some(end) = after.find('>')
        && end > 0
    {
        return (Token::CapturingGroupOpen(Some(&after[..end])), 3 + end + 1);
    }
    (Token::GroupOpen, 1)
}

/// Iterator over the tokens of a pattern
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    pattern: &'a str,
    position: usize,
    depth: usize,
}

impl<'a> Scanner<'a> {
    /// Create a scanner that starts in default context
    pub fn new(pattern: &'a str) -> Self {
        Self::with_depth(pattern, 0)
    }

    /// Create a scanner that starts inside `depth` open character classes
    pub fn with_depth(pattern: &'a str, depth: usize) -> Self {
        Scanner {
            pattern,
            position: 0,
            depth,
        }
    }

    /// Create a scanner that resumes at byte offset `position` in default context
    pub fn starting_at(pattern: &'a str, position: usize) -> Self {
        Scanner {
            pattern,
            position,
            depth: 0,
        }
    }

    /// Current class nesting depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Context at the current position
    pub fn context(&self) -> Context {
        if self.depth == 0 {
            Context::Default
        } else {
            Context::CharacterClass
        }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Scanned<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (token, end) = token_at(self.pattern, self.position)?;
        let context = self.context();
        match token {
            Token::ClassOpen => self.depth += 1,
            Token::ClassClose => self.depth = self.depth.saturating_sub(1),
            _ => {}
        }
        let span = self.position..end;
        self.position = end;
        Some(Scanned {
            token,
            span,
            context,
        })
    }
}

/// Whether the pattern holds a subroutine reference outside character classes
pub fn has_unescaped_subroutine(pattern: &str) -> bool {
    Scanner::new(pattern)
        .any(|s| s.context == Context::Default && matches!(s.token, Token::SubroutineRef(_)))
}

/// Body of the group whose opener ends at byte offset `start`
///
/// Runs up to the `)` that balances the group, or to the end of the pattern
/// when the group is never closed.
pub fn group_contents(pattern: &str, start: usize) -> &str {
    let mut open_groups = 0usize;
    for scanned in Scanner::starting_at(pattern, start) {
        if scanned.context != Context::Default {
            continue;
        }
        if scanned.token.opens_group() {
            open_groups += 1;
        } else if scanned.token == Token::GroupClose {
            if open_groups == 0 {
                return &pattern[start..scanned.span.start];
            }
            open_groups -= 1;
        }
    }
    &pattern[start..]
}
