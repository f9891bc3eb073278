//! Subroutine expansion with capture renumbering
//!
//! `\g<name>` inlines the body of the named capturing group at the reference
//! site, wrapped in a new capturing group. Every inserted capture shifts the
//! numbers of the captures after it, so numbered backreferences are rewritten
//! as the scan goes:
//!
//! - outside any expansion, `\N` points at the N-th capture the author wrote;
//!   the ledger records how far each of those moved
//! - inside an expansion, `\N` that targets a capture of the inlined group
//!   points at the inlined copy of that capture instead
//! - backreferences to captures not yet reached are patched after the scan
//!
//! Named groups inside an expansion lose their names so the lowered pattern
//! never defines a name twice; named backreferences to them are rewritten to
//! numbered ones.

use std::ops::Range;

use crate::error::{CompileError, Result};
use crate::groups::{
    NamedGroupRegistry, count_captures, count_captures_before_first_referenced,
    count_captures_before_group, count_groups,
};
use crate::scanner::{Context, Scanner, Token, has_unescaped_subroutine, token_at};

/// One subroutine expansion that the scan is still inside
#[derive(Debug, Clone)]
struct SubroutineFrame {
    name: String,
    contents: String,
    /// Groups of the expansion (wrapper included) not yet closed
    unclosed_groups: usize,
    /// Captures of the expansion, wrapper included
    num_captures: usize,
    /// Number of the inlined group among the captures the author wrote
    group_index: usize,
    /// Slot in `Lowering::expansions`
    expansion: usize,
}

impl SubroutineFrame {
    /// Position of an author capture number within this expansion
    fn offset_of(&self, num: usize) -> Option<usize> {
        (self.group_index..self.group_index + self.num_captures)
            .contains(&num)
            .then(|| num - self.group_index)
    }
}

/// Where a backreference should point once its target is known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    /// A capture the author wrote, by its original number
    Original(usize),
    /// A capture inside an expansion, by its offset from the wrapper
    Expanded { expansion: usize, offset: usize },
}

/// State threaded through one lowering pass
struct Lowering<'a> {
    original: &'a str,
    buffer: String,
    registry: NamedGroupRegistry,
    captures_before_first_referenced: usize,
    /// Shift of each author capture, indexed by its original number
    ledger: Vec<usize>,
    original_captures_passed: usize,
    final_captures_passed: usize,
    frames: Vec<SubroutineFrame>,
    /// Final numbers of the captures of every expansion so far
    expansions: Vec<Vec<usize>>,
    class_depth: usize,
    forward_refs: Vec<(Range<usize>, Target)>,
}

/// Expand every subroutine reference and renumber backreferences
///
/// Patterns without `\g<name>` outside character classes are returned
/// unchanged.
///
/// # Example
/// ```
/// use rexpand_core::lower;
///
/// let lowered = lower(r"(?<d>\d)-\g<d>(x)\2").unwrap();
/// assert_eq!(lowered, r"(?<d>\d)-(\d)(x)\3");
/// ```
#[tracing::instrument(level = "debug", skip_all, fields(len = pattern.len()))]
pub fn lower(pattern: &str) -> Result<String> {
    if !has_unescaped_subroutine(pattern) {
        tracing::trace!("no subroutines; pattern unchanged");
        return Ok(pattern.to_string());
    }
    Lowering::new(pattern).run()
}

impl<'a> Lowering<'a> {
    fn new(pattern: &'a str) -> Self {
        let registry = NamedGroupRegistry::collect(pattern);
        let captures_before_first_referenced = count_captures_before_first_referenced(pattern);
        tracing::debug!(
            named_groups = registry.len(),
            captures_before_first_referenced,
            "collected named groups"
        );
        Lowering {
            original: pattern,
            buffer: pattern.to_string(),
            registry,
            captures_before_first_referenced,
            ledger: vec![0],
            original_captures_passed: 0,
            final_captures_passed: 0,
            frames: Vec::new(),
            expansions: Vec::new(),
            class_depth: 0,
            forward_refs: Vec::new(),
        }
    }

    fn run(mut self) -> Result<String> {
        let mut pos = 0;
        while let Some((token, end)) = token_at(&self.buffer, pos) {
            if self.class_depth > 0 {
                match token {
                    Token::ClassOpen => self.class_depth += 1,
                    Token::ClassClose => self.class_depth -= 1,
                    _ => {}
                }
                pos = end;
                continue;
            }
            pos = match token {
                Token::ClassOpen => {
                    self.class_depth += 1;
                    end
                }
                Token::SubroutineRef(name) => {
                    let name = name.to_string();
                    self.expand(name, pos..end)?
                }
                Token::CapturingGroupOpen(name) => {
                    let named = name.is_some();
                    self.open_capture(named, pos..end)
                }
                Token::GroupClose => {
                    self.close_group();
                    end
                }
                Token::NumberedBackref(num) => self.numbered_backref(num as usize, pos..end),
                Token::NamedBackref(name) => {
                    let name = name.to_string();
                    self.named_backref(&name, pos..end)
                }
                _ => end,
            };
        }
        self.patch_forward_refs();
        tracing::debug!(
            expansions = self.expansions.len(),
            captures = self.final_captures_passed,
            "lowered subroutines"
        );
        Ok(self.buffer)
    }

    /// Splice the group body in place of `\g<name>`; scanning resumes at the wrapper
    fn expand(&mut self, name: String, span: Range<usize>) -> Result<usize> {
        let Some(definition) = self.registry.first(&name) else {
            return Err(CompileError::UndefinedSubroutine {
                name,
                position: span.start,
            });
        };
        if self.frames.iter().any(|frame| frame.name == name) {
            return Err(CompileError::RecursiveSubroutine {
                name,
                position: span.start,
            });
        }
        let duplicates = self.registry.definitions(&name).len();
        if duplicates > 1 {
            tracing::debug!(%name, duplicates, "expanding the first of several groups with this name");
        }

        let contents = definition.contents.clone();
        let wrapper = format!("({contents})");
        let frame = SubroutineFrame {
            unclosed_groups: count_groups(&wrapper),
            num_captures: count_captures(&contents) + 1,
            group_index: count_captures_before_group(self.original, &name) + 1,
            expansion: self.expansions.len(),
            name,
            contents,
        };
        tracing::trace!(
            name = %frame.name,
            position = span.start,
            num_captures = frame.num_captures,
            depth = self.frames.len() + 1,
            "expanding subroutine"
        );
        self.buffer.replace_range(span.clone(), &wrapper);
        self.expansions.push(Vec::with_capacity(frame.num_captures));
        self.frames.push(frame);
        Ok(span.start)
    }

    fn open_capture(&mut self, named: bool, span: Range<usize>) -> usize {
        self.final_captures_passed += 1;
        if let Some(frame) = self.frames.last() {
            self.expansions[frame.expansion].push(self.final_captures_passed);
            if named {
                self.buffer.replace_range(span.clone(), "(");
                return span.start + 1;
            }
            return span.end;
        }
        self.original_captures_passed += 1;
        self.ledger
            .push(self.final_captures_passed - self.original_captures_passed);
        span.end
    }

    fn close_group(&mut self) {
        let Some(frame) = self.frames.last_mut() else {
            return;
        };
        frame.unclosed_groups = frame.unclosed_groups.saturating_sub(1);
        if frame.unclosed_groups == 0 {
            self.frames.pop();
        }
    }

    /// Which capture `\num` written at the current position refers to
    fn target(&self, num: usize) -> Target {
        if num > self.captures_before_first_referenced {
            for frame in self.frames.iter().rev() {
                if let Some(offset) = frame.offset_of(num) {
                    return Target::Expanded {
                        expansion: frame.expansion,
                        offset,
                    };
                }
            }
        }
        Target::Original(num)
    }

    fn resolve(&self, target: Target) -> Option<usize> {
        match target {
            Target::Original(num) => self.ledger.get(num).map(|shift| num + shift),
            Target::Expanded { expansion, offset } => {
                self.expansions.get(expansion)?.get(offset).copied()
            }
        }
    }

    fn numbered_backref(&mut self, num: usize, span: Range<usize>) -> usize {
        let target = self.target(num);
        match self.resolve(target) {
            Some(resolved) if resolved != num => {
                let adjusted = format!("\\{resolved}");
                tracing::trace!(from = num, to = resolved, "renumbered backreference");
                self.buffer.replace_range(span.clone(), &adjusted);
                span.start + adjusted.len()
            }
            Some(_) => span.end,
            None => {
                self.forward_refs.push((span.clone(), target));
                span.end
            }
        }
    }

    /// `\k<name>` inside an expansion whose body defines `name` becomes numbered
    fn named_backref(&mut self, name: &str, span: Range<usize>) -> usize {
        let defined_in_expansion = self
            .frames
            .iter()
            .any(|frame| defines_group(&frame.contents, name));
        if !defined_in_expansion {
            return span.end;
        }
        let num = count_captures_before_group(self.original, name) + 1;
        let Some(resolved) = self.resolve(self.target(num)) else {
            return span.end;
        };
        let followed_by_digit = self.buffer[span.end..].starts_with(|c: char| c.is_ascii_digit());
        let adjusted = if followed_by_digit {
            format!("(?:\\{resolved})")
        } else {
            format!("\\{resolved}")
        };
        tracing::trace!(%name, to = resolved, "named backreference made numbered");
        self.buffer.replace_range(span.clone(), &adjusted);
        span.start + adjusted.len()
    }

    fn patch_forward_refs(&mut self) {
        let refs = std::mem::take(&mut self.forward_refs);
        for (span, target) in refs.into_iter().rev() {
            let Some(resolved) = self.resolve(target) else {
                continue;
            };
            let adjusted = format!("\\{resolved}");
            if self.buffer[span.clone()] != adjusted {
                self.buffer.replace_range(span, &adjusted);
            }
        }
    }
}

/// Whether `contents` opens a capturing group called `name` outside classes
fn defines_group(contents: &str, name: &str) -> bool {
    Scanner::new(contents).any(|s| {
        s.context == Context::Default && s.token == Token::CapturingGroupOpen(Some(name))
    })
}
