//! Named capturing group registry and capture counting
//!
//! Subroutine expansion needs to know, from the pattern as written:
//! - the body of every named capturing group, to inline it at `\g<name>`
//! - how many capturing groups precede a given group, to renumber backreferences
//!
//! All counting happens in default context; parentheses inside character
//! classes are literals.

use std::collections::{HashMap, HashSet};

use crate::scanner::{Context, Scanner, Token, group_contents};

/// One definition of a named capturing group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDefinition {
    /// The group body, without the `(?<name>` opener and the closing `)`
    pub contents: String,
    /// Byte offset just past the body
    pub end: usize,
}

/// Registry of named capturing groups, keyed by name
///
/// Each name maps to every definition in pattern order. Only the first is
/// used for expansion; duplicate names are recorded so the limitation stays
/// visible rather than being resolved silently.
#[derive(Debug, Clone, Default)]
pub struct NamedGroupRegistry {
    groups: HashMap<String, Vec<GroupDefinition>>,
}

impl NamedGroupRegistry {
    /// Collect every named capturing group in the pattern
    pub fn collect(pattern: &str) -> Self {
        let mut groups: HashMap<String, Vec<GroupDefinition>> = HashMap::new();
        for scanned in Scanner::new(pattern) {
            if scanned.context != Context::Default {
                continue;
            }
            if let Token::CapturingGroupOpen(Some(name)) = scanned.token {
                let contents = group_contents(pattern, scanned.span.end);
                groups
                    .entry(name.to_string())
                    .or_default()
                    .push(GroupDefinition {
                        contents: contents.to_string(),
                        end: scanned.span.end + contents.len(),
                    });
            }
        }
        NamedGroupRegistry { groups }
    }

    /// The authoritative (first) definition of a group
    pub fn first(&self, name: &str) -> Option<&GroupDefinition> {
        self.groups.get(name).and_then(|defs| defs.first())
    }

    /// Every definition recorded for a name
    pub fn definitions(&self, name: &str) -> &[GroupDefinition] {
        self.groups.get(name).map_or(&[], Vec::as_slice)
    }

    /// Check if a group name exists
    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Number of distinct group names
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Capturing group openers in default context, in pattern order
fn capture_names(pattern: &str) -> impl Iterator<Item = Option<&str>> {
    Scanner::new(pattern).filter_map(|s| match (s.context, s.token) {
        (Context::Default, Token::CapturingGroupOpen(name)) => Some(name),
        _ => None,
    })
}

/// Count the capturing groups in a pattern
pub fn count_captures(pattern: &str) -> usize {
    capture_names(pattern).count()
}

/// Count every group opener (capturing or not) in a pattern
pub fn count_groups(pattern: &str) -> usize {
    Scanner::new(pattern)
        .filter(|s| s.context == Context::Default && s.token.opens_group())
        .count()
}

/// Count the capturing groups before the first group called `name`
///
/// Returns the total capture count when no such group exists.
pub fn count_captures_before_group(pattern: &str, name: &str) -> usize {
    capture_names(pattern)
        .take_while(|captured| *captured != Some(name))
        .count()
}

/// Names referenced by subroutines outside character classes
pub fn subroutine_names(pattern: &str) -> HashSet<&str> {
    Scanner::new(pattern)
        .filter_map(|s| match (s.context, s.token) {
            (Context::Default, Token::SubroutineRef(name)) => Some(name),
            _ => None,
        })
        .collect()
}

/// Count the capturing groups before the first one referenced by any subroutine
pub fn count_captures_before_first_referenced(pattern: &str) -> usize {
    let referenced = subroutine_names(pattern);
    capture_names(pattern)
        .take_while(|captured| !captured.is_some_and(|name| referenced.contains(name)))
        .count()
}
