//! Matching through the external engine
//!
//! Patterns are lowered by `rexpand-core` and then compiled by `regress`,
//! an EcmaScript-syntax backtracking engine.

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

use rexpand_core::{IntoFragment, Options, compile, lower};

use crate::error::{Error, Result};

/// A match result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// The start position of the match
    pub start: usize,
    /// The end position of the match (exclusive)
    pub end: usize,
    /// Captured groups, index 0 holding group 1
    pub groups: Vec<Option<Range<usize>>>,
    /// Named captured groups that participated in the match
    pub named_groups: HashMap<String, Range<usize>>,
}

impl Match {
    fn from_engine(m: &regress::Match) -> Self {
        let range = m.range();
        Match {
            start: range.start,
            end: range.end,
            groups: m.groups().skip(1).collect(),
            named_groups: m
                .named_groups()
                .filter_map(|(name, range)| range.map(|r| (name.to_string(), r)))
                .collect(),
        }
    }

    /// Byte range of the whole match
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Get the matched text
    pub fn as_str<'a>(&self, input: &'a str) -> &'a str {
        &input[self.range()]
    }

    /// Get a capture group by index (1-based)
    pub fn group(&self, n: usize) -> Option<Range<usize>> {
        let index = n.checked_sub(1)?;
        self.groups.get(index).cloned().flatten()
    }

    /// Get a named capture group
    pub fn named_group(&self, name: &str) -> Option<Range<usize>> {
        self.named_groups.get(name).cloned()
    }

    /// Get the text of a capture group
    pub fn group_str<'a>(&self, input: &'a str, n: usize) -> Option<&'a str> {
        self.group(n).map(|range| &input[range])
    }

    /// Get the text of a named capture group
    pub fn named_group_str<'a>(&self, input: &'a str, name: &str) -> Option<&'a str> {
        self.named_group(name).map(|range| &input[range])
    }
}

/// A compiled pattern
#[derive(Debug, Clone)]
pub struct Regex {
    inner: regress::Regex,
    source: String,
    flags: String,
}

impl Regex {
    /// Compile a pattern with the default options
    ///
    /// # Example
    /// ```
    /// use rexpand::Regex;
    ///
    /// let regex = Regex::new(r"(?<d>\d)-\g<d>").unwrap();
    /// assert_eq!(regex.source(), r"(?<d>\d)-(\d)");
    /// assert!(regex.is_match("1-2"));
    /// ```
    pub fn new(pattern: &str) -> Result<Self> {
        Self::with_options(pattern, &Options::default())
    }

    /// Compile a pattern with explicit options
    pub fn with_options(pattern: &str, options: &Options) -> Result<Self> {
        let source = if options.subroutines() {
            lower(pattern)?
        } else {
            pattern.to_string()
        };
        Self::from_source(source, options.flags())
    }

    /// Compose a template, lower it and compile it with the default options
    ///
    /// # Example
    /// ```
    /// use rexpand::{Regex, partial};
    ///
    /// let regex = Regex::from_template(&["^", "+$"], [partial(".abc")]).unwrap();
    /// assert!(regex.is_match("_abc_abc"));
    /// ```
    pub fn from_template<S, I>(segments: &[S], fragments: I) -> Result<Self>
    where
        S: AsRef<str>,
        I: IntoIterator,
        I::Item: IntoFragment,
    {
        Self::builder().build_template(segments, fragments)
    }

    /// Start configuring a pattern
    pub fn builder() -> RegexBuilder {
        RegexBuilder::new()
    }

    #[tracing::instrument(level = "debug", skip_all, fields(flags = %flags))]
    fn from_source(source: String, flags: &str) -> Result<Self> {
        let inner = regress::Regex::with_flags(&source, flags)
            .map_err(|err| Error::Engine(format!("{err} in pattern {source:?}")))?;
        tracing::debug!(%source, "compiled lowered pattern");
        Ok(Regex {
            inner,
            source,
            flags: flags.to_string(),
        })
    }

    /// The lowered pattern handed to the engine
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The flags the pattern was compiled with
    pub fn flags(&self) -> &str {
        &self.flags
    }

    /// Check if the pattern matches anywhere in the input
    pub fn is_match(&self, input: &str) -> bool {
        self.inner.find(input).is_some()
    }

    /// Find the first match in the input
    pub fn find(&self, input: &str) -> Option<Match> {
        self.inner.find(input).map(|m| Match::from_engine(&m))
    }

    /// Iterate over non-overlapping matches
    pub fn find_iter<'r, 't>(&'r self, input: &'t str) -> impl Iterator<Item = Match> {
        self.inner.find_iter(input).map(|m| Match::from_engine(&m))
    }

    /// Find all non-overlapping matches
    pub fn find_all(&self, input: &str) -> Vec<Match> {
        self.find_iter(input).collect()
    }
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Builder for patterns with non-default options
///
/// # Example
/// ```
/// use rexpand::Regex;
///
/// let regex = Regex::builder().flags("iu").build("abc").unwrap();
/// assert!(regex.is_match("ABC"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RegexBuilder {
    options: Options,
}

impl RegexBuilder {
    /// Create a builder with the default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the engine flags
    pub fn flags(mut self, flags: impl Into<String>) -> Self {
        self.options = self.options.with_flags(flags);
        self
    }

    /// Enable or disable subroutine expansion
    pub fn subroutines(mut self, enabled: bool) -> Self {
        self.options = self.options.with_subroutines(enabled);
        self
    }

    /// The options collected so far
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Compile a pattern
    pub fn build(&self, pattern: &str) -> Result<Regex> {
        Regex::with_options(pattern, &self.options)
    }

    /// Compose a template and compile the result
    pub fn build_template<S, I>(&self, segments: &[S], fragments: I) -> Result<Regex>
    where
        S: AsRef<str>,
        I: IntoIterator,
        I::Item: IntoFragment,
    {
        let source = compile(segments, fragments, &self.options)?;
        Regex::from_source(source, self.options.flags())
    }
}
