//! Pattern assembly
//!
//! Feeds template segments and sandboxed fragments into one pattern string,
//! then runs the subroutine pass over the result.

use std::fmt;

use crate::error::{CompileError, Result};
use crate::fragment::{Fragment, IntoFragment};
use crate::options::Options;
use crate::sandbox::{Splice, sandbox};
use crate::subroutines::lower;

/// Interleave template segments with sandboxed fragments
///
/// There must be exactly one more segment than fragments.
///
/// # Example
/// ```
/// use rexpand_core::{Fragment, compose};
///
/// let pattern = compose(&["^a", "d$"], ["b|c"]).unwrap();
/// assert_eq!(pattern, "^a(?:b|c)d$");
///
/// let pattern = compose(&["[", "]"], [Fragment::escaped("a-z")]).unwrap();
/// assert_eq!(pattern, r"[a\-z]");
/// ```
#[tracing::instrument(level = "debug", skip_all, fields(segments = segments.len()))]
pub fn compose<S, I>(segments: &[S], fragments: I) -> Result<String>
where
    S: AsRef<str>,
    I: IntoIterator,
    I::Item: IntoFragment,
{
    let fragments: Vec<Fragment> = fragments
        .into_iter()
        .map(IntoFragment::into_fragment)
        .collect();
    let Some((first, rest)) = segments.split_first() else {
        return Err(CompileError::TemplateArity {
            segments: 0,
            fragments: fragments.len(),
        });
    };
    if rest.len() != fragments.len() {
        return Err(CompileError::TemplateArity {
            segments: segments.len(),
            fragments: fragments.len(),
        });
    }

    let mut assembled = first.as_ref().to_string();
    for (index, (fragment, following)) in fragments.iter().zip(rest).enumerate() {
        let following = following.as_ref();
        let rendered = sandbox(
            Splice {
                index,
                assembled: &assembled,
                preceding: segments[index].as_ref(),
                following,
            },
            fragment,
        )?;
        assembled.push_str(&rendered);
        assembled.push_str(following);
    }
    tracing::debug!(fragments = fragments.len(), len = assembled.len(), "composed template");
    Ok(assembled)
}

/// Compose a template and lower its subroutines
pub fn compile<S, I>(segments: &[S], fragments: I, options: &Options) -> Result<String>
where
    S: AsRef<str>,
    I: IntoIterator,
    I::Item: IntoFragment,
{
    let assembled = compose(segments, fragments)?;
    if options.subroutines() {
        lower(&assembled)
    } else {
        Ok(assembled)
    }
}

/// Compile with the intermediate stages kept for inspection
pub fn compile_debug<S, I>(segments: &[S], fragments: I, options: &Options) -> Result<CompileReport>
where
    S: AsRef<str>,
    I: IntoIterator,
    I::Item: IntoFragment,
{
    let template = describe(segments);
    let assembled = compose(segments, fragments)?;
    let lowered = if options.subroutines() {
        lower(&assembled)?
    } else {
        assembled.clone()
    };
    Ok(CompileReport {
        template,
        assembled,
        lowered,
        flags: options.flags().to_string(),
    })
}

/// Segments joined with numbered `${N}` placeholders
fn describe<S: AsRef<str>>(segments: &[S]) -> String {
    let mut template = String::new();
    for (index, segment) in segments.iter().enumerate() {
        if index > 0 {
            template.push_str(&format!("${{{}}}", index - 1));
        }
        template.push_str(segment.as_ref());
    }
    template
}

/// Result of a compilation with debug information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileReport {
    /// The template with `${N}` marking each fragment
    pub template: String,
    /// The pattern after sandboxed composition
    pub assembled: String,
    /// The pattern after subroutine lowering
    pub lowered: String,
    /// Flags the pattern is meant to be compiled with
    pub flags: String,
}

impl fmt::Display for CompileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Compilation Report")?;
        writeln!(f, "==================")?;
        writeln!(f, "Template:  {}", self.template)?;
        writeln!(f, "Assembled: {}", self.assembled)?;
        writeln!(f, "Lowered:   {}", self.lowered)?;
        write!(f, "Flags:     {}", self.flags)
    }
}

/// A reusable list of template segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<String>,
}

impl Template {
    /// Create a template from its literal segments
    pub fn new<S: AsRef<str>>(segments: &[S]) -> Self {
        Template {
            segments: segments.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    /// The literal segments
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of fragments the template holds
    pub fn arity(&self) -> usize {
        self.segments.len().saturating_sub(1)
    }

    /// Interleave the segments with sandboxed fragments
    pub fn compose<I>(&self, fragments: I) -> Result<String>
    where
        I: IntoIterator,
        I::Item: IntoFragment,
    {
        compose(&self.segments, fragments)
    }

    /// Compose, then lower subroutines
    pub fn compile<I>(&self, fragments: I, options: &Options) -> Result<String>
    where
        I: IntoIterator,
        I::Item: IntoFragment,
    {
        compile(&self.segments, fragments, options)
    }

    /// Join the segments with raw values into one partial fragment
    ///
    /// Values are spliced as written; the result is sandboxed as a whole
    /// wherever it is interpolated.
    ///
    /// # Example
    /// ```
    /// use rexpand_core::{Template, compose};
    ///
    /// let digit = Template::new(&["[0-", "]"]).partial([7]).unwrap();
    /// assert_eq!(compose(&["^", "+$"], [digit]).unwrap(), "^[0-7]+$");
    /// ```
    pub fn partial<I>(&self, values: I) -> Result<Fragment>
    where
        I: IntoIterator,
        I::Item: fmt::Display,
    {
        let values: Vec<String> = values.into_iter().map(|v| v.to_string()).collect();
        if self.arity() != values.len() || self.segments.is_empty() {
            return Err(CompileError::TemplateArity {
                segments: self.segments.len(),
                fragments: values.len(),
            });
        }
        let mut joined = String::new();
        for (index, segment) in self.segments.iter().enumerate() {
            if let Some(value) = index.checked_sub(1).and_then(|i| values.get(i)) {
                joined.push_str(value);
            }
            joined.push_str(segment);
        }
        Ok(Fragment::Partial(joined))
    }
}
