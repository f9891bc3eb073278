//! Fragments interpolated into pattern templates
//!
//! A template is a list of literal segments with one fragment between each
//! pair. How a fragment is spliced depends on its kind:
//! - `Literal`: trusted pattern text, spliced verbatim
//! - `Partial`: pattern text that is sandboxed so it cannot interact with its
//!   neighbors
//! - `Escaped`: plain text that is escaped for its context, then sandboxed

use std::fmt;

/// A value interpolated between two template segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Trusted pattern text; must already be self-contained
    Literal(String),
    /// Pattern text marked for sandboxed composition
    Partial(String),
    /// Text matched literally
    Escaped(String),
}

impl Fragment {
    /// Mark a value as a partial pattern, coercing it to its string form
    pub fn partial(value: impl fmt::Display) -> Self {
        Fragment::Partial(value.to_string())
    }

    /// Splice a value verbatim
    pub fn literal(value: impl fmt::Display) -> Self {
        Fragment::Literal(value.to_string())
    }

    /// Match a value's text literally
    pub fn escaped(value: impl fmt::Display) -> Self {
        Fragment::Escaped(value.to_string())
    }

    /// The fragment's text as supplied
    pub fn value(&self) -> &str {
        match self {
            Fragment::Literal(v) | Fragment::Partial(v) | Fragment::Escaped(v) => v,
        }
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

/// Mark a value as a partial pattern
///
/// # Example
/// ```
/// use rexpand_core::{compose, partial};
///
/// let pattern = compose(&["^", "+$"], [partial(".abc")]).unwrap();
/// assert_eq!(pattern, "^(?:.abc)+$");
/// ```
pub fn partial(value: impl fmt::Display) -> Fragment {
    Fragment::partial(value)
}

/// Conversion into a fragment
///
/// Plain values are coerced to their string form and treated as partials;
/// a `Fragment` keeps its kind.
pub trait IntoFragment {
    /// Convert into a fragment
    fn into_fragment(self) -> Fragment;
}

impl IntoFragment for Fragment {
    fn into_fragment(self) -> Fragment {
        self
    }
}

impl IntoFragment for &Fragment {
    fn into_fragment(self) -> Fragment {
        self.clone()
    }
}

macro_rules! impl_into_partial {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoFragment for $ty {
                fn into_fragment(self) -> Fragment {
                    Fragment::partial(self)
                }
            }
        )*
    };
}

impl_into_partial!(
    &str, String, &String, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize,
);
