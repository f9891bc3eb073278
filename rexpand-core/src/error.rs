//! Error types for template composition and subroutine lowering
//!
//! This module provides error handling using the `thiserror` crate. Every
//! error is a deterministic syntax error raised at compile time: composition
//! and lowering abort on the first violation and never return a partial
//! pattern.

use thiserror::Error;

/// The main error type for composing and lowering patterns
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// `\g<name>` with no capturing group called `name`
    #[error("invalid named capture referenced by subroutine \\g<{name}> at position {position}")]
    UndefinedSubroutine {
        /// The referenced group name
        name: String,
        /// Byte offset of the reference in the pattern being lowered
        position: usize,
    },

    /// A subroutine that would expand itself, directly or through an open ancestor
    #[error("subroutine \\g<{name}> at position {position} followed a recursive reference")]
    RecursiveSubroutine {
        /// The referenced group name
        name: String,
        /// Byte offset of the reference in the pattern being lowered
        position: usize,
    },

    /// A fragment would interact with the pattern text around it
    #[error("fragment {index} at position {position}: {violation}")]
    UnsafeFragmentBoundary {
        /// Zero-based index of the fragment in the template
        index: usize,
        /// Byte offset of the splice point in the assembled pattern
        position: usize,
        /// What the fragment would have done
        violation: BoundaryViolation,
    },

    /// A fragment at a character class range endpoint that is not exactly one character
    #[error("fragment {index} at position {position} cannot be a range endpoint: {value:?}")]
    InvalidRangeBoundary {
        /// Zero-based index of the fragment in the template
        index: usize,
        /// Byte offset of the splice point in the assembled pattern
        position: usize,
        /// The fragment value after string coercion
        value: String,
    },

    /// A fragment that forms or collides with a double-punctuator set operator
    #[error("fragment {index} at position {position} forms an ambiguous set operator: {value:?}")]
    AmbiguousClassSet {
        /// Zero-based index of the fragment in the template
        index: usize,
        /// Byte offset of the splice point in the assembled pattern
        position: usize,
        /// The fragment value after string coercion
        value: String,
    },

    /// A fragment that opens or closes a character class it does not contain
    #[error("fragment {index} at position {position} has an unbalanced class delimiter: {value:?}")]
    UnbalancedClassDelimiter {
        /// Zero-based index of the fragment in the template
        index: usize,
        /// Byte offset of the splice point in the assembled pattern
        position: usize,
        /// The fragment value after string coercion
        value: String,
    },

    /// Template segments and fragments do not interleave
    #[error("template with {segments} segments cannot hold {fragments} fragments")]
    TemplateArity {
        /// Number of literal segments supplied
        segments: usize,
        /// Number of fragments supplied
        fragments: usize,
    },
}

/// Specific ways a fragment can break out of its splice point
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryViolation {
    /// The raw template text before the splice ends in an unescaped backslash
    #[error("raw template text escapes the interpolation marker")]
    EscapedSpliceMarker,

    /// The token before the splice is unfinished, so the fragment would complete it
    #[error("interpolation preceded by invalid incomplete token")]
    IncompleteToken,

    /// `)` closing a group opened outside the fragment
    #[error("unescaped ) closes a group opened outside the fragment")]
    UnmatchedGroupClose,

    /// `(` never closed inside the fragment
    #[error("unclosed group would swallow text after the fragment")]
    UnclosedGroup,

    /// Odd run of trailing backslashes
    #[error("trailing backslash would escape the character after the fragment")]
    TrailingBackslash,

    /// The fragment ends partway through an escape sequence
    #[error("fragment ends with an incomplete token")]
    IncompleteTrailingToken,
}

impl CompileError {
    /// The fragment index for sandbox errors, `None` for lowering errors
    pub fn fragment_index(&self) -> Option<usize> {
        match self {
            CompileError::UnsafeFragmentBoundary { index, .. }
            | CompileError::InvalidRangeBoundary { index, .. }
            | CompileError::AmbiguousClassSet { index, .. }
            | CompileError::UnbalancedClassDelimiter { index, .. } => Some(*index),
            CompileError::UndefinedSubroutine { .. }
            | CompileError::RecursiveSubroutine { .. }
            | CompileError::TemplateArity { .. } => None,
        }
    }
}

/// Result type alias for composition and lowering
pub type Result<T> = std::result::Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_subroutine_display() {
        let err = CompileError::UndefinedSubroutine {
            name: "missing".to_string(),
            position: 3,
        };
        assert_eq!(
            err.to_string(),
            r"invalid named capture referenced by subroutine \g<missing> at position 3"
        );
    }

    #[test]
    fn test_boundary_violation_display() {
        let err = CompileError::UnsafeFragmentBoundary {
            index: 0,
            position: 1,
            violation: BoundaryViolation::UnmatchedGroupClose,
        };
        assert_eq!(
            err.to_string(),
            "fragment 0 at position 1: unescaped ) closes a group opened outside the fragment"
        );
    }

    #[test]
    fn test_template_arity_display() {
        let err = CompileError::TemplateArity {
            segments: 1,
            fragments: 2,
        };
        assert_eq!(err.to_string(), "template with 1 segments cannot hold 2 fragments");
    }

    #[test]
    fn test_fragment_index() {
        let err = CompileError::AmbiguousClassSet {
            index: 2,
            position: 5,
            value: "~~".to_string(),
        };
        assert_eq!(err.fragment_index(), Some(2));

        let err = CompileError::RecursiveSubroutine {
            name: "a".to_string(),
            position: 0,
        };
        assert_eq!(err.fragment_index(), None);
    }
}
