//! Rexpand Core Library
//!
//! Compiles an extended regex dialect into plain patterns: fragments are
//! interpolated into templates without interacting with their neighbors, and
//! `\g<name>` subroutines are inlined with backreferences renumbered.

pub mod assembler;
pub mod error;
pub mod escape;
pub mod fragment;
pub mod groups;
pub mod options;
pub mod sandbox;
pub mod scanner;
pub mod subroutines;

pub use assembler::{CompileReport, Template, compile, compile_debug, compose};
pub use error::{BoundaryViolation, CompileError, Result};
pub use escape::{Escape, EscapeKind, read_escape};
pub use fragment::{Fragment, IntoFragment, partial};
pub use groups::{GroupDefinition, NamedGroupRegistry};
pub use options::{DEFAULT_FLAGS, Options};
pub use sandbox::{DOUBLE_PUNCTUATORS, Splice, escape, sandbox};
pub use scanner::{Context, Scanned, Scanner, Token, has_unescaped_subroutine, token_at};
pub use subroutines::lower;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_to_end() {
        let pattern = compile(
            &["^(?<byte>", r")(?:\.\g<byte>){3}$"],
            [partial(r"25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d")],
            &Options::default(),
        )
        .unwrap();
        assert_eq!(
            pattern,
            r"^(?<byte>(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d))(?:\.((?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d))){3}$"
        );
    }
}
