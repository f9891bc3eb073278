//! Rexpand
//!
//! Extended regex patterns for an EcmaScript-syntax engine: compose patterns
//! from sandboxed fragments, reuse named groups with `\g<name>` subroutines,
//! and match with the lowered result.
//!
//! # Example
//! ```
//! use rexpand::{Regex, partial};
//!
//! let byte = partial(r"25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d");
//! let ipv4 = Regex::from_template(&["^(?<byte>", r")(?:\.\g<byte>){3}$"], [byte]).unwrap();
//! assert!(ipv4.is_match("192.168.0.1"));
//! assert!(!ipv4.is_match("256.1.1.1"));
//! ```

pub mod engine;
pub mod error;

pub use engine::{Match, Regex, RegexBuilder};
pub use error::{Error, Result};
pub use rexpand_core::{
    CompileError, CompileReport, Fragment, IntoFragment, Options, Template, compile,
    compile_debug, compose, lower, partial,
};
