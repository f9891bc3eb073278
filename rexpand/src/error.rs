//! Error types for the engine facade

use rexpand_core::CompileError;
use thiserror::Error;

/// Errors from compiling a pattern into a matcher
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Composition or subroutine lowering failed
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// The engine rejected the lowered pattern
    #[error("engine error: {0}")]
    Engine(String),
}

/// Result type alias for facade operations
pub type Result<T> = std::result::Result<T, Error>;
