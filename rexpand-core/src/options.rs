//! Compilation options

/// Flags used when none are given; Unicode mode makes every escape the
/// sandbox emits unambiguous
pub const DEFAULT_FLAGS: &str = "u";

/// Options for compiling a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    flags: String,
    subroutines: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            flags: DEFAULT_FLAGS.to_string(),
            subroutines: true,
        }
    }
}

impl Options {
    /// Create options with the defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flags handed to the engine
    pub fn with_flags(mut self, flags: impl Into<String>) -> Self {
        self.flags = flags.into();
        self
    }

    /// Enable or disable subroutine expansion
    pub fn with_subroutines(mut self, enabled: bool) -> Self {
        self.subroutines = enabled;
        self
    }

    /// Flags handed to the engine
    pub fn flags(&self) -> &str {
        &self.flags
    }

    /// Whether `\g<name>` is expanded
    pub fn subroutines(&self) -> bool {
        self.subroutines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.flags(), "u");
        assert!(options.subroutines());
    }

    #[test]
    fn test_chained_setters() {
        let options = Options::new().with_flags("iu").with_subroutines(false);
        assert_eq!(options.flags(), "iu");
        assert!(!options.subroutines());
    }
}
