//! Runtime configuration of a [`Program`](crate::Program).

/// Evaluation limits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum nesting of resolve and eval calls before the walk is
    /// aborted with a depth error.
    pub max_depth: usize,
}

impl Config {
    pub const DEFAULT_MAX_DEPTH: usize = 512;

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}
