/// Runtime limits and input handling for a [`Parser`](super::Parser).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Maximum number of live heads in one step before the parse fails
    /// with [`ParseError::ForkLimit`](crate::ParseError::ForkLimit).
    pub max_heads: usize,
    /// Reductions a single head may perform between two shifts. Guards
    /// against grammars that loop through empty productions.
    pub max_reductions_without_shift: usize,
    /// When `false`, parsing stops successfully at the first position where
    /// no terminal matches but the end of input would be accepted.
    pub consume_input: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_heads: 1000,
            max_reductions_without_shift: 10_000,
            consume_input: true,
        }
    }
}

impl ParserConfig {
    #[must_use]
    pub const fn with_max_heads(mut self, max_heads: usize) -> Self {
        self.max_heads = max_heads;
        self
    }

    #[must_use]
    pub const fn with_max_reductions_without_shift(mut self, limit: usize) -> Self {
        self.max_reductions_without_shift = limit;
        self
    }

    /// Accepts the longest parseable prefix instead of the whole input.
    #[must_use]
    pub const fn prefix(mut self) -> Self {
        self.consume_input = false;
        self
    }
}
