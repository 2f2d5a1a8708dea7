use super::CarriedState;
use crate::grammar::TerminalId;
use crate::span::Span;

/// A recognized token.
#[derive(Debug, Clone)]
pub struct Token {
    pub terminal: TerminalId,
    pub span: Span,
    /// Layout skipped right before the token.
    pub layout: Span,
    /// Carried state after this token.
    pub state: CarriedState,
}

impl Token {
    #[must_use]
    pub fn text<'i>(&self, input: &'i str) -> &'i str {
        self.span.slice(input)
    }

    /// End of input, or the end of a prefix parse.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.terminal == TerminalId::EOF
    }
}
