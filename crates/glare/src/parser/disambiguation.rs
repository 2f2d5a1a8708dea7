//! Dynamic disambiguation and final interpretation selection.
//!
//! Conflicts the automaton marks as deferred, and lexical ties involving
//! `dynamic` terminals, are decided while parsing by a user-supplied
//! [`DynamicResolver`]. Whatever ambiguity is left when input runs out is
//! settled by [`select`]: the furthest-reaching interpretations win, then
//! the highest derivation score.

use super::Context;
use super::Value;
use crate::automaton::Action;
use crate::error::ResolutionError;
use crate::grammar::TerminalId;
use crate::lexer::Token;
use crate::span::Span;

/// One competing action with the semantic values it would consume.
#[derive(Debug, Clone)]
pub struct Alternative {
    pub action: Action,
    /// Children a reduction would receive, the token value for a shift,
    /// or the finished root value for an accept.
    pub values: Vec<Value>,
}

/// What a [`DynamicResolver`] is asked to decide.
#[derive(Debug, Clone, Copy)]
pub enum DynamicConflict<'a> {
    /// Equally good tokens, at least one from a `dynamic` terminal.
    Lexical { tokens: &'a [Token] },
    /// Competing actions on `token` in one automaton state.
    Syntactic {
        terminal: TerminalId,
        token: &'a Token,
        alternatives: &'a [Alternative],
    },
}

impl DynamicConflict<'_> {
    /// Number of alternatives a [`Choice::Pick`] indexes into.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Lexical { tokens } => tokens.len(),
            Self::Syntactic { alternatives, .. } => alternatives.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Continue with this alternative only.
    Pick(usize),
    /// Fork and try every alternative.
    StillAmbiguous,
}

/// Decides deferred conflicts at parse time.
///
/// The parser honours the returned choice exactly. An error fails the
/// head that hit the conflict.
pub trait DynamicResolver: Send + Sync {
    fn resolve(&self, ctx: &Context<'_>, conflict: DynamicConflict<'_>) -> Result<Choice, ResolutionError>;
}

impl<F> DynamicResolver for F
where
    F: Fn(&Context<'_>, DynamicConflict<'_>) -> Result<Choice, ResolutionError> + Send + Sync,
{
    fn resolve(&self, ctx: &Context<'_>, conflict: DynamicConflict<'_>) -> Result<Choice, ResolutionError> {
        self(ctx, conflict)
    }
}

/// Checks `choice` against the number of alternatives.
pub(crate) fn validate(choice: Choice, len: usize) -> Result<Choice, ResolutionError> {
    match choice {
        Choice::Pick(index) if index >= len => Err(ResolutionError::OutOfRange { index, len }),
        choice => Ok(choice),
    }
}

/// A complete parse of the input.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpretation {
    pub value: Value,
    pub span: Span,
    /// Sum of the reduced productions' priorities relative to the default.
    pub score: i64,
}

/// Keeps the interpretations ending furthest into the input, then those
/// with the best score. Order of the survivors is preserved.
pub(crate) fn select(mut found: Vec<Interpretation>) -> Vec<Interpretation> {
    let Some(end) = found.iter().map(|i| i.span.end).max() else {
        return found;
    };
    found.retain(|i| i.span.end == end);
    let best = found.iter().map(|i| i.score).max().unwrap_or_default();
    found.retain(|i| i.score == best);
    found
}
