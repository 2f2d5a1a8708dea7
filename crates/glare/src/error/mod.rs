//! # Error Types
//!
//! Errors raised while building a grammar or its automaton, and while
//! parsing.
//!
//! ## Overview
//!
//! - [`GrammarError`]: invalid grammar definitions; fatal at build time
//! - [`LexicalError`]: no admissible terminal matches; discards one parse head
//! - [`ActionError`]: returned by a semantic action; fails one parse head
//! - [`ResolutionError`]: a dynamic resolver failed; fails one parse head
//! - [`ForkFailure`]: why a particular head was discarded
//! - [`ParseError`]: no head reached acceptance
//!
//! Heads are discarded individually and their causes are kept until the
//! parse finishes, so the error reported for a failed parse is the one
//! that got furthest into the input.
//!
//! ## Diagnostics Support
//!
//! With the `diagnostics` feature, [`GrammarError`] and [`ParseError`]
//! implement [`miette::Diagnostic`].

use crate::span::Span;
use compact_str::CompactString;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum GrammarError {
    #[error("grammar defines no rules and no start symbol")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::missing_start)))]
    MissingStart,

    #[error("start symbol `{0}` is not a defined rule")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::undefined_start)))]
    UndefinedStart(CompactString),

    #[error("symbol `{name}` referenced in rule `{rule}` is not defined")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::undefined_symbol)))]
    UndefinedSymbol { name: CompactString, rule: CompactString },

    #[error("action attached to undefined rule `{0}`")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::undefined_rule)))]
    UndefinedRule(CompactString),

    #[error("symbol `{0}` is defined more than once")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::duplicate_symbol)))]
    DuplicateSymbol(CompactString),

    #[error("`{0}` is a reserved symbol name")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::reserved_name)))]
    ReservedName(CompactString),

    #[error("invalid pattern for terminal `{terminal}`: {message}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::invalid_pattern)))]
    InvalidPattern { terminal: CompactString, message: String },

    #[error("invalid keyword pattern: {0}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::invalid_keyword_pattern)))]
    InvalidKeywordPattern(String),

    #[error("terminal `{0}` is an empty literal")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::empty_literal)))]
    EmptyLiteral(CompactString),

    #[error("layout terminal `{terminal}` is used in rule `{rule}`")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::layout_in_production)))]
    LayoutInProduction { terminal: CompactString, rule: CompactString },

    #[error("non-terminal `{0}` has no productions")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::no_productions)))]
    NoProductions(CompactString),

    #[error("non-terminal `{0}` is unreachable from the start symbol")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::unreachable)))]
    Unreachable(CompactString),

    #[error("start symbol `{0}` cannot derive any input ending at EOF")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(
            code(grammar::unproductive_start),
            help("every derivation of the start symbol is infinite")
        )
    )]
    StartCannotReachEof(CompactString),

    #[error("non-terminal `{0}` derives itself without consuming input")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::cycle)))]
    Cycle(CompactString),
}

/// No admissible terminal matched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no token matches at {position}, expected {}", ExpectedList(.expected))]
pub struct LexicalError {
    pub position: usize,
    pub expected: Vec<CompactString>,
}

/// Error returned by a semantic action.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ActionError {
    pub message: String,
    #[source]
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl ActionError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }
}

impl PartialEq for ActionError {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
    }
}

/// A dynamic resolver could not decide.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("dynamic resolver failed: {0}")]
    Failed(String),
    #[error("dynamic resolver chose alternative {index} of {len}")]
    OutOfRange { index: usize, len: usize },
}

impl ResolutionError {
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Why a parse head was discarded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForkFailure {
    #[error("unexpected {found} at {position}, expected {}", ExpectedList(.expected))]
    Syntax {
        position: usize,
        found: CompactString,
        expected: Vec<CompactString>,
    },
    #[error(transparent)]
    Lexical(LexicalError),
    #[error("action failed at {position}: {error}")]
    Action { position: usize, error: ActionError },
    #[error("resolution failed at {position}: {error}")]
    Resolution { position: usize, error: ResolutionError },
    #[error("too many reductions without a shift at {position}")]
    ReductionLimit { position: usize },
}

impl ForkFailure {
    #[must_use]
    pub const fn position(&self) -> usize {
        match self {
            Self::Syntax { position, .. }
            | Self::Action { position, .. }
            | Self::Resolution { position, .. }
            | Self::ReductionLimit { position } => *position,
            Self::Lexical(e) => e.position,
        }
    }
}

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum ParseError {
    #[error("syntax error at {}: expected {}{}", .span.start, ExpectedList(.expected), Found(.found.as_deref()))]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(parser::no_parse)))]
    NoParse {
        #[cfg_attr(feature = "diagnostics", label("here"))]
        span: Span,
        expected: Vec<CompactString>,
        found: Option<CompactString>,
        causes: Vec<ForkFailure>,
    },

    #[error("semantic action failed at {}", .span.start)]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(parser::action)))]
    Action {
        #[cfg_attr(feature = "diagnostics", label("in this match"))]
        span: Span,
        #[source]
        error: ActionError,
    },

    #[error("dynamic disambiguation failed at {}", .span.start)]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(parser::resolution)))]
    Resolution {
        #[cfg_attr(feature = "diagnostics", label)]
        span: Span,
        #[source]
        error: ResolutionError,
    },

    #[error("more than {limit} simultaneous parse heads at {position}")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(
            code(parser::fork_limit),
            help("the grammar is highly ambiguous for this input; raise `max_heads` or add priorities")
        )
    )]
    ForkLimit { limit: usize, position: usize },

    #[error("parse aborted by observer at step {step}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(parser::aborted)))]
    Aborted { step: usize },

    #[error("cannot start parsing at {position}: input has {len} bytes")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(parser::invalid_start)))]
    InvalidStart { position: usize, len: usize },
}

impl ParseError {
    /// Input offset the error refers to.
    #[must_use]
    pub const fn position(&self) -> usize {
        match self {
            Self::NoParse { span, .. } | Self::Action { span, .. } | Self::Resolution { span, .. } => {
                span.start
            }
            Self::ForkLimit { position, .. } | Self::InvalidStart { position, .. } => *position,
            Self::Aborted { .. } => 0,
        }
    }

    /// Terminal names admissible at the failure position, if this is a
    /// syntax error.
    #[must_use]
    pub fn expected(&self) -> &[CompactString] {
        match self {
            Self::NoParse { expected, .. } => expected,
            _ => &[],
        }
    }
}

struct ExpectedList<'a>(&'a [CompactString]);

impl fmt::Display for ExpectedList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            [] => f.write_str("nothing"),
            [one] => write!(f, "'{one}'"),
            many => {
                f.write_str("one of ")?;
                for (i, name) in many.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "'{name}'")?;
                }
                Ok(())
            }
        }
    }
}

struct Found<'a>(Option<&'a str>);

impl fmt::Display for Found<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(found) => write!(f, ", found '{found}'"),
            None => Ok(()),
        }
    }
}
