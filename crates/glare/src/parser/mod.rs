//! # Parser
//!
//! Generalized LR parsing over an [`Automaton`], lexing on demand.
//!
//! ## Overview
//!
//! A [`Parser`] borrows a built automaton and adds the runtime pieces:
//! semantic [`Actions`], an optional [`DynamicResolver`] and a
//! [`ParserConfig`]. Parsing never mutates the parser, so one parser can
//! serve many threads at once.
//!
//! ```rust
//! use glare::automaton::{Automaton, TableConfig};
//! use glare::grammar::{GrammarBuilder, ProductionDef, TerminalDef, lit, sym};
//! use glare::parser::{Actions, Parser, Value};
//!
//! let grammar = GrammarBuilder::new()
//!     .terminal(TerminalDef::pattern("num", r"\d+"))
//!     .layout(TerminalDef::pattern("ws", r"\s+"))
//!     .rule("E", [
//!         ProductionDef::new([sym("E"), lit("+"), sym("E")]).left(),
//!         ProductionDef::new([sym("num")]),
//!     ])
//!     .build()?;
//! let automaton = Automaton::build(grammar, &TableConfig::default())?;
//!
//! let actions = Actions::new()
//!     .with("num", |ctx, _| Ok(Value::Int(ctx.text().parse().unwrap_or_default())))
//!     .with("E", |_, children| {
//!         Ok(match children.as_slice() {
//!             [Value::Int(a), _, Value::Int(b)] => Value::Int(a + b),
//!             [single] => single.clone(),
//!             _ => Value::Empty,
//!         })
//!     });
//! let parser = Parser::new(&automaton).with_actions(&actions);
//! let parsed = parser.parse("1 + 2 + 3")?;
//! assert_eq!(parsed.value(), Some(&Value::Int(6)));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Ambiguity
//!
//! Conflicts the automaton could not resolve statically fork the parse.
//! Forks share their stack history, and each is discarded as soon as it
//! hits an error. If several forks accept, the ones reaching furthest with
//! the highest total production priority are kept; more than one survivor
//! makes the result [`ParseOutput::Ambiguous`].

mod action;
mod config;
mod disambiguation;
mod engine;
mod metrics;
mod stack;
mod value;

pub use action::{ActionFn, Actions, Context};
pub use config::ParserConfig;
pub use disambiguation::{Alternative, Choice, DynamicConflict, DynamicResolver, Interpretation};
pub use metrics::{ParseMetrics, ParseObserver, StepStats};
pub use value::Value;

use crate::automaton::Automaton;
use crate::error::ParseError;
use action::ActionTable;
use engine::Run;
use metrics::Unobserved;
use std::sync::Arc;

/// Successful parse result.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub output: ParseOutput,
    pub metrics: ParseMetrics,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutput {
    Unique(Interpretation),
    /// Equally good complete parses, in the order they were accepted.
    Ambiguous(Vec<Interpretation>),
}

impl Parsed {
    /// The value of an unambiguous parse.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        match &self.output {
            ParseOutput::Unique(interpretation) => Some(&interpretation.value),
            ParseOutput::Ambiguous(_) => None,
        }
    }

    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        match self.output {
            ParseOutput::Unique(interpretation) => Some(interpretation.value),
            ParseOutput::Ambiguous(_) => None,
        }
    }

    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        matches!(self.output, ParseOutput::Ambiguous(_))
    }

    /// Every reported interpretation, one if the parse was unique.
    #[must_use]
    pub fn interpretations(&self) -> &[Interpretation] {
        match &self.output {
            ParseOutput::Unique(interpretation) => std::slice::from_ref(interpretation),
            ParseOutput::Ambiguous(all) => all,
        }
    }
}

/// GLR parser bound to an automaton.
#[derive(Clone)]
pub struct Parser<'a> {
    automaton: &'a Automaton,
    actions: ActionTable,
    resolver: Option<Arc<dyn DynamicResolver>>,
    config: ParserConfig,
}

impl<'a> Parser<'a> {
    /// Parser with default actions and configuration.
    #[must_use]
    pub fn new(automaton: &'a Automaton) -> Self {
        Self {
            automaton,
            actions: ActionTable::resolve(automaton.grammar(), &Actions::new()),
            resolver: None,
            config: ParserConfig::default(),
        }
    }

    #[must_use]
    pub fn with_actions(mut self, actions: &Actions) -> Self {
        self.actions = ActionTable::resolve(self.automaton.grammar(), actions);
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: impl DynamicResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    #[must_use]
    pub const fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub const fn automaton(&self) -> &'a Automaton {
        self.automaton
    }

    #[must_use]
    pub const fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses the whole of `input`.
    pub fn parse(&self, input: &str) -> Result<Parsed, ParseError> {
        self.parse_from(input, 0)
    }

    /// Parses `input` starting at byte offset `start`.
    pub fn parse_from(&self, input: &str, start: usize) -> Result<Parsed, ParseError> {
        self.parse_with_observer(input, start, &mut Unobserved)
    }

    /// Parses `input` from `start`, reporting every step to `observer`.
    #[tracing::instrument(level = "debug", skip_all, fields(len = input.len(), start))]
    pub fn parse_with_observer(
        &self,
        input: &str,
        start: usize,
        observer: &mut dyn ParseObserver,
    ) -> Result<Parsed, ParseError> {
        if !input.is_char_boundary(start) {
            return Err(ParseError::InvalidStart {
                position: start,
                len: input.len(),
            });
        }
        let run = Run::new(
            self.automaton,
            &self.actions,
            self.resolver.as_deref(),
            &self.config,
            input,
        );
        let (mut found, metrics) = run.run(start, observer)?;
        let output = if found.len() == 1 {
            ParseOutput::Unique(found.remove(0))
        } else {
            tracing::debug!(interpretations = found.len(), "ambiguous input");
            ParseOutput::Ambiguous(found)
        };
        Ok(Parsed { output, metrics })
    }
}
