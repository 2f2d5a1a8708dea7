//! # Glare
//!
//! A scannerless GLR parser generator runtime.
//!
//! ## Overview
//!
//! Glare takes a context-free grammar whose terminals are recognized
//! directly from the input text, compiles it into an LR automaton, and
//! parses with a generalized LR engine that forks on whatever ambiguity the
//! grammar's disambiguation rules leave open.
//!
//! - Terminals are literals, regular expressions or custom recognizers, and
//!   only those valid in the current parser state are tried.
//! - Conflicts are resolved statically by priority, associativity and the
//!   prefer-shift heuristics, dynamically by a user callback, or by forking.
//! - Semantic actions build a [`Value`] for every node as it is reduced.
//!
//! ## Quick Start
//!
//! ```rust
//! use glare::{Automaton, GrammarBuilder, Parser, ProductionDef, TableConfig, TerminalDef, lit, sym};
//!
//! let grammar = GrammarBuilder::new()
//!     .terminal(TerminalDef::pattern("id", "[a-z]+"))
//!     .layout(TerminalDef::pattern("ws", r"\s+"))
//!     .rule("List", [ProductionDef::new([lit("("), sym("id").zero_or_more(), lit(")")])])
//!     .build()?;
//! let automaton = Automaton::build(grammar, &TableConfig::default())?;
//!
//! let parsed = Parser::new(&automaton).parse("( a b c )")?;
//! assert_eq!(parsed.value().map(ToString::to_string).as_deref(), Some("[(, [a, b, c], )]"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Modules
//!
//! - [`grammar`] - Symbols, productions and the grammar builder
//! - [`automaton`] - LR automaton construction and static conflict resolution
//! - [`lexer`] - Recognizers and the state-driven lexical dispatcher
//! - [`parser`] - GLR engine, semantic actions and dynamic disambiguation
//! - [`error`] - Error types

pub mod automaton;
pub mod error;
pub mod grammar;
pub mod lexer;
pub mod parser;
mod span;

pub use automaton::{Automaton, TableConfig, TableKind};
pub use error::{ActionError, GrammarError, LexicalError, ParseError, ResolutionError};
pub use grammar::{Grammar, GrammarBuilder, ProductionDef, RhsItem, TerminalDef, empty, lit, sym};
pub use lexer::{CarriedState, Recognize, RecognizerMatch, Token};
pub use parser::{
    Actions, Choice, Context, DynamicConflict, DynamicResolver, ParseOutput, Parsed, Parser, ParserConfig,
    Value,
};
pub use span::Span;
