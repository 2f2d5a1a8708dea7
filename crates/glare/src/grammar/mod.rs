//! # Grammar Module
//!
//! The symbol and production model consumed by the automaton builder.
//!
//! ## Overview
//!
//! A [`Grammar`] owns three arenas: terminals, non-terminals and productions.
//! Everything else refers to them by index ([`TerminalId`], [`NonTerminalId`],
//! [`ProductionId`]), so a grammar can be shared freely between the automaton
//! and any number of concurrent parses.
//!
//! Grammars are assembled with [`GrammarBuilder`]:
//!
//! ```rust
//! use glare::grammar::{GrammarBuilder, ProductionDef, TerminalDef, lit, sym};
//!
//! let grammar = GrammarBuilder::new()
//!     .terminal(TerminalDef::pattern("num", r"\d+"))
//!     .rule("E", [
//!         ProductionDef::new([sym("E"), lit("+"), sym("E")]).left(),
//!         ProductionDef::new([sym("num")]),
//!     ])
//!     .build()?;
//!
//! assert_eq!(grammar.nonterminal(grammar.root()).name, "E");
//! # Ok::<(), glare::GrammarError>(())
//! ```
//!
//! ## Reserved symbols
//!
//! - `EOF` ([`TerminalId::EOF`]): end of input, never matched lexically
//! - `EMPTY` ([`TerminalId::EMPTY`]): written in a right-hand side to denote an
//!   empty production; stripped during construction
//! - `STOP`: reserved name for the end of a partial (prefix) parse
//! - `S'`: the augmented start symbol, production 0 is `S' → root`

mod analysis;
mod builder;
mod validate;

pub use analysis::FirstSets;
pub use builder::{
    GrammarBuilder, Multiplicity, ProductionDef, RhsItem, TerminalDef, empty, lit, sym,
};

use crate::lexer::Recognizer;
use compact_str::CompactString;
use hashbrown::HashMap;
use smallvec::SmallVec;
use std::fmt;

/// Default terminal and production priority.
pub const DEFAULT_PRIORITY: i32 = 10;

/// Names that user grammars may not define.
pub const RESERVED_NAMES: &[&str] = &["EOF", "EMPTY", "STOP", AUGMENTED_NAME];

pub(crate) const AUGMENTED_NAME: &str = "S'";

/// Index of a terminal in its grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TerminalId(pub(crate) u32);

impl TerminalId {
    pub const EOF: Self = Self(0);
    pub const EMPTY: Self = Self(1);

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Reserved terminals are never tried by the lexical dispatcher.
    #[must_use]
    pub const fn is_reserved(self) -> bool {
        self.0 <= Self::EMPTY.0
    }
}

/// Index of a non-terminal in its grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NonTerminalId(pub(crate) u32);

impl NonTerminalId {
    /// The augmented start symbol `S'`.
    pub const AUGMENTED: Self = Self(0);

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a production in its grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProductionId(pub(crate) u32);

impl ProductionId {
    /// `S' → root`
    pub const AUGMENTED: Self = Self(0);

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A grammar symbol reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    Terminal(TerminalId),
    NonTerminal(NonTerminalId),
}

impl Symbol {
    #[must_use]
    pub const fn as_terminal(self) -> Option<TerminalId> {
        match self {
            Self::Terminal(t) => Some(t),
            Self::NonTerminal(_) => None,
        }
    }

    #[must_use]
    pub const fn as_nonterminal(self) -> Option<NonTerminalId> {
        match self {
            Self::NonTerminal(n) => Some(n),
            Self::Terminal(_) => None,
        }
    }
}

impl From<TerminalId> for Symbol {
    fn from(id: TerminalId) -> Self {
        Self::Terminal(id)
    }
}

impl From<NonTerminalId> for Symbol {
    fn from(id: NonTerminalId) -> Self {
        Self::NonTerminal(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Associativity {
    #[default]
    None,
    Left,
    Right,
}

/// Built-in semantic actions a grammar can declare for a symbol.
///
/// A user action registered for the same symbol takes precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarAction {
    /// Value of the first child.
    PassSingle,
    /// Always [`Value::Empty`](crate::Value::Empty).
    PassNone,
    /// Children without the first and last one, as a list.
    PassInner,
    /// All children as a list.
    PassAll,
    /// `L: L X | X`, appending to a list.
    Collect,
    /// `L: L sep X | X`, appending to a list and dropping separators.
    CollectSep,
    /// `L0: L | EMPTY`, the list or an empty list.
    CollectOptional,
    /// `O: X | EMPTY`, the value or [`Value::Empty`](crate::Value::Empty).
    Optional,
    /// An object built from the production's assignments.
    Object,
}

#[derive(Debug, Clone)]
pub struct Terminal {
    pub name: CompactString,
    pub recognizer: Recognizer,
    /// Lexical tie-break, higher wins.
    pub priority: i32,
    /// A match stops trying lower-priority terminals at the same position.
    pub finish: bool,
    pub prefer: bool,
    pub dynamic: bool,
    pub keyword: bool,
    /// Skipped between tokens; never part of a production.
    pub layout: bool,
    pub action: Option<CompactString>,
    pub grammar_action: Option<GrammarAction>,
}

#[derive(Debug, Clone)]
pub struct NonTerminal {
    pub name: CompactString,
    pub productions: Vec<ProductionId>,
    pub action: Option<CompactString>,
    pub grammar_action: Option<GrammarAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `name=X`: the value of `X`.
    Plain,
    /// `name?=X`: whether `X` matched anything.
    Bool,
}

/// Named capture of a right-hand side position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub name: CompactString,
    pub op: AssignOp,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct Production {
    pub id: ProductionId,
    pub lhs: NonTerminalId,
    pub rhs: SmallVec<[Symbol; 4]>,
    pub associativity: Associativity,
    pub priority: i32,
    pub dynamic: bool,
    /// Disables prefer-shift for this reduction.
    pub suppress_prefer_shift: bool,
    /// Disables prefer-shift-over-empty for this reduction.
    pub suppress_prefer_shift_over_empty: bool,
    pub assignments: SmallVec<[Assignment; 1]>,
}

impl Production {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rhs.is_empty()
    }
}

type NameMap<T> = HashMap<CompactString, T, ahash::RandomState>;

/// An immutable, validated-by-construction grammar.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub(crate) terminals: Vec<Terminal>,
    pub(crate) nonterminals: Vec<NonTerminal>,
    pub(crate) productions: Vec<Production>,
    pub(crate) root: NonTerminalId,
    pub(crate) terminal_names: NameMap<TerminalId>,
    pub(crate) nonterminal_names: NameMap<NonTerminalId>,
    pub(crate) layout: Vec<TerminalId>,
}

impl Grammar {
    #[must_use]
    pub fn builder() -> GrammarBuilder {
        GrammarBuilder::new()
    }

    /// The user start symbol (not the augmented `S'`).
    #[must_use]
    pub const fn root(&self) -> NonTerminalId {
        self.root
    }

    #[must_use]
    pub fn terminal(&self, id: TerminalId) -> &Terminal {
        &self.terminals[id.index()]
    }

    #[must_use]
    pub fn nonterminal(&self, id: NonTerminalId) -> &NonTerminal {
        &self.nonterminals[id.index()]
    }

    #[must_use]
    pub fn production(&self, id: ProductionId) -> &Production {
        &self.productions[id.index()]
    }

    pub fn terminals(&self) -> impl ExactSizeIterator<Item = (TerminalId, &Terminal)> {
        self.terminals
            .iter()
            .enumerate()
            .map(|(i, t)| (TerminalId(i as u32), t))
    }

    pub fn nonterminals(&self) -> impl ExactSizeIterator<Item = (NonTerminalId, &NonTerminal)> {
        self.nonterminals
            .iter()
            .enumerate()
            .map(|(i, n)| (NonTerminalId(i as u32), n))
    }

    #[must_use]
    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    #[must_use]
    pub fn terminal_count(&self) -> usize {
        self.terminals.len()
    }

    #[must_use]
    pub fn nonterminal_count(&self) -> usize {
        self.nonterminals.len()
    }

    /// Layout terminals in declaration order.
    #[must_use]
    pub fn layout(&self) -> &[TerminalId] {
        &self.layout
    }

    #[must_use]
    pub fn terminal_by_name(&self, name: &str) -> Option<TerminalId> {
        self.terminal_names.get(name).copied()
    }

    #[must_use]
    pub fn nonterminal_by_name(&self, name: &str) -> Option<NonTerminalId> {
        self.nonterminal_names.get(name).copied()
    }

    #[must_use]
    pub fn symbol_by_name(&self, name: &str) -> Option<Symbol> {
        self.terminal_by_name(name)
            .map(Symbol::Terminal)
            .or_else(|| self.nonterminal_by_name(name).map(Symbol::NonTerminal))
    }

    #[must_use]
    pub fn symbol_name(&self, symbol: Symbol) -> &str {
        match symbol {
            Symbol::Terminal(t) => &self.terminal(t).name,
            Symbol::NonTerminal(n) => &self.nonterminal(n).name,
        }
    }

    /// Displays a production as `lhs: a b c`.
    #[must_use]
    pub fn display_production(&self, id: ProductionId) -> ProductionDisplay<'_> {
        ProductionDisplay { grammar: self, id }
    }
}

pub struct ProductionDisplay<'g> {
    grammar: &'g Grammar,
    id: ProductionId,
}

impl fmt::Display for ProductionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let production = self.grammar.production(self.id);
        write!(f, "{}:", self.grammar.nonterminal(production.lhs).name)?;
        if production.rhs.is_empty() {
            return write!(f, " EMPTY");
        }
        for symbol in &production.rhs {
            write!(f, " {}", self.grammar.symbol_name(*symbol))?;
        }
        Ok(())
    }
}
