//! # Automaton
//!
//! Compiles a [`Grammar`] into an LR(1)-family parsing automaton.
//!
//! ## Overview
//!
//! [`Automaton::build`] validates the grammar, constructs the state graph
//! (canonical LR(1) by default, LALR(1) on request), computes action and
//! goto tables, and runs every conflict through the static resolver. The
//! result is immutable and can be shared by any number of concurrent
//! parses.
//!
//! ```rust
//! use glare::automaton::{Automaton, TableConfig};
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
//! let automaton = Automaton::build(grammar, &TableConfig::default())?;
//! assert!(automaton.is_deterministic());
//! assert_eq!(automaton.conflicts().len(), 1);
//! # Ok::<(), glare::GrammarError>(())
//! ```
//!
//! ## Table entries
//!
//! Each `(state, terminal)` pair maps to an [`Entry`]:
//!
//! - [`Entry::Single`]: one action, possibly chosen by the resolver
//! - [`Entry::Deferred`]: a dynamic resolver picks among the actions at parse time
//! - [`Entry::Ambiguous`]: the parser forks and tries every action

mod config;
mod conflict;
mod items;
mod table;

pub use config::{TableConfig, TableKind};
pub use conflict::{Conflict, ConflictKind, Resolution, ResolutionRule};
pub use items::{Item, ItemSet};

use crate::error::GrammarError;
use crate::grammar::{Grammar, NonTerminalId, ProductionId, Symbol, TerminalId};
use compact_str::CompactString;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::sync::Arc;
use table::TableBuilder;

/// Index of an automaton state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(pub(crate) u32);

impl StateId {
    pub const START: Self = Self(0);

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    Shift(StateId),
    Reduce(ProductionId),
    Accept,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Single(Action),
    Deferred(SmallVec<[Action; 2]>),
    Ambiguous(SmallVec<[Action; 2]>),
}

impl Entry {
    #[must_use]
    pub fn actions(&self) -> &[Action] {
        match self {
            Self::Single(action) => std::slice::from_ref(action),
            Self::Deferred(actions) | Self::Ambiguous(actions) => actions,
        }
    }
}

#[derive(Debug, Clone)]
pub struct State {
    pub id: StateId,
    /// Symbol every transition into this state is made on.
    pub symbol: Option<Symbol>,
    pub kernel: ItemSet,
    pub(crate) actions: BTreeMap<TerminalId, Entry>,
    pub(crate) gotos: BTreeMap<NonTerminalId, StateId>,
    /// Lexable terminals with an action here, by descending priority.
    pub(crate) admissible: Vec<TerminalId>,
}

impl State {
    pub fn actions(&self) -> impl Iterator<Item = (TerminalId, &Entry)> {
        self.actions.iter().map(|(t, e)| (*t, e))
    }

    pub fn gotos(&self) -> impl Iterator<Item = (NonTerminalId, StateId)> + '_ {
        self.gotos.iter().map(|(n, s)| (*n, *s))
    }
}

/// Compiled parsing automaton.
#[derive(Debug, Clone)]
pub struct Automaton {
    grammar: Arc<Grammar>,
    states: Vec<State>,
    conflicts: Vec<Conflict>,
}

impl Automaton {
    /// Validates `grammar` and builds its automaton.
    #[tracing::instrument(level = "debug", skip_all, fields(kind = ?config.kind))]
    pub fn build(grammar: impl Into<Arc<Grammar>>, config: &TableConfig) -> Result<Self, GrammarError> {
        let grammar = grammar.into();
        grammar.validate()?;

        let (states, conflicts) = TableBuilder::new(&grammar, config).build();
        tracing::debug!(
            states = states.len(),
            conflicts = conflicts.len(),
            unresolved = conflicts.iter().filter(|c| c.is_unresolved()).count(),
            "automaton built"
        );
        Ok(Self {
            grammar,
            states,
            conflicts,
        })
    }

    #[must_use]
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    #[must_use]
    pub fn states(&self) -> &[State] {
        &self.states
    }

    #[must_use]
    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.index()]
    }

    #[must_use]
    pub fn action(&self, state: StateId, terminal: TerminalId) -> Option<&Entry> {
        self.states[state.index()].actions.get(&terminal)
    }

    #[must_use]
    pub fn goto(&self, state: StateId, nonterminal: NonTerminalId) -> Option<StateId> {
        self.states[state.index()].gotos.get(&nonterminal).copied()
    }

    /// Terminals the lexical dispatcher tries in `state`, highest priority
    /// first. Excludes `EOF`.
    #[must_use]
    pub fn admissible(&self, state: StateId) -> &[TerminalId] {
        &self.states[state.index()].admissible
    }

    /// Every terminal with an action in `state`, including `EOF`.
    pub fn expected(&self, state: StateId) -> impl Iterator<Item = TerminalId> + '_ {
        self.states[state.index()].actions.keys().copied()
    }

    /// Names of [`expected`](Self::expected) terminals, for error reports.
    pub(crate) fn expected_names(&self, state: StateId) -> Vec<CompactString> {
        self.expected(state)
            .map(|t| self.grammar.terminal(t).name.clone())
            .collect()
    }

    /// Every conflict found during construction, resolved or not.
    #[must_use]
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn unresolved_conflicts(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts.iter().filter(|c| c.is_unresolved())
    }

    /// No entry forks or defers.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.unresolved_conflicts().next().is_none()
    }
}
