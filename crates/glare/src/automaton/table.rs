//! LR(1) / LALR(1) state graph construction.
//!
//! States are interned by kernel. With [`TableKind::Lalr`] kernels that
//! share a core are merged and the merged state is revisited whenever its
//! lookaheads grow, until nothing changes. States are numbered in the
//! order a FIFO worklist first reaches them, and symbols are visited in
//! `Ord` order, so two builds of the same grammar number states the same.

use super::config::{TableConfig, TableKind};
use super::conflict::{self, Conflict, ConflictKind, Resolution, ShiftCandidate};
use super::items::{Item, ItemSet, closure, goto_kernels};
use super::{Action, Entry, State, StateId};
use crate::grammar::{FirstSets, Grammar, ProductionId, Symbol, TerminalId};
use hashbrown::HashMap;
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

struct RawState {
    kernel: ItemSet,
    items: ItemSet,
    symbol: Option<Symbol>,
    transitions: BTreeMap<Symbol, StateId>,
}

pub(crate) struct TableBuilder<'g> {
    grammar: &'g Grammar,
    config: &'g TableConfig,
    first: FirstSets,
    states: Vec<RawState>,
    by_core: HashMap<Vec<Item>, SmallVec<[StateId; 1]>, ahash::RandomState>,
    queue: VecDeque<StateId>,
    queued: Vec<bool>,
}

impl<'g> TableBuilder<'g> {
    pub(crate) fn new(grammar: &'g Grammar, config: &'g TableConfig) -> Self {
        Self {
            grammar,
            config,
            first: FirstSets::compute(grammar),
            states: Vec::new(),
            by_core: HashMap::with_hasher(ahash::RandomState::new()),
            queue: VecDeque::new(),
            queued: Vec::new(),
        }
    }

    pub(crate) fn build(mut self) -> (Vec<State>, Vec<Conflict>) {
        let start = ItemSet::from([(
            Item::new(ProductionId::AUGMENTED, 0),
            BTreeSet::from([TerminalId::EOF]),
        )]);
        self.intern(start, None);

        while let Some(id) = self.queue.pop_front() {
            self.queued[id.index()] = false;
            let items = closure(self.grammar, &self.first, &self.states[id.index()].kernel);
            let mut transitions = BTreeMap::new();
            for (symbol, kernel) in goto_kernels(self.grammar, &items) {
                transitions.insert(symbol, self.intern(kernel, Some(symbol)));
            }
            let state = &mut self.states[id.index()];
            state.items = items;
            state.transitions = transitions;
        }

        let mut conflicts = Vec::new();
        let raw = std::mem::take(&mut self.states);
        let states = raw
            .into_iter()
            .enumerate()
            .map(|(i, raw)| self.tabulate(StateId(i as u32), raw, &mut conflicts))
            .collect();
        (states, conflicts)
    }

    fn intern(&mut self, kernel: ItemSet, symbol: Option<Symbol>) -> StateId {
        let core: Vec<Item> = kernel.keys().copied().collect();
        if let Some(candidates) = self.by_core.get(&core) {
            match self.config.kind {
                TableKind::Canonical => {
                    if let Some(&id) = candidates
                        .iter()
                        .find(|id| self.states[id.index()].kernel == kernel)
                    {
                        return id;
                    }
                }
                TableKind::Lalr => {
                    let id = candidates[0];
                    let mut grew = false;
                    for (item, lookahead) in kernel {
                        let existing = self.states[id.index()].kernel.entry(item).or_default();
                        let before = existing.len();
                        existing.extend(lookahead);
                        grew |= existing.len() != before;
                    }
                    if grew && !self.queued[id.index()] {
                        self.queued[id.index()] = true;
                        self.queue.push_back(id);
                    }
                    return id;
                }
            }
        }

        let id = StateId(self.states.len() as u32);
        self.by_core.entry(core).or_default().push(id);
        self.states.push(RawState {
            kernel,
            items: ItemSet::new(),
            symbol,
            transitions: BTreeMap::new(),
        });
        self.queued.push(true);
        self.queue.push_back(id);
        id
    }

    /// Turns one state's items into action and goto entries, resolving
    /// conflicts on the way.
    fn tabulate(&self, id: StateId, raw: RawState, conflicts: &mut Vec<Conflict>) -> State {
        let grammar = self.grammar;
        let mut shifts: BTreeMap<TerminalId, ShiftCandidate> = BTreeMap::new();
        let mut reduces: BTreeMap<TerminalId, SmallVec<[ProductionId; 2]>> = BTreeMap::new();
        let mut gotos = BTreeMap::new();

        for (item, lookahead) in &raw.items {
            let production = grammar.production(item.production);
            match item.next_symbol(grammar) {
                Some(symbol @ Symbol::Terminal(t)) => {
                    let target = raw.transitions[&symbol];
                    let terminal = grammar.terminal(t);
                    let dynamic = production.dynamic || terminal.dynamic;
                    shifts
                        .entry(t)
                        .and_modify(|s| {
                            s.priority = s.priority.max(production.priority);
                            s.dynamic |= dynamic;
                        })
                        .or_insert(ShiftCandidate {
                            action: Action::Shift(target),
                            priority: production.priority.max(terminal.priority),
                            dynamic,
                        });
                }
                Some(symbol @ Symbol::NonTerminal(n)) => {
                    gotos.insert(n, raw.transitions[&symbol]);
                }
                None if item.production == ProductionId::AUGMENTED => {
                    shifts.insert(TerminalId::EOF, ShiftCandidate {
                        action: Action::Accept,
                        priority: production.priority,
                        dynamic: false,
                    });
                }
                None => {
                    for &t in lookahead {
                        let list = reduces.entry(t).or_default();
                        if !list.contains(&item.production) {
                            list.push(item.production);
                        }
                    }
                }
            }
        }

        let terminals: BTreeSet<TerminalId> = shifts.keys().chain(reduces.keys()).copied().collect();
        let mut actions = BTreeMap::new();
        for t in terminals {
            let shift = shifts.get(&t).copied();
            let mut reduce = reduces.remove(&t).unwrap_or_default();
            reduce.sort_unstable();
            let entry = match (shift, reduce.as_slice()) {
                (Some(s), []) => Entry::Single(s.action),
                (None, [p]) => Entry::Single(Action::Reduce(*p)),
                _ => {
                    let candidates = shift
                        .iter()
                        .map(|s| s.action)
                        .chain(reduce.iter().map(|&p| Action::Reduce(p)))
                        .collect();
                    let resolution = conflict::resolve(grammar, self.config, shift, &reduce);
                    tracing::debug!(
                        state = id.0,
                        terminal = %grammar.terminal(t).name,
                        ?resolution,
                        "conflict"
                    );
                    let entry = match &resolution {
                        Resolution::Resolved { action, .. } => Entry::Single(*action),
                        Resolution::Deferred(remaining) => Entry::Deferred(remaining.clone()),
                        Resolution::Ambiguous(remaining) => Entry::Ambiguous(remaining.clone()),
                    };
                    conflicts.push(Conflict {
                        state: id,
                        terminal: t,
                        kind: if shift.is_some() {
                            ConflictKind::ShiftReduce
                        } else {
                            ConflictKind::ReduceReduce
                        },
                        candidates,
                        resolution,
                    });
                    entry
                }
            };
            actions.insert(t, entry);
        }

        let mut admissible: Vec<TerminalId> = actions
            .keys()
            .copied()
            .filter(|t| !t.is_reserved())
            .collect();
        admissible.sort_by_key(|t| (std::cmp::Reverse(grammar.terminal(*t).priority), *t));

        State {
            id,
            symbol: raw.symbol,
            kernel: raw.kernel,
            actions,
            gotos,
            admissible,
        }
    }
}
