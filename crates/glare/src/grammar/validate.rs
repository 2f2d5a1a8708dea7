//! Whole-grammar checks run before automaton construction.

use super::{FirstSets, Grammar, NonTerminalId, Symbol};
use crate::error::GrammarError;
use std::collections::VecDeque;

impl Grammar {
    /// Checks that every non-terminal has productions and is reachable from
    /// the start symbol, that the start symbol derives some finite input,
    /// and that no non-terminal derives itself without consuming input.
    pub fn validate(&self) -> Result<(), GrammarError> {
        for (id, nt) in self.nonterminals() {
            if nt.productions.is_empty() && id != NonTerminalId::AUGMENTED {
                return Err(GrammarError::NoProductions(nt.name.clone()));
            }
        }

        let reachable = self.reachable();
        if let Some((_, nt)) = self
            .nonterminals()
            .skip(1)
            .find(|(id, _)| !reachable[id.index()])
        {
            return Err(GrammarError::Unreachable(nt.name.clone()));
        }

        if !self.productive()[self.root.index()] {
            return Err(GrammarError::StartCannotReachEof(
                self.nonterminal(self.root).name.clone(),
            ));
        }

        if let Some(nt) = self.find_cycle(&FirstSets::compute(self)) {
            return Err(GrammarError::Cycle(self.nonterminal(nt).name.clone()));
        }

        self.warn_unused_terminals(&reachable);
        Ok(())
    }

    fn reachable(&self) -> Vec<bool> {
        let mut seen = vec![false; self.nonterminal_count()];
        let mut queue = VecDeque::from([self.root]);
        seen[NonTerminalId::AUGMENTED.index()] = true;
        seen[self.root.index()] = true;
        while let Some(nt) = queue.pop_front() {
            for &p in &self.nonterminal(nt).productions {
                for symbol in &self.production(p).rhs {
                    if let Symbol::NonTerminal(next) = *symbol
                        && !seen[next.index()]
                    {
                        seen[next.index()] = true;
                        queue.push_back(next);
                    }
                }
            }
        }
        seen
    }

    fn productive(&self) -> Vec<bool> {
        let mut productive = vec![false; self.nonterminal_count()];
        let mut changed = true;
        while changed {
            changed = false;
            for production in self.productions() {
                if productive[production.lhs.index()] {
                    continue;
                }
                let all = production.rhs.iter().all(|s| match s {
                    Symbol::Terminal(_) => true,
                    Symbol::NonTerminal(n) => productive[n.index()],
                });
                if all {
                    productive[production.lhs.index()] = true;
                    changed = true;
                }
            }
        }
        productive
    }

    /// First non-terminal `A` (by index) with `A ⇒+ A`.
    fn find_cycle(&self, sets: &FirstSets) -> Option<NonTerminalId> {
        // Edge A -> B when A: α B β with α and β nullable.
        let mut edges = vec![Vec::new(); self.nonterminal_count()];
        for production in self.productions() {
            let rhs = &production.rhs;
            for (i, symbol) in rhs.iter().enumerate() {
                let Symbol::NonTerminal(target) = *symbol else {
                    continue;
                };
                let others_nullable = rhs
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != i)
                    .all(|(_, s)| sets.symbol_nullable(*s));
                if others_nullable {
                    edges[production.lhs.index()].push(target);
                }
            }
        }

        (0..self.nonterminal_count()).map(|i| NonTerminalId(i as u32)).find(|&start| {
            let mut seen = vec![false; edges.len()];
            let mut stack = edges[start.index()].clone();
            while let Some(nt) = stack.pop() {
                if nt == start {
                    return true;
                }
                if !std::mem::replace(&mut seen[nt.index()], true) {
                    stack.extend(edges[nt.index()].iter().copied());
                }
            }
            false
        })
    }

    fn warn_unused_terminals(&self, reachable: &[bool]) {
        let mut used = vec![false; self.terminal_count()];
        for production in self.productions() {
            if !reachable[production.lhs.index()] {
                continue;
            }
            for symbol in &production.rhs {
                if let Symbol::Terminal(t) = *symbol {
                    used[t.index()] = true;
                }
            }
        }
        for (id, terminal) in self.terminals() {
            if !id.is_reserved() && !terminal.layout && !used[id.index()] {
                tracing::warn!(terminal = %terminal.name, "terminal is never used");
            }
        }
    }
}
