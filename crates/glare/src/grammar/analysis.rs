use super::{Grammar, NonTerminalId, Symbol, TerminalId};
use std::collections::BTreeSet;

/// Nullability and FIRST sets of every non-terminal.
#[derive(Debug, Clone)]
pub struct FirstSets {
    nullable: Vec<bool>,
    first: Vec<BTreeSet<TerminalId>>,
}

impl FirstSets {
    /// Iterates to a fixed point over all productions.
    #[must_use]
    pub fn compute(grammar: &Grammar) -> Self {
        let count = grammar.nonterminal_count();
        let mut sets = Self {
            nullable: vec![false; count],
            first: vec![BTreeSet::new(); count],
        };

        let mut changed = true;
        while changed {
            changed = false;
            for production in grammar.productions() {
                let mut first = BTreeSet::new();
                let nullable = sets.first_of_sequence(&production.rhs, &mut first);
                let lhs = production.lhs.index();
                if nullable && !sets.nullable[lhs] {
                    sets.nullable[lhs] = true;
                    changed = true;
                }
                let before = sets.first[lhs].len();
                sets.first[lhs].extend(first);
                changed |= sets.first[lhs].len() != before;
            }
        }
        sets
    }

    #[must_use]
    pub fn is_nullable(&self, nt: NonTerminalId) -> bool {
        self.nullable[nt.index()]
    }

    #[must_use]
    pub fn first(&self, nt: NonTerminalId) -> &BTreeSet<TerminalId> {
        &self.first[nt.index()]
    }

    #[must_use]
    pub fn symbol_nullable(&self, symbol: Symbol) -> bool {
        match symbol {
            Symbol::Terminal(_) => false,
            Symbol::NonTerminal(n) => self.is_nullable(n),
        }
    }

    /// Adds FIRST(`seq`) to `out` and returns whether `seq` derives the
    /// empty string.
    pub fn first_of_sequence(&self, seq: &[Symbol], out: &mut BTreeSet<TerminalId>) -> bool {
        for &symbol in seq {
            match symbol {
                Symbol::Terminal(t) => {
                    out.insert(t);
                    return false;
                }
                Symbol::NonTerminal(n) => {
                    out.extend(self.first[n.index()].iter().copied());
                    if !self.nullable[n.index()] {
                        return false;
                    }
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{GrammarBuilder, ProductionDef, empty, lit, sym};

    #[test]
    fn nullable_and_first() {
        let grammar = GrammarBuilder::new()
            .rule("S", [ProductionDef::new([sym("A"), lit("b")])])
            .rule("A", [ProductionDef::new([lit("a")]), empty()])
            .build()
            .unwrap();
        let sets = FirstSets::compute(&grammar);
        let s = grammar.nonterminal_by_name("S").unwrap();
        let a = grammar.nonterminal_by_name("A").unwrap();
        assert!(sets.is_nullable(a));
        assert!(!sets.is_nullable(s));
        let ta = grammar.terminal_by_name("a").unwrap();
        let tb = grammar.terminal_by_name("b").unwrap();
        let mut first: Vec<_> = sets.first(s).iter().copied().collect();
        first.sort();
        let mut expected = vec![ta, tb];
        expected.sort();
        assert_eq!(first, expected);
        assert_eq!(sets.first(a).len(), 1);
    }
}
