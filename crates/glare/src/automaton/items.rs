//! LR(1) items, closure and goto.

use crate::grammar::{FirstSets, Grammar, ProductionId, Symbol, TerminalId};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

/// A production with a dot position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Item {
    pub production: ProductionId,
    pub dot: u32,
}

impl Item {
    #[must_use]
    pub const fn new(production: ProductionId, dot: u32) -> Self {
        Self { production, dot }
    }

    /// Symbol right after the dot, `None` for complete items.
    #[must_use]
    pub fn next_symbol(self, grammar: &Grammar) -> Option<Symbol> {
        grammar
            .production(self.production)
            .rhs
            .get(self.dot as usize)
            .copied()
    }

    #[must_use]
    pub fn is_complete(self, grammar: &Grammar) -> bool {
        self.next_symbol(grammar).is_none()
    }

    #[must_use]
    pub const fn advance(self) -> Self {
        Self::new(self.production, self.dot + 1)
    }

    #[must_use]
    pub fn display(self, grammar: &Grammar) -> ItemDisplay<'_> {
        ItemDisplay {
            grammar,
            item: self,
        }
    }
}

pub struct ItemDisplay<'g> {
    grammar: &'g Grammar,
    item: Item,
}

impl fmt::Display for ItemDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let production = self.grammar.production(self.item.production);
        write!(f, "{}:", self.grammar.nonterminal(production.lhs).name)?;
        for (i, symbol) in production.rhs.iter().enumerate() {
            if i == self.item.dot as usize {
                f.write_str(" .")?;
            }
            write!(f, " {}", self.grammar.symbol_name(*symbol))?;
        }
        if self.item.dot as usize == production.rhs.len() {
            f.write_str(" .")?;
        }
        Ok(())
    }
}

/// Items with their lookahead sets, ordered for deterministic iteration.
pub type ItemSet = BTreeMap<Item, BTreeSet<TerminalId>>;

/// Expands `kernel` with every item predicted by a non-terminal after a dot.
pub(crate) fn closure(grammar: &Grammar, first: &FirstSets, kernel: &ItemSet) -> ItemSet {
    let mut items = kernel.clone();
    let mut work: VecDeque<Item> = items.keys().copied().collect();

    while let Some(item) = work.pop_front() {
        let production = grammar.production(item.production);
        let dot = item.dot as usize;
        let Some(Symbol::NonTerminal(next)) = production.rhs.get(dot).copied() else {
            continue;
        };

        let mut lookahead = BTreeSet::new();
        if first.first_of_sequence(&production.rhs[dot + 1..], &mut lookahead) {
            lookahead.extend(items[&item].iter().copied());
        }

        for &p in &grammar.nonterminal(next).productions {
            let predicted = Item::new(p, 0);
            match items.entry(predicted) {
                Entry::Vacant(slot) => {
                    slot.insert(lookahead.clone());
                    work.push_back(predicted);
                }
                Entry::Occupied(mut slot) => {
                    let set = slot.get_mut();
                    let before = set.len();
                    set.extend(lookahead.iter().copied());
                    if set.len() != before && !work.contains(&predicted) {
                        work.push_back(predicted);
                    }
                }
            }
        }
    }
    items
}

/// Kernels reached from `closure` by advancing the dot over each symbol.
pub(crate) fn goto_kernels(grammar: &Grammar, closure: &ItemSet) -> BTreeMap<Symbol, ItemSet> {
    let mut kernels: BTreeMap<Symbol, ItemSet> = BTreeMap::new();
    for (item, lookahead) in closure {
        if let Some(symbol) = item.next_symbol(grammar) {
            kernels
                .entry(symbol)
                .or_default()
                .entry(item.advance())
                .or_default()
                .extend(lookahead.iter().copied());
        }
    }
    kernels
}
