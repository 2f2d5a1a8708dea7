/// Which LR(1) construction to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableKind {
    /// Keep states apart whenever their lookaheads differ
    #[default]
    Canonical,
    /// Merge states with identical cores. Smaller tables, but grammars that
    /// are LR(1) without being LALR(1) get reduce/reduce conflicts.
    Lalr,
}

/// Configuration for automaton construction
#[derive(Debug, Clone)]
pub struct TableConfig {
    pub kind: TableKind,

    /// Resolve remaining shift/reduce conflicts in favour of the shift,
    /// except for productions marked `no_prefer_shift`.
    pub prefer_shifts: bool,

    /// Resolve shift/reduce conflicts against empty reductions in favour
    /// of the shift, except for productions marked
    /// `no_prefer_shift_over_empty`.
    pub prefer_shifts_over_empty: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            kind: TableKind::Canonical,
            // Forking is the default for a generalized parser
            prefer_shifts: false,
            prefer_shifts_over_empty: true,
        }
    }
}

impl TableConfig {
    #[must_use]
    pub fn canonical() -> Self {
        Self::default()
    }

    /// LALR(1) tables.
    #[must_use]
    pub fn lalr() -> Self {
        Self {
            kind: TableKind::Lalr,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_prefer_shifts(mut self, prefer: bool) -> Self {
        self.prefer_shifts = prefer;
        self
    }

    #[must_use]
    pub const fn with_prefer_shifts_over_empty(mut self, prefer: bool) -> Self {
        self.prefer_shifts_over_empty = prefer;
        self
    }
}
