//! Static conflict resolution.
//!
//! A conflict is a `(state, terminal)` pair with more than one candidate
//! action. [`resolve`] narrows the candidates using grammar metadata and
//! returns one of three outcomes:
//!
//! - [`Resolution::Resolved`]: a single action, with the rule that chose it
//! - [`Resolution::Deferred`]: a dynamic participant asks for a runtime decision
//! - [`Resolution::Ambiguous`]: the parser forks on the remaining actions
//!
//! Rules are applied in order, each only to the candidates left by the
//! previous one:
//!
//! 1. priority (a shift takes the highest priority among the terminal
//!    itself and the productions that shift it in that state)
//! 2. associativity of the reducing productions
//! 3. any `dynamic` participant defers
//! 4. prefer shift, prefer shift over empty reductions
//! 5. otherwise ambiguous

use super::config::TableConfig;
use super::{Action, StateId};
use crate::grammar::{Associativity, Grammar, ProductionId, TerminalId};
use smallvec::SmallVec;

pub type Actions = SmallVec<[Action; 2]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
}

/// Rule that statically decided a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionRule {
    Priority,
    Associativity,
    PreferShift,
    PreferShiftOverEmpty,
    PreferReduceOverEmpty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved { action: Action, rule: ResolutionRule },
    Deferred(Actions),
    Ambiguous(Actions),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub state: StateId,
    pub terminal: TerminalId,
    pub kind: ConflictKind,
    /// Every candidate before resolution, shift or accept first.
    pub candidates: Actions,
    pub resolution: Resolution,
}

impl Conflict {
    /// Whether the parser has to do anything at runtime for this conflict.
    #[must_use]
    pub const fn is_unresolved(&self) -> bool {
        !matches!(self.resolution, Resolution::Resolved { .. })
    }
}

/// A shift (or accept) competing with reductions.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ShiftCandidate {
    pub action: Action,
    pub priority: i32,
    pub dynamic: bool,
}

pub(crate) fn resolve(
    grammar: &Grammar,
    config: &TableConfig,
    shift: Option<ShiftCandidate>,
    reduces: &[ProductionId],
) -> Resolution {
    let mut shift = shift;
    let mut reduces: SmallVec<[ProductionId; 2]> = reduces.into();
    let priority = |p: &ProductionId| grammar.production(*p).priority;

    let remaining = |shift: &Option<ShiftCandidate>, reduces: &[ProductionId]| -> Actions {
        shift
            .iter()
            .map(|s| s.action)
            .chain(reduces.iter().map(|&p| Action::Reduce(p)))
            .collect()
    };
    let single = |shift: &Option<ShiftCandidate>, reduces: &[ProductionId]| match (shift, reduces) {
        (Some(s), []) => Some(s.action),
        (None, [p]) => Some(Action::Reduce(*p)),
        _ => None,
    };

    let highest = reduces
        .iter()
        .map(priority)
        .chain(shift.map(|s| s.priority))
        .max()
        .unwrap_or_default();
    shift = shift.filter(|s| s.priority == highest);
    reduces.retain(|p| grammar.production(*p).priority == highest);
    if let Some(action) = single(&shift, &reduces) {
        return Resolution::Resolved {
            action,
            rule: ResolutionRule::Priority,
        };
    }

    if shift.is_some() {
        let assoc = |p: &ProductionId| grammar.production(*p).associativity;
        reduces.retain(|p| grammar.production(*p).associativity != Associativity::Right);
        if reduces.iter().any(|p| assoc(p) == Associativity::Left) {
            shift = None;
        }
        if let Some(action) = single(&shift, &reduces) {
            return Resolution::Resolved {
                action,
                rule: ResolutionRule::Associativity,
            };
        }
    }

    let dynamic = shift.is_some_and(|s| s.dynamic)
        || reduces.iter().any(|&p| grammar.production(p).dynamic);
    if dynamic {
        return Resolution::Deferred(remaining(&shift, &reduces));
    }

    if let Some(s) = shift {
        if config.prefer_shifts
            && !reduces
                .iter()
                .any(|&p| grammar.production(p).suppress_prefer_shift)
        {
            return Resolution::Resolved {
                action: s.action,
                rule: ResolutionRule::PreferShift,
            };
        }
        if config.prefer_shifts_over_empty && reduces.iter().all(|&p| grammar.production(p).is_empty()) {
            if reduces
                .iter()
                .any(|&p| grammar.production(p).suppress_prefer_shift_over_empty)
            {
                shift = None;
                if let Some(action) = single(&shift, &reduces) {
                    return Resolution::Resolved {
                        action,
                        rule: ResolutionRule::PreferReduceOverEmpty,
                    };
                }
            } else {
                return Resolution::Resolved {
                    action: s.action,
                    rule: ResolutionRule::PreferShiftOverEmpty,
                };
            }
        }
    }

    Resolution::Ambiguous(remaining(&shift, &reduces))
}
