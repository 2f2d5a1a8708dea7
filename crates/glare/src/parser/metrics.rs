use std::ops::ControlFlow;
use std::time::Duration;

/// Counters collected over one parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseMetrics {
    pub steps: usize,
    pub peak_heads: usize,
    /// Extra heads created by ambiguous entries and lexical ties.
    pub forks: usize,
    /// Heads dropped because they had no valid action or failed.
    pub discarded: usize,
    pub max_depth: usize,
    pub shifts: usize,
    pub reductions: usize,
    pub action_calls: usize,
    pub elapsed: Duration,
}

/// Snapshot handed to a [`ParseObserver`] before each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepStats {
    pub step: usize,
    pub heads: usize,
    /// Input position of the least advanced head.
    pub position: usize,
    pub max_depth: usize,
}

/// Watches a parse step by step and may stop it.
pub trait ParseObserver {
    fn on_step(&mut self, stats: &StepStats) -> ControlFlow<()>;
}

impl<F> ParseObserver for F
where
    F: FnMut(&StepStats) -> ControlFlow<()>,
{
    fn on_step(&mut self, stats: &StepStats) -> ControlFlow<()> {
        self(stats)
    }
}

/// Observer that never interferes.
pub(crate) struct Unobserved;

impl ParseObserver for Unobserved {
    fn on_step(&mut self, _: &StepStats) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}
