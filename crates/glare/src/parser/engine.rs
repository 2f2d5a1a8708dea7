//! Breadth-first GLR driver.
//!
//! Every live head is advanced by exactly one action per step; heads created
//! during a step wait for the next one. A head that reduces keeps the
//! lookahead token it reduced on, so lexing happens once per shift.

use super::action::{ActionTable, Context};
use super::disambiguation::{self, Alternative, Choice, DynamicConflict, DynamicResolver, Interpretation};
use super::metrics::{ParseMetrics, ParseObserver, StepStats};
use super::stack::{Gss, NodeId};
use super::{ParserConfig, Value};
use crate::automaton::{Action, Automaton, Entry, StateId};
use crate::error::{ForkFailure, ParseError, ResolutionError};
use crate::grammar::{DEFAULT_PRIORITY, Grammar, ProductionId, Symbol};
use crate::lexer::{CarriedState, Dispatcher, Lexed, Token, Tokens};
use crate::span::Span;
use compact_str::CompactString;
use smallvec::{SmallVec, smallvec};
use std::time::Instant;

struct Head {
    node: NodeId,
    /// End of the last shifted token.
    pos: usize,
    carried: CarriedState,
    lookahead: Option<Token>,
    reductions: usize,
}

struct Failure {
    cause: ForkFailure,
    span: Span,
}

type Plan = SmallVec<[(Token, Action); 2]>;

pub(crate) struct Run<'a> {
    automaton: &'a Automaton,
    grammar: &'a Grammar,
    actions: &'a ActionTable,
    resolver: Option<&'a dyn DynamicResolver>,
    config: &'a ParserConfig,
    dispatcher: Dispatcher<'a>,
    input: &'a str,
    gss: Gss,
    failures: Vec<Failure>,
    accepted: Vec<Interpretation>,
    metrics: ParseMetrics,
}

impl<'a> Run<'a> {
    pub(crate) fn new(
        automaton: &'a Automaton,
        actions: &'a ActionTable,
        resolver: Option<&'a dyn DynamicResolver>,
        config: &'a ParserConfig,
        input: &'a str,
    ) -> Self {
        Self {
            automaton,
            grammar: automaton.grammar(),
            actions,
            resolver,
            config,
            dispatcher: Dispatcher::new(automaton, config.consume_input),
            input,
            gss: Gss::new(),
            failures: Vec::new(),
            accepted: Vec::new(),
            metrics: ParseMetrics::default(),
        }
    }

    /// Parses from `start` until no head is left.
    pub(crate) fn run(
        mut self,
        start: usize,
        observer: &mut dyn ParseObserver,
    ) -> Result<(Vec<Interpretation>, ParseMetrics), ParseError> {
        let started = Instant::now();
        let root = self.gss.root(StateId::START, start);
        let mut heads = vec![Head {
            node: root,
            pos: start,
            carried: CarriedState::none(),
            lookahead: None,
            reductions: 0,
        }];

        while !heads.is_empty() {
            self.metrics.steps += 1;
            self.metrics.peak_heads = self.metrics.peak_heads.max(heads.len());
            let position = heads.iter().map(|h| h.pos).min().unwrap_or(start);
            if heads.len() > self.config.max_heads {
                tracing::debug!(heads = heads.len(), position, "fork limit exceeded");
                return Err(ParseError::ForkLimit {
                    limit: self.config.max_heads,
                    position,
                });
            }
            let stats = StepStats {
                step: self.metrics.steps,
                heads: heads.len(),
                position,
                max_depth: self.metrics.max_depth,
            };
            tracing::trace!(step = stats.step, heads = stats.heads, position, "step");
            if observer.on_step(&stats).is_break() {
                return Err(ParseError::Aborted { step: stats.step });
            }

            let mut next = Vec::with_capacity(heads.len());
            for head in heads {
                self.advance(head, &mut next);
            }
            heads = next;
        }

        self.metrics.elapsed = started.elapsed();
        tracing::debug!(
            steps = self.metrics.steps,
            forks = self.metrics.forks,
            accepted = self.accepted.len(),
            live_nodes = self.gss.live(),
            "parse finished"
        );
        if self.accepted.is_empty() {
            return Err(self.failure_report(start));
        }
        let chosen = disambiguation::select(std::mem::take(&mut self.accepted));
        Ok((chosen, self.metrics))
    }

    fn advance(&mut self, head: Head, next: &mut Vec<Head>) {
        let automaton = self.automaton;
        let Head {
            node,
            pos,
            carried,
            lookahead,
            reductions,
        } = head;
        let state = self.gss.state(node);

        let tokens: Tokens = match lookahead {
            Some(token) => smallvec![token],
            None => match self.lex(state, pos, &carried) {
                Ok(tokens) => tokens,
                Err(failure) => return self.fail(node, failure),
            },
        };

        let mut plan = Plan::new();
        for token in tokens {
            match automaton.action(state, token.terminal) {
                None => {
                    let failure = self.syntax_failure(state, &token);
                    self.failures.push(failure);
                }
                Some(Entry::Single(action)) => plan.push((token, *action)),
                Some(Entry::Ambiguous(actions)) => {
                    plan.extend(actions.iter().map(|a| (token.clone(), *a)));
                }
                Some(Entry::Deferred(actions)) => match self.decide(state, node, &token, actions) {
                    Ok(chosen) => plan.extend(chosen.into_iter().map(|a| (token.clone(), a))),
                    Err(error) => self.failures.push(Failure {
                        cause: ForkFailure::Resolution {
                            position: token.span.start,
                            error,
                        },
                        span: token.span,
                    }),
                },
            }
        }

        if plan.is_empty() {
            self.gss.release(node);
            self.metrics.discarded += 1;
            return;
        }
        if plan.len() > 1 {
            tracing::debug!(state = state.index(), position = pos, branches = plan.len(), "fork");
            self.metrics.forks += plan.len() - 1;
        }
        for _ in 1..plan.len() {
            self.gss.retain(node);
        }
        for (token, action) in plan {
            self.apply(action, node, token, &carried, pos, reductions, next);
        }
    }

    fn lex(&self, state: StateId, pos: usize, carried: &CarriedState) -> Result<Tokens, Failure> {
        let lexed = self
            .dispatcher
            .next_tokens(state, self.input, pos, carried)
            .map_err(|error| Failure {
                span: Span::empty(error.position),
                cause: ForkFailure::Lexical(error),
            })?;
        let (candidates, fallback) = match lexed {
            Lexed::Tokens(tokens) => return Ok(tokens),
            Lexed::Deferred {
                candidates,
                fallback,
            } => (candidates, fallback),
        };
        let Some(resolver) = self.resolver else {
            return Ok(fallback);
        };
        let span = candidates.first().map_or(Span::empty(pos), |t| t.span);
        let ctx = self.context(span, state, None, None);
        let choice = resolver
            .resolve(&ctx, DynamicConflict::Lexical { tokens: &candidates })
            .and_then(|c| disambiguation::validate(c, candidates.len()));
        match choice {
            Ok(Choice::Pick(index)) => Ok(candidates.into_iter().skip(index).take(1).collect()),
            Ok(Choice::StillAmbiguous) => Ok(candidates),
            Err(error) => Err(Failure {
                cause: ForkFailure::Resolution {
                    position: span.start,
                    error,
                },
                span,
            }),
        }
    }

    /// Asks the dynamic resolver to choose among a deferred entry's actions.
    fn decide(
        &self,
        state: StateId,
        node: NodeId,
        token: &Token,
        actions: &SmallVec<[Action; 2]>,
    ) -> Result<SmallVec<[Action; 2]>, ResolutionError> {
        let Some(resolver) = self.resolver else {
            return Ok(actions.clone());
        };
        let alternatives: Vec<Alternative> = actions
            .iter()
            .map(|&action| Alternative {
                action,
                values: self.alternative_values(node, token, action),
            })
            .collect();
        let ctx = self.context(token.span, state, Some(Symbol::Terminal(token.terminal)), None);
        let choice = resolver.resolve(
            &ctx,
            DynamicConflict::Syntactic {
                terminal: token.terminal,
                token,
                alternatives: &alternatives,
            },
        )?;
        tracing::trace!(state = state.index(), ?choice, "dynamic resolution");
        Ok(match disambiguation::validate(choice, actions.len())? {
            Choice::Pick(index) => smallvec![actions[index]],
            Choice::StillAmbiguous => actions.clone(),
        })
    }

    fn alternative_values(&self, node: NodeId, token: &Token, action: Action) -> Vec<Value> {
        match action {
            Action::Shift(_) => vec![Value::Token(token.text(self.input).into())],
            Action::Reduce(id) => self.gss.peek(node, self.grammar.production(id).rhs.len()),
            Action::Accept => vec![self.gss.value(node).clone()],
        }
    }

    /// Applies `action` to the head on `node`, consuming one reference to it.
    #[allow(clippy::too_many_arguments)]
    fn apply(
        &mut self,
        action: Action,
        node: NodeId,
        token: Token,
        carried: &CarriedState,
        pos: usize,
        reductions: usize,
        next: &mut Vec<Head>,
    ) {
        match action {
            Action::Shift(target) => {
                let ctx = self.context(token.span, target, Some(Symbol::Terminal(token.terminal)), None);
                self.metrics.action_calls += 1;
                let value = match self.actions.shift(&ctx) {
                    Ok(value) => value,
                    Err(error) => {
                        let failure = Failure {
                            cause: ForkFailure::Action {
                                position: token.span.start,
                                error,
                            },
                            span: token.span,
                        };
                        return self.fail(node, failure);
                    }
                };
                let score = self.gss.score(node);
                let top = self.gss.push(node, target, value, token.span, score);
                self.metrics.shifts += 1;
                self.track_depth(top);
                next.push(Head {
                    node: top,
                    pos: token.span.end,
                    carried: token.state,
                    lookahead: None,
                    reductions: 0,
                });
            }
            Action::Reduce(id) => {
                if reductions >= self.config.max_reductions_without_shift {
                    let failure = Failure {
                        cause: ForkFailure::ReductionLimit {
                            position: token.span.start,
                        },
                        span: token.span,
                    };
                    return self.fail(node, failure);
                }
                match self.reduce(id, node, pos) {
                    Ok(top) => next.push(Head {
                        node: top,
                        pos,
                        carried: carried.clone(),
                        lookahead: Some(token),
                        reductions: reductions + 1,
                    }),
                    Err(failure) => self.fail(node, failure),
                }
            }
            Action::Accept => {
                let value = self.gss.take_value(node);
                let span = self.gss.span(node);
                let score = self.gss.score(node);
                self.gss.release(node);
                tracing::debug!(end = span.end, score, "accepted");
                self.accepted.push(Interpretation { value, span, score });
            }
        }
    }

    /// Pops the right-hand side of `id`, runs its action and pushes the
    /// result. Releases `node` on success.
    fn reduce(&mut self, id: ProductionId, node: NodeId, pos: usize) -> Result<NodeId, Failure> {
        let production = self.grammar.production(id);
        let invalid = || Failure {
            cause: ForkFailure::Syntax {
                position: pos,
                found: CompactString::const_new("EOF"),
                expected: Vec::new(),
            },
            span: Span::empty(pos),
        };
        let popped = self.gss.pop(node, production.rhs.len()).ok_or_else(invalid)?;
        let target = self
            .automaton
            .goto(self.gss.state(popped.base), production.lhs)
            .ok_or_else(invalid)?;
        let span = popped.span.unwrap_or(Span::empty(pos));

        let ctx = self.context(span, target, Some(Symbol::NonTerminal(production.lhs)), Some(id));
        self.metrics.action_calls += 1;
        let value = self
            .actions
            .reduce(&ctx, production, popped.values)
            .map_err(|error| Failure {
                cause: ForkFailure::Action {
                    position: span.start,
                    error,
                },
                span,
            })?;

        let score = popped.score + i64::from(production.priority - DEFAULT_PRIORITY);
        self.gss.retain(popped.base);
        let top = self.gss.push(popped.base, target, value, span, score);
        self.gss.release(node);
        self.metrics.reductions += 1;
        self.track_depth(top);
        Ok(top)
    }

    fn context(
        &self,
        span: Span,
        state: StateId,
        symbol: Option<Symbol>,
        production: Option<ProductionId>,
    ) -> Context<'a> {
        Context {
            input: self.input,
            span,
            state,
            symbol,
            production,
            grammar: self.grammar,
        }
    }

    fn syntax_failure(&self, state: StateId, token: &Token) -> Failure {
        let found = if token.is_eof() {
            CompactString::const_new("EOF")
        } else {
            token.text(self.input).into()
        };
        Failure {
            cause: ForkFailure::Syntax {
                position: token.span.start,
                found,
                expected: self.automaton.expected_names(state),
            },
            span: token.span,
        }
    }

    fn fail(&mut self, node: NodeId, failure: Failure) {
        tracing::trace!(cause = %failure.cause, "head discarded");
        self.gss.release(node);
        self.metrics.discarded += 1;
        self.failures.push(failure);
    }

    fn track_depth(&mut self, node: NodeId) {
        self.metrics.max_depth = self.metrics.max_depth.max(self.gss.depth(node));
    }

    /// Builds the error for a parse in which every head failed, from the
    /// failures that got furthest. Action errors take precedence over
    /// resolution errors, which take precedence over syntax errors.
    fn failure_report(&mut self, start: usize) -> ParseError {
        let furthest = self
            .failures
            .iter()
            .map(|f| f.cause.position())
            .max()
            .unwrap_or(start);
        let mut failures: Vec<Failure> = self
            .failures
            .drain(..)
            .filter(|f| f.cause.position() == furthest)
            .collect();

        if let Some(index) = failures
            .iter()
            .position(|f| matches!(f.cause, ForkFailure::Action { .. }))
        {
            let failure = failures.swap_remove(index);
            if let ForkFailure::Action { error, .. } = failure.cause {
                return ParseError::Action {
                    span: failure.span,
                    error,
                };
            }
        }
        if let Some(index) = failures
            .iter()
            .position(|f| matches!(f.cause, ForkFailure::Resolution { .. }))
        {
            let failure = failures.swap_remove(index);
            if let ForkFailure::Resolution { error, .. } = failure.cause {
                return ParseError::Resolution {
                    span: failure.span,
                    error,
                };
            }
        }

        let mut expected: Vec<CompactString> = Vec::new();
        let mut found = None;
        let mut span = Span::empty(furthest);
        for failure in &failures {
            let names: &[CompactString] = match &failure.cause {
                ForkFailure::Syntax {
                    found: f,
                    expected: names,
                    ..
                } => {
                    if found.is_none() {
                        found = Some(f.clone());
                        span = failure.span;
                    }
                    names
                }
                ForkFailure::Lexical(error) => error.expected.as_slice(),
                _ => &[],
            };
            for name in names {
                if !expected.contains(name) {
                    expected.push(name.clone());
                }
            }
        }
        tracing::debug!(position = furthest, causes = failures.len(), "no parse");
        ParseError::NoParse {
            span,
            expected,
            found,
            causes: failures.into_iter().map(|f| f.cause).collect(),
        }
    }
}
