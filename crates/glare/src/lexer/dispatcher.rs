//! State-driven token selection.
//!
//! Only terminals with an action in the current automaton state are tried.
//! Among their matches, the winner is chosen by, in order:
//!
//! 1. a matching `finish` terminal (tried by priority) wins outright
//! 2. longest match
//! 3. highest priority
//! 4. ties involving a `dynamic` terminal are handed to the dynamic resolver
//! 5. `prefer`
//! 6. keyword over non-keyword
//! 7. literal over pattern or custom recognizer
//!
//! Whatever survives is a lexical ambiguity and every token is returned.

use super::{CarriedState, RecognizerMatch, Token};
use crate::automaton::{Automaton, StateId};
use crate::error::LexicalError;
use crate::grammar::{Grammar, TerminalId};
use crate::span::Span;
use smallvec::SmallVec;

pub type Tokens = SmallVec<[Token; 1]>;

/// Outcome of one lexical step.
#[derive(Debug, Clone)]
pub enum Lexed {
    Tokens(Tokens),
    /// A tie involving `dynamic` terminals. `fallback` is what the
    /// remaining static rules pick when no resolver is installed.
    Deferred { candidates: Tokens, fallback: Tokens },
}

pub struct Dispatcher<'a> {
    automaton: &'a Automaton,
    grammar: &'a Grammar,
    consume_input: bool,
}

struct Candidate {
    terminal: TerminalId,
    found: RecognizerMatch,
}

impl<'a> Dispatcher<'a> {
    #[must_use]
    pub fn new(automaton: &'a Automaton, consume_input: bool) -> Self {
        Self {
            automaton,
            grammar: automaton.grammar(),
            consume_input,
        }
    }

    /// Skips layout starting at `pos`, returning the new position and
    /// carried state.
    #[must_use]
    pub fn skip_layout(&self, input: &str, mut pos: usize, state: &CarriedState) -> (usize, CarriedState) {
        let mut state = state.clone();
        loop {
            let best = self
                .grammar
                .layout()
                .iter()
                .filter_map(|&t| self.grammar.terminal(t).recognizer.recognize(input, pos, &state))
                .filter(|m| m.len > 0)
                .max_by_key(|m| m.len);
            let Some(m) = best else {
                return (pos, state);
            };
            pos += m.len;
            if let Some(next) = m.state {
                state = next;
            }
        }
    }

    /// Tokens admissible in `state` at `pos`, after skipping layout.
    pub fn next_tokens(
        &self,
        state: StateId,
        input: &str,
        pos: usize,
        carried: &CarriedState,
    ) -> Result<Lexed, LexicalError> {
        let (start, carried) = self.skip_layout(input, pos, carried);
        let layout = Span::new(pos, start);

        if start >= input.len() {
            return Ok(Lexed::Tokens(SmallVec::from_elem(
                self.eof(start, layout, carried),
                1,
            )));
        }

        let mut candidates: SmallVec<[Candidate; 4]> = SmallVec::new();
        for &terminal in self.automaton.admissible(state) {
            let definition = self.grammar.terminal(terminal);
            let Some(found) = definition.recognizer.recognize(input, start, &carried) else {
                continue;
            };
            if found.len == 0 {
                continue;
            }
            if definition.finish {
                candidates.clear();
                candidates.push(Candidate { terminal, found });
                break;
            }
            candidates.push(Candidate { terminal, found });
        }

        if candidates.is_empty() {
            let at_end_allowed = self.automaton.action(state, TerminalId::EOF).is_some();
            if !self.consume_input && at_end_allowed {
                tracing::trace!(position = start, "stopping before unconsumed input");
                return Ok(Lexed::Tokens(SmallVec::from_elem(
                    self.eof(start, layout, carried),
                    1,
                )));
            }
            return Err(LexicalError {
                position: start,
                expected: self.automaton.expected_names(state),
            });
        }

        let longest = candidates.iter().map(|c| c.found.len).max().unwrap_or(0);
        candidates.retain(|c| c.found.len == longest);
        let priority = |c: &Candidate| self.grammar.terminal(c.terminal).priority;
        let highest = candidates.iter().map(priority).max().unwrap_or_default();
        candidates.retain(|c| self.grammar.terminal(c.terminal).priority == highest);

        let to_token = |c: &Candidate| Token {
            terminal: c.terminal,
            span: Span::new(start, start + c.found.len),
            layout,
            state: c.found.state.clone().unwrap_or_else(|| carried.clone()),
        };

        let dynamic = candidates.len() > 1
            && candidates
                .iter()
                .any(|c| self.grammar.terminal(c.terminal).dynamic);
        let tied: Tokens = if dynamic {
            candidates.iter().map(to_token).collect()
        } else {
            SmallVec::new()
        };

        self.narrow(&mut candidates, |t| t.prefer);
        self.narrow(&mut candidates, |t| t.keyword);
        self.narrow(&mut candidates, |t| t.recognizer.is_literal());
        let tokens: Tokens = candidates.iter().map(to_token).collect();

        if tokens.len() > 1 {
            tracing::debug!(position = start, count = tokens.len(), "lexical ambiguity");
        }
        Ok(if dynamic {
            Lexed::Deferred {
                candidates: tied,
                fallback: tokens,
            }
        } else {
            Lexed::Tokens(tokens)
        })
    }

    /// Keeps only candidates satisfying `keep`, if any do.
    fn narrow(&self, candidates: &mut SmallVec<[Candidate; 4]>, keep: impl Fn(&crate::grammar::Terminal) -> bool) {
        if candidates.len() > 1 && candidates.iter().any(|c| keep(self.grammar.terminal(c.terminal))) {
            candidates.retain(|c| keep(self.grammar.terminal(c.terminal)));
        }
    }

    fn eof(&self, pos: usize, layout: Span, state: CarriedState) -> Token {
        Token {
            terminal: TerminalId::EOF,
            span: Span::empty(pos),
            layout,
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::TableConfig;
    use crate::grammar::{GrammarBuilder, ProductionDef, TerminalDef, sym};

    fn tokens(lexed: Lexed) -> Tokens {
        match lexed {
            Lexed::Tokens(tokens) => tokens,
            Lexed::Deferred { .. } => panic!("unexpected deferral"),
        }
    }

    fn automaton(terminals: Vec<TerminalDef>) -> Automaton {
        let names: Vec<String> = terminals.iter().map(|t| t.name.to_string()).collect();
        let mut builder = GrammarBuilder::new().layout(TerminalDef::pattern("ws", r"\s+"));
        for t in terminals {
            builder = builder.terminal(t);
        }
        let grammar = builder
            .rule("S", names.iter().map(|n| ProductionDef::new([sym(n.as_str())])))
            .build()
            .unwrap();
        Automaton::build(grammar, &TableConfig::default()).unwrap()
    }

    fn names(automaton: &Automaton, tokens: &Tokens) -> Vec<String> {
        tokens
            .iter()
            .map(|t| automaton.grammar().terminal(t.terminal).name.to_string())
            .collect()
    }

    #[test]
    fn longest_match_wins() {
        let a = automaton(vec![
            TerminalDef::pattern("int", r"\d+"),
            TerminalDef::pattern("float", r"\d+\.\d+"),
        ]);
        let d = Dispatcher::new(&a, true);
        let t = tokens(d.next_tokens(StateId::START, "12.5", 0, &CarriedState::none()).unwrap());
        assert_eq!(names(&a, &t), ["float"]);
        assert_eq!(t[0].text("12.5"), "12.5");
    }

    #[test]
    fn priority_breaks_length_ties() {
        for (first, second) in [(5, 20), (20, 5)] {
            let a = automaton(vec![
                TerminalDef::pattern("low", "[a-z]+").priority(first),
                TerminalDef::pattern("high", "[a-z]+").priority(second),
            ]);
            let d = Dispatcher::new(&a, true);
            let t = tokens(d.next_tokens(StateId::START, "abc", 0, &CarriedState::none()).unwrap());
            let expected = if second > first { "high" } else { "low" };
            assert_eq!(names(&a, &t), [expected]);
        }
    }

    #[test]
    fn layout_is_skipped() {
        let a = automaton(vec![TerminalDef::literal("x", "x")]);
        let d = Dispatcher::new(&a, true);
        let t = tokens(d.next_tokens(StateId::START, "  \n x", 0, &CarriedState::none()).unwrap());
        assert_eq!(t[0].span, Span::new(4, 5));
        assert_eq!(t[0].layout, Span::new(0, 4));
    }

    #[test]
    fn finish_stops_the_search() {
        let a = automaton(vec![
            TerminalDef::literal("kw", "for").finish().priority(15),
            TerminalDef::pattern("id", "[a-z]+"),
        ]);
        let d = Dispatcher::new(&a, true);
        let t = tokens(d.next_tokens(StateId::START, "format", 0, &CarriedState::none()).unwrap());
        assert_eq!(names(&a, &t), ["kw"]);
    }

    #[test]
    fn prefer_keyword_and_literal_tie_breaks() {
        let a = automaton(vec![
            TerminalDef::pattern("a", "[a-z]+"),
            TerminalDef::pattern("b", "[a-z]+").prefer(),
        ]);
        let d = Dispatcher::new(&a, true);
        let t = tokens(d.next_tokens(StateId::START, "xy", 0, &CarriedState::none()).unwrap());
        assert_eq!(names(&a, &t), ["b"]);

        let a = automaton(vec![
            TerminalDef::pattern("id", "[a-z]+"),
            TerminalDef::literal("while", "while"),
        ]);
        let d = Dispatcher::new(&a, true);
        let t = tokens(d.next_tokens(StateId::START, "while", 0, &CarriedState::none()).unwrap());
        assert_eq!(names(&a, &t), ["while"]);
    }

    #[test]
    fn genuine_ambiguity_returns_all() {
        let a = automaton(vec![
            TerminalDef::pattern("a", "[a-z]+"),
            TerminalDef::pattern("b", "[a-z]+"),
        ]);
        let d = Dispatcher::new(&a, true);
        let t = tokens(d.next_tokens(StateId::START, "xy", 0, &CarriedState::none()).unwrap());
        assert_eq!(names(&a, &t), ["a", "b"]);
    }

    #[test]
    fn dynamic_ties_are_deferred() {
        let a = automaton(vec![
            TerminalDef::pattern("a", "[a-z]+").dynamic(),
            TerminalDef::pattern("b", "[a-z]+").prefer(),
        ]);
        let d = Dispatcher::new(&a, true);
        match d.next_tokens(StateId::START, "xy", 0, &CarriedState::none()).unwrap() {
            Lexed::Deferred {
                candidates,
                fallback,
            } => {
                assert_eq!(names(&a, &candidates), ["a", "b"]);
                assert_eq!(names(&a, &fallback), ["b"]);
            }
            Lexed::Tokens(_) => panic!("expected deferral"),
        }
    }

    #[test]
    fn no_match_reports_expected() {
        let a = automaton(vec![TerminalDef::literal("x", "x")]);
        let d = Dispatcher::new(&a, true);
        let err = d.next_tokens(StateId::START, "y", 0, &CarriedState::none()).unwrap_err();
        assert_eq!(err.position, 0);
        assert_eq!(err.expected, vec!["x"]);
    }

    #[test]
    fn end_of_input_yields_eof() {
        let a = automaton(vec![TerminalDef::literal("x", "x")]);
        let d = Dispatcher::new(&a, true);
        let t = tokens(d.next_tokens(StateId::START, "x  ", 1, &CarriedState::none()).unwrap());
        assert!(t[0].is_eof());
        assert_eq!(t[0].span, Span::empty(3));
    }
}
