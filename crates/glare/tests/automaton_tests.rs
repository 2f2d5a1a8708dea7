//! Automaton construction and static conflict resolution.

use glare::automaton::{Action, ConflictKind, Entry, Resolution, ResolutionRule, StateId};
use glare::{Automaton, GrammarBuilder, Parser, ProductionDef, TableConfig, TableKind, TerminalDef, empty, lit, sym};

fn operators() -> glare::Grammar {
    GrammarBuilder::new()
        .terminal(TerminalDef::pattern("num", r"\d+"))
        .rule("E", [
            ProductionDef::new([sym("E"), lit("+"), sym("E")]).left().priority(10),
            ProductionDef::new([sym("E"), lit("*"), sym("E")]).left().priority(20),
            ProductionDef::new([sym("num")]),
        ])
        .build()
        .unwrap()
}

#[test]
fn construction_is_deterministic() {
    let first = Automaton::build(operators(), &TableConfig::default()).unwrap();
    let second = Automaton::build(operators(), &TableConfig::default()).unwrap();
    assert_eq!(first.states().len(), second.states().len());
    for (a, b) in first.states().iter().zip(second.states()) {
        assert_eq!(a.kernel, b.kernel);
        assert!(a.actions().eq(b.actions()));
        assert!(a.gotos().eq(b.gotos()));
    }
    assert_eq!(first.conflicts(), second.conflicts());
}

#[test]
fn priorities_and_associativity_resolve_operators() {
    let automaton = Automaton::build(operators(), &TableConfig::default()).unwrap();
    assert!(automaton.is_deterministic());
    assert_eq!(automaton.conflicts().len(), 4);
    for conflict in automaton.conflicts() {
        assert_eq!(conflict.kind, ConflictKind::ShiftReduce);
        assert!(matches!(
            conflict.resolution,
            Resolution::Resolved {
                rule: ResolutionRule::Priority | ResolutionRule::Associativity,
                ..
            }
        ));
    }

    let parsed = Parser::new(&automaton).parse("1+2*3+4").unwrap();
    assert_eq!(parsed.value().unwrap().to_string(), "[[1, +, [2, *, 3]], +, 4]");
}

#[test]
fn right_associativity_prefers_shift() {
    let grammar = GrammarBuilder::new()
        .terminal(TerminalDef::pattern("num", r"\d+"))
        .rule("E", [
            ProductionDef::new([sym("E"), lit("^"), sym("E")]).right(),
            ProductionDef::new([sym("num")]),
        ])
        .build()
        .unwrap();
    let automaton = Automaton::build(grammar, &TableConfig::default()).unwrap();
    let conflict = &automaton.conflicts()[0];
    assert!(matches!(
        conflict.resolution,
        Resolution::Resolved {
            action: Action::Shift(_),
            rule: ResolutionRule::Associativity
        }
    ));
    let parsed = Parser::new(&automaton).parse("2^3^4").unwrap();
    assert_eq!(parsed.value().unwrap().to_string(), "[2, ^, [3, ^, 4]]");
}

#[test]
fn terminal_priority_raises_shift() {
    let grammar = GrammarBuilder::new()
        .terminal(TerminalDef::pattern("num", r"\d+"))
        .terminal(TerminalDef::literal("plus", "+").priority(20))
        .rule("E", [
            ProductionDef::new([sym("E"), sym("plus"), sym("E")]),
            ProductionDef::new([sym("num")]),
        ])
        .build()
        .unwrap();
    let automaton = Automaton::build(grammar, &TableConfig::default()).unwrap();
    assert!(automaton.is_deterministic());
    assert_eq!(automaton.conflicts().len(), 1);
    assert!(matches!(
        automaton.conflicts()[0].resolution,
        Resolution::Resolved {
            action: Action::Shift(_),
            rule: ResolutionRule::Priority
        }
    ));

    let parsed = Parser::new(&automaton).parse("1+2+3").unwrap();
    assert_eq!(parsed.interpretations().len(), 1);
    assert_eq!(parsed.value().unwrap().to_string(), "[1, +, [2, +, 3]]");
}

fn dangling_else() -> glare::Grammar {
    GrammarBuilder::new()
        .layout(TerminalDef::pattern("ws", r"\s+"))
        .rule("S", [
            ProductionDef::new([lit("if"), sym("S"), lit("else"), sym("S")]),
            ProductionDef::new([lit("if"), sym("S")]),
            ProductionDef::new([lit("x")]),
        ])
        .build()
        .unwrap()
}

#[test]
fn prefer_shifts_settles_dangling_else() {
    let input = "if if x else x";

    let forking = Automaton::build(dangling_else(), &TableConfig::default()).unwrap();
    assert!(!forking.is_deterministic());
    let parsed = Parser::new(&forking).parse(input).unwrap();
    assert_eq!(parsed.interpretations().len(), 2);

    let config = TableConfig::default().with_prefer_shifts(true);
    let shifting = Automaton::build(dangling_else(), &config).unwrap();
    assert!(shifting.is_deterministic());
    assert!(matches!(
        shifting.conflicts()[0].resolution,
        Resolution::Resolved {
            rule: ResolutionRule::PreferShift,
            ..
        }
    ));
    let parsed = Parser::new(&shifting).parse(input).unwrap();
    assert_eq!(parsed.value().unwrap().to_string(), "[if, [if, x, else, x]]");
}

#[test]
fn production_can_opt_out_of_prefer_shift() {
    let grammar = GrammarBuilder::new()
        .layout(TerminalDef::pattern("ws", r"\s+"))
        .rule("S", [
            ProductionDef::new([lit("if"), sym("S"), lit("else"), sym("S")]),
            ProductionDef::new([lit("if"), sym("S")]).no_prefer_shift(),
            ProductionDef::new([lit("x")]),
        ])
        .build()
        .unwrap();
    let automaton = Automaton::build(grammar, &TableConfig::default().with_prefer_shifts(true)).unwrap();
    assert!(!automaton.is_deterministic());
}

fn empty_prefix(reduce_over_empty: bool) -> glare::Grammar {
    let mut nothing = empty();
    if reduce_over_empty {
        nothing = nothing.no_prefer_shift_over_empty();
    }
    GrammarBuilder::new()
        .rule("S", [
            ProductionDef::new([sym("X"), lit("a")]),
            ProductionDef::new([lit("a"), lit("a")]),
        ])
        .rule("X", [nothing])
        .build()
        .unwrap()
}

#[test]
fn shift_is_preferred_over_empty_reductions() {
    let automaton = Automaton::build(empty_prefix(false), &TableConfig::default()).unwrap();
    assert!(automaton.is_deterministic());
    assert!(matches!(
        automaton.conflicts()[0].resolution,
        Resolution::Resolved {
            rule: ResolutionRule::PreferShiftOverEmpty,
            ..
        }
    ));
    let parser = Parser::new(&automaton);
    assert!(parser.parse("aa").is_ok());
    assert!(parser.parse("a").is_err());

    let automaton = Automaton::build(empty_prefix(true), &TableConfig::default()).unwrap();
    assert!(matches!(
        automaton.conflicts()[0].resolution,
        Resolution::Resolved {
            rule: ResolutionRule::PreferReduceOverEmpty,
            ..
        }
    ));
    let parser = Parser::new(&automaton);
    assert!(parser.parse("a").is_ok());
    assert!(parser.parse("aa").is_err());

    let config = TableConfig::default().with_prefer_shifts_over_empty(false);
    let automaton = Automaton::build(empty_prefix(false), &config).unwrap();
    assert!(!automaton.is_deterministic());
    let parser = Parser::new(&automaton);
    assert!(parser.parse("a").is_ok());
    assert!(parser.parse("aa").is_ok());
}

/// LR(1) but not LALR(1): merging the two `c` states mixes lookaheads.
fn not_lalr() -> glare::Grammar {
    GrammarBuilder::new()
        .rule("S", [
            ProductionDef::new([lit("a"), sym("A"), lit("d")]),
            ProductionDef::new([lit("b"), sym("B"), lit("d")]),
            ProductionDef::new([lit("a"), sym("B"), lit("e")]),
            ProductionDef::new([lit("b"), sym("A"), lit("e")]),
        ])
        .rule("A", [ProductionDef::new([lit("c")])])
        .rule("B", [ProductionDef::new([lit("c")])])
        .build()
        .unwrap()
}

#[test]
fn canonical_tables_avoid_merge_conflicts() {
    let lalr = Automaton::build(not_lalr(), &TableConfig::lalr()).unwrap();
    let reduce_reduce = lalr
        .unresolved_conflicts()
        .filter(|c| c.kind == ConflictKind::ReduceReduce)
        .count();
    assert_eq!(reduce_reduce, 2);

    let config = TableConfig::default();
    assert_eq!(config.kind, TableKind::Canonical);
    let canonical = Automaton::build(not_lalr(), &config).unwrap();
    assert!(canonical.is_deterministic());
    assert!(canonical.states().len() > lalr.states().len());

    for input in ["acd", "bce", "ace", "bcd"] {
        let a = Parser::new(&lalr).parse(input).unwrap();
        let b = Parser::new(&canonical).parse(input).unwrap();
        assert_eq!(a.value(), b.value(), "{input}");
        assert_eq!(b.metrics.forks, 0);
    }
}

#[test]
fn default_tables_are_canonical() {
    let automaton = Automaton::build(not_lalr(), &TableConfig::default()).unwrap();
    assert!(automaton.conflicts().is_empty());
    for input in ["acd", "bce", "ace", "bcd"] {
        let result = Parser::new(&automaton).parse(input).unwrap();
        assert_eq!(result.metrics.forks, 0, "{input}");
    }
}

#[test]
fn start_state_describes_what_can_begin_input() {
    let automaton = Automaton::build(operators(), &TableConfig::default()).unwrap();
    let grammar = automaton.grammar();
    let num = grammar.terminal_by_name("num").unwrap();
    assert!(matches!(
        automaton.action(StateId::START, num),
        Some(Entry::Single(Action::Shift(_)))
    ));
    assert_eq!(automaton.expected(StateId::START).collect::<Vec<_>>(), [num]);
    assert_eq!(
        grammar.display_production(grammar.productions()[1].id).to_string(),
        "E: E + E"
    );
}
