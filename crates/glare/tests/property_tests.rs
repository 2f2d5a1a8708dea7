//! Property-based tests for the GLR parser.
//!
//! Random expressions are parsed and checked against a direct evaluator,
//! and arbitrary text must never make the parser panic.

use glare::{Actions, Automaton, GrammarBuilder, Parser, ParserConfig, ProductionDef, TableConfig, TerminalDef, Value, lit, sym};
use proptest::prelude::*;

fn arithmetic() -> Automaton {
    let grammar = GrammarBuilder::new()
        .terminal(TerminalDef::pattern("num", r"\d+"))
        .layout(TerminalDef::pattern("ws", r"\s+"))
        .rule("E", [
            ProductionDef::new([sym("E"), lit("+"), sym("E")]).left().priority(10),
            ProductionDef::new([sym("E"), lit("-"), sym("E")]).left().priority(10),
            ProductionDef::new([sym("E"), lit("*"), sym("E")]).left().priority(20),
            ProductionDef::new([lit("("), sym("E"), lit(")")]),
            ProductionDef::new([sym("num")]),
        ])
        .build()
        .unwrap();
    Automaton::build(grammar, &TableConfig::default()).unwrap()
}

fn evaluating_actions() -> Actions {
    Actions::new()
        .with("num", |ctx, _| Ok(Value::Int(ctx.text().parse().unwrap_or_default())))
        .with("E", |_, children| {
            Ok(match children.as_slice() {
                [Value::Int(a), op, Value::Int(b)] => match op.as_str() {
                    Some("+") => Value::Int(a.wrapping_add(*b)),
                    Some("-") => Value::Int(a.wrapping_sub(*b)),
                    _ => Value::Int(a.wrapping_mul(*b)),
                },
                [_, inner, _] => inner.clone(),
                [single] => single.clone(),
                _ => Value::Empty,
            })
        })
}

/// Left-to-right evaluation with `*` binding tighter than `+` and `-`.
fn evaluate(first: i64, rest: &[(char, i64)]) -> i64 {
    let mut total = 0;
    let mut sign = 1;
    let mut term = first;
    for &(op, n) in rest {
        match op {
            '*' => term *= n,
            _ => {
                total += sign * term;
                sign = if op == '-' { -1 } else { 1 };
                term = n;
            }
        }
    }
    total + sign * term
}

fn render(first: i64, rest: &[(char, i64)]) -> String {
    let mut text = first.to_string();
    for (op, n) in rest {
        text.push_str(&format!(" {op} {n}"));
    }
    text
}

fn catalan(n: usize) -> usize {
    (0..n).fold(1, |c, i| c * 2 * (2 * i + 1) / (i + 2))
}

proptest! {
    #[test]
    fn arithmetic_matches_direct_evaluation(
        first in 0i64..100,
        rest in prop::collection::vec((prop::sample::select(vec!['+', '-', '*']), 0i64..100), 0..8),
    ) {
        let automaton = arithmetic();
        let parser = Parser::new(&automaton).with_actions(&evaluating_actions());
        let input = render(first, &rest);
        let parsed = parser.parse(&input).unwrap();
        prop_assert_eq!(parsed.metrics.forks, 0);
        prop_assert_eq!(parsed.value(), Some(&Value::Int(evaluate(first, &rest))));
    }

    #[test]
    fn parenthesized_input_is_deterministic(depth in 0usize..20, n in 0i64..1000) {
        let automaton = arithmetic();
        let parser = Parser::new(&automaton).with_actions(&evaluating_actions());
        let input = format!("{}{n}{}", "(".repeat(depth), ")".repeat(depth));
        let parsed = parser.parse(&input).unwrap();
        prop_assert_eq!(parsed.value(), Some(&Value::Int(n)));
        prop_assert_eq!(parsed.metrics.max_depth >= depth, true);
    }

    #[test]
    fn arbitrary_text_never_panics(input in "\\PC{0,40}", start in 0usize..48) {
        let automaton = arithmetic();
        let parser = Parser::new(&automaton);
        let _ = parser.parse(&input);
        let _ = parser.parse_from(&input, start.min(input.len()));
        let _ = parser.clone().with_config(ParserConfig::default().prefix()).parse(&input);
    }

    #[test]
    fn operator_like_noise_never_panics(input in "[0-9+*() -]{0,30}") {
        let automaton = arithmetic();
        let parser = Parser::new(&automaton).with_actions(&evaluating_actions());
        if let Ok(parsed) = parser.parse(&input) {
            prop_assert!(!parsed.is_ambiguous());
        }
    }
}

#[test]
fn unannotated_sums_have_catalan_many_parses() {
    let grammar = GrammarBuilder::new()
        .terminal(TerminalDef::pattern("num", r"\d"))
        .rule("E", [
            ProductionDef::new([sym("E"), lit("+"), sym("E")]),
            ProductionDef::new([sym("num")]),
        ])
        .build()
        .unwrap();
    let automaton = Automaton::build(grammar, &TableConfig::default()).unwrap();
    let parser = Parser::new(&automaton);

    for operands in 1..=5 {
        let input = vec!["1"; operands].join("+");
        let parsed = parser.parse(&input).unwrap();
        assert_eq!(parsed.interpretations().len(), catalan(operands - 1), "{input}");
    }
    assert_eq!(
        [0, 1, 2, 3, 4].map(catalan),
        [1, 1, 2, 5, 14]
    );
}
