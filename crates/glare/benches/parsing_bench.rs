use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use glare::{Actions, Automaton, GrammarBuilder, Parser, ProductionDef, TableConfig, TerminalDef, Value, lit, sym};
use std::hint::black_box;

fn expression_grammar() -> glare::Grammar {
    GrammarBuilder::new()
        .terminal(TerminalDef::pattern("num", r"\d+"))
        .layout(TerminalDef::pattern("ws", r"\s+"))
        .rule("E", [
            ProductionDef::new([sym("E"), lit("+"), sym("E")]).left().priority(10),
            ProductionDef::new([sym("E"), lit("*"), sym("E")]).left().priority(20),
            ProductionDef::new([lit("("), sym("E"), lit(")")]),
            ProductionDef::new([sym("num")]),
        ])
        .build()
        .unwrap()
}

fn ambiguous_sum() -> glare::Grammar {
    GrammarBuilder::new()
        .terminal(TerminalDef::pattern("num", r"\d"))
        .rule("E", [
            ProductionDef::new([sym("E"), lit("+"), sym("E")]),
            ProductionDef::new([sym("num")]),
        ])
        .build()
        .unwrap()
}

fn expression(terms: usize) -> String {
    (0..terms)
        .map(|i| if i % 3 == 0 { format!("({i} + 1)") } else { i.to_string() })
        .collect::<Vec<_>>()
        .join(if terms % 2 == 0 { " * " } else { " + " })
}

fn bench_table_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_construction");
    group.bench_function("lalr", |b| {
        b.iter(|| black_box(Automaton::build(expression_grammar(), &TableConfig::lalr())));
    });
    group.bench_function("canonical", |b| {
        b.iter(|| black_box(Automaton::build(expression_grammar(), &TableConfig::default())));
    });
    group.finish();
}

fn bench_deterministic_parse(c: &mut Criterion) {
    let automaton = Automaton::build(expression_grammar(), &TableConfig::default()).unwrap();
    let actions = Actions::new().with("num", |ctx, _| Ok(Value::Int(ctx.text().parse().unwrap_or_default())));
    let parser = Parser::new(&automaton).with_actions(&actions);

    let mut group = c.benchmark_group("deterministic_parse");
    for terms in [10, 100, 1000] {
        let input = expression(terms);
        group.bench_with_input(BenchmarkId::from_parameter(terms), &input, |b, input| {
            b.iter(|| black_box(parser.parse(black_box(input))));
        });
    }
    group.finish();
}

fn bench_forking_parse(c: &mut Criterion) {
    let automaton = Automaton::build(ambiguous_sum(), &TableConfig::default()).unwrap();
    let parser = Parser::new(&automaton);

    let mut group = c.benchmark_group("forking_parse");
    for operands in [3, 5, 7] {
        let input = vec!["1"; operands].join("+");
        group.bench_with_input(BenchmarkId::from_parameter(operands), &input, |b, input| {
            b.iter(|| black_box(parser.parse(black_box(input))));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_table_construction,
    bench_deterministic_parse,
    bench_forking_parse
);
criterion_main!(benches);
