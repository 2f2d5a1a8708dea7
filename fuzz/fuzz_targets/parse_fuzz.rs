#![no_main]
use glare::{Automaton, GrammarBuilder, Parser, ParserConfig, ProductionDef, TableConfig, TerminalDef, lit, sym};
use libfuzzer_sys::fuzz_target;
use std::sync::LazyLock;

static AUTOMATON: LazyLock<Automaton> = LazyLock::new(|| {
    let grammar = GrammarBuilder::new()
        .terminal(TerminalDef::pattern("num", r"\d+"))
        .terminal(TerminalDef::pattern("id", "[a-z]+"))
        .layout(TerminalDef::pattern("ws", r"\s+"))
        .rule("E", [
            ProductionDef::new([sym("E"), lit("+"), sym("E")]),
            ProductionDef::new([sym("E"), lit("*"), sym("E")]).left().priority(20),
            ProductionDef::new([lit("("), sym("E").zero_or_more().sep(lit(",")), lit(")")]),
            ProductionDef::new([sym("num")]),
            ProductionDef::new([sym("id")]),
        ])
        .build()
        .unwrap();
    Automaton::build(grammar, &TableConfig::default()).unwrap()
});

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let config = ParserConfig::default().with_max_heads(64);
    let parser = Parser::new(&AUTOMATON).with_config(config);
    let _ = parser.parse(input);
    let _ = parser.with_config(config.prefix()).parse(input);
});
