//! Grammar construction, desugaring and validation.

use glare::grammar::{GrammarAction, Symbol};
use glare::{
    Automaton, GrammarBuilder, GrammarError, Parser, ProductionDef, TableConfig, TerminalDef, Value, empty, lit, sym,
};

fn build(builder: GrammarBuilder) -> Result<Automaton, GrammarError> {
    Automaton::build(builder.build()?, &TableConfig::default())
}

#[test]
fn start_symbol_defaults_to_first_rule() {
    let grammar = GrammarBuilder::new()
        .rule("Program", [ProductionDef::new([sym("Item")])])
        .rule("Item", [ProductionDef::new([lit("x")])])
        .build()
        .unwrap();
    assert_eq!(grammar.nonterminal(grammar.root()).name, "Program");

    let grammar = GrammarBuilder::new()
        .start("Item")
        .rule("Program", [ProductionDef::new([sym("Item")])])
        .rule("Item", [ProductionDef::new([lit("x")])])
        .build()
        .unwrap();
    assert_eq!(grammar.nonterminal(grammar.root()).name, "Item");

    let err = GrammarBuilder::new()
        .start("Nope")
        .rule("Item", [ProductionDef::new([lit("x")])])
        .build()
        .unwrap_err();
    assert_eq!(err, GrammarError::UndefinedStart("Nope".into()));
}

#[test]
fn repeated_rule_calls_append_productions() {
    let grammar = GrammarBuilder::new()
        .rule("S", [ProductionDef::new([lit("a")])])
        .rule("S", [ProductionDef::new([lit("b")])])
        .build()
        .unwrap();
    let s = grammar.nonterminal_by_name("S").unwrap();
    assert_eq!(grammar.nonterminal(s).productions.len(), 2);
    assert!(matches!(grammar.symbol_by_name("a"), Some(Symbol::Terminal(_))));
    assert!(matches!(grammar.symbol_by_name("S"), Some(Symbol::NonTerminal(_))));
}

#[test]
fn validation_rejects_broken_grammars() {
    let unreachable = build(
        GrammarBuilder::new()
            .rule("S", [ProductionDef::new([lit("x")])])
            .rule("Orphan", [ProductionDef::new([lit("y")])]),
    );
    assert_eq!(unreachable.unwrap_err(), GrammarError::Unreachable("Orphan".into()));

    let unproductive = build(GrammarBuilder::new().rule("S", [ProductionDef::new([lit("x"), sym("S")])]));
    assert_eq!(unproductive.unwrap_err(), GrammarError::StartCannotReachEof("S".into()));

    let cycle = build(
        GrammarBuilder::new()
            .rule("S", [ProductionDef::new([sym("A")]), ProductionDef::new([lit("x")])])
            .rule("A", [ProductionDef::new([sym("S")])]),
    );
    assert!(matches!(cycle.unwrap_err(), GrammarError::Cycle(_)));

    let empty_literal = build(
        GrammarBuilder::new()
            .terminal(TerminalDef::literal("nothing", ""))
            .rule("S", [ProductionDef::new([sym("nothing")])]),
    );
    assert_eq!(empty_literal.unwrap_err(), GrammarError::EmptyLiteral("nothing".into()));

    let bad_keywords = build(
        GrammarBuilder::new()
            .keyword_pattern("(")
            .rule("S", [ProductionDef::new([lit("x")])]),
    );
    assert!(matches!(bad_keywords.unwrap_err(), GrammarError::InvalidKeywordPattern(_)));
}

#[test]
fn error_messages_name_the_symbol() {
    let err = GrammarBuilder::new()
        .rule("S", [ProductionDef::new([sym("Missing")])])
        .build()
        .unwrap_err();
    assert_eq!(err.to_string(), "symbol `Missing` referenced in rule `S` is not defined");
}

fn list_parser(items: glare::RhsItem) -> Automaton {
    build(
        GrammarBuilder::new()
            .terminal(TerminalDef::pattern("id", "[a-z]+"))
            .layout(TerminalDef::pattern("ws", r"\s+"))
            .rule("S", [ProductionDef::new([lit("["), items, lit("]")])]),
    )
    .unwrap()
}

fn middle(automaton: &Automaton, input: &str) -> Value {
    let value = Parser::new(automaton).parse(input).unwrap().into_value().unwrap();
    value.into_list().unwrap().swap_remove(1)
}

#[test]
fn separated_lists() {
    let automaton = list_parser(sym("id").zero_or_more().sep(lit(",")));
    assert_eq!(middle(&automaton, "[a, b, c]").to_string(), "[a, b, c]");
    assert_eq!(middle(&automaton, "[]"), Value::List(Vec::new()));
    assert!(Parser::new(&automaton).parse("[a, b,]").is_err());

    let grammar = automaton.grammar();
    let list = grammar.nonterminal_by_name("id_1_,").unwrap();
    assert_eq!(grammar.nonterminal(list).grammar_action, Some(GrammarAction::CollectSep));
}

#[test]
fn optional_items() {
    let automaton = list_parser(sym("id").optional());
    assert_eq!(middle(&automaton, "[ a ]"), Value::Token("a".into()));
    assert_eq!(middle(&automaton, "[]"), Value::Empty);
}

#[test]
fn empty_productions_yield_empty_values() {
    let automaton = build(
        GrammarBuilder::new()
            .rule("S", [ProductionDef::new([sym("Opt"), lit("x")])])
            .rule("Opt", [empty(), ProductionDef::new([lit("y")])]),
    )
    .unwrap();
    let parser = Parser::new(&automaton);
    assert_eq!(parser.parse("x").unwrap().value().unwrap().to_string(), "[(), x]");
    assert_eq!(parser.parse("yx").unwrap().value().unwrap().to_string(), "[y, x]");
}

#[test]
fn built_in_actions_on_rules() {
    let automaton = build(
        GrammarBuilder::new()
            .terminal(TerminalDef::pattern("id", "[a-z]+"))
            .rule("Group", [ProductionDef::new([lit("("), sym("id"), lit(")")])])
            .rule_grammar_action("Group", GrammarAction::PassInner),
    )
    .unwrap();
    let parsed = Parser::new(&automaton).parse("(abc)").unwrap();
    assert_eq!(parsed.value(), Some(&Value::Token("abc".into())));
}

#[test]
fn named_rule_actions_are_looked_up_by_action_name() {
    let automaton = build(
        GrammarBuilder::new()
            .terminal(TerminalDef::pattern("num", r"\d+").action("number"))
            .layout(TerminalDef::pattern("ws", r"\s+"))
            .rule("S", [ProductionDef::new([sym("num"), sym("num")])])
            .rule_action("S", "add"),
    )
    .unwrap();
    let actions = glare::Actions::new()
        .with("number", |ctx, _| Ok(Value::Int(ctx.text().len() as i64)))
        .with("add", |_, children| {
            Ok(Value::Int(children.iter().filter_map(Value::as_int).sum()))
        });
    let parser = Parser::new(&automaton).with_actions(&actions);
    assert_eq!(parser.parse("12 345").unwrap().value(), Some(&Value::Int(5)));
    // Longest match leaves nothing for the second number.
    assert!(parser.parse("12345").is_err());
}

#[test]
fn rule_actions_may_precede_their_rule() {
    let automaton = build(
        GrammarBuilder::new()
            .rule_grammar_action("Group", GrammarAction::PassInner)
            .terminal(TerminalDef::pattern("id", "[a-z]+"))
            .rule("Group", [ProductionDef::new([lit("("), sym("id"), lit(")")])]),
    )
    .unwrap();
    let parsed = Parser::new(&automaton).parse("(abc)").unwrap();
    assert_eq!(parsed.value(), Some(&Value::Token("abc".into())));

    let err = GrammarBuilder::new()
        .rule("S", [ProductionDef::new([lit("x")])])
        .rule_action("Missing", "noop")
        .build()
        .unwrap_err();
    assert_eq!(err, GrammarError::UndefinedRule("Missing".into()));
}

#[test]
fn inline_literal_only_reuses_matching_literal() {
    let grammar = GrammarBuilder::new()
        .terminal(TerminalDef::literal("if", "if"))
        .rule("S", [ProductionDef::new([lit("if"), lit("x")])])
        .build()
        .unwrap();
    assert_eq!(grammar.terminals().filter(|(_, t)| t.name == "if").count(), 1);

    let err = GrammarBuilder::new()
        .terminal(TerminalDef::pattern("id", "[a-z]+"))
        .rule("S", [ProductionDef::new([lit("id")])])
        .build()
        .unwrap_err();
    assert_eq!(err, GrammarError::DuplicateSymbol("id".into()));

    let err = GrammarBuilder::new()
        .rule("S", [ProductionDef::new([lit("x"), lit("EOF")])])
        .build()
        .unwrap_err();
    assert_eq!(err, GrammarError::ReservedName("EOF".into()));
}
