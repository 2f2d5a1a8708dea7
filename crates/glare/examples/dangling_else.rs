//! Dangling else example
//!
//! The same ambiguous grammar parsed three ways: forking into every
//! interpretation, resolved statically by preferring shifts, and resolved
//! at parse time by a dynamic resolver.

use glare::automaton::Action;
use glare::{
    Automaton, Choice, Context, DynamicConflict, GrammarBuilder, Parser, ParseOutput, ProductionDef,
    ResolutionError, TableConfig, TerminalDef, lit, sym,
};

fn grammar(dynamic: bool) -> Result<glare::Grammar, glare::GrammarError> {
    let short_if = ProductionDef::new([lit("if"), sym("cond"), sym("Stmt")]);
    GrammarBuilder::new()
        .keyword_pattern(r"\w+")
        .terminal(TerminalDef::pattern("cond", "[a-z]"))
        .layout(TerminalDef::pattern("ws", r"\s+"))
        .rule("Stmt", [
            ProductionDef::new([lit("if"), sym("cond"), sym("Stmt"), lit("else"), sym("Stmt")]),
            if dynamic { short_if.dynamic() } else { short_if },
            ProductionDef::new([lit("go")]),
        ])
        .build()
}

fn report(label: &str, parser: &Parser<'_>, input: &str) {
    println!("{label}:");
    match parser.parse(input) {
        Ok(parsed) => match &parsed.output {
            ParseOutput::Unique(only) => println!("  {}", only.value),
            ParseOutput::Ambiguous(all) => {
                for interpretation in all {
                    println!("  {}", interpretation.value);
                }
            }
        },
        Err(e) => println!("  error: {e}"),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Dangling else ===\n");
    let input = "if a if b go else go";

    let forking = Automaton::build(grammar(false)?, &TableConfig::default())?;
    for conflict in forking.unresolved_conflicts() {
        println!("conflict: {conflict:?}");
    }
    report("fork", &Parser::new(&forking), input);

    let shifting = Automaton::build(grammar(false)?, &TableConfig::default().with_prefer_shifts(true))?;
    report("prefer shifts", &Parser::new(&shifting), input);

    // Attach the else to the outer if whenever the inner one is complete.
    let deferred = Automaton::build(grammar(true)?, &TableConfig::default())?;
    let outer_else = |_: &Context<'_>, conflict: DynamicConflict<'_>| -> Result<Choice, ResolutionError> {
        match conflict {
            DynamicConflict::Syntactic { alternatives, .. } => alternatives
                .iter()
                .position(|a| matches!(a.action, Action::Reduce(_)))
                .map(Choice::Pick)
                .ok_or_else(|| ResolutionError::failed("expected a reduction")),
            DynamicConflict::Lexical { .. } => Ok(Choice::StillAmbiguous),
        }
    };
    report("dynamic", &Parser::new(&deferred).with_resolver(outer_else), input);

    println!("\n=== Example completed ===");
    Ok(())
}
