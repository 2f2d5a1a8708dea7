//! Calculator example
//!
//! Operator precedence through production priorities and associativity,
//! with semantic actions folding the parse into a number.

use glare::{Actions, ActionError, Automaton, GrammarBuilder, Parser, ProductionDef, TableConfig, TerminalDef, Value, lit, sym};

fn binary(children: &[Value]) -> Result<Value, ActionError> {
    let [Value::Float(a), op, Value::Float(b)] = children else {
        return Err(ActionError::new("malformed binary expression"));
    };
    Ok(Value::Float(match op.as_str() {
        Some("+") => a + b,
        Some("-") => a - b,
        Some("*") => a * b,
        Some("/") if *b == 0.0 => return Err(ActionError::new("division by zero")),
        Some("/") => a / b,
        _ => return Err(ActionError::new("unknown operator")),
    }))
}

fn main() {
    println!("=== Calculator ===\n");

    let grammar = match GrammarBuilder::new()
        .terminal(TerminalDef::pattern("number", r"\d+(\.\d+)?"))
        .layout(TerminalDef::pattern("ws", r"\s+"))
        .rule("Expr", [
            ProductionDef::new([sym("Expr"), lit("+"), sym("Expr")]).left().priority(10),
            ProductionDef::new([sym("Expr"), lit("-"), sym("Expr")]).left().priority(10),
            ProductionDef::new([sym("Expr"), lit("*"), sym("Expr")]).left().priority(20),
            ProductionDef::new([sym("Expr"), lit("/"), sym("Expr")]).left().priority(20),
            ProductionDef::new([lit("("), sym("Expr"), lit(")")]),
            ProductionDef::new([sym("number")]),
        ])
        .build()
    {
        Ok(grammar) => grammar,
        Err(e) => {
            eprintln!("Failed to build grammar: {e}");
            return;
        }
    };

    let automaton = match Automaton::build(grammar, &TableConfig::default()) {
        Ok(automaton) => automaton,
        Err(e) => {
            eprintln!("Failed to build automaton: {e}");
            return;
        }
    };
    println!(
        "States: {}, conflicts resolved statically: {}\n",
        automaton.states().len(),
        automaton.conflicts().len()
    );

    let actions = Actions::new()
        .with("number", |ctx, _| {
            ctx.text()
                .parse()
                .map(Value::Float)
                .map_err(|e| ActionError::with_source("not a number", e))
        })
        .with("Expr", |_, children| match children.as_slice() {
            [single] => Ok(single.clone()),
            [Value::Token(_), inner, Value::Token(_)] => Ok(inner.clone()),
            binary_children => binary(binary_children),
        });
    let parser = Parser::new(&automaton).with_actions(&actions);

    for input in ["42", "10 + 20 * 3", "(10 + 20) * 3", "100 / 4 / 5", "1 / 0", "2 + * 3"] {
        match parser.parse(input) {
            Ok(parsed) => println!("{input:>16} = {}", parsed.value().unwrap_or(&Value::Empty)),
            Err(e) => println!("{input:>16} : {e}"),
        }
    }

    println!("\n=== Example completed ===");
}
