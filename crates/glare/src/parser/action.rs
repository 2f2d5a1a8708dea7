//! Semantic actions.
//!
//! Every shift and every reduce produces a [`Value`]. Which function
//! produces it is decided once, when the parser is created:
//!
//! 1. a user action registered under the symbol's action name, or under
//!    the symbol's own name
//! 2. the symbol's built-in [`GrammarAction`]
//! 3. the default: token text for terminals; for productions an object if
//!    it has assignments, otherwise nothing, the single child, or a list
//!
//! Actions run as soon as their node is built, including on forks that
//! are later discarded, so they must tolerate being called speculatively.
//! A node shared by several forks runs its action once.

use super::Value;
use crate::automaton::StateId;
use crate::error::ActionError;
use crate::grammar::{AssignOp, Grammar, GrammarAction, Production, ProductionId, Symbol};
use crate::span::Span;
use compact_str::CompactString;
use hashbrown::HashMap;
use std::sync::Arc;

pub type ActionFn = Arc<dyn Fn(&Context<'_>, Vec<Value>) -> Result<Value, ActionError> + Send + Sync>;

/// What an action, or a dynamic resolver, knows about where it runs.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub input: &'a str,
    pub span: Span,
    /// State the parser is in once the node is pushed.
    pub state: StateId,
    pub symbol: Option<Symbol>,
    pub production: Option<ProductionId>,
    pub grammar: &'a Grammar,
}

impl<'a> Context<'a> {
    /// Input covered by [`span`](Self::span).
    #[must_use]
    pub fn text(&self) -> &'a str {
        self.span.slice(self.input)
    }

    #[must_use]
    pub fn symbol_name(&self) -> Option<&'a str> {
        self.symbol.map(|s| self.grammar.symbol_name(s))
    }
}

/// User actions by name.
#[derive(Clone, Default)]
pub struct Actions {
    map: HashMap<CompactString, ActionFn, ahash::RandomState>,
}

impl Actions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `f` under `name` (an action name or a symbol name).
    #[must_use]
    pub fn with<F>(mut self, name: impl Into<CompactString>, f: F) -> Self
    where
        F: Fn(&Context<'_>, Vec<Value>) -> Result<Value, ActionError> + Send + Sync + 'static,
    {
        self.insert(name, f);
        self
    }

    pub fn insert<F>(&mut self, name: impl Into<CompactString>, f: F)
    where
        F: Fn(&Context<'_>, Vec<Value>) -> Result<Value, ActionError> + Send + Sync + 'static,
    {
        self.map.insert(name.into(), Arc::new(f));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ActionFn> {
        self.map.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[derive(Clone)]
enum Bound {
    User(ActionFn),
    Grammar(GrammarAction),
    Default,
}

/// Per-symbol actions resolved against one grammar.
#[derive(Clone)]
pub(crate) struct ActionTable {
    terminals: Vec<Bound>,
    nonterminals: Vec<Bound>,
}

impl ActionTable {
    pub(crate) fn resolve(grammar: &Grammar, actions: &Actions) -> Self {
        let bind = |name: &str, action: Option<&CompactString>, builtin: Option<GrammarAction>| {
            if let Some(action) = action
                && actions.get(action).is_none()
                && builtin.is_none()
            {
                tracing::warn!(symbol = name, action = %action, "no action registered under this name");
            }
            action
                .and_then(|a| actions.get(a))
                .or_else(|| actions.get(name))
                .map(|f| Bound::User(Arc::clone(f)))
                .or(builtin.map(Bound::Grammar))
                .unwrap_or(Bound::Default)
        };
        Self {
            terminals: grammar
                .terminals()
                .map(|(_, t)| bind(&t.name, t.action.as_ref(), t.grammar_action))
                .collect(),
            nonterminals: grammar
                .nonterminals()
                .map(|(_, n)| bind(&n.name, n.action.as_ref(), n.grammar_action))
                .collect(),
        }
    }

    pub(crate) fn shift(&self, ctx: &Context<'_>) -> Result<Value, ActionError> {
        let token = Value::Token(ctx.text().into());
        let Some(Symbol::Terminal(t)) = ctx.symbol else {
            return Ok(token);
        };
        match &self.terminals[t.index()] {
            Bound::User(f) => f(ctx, vec![token]),
            Bound::Grammar(action) => Ok(builtin(*action, None, vec![token])),
            Bound::Default => Ok(token),
        }
    }

    pub(crate) fn reduce(
        &self,
        ctx: &Context<'_>,
        production: &Production,
        children: Vec<Value>,
    ) -> Result<Value, ActionError> {
        match &self.nonterminals[production.lhs.index()] {
            Bound::User(f) => f(ctx, children),
            Bound::Grammar(action) => Ok(builtin(*action, Some((ctx.grammar, production)), children)),
            Bound::Default if !production.assignments.is_empty() => {
                Ok(object(ctx.grammar, production, children))
            }
            Bound::Default => Ok(match children.len() {
                0 => Value::Empty,
                1 => children.into_iter().next().unwrap_or_default(),
                _ => Value::List(children),
            }),
        }
    }
}

fn builtin(action: GrammarAction, production: Option<(&Grammar, &Production)>, children: Vec<Value>) -> Value {
    let mut children = children;
    match action {
        GrammarAction::PassSingle => children.into_iter().next().unwrap_or_default(),
        GrammarAction::PassNone => Value::Empty,
        GrammarAction::PassInner => {
            if children.len() < 2 {
                return Value::Empty;
            }
            children.pop();
            children.remove(0);
            if children.len() == 1 {
                children.pop().unwrap_or_default()
            } else {
                Value::List(children)
            }
        }
        GrammarAction::PassAll => Value::List(children),
        GrammarAction::Collect | GrammarAction::CollectSep => {
            let item = children.pop().unwrap_or_default();
            match children.into_iter().next() {
                Some(Value::List(mut items)) => {
                    items.push(item);
                    Value::List(items)
                }
                _ => Value::List(vec![item]),
            }
        }
        GrammarAction::CollectOptional => match children.pop() {
            Some(list @ Value::List(_)) => list,
            Some(other) => Value::List(vec![other]),
            None => Value::List(Vec::new()),
        },
        GrammarAction::Optional => children.pop().unwrap_or_default(),
        GrammarAction::Object => match production {
            Some((grammar, production)) => object(grammar, production, children),
            None => Value::List(children),
        },
    }
}

fn object(grammar: &Grammar, production: &Production, children: Vec<Value>) -> Value {
    let fields = production
        .assignments
        .iter()
        .map(|a| {
            let value = children.get(a.index).cloned().unwrap_or_default();
            let value = match a.op {
                AssignOp::Plain => value,
                AssignOp::Bool => Value::Bool(!value.is_empty()),
            };
            (a.name.clone(), value)
        })
        .collect();
    Value::Object {
        kind: grammar.nonterminal(production.lhs).name.clone(),
        fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(items: &[&str]) -> Vec<Value> {
        items.iter().map(|s| Value::Token((*s).into())).collect()
    }

    #[test]
    fn collect_appends() {
        let list = builtin(GrammarAction::Collect, None, tokens(&["a"]));
        assert_eq!(list.to_string(), "[a]");
        let list = builtin(GrammarAction::Collect, None, vec![list, Value::Token("b".into())]);
        assert_eq!(list.to_string(), "[a, b]");
        let list = builtin(
            GrammarAction::CollectSep,
            None,
            vec![list, Value::Token(",".into()), Value::Token("c".into())],
        );
        assert_eq!(list.to_string(), "[a, b, c]");
    }

    #[test]
    fn optional_and_inner() {
        assert_eq!(builtin(GrammarAction::Optional, None, Vec::new()), Value::Empty);
        assert_eq!(
            builtin(GrammarAction::CollectOptional, None, Vec::new()),
            Value::List(Vec::new())
        );
        let inner = builtin(GrammarAction::PassInner, None, tokens(&["(", "x", ")"]));
        assert_eq!(inner, Value::Token("x".into()));
        let inner = builtin(GrammarAction::PassInner, None, tokens(&["[", "x", "y", "]"]));
        assert_eq!(inner.to_string(), "[x, y]");
    }
}
