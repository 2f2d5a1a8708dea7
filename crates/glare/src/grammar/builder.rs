use super::{
    AUGMENTED_NAME, AssignOp, Assignment, Associativity, DEFAULT_PRIORITY, Grammar, GrammarAction,
    NameMap, NonTerminal, NonTerminalId, Production, ProductionId, RESERVED_NAMES, Symbol,
    Terminal, TerminalId,
};
use crate::error::GrammarError;
use crate::lexer::{Recognize, Recognizer};
use compact_str::{CompactString, format_compact};
use regex::Regex;
use smallvec::SmallVec;
use std::sync::Arc;

/// How many times an right-hand side item may repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Multiplicity {
    #[default]
    One,
    /// `X?`
    Optional,
    /// `X*`
    ZeroOrMore,
    /// `X+`
    OneOrMore,
}

#[derive(Clone)]
enum RecognizerSource {
    Literal(CompactString),
    Pattern(CompactString),
    Custom(Arc<dyn Recognize>),
}

/// Definition of a named terminal.
#[derive(Clone)]
pub struct TerminalDef {
    pub(crate) name: CompactString,
    source: RecognizerSource,
    priority: i32,
    finish: bool,
    prefer: bool,
    dynamic: bool,
    ignore_case: bool,
    action: Option<CompactString>,
    grammar_action: Option<GrammarAction>,
}

impl TerminalDef {
    fn with_source(name: impl Into<CompactString>, source: RecognizerSource) -> Self {
        Self {
            name: name.into(),
            source,
            priority: DEFAULT_PRIORITY,
            finish: false,
            prefer: false,
            dynamic: false,
            ignore_case: false,
            action: None,
            grammar_action: None,
        }
    }

    /// Terminal matching `text` exactly.
    #[must_use]
    pub fn literal(name: impl Into<CompactString>, text: impl Into<CompactString>) -> Self {
        Self::with_source(name, RecognizerSource::Literal(text.into()))
    }

    /// Terminal matching a regular expression anchored at the current position.
    #[must_use]
    pub fn pattern(name: impl Into<CompactString>, pattern: impl Into<CompactString>) -> Self {
        Self::with_source(name, RecognizerSource::Pattern(pattern.into()))
    }

    #[must_use]
    pub fn custom(name: impl Into<CompactString>, recognizer: impl Recognize + 'static) -> Self {
        Self::with_source(name, RecognizerSource::Custom(Arc::new(recognizer)))
    }

    #[must_use]
    pub const fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub const fn finish(mut self) -> Self {
        self.finish = true;
        self
    }

    #[must_use]
    pub const fn prefer(mut self) -> Self {
        self.prefer = true;
        self
    }

    #[must_use]
    pub const fn dynamic(mut self) -> Self {
        self.dynamic = true;
        self
    }

    /// Only meaningful for literals.
    #[must_use]
    pub const fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    #[must_use]
    pub fn action(mut self, name: impl Into<CompactString>) -> Self {
        self.action = Some(name.into());
        self
    }

    #[must_use]
    pub const fn grammar_action(mut self, action: GrammarAction) -> Self {
        self.grammar_action = Some(action);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Name(CompactString),
    Literal(CompactString),
}

/// One item of a production's right-hand side.
#[derive(Debug, Clone)]
pub struct RhsItem {
    target: Target,
    multiplicity: Multiplicity,
    separator: Option<Target>,
    assignment: Option<(CompactString, AssignOp)>,
}

/// Reference to a terminal or non-terminal by name.
#[must_use]
pub fn sym(name: impl Into<CompactString>) -> RhsItem {
    RhsItem::new(Target::Name(name.into()))
}

/// Inline literal; the terminal is created on first use and named after its text.
#[must_use]
pub fn lit(text: impl Into<CompactString>) -> RhsItem {
    RhsItem::new(Target::Literal(text.into()))
}

/// A production with an empty right-hand side.
#[must_use]
pub fn empty() -> ProductionDef {
    ProductionDef::new(std::iter::empty::<RhsItem>())
}

impl RhsItem {
    const fn new(target: Target) -> Self {
        Self {
            target,
            multiplicity: Multiplicity::One,
            separator: None,
            assignment: None,
        }
    }

    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.multiplicity = Multiplicity::Optional;
        self
    }

    #[must_use]
    pub const fn zero_or_more(mut self) -> Self {
        self.multiplicity = Multiplicity::ZeroOrMore;
        self
    }

    #[must_use]
    pub const fn one_or_more(mut self) -> Self {
        self.multiplicity = Multiplicity::OneOrMore;
        self
    }

    /// Separator between repetitions, for `*` and `+`.
    #[must_use]
    pub fn sep(mut self, separator: RhsItem) -> Self {
        self.separator = Some(separator.target);
        self
    }

    /// `name=X`
    #[must_use]
    pub fn assign(mut self, name: impl Into<CompactString>) -> Self {
        self.assignment = Some((name.into(), AssignOp::Plain));
        self
    }

    /// `name?=X`
    #[must_use]
    pub fn assign_bool(mut self, name: impl Into<CompactString>) -> Self {
        self.assignment = Some((name.into(), AssignOp::Bool));
        self
    }
}

impl From<&str> for RhsItem {
    fn from(name: &str) -> Self {
        sym(name)
    }
}

/// Definition of one production of a rule.
#[derive(Debug, Clone)]
pub struct ProductionDef {
    items: Vec<RhsItem>,
    associativity: Associativity,
    priority: i32,
    dynamic: bool,
    suppress_prefer_shift: bool,
    suppress_prefer_shift_over_empty: bool,
}

impl ProductionDef {
    #[must_use]
    pub fn new<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<RhsItem>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            associativity: Associativity::None,
            priority: DEFAULT_PRIORITY,
            dynamic: false,
            suppress_prefer_shift: false,
            suppress_prefer_shift_over_empty: false,
        }
    }

    #[must_use]
    pub const fn left(mut self) -> Self {
        self.associativity = Associativity::Left;
        self
    }

    #[must_use]
    pub const fn right(mut self) -> Self {
        self.associativity = Associativity::Right;
        self
    }

    #[must_use]
    pub const fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub const fn dynamic(mut self) -> Self {
        self.dynamic = true;
        self
    }

    /// `nops`: never prefer shift over this reduction.
    #[must_use]
    pub const fn no_prefer_shift(mut self) -> Self {
        self.suppress_prefer_shift = true;
        self
    }

    /// `nopse`: never prefer shift over this production's empty reduction.
    #[must_use]
    pub const fn no_prefer_shift_over_empty(mut self) -> Self {
        self.suppress_prefer_shift_over_empty = true;
        self
    }
}

struct RuleDef {
    name: CompactString,
    productions: Vec<ProductionDef>,
}

/// Fluent grammar construction.
///
/// Rules are referenced by name and may be used before they are defined.
/// The first rule is the start symbol unless [`start`](Self::start) says
/// otherwise.
#[derive(Default)]
pub struct GrammarBuilder {
    terminals: Vec<TerminalDef>,
    layout: Vec<TerminalDef>,
    rules: Vec<RuleDef>,
    rule_actions: Vec<(CompactString, CompactString)>,
    rule_grammar_actions: Vec<(CompactString, GrammarAction)>,
    start: Option<CompactString>,
    keyword_pattern: Option<CompactString>,
}

impl GrammarBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn start(mut self, name: impl Into<CompactString>) -> Self {
        self.start = Some(name.into());
        self
    }

    #[must_use]
    pub fn terminal(mut self, def: TerminalDef) -> Self {
        self.terminals.push(def);
        self
    }

    /// Terminal skipped before every token (whitespace, comments).
    #[must_use]
    pub fn layout(mut self, def: TerminalDef) -> Self {
        self.layout.push(def);
        self
    }

    /// Literals fully matching `pattern` become keywords: they only match
    /// on a word boundary and win over same-length non-keywords.
    #[must_use]
    pub fn keyword_pattern(mut self, pattern: impl Into<CompactString>) -> Self {
        self.keyword_pattern = Some(pattern.into());
        self
    }

    /// Adds productions for `name`; repeated calls append.
    #[must_use]
    pub fn rule<I>(mut self, name: impl Into<CompactString>, productions: I) -> Self
    where
        I: IntoIterator<Item = ProductionDef>,
    {
        let name = name.into();
        let productions = productions.into_iter();
        if let Some(rule) = self.rules.iter_mut().find(|r| r.name == name) {
            rule.productions.extend(productions);
        } else {
            self.rules.push(RuleDef {
                name,
                productions: productions.collect(),
            });
        }
        self
    }

    /// Names the user action for a rule; it is looked up in the
    /// [`Actions`](crate::Actions) registry when the parser is created.
    ///
    /// The rule may be declared later, or be a generated repetition rule.
    /// [`build`](Self::build) fails with [`GrammarError::UndefinedRule`] if
    /// it never exists.
    #[must_use]
    pub fn rule_action(mut self, rule: &str, action: impl Into<CompactString>) -> Self {
        self.rule_actions.push((rule.into(), action.into()));
        self
    }

    #[must_use]
    pub fn rule_grammar_action(mut self, rule: &str, action: GrammarAction) -> Self {
        self.rule_grammar_actions.push((rule.into(), action));
        self
    }

    pub fn build(self) -> Result<Grammar, GrammarError> {
        let mut asm = Assembly::new();

        for def in self.terminals {
            asm.add_terminal(def, false)?;
        }
        for def in self.layout {
            let id = asm.add_terminal(def, true)?;
            asm.layout.push(id);
        }

        for rule in &self.rules {
            asm.check_name(&rule.name)?;
            let id = NonTerminalId(asm.nonterminals.len() as u32);
            asm.nonterminal_names.insert(rule.name.clone(), id);
            asm.nonterminals.push(NonTerminal {
                name: rule.name.clone(),
                productions: Vec::new(),
                action: None,
                grammar_action: None,
            });
        }

        let root = match self.start.as_ref().or_else(|| self.rules.first().map(|r| &r.name)) {
            None => return Err(GrammarError::MissingStart),
            Some(name) => asm
                .nonterminal_names
                .get(name.as_str())
                .copied()
                .ok_or_else(|| GrammarError::UndefinedStart(name.clone()))?,
        };
        asm.push_production(
            NonTerminalId::AUGMENTED,
            SmallVec::from_elem(Symbol::NonTerminal(root), 1),
            SmallVec::new(),
            &ProductionDef::new(std::iter::empty::<RhsItem>()),
        );

        for rule in &self.rules {
            let lhs = asm.nonterminal_names[rule.name.as_str()];
            for def in &rule.productions {
                let mut rhs = SmallVec::new();
                let mut assignments = SmallVec::new();
                for item in &def.items {
                    let Some(symbol) = asm.resolve_item(item, &rule.name)? else {
                        continue;
                    };
                    if let Some((name, op)) = &item.assignment {
                        assignments.push(Assignment {
                            name: name.clone(),
                            op: *op,
                            index: rhs.len(),
                        });
                    }
                    rhs.push(symbol);
                }
                asm.push_production(lhs, rhs, assignments, def);
            }
        }

        for (rule, action) in self.rule_actions {
            asm.rule_mut(&rule)?.action = Some(action);
        }
        for (rule, action) in self.rule_grammar_actions {
            asm.rule_mut(&rule)?.grammar_action = Some(action);
        }

        if let Some(pattern) = &self.keyword_pattern {
            asm.mark_keywords(pattern)?;
        }

        Ok(Grammar {
            terminals: asm.terminals,
            nonterminals: asm.nonterminals,
            productions: asm.productions,
            root,
            terminal_names: asm.terminal_names,
            nonterminal_names: asm.nonterminal_names,
            layout: asm.layout,
        })
    }
}

/// Grammar under construction.
struct Assembly {
    terminals: Vec<Terminal>,
    nonterminals: Vec<NonTerminal>,
    productions: Vec<Production>,
    terminal_names: NameMap<TerminalId>,
    nonterminal_names: NameMap<NonTerminalId>,
    generated: NameMap<NonTerminalId>,
    layout: Vec<TerminalId>,
}

impl Assembly {
    fn new() -> Self {
        let mut asm = Self {
            terminals: Vec::new(),
            nonterminals: Vec::new(),
            productions: Vec::new(),
            terminal_names: NameMap::with_hasher(ahash::RandomState::new()),
            nonterminal_names: NameMap::with_hasher(ahash::RandomState::new()),
            generated: NameMap::with_hasher(ahash::RandomState::new()),
            layout: Vec::new(),
        };
        for name in ["EOF", "EMPTY"] {
            asm.insert_terminal(reserved_terminal(name));
        }
        asm.nonterminals.push(NonTerminal {
            name: AUGMENTED_NAME.into(),
            productions: Vec::new(),
            action: None,
            grammar_action: None,
        });
        asm
    }

    fn check_name(&self, name: &str) -> Result<(), GrammarError> {
        if RESERVED_NAMES.contains(&name) {
            return Err(GrammarError::ReservedName(name.into()));
        }
        if self.terminal_names.contains_key(name) || self.nonterminal_names.contains_key(name) {
            return Err(GrammarError::DuplicateSymbol(name.into()));
        }
        Ok(())
    }

    fn rule_mut(&mut self, name: &str) -> Result<&mut NonTerminal, GrammarError> {
        let id = self
            .nonterminal_names
            .get(name)
            .copied()
            .ok_or_else(|| GrammarError::UndefinedRule(name.into()))?;
        Ok(&mut self.nonterminals[id.index()])
    }

    fn insert_terminal(&mut self, terminal: Terminal) -> TerminalId {
        let id = TerminalId(self.terminals.len() as u32);
        self.terminal_names.insert(terminal.name.clone(), id);
        self.terminals.push(terminal);
        id
    }

    fn add_terminal(&mut self, def: TerminalDef, layout: bool) -> Result<TerminalId, GrammarError> {
        self.check_name(&def.name)?;
        let recognizer = match def.source {
            RecognizerSource::Literal(text) if text.is_empty() => {
                return Err(GrammarError::EmptyLiteral(def.name));
            }
            RecognizerSource::Literal(text) => Recognizer::Literal {
                text,
                ignore_case: def.ignore_case,
                keyword: false,
            },
            RecognizerSource::Pattern(pattern) => {
                Recognizer::pattern(&pattern).map_err(|e| GrammarError::InvalidPattern {
                    terminal: def.name.clone(),
                    message: e.to_string(),
                })?
            }
            RecognizerSource::Custom(custom) => Recognizer::Custom(custom),
        };
        Ok(self.insert_terminal(Terminal {
            name: def.name,
            recognizer,
            priority: def.priority,
            finish: def.finish,
            prefer: def.prefer,
            dynamic: def.dynamic,
            keyword: false,
            layout,
            action: def.action,
            grammar_action: def.grammar_action,
        }))
    }

    fn resolve_target(&mut self, target: &Target, rule: &str) -> Result<Option<Symbol>, GrammarError> {
        match target {
            Target::Name(name) if name == "EMPTY" => Ok(None),
            Target::Name(name) => {
                if let Some(&t) = self.terminal_names.get(name.as_str()) {
                    if self.terminals[t.index()].layout {
                        return Err(GrammarError::LayoutInProduction {
                            terminal: name.clone(),
                            rule: rule.into(),
                        });
                    }
                    return Ok(Some(Symbol::Terminal(t)));
                }
                self.nonterminal_names
                    .get(name.as_str())
                    .map(|&n| Some(Symbol::NonTerminal(n)))
                    .ok_or_else(|| GrammarError::UndefinedSymbol {
                        name: name.clone(),
                        rule: rule.into(),
                    })
            }
            Target::Literal(text) if text.is_empty() => Err(GrammarError::EmptyLiteral(text.clone())),
            Target::Literal(text) => {
                if RESERVED_NAMES.contains(&text.as_str()) {
                    return Err(GrammarError::ReservedName(text.clone()));
                }
                if let Some(&t) = self.terminal_names.get(text.as_str()) {
                    let terminal = &self.terminals[t.index()];
                    return match &terminal.recognizer {
                        Recognizer::Literal { text: existing, .. } if existing == text && !terminal.layout => {
                            Ok(Some(Symbol::Terminal(t)))
                        }
                        _ => Err(GrammarError::DuplicateSymbol(text.clone())),
                    };
                }
                if self.nonterminal_names.contains_key(text.as_str()) {
                    return Err(GrammarError::DuplicateSymbol(text.clone()));
                }
                let mut terminal = reserved_terminal(text);
                terminal.recognizer = Recognizer::literal(text.clone());
                Ok(Some(Symbol::Terminal(self.insert_terminal(terminal))))
            }
        }
    }

    fn resolve_item(&mut self, item: &RhsItem, rule: &str) -> Result<Option<Symbol>, GrammarError> {
        let Some(base) = self.resolve_target(&item.target, rule)? else {
            return Ok(None);
        };
        let separator = match &item.separator {
            Some(sep) => self.resolve_target(sep, rule)?,
            None => None,
        };
        let symbol = match item.multiplicity {
            Multiplicity::One => base,
            Multiplicity::OneOrMore => Symbol::NonTerminal(self.one_or_more(base, separator)?),
            Multiplicity::ZeroOrMore => {
                let list = self.one_or_more(base, separator)?;
                let name = repetition_name(self, base, "0", separator);
                Symbol::NonTerminal(self.generate(name, GrammarAction::CollectOptional, |_| {
                    vec![SmallVec::from_elem(Symbol::NonTerminal(list), 1), SmallVec::new()]
                })?)
            }
            Multiplicity::Optional => {
                let name = repetition_name(self, base, "opt", None);
                Symbol::NonTerminal(self.generate(name, GrammarAction::Optional, |_| {
                    vec![SmallVec::from_elem(base, 1), SmallVec::new()]
                })?)
            }
        };
        Ok(Some(symbol))
    }

    fn one_or_more(
        &mut self,
        base: Symbol,
        separator: Option<Symbol>,
    ) -> Result<NonTerminalId, GrammarError> {
        let name = repetition_name(self, base, "1", separator);
        let action = if separator.is_some() {
            GrammarAction::CollectSep
        } else {
            GrammarAction::Collect
        };
        self.generate(name, action, |id| {
            let mut recursive = SmallVec::from_elem(Symbol::NonTerminal(id), 1);
            recursive.extend(separator);
            recursive.push(base);
            vec![recursive, SmallVec::from_elem(base, 1)]
        })
    }

    /// Creates (or reuses) a generated non-terminal.
    fn generate(
        &mut self,
        name: CompactString,
        action: GrammarAction,
        productions: impl FnOnce(NonTerminalId) -> Vec<SmallVec<[Symbol; 4]>>,
    ) -> Result<NonTerminalId, GrammarError> {
        if let Some(&id) = self.generated.get(name.as_str()) {
            return Ok(id);
        }
        self.check_name(&name)?;
        let id = NonTerminalId(self.nonterminals.len() as u32);
        self.nonterminal_names.insert(name.clone(), id);
        self.generated.insert(name.clone(), id);
        self.nonterminals.push(NonTerminal {
            name,
            productions: Vec::new(),
            action: None,
            grammar_action: Some(action),
        });
        let def = ProductionDef::new(std::iter::empty::<RhsItem>());
        for rhs in productions(id) {
            self.push_production(id, rhs, SmallVec::new(), &def);
        }
        Ok(id)
    }

    fn push_production(
        &mut self,
        lhs: NonTerminalId,
        rhs: SmallVec<[Symbol; 4]>,
        assignments: SmallVec<[Assignment; 1]>,
        def: &ProductionDef,
    ) {
        let id = ProductionId(self.productions.len() as u32);
        self.nonterminals[lhs.index()].productions.push(id);
        self.productions.push(Production {
            id,
            lhs,
            rhs,
            associativity: def.associativity,
            priority: def.priority,
            dynamic: def.dynamic,
            suppress_prefer_shift: def.suppress_prefer_shift,
            suppress_prefer_shift_over_empty: def.suppress_prefer_shift_over_empty,
            assignments,
        });
    }

    fn mark_keywords(&mut self, pattern: &str) -> Result<(), GrammarError> {
        let regex = Regex::new(&format!(r"\A(?:{pattern})\z"))
            .map_err(|e| GrammarError::InvalidKeywordPattern(e.to_string()))?;
        for terminal in &mut self.terminals {
            if terminal.layout {
                continue;
            }
            if let Recognizer::Literal { text, keyword, .. } = &mut terminal.recognizer
                && regex.is_match(text)
            {
                *keyword = true;
                terminal.keyword = true;
            }
        }
        Ok(())
    }
}

fn reserved_terminal(name: &str) -> Terminal {
    Terminal {
        name: name.into(),
        recognizer: Recognizer::Reserved,
        priority: DEFAULT_PRIORITY,
        finish: false,
        prefer: false,
        dynamic: false,
        keyword: false,
        layout: false,
        action: None,
        grammar_action: None,
    }
}

fn repetition_name(
    asm: &Assembly,
    base: Symbol,
    suffix: &str,
    separator: Option<Symbol>,
) -> CompactString {
    let name_of = |symbol: Symbol| match symbol {
        Symbol::Terminal(t) => asm.terminals[t.index()].name.clone(),
        Symbol::NonTerminal(n) => asm.nonterminals[n.index()].name.clone(),
    };
    match separator {
        Some(sep) => format_compact!("{}_{suffix}_{}", name_of(base), name_of(sep)),
        None => format_compact!("{}_{suffix}", name_of(base)),
    }
}
