//! Production rules and the derived FIRST/FOLLOW sets and parse table.
//!
//! Derived data is computed on first use and cached; adding a rule drops the
//! caches so the next query recomputes them.

use crate::error::{ActionError, ConflictKind, GrammarError};
use crate::symbol::{Symbol, SymbolTable};
use crate::table::ParseTable;
use core::fmt;
use itertools::Itertools;
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, OnceLock};

pub type RuleId = usize;

/// Semantic action of a rule: builds the rule's value from its children.
pub type Action<T> = Arc<dyn Fn(Vec<T>) -> Result<T, ActionError> + Send + Sync>;

pub type Rhs = SmallVec<[Symbol; 4]>;

pub struct Rule<T> {
    id: RuleId,
    lhs: Symbol,
    rhs: Rhs,
    action: Action<T>,
}

impl<T> Rule<T> {
    pub fn id(&self) -> RuleId {
        self.id
    }

    pub fn lhs(&self) -> Symbol {
        self.lhs
    }

    pub fn rhs(&self) -> &[Symbol] {
        &self.rhs
    }

    pub fn apply(&self, children: Vec<T>) -> Result<T, ActionError> {
        (self.action)(children)
    }
}

impl<T> fmt::Debug for Rule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("lhs", &self.lhs)
            .field("rhs", &self.rhs)
            .finish_non_exhaustive()
    }
}

/// Terminals that can begin a derivation, plus whether the empty derivation
/// is possible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirstSet {
    pub terminals: BTreeSet<Symbol>,
    pub epsilon: bool,
}

impl FirstSet {
    pub fn contains(&self, terminal: Symbol) -> bool {
        self.terminals.contains(&terminal)
    }

    fn absorb(&mut self, other: &FirstSet) -> bool {
        let before = self.terminals.len();
        self.terminals.extend(other.terminals.iter().copied());
        let grew = self.terminals.len() != before || (other.epsilon && !self.epsilon);
        self.epsilon |= other.epsilon;
        grew
    }
}

pub struct Grammar<T> {
    symbols: Box<dyn SymbolTable>,
    eos: Symbol,
    start: Option<Symbol>,
    rules: Vec<Rule<T>>,
    by_lhs: BTreeMap<Symbol, Vec<RuleId>>,
    firsts: OnceLock<BTreeMap<Symbol, FirstSet>>,
    follows: OnceLock<BTreeMap<Symbol, BTreeSet<Symbol>>>,
    table: OnceLock<ParseTable>,
}

impl<T> fmt::Debug for Grammar<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("eos", &self.eos)
            .field("start", &self.start)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl<T> Grammar<T> {
    /// Creates an empty grammar over `symbols` whose input ends with `eos`.
    pub fn new(symbols: impl SymbolTable + 'static, eos: Symbol) -> Result<Self, GrammarError> {
        if !symbols.contains(eos) {
            return Err(GrammarError::InvalidSymbol { lhs: eos, symbol: eos });
        }
        Ok(Self {
            symbols: Box::new(symbols),
            eos,
            start: None,
            rules: Vec::new(),
            by_lhs: BTreeMap::new(),
            firsts: OnceLock::new(),
            follows: OnceLock::new(),
            table: OnceLock::new(),
        })
    }

    /// Declares the start symbol and returns a handle for its productions.
    pub fn start(&mut self, symbol: Symbol) -> Result<Productions<'_, T>, GrammarError> {
        if let Some(existing) = self.start {
            return Err(GrammarError::DuplicateStart { existing });
        }
        if !self.symbols.contains(symbol) {
            return Err(GrammarError::InvalidSymbol { lhs: symbol, symbol });
        }
        self.start = Some(symbol);
        self.invalidate();
        Ok(Productions { grammar: self, lhs: symbol })
    }

    /// Returns a handle for adding productions of `symbol`.
    pub fn symbol(&mut self, symbol: Symbol) -> Productions<'_, T> {
        Productions { grammar: self, lhs: symbol }
    }

    /// Appends a production; its id is its insertion index.
    pub fn add_rule<F>(
        &mut self,
        lhs: Symbol,
        rhs: &[Symbol],
        action: F,
    ) -> Result<RuleId, GrammarError>
    where
        F: Fn(Vec<T>) -> Result<T, ActionError> + Send + Sync + 'static,
    {
        if let Some(&bad) = std::iter::once(&lhs).chain(rhs).find(|s| !self.symbols.contains(**s)) {
            return Err(GrammarError::InvalidSymbol { lhs, symbol: bad });
        }
        let id = self.rules.len();
        let rhs = rhs.iter().copied().collect();
        self.rules.push(Rule { id, lhs, rhs, action: Arc::new(action) });
        self.by_lhs.entry(lhs).or_default().push(id);
        self.invalidate();
        Ok(id)
    }

    fn invalidate(&mut self) {
        self.firsts = OnceLock::new();
        self.follows = OnceLock::new();
        self.table = OnceLock::new();
    }

    pub fn eos(&self) -> Symbol {
        self.eos
    }

    pub fn start_symbol(&self) -> Option<Symbol> {
        self.start
    }

    pub fn symbols(&self) -> &dyn SymbolTable {
        self.symbols.as_ref()
    }

    pub fn rules(&self) -> &[Rule<T>] {
        &self.rules
    }

    pub fn rule(&self, id: RuleId) -> Option<&Rule<T>> {
        self.rules.get(id)
    }

    /// Rules whose left-hand side is `symbol`, in insertion order.
    pub fn rules_for(&self, symbol: Symbol) -> impl Iterator<Item = &Rule<T>> {
        self.by_lhs.get(&symbol).into_iter().flatten().map(|&id| &self.rules[id])
    }

    pub fn is_non_terminal(&self, symbol: Symbol) -> bool {
        self.by_lhs.contains_key(&symbol)
    }

    pub fn non_terminals(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.by_lhs.keys().copied()
    }

    /// Terminals referenced by some rule, plus the end-of-stream marker.
    pub fn terminals(&self) -> BTreeSet<Symbol> {
        self.rules
            .iter()
            .flat_map(|r| r.rhs.iter().copied())
            .filter(|s| !self.is_non_terminal(*s))
            .chain(std::iter::once(self.eos))
            .collect()
    }

    pub fn symbol_name(&self, symbol: Symbol) -> String {
        self.symbols.name(symbol).map_or_else(|| symbol.to_string(), str::to_string)
    }

    pub fn display_rule(&self, id: RuleId) -> RuleDisplay<'_, T> {
        RuleDisplay { grammar: self, id }
    }

    /// FIRST set of `symbol`, or of one of its rules when `rule` is given.
    pub fn first(&self, symbol: Symbol, rule: Option<RuleId>) -> Result<FirstSet, GrammarError> {
        match rule {
            Some(id) => {
                let rule = self
                    .rules
                    .get(id)
                    .filter(|r| r.lhs == symbol)
                    .ok_or(GrammarError::UnknownRule { symbol, rule: id })?;
                Ok(self.first_of(&rule.rhs))
            }
            None if self.is_non_terminal(symbol) => {
                Ok(self.first_sets().get(&symbol).cloned().unwrap_or_default())
            }
            None => Ok(FirstSet { terminals: BTreeSet::from([symbol]), epsilon: false }),
        }
    }

    /// FIRST set of a symbol sequence; the empty sequence derives epsilon.
    pub fn first_of(&self, sequence: &[Symbol]) -> FirstSet {
        sequence_first(sequence, self.first_sets(), |s| self.is_non_terminal(s))
    }

    fn first_sets(&self) -> &BTreeMap<Symbol, FirstSet> {
        self.firsts.get_or_init(|| {
            let mut sets: BTreeMap<Symbol, FirstSet> =
                self.by_lhs.keys().map(|&nt| (nt, FirstSet::default())).collect();
            loop {
                let mut changed = false;
                for rule in &self.rules {
                    let derived = sequence_first(&rule.rhs, &sets, |s| self.is_non_terminal(s));
                    if let Some(set) = sets.get_mut(&rule.lhs) {
                        changed |= set.absorb(&derived);
                    }
                }
                if !changed {
                    break sets;
                }
            }
        })
    }

    /// Terminals that can directly follow `symbol`.
    pub fn follow(&self, symbol: Symbol) -> Result<&BTreeSet<Symbol>, GrammarError> {
        self.follow_sets()?.get(&symbol).ok_or(GrammarError::NotANonTerminal(symbol))
    }

    fn follow_sets(&self) -> Result<&BTreeMap<Symbol, BTreeSet<Symbol>>, GrammarError> {
        if let Some(sets) = self.follows.get() {
            return Ok(sets);
        }
        let start = self.start.ok_or(GrammarError::MissingStart)?;
        Ok(self.follows.get_or_init(|| self.compute_follow_sets(start)))
    }

    fn compute_follow_sets(&self, start: Symbol) -> BTreeMap<Symbol, BTreeSet<Symbol>> {
        let mut sets: BTreeMap<Symbol, BTreeSet<Symbol>> =
            self.by_lhs.keys().map(|&nt| (nt, BTreeSet::new())).collect();
        sets.entry(start).or_default().insert(self.eos);

        // FOLLOW(from) must flow into FOLLOW(into) for every (from -> into).
        let mut dependents: BTreeMap<Symbol, BTreeSet<Symbol>> = BTreeMap::new();
        for rule in &self.rules {
            for (i, &x) in rule.rhs.iter().enumerate() {
                if !self.is_non_terminal(x) {
                    continue;
                }
                let suffix = self.first_of(&rule.rhs[i + 1..]);
                sets.entry(x).or_default().extend(suffix.terminals.iter().copied());
                if suffix.epsilon && rule.lhs != x {
                    dependents.entry(rule.lhs).or_default().insert(x);
                }
            }
        }

        let mut pending: VecDeque<(Symbol, Symbol)> = dependents
            .iter()
            .flat_map(|(&from, intos)| intos.iter().map(move |&into| (from, into)))
            .collect();
        while let Some((from, into)) = pending.pop_front() {
            let source = sets.get(&from).cloned().unwrap_or_default();
            let target = sets.entry(into).or_default();
            let before = target.len();
            target.extend(source);
            if target.len() != before
                && let Some(next) = dependents.get(&into)
            {
                pending.extend(next.iter().map(|&n| (into, n)));
            }
        }
        sets
    }

    /// Builds (or returns the cached) LL(1) parse table.
    pub fn parse_table(&self) -> Result<&ParseTable, GrammarError> {
        if let Some(table) = self.table.get() {
            return Ok(table);
        }
        let table = self.build_parse_table()?;
        tracing::debug!(rules = self.rules.len(), cells = table.len(), "parse table built");
        Ok(self.table.get_or_init(|| table))
    }

    fn build_parse_table(&self) -> Result<ParseTable, GrammarError> {
        let follows = self.follow_sets()?;
        let mut table = ParseTable::default();
        for (&nt, ids) in &self.by_lhs {
            for &id in ids {
                let first = self.first_of(&self.rules[id].rhs);
                for &t in &first.terminals {
                    self.assign(&mut table, nt, t, id, ConflictKind::FirstFirst)?;
                }
                if first.epsilon {
                    for &t in follows.get(&nt).into_iter().flatten() {
                        self.assign(&mut table, nt, t, id, ConflictKind::FirstFollow)?;
                    }
                }
            }
        }
        Ok(table)
    }

    fn assign(
        &self,
        table: &mut ParseTable,
        non_terminal: Symbol,
        terminal: Symbol,
        rule: RuleId,
        kind: ConflictKind,
    ) -> Result<(), GrammarError> {
        match table.insert(non_terminal, terminal, rule) {
            Some(existing) => {
                let description = self.display_rule(rule).to_string();
                tracing::warn!(
                    %kind,
                    rule,
                    existing,
                    terminal = %self.symbol_name(terminal),
                    "grammar is not LL(1): {description}"
                );
                Err(GrammarError::Conflict {
                    kind,
                    rule,
                    description,
                    non_terminal,
                    terminal,
                    existing,
                })
            }
            None => Ok(()),
        }
    }
}

fn sequence_first(
    sequence: &[Symbol],
    sets: &BTreeMap<Symbol, FirstSet>,
    is_non_terminal: impl Fn(Symbol) -> bool,
) -> FirstSet {
    let mut out = FirstSet::default();
    for &s in sequence {
        if !is_non_terminal(s) {
            out.terminals.insert(s);
            return out;
        }
        let Some(first) = sets.get(&s) else { return out };
        out.terminals.extend(first.terminals.iter().copied());
        if !first.epsilon {
            return out;
        }
    }
    out.epsilon = true;
    out
}

/// Chainable handle returned by [`Grammar::start`] and [`Grammar::symbol`].
pub struct Productions<'g, T> {
    grammar: &'g mut Grammar<T>,
    lhs: Symbol,
}

impl<T> Productions<'_, T> {
    pub fn produces<F>(self, rhs: &[Symbol], action: F) -> Result<Self, GrammarError>
    where
        F: Fn(Vec<T>) -> Result<T, ActionError> + Send + Sync + 'static,
    {
        self.grammar.add_rule(self.lhs, rhs, action)?;
        Ok(self)
    }
}

/// Renders a rule as `LHS ::= A B c`.
pub struct RuleDisplay<'g, T> {
    grammar: &'g Grammar<T>,
    id: RuleId,
}

impl<T> fmt::Display for RuleDisplay<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(rule) = self.grammar.rule(self.id) else {
            return write!(f, "<no rule {}>", self.id);
        };
        write!(f, "{} ::=", self.grammar.symbol_name(rule.lhs))?;
        if !rule.rhs.is_empty() {
            write!(f, " {}", rule.rhs.iter().map(|&s| self.grammar.symbol_name(s)).join(" "))?;
        }
        Ok(())
    }
}
