use crate::grammar::RuleId;
use crate::symbol::Symbol;
use itertools::Itertools;
use std::collections::HashMap;

/// LL(1) parse table: (non-terminal, lookahead terminal) -> rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseTable {
    cells: HashMap<(Symbol, Symbol), RuleId>,
}

impl ParseTable {
    pub fn get(&self, non_terminal: Symbol, terminal: Symbol) -> Option<RuleId> {
        self.cells.get(&(non_terminal, terminal)).copied()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All cells as `(non_terminal, terminal, rule)`.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, Symbol, RuleId)> + '_ {
        self.cells.iter().map(|(&(nt, t), &rule)| (nt, t, rule))
    }

    /// Lookahead terminals with an entry for `non_terminal`, in symbol order.
    pub fn expected(&self, non_terminal: Symbol) -> impl Iterator<Item = Symbol> {
        self.cells.keys().filter(|(nt, _)| *nt == non_terminal).map(|&(_, t)| t).sorted()
    }

    /// Assigns a cell, returning the rule that previously occupied it.
    pub(crate) fn insert(
        &mut self,
        non_terminal: Symbol,
        terminal: Symbol,
        rule: RuleId,
    ) -> Option<RuleId> {
        match self.cells.get(&(non_terminal, terminal)) {
            Some(&existing) => Some(existing),
            None => {
                self.cells.insert((non_terminal, terminal), rule);
                None
            }
        }
    }
}
