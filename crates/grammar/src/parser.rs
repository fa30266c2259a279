use crate::error::{LexError, ParseError};
use crate::grammar::{Grammar, RuleId};
use crate::symbol::Symbol;
use crate::table::ParseTable;

/// Token source driven by the parser.
///
/// `next_token` advances to the next token and classifies it; `take_value`
/// hands over the semantic value of the token last returned.
pub trait Tokenizer<T> {
    fn next_token(&mut self) -> Result<Symbol, LexError>;

    fn take_value(&mut self) -> T;

    /// Source text of the current token, for diagnostics.
    fn describe_value(&self) -> Option<String> {
        None
    }
}

/// Table-driven LL(1) parser over a compiled grammar.
#[derive(Debug)]
pub struct Parser<'g, T> {
    grammar: &'g Grammar<T>,
    table: &'g ParseTable,
    start: Symbol,
}

struct Frame<T> {
    rule: Option<RuleId>,
    values: Vec<T>,
}

impl<'g, T> Parser<'g, T> {
    /// Builds the parse table if needed; fails on grammar conflicts.
    pub fn new(grammar: &'g Grammar<T>) -> Result<Self, ParseError> {
        let table = grammar.parse_table()?;
        let start = grammar.start_symbol().ok_or(crate::GrammarError::MissingStart)?;
        Ok(Self { grammar, table, start })
    }

    pub fn grammar(&self) -> &'g Grammar<T> {
        self.grammar
    }

    /// Names of the terminals that could have appeared where `sym` was on top of the stack.
    fn expected(&self, sym: Symbol) -> Vec<String> {
        if self.grammar.is_non_terminal(sym) {
            self.table.expected(sym).map(|t| self.grammar.symbol_name(t)).collect()
        } else {
            vec![self.grammar.symbol_name(sym)]
        }
    }

    /// Parses the whole token stream and returns the start rule's value.
    pub fn parse(&self, tokens: &mut dyn Tokenizer<T>) -> Result<T, ParseError> {
        let eos = self.grammar.eos();
        let mut stack = vec![eos, self.start];
        let mut frames = vec![Frame { rule: None, values: Vec::new() }];
        let mut token = tokens.next_token()?;

        while let Some(sym) = stack.pop() {
            if sym == token {
                if sym == eos {
                    break;
                }
                if let Some(frame) = frames.last_mut() {
                    frame.values.push(tokens.take_value());
                }
                token = tokens.next_token()?;
            } else if let Some(id) = self.table.get(sym, token) {
                let rhs = self.grammar.rule(id).map(|r| r.rhs()).unwrap_or_default();
                stack.extend(rhs.iter().rev());
                frames.push(Frame { rule: Some(id), values: Vec::with_capacity(rhs.len()) });
            } else {
                tracing::trace!(
                    expected = %self.grammar.symbol_name(sym),
                    found = %self.grammar.symbol_name(token),
                    "no parse table entry"
                );
                return Err(ParseError::UnexpectedToken {
                    token: self.grammar.symbol_name(token),
                    value: tokens.describe_value(),
                    expected: self.expected(sym),
                });
            }
            self.fold(&mut frames)?;
        }

        frames.pop().and_then(|root| root.values.into_iter().next()).ok_or(ParseError::NoValue)
    }

    /// Applies the semantic action of every complete frame on top of the
    /// stack, handing each result to the enclosing frame.
    fn fold(&self, frames: &mut Vec<Frame<T>>) -> Result<(), ParseError> {
        while let Some(top) = frames.last() {
            let Some(id) = top.rule else { break };
            let Some(rule) = self.grammar.rule(id) else { break };
            if top.values.len() < rule.rhs().len() {
                break;
            }
            let Some(frame) = frames.pop() else { break };
            let value = rule
                .apply(frame.values)
                .map_err(|source| ParseError::Action { rule: id, source })?;
            if let Some(parent) = frames.last_mut() {
                parent.values.push(value);
            }
        }
        Ok(())
    }
}

impl<T> Grammar<T> {
    /// Convenience for `Parser::new(self)?.parse(tokens)`.
    pub fn parse(&self, tokens: &mut dyn Tokenizer<T>) -> Result<T, ParseError> {
        Parser::new(self)?.parse(tokens)
    }
}
