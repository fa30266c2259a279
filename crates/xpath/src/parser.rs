//! Query-language front end: tokenizer, grammar and syntax tree.

pub mod ast;
mod grammar;
mod lexer;
mod symbols;

pub use grammar::{Op, Sem, query_grammar};
pub use lexer::{Token, TokenValue, XPathLexer, tokenize};
pub use symbols::{QuerySymbols, Sym};

use crate::error::Error;
use ast::XPathExpr;
use treepath_grammar::{Grammar, ParseError, Parser};

/// Parses XPath 1.0 expressions with an owned copy of the query grammar.
///
/// The parse table is built when the parser is created, so a parser that
/// exists has a conflict-free grammar.
pub struct XPathParser {
    grammar: Grammar<Sem>,
}

impl core::fmt::Debug for XPathParser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("XPathParser").field("rules", &self.grammar.rules().len()).finish()
    }
}

impl XPathParser {
    pub fn new() -> Result<Self, Error> {
        let grammar = query_grammar()?;
        let table = grammar.parse_table()?;
        let (rules, cells) = (grammar.rules().len(), table.len());
        tracing::debug!(rules, cells, "query grammar compiled");
        Ok(Self { grammar })
    }

    pub fn grammar(&self) -> &Grammar<Sem> {
        &self.grammar
    }

    pub fn parse(&self, input: &str) -> Result<XPathExpr, Error> {
        let mut lexer = XPathLexer::new(input);
        let value = Parser::new(&self.grammar)?.parse(&mut lexer)?;
        match value {
            Sem::Root(expr) => {
                tracing::trace!(%input, ast = %expr, "parsed expression");
                Ok(expr)
            }
            _ => Err(ParseError::NoValue.into()),
        }
    }
}
