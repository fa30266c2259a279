use crate::symbol::Symbol;
use core::fmt;
use thiserror::Error;

/// Which kind of LL(1) table collision was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    FirstFirst,
    FirstFollow,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::FirstFirst => f.write_str("First/First"),
            ConflictKind::FirstFollow => f.write_str("First/Follow"),
        }
    }
}

/// Errors raised while defining a grammar or deriving its tables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("invalid symbol {symbol} in rule for {lhs}")]
    InvalidSymbol { lhs: Symbol, symbol: Symbol },
    #[error("start symbol already declared as {existing}")]
    DuplicateStart { existing: Symbol },
    #[error("grammar has no start symbol")]
    MissingStart,
    #[error("rule {rule} is not a production of {symbol}")]
    UnknownRule { symbol: Symbol, rule: usize },
    #[error("symbol {0} is not a valid non-terminal")]
    NotANonTerminal(Symbol),
    #[error("{kind} conflict (rule {rule}: {description})")]
    Conflict {
        kind: ConflictKind,
        rule: usize,
        description: String,
        non_terminal: Symbol,
        terminal: Symbol,
        existing: usize,
    },
}

/// Raised by a semantic action that cannot build a value from its children.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ActionError(pub String);

impl ActionError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Raised by a tokenizer on input it cannot classify.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("lexical error at offset {offset}: {message}")]
pub struct LexError {
    pub offset: usize,
    pub message: String,
}

impl LexError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self { offset, message: message.into() }
    }
}

/// Errors raised while driving the table-driven parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(
        "unexpected token {token}{}, expected one of: {}",
        value.as_deref().map(|v| format!(" ({v})")).unwrap_or_default(),
        expected.join(", ")
    )]
    UnexpectedToken { token: String, value: Option<String>, expected: Vec<String> },
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("semantic action of rule {rule} failed: {source}")]
    Action {
        rule: usize,
        #[source]
        source: ActionError,
    },
    #[error("parser finished without producing a value")]
    NoValue,
    #[error(transparent)]
    Grammar(#[from] GrammarError),
}
