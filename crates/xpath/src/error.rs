use crate::xdm::ValueType;
use itertools::Itertools;
use thiserror::Error;
use treepath_grammar::{GrammarError, ParseError};

/// Every failure the engine reports. All of them reject the query; nothing is
/// retried or partially evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Grammar(#[from] GrammarError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

/// Invalid function library configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error(
        "function '{name}' declared with duplicate signature ({})",
        signature.iter().join(", ")
    )]
    DuplicateSignature { name: String, signature: Vec<ValueType> },
    #[error("function '{0}' is already defined")]
    AlreadyDefined(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("cannot apply arguments ({}) to function '{name}'", arg_types.iter().join(", "))]
    NoMatchingOverload { name: String, arg_types: Vec<ValueType> },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("unknown axis '{0}'")]
    UnknownAxis(String),
    #[error("invalid node type test '{0}'")]
    InvalidNodeTypeTest(String),
    #[error("undefined variable '${0}'")]
    UndefinedVariable(String),
    #[error("variable '${0}' does not resolve to a known type")]
    UnresolvableVariableType(String),
    #[error("expression requires a context node")]
    NoContextItem,
    #[error("expected a node-set, found {found}")]
    NotANodeSet { found: ValueType },
    #[error("document order undefined: {0}")]
    DocumentOrder(String),
    #[error("expression produced no value")]
    NoValue,
    #[error("missing argument at position {0}")]
    MissingArgument(usize),
}

impl Error {
    /// Shorthand used by function implementations for type errors.
    pub(crate) fn not_a_node_set(found: ValueType) -> Self {
        EvaluationError::NotANodeSet { found }.into()
    }
}
