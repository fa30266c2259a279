//! Caller-supplied evaluation inputs: context nodes, variables, namespaces.

use crate::context::EvaluationContext;
use crate::model::XdmNode;
use crate::xdm::{NodeSet, Value};
use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

/// Variable computed from the evaluation context when it is referenced.
pub type Thunk<N> = Arc<dyn Fn(&EvaluationContext<'_, N>) -> Variable<N> + Send + Sync>;

/// A variable binding as the caller provides it. Scalars and node lists are
/// typed when the variable is read; thunks are invoked at that point.
#[derive(Clone)]
pub enum Variable<N> {
    Boolean(bool),
    Number(f64),
    String(String),
    Node(N),
    Nodes(Vec<N>),
    Value(Value<N>),
    Thunk(Thunk<N>),
}

impl<N> Variable<N> {
    pub fn thunk<F>(f: F) -> Self
    where
        F: Fn(&EvaluationContext<'_, N>) -> Variable<N> + Send + Sync + 'static,
    {
        Variable::Thunk(Arc::new(f))
    }
}

impl<N: fmt::Debug> fmt::Debug for Variable<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Variable::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Variable::String(s) => f.debug_tuple("String").field(s).finish(),
            Variable::Node(n) => f.debug_tuple("Node").field(n).finish(),
            Variable::Nodes(ns) => f.debug_tuple("Nodes").field(ns).finish(),
            Variable::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Variable::Thunk(_) => f.write_str("Thunk(..)"),
        }
    }
}

impl<N> From<bool> for Variable<N> {
    fn from(b: bool) -> Self {
        Variable::Boolean(b)
    }
}

impl<N> From<f64> for Variable<N> {
    fn from(n: f64) -> Self {
        Variable::Number(n)
    }
}

impl<N> From<i32> for Variable<N> {
    fn from(n: i32) -> Self {
        Variable::Number(f64::from(n))
    }
}

impl<N> From<&str> for Variable<N> {
    fn from(s: &str) -> Self {
        Variable::String(s.to_string())
    }
}

impl<N> From<String> for Variable<N> {
    fn from(s: String) -> Self {
        Variable::String(s)
    }
}

impl<N> From<Vec<N>> for Variable<N> {
    fn from(nodes: Vec<N>) -> Self {
        Variable::Nodes(nodes)
    }
}

impl<N> From<NodeSet<N>> for Variable<N> {
    fn from(set: NodeSet<N>) -> Self {
        Variable::Value(Value::NodeSet(set))
    }
}

impl<N> From<Value<N>> for Variable<N> {
    fn from(v: Value<N>) -> Self {
        Variable::Value(v)
    }
}

/// Inputs of one evaluation.
#[derive(Debug, Clone)]
pub struct DynamicContext<N> {
    context_nodes: Vec<N>,
    variables: HashMap<String, Variable<N>>,
    namespaces: HashMap<String, String>,
}

impl<N> Default for DynamicContext<N> {
    fn default() -> Self {
        Self { context_nodes: Vec::new(), variables: HashMap::new(), namespaces: HashMap::new() }
    }
}

impl<N> DynamicContext<N> {
    /// Initial context nodes; the first one is the context item.
    pub fn context_nodes(&self) -> &[N] {
        &self.context_nodes
    }

    pub fn variables(&self) -> &HashMap<String, Variable<N>> {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Variable<N>> {
        self.variables.get(name)
    }

    /// Prefix to namespace-URI bindings used by name tests.
    pub fn namespaces(&self) -> &HashMap<String, String> {
        &self.namespaces
    }
}

pub struct DynamicContextBuilder<N> {
    ctx: DynamicContext<N>,
}

impl<N> Default for DynamicContextBuilder<N> {
    fn default() -> Self {
        Self { ctx: DynamicContext::default() }
    }
}

impl<N: XdmNode> DynamicContextBuilder<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context_node(mut self, node: N) -> Self {
        self.ctx.context_nodes = vec![node];
        self
    }

    pub fn with_context_nodes(mut self, nodes: impl IntoIterator<Item = N>) -> Self {
        self.ctx.context_nodes = nodes.into_iter().collect();
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Variable<N>>) -> Self {
        self.ctx.variables.insert(name.into(), value.into());
        self
    }

    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.ctx.namespaces.insert(prefix.into(), uri.into());
        self
    }

    pub fn build(self) -> DynamicContext<N> {
        self.ctx
    }
}
