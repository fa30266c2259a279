//! Mutable evaluation state threaded through the interpreter and every
//! function implementation.

use crate::axes::{Axis, AxisGuide};
use crate::error::{Error, EvaluationError};
use crate::functions::FunctionLibrary;
use crate::model::XdmNode;
use crate::runtime::{DynamicContext, Variable};
use crate::xdm::{NodeSet, Value, ValueType};
use core::ops::ControlFlow;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::rc::Rc;

/// Source of the nodes currently in context.
#[derive(Debug, Clone)]
pub enum Producer<N> {
    /// A materialized sequence, in context order.
    Nodes(Rc<[N]>),
    /// The nodes of `axis` from `origin`, produced on demand.
    Axis { axis: Axis, origin: N },
}

impl<N: XdmNode> Producer<N> {
    pub fn for_each(&self, visit: &mut dyn FnMut(N) -> ControlFlow<()>) -> ControlFlow<()> {
        match self {
            Producer::Nodes(nodes) => {
                for n in nodes.iter() {
                    visit(n.clone())?;
                }
                ControlFlow::Continue(())
            }
            Producer::Axis { axis, origin } => axis.guide(origin, visit),
        }
    }

    pub fn count(&self) -> usize {
        match self {
            Producer::Nodes(nodes) => nodes.len(),
            Producer::Axis { axis, origin } => axis.count(origin),
        }
    }

    pub fn to_vec(&self) -> Vec<N> {
        match self {
            Producer::Nodes(nodes) => nodes.to_vec(),
            Producer::Axis { axis, origin } => axis.collect(origin),
        }
    }
}

#[derive(Debug, Clone)]
struct Frame<N> {
    producer: Producer<N>,
    size: usize,
    item: Option<N>,
    position: usize,
}

pub struct EvaluationContext<'a, N> {
    item: Option<N>,
    position: usize,
    size: usize,
    producer: Producer<N>,
    stack: Vec<Frame<N>>,
    variables: &'a HashMap<String, Variable<N>>,
    namespaces: &'a HashMap<String, String>,
    library: &'a FunctionLibrary<N>,
}

impl<'a, N: XdmNode> EvaluationContext<'a, N> {
    pub fn new(input: &'a DynamicContext<N>, library: &'a FunctionLibrary<N>) -> Self {
        let nodes = input.context_nodes();
        Self {
            item: nodes.first().cloned(),
            position: 1,
            size: nodes.len(),
            producer: Producer::Nodes(nodes.into()),
            stack: Vec::new(),
            variables: input.variables(),
            namespaces: input.namespaces(),
            library,
        }
    }

    /// The context item, if any.
    pub fn dot(&self) -> Option<&N> {
        self.item.as_ref()
    }

    pub fn require_dot(&self) -> Result<&N, Error> {
        self.item.as_ref().ok_or_else(|| EvaluationError::NoContextItem.into())
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn last(&self) -> usize {
        self.size
    }

    pub fn library(&self) -> &'a FunctionLibrary<N> {
        self.library
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn push_context(&mut self) {
        self.stack.push(Frame {
            producer: self.producer.clone(),
            size: self.size,
            item: self.item.clone(),
            position: self.position,
        });
    }

    pub fn pop_context(&mut self) {
        if let Some(frame) = self.stack.pop() {
            self.producer = frame.producer;
            self.size = frame.size;
            self.item = frame.item;
            self.position = frame.position;
        }
    }

    /// Runs `f` between a push and a pop; the pop happens on every path.
    pub fn with_saved_context<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<R, Error>,
    ) -> Result<R, Error> {
        self.push_context();
        let result = f(self);
        self.pop_context();
        result
    }

    /// Focuses one node of a sequence: it becomes the item and the only
    /// node in context.
    pub fn set_focus(&mut self, item: N, position: usize, size: usize) {
        self.producer = Producer::Nodes(Rc::from([item.clone()]));
        self.item = Some(item);
        self.position = position;
        self.size = size;
    }

    /// Replaces the nodes in context with a materialized sequence.
    pub fn set_nodes(&mut self, nodes: Vec<N>) {
        self.size = nodes.len();
        self.position = 1;
        self.producer = Producer::Nodes(nodes.into());
    }

    /// Replaces the nodes in context with an axis; `size` is counted up front.
    pub fn set_axis(&mut self, axis: Axis, origin: N) {
        let producer = Producer::Axis { axis, origin };
        self.size = producer.count();
        self.position = 1;
        self.producer = producer;
    }

    pub fn producer(&self) -> &Producer<N> {
        &self.producer
    }

    pub fn context_nodes(&self) -> Vec<N> {
        self.producer.to_vec()
    }

    /// Resolves an axis name.
    pub fn axis_guide(&self, name: &str) -> Result<Axis, Error> {
        name.parse::<Axis>().map_err(Error::from)
    }

    /// Namespace URI bound to `prefix`, from the caller's bindings or the
    /// context item.
    pub fn resolve_namespace(&self, prefix: &str) -> Option<String> {
        self.namespaces
            .get(prefix)
            .cloned()
            .or_else(|| self.item.as_ref()?.lookup_namespace_uri(prefix))
    }

    /// Reads variable `name`. The built-ins `dot`, `position` and `last`
    /// shadow caller bindings.
    pub fn get_value(&self, name: &str) -> Result<Value<N>, Error> {
        let builtin = match name {
            "dot" => Some(match &self.item {
                Some(n) => Variable::Node(n.clone()),
                None => Variable::Nodes(Vec::new()),
            }),
            "position" => Some(Variable::Number(self.position as f64)),
            "last" => Some(Variable::Number(self.size as f64)),
            _ => None,
        };
        match builtin.as_ref().or_else(|| self.variables.get(name)) {
            Some(binding) => self.coerce_binding(name, binding, true),
            None => Err(EvaluationError::UndefinedVariable(name.to_string()).into()),
        }
    }

    fn coerce_binding(
        &self,
        name: &str,
        binding: &Variable<N>,
        allow_thunk: bool,
    ) -> Result<Value<N>, Error> {
        Ok(match binding {
            Variable::Boolean(b) => Value::Boolean(*b),
            Variable::Number(n) => Value::Number(*n),
            Variable::String(s) => Value::String(s.clone()),
            Variable::Node(n) => Value::NodeSet(NodeSet::singleton(n.clone())),
            Variable::Nodes(nodes) => Value::NodeSet(NodeSet::from_nodes(nodes.clone())?),
            Variable::Value(v) => v.clone(),
            Variable::Thunk(f) if allow_thunk => return self.coerce_binding(name, &f(self), false),
            Variable::Thunk(_) => {
                return Err(EvaluationError::UnresolvableVariableType(name.to_string()).into());
            }
        })
    }

    /// Calls library function `name`, dispatching on the argument types.
    pub fn call(&mut self, name: &str, args: &[Value<N>]) -> Result<Value<N>, Error> {
        let library = self.library;
        let types: SmallVec<[ValueType; 4]> = args.iter().map(Value::value_type).collect();
        let function = library.resolve(name, &types)?;
        function.invoke(self, args)
    }
}
