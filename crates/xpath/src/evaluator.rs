//! Tree-walking interpreter over [`XPathExpr`] syntax trees.
//!
//! Every visit leaves at most one [`Value`] on the result stack. Operators
//! are not evaluated here: they are forwarded to the library functions named
//! by [`CompareOp::function_name`] and [`ArithmeticOp::function_name`], so all
//! type conversions live in the function library.

use crate::axes::Axis;
use crate::context::EvaluationContext;
use crate::error::{Error, EvaluationError};
use crate::functions::args;
use crate::model::{NodeKind, QName, XdmNode};
use crate::parser::ast::{
    ArgumentList, ArithmeticOp, CompareOp, Expr, LocationPath, NodeTest, PredicateList, Step,
    Visitor, XPathExpr,
};
use crate::xdm::{NodeSet, Value};
use core::ops::ControlFlow;

pub struct Interpreter<'c, 'a, N> {
    ctx: &'c mut EvaluationContext<'a, N>,
    results: Vec<Value<N>>,
}

impl<'c, 'a, N: XdmNode> Interpreter<'c, 'a, N> {
    pub fn new(ctx: &'c mut EvaluationContext<'a, N>) -> Self {
        Self { ctx, results: Vec::new() }
    }

    /// Evaluates `root`; `None` if the expression produced no value.
    pub fn interpret(&mut self, root: &XPathExpr) -> Result<Option<Value<N>>, Error> {
        self.results.clear();
        self.visit_expr(&root.expr)?;
        Ok(self.results.pop())
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value<N>, Error> {
        self.visit_expr(expr)?;
        self.results.pop().ok_or_else(|| EvaluationError::NoValue.into())
    }

    fn push(&mut self, value: Value<N>) -> Result<(), Error> {
        self.results.push(value);
        Ok(())
    }

    fn truthy(&mut self, value: &Value<N>) -> Result<bool, Error> {
        args::coerce_boolean(self.ctx, value)
    }

    /// Runs `f` with the evaluation context saved; it is restored on every path.
    fn scoped<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R, Error>) -> Result<R, Error> {
        self.ctx.push_context();
        let result = f(self);
        self.ctx.pop_context();
        result
    }

    /// Applies `path` to `start`, or to the nodes in context when `start` is
    /// `None`. Absolute paths start at the root of the context item.
    fn select(&mut self, start: Option<Vec<N>>, path: &LocationPath) -> Result<NodeSet<N>, Error> {
        self.scoped(|this| {
            if path.absolute {
                let root = this.ctx.require_dot()?.root();
                this.ctx.set_nodes(vec![root]);
            } else if let Some(nodes) = start {
                this.ctx.set_nodes(nodes);
            } else {
                this.ctx.require_dot()?;
            }
            for step in &path.steps {
                this.step(step)?;
            }
            NodeSet::from_nodes(this.ctx.context_nodes())
        })
    }

    fn step(&mut self, step: &Step) -> Result<(), Error> {
        let axis = self.ctx.axis_guide(&step.axis)?;
        let origins = self.ctx.context_nodes();
        let mut found = Vec::new();
        for origin in origins {
            let mut kept = self.scoped(|this| {
                this.ctx.set_axis(axis, origin);
                this.node_test(axis, &step.test)?;
                this.predicates(&step.predicates)?;
                Ok(this.ctx.context_nodes())
            })?;
            if axis.is_reverse() {
                kept.reverse();
            }
            found.extend(kept);
        }
        let selected = NodeSet::from_nodes(found)?;
        tracing::trace!(step = %step, selected = selected.len(), "step evaluated");
        self.ctx.set_nodes(selected.into_vec());
        Ok(())
    }

    fn node_test(&mut self, axis: Axis, test: &NodeTest) -> Result<(), Error> {
        let matcher = self.matcher(axis, test)?;
        let mut kept = Vec::new();
        let _ = self.ctx.producer().for_each(&mut |n| {
            if matcher.matches(&n) {
                kept.push(n);
            }
            ControlFlow::Continue(())
        });
        self.ctx.set_nodes(kept);
        Ok(())
    }

    fn matcher(&self, axis: Axis, test: &NodeTest) -> Result<Matcher, Error> {
        let invalid = || -> Error { EvaluationError::InvalidNodeTypeTest(test.to_string()).into() };
        let Some(kind) = &test.kind else {
            let principal = axis.principal_kind();
            return Ok(match test.name.split_once(':') {
                _ if test.name == "*" => Matcher::Principal(principal),
                Some((prefix, local)) => Matcher::Name {
                    principal,
                    namespace: Namespace::Prefixed {
                        prefix: prefix.to_string(),
                        uri: self.ctx.resolve_namespace(prefix),
                    },
                    local: (local != "*").then(|| local.to_string()),
                },
                None => Matcher::Name {
                    principal,
                    namespace: Namespace::None,
                    local: Some(test.name.clone()),
                },
            });
        };
        match (kind.as_str(), test.args.0.as_slice()) {
            ("node", []) => Ok(Matcher::Any),
            ("text", []) => Ok(Matcher::Kind(NodeKind::Text)),
            ("comment", []) => Ok(Matcher::Kind(NodeKind::Comment)),
            ("processing-instruction", []) => Ok(Matcher::Kind(NodeKind::ProcessingInstruction)),
            ("processing-instruction", [Expr::Literal(target)]) => {
                Ok(Matcher::Target(target.clone()))
            }
            _ => Err(invalid()),
        }
    }

    /// Keeps the nodes in context for which every predicate holds, one
    /// predicate at a time; positions restart for each predicate.
    fn predicates(&mut self, predicates: &PredicateList) -> Result<(), Error> {
        for predicate in predicates.iter() {
            let nodes = self.ctx.context_nodes();
            let size = nodes.len();
            let mut kept = Vec::with_capacity(size);
            for (i, node) in nodes.into_iter().enumerate() {
                let keep = self.scoped(|this| {
                    this.ctx.set_focus(node.clone(), i + 1, size);
                    match this.eval(&predicate.0)? {
                        Value::Number(n) => Ok(n == (i + 1) as f64),
                        other => this.truthy(&other),
                    }
                })?;
                if keep {
                    kept.push(node);
                }
            }
            self.ctx.set_nodes(kept);
        }
        Ok(())
    }
}

enum Namespace {
    None,
    Prefixed { prefix: String, uri: Option<String> },
}

enum Matcher {
    Any,
    Kind(NodeKind),
    Target(String),
    Principal(NodeKind),
    Name { principal: NodeKind, namespace: Namespace, local: Option<String> },
}

impl Matcher {
    fn matches<N: XdmNode>(&self, node: &N) -> bool {
        match self {
            Matcher::Any => true,
            Matcher::Kind(kind) => node.kind() == *kind,
            Matcher::Target(target) => {
                node.kind() == NodeKind::ProcessingInstruction
                    && node.name().is_some_and(|q| q.local == *target)
            }
            Matcher::Principal(kind) => node.kind() == *kind,
            Matcher::Name { principal, namespace, local } => {
                if node.kind() != *principal {
                    return false;
                }
                let Some(name) = node.name() else { return false };
                if local.as_ref().is_some_and(|l| *l != name.local) {
                    return false;
                }
                match namespace {
                    Namespace::None => {
                        name.prefix.is_none() && name.ns_uri.as_deref().is_none_or(str::is_empty)
                    }
                    Namespace::Prefixed { uri: Some(uri), .. } => {
                        namespace_of(node, &name).as_deref() == Some(uri)
                    }
                    Namespace::Prefixed { prefix, uri: None } => {
                        name.prefix.as_deref() == Some(prefix.as_str())
                    }
                }
            }
        }
    }
}

fn namespace_of<N: XdmNode>(node: &N, name: &QName) -> Option<String> {
    name.ns_uri.clone().or_else(|| node.lookup_namespace_uri(name.prefix.as_deref()?))
}

impl<N: XdmNode> Visitor for Interpreter<'_, '_, N> {
    type Error = Error;

    fn visit_path(&mut self, path: &LocationPath) -> Result<(), Error> {
        let selected = self.select(None, path)?;
        self.push(Value::NodeSet(selected))
    }

    fn visit_path_expr(&mut self, filter: Option<&Expr>, path: &LocationPath) -> Result<(), Error> {
        let start = match filter {
            Some(filter) => self.eval(filter)?.into_nodes()?,
            None => vec![self.ctx.require_dot()?.clone()],
        };
        let selected = self.select(Some(start), path)?;
        self.push(Value::NodeSet(selected))
    }

    fn visit_filter(&mut self, expr: &Expr, predicates: &PredicateList) -> Result<(), Error> {
        let base = self.eval(expr)?.into_nodes()?;
        let selected = self.scoped(|this| {
            this.ctx.set_nodes(base);
            this.predicates(predicates)?;
            NodeSet::from_nodes(this.ctx.context_nodes())
        })?;
        self.push(Value::NodeSet(selected))
    }

    fn visit_union(&mut self, left: &Expr, right: &Expr) -> Result<(), Error> {
        let l = self.eval(left)?;
        let r = self.eval(right)?;
        let merged = self.ctx.call("union", &[l, r])?;
        self.push(merged)
    }

    fn visit_or(&mut self, left: &Expr, right: &Expr) -> Result<(), Error> {
        let l = self.eval(left)?;
        if self.truthy(&l)? {
            return self.push(Value::Boolean(true));
        }
        let r = self.eval(right)?;
        let b = self.truthy(&r)?;
        self.push(Value::Boolean(b))
    }

    fn visit_and(&mut self, left: &Expr, right: &Expr) -> Result<(), Error> {
        let l = self.eval(left)?;
        if !self.truthy(&l)? {
            return self.push(Value::Boolean(false));
        }
        let r = self.eval(right)?;
        let b = self.truthy(&r)?;
        self.push(Value::Boolean(b))
    }

    fn visit_compare(&mut self, op: CompareOp, left: &Expr, right: &Expr) -> Result<(), Error> {
        let l = self.eval(left)?;
        let r = self.eval(right)?;
        let out = self.ctx.call(op.function_name(), &[l, r])?;
        self.push(out)
    }

    fn visit_arithmetic(
        &mut self,
        op: ArithmeticOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<(), Error> {
        let l = self.eval(left)?;
        let r = self.eval(right)?;
        let out = self.ctx.call(op.function_name(), &[l, r])?;
        self.push(out)
    }

    fn visit_negate(&mut self, expr: &Expr) -> Result<(), Error> {
        let v = self.eval(expr)?;
        let out = self.ctx.call("negate", &[v])?;
        self.push(out)
    }

    fn visit_literal(&mut self, value: &str) -> Result<(), Error> {
        self.push(Value::String(value.to_string()))
    }

    fn visit_number(&mut self, value: f64) -> Result<(), Error> {
        self.push(Value::Number(value))
    }

    fn visit_variable_ref(&mut self, name: &str) -> Result<(), Error> {
        let value = self.ctx.get_value(name)?;
        self.push(value)
    }

    fn visit_function_call(&mut self, name: &str, args: &ArgumentList) -> Result<(), Error> {
        let values = args.iter().map(|arg| self.eval(arg)).collect::<Result<Vec<_>, _>>()?;
        let out = self.ctx.call(name, &values)?;
        self.push(out)
    }
}
