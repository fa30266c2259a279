//! Syntax tree of XPath 1.0 expressions.
//!
//! Axis and node-type names are kept as written; they are resolved when the
//! tree is evaluated, so an unknown axis is an evaluation error rather than a
//! parse error.

use crate::xdm::number_to_string;
use core::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct XPathExpr {
    pub expr: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl CompareOp {
    /// Library function the operator is evaluated with.
    pub fn function_name(self) -> &'static str {
        match self {
            CompareOp::Eq => "equals",
            CompareOp::Ne => "not-equals",
            CompareOp::Lt => "less-than",
            CompareOp::Gt => "greater-than",
            CompareOp::Le => "less-than-or-equal",
            CompareOp::Ge => "greater-than-or-equal",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Le => "<=",
            CompareOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl ArithmeticOp {
    pub fn function_name(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Sub => "subtract",
            ArithmeticOp::Mul => "multiply",
            ArithmeticOp::Div => "divide",
            ArithmeticOp::Mod => "modulus",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Sub => "-",
            ArithmeticOp::Mul => "*",
            ArithmeticOp::Div => "div",
            ArithmeticOp::Mod => "mod",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Path(LocationPath),
    /// A relative path applied to the nodes of `filter`, or to the context
    /// node when there is no filter.
    PathExpr { filter: Option<Box<Expr>>, path: LocationPath },
    Filter { expr: Box<Expr>, predicates: PredicateList },
    Union(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Compare { op: CompareOp, left: Box<Expr>, right: Box<Expr> },
    Arithmetic { op: ArithmeticOp, left: Box<Expr>, right: Box<Expr> },
    Negate(Box<Expr>),
    Literal(String),
    Number(f64),
    VariableRef(String),
    FunctionCall { name: String, args: ArgumentList },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: String,
    pub test: NodeTest,
    pub predicates: PredicateList,
}

impl Step {
    pub fn new(axis: impl Into<String>, test: NodeTest) -> Self {
        Self { axis: axis.into(), test, predicates: PredicateList::default() }
    }

    /// `axis::node()`, the expansion of `.`, `..` and `//`.
    pub fn any_node(axis: &str) -> Self {
        Self::new(axis, NodeTest::kind("node", ArgumentList::default()))
    }
}

/// A name test (`*`, `prefix:*`, `QName`) or, when `kind` is set, a node-type
/// test such as `text()` or `processing-instruction('target')`.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTest {
    pub name: String,
    pub kind: Option<String>,
    pub args: ArgumentList,
}

impl NodeTest {
    pub fn name(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: None, args: ArgumentList::default() }
    }

    pub fn kind(kind: impl Into<String>, args: ArgumentList) -> Self {
        Self { name: "*".into(), kind: Some(kind.into()), args }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate(pub Box<Expr>);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateList(pub Vec<Predicate>);

impl PredicateList {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Predicate> {
        self.0.iter()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentList(pub Vec<Expr>);

impl ArgumentList {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Expr> {
        self.0.iter()
    }
}

/// Walks an expression tree. `visit_expr` dispatches to one method per
/// [`Expr`] variant; implementors recurse by calling `visit_expr` on children.
pub trait Visitor {
    type Error;

    fn visit_expr(&mut self, expr: &Expr) -> Result<(), Self::Error> {
        match expr {
            Expr::Path(path) => self.visit_path(path),
            Expr::PathExpr { filter, path } => self.visit_path_expr(filter.as_deref(), path),
            Expr::Filter { expr, predicates } => self.visit_filter(expr, predicates),
            Expr::Union(l, r) => self.visit_union(l, r),
            Expr::Or(l, r) => self.visit_or(l, r),
            Expr::And(l, r) => self.visit_and(l, r),
            Expr::Compare { op, left, right } => self.visit_compare(*op, left, right),
            Expr::Arithmetic { op, left, right } => self.visit_arithmetic(*op, left, right),
            Expr::Negate(e) => self.visit_negate(e),
            Expr::Literal(s) => self.visit_literal(s),
            Expr::Number(n) => self.visit_number(*n),
            Expr::VariableRef(name) => self.visit_variable_ref(name),
            Expr::FunctionCall { name, args } => self.visit_function_call(name, args),
        }
    }

    fn visit_path(&mut self, path: &LocationPath) -> Result<(), Self::Error>;
    fn visit_path_expr(
        &mut self,
        filter: Option<&Expr>,
        path: &LocationPath,
    ) -> Result<(), Self::Error>;
    fn visit_filter(&mut self, expr: &Expr, predicates: &PredicateList) -> Result<(), Self::Error>;
    fn visit_union(&mut self, left: &Expr, right: &Expr) -> Result<(), Self::Error>;
    fn visit_or(&mut self, left: &Expr, right: &Expr) -> Result<(), Self::Error>;
    fn visit_and(&mut self, left: &Expr, right: &Expr) -> Result<(), Self::Error>;
    fn visit_compare(&mut self, op: CompareOp, left: &Expr, right: &Expr)
    -> Result<(), Self::Error>;
    fn visit_arithmetic(
        &mut self,
        op: ArithmeticOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<(), Self::Error>;
    fn visit_negate(&mut self, expr: &Expr) -> Result<(), Self::Error>;
    fn visit_literal(&mut self, value: &str) -> Result<(), Self::Error>;
    fn visit_number(&mut self, value: f64) -> Result<(), Self::Error>;
    fn visit_variable_ref(&mut self, name: &str) -> Result<(), Self::Error>;
    fn visit_function_call(&mut self, name: &str, args: &ArgumentList) -> Result<(), Self::Error>;
}

impl fmt::Display for XPathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.expr.fmt(f)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Path(path) => path.fmt(f),
            Expr::PathExpr { filter: Some(filter), path } => write!(f, "{filter}/{path}"),
            Expr::PathExpr { filter: None, path } => path.fmt(f),
            Expr::Filter { expr, predicates } => write!(f, "{expr}{predicates}"),
            Expr::Union(l, r) => write!(f, "{l} | {r}"),
            Expr::Or(l, r) => write!(f, "({l} or {r})"),
            Expr::And(l, r) => write!(f, "({l} and {r})"),
            Expr::Compare { op, left, right } => write!(f, "({left} {} {right})", op.symbol()),
            Expr::Arithmetic { op, left, right } => write!(f, "({left} {} {right})", op.symbol()),
            Expr::Negate(e) => write!(f, "-{e}"),
            Expr::Literal(s) if s.contains('"') => write!(f, "'{s}'"),
            Expr::Literal(s) => write!(f, "\"{s}\""),
            Expr::Number(n) => f.write_str(&number_to_string(*n)),
            Expr::VariableRef(name) => write!(f, "${name}"),
            Expr::FunctionCall { name, args } => write!(f, "{name}({args})"),
        }
    }
}

impl fmt::Display for LocationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            f.write_str("/")?;
        }
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            step.fmt(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}{}", self.axis, self.test, self.predicates)
    }
}

impl fmt::Display for NodeTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Some(kind) => write!(f, "{kind}({})", self.args),
            None => f.write_str(&self.name),
        }
    }
}

impl fmt::Display for PredicateList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for Predicate(expr) in &self.0 {
            write!(f, "[{expr}]")?;
        }
        Ok(())
    }
}

impl fmt::Display for ArgumentList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            arg.fmt(f)?;
        }
        Ok(())
    }
}
