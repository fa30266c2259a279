//! The XPath 1.0 grammar in LL(1) form, with the actions that build the AST.
//!
//! Left-recursive operator rules are written as `X -> Y XTail` with
//! `XTail -> op Y XTail | ε`. Each tail collects its operands on a stack with
//! the rightmost operand at the bottom; the head pops them off again so that
//! operators associate to the left.

use super::ast::{
    ArgumentList, ArithmeticOp, CompareOp, Expr, LocationPath, NodeTest, Predicate, PredicateList,
    Step, XPathExpr,
};
use super::lexer::TokenValue;
use super::symbols::{QuerySymbols, Sym};
use treepath_grammar::{ActionError, Grammar, GrammarError, Symbol};

/// Semantic values flowing through the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Sem {
    Token(TokenValue),
    Root(XPathExpr),
    Expr(Expr),
    Path(LocationPath),
    PathTail(Option<LocationPath>),
    Step(Step),
    Axis(String),
    Test(NodeTest),
    Predicate(Predicate),
    Predicates(PredicateList),
    Args(ArgumentList),
    Tail(Vec<(Op, Expr)>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Or,
    And,
    Union,
    Compare(CompareOp),
    Arithmetic(ArithmeticOp),
}

impl Op {
    fn combine(self, left: Expr, right: Expr) -> Expr {
        let (left, right) = (Box::new(left), Box::new(right));
        match self {
            Op::Or => Expr::Or(left, right),
            Op::And => Expr::And(left, right),
            Op::Union => Expr::Union(left, right),
            Op::Compare(op) => Expr::Compare { op, left, right },
            Op::Arithmetic(op) => Expr::Arithmetic { op, left, right },
        }
    }
}

fn mismatch(expected: &str, found: &Sem) -> ActionError {
    ActionError::new(format!("expected {expected}, found {found:?}"))
}

impl Sem {
    fn expr(self) -> Result<Expr, ActionError> {
        match self {
            Sem::Expr(e) => Ok(e),
            other => Err(mismatch("expression", &other)),
        }
    }

    fn path(self) -> Result<LocationPath, ActionError> {
        match self {
            Sem::Path(p) => Ok(p),
            other => Err(mismatch("location path", &other)),
        }
    }

    fn path_tail(self) -> Result<Option<LocationPath>, ActionError> {
        match self {
            Sem::PathTail(p) => Ok(p),
            other => Err(mismatch("path tail", &other)),
        }
    }

    fn step(self) -> Result<Step, ActionError> {
        match self {
            Sem::Step(s) => Ok(s),
            other => Err(mismatch("step", &other)),
        }
    }

    fn axis(self) -> Result<String, ActionError> {
        match self {
            Sem::Axis(a) => Ok(a),
            other => Err(mismatch("axis", &other)),
        }
    }

    fn test(self) -> Result<NodeTest, ActionError> {
        match self {
            Sem::Test(t) => Ok(t),
            other => Err(mismatch("node test", &other)),
        }
    }

    fn predicate(self) -> Result<Predicate, ActionError> {
        match self {
            Sem::Predicate(p) => Ok(p),
            other => Err(mismatch("predicate", &other)),
        }
    }

    fn predicates(self) -> Result<PredicateList, ActionError> {
        match self {
            Sem::Predicates(p) => Ok(p),
            other => Err(mismatch("predicate list", &other)),
        }
    }

    fn args(self) -> Result<ArgumentList, ActionError> {
        match self {
            Sem::Args(a) => Ok(a),
            other => Err(mismatch("argument list", &other)),
        }
    }

    fn tail(self) -> Result<Vec<(Op, Expr)>, ActionError> {
        match self {
            Sem::Tail(t) => Ok(t),
            other => Err(mismatch("operator tail", &other)),
        }
    }

    fn text(self) -> Result<String, ActionError> {
        match self {
            Sem::Token(TokenValue::Text(s)) => Ok(s),
            other => Err(mismatch("name or literal", &other)),
        }
    }

    fn number(self) -> Result<f64, ActionError> {
        match self {
            Sem::Token(TokenValue::Number(n)) => Ok(n),
            other => Err(mismatch("number", &other)),
        }
    }
}

fn take<const K: usize>(vals: Vec<Sem>) -> Result<[Sem; K], ActionError> {
    <[Sem; K]>::try_from(vals)
        .map_err(|v| ActionError::new(format!("expected {K} values, got {}", v.len())))
}

fn s(sym: Sym) -> Symbol {
    sym.symbol()
}

/// `head tail`: folds the tail's operand stack onto `head`.
fn fold_tail(vals: Vec<Sem>) -> Result<Sem, ActionError> {
    let [head, tail] = take(vals)?;
    let mut root = head.expr()?;
    let mut tail = tail.tail()?;
    while let Some((op, rhs)) = tail.pop() {
        root = op.combine(root, rhs);
    }
    Ok(Sem::Expr(root))
}

/// `op operand tail`: pushes the operand under `op`.
fn push_tail(op: Op) -> impl Fn(Vec<Sem>) -> Result<Sem, ActionError> + Send + Sync + 'static {
    move |vals| {
        let [_, operand, tail] = take(vals)?;
        let mut tail = tail.tail()?;
        tail.push((op, operand.expr()?));
        Ok(Sem::Tail(tail))
    }
}

fn empty_tail(_: Vec<Sem>) -> Result<Sem, ActionError> {
    Ok(Sem::Tail(Vec::new()))
}

fn passthrough(vals: Vec<Sem>) -> Result<Sem, ActionError> {
    let [v] = take(vals)?;
    Ok(v)
}

fn prepend_step(path: &mut LocationPath, step: Step) {
    path.steps.insert(0, step);
}

/// Builds the query grammar over [`QuerySymbols`].
pub fn query_grammar() -> Result<Grammar<Sem>, GrammarError> {
    let mut g = Grammar::new(QuerySymbols, s(Sym::Eos))?;

    g.start(s(Sym::S))?.produces(&[s(Sym::Expr)], |vals| {
        let [e] = take(vals)?;
        Ok(Sem::Root(XPathExpr { expr: e.expr()? }))
    })?;

    location_paths(&mut g)?;
    expressions(&mut g)?;
    operators(&mut g)?;
    Ok(g)
}

fn location_paths(g: &mut Grammar<Sem>) -> Result<(), GrammarError> {
    g.symbol(s(Sym::LocationPath))
        .produces(&[s(Sym::RelativeLocationPath)], passthrough)?
        .produces(&[s(Sym::AbsoluteLocationPath)], passthrough)?;

    g.symbol(s(Sym::AbsoluteLocationPath))
        .produces(&[s(Sym::Slash), s(Sym::AbsoluteLocationPathTail)], |vals| {
            let [_, path] = take(vals)?;
            let mut path = path.path()?;
            path.absolute = true;
            Ok(Sem::Path(path))
        })?
        .produces(&[s(Sym::DoubleSlash), s(Sym::RelativeLocationPath)], |vals| {
            let [_, path] = take(vals)?;
            let mut path = path.path()?;
            prepend_step(&mut path, Step::any_node("descendant-or-self"));
            path.absolute = true;
            Ok(Sem::Path(path))
        })?;

    g.symbol(s(Sym::AbsoluteLocationPathTail))
        .produces(&[s(Sym::RelativeLocationPath)], passthrough)?
        .produces(&[], |_| Ok(Sem::Path(LocationPath::default())))?;

    g.symbol(s(Sym::RelativeLocationPath)).produces(
        &[s(Sym::Step), s(Sym::RelativeLocationPathTail)],
        |vals| {
            let [step, path] = take(vals)?;
            let mut path = path.path()?;
            prepend_step(&mut path, step.step()?);
            Ok(Sem::Path(path))
        },
    )?;

    g.symbol(s(Sym::RelativeLocationPathTail))
        .produces(&[s(Sym::Slash), s(Sym::Step), s(Sym::RelativeLocationPathTail)], |vals| {
            let [_, step, path] = take(vals)?;
            let mut path = path.path()?;
            prepend_step(&mut path, step.step()?);
            Ok(Sem::Path(path))
        })?
        .produces(&[s(Sym::DoubleSlash), s(Sym::Step), s(Sym::RelativeLocationPathTail)], |vals| {
            let [_, step, path] = take(vals)?;
            let mut path = path.path()?;
            prepend_step(&mut path, step.step()?);
            prepend_step(&mut path, Step::any_node("descendant-or-self"));
            Ok(Sem::Path(path))
        })?
        .produces(&[], |_| Ok(Sem::Path(LocationPath::default())))?;

    g.symbol(s(Sym::Step))
        .produces(&[s(Sym::AxisSpecifier), s(Sym::NodeTest), s(Sym::PredicateList)], |vals| {
            let [axis, test, predicates] = take(vals)?;
            let (axis, test, predicates) = (axis.axis()?, test.test()?, predicates.predicates()?);
            Ok(Sem::Step(Step { axis, test, predicates }))
        })?
        .produces(&[s(Sym::Dot)], |_| Ok(Sem::Step(Step::any_node("self"))))?
        .produces(&[s(Sym::DotDot)], |_| Ok(Sem::Step(Step::any_node("parent"))))?;

    g.symbol(s(Sym::PredicateList))
        .produces(&[s(Sym::Predicate), s(Sym::PredicateList)], |vals| {
            let [first, rest] = take(vals)?;
            let mut list = rest.predicates()?;
            list.0.insert(0, first.predicate()?);
            Ok(Sem::Predicates(list))
        })?
        .produces(&[], |_| Ok(Sem::Predicates(PredicateList::default())))?;

    g.symbol(s(Sym::AxisSpecifier))
        .produces(&[s(Sym::AxisName)], |vals| {
            let [name] = take(vals)?;
            Ok(Sem::Axis(name.text()?))
        })?
        .produces(&[s(Sym::AtSign)], |_| Ok(Sem::Axis("attribute".into())))?
        .produces(&[], |_| Ok(Sem::Axis("child".into())))?;

    g.symbol(s(Sym::NodeTest))
        .produces(&[s(Sym::NameTest)], |vals| {
            let [name] = take(vals)?;
            Ok(Sem::Test(NodeTest::name(name.text()?)))
        })?
        .produces(
            &[s(Sym::NodeType), s(Sym::LeftParen), s(Sym::ArgumentList), s(Sym::RightParen)],
            |vals| {
                let [kind, _, args, _] = take(vals)?;
                Ok(Sem::Test(NodeTest::kind(kind.text()?, args.args()?)))
            },
        )?;

    g.symbol(s(Sym::Predicate)).produces(
        &[s(Sym::LeftBracket), s(Sym::Expr), s(Sym::RightBracket)],
        |vals| {
            let [_, e, _] = take(vals)?;
            Ok(Sem::Predicate(Predicate(Box::new(e.expr()?))))
        },
    )?;
    Ok(())
}

fn expressions(g: &mut Grammar<Sem>) -> Result<(), GrammarError> {
    g.symbol(s(Sym::Expr)).produces(&[s(Sym::OrExpr)], passthrough)?;

    g.symbol(s(Sym::PrimaryExpr))
        .produces(&[s(Sym::VariableRef)], |vals| {
            let [name] = take(vals)?;
            Ok(Sem::Expr(Expr::VariableRef(name.text()?)))
        })?
        .produces(&[s(Sym::LeftParen), s(Sym::Expr), s(Sym::RightParen)], |vals| {
            let [_, e, _] = take(vals)?;
            Ok(e)
        })?
        .produces(&[s(Sym::Literal)], |vals| {
            let [lit] = take(vals)?;
            Ok(Sem::Expr(Expr::Literal(lit.text()?)))
        })?
        .produces(&[s(Sym::Number)], |vals| {
            let [n] = take(vals)?;
            Ok(Sem::Expr(Expr::Number(n.number()?)))
        })?
        .produces(&[s(Sym::FunctionCall)], passthrough)?;

    g.symbol(s(Sym::FunctionCall)).produces(
        &[s(Sym::FuncName), s(Sym::LeftParen), s(Sym::ArgumentList), s(Sym::RightParen)],
        |vals| {
            let [name, _, args, _] = take(vals)?;
            Ok(Sem::Expr(Expr::FunctionCall { name: name.text()?, args: args.args()? }))
        },
    )?;

    g.symbol(s(Sym::ArgumentList))
        .produces(&[s(Sym::Expr), s(Sym::ArgumentListTail)], prepend_argument)?
        .produces(&[], |_| Ok(Sem::Args(ArgumentList::default())))?;

    g.symbol(s(Sym::ArgumentListTail))
        .produces(&[s(Sym::Comma), s(Sym::Expr), s(Sym::ArgumentListTail)], |mut vals| {
            vals.remove(0);
            prepend_argument(vals)
        })?
        .produces(&[], |_| Ok(Sem::Args(ArgumentList::default())))?;

    g.symbol(s(Sym::PathExpr))
        .produces(&[s(Sym::LocationPath)], |vals| {
            let [path] = take(vals)?;
            Ok(Sem::Expr(Expr::Path(path.path()?)))
        })?
        .produces(&[s(Sym::FilterExpr), s(Sym::PathExprTail)], |vals| {
            let [filter, tail] = take(vals)?;
            let filter = filter.expr()?;
            Ok(Sem::Expr(match tail.path_tail()? {
                Some(path) => Expr::PathExpr { filter: Some(Box::new(filter)), path },
                None => filter,
            }))
        })?;

    g.symbol(s(Sym::PathExprTail))
        .produces(&[s(Sym::Slash), s(Sym::RelativeLocationPath)], |vals| {
            let [_, path] = take(vals)?;
            Ok(Sem::PathTail(Some(path.path()?)))
        })?
        .produces(&[s(Sym::DoubleSlash), s(Sym::RelativeLocationPath)], |vals| {
            let [_, path] = take(vals)?;
            let mut path = path.path()?;
            prepend_step(&mut path, Step::any_node("descendant-or-self"));
            Ok(Sem::PathTail(Some(path)))
        })?
        .produces(&[], |_| Ok(Sem::PathTail(None)))?;

    g.symbol(s(Sym::FilterExpr)).produces(&[s(Sym::PrimaryExpr), s(Sym::FilterExprTail)], |vals| {
        let [primary, predicates] = take(vals)?;
        let (expr, predicates) = (primary.expr()?, predicates.predicates()?);
        Ok(Sem::Expr(if predicates.is_empty() {
            expr
        } else {
            Expr::Filter { expr: Box::new(expr), predicates }
        }))
    })?;

    g.symbol(s(Sym::FilterExprTail))
        .produces(&[s(Sym::Predicate), s(Sym::FilterExprTail)], |vals| {
            let [first, rest] = take(vals)?;
            let mut list = rest.predicates()?;
            list.0.insert(0, first.predicate()?);
            Ok(Sem::Predicates(list))
        })?
        .produces(&[], |_| Ok(Sem::Predicates(PredicateList::default())))?;
    Ok(())
}

fn prepend_argument(vals: Vec<Sem>) -> Result<Sem, ActionError> {
    let [first, rest] = take(vals)?;
    let mut args = rest.args()?;
    args.0.insert(0, first.expr()?);
    Ok(Sem::Args(args))
}

fn operators(g: &mut Grammar<Sem>) -> Result<(), GrammarError> {
    let levels: [(Sym, Sym, Sym, &[(Sym, Op)]); 7] = [
        (Sym::OrExpr, Sym::AndExpr, Sym::OrExprTail, &[(Sym::Or, Op::Or)]),
        (Sym::AndExpr, Sym::EqualityExpr, Sym::AndExprTail, &[(Sym::And, Op::And)]),
        (
            Sym::EqualityExpr,
            Sym::RelationalExpr,
            Sym::EqualityExprTail,
            &[(Sym::Eq, Op::Compare(CompareOp::Eq)), (Sym::Neq, Op::Compare(CompareOp::Ne))],
        ),
        (
            Sym::RelationalExpr,
            Sym::AdditiveExpr,
            Sym::RelationalExprTail,
            &[
                (Sym::Lt, Op::Compare(CompareOp::Lt)),
                (Sym::Gt, Op::Compare(CompareOp::Gt)),
                (Sym::Lte, Op::Compare(CompareOp::Le)),
                (Sym::Gte, Op::Compare(CompareOp::Ge)),
            ],
        ),
        (
            Sym::AdditiveExpr,
            Sym::MultiplicativeExpr,
            Sym::AdditiveExprTail,
            &[
                (Sym::Plus, Op::Arithmetic(ArithmeticOp::Add)),
                (Sym::Minus, Op::Arithmetic(ArithmeticOp::Sub)),
            ],
        ),
        (
            Sym::MultiplicativeExpr,
            Sym::UnaryExpr,
            Sym::MultiplicativeExprTail,
            &[
                (Sym::Mul, Op::Arithmetic(ArithmeticOp::Mul)),
                (Sym::Div, Op::Arithmetic(ArithmeticOp::Div)),
                (Sym::Mod, Op::Arithmetic(ArithmeticOp::Mod)),
            ],
        ),
        (Sym::UnionExpr, Sym::PathExpr, Sym::UnionExprTail, &[(Sym::Pipe, Op::Union)]),
    ];

    for (head, operand, tail, ops) in levels {
        g.symbol(s(head)).produces(&[s(operand), s(tail)], fold_tail)?;
        for &(token, op) in ops {
            g.add_rule(s(tail), &[s(token), s(operand), s(tail)], push_tail(op))?;
        }
        g.add_rule(s(tail), &[], empty_tail)?;
    }

    g.symbol(s(Sym::UnaryExpr))
        .produces(&[s(Sym::UnionExpr)], passthrough)?
        .produces(&[s(Sym::Minus), s(Sym::UnaryExpr)], |vals| {
            let [_, e] = take(vals)?;
            Ok(Sem::Expr(Expr::Negate(Box::new(e.expr()?))))
        })?;
    Ok(())
}
