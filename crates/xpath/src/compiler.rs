//! Compiled expressions and the engine that produces them.

use crate::context::EvaluationContext;
use crate::error::{Error, EvaluationError};
use crate::evaluator::Interpreter;
use crate::functions::{FunctionLibrary, args};
use crate::model::XdmNode;
use crate::parser::XPathParser;
use crate::parser::ast::XPathExpr;
use crate::runtime::DynamicContext;
use crate::xdm::{NodeSet, Value};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A parsed expression bound to the function library it is evaluated with.
///
/// Cloning is cheap; the syntax tree and the library are shared.
#[derive(Debug, Clone)]
pub struct CompiledXPath<N> {
    source: Arc<str>,
    ast: Arc<XPathExpr>,
    functions: Arc<FunctionLibrary<N>>,
}

impl<N: XdmNode + 'static> CompiledXPath<N> {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &XPathExpr {
        &self.ast
    }

    /// Evaluates against `input`. `None` means the expression produced no value.
    pub fn evaluate(&self, input: &DynamicContext<N>) -> Result<Option<Value<N>>, Error> {
        let mut ctx = EvaluationContext::new(input, &self.functions);
        let value = Interpreter::new(&mut ctx).interpret(&self.ast)?;
        tracing::debug!(
            expr = %self.source,
            result = value.as_ref().map_or("none", |v| v.value_type().as_str()),
            "expression evaluated"
        );
        Ok(value)
    }

    /// Evaluates and requires a node-set result.
    pub fn evaluate_nodes(&self, input: &DynamicContext<N>) -> Result<NodeSet<N>, Error> {
        self.evaluate_with(input, |_, value| value.into_node_set())
    }

    /// Evaluates and converts the result with `string()`.
    pub fn evaluate_string(&self, input: &DynamicContext<N>) -> Result<String, Error> {
        self.evaluate_with(input, |ctx, value| args::coerce_string(ctx, &value))
    }

    /// Evaluates and converts the result with `number()`.
    pub fn evaluate_number(&self, input: &DynamicContext<N>) -> Result<f64, Error> {
        self.evaluate_with(input, |ctx, value| args::coerce_number(ctx, &value))
    }

    /// Evaluates and converts the result with `boolean()`.
    pub fn evaluate_boolean(&self, input: &DynamicContext<N>) -> Result<bool, Error> {
        self.evaluate_with(input, |ctx, value| args::coerce_boolean(ctx, &value))
    }

    fn evaluate_with<R>(
        &self,
        input: &DynamicContext<N>,
        convert: impl FnOnce(&mut EvaluationContext<'_, N>, Value<N>) -> Result<R, Error>,
    ) -> Result<R, Error> {
        let mut ctx = EvaluationContext::new(input, &self.functions);
        let value =
            Interpreter::new(&mut ctx).interpret(&self.ast)?.ok_or(EvaluationError::NoValue)?;
        convert(&mut ctx, value)
    }
}

/// Compiles expressions with its own grammar and function library, keeping
/// recently compiled ones in an LRU cache keyed by source text.
pub struct XPathEngine<N> {
    parser: XPathParser,
    functions: Arc<FunctionLibrary<N>>,
    cache: Option<Mutex<LruCache<String, CompiledXPath<N>>>>,
}

impl<N> core::fmt::Debug for XPathEngine<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("XPathEngine")
            .field("parser", &self.parser)
            .field("functions", &self.functions)
            .field("caching", &self.cache.is_some())
            .finish()
    }
}

impl<N: XdmNode + 'static> XPathEngine<N> {
    /// An engine with the core library and the default cache.
    pub fn new() -> Result<Self, Error> {
        Self::builder().build()
    }

    pub fn builder() -> XPathEngineBuilder<N> {
        XPathEngineBuilder::default()
    }

    pub fn functions(&self) -> &Arc<FunctionLibrary<N>> {
        &self.functions
    }

    pub fn parser(&self) -> &XPathParser {
        &self.parser
    }

    /// Number of cached compiled expressions.
    pub fn cached(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| lock(cache).len())
    }

    pub fn compile(&self, expr: &str) -> Result<CompiledXPath<N>, Error> {
        if let Some(cache) = &self.cache
            && let Some(hit) = lock(cache).get(expr)
        {
            tracing::trace!(%expr, "compile cache hit");
            return Ok(hit.clone());
        }
        let ast = self.parser.parse(expr)?;
        tracing::debug!(%expr, %ast, "expression compiled");
        let compiled = CompiledXPath {
            source: Arc::from(expr),
            ast: Arc::new(ast),
            functions: Arc::clone(&self.functions),
        };
        if let Some(cache) = &self.cache {
            lock(cache).put(expr.to_string(), compiled.clone());
        }
        Ok(compiled)
    }

    pub fn evaluate(
        &self,
        expr: &str,
        input: &DynamicContext<N>,
    ) -> Result<Option<Value<N>>, Error> {
        self.compile(expr)?.evaluate(input)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct XPathEngineBuilder<N> {
    cache_capacity: usize,
    functions: Option<FunctionLibrary<N>>,
}

fn default_cache_capacity() -> usize {
    64
}

impl<N> Default for XPathEngineBuilder<N> {
    fn default() -> Self {
        Self { cache_capacity: default_cache_capacity(), functions: None }
    }
}

impl<N: XdmNode + 'static> XPathEngineBuilder<N> {
    /// Maximum number of cached compiled expressions; 0 disables caching.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Replaces the core library. The library must provide every function
    /// the interpreter forwards operators to for expressions that use them.
    pub fn with_functions(mut self, functions: FunctionLibrary<N>) -> Self {
        self.functions = Some(functions);
        self
    }

    pub fn build(self) -> Result<XPathEngine<N>, Error> {
        let functions = match self.functions {
            Some(functions) => functions,
            None => FunctionLibrary::core()?,
        };
        Ok(XPathEngine {
            parser: XPathParser::new()?,
            functions: Arc::new(functions),
            cache: NonZeroUsize::new(self.cache_capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        })
    }
}

/// Compiles `expr` with a fresh engine and the core library.
pub fn compile<N: XdmNode + 'static>(expr: &str) -> Result<CompiledXPath<N>, Error> {
    XPathEngine::builder().with_cache_capacity(0).build()?.compile(expr)
}

/// Compiles and evaluates `expr` with a fresh engine and the core library.
pub fn evaluate<N: XdmNode + 'static>(
    expr: &str,
    input: &DynamicContext<N>,
) -> Result<Option<Value<N>>, Error> {
    compile(expr)?.evaluate(input)
}
