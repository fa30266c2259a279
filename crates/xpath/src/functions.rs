//! Function registry with runtime-type dispatch, and the core library.
//!
//! Overloads are keyed by `(name, parameter types)`. A call with `n`
//! arguments tries `2^n` candidate signatures: for `i` in `0..2^n`, position
//! `j` uses [`ValueType::Any`] when bit `j` of `i` is set and the argument's
//! runtime type otherwise. The first registered candidate wins, so the exact
//! signature is always preferred over wildcard ones.

use crate::context::EvaluationContext;
use crate::error::{DefinitionError, DispatchError, Error};
use crate::model::XdmNode;
use crate::xdm::{Value, ValueType};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

mod booleans;
mod nodes;
mod numeric;
mod operators;
mod strings;

pub use nodes::string_value;

pub type Signature = SmallVec<[ValueType; 4]>;

pub type FunctionImpl<N> = Arc<
    dyn Fn(&mut EvaluationContext<'_, N>, &[Value<N>]) -> Result<Value<N>, Error> + Send + Sync,
>;

pub struct FunctionSignature<N> {
    name: String,
    params: Signature,
    return_type: ValueType,
    bare: bool,
    implementation: FunctionImpl<N>,
}

impl<N> FunctionSignature<N> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ValueType] {
        &self.params
    }

    pub fn return_type(&self) -> ValueType {
        self.return_type
    }

    pub fn implementation(&self) -> &FunctionImpl<N> {
        &self.implementation
    }

    /// True for functions registered with `define_bare`.
    pub fn is_bare(&self) -> bool {
        self.bare
    }

    /// Whether `args` fit the parameter list: same arity, and each argument
    /// has the declared type unless the parameter is `Any`.
    pub fn accepts(&self, args: &[Value<N>]) -> bool {
        if self.bare {
            return true;
        }
        let fits = |(&param, arg): (&ValueType, &Value<N>)| {
            param == ValueType::Any || param == arg.value_type()
        };
        args.len() == self.params.len() && self.params.iter().zip(args).all(fits)
    }

    /// Runs the implementation. Arguments that do not fit the parameter list
    /// are rejected with [`DispatchError::NoMatchingOverload`].
    pub fn invoke(
        &self,
        ctx: &mut EvaluationContext<'_, N>,
        args: &[Value<N>],
    ) -> Result<Value<N>, Error> {
        if !self.accepts(args) {
            let arg_types: Vec<ValueType> = args.iter().map(Value::value_type).collect();
            return Err(no_matching_overload(&self.name, &arg_types));
        }
        let out = (self.implementation)(ctx, args)?;
        debug_assert!(
            self.return_type == ValueType::Any || out.value_type() == self.return_type,
            "{} returned {} instead of {}",
            self.name,
            out.value_type(),
            self.return_type
        );
        Ok(out)
    }
}

enum Entry<N> {
    Overloads {
        by_signature: HashMap<Signature, FunctionSignature<N>>,
        arities: SmallVec<[usize; 4]>,
    },
    Bare(FunctionSignature<N>),
}

pub struct FunctionLibrary<N> {
    entries: HashMap<String, Entry<N>>,
}

impl<N> Default for FunctionLibrary<N> {
    fn default() -> Self {
        Self { entries: HashMap::new() }
    }
}

impl<N> core::fmt::Debug for FunctionLibrary<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("FunctionLibrary").field("functions", &names).finish()
    }
}

impl<N: XdmNode + 'static> FunctionLibrary<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A library holding the XPath 1.0 core functions and the operator
    /// functions the interpreter forwards to.
    pub fn core() -> Result<Self, Error> {
        let mut lib = Self::new();
        nodes::register(&mut lib)?;
        strings::register(&mut lib)?;
        booleans::register(&mut lib)?;
        numeric::register(&mut lib)?;
        operators::register(&mut lib)?;
        tracing::debug!(functions = lib.entries.len(), "core function library registered");
        Ok(lib)
    }

    /// Registers one overload under its exact parameter signature.
    pub fn define<F>(
        &mut self,
        name: &str,
        return_type: ValueType,
        params: &[ValueType],
        f: F,
    ) -> Result<&mut Self, Error>
    where
        F: Fn(&mut EvaluationContext<'_, N>, &[Value<N>]) -> Result<Value<N>, Error>
            + Send
            + Sync
            + 'static,
    {
        let entry = self
            .entries
            .entry(name.to_string())
            .or_insert_with(|| Entry::Overloads {
                by_signature: HashMap::new(),
                arities: SmallVec::new(),
            });
        let Entry::Overloads { by_signature, arities } = entry else {
            return Err(DefinitionError::AlreadyDefined(name.to_string()).into());
        };
        let key: Signature = params.iter().copied().collect();
        if by_signature.contains_key(&key) {
            let signature = key.to_vec();
            let name = name.to_string();
            return Err(DefinitionError::DuplicateSignature { name, signature }.into());
        }
        if !arities.contains(&key.len()) {
            arities.push(key.len());
        }
        let implementation: FunctionImpl<N> = Arc::new(f);
        by_signature.insert(
            key.clone(),
            FunctionSignature {
                name: name.to_string(),
                params: key,
                return_type,
                bare: false,
                implementation,
            },
        );
        Ok(self)
    }

    /// Registers a function that takes any number of arguments of any type
    /// and bypasses dispatch. A name can be defined bare only once and never
    /// alongside typed overloads.
    pub fn define_bare<F>(
        &mut self,
        name: &str,
        return_type: ValueType,
        f: F,
    ) -> Result<&mut Self, Error>
    where
        F: Fn(&mut EvaluationContext<'_, N>, &[Value<N>]) -> Result<Value<N>, Error>
            + Send
            + Sync
            + 'static,
    {
        if self.entries.contains_key(name) {
            return Err(DefinitionError::AlreadyDefined(name.to_string()).into());
        }
        self.entries.insert(
            name.to_string(),
            Entry::Bare(FunctionSignature {
                name: name.to_string(),
                params: SmallVec::new(),
                return_type,
                bare: true,
                implementation: Arc::new(f),
            }),
        );
        Ok(self)
    }
}

impl<N> FunctionLibrary<N> {
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Finds the overload a call with `arg_types` dispatches to.
    pub fn resolve(
        &self,
        name: &str,
        arg_types: &[ValueType],
    ) -> Result<&FunctionSignature<N>, Error> {
        let (by_signature, arities) = match self.entries.get(name) {
            None => return Err(DispatchError::UnknownFunction(name.to_string()).into()),
            Some(Entry::Bare(sig)) => return Ok(sig),
            Some(Entry::Overloads { by_signature, arities }) => (by_signature, arities),
        };
        let n = arg_types.len();
        if !arities.contains(&n) {
            return Err(no_matching_overload(name, arg_types));
        }
        let mut candidate: Signature = arg_types.iter().copied().collect();
        for mask in 0..(1u64 << n) {
            for (j, slot) in candidate.iter_mut().enumerate() {
                *slot = if mask & (1 << j) == 0 { arg_types[j] } else { ValueType::Any };
            }
            if let Some(sig) = by_signature.get(&candidate) {
                tracing::trace!(function = name, mask, "dispatch resolved");
                return Ok(sig);
            }
        }
        Err(no_matching_overload(name, arg_types))
    }

    /// The overload registered under exactly `params`, bypassing dispatch.
    pub fn unwrap(&self, name: &str, params: &[ValueType]) -> Result<&FunctionSignature<N>, Error> {
        match self.entries.get(name) {
            None => Err(DispatchError::UnknownFunction(name.to_string()).into()),
            Some(Entry::Bare(sig)) => Ok(sig),
            Some(Entry::Overloads { by_signature, .. }) => {
                by_signature.get(params).ok_or_else(|| no_matching_overload(name, params))
            }
        }
    }
}

fn no_matching_overload(name: &str, arg_types: &[ValueType]) -> Error {
    let (name, arg_types) = (name.to_string(), arg_types.to_vec());
    DispatchError::NoMatchingOverload { name, arg_types }.into()
}

impl<N: XdmNode> FunctionLibrary<N> {
    /// Invokes the overload registered under exactly `params`.
    pub fn call_exact(
        &self,
        ctx: &mut EvaluationContext<'_, N>,
        name: &str,
        params: &[ValueType],
        args: &[Value<N>],
    ) -> Result<Value<N>, Error> {
        self.unwrap(name, params)?.invoke(ctx, args)
    }
}

/// Argument accessors for implementations whose signature already fixes
/// the argument types.
pub(crate) mod args {
    use crate::context::EvaluationContext;
    use crate::error::{Error, EvaluationError};
    use crate::model::XdmNode;
    use crate::xdm::{NodeSet, Value};
    use core::slice;

    pub fn arg<N>(args: &[Value<N>], i: usize) -> Result<&Value<N>, Error> {
        args.get(i).ok_or_else(|| EvaluationError::MissingArgument(i).into())
    }

    pub fn number<N>(args: &[Value<N>], i: usize) -> f64 {
        args.get(i).and_then(Value::as_number).unwrap_or(f64::NAN)
    }

    pub fn string<N>(args: &[Value<N>], i: usize) -> &str {
        args.get(i).and_then(Value::as_str).unwrap_or_default()
    }

    pub fn boolean<N>(args: &[Value<N>], i: usize) -> bool {
        args.get(i).and_then(Value::as_bool).unwrap_or_default()
    }

    pub fn node_set<N>(args: &[Value<N>], i: usize) -> Result<&NodeSet<N>, Error> {
        match args.get(i) {
            Some(Value::NodeSet(s)) => Ok(s),
            Some(other) => Err(Error::not_a_node_set(other.value_type())),
            None => Err(Error::not_a_node_set(crate::xdm::ValueType::Any)),
        }
    }

    /// Converts `v` with the library's `string` function.
    pub fn coerce_string<N: XdmNode>(
        ctx: &mut EvaluationContext<'_, N>,
        v: &Value<N>,
    ) -> Result<String, Error> {
        match v {
            Value::String(s) => Ok(s.clone()),
            other => Ok(string(&[ctx.call("string", slice::from_ref(other))?], 0).to_string()),
        }
    }

    pub fn coerce_number<N: XdmNode>(
        ctx: &mut EvaluationContext<'_, N>,
        v: &Value<N>,
    ) -> Result<f64, Error> {
        match v {
            Value::Number(n) => Ok(*n),
            other => Ok(number(&[ctx.call("number", slice::from_ref(other))?], 0)),
        }
    }

    pub fn coerce_boolean<N: XdmNode>(
        ctx: &mut EvaluationContext<'_, N>,
        v: &Value<N>,
    ) -> Result<bool, Error> {
        match v {
            Value::Boolean(b) => Ok(*b),
            other => Ok(boolean(&[ctx.call("boolean", slice::from_ref(other))?], 0)),
        }
    }
}
