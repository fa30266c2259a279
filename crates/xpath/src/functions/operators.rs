//! Functions the interpreter forwards operators to. They are ordinary library
//! entries, so callers can override or extend them per value type.

use super::{FunctionLibrary, args, string_value};
use crate::context::EvaluationContext;
use crate::error::Error;
use crate::model::XdmNode;
use crate::xdm::{NodeSet, Value, ValueType, string_to_number};

use ValueType::{Any, Boolean, NodeSet as NS, Number, String as Str};

const RELATIONAL: [&str; 4] =
    ["less-than", "greater-than", "less-than-or-equal", "greater-than-or-equal"];

pub(super) fn register<N: XdmNode + 'static>(lib: &mut FunctionLibrary<N>) -> Result<(), Error> {
    lib.define("union", NS, &[NS, NS], |_, a| {
        Ok(Value::NodeSet(args::node_set(a, 0)?.union(args::node_set(a, 1)?)?))
    })?;

    lib.define("equals", Boolean, &[Boolean, Boolean], |_, a| {
        Ok(Value::Boolean(args::boolean(a, 0) == args::boolean(a, 1)))
    })?
    .define("equals", Boolean, &[Number, Number], |_, a| {
        Ok(Value::Boolean(args::number(a, 0) == args::number(a, 1)))
    })?
    .define("equals", Boolean, &[Str, Str], |_, a| {
        Ok(Value::Boolean(args::string(a, 0) == args::string(a, 1)))
    })?
    .define("equals", Boolean, &[NS, NS], |_, a| {
        let haystack = sorted_string_values(args::node_set(a, 0)?);
        let found = args::node_set(a, 1)?.any(|n| haystack.binary_search(&string_value(n)).is_ok());
        Ok(Value::Boolean(found))
    })?
    .define("equals", Boolean, &[NS, Any], |ctx, a| {
        let nodes = args::node_set(a, 0)?;
        node_set_vs_scalar(ctx, "equals", nodes, args::arg(a, 1)?, false).map(Value::Boolean)
    })?
    .define("equals", Boolean, &[Any, NS], |ctx, a| {
        let nodes = args::node_set(a, 1)?;
        node_set_vs_scalar(ctx, "equals", nodes, args::arg(a, 0)?, true).map(Value::Boolean)
    })?
    .define("equals", Boolean, &[Any, Any], |ctx, a| {
        let (left, right) = (args::arg(a, 0)?, args::arg(a, 1)?);
        let target = match (left.value_type(), right.value_type()) {
            (Boolean, _) | (_, Boolean) => Boolean,
            (Number, _) | (_, Number) => Number,
            _ => Str,
        };
        let left = convert_to(ctx, target, left)?;
        let right = convert_to(ctx, target, right)?;
        ctx.call("equals", &[left, right])
    })?;

    for op in RELATIONAL {
        lib.define(op, Boolean, &[Any, Any], move |ctx, a| {
            let left = args::coerce_number(ctx, args::arg(a, 0)?)?;
            let right = args::coerce_number(ctx, args::arg(a, 1)?)?;
            Ok(Value::Boolean(compare_numbers(op, left, right)))
        })?
        .define(op, Boolean, &[NS, NS], move |_, a| {
            let left = numeric_values(args::node_set(a, 0)?);
            let right = numeric_values(args::node_set(a, 1)?);
            let holds = left.iter().any(|&l| right.iter().any(|&r| compare_numbers(op, l, r)));
            Ok(Value::Boolean(holds))
        })?
        .define(op, Boolean, &[NS, Any], move |ctx, a| {
            let nodes = args::node_set(a, 0)?;
            node_set_vs_scalar(ctx, op, nodes, args::arg(a, 1)?, false).map(Value::Boolean)
        })?
        .define(op, Boolean, &[Any, NS], move |ctx, a| {
            let nodes = args::node_set(a, 1)?;
            node_set_vs_scalar(ctx, op, nodes, args::arg(a, 0)?, true).map(Value::Boolean)
        })?;
    }

    let arithmetic: [(&'static str, fn(f64, f64) -> f64); 5] = [
        ("add", |a, b| a + b),
        ("subtract", |a, b| a - b),
        ("multiply", |a, b| a * b),
        ("divide", |a, b| a / b),
        ("modulus", |a, b| a % b),
    ];
    for (op, apply) in arithmetic {
        lib.define(op, Number, &[Number, Number], move |_, a| {
            Ok(Value::Number(apply(args::number(a, 0), args::number(a, 1))))
        })?
        .define(op, Number, &[Any, Any], move |ctx, a| {
            let left = args::coerce_number(ctx, args::arg(a, 0)?)?;
            let right = args::coerce_number(ctx, args::arg(a, 1)?)?;
            Ok(Value::Number(apply(left, right)))
        })?;
    }

    lib.define("negate", Number, &[Number], |_, a| Ok(Value::Number(-args::number(a, 0))))?
        .define("negate", Number, &[Any], |ctx, a| {
            Ok(Value::Number(-args::coerce_number(ctx, args::arg(a, 0)?)?))
        })?;
    Ok(())
}

fn compare_numbers(op: &str, l: f64, r: f64) -> bool {
    match op {
        "less-than" => l < r,
        "greater-than" => l > r,
        "less-than-or-equal" => l <= r,
        _ => l >= r,
    }
}

fn sorted_string_values<N: XdmNode>(nodes: &NodeSet<N>) -> Vec<String> {
    let mut values: Vec<String> = nodes.iter().map(string_value).collect();
    values.sort_unstable();
    values
}

fn numeric_values<N: XdmNode>(nodes: &NodeSet<N>) -> Vec<f64> {
    nodes.iter().map(|n| string_to_number(&string_value(n))).collect()
}

// Applies `op` between each node, converted to the scalar's type, and the
// scalar; true as soon as one comparison holds. A boolean scalar is compared
// against the node-set's own boolean value instead.
fn node_set_vs_scalar<N: XdmNode>(
    ctx: &mut EvaluationContext<'_, N>,
    op: &str,
    nodes: &NodeSet<N>,
    scalar: &Value<N>,
    reversed: bool,
) -> Result<bool, Error> {
    let pair = |node_side: Value<N>| {
        if reversed { [scalar.clone(), node_side] } else { [node_side, scalar.clone()] }
    };
    if scalar.value_type() == Boolean {
        let out = ctx.call(op, &pair(Value::Boolean(!nodes.is_empty())))?;
        return args::coerce_boolean(ctx, &out);
    }
    for node in nodes {
        let single = Value::NodeSet(NodeSet::singleton(node.clone()));
        let converted = convert_to(ctx, scalar.value_type(), &single)?;
        let out = ctx.call(op, &pair(converted))?;
        if args::coerce_boolean(ctx, &out)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Converts `value` with the library's conversion function for `target`.
/// Node-sets and `Any` compare by string value.
fn convert_to<N: XdmNode>(
    ctx: &mut EvaluationContext<'_, N>,
    target: ValueType,
    value: &Value<N>,
) -> Result<Value<N>, Error> {
    Ok(match target {
        Boolean => Value::Boolean(args::coerce_boolean(ctx, value)?),
        Number => Value::Number(args::coerce_number(ctx, value)?),
        Str | NS | Any => Value::String(args::coerce_string(ctx, value)?),
    })
}
