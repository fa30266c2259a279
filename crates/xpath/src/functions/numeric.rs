use super::{FunctionLibrary, args, string_value};
use crate::context::EvaluationContext;
use crate::error::Error;
use crate::model::XdmNode;
use crate::xdm::{Value, ValueType, string_to_number};

use ValueType::{Any, Boolean, NodeSet as NS, Number, String as Str};

pub(super) fn register<N: XdmNode + 'static>(lib: &mut FunctionLibrary<N>) -> Result<(), Error> {
    lib.define("number", Number, &[Number], |_, a| Ok(Value::Number(args::number(a, 0))))?
        .define("number", Number, &[], |ctx, _| {
            Ok(Value::Number(string_to_number(&string_value(ctx.require_dot()?))))
        })?
        .define("number", Number, &[NS], |_, a| {
            let first = args::node_set(a, 0)?.first().map(string_value).unwrap_or_default();
            Ok(Value::Number(string_to_number(&first)))
        })?
        .define("number", Number, &[Str], |_, a| {
            Ok(Value::Number(string_to_number(args::string(a, 0))))
        })?
        .define("number", Number, &[Boolean], |_, a| {
            Ok(Value::Number(if args::boolean(a, 0) { 1.0 } else { 0.0 }))
        })?
        .define("sum", Number, &[NS], |_, a| {
            let nodes = args::node_set(a, 0)?;
            Ok(Value::Number(nodes.iter().map(|n| string_to_number(&string_value(n))).sum()))
        })?
        .define("floor", Number, &[Any], |ctx, a| unary(ctx, a, f64::floor))?
        .define("ceiling", Number, &[Any], |ctx, a| unary(ctx, a, f64::ceil))?
        .define("round", Number, &[Any], |ctx, a| unary(ctx, a, xpath_round))?;
    Ok(())
}

fn unary<N: XdmNode>(
    ctx: &mut EvaluationContext<'_, N>,
    a: &[Value<N>],
    f: fn(f64) -> f64,
) -> Result<Value<N>, Error> {
    Ok(Value::Number(f(args::coerce_number(ctx, args::arg(a, 0)?)?)))
}

/// Nearest integer, ties towards positive infinity. NaN and infinities are
/// returned unchanged and values in `[-0.5, 0)` round to negative zero.
pub(crate) fn xpath_round(x: f64) -> f64 {
    if !x.is_finite() {
        x
    } else if (-0.5..0.0).contains(&x) {
        -0.0
    } else {
        (x + 0.5).floor()
    }
}

#[cfg(test)]
mod tests {
    use super::xpath_round;

    #[test]
    fn rounding_follows_xpath() {
        assert_eq!(xpath_round(2.5), 3.0);
        assert_eq!(xpath_round(-2.5), -2.0);
        assert_eq!(xpath_round(2.4999), 2.0);
        assert!(xpath_round(-0.2).is_sign_negative());
        assert!(xpath_round(f64::NAN).is_nan());
        assert_eq!(xpath_round(f64::INFINITY), f64::INFINITY);
    }
}
