use super::numeric::xpath_round;
use super::{FunctionLibrary, args, string_value};
use crate::context::EvaluationContext;
use crate::error::{DispatchError, Error};
use crate::model::XdmNode;
use crate::xdm::{Value, ValueType, number_to_string};
use itertools::Itertools;

use ValueType::{Any, Boolean, NodeSet as NS, Number, String as Str};

pub(super) fn register<N: XdmNode + 'static>(lib: &mut FunctionLibrary<N>) -> Result<(), Error> {
    lib.define("string", Str, &[], |ctx, _| Ok(Value::String(string_value(ctx.require_dot()?))))?
        .define("string", Str, &[NS], |_, a| {
            Ok(Value::String(args::node_set(a, 0)?.first().map(string_value).unwrap_or_default()))
        })?
        .define("string", Str, &[Str], |_, a| Ok(Value::String(args::string(a, 0).to_string())))?
        .define("string", Str, &[Number], |_, a| {
            Ok(Value::String(number_to_string(args::number(a, 0))))
        })?
        .define("string", Str, &[Boolean], |_, a| {
            Ok(Value::String(if args::boolean(a, 0) { "true" } else { "false" }.to_string()))
        })?
        .define_bare("concat", Str, |ctx, a| {
            if a.len() < 2 {
                return Err(DispatchError::NoMatchingOverload {
                    name: "concat".into(),
                    arg_types: a.iter().map(Value::value_type).collect(),
                }
                .into());
            }
            let mut out = String::new();
            for v in a {
                out.push_str(&args::coerce_string(ctx, v)?);
            }
            Ok(Value::String(out))
        })?
        .define("starts-with", Boolean, &[Any, Any], |ctx, a| {
            let (s, prefix) = two_strings(ctx, a)?;
            Ok(Value::Boolean(s.starts_with(&prefix)))
        })?
        .define("contains", Boolean, &[Any, Any], |ctx, a| {
            let (haystack, needle) = two_strings(ctx, a)?;
            Ok(Value::Boolean(haystack.contains(&needle)))
        })?
        .define("substring-before", Str, &[Any, Any], |ctx, a| {
            let (haystack, needle) = two_strings(ctx, a)?;
            let before = haystack.find(&needle).map(|i| &haystack[..i]).unwrap_or_default();
            Ok(Value::String(before.to_string()))
        })?
        .define("substring-after", Str, &[Any, Any], |ctx, a| {
            let (haystack, needle) = two_strings(ctx, a)?;
            let after =
                haystack.find(&needle).map(|i| &haystack[i + needle.len()..]).unwrap_or_default();
            Ok(Value::String(after.to_string()))
        })?
        .define("substring", Str, &[Any, Any], |ctx, a| {
            let s = args::coerce_string(ctx, args::arg(a, 0)?)?;
            let start = args::coerce_number(ctx, args::arg(a, 1)?)?;
            Ok(Value::String(substring_default(&s, start, None)))
        })?
        .define("substring", Str, &[Any, Any, Any], |ctx, a| {
            let s = args::coerce_string(ctx, args::arg(a, 0)?)?;
            let start = args::coerce_number(ctx, args::arg(a, 1)?)?;
            let len = args::coerce_number(ctx, args::arg(a, 2)?)?;
            Ok(Value::String(substring_default(&s, start, Some(len))))
        })?
        .define("string-length", Number, &[], |ctx, _| {
            Ok(Value::Number(string_value(ctx.require_dot()?).chars().count() as f64))
        })?
        .define("string-length", Number, &[Any], |ctx, a| {
            Ok(Value::Number(args::coerce_string(ctx, args::arg(a, 0)?)?.chars().count() as f64))
        })?
        .define("normalize-space", Str, &[], |ctx, _| {
            Ok(Value::String(normalize_space(&string_value(ctx.require_dot()?))))
        })?
        .define("normalize-space", Str, &[Any], |ctx, a| {
            Ok(Value::String(normalize_space(&args::coerce_string(ctx, args::arg(a, 0)?)?)))
        })?
        .define("translate", Str, &[Any, Any, Any], |ctx, a| {
            let source = args::coerce_string(ctx, args::arg(a, 0)?)?;
            let from = args::coerce_string(ctx, args::arg(a, 1)?)?;
            let to = args::coerce_string(ctx, args::arg(a, 2)?)?;
            Ok(Value::String(translate_default(&source, &from, &to)))
        })?;
    Ok(())
}

fn two_strings<N: XdmNode>(
    ctx: &mut EvaluationContext<'_, N>,
    a: &[Value<N>],
) -> Result<(String, String), Error> {
    Ok((args::coerce_string(ctx, args::arg(a, 0)?)?, args::coerce_string(ctx, args::arg(a, 1)?)?))
}

// Characters at 1-based positions p with round(start) <= p < round(start) + round(len).
// NaN bounds select nothing.
fn substring_default(s: &str, start: f64, len: Option<f64>) -> String {
    let first = xpath_round(start);
    let end = len.map_or(f64::INFINITY, |l| first + xpath_round(l));
    s.chars()
        .enumerate()
        .filter(|(i, _)| {
            let p = (*i + 1) as f64;
            p >= first && p < end
        })
        .map(|(_, c)| c)
        .collect()
}

fn normalize_space(s: &str) -> String {
    s.split(|c| matches!(c, ' ' | '\t' | '\r' | '\n')).filter(|w| !w.is_empty()).join(" ")
}

// The first occurrence of a character in `from` decides its mapping; characters
// past the end of `to` are removed.
fn translate_default(source: &str, from: &str, to: &str) -> String {
    let to: Vec<char> = to.chars().collect();
    source
        .chars()
        .filter_map(|c| match from.chars().position(|f| f == c) {
            Some(i) => to.get(i).copied(),
            None => Some(c),
        })
        .collect()
}
