use super::{FunctionLibrary, args};
use crate::axes::{Axis, AxisGuide};
use crate::error::Error;
use crate::model::XdmNode;
use crate::xdm::{Value, ValueType};
use core::ops::ControlFlow;

use ValueType::{Any, Boolean, NodeSet as NS, Number, String as Str};

pub(super) fn register<N: XdmNode + 'static>(lib: &mut FunctionLibrary<N>) -> Result<(), Error> {
    lib.define("true", Boolean, &[], |_, _| Ok(Value::Boolean(true)))?
        .define("false", Boolean, &[], |_, _| Ok(Value::Boolean(false)))?
        .define("boolean", Boolean, &[NS], |_, a| {
            Ok(Value::Boolean(!args::node_set(a, 0)?.is_empty()))
        })?
        .define("boolean", Boolean, &[Str], |_, a| {
            Ok(Value::Boolean(!args::string(a, 0).is_empty()))
        })?
        .define("boolean", Boolean, &[Number], |_, a| {
            let n = args::number(a, 0);
            Ok(Value::Boolean(n != 0.0 && !n.is_nan()))
        })?
        .define("boolean", Boolean, &[Boolean], |_, a| Ok(Value::Boolean(args::boolean(a, 0))))?
        .define("not", Boolean, &[Any], |ctx, a| {
            Ok(Value::Boolean(!args::coerce_boolean(ctx, args::arg(a, 0)?)?))
        })?
        .define("lang", Boolean, &[Any], |ctx, a| {
            let wanted = args::coerce_string(ctx, args::arg(a, 0)?)?;
            Ok(Value::Boolean(ctx.dot().is_some_and(|dot| lang_default(dot, &wanted))))
        })?;
    Ok(())
}

// The nearest xml:lang on ancestor-or-self decides; matching ignores case and
// accepts a subtag suffix.
fn lang_default<N: XdmNode>(node: &N, wanted: &str) -> bool {
    let mut declared = None;
    let _ = Axis::AncestorOrSelf.guide(node, &mut |n: N| {
        let found = n.attributes().into_iter().find(|attr| {
            attr.name().is_some_and(|q| q.prefix.as_deref() == Some("xml") && q.local == "lang")
        });
        match found {
            Some(attr) => {
                declared = attr.value();
                ControlFlow::Break(())
            }
            None => ControlFlow::Continue(()),
        }
    });
    let Some(lang) = declared else { return false };
    let (lang, wanted) = (lang.to_ascii_lowercase(), wanted.to_ascii_lowercase());
    lang == wanted || lang.strip_prefix(&wanted).is_some_and(|rest| rest.starts_with('-'))
}
