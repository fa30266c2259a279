use super::{FunctionLibrary, args};
use crate::axes::{Axis, AxisGuide};
use crate::context::EvaluationContext;
use crate::error::Error;
use crate::model::{NodeKind, QName, XdmNode};
use crate::xdm::{NodeSet, Value, ValueType};
use core::ops::ControlFlow;
use itertools::Itertools;

use ValueType::{Any, NodeSet as NS, Number, String as Str};

/// XPath string-value: the concatenated descendant text of elements and
/// documents, the content of every other kind of node.
pub fn string_value<N: XdmNode>(node: &N) -> String {
    match node.kind() {
        NodeKind::Element | NodeKind::Document => {
            let mut text = String::new();
            let _ = Axis::Descendant.guide(node, &mut |n: N| {
                if n.kind() == NodeKind::Text {
                    text.push_str(&n.value().unwrap_or_default());
                }
                ControlFlow::Continue(())
            });
            text
        }
        _ => node.value().unwrap_or_default(),
    }
}

pub(super) fn register<N: XdmNode + 'static>(lib: &mut FunctionLibrary<N>) -> Result<(), Error> {
    lib.define("last", Number, &[], |ctx, _| Ok(Value::Number(ctx.last() as f64)))?
        .define("position", Number, &[], |ctx, _| Ok(Value::Number(ctx.position() as f64)))?
        .define("count", Number, &[NS], |_, a| {
            Ok(Value::Number(args::node_set(a, 0)?.len() as f64))
        })?
        .define("id", NS, &[Str], |ctx, a| id_default(ctx, args::string(a, 0)))?
        .define("id", NS, &[NS], |ctx, a| {
            let joined = args::node_set(a, 0)?.iter().map(string_value).join(" ");
            ctx.library().call_exact(ctx, "id", &[Str], &[Value::String(joined)])
        })?
        .define("id", NS, &[Any], |ctx, a| {
            let s = ctx.call("string", a)?;
            ctx.library().unwrap("id", &[Str])?.invoke(ctx, &[s])
        })?
        .define("local-name", Str, &[], |ctx, _| {
            Ok(Value::String(name_of(ctx.dot()).map(|q| q.local).unwrap_or_default()))
        })?
        .define("local-name", Str, &[NS], |_, a| {
            let name = name_of(args::node_set(a, 0)?.first());
            Ok(Value::String(name.map(|q| q.local).unwrap_or_default()))
        })?
        .define("namespace-uri", Str, &[], |ctx, _| {
            Ok(Value::String(namespace_uri_default(ctx.dot())))
        })?
        .define("namespace-uri", Str, &[NS], |_, a| {
            Ok(Value::String(namespace_uri_default(args::node_set(a, 0)?.first())))
        })?
        .define("name", Str, &[], |ctx, _| {
            Ok(Value::String(name_of(ctx.dot()).map(|q| q.to_string()).unwrap_or_default()))
        })?
        .define("name", Str, &[NS], |_, a| {
            let name = name_of(args::node_set(a, 0)?.first());
            Ok(Value::String(name.map(|q| q.to_string()).unwrap_or_default()))
        })?;
    Ok(())
}

// Elements whose `id` attribute matches one of the whitespace-separated tokens.
fn id_default<N: XdmNode>(ctx: &EvaluationContext<'_, N>, ids: &str) -> Result<Value<N>, Error> {
    let Some(dot) = ctx.dot() else {
        return Ok(Value::NodeSet(NodeSet::new()));
    };
    let found: Vec<N> =
        ids.split_ascii_whitespace().filter_map(|id| dot.element_by_id(id)).collect();
    Ok(Value::NodeSet(NodeSet::from_nodes(found)?))
}

fn name_of<N: XdmNode>(node: Option<&N>) -> Option<QName> {
    let node = node?;
    match node.kind() {
        NodeKind::Element
        | NodeKind::Attribute
        | NodeKind::ProcessingInstruction
        | NodeKind::Namespace => node.name(),
        _ => None,
    }
}

fn namespace_uri_default<N: XdmNode>(node: Option<&N>) -> String {
    let Some(node) = node else { return String::new() };
    let Some(name) = name_of(Some(node)) else { return String::new() };
    if let Some(uri) = name.ns_uri {
        return uri;
    }
    match name.prefix.as_deref() {
        Some(prefix) => node.lookup_namespace_uri(prefix).unwrap_or_default(),
        None => String::new(),
    }
}
