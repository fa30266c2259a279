//! The document-model capability surface the engine navigates.
//!
//! Callers adapt their own tree (DOM, accessibility tree, config tree, …) by
//! implementing [`XdmNode`]. The engine never builds or mutates documents.

use crate::error::{Error, EvaluationError};
use core::cmp::Ordering;
use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
    Namespace,
}

/// Qualified name; `ns_uri` is the resolved namespace if the adapter knows it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub prefix: Option<String>,
    pub local: String,
    pub ns_uri: Option<String>,
}

impl QName {
    pub fn local(local: impl Into<String>) -> Self {
        Self { prefix: None, local: local.into(), ns_uri: None }
    }

    pub fn prefixed(
        prefix: impl Into<String>,
        local: impl Into<String>,
        ns_uri: Option<String>,
    ) -> Self {
        Self { prefix: Some(prefix.into()), local: local.into(), ns_uri }
    }

    /// Splits `prefix:local`; names without a colon have no prefix.
    pub fn parse(name: &str) -> Self {
        match name.split_once(':') {
            Some((prefix, local)) => Self::prefixed(prefix, local, None),
            None => Self::local(name),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(p) => write!(f, "{p}:{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// Fallback document order based on ancestry and sibling position.
///
/// An ancestor precedes its descendants; among nodes sharing a parent,
/// attributes precede children, each group in adapter order. Nodes with
/// different roots have no defined order and produce an error.
pub fn try_compare_by_ancestry<N: XdmNode>(a: &N, b: &N) -> Result<Ordering, Error> {
    if a == b {
        return Ok(Ordering::Equal);
    }
    let pa = path_from_root(a);
    let pb = path_from_root(b);
    let shared = pa.iter().zip(&pb).take_while(|(x, y)| x == y).count();
    if shared == pa.len().min(pb.len()) {
        return Ok(pa.len().cmp(&pb.len()));
    }
    if shared == 0 {
        let reason = "nodes belong to different documents".into();
        return Err(EvaluationError::DocumentOrder(reason).into());
    }
    let parent = &pa[shared - 1];
    let siblings: Vec<N> = parent.attributes().into_iter().chain(parent.children()).collect();
    let pos = |n: &N| siblings.iter().position(|s| s == n);
    match (pos(&pa[shared]), pos(&pb[shared])) {
        (Some(x), Some(y)) => Ok(x.cmp(&y)),
        _ => Err(EvaluationError::DocumentOrder("node not listed by its parent".into()).into()),
    }
}

fn path_from_root<N: XdmNode>(node: &N) -> Vec<N> {
    let mut path = vec![node.clone()];
    let mut cur = node.clone();
    while let Some(parent) = cur.parent() {
        path.push(parent.clone());
        cur = parent;
    }
    path.reverse();
    path
}

pub trait XdmNode: Clone + Eq + fmt::Debug {
    fn kind(&self) -> NodeKind;

    /// Element and attribute names, and the target of processing instructions.
    fn name(&self) -> Option<QName>;

    /// Content of text, attribute, comment and processing-instruction nodes.
    fn value(&self) -> Option<String>;

    /// Parent node; for attributes, the owning element.
    fn parent(&self) -> Option<Self>;

    fn children(&self) -> Vec<Self>;

    fn attributes(&self) -> Vec<Self>;

    fn compare_document_order(&self, other: &Self) -> Result<Ordering, Error> {
        try_compare_by_ancestry(self, other)
    }

    /// Resolves `prefix` using `xmlns:prefix` attributes on this node and its
    /// ancestors.
    fn lookup_namespace_uri(&self, prefix: &str) -> Option<String> {
        let mut cur = Some(self.clone());
        while let Some(node) = cur {
            let declared = node.attributes().into_iter().find_map(|attr| {
                let name = attr.name()?;
                let declares = name.prefix.as_deref() == Some("xmlns") && name.local == prefix;
                declares.then(|| attr.value()).flatten()
            });
            if declared.is_some() {
                return declared;
            }
            cur = node.parent();
        }
        None
    }

    /// Element of this node's document whose `id` attribute equals `id`.
    fn element_by_id(&self, id: &str) -> Option<Self> {
        let mut pending = vec![self.root()];
        while let Some(node) = pending.pop() {
            let has_id = |a: &Self| {
                a.name().is_some_and(|n| n.prefix.is_none() && n.local == "id")
                    && a.value().as_deref() == Some(id)
            };
            if node.kind() == NodeKind::Element && node.attributes().iter().any(has_id) {
                return Some(node);
            }
            pending.extend(node.children().into_iter().rev());
        }
        None
    }

    fn root(&self) -> Self {
        let mut cur = self.clone();
        while let Some(parent) = cur.parent() {
            cur = parent;
        }
        cur
    }
}
