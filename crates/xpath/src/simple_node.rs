//! In-memory tree implementing [`XdmNode`], for tests, docs and quick prototypes.
//!
//! Nodes are built bottom-up with small builder helpers; parents hold their
//! children strongly and children point back through weak references, so keep
//! the root alive while navigating.
//!
//! ```
//! use treepath_xpath::simple_node::{attr, doc, elem, text};
//! use treepath_xpath::XdmNode;
//!
//! // <root id="r"><child>Hello</child><child world="yes"/></root>
//! let document = doc()
//!     .child(
//!         elem("root")
//!             .attr(attr("id", "r"))
//!             .child(elem("child").child(text("Hello")))
//!             .child(elem("child").attr(attr("world", "yes"))),
//!     )
//!     .build();
//!
//! let root = document.children()[0].clone();
//! assert_eq!(root.name().unwrap().local, "root");
//! assert_eq!(root.children().len(), 2);
//! assert_eq!(root.parent(), Some(document));
//! ```
//!
//! Namespace declarations are kept apart from attributes:
//! ```
//! use treepath_xpath::simple_node::{elem, ns};
//! use treepath_xpath::XdmNode;
//!
//! let root = elem("p:root").namespace(ns("p", "urn:one")).child(elem("p:child")).build();
//! let child = root.children()[0].clone();
//! assert_eq!(child.lookup_namespace_uri("p").as_deref(), Some("urn:one"));
//! assert!(root.attributes().is_empty());
//! ```

use crate::model::{NodeKind, QName, XdmNode};
use core::fmt;
use std::sync::{Arc, OnceLock, Weak};

struct Inner {
    kind: NodeKind,
    name: Option<QName>,
    value: Option<String>,
    parent: OnceLock<Weak<Inner>>,
    attributes: Vec<SimpleNode>,
    namespaces: Vec<(String, String)>,
    children: Vec<SimpleNode>,
}

/// Arc-backed node; equality is identity.
#[derive(Clone)]
pub struct SimpleNode(Arc<Inner>);

impl PartialEq for SimpleNode {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for SimpleNode {}

impl std::hash::Hash for SimpleNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for SimpleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleNode")
            .field("kind", &self.0.kind)
            .field("name", &self.0.name.as_ref().map(ToString::to_string))
            .field("value", &self.0.value)
            .finish()
    }
}

impl SimpleNode {
    fn leaf(kind: NodeKind, name: Option<QName>, value: &str) -> Self {
        SimpleNodeBuilder::new(kind, name, Some(value.to_string())).build()
    }

    pub fn document() -> SimpleNodeBuilder {
        SimpleNodeBuilder::new(NodeKind::Document, None, None)
    }

    /// Element named `name`; a `prefix:local` name keeps its prefix.
    pub fn element(name: &str) -> SimpleNodeBuilder {
        SimpleNodeBuilder::new(NodeKind::Element, Some(QName::parse(name)), None)
    }

    pub fn attribute(name: &str, value: &str) -> Self {
        Self::leaf(NodeKind::Attribute, Some(QName::parse(name)), value)
    }

    pub fn text(value: &str) -> Self {
        Self::leaf(NodeKind::Text, None, value)
    }

    pub fn comment(value: &str) -> Self {
        Self::leaf(NodeKind::Comment, None, value)
    }

    pub fn processing_instruction(target: &str, data: &str) -> Self {
        Self::leaf(NodeKind::ProcessingInstruction, Some(QName::local(target)), data)
    }
}

pub struct SimpleNodeBuilder {
    kind: NodeKind,
    name: Option<QName>,
    value: Option<String>,
    attributes: Vec<SimpleNode>,
    namespaces: Vec<(String, String)>,
    children: Vec<SimpleNode>,
}

/// A prefix binding declared on an element.
pub struct Namespace {
    prefix: String,
    uri: String,
}

pub enum SimpleNodeOrBuilder {
    Built(SimpleNode),
    Builder(SimpleNodeBuilder),
}

impl From<SimpleNode> for SimpleNodeOrBuilder {
    fn from(n: SimpleNode) -> Self {
        SimpleNodeOrBuilder::Built(n)
    }
}

impl From<SimpleNodeBuilder> for SimpleNodeOrBuilder {
    fn from(b: SimpleNodeBuilder) -> Self {
        SimpleNodeOrBuilder::Builder(b)
    }
}

impl SimpleNodeBuilder {
    fn new(kind: NodeKind, name: Option<QName>, value: Option<String>) -> Self {
        Self {
            kind,
            name,
            value,
            attributes: Vec::new(),
            namespaces: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn child(mut self, child: impl Into<SimpleNodeOrBuilder>) -> Self {
        self.children.push(match child.into() {
            SimpleNodeOrBuilder::Built(n) => n,
            SimpleNodeOrBuilder::Builder(b) => b.build(),
        });
        self
    }

    pub fn children<I>(self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<SimpleNodeOrBuilder>,
    {
        children.into_iter().fold(self, SimpleNodeBuilder::child)
    }

    pub fn attr(mut self, attr: SimpleNode) -> Self {
        debug_assert_eq!(attr.kind(), NodeKind::Attribute);
        self.attributes.push(attr);
        self
    }

    pub fn namespace(mut self, ns: Namespace) -> Self {
        self.namespaces.push((ns.prefix, ns.uri));
        self
    }

    /// Links the collected attributes and children to the new node.
    pub fn build(self) -> SimpleNode {
        let node = SimpleNode(Arc::new(Inner {
            kind: self.kind,
            name: self.name,
            value: self.value,
            parent: OnceLock::new(),
            attributes: self.attributes,
            namespaces: self.namespaces,
            children: self.children,
        }));
        for member in node.0.attributes.iter().chain(&node.0.children) {
            // A node already linked elsewhere keeps its first parent.
            let _ = member.0.parent.set(Arc::downgrade(&node.0));
        }
        node
    }
}

pub fn doc() -> SimpleNodeBuilder {
    SimpleNode::document()
}

pub fn elem(name: &str) -> SimpleNodeBuilder {
    SimpleNode::element(name)
}

pub fn attr(name: &str, value: &str) -> SimpleNode {
    SimpleNode::attribute(name, value)
}

pub fn text(value: &str) -> SimpleNode {
    SimpleNode::text(value)
}

pub fn comment(value: &str) -> SimpleNode {
    SimpleNode::comment(value)
}

pub fn pi(target: &str, data: &str) -> SimpleNode {
    SimpleNode::processing_instruction(target, data)
}

pub fn ns(prefix: &str, uri: &str) -> Namespace {
    Namespace { prefix: prefix.to_string(), uri: uri.to_string() }
}

impl XdmNode for SimpleNode {
    fn kind(&self) -> NodeKind {
        self.0.kind
    }

    fn name(&self) -> Option<QName> {
        self.0.name.clone()
    }

    fn value(&self) -> Option<String> {
        self.0.value.clone()
    }

    fn parent(&self) -> Option<Self> {
        self.0.parent.get()?.upgrade().map(SimpleNode)
    }

    fn children(&self) -> Vec<Self> {
        self.0.children.clone()
    }

    fn attributes(&self) -> Vec<Self> {
        self.0.attributes.clone()
    }

    fn lookup_namespace_uri(&self, prefix: &str) -> Option<String> {
        let mut cur = Some(self.clone());
        while let Some(node) = cur {
            if let Some((_, uri)) = node.0.namespaces.iter().find(|(p, _)| p == prefix) {
                return Some(uri.clone());
            }
            cur = node.parent();
        }
        None
    }
}
