#![allow(dead_code)]

use std::cmp::Ordering;
use std::sync::Arc;
use treepath_xpath::{
    DynamicContext, DynamicContextBuilder, Error, EvaluationError, NodeKind, QName, XdmNode,
};

/// Arena document; node indices are assigned in document order, so build
/// each element's attributes before its children.
#[derive(Debug, Default)]
pub struct Dom {
    nodes: Vec<NodeRecord>,
}

#[derive(Debug)]
struct NodeRecord {
    kind: NodeKind,
    name: Option<QName>,
    value: Option<String>,
    parent: Option<usize>,
    children: Vec<usize>,
    attributes: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct Node {
    dom: Arc<Dom>,
    idx: usize,
}

impl PartialEq for Node {
    fn eq(&self, o: &Self) -> bool {
        Arc::ptr_eq(&self.dom, &o.dom) && self.idx == o.idx
    }
}

impl Eq for Node {}

impl Node {
    pub fn idx(&self) -> usize {
        self.idx
    }

    fn at(&self, idx: usize) -> Node {
        Node { dom: self.dom.clone(), idx }
    }
}

impl XdmNode for Node {
    fn kind(&self) -> NodeKind {
        self.dom.nodes[self.idx].kind
    }

    fn name(&self) -> Option<QName> {
        self.dom.nodes[self.idx].name.clone()
    }

    fn value(&self) -> Option<String> {
        self.dom.nodes[self.idx].value.clone()
    }

    fn parent(&self) -> Option<Self> {
        self.dom.nodes[self.idx].parent.map(|i| self.at(i))
    }

    fn children(&self) -> Vec<Self> {
        self.dom.nodes[self.idx].children.iter().map(|&i| self.at(i)).collect()
    }

    fn attributes(&self) -> Vec<Self> {
        self.dom.nodes[self.idx].attributes.iter().map(|&i| self.at(i)).collect()
    }

    fn compare_document_order(&self, other: &Self) -> Result<Ordering, Error> {
        if !Arc::ptr_eq(&self.dom, &other.dom) {
            let reason = "nodes belong to different documents".into();
            return Err(EvaluationError::DocumentOrder(reason).into());
        }
        Ok(self.idx.cmp(&other.idx))
    }
}

pub struct DomBuilder {
    dom: Dom,
}

impl DomBuilder {
    /// Starts a document; the document node has index 0.
    pub fn new() -> Self {
        let mut builder = DomBuilder { dom: Dom::default() };
        builder.push(NodeKind::Document, None, None, None);
        builder
    }

    fn push(
        &mut self,
        kind: NodeKind,
        name: Option<QName>,
        value: Option<&str>,
        parent: Option<usize>,
    ) -> usize {
        let i = self.dom.nodes.len();
        self.dom.nodes.push(NodeRecord {
            kind,
            name,
            value: value.map(str::to_string),
            parent,
            children: Vec::new(),
            attributes: Vec::new(),
        });
        if let Some(p) = parent {
            if kind == NodeKind::Attribute {
                self.dom.nodes[p].attributes.push(i);
            } else {
                self.dom.nodes[p].children.push(i);
            }
        }
        i
    }

    pub fn element(&mut self, parent: usize, name: &str) -> usize {
        self.push(NodeKind::Element, Some(QName::parse(name)), None, Some(parent))
    }

    pub fn attribute(&mut self, parent: usize, name: &str, value: &str) -> usize {
        self.push(NodeKind::Attribute, Some(QName::parse(name)), Some(value), Some(parent))
    }

    pub fn text(&mut self, parent: usize, value: &str) -> usize {
        self.push(NodeKind::Text, None, Some(value), Some(parent))
    }

    pub fn comment(&mut self, parent: usize, value: &str) -> usize {
        self.push(NodeKind::Comment, None, Some(value), Some(parent))
    }

    pub fn pi(&mut self, parent: usize, target: &str, data: &str) -> usize {
        let name = Some(QName::local(target));
        self.push(NodeKind::ProcessingInstruction, name, Some(data), Some(parent))
    }

    /// Finishes the document and returns its root node.
    pub fn build(self) -> Node {
        Node { dom: Arc::new(self.dom), idx: 0 }
    }
}

/// Node at `idx` in the same document as `any`.
pub fn node(any: &Node, idx: usize) -> Node {
    any.at(idx)
}

/// ```text
/// <list xml:lang="en-GB" xmlns:p="urn:p">     1  (@xml:lang 2, @xmlns:p 3)
///   <item id="a" kind="x">one</item>          4  (@id 5, @kind 6, text 7)
///   <item id="b">two<!--note--></item>        8  (@id 9, text 10, comment 11)
///   <?proc data?>                             12
///   <p:item id="c"> three  <sub>4</sub></p:item>  13 (@id 14, text 15, sub 16, text 17)
///   <extra lang="x">2</extra>                 18 (@lang 19, text 20)
/// </list>
/// ```
pub fn sample() -> Node {
    let mut b = DomBuilder::new();
    let list = b.element(0, "list");
    b.attribute(list, "xml:lang", "en-GB");
    b.attribute(list, "xmlns:p", "urn:p");
    let a = b.element(list, "item");
    b.attribute(a, "id", "a");
    b.attribute(a, "kind", "x");
    b.text(a, "one");
    let item_b = b.element(list, "item");
    b.attribute(item_b, "id", "b");
    b.text(item_b, "two");
    b.comment(item_b, "note");
    b.pi(list, "proc", "data");
    let c = b.element(list, "p:item");
    b.attribute(c, "id", "c");
    b.text(c, " three  ");
    let sub = b.element(c, "sub");
    b.text(sub, "4");
    let extra = b.element(list, "extra");
    b.attribute(extra, "lang", "x");
    b.text(extra, "2");
    b.build()
}

pub fn context(node: &Node) -> DynamicContext<Node> {
    DynamicContextBuilder::new().with_context_node(node.clone()).build()
}

/// Indices of the nodes an expression selects from the document node.
pub fn select(root: &Node, expr: &str) -> Vec<usize> {
    let nodes = treepath_xpath::compile::<Node>(expr)
        .unwrap()
        .evaluate_nodes(&context(root))
        .unwrap_or_else(|e| panic!("{expr}: {e}"));
    nodes.iter().map(Node::idx).collect()
}
