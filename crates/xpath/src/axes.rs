//! Traversal producers for the thirteen XPath axes.
//!
//! Every guide visits nodes in axis order and stops as soon as the visitor
//! returns [`ControlFlow::Break`], propagating the break to its caller. Forward
//! axes produce document order; `ancestor`, `ancestor-or-self`, `parent`,
//! `preceding` and `preceding-sibling` produce reverse document order.

use crate::error::EvaluationError;
use crate::model::{NodeKind, XdmNode};
use core::fmt;
use core::ops::ControlFlow;
use core::str::FromStr;

pub type Visit<'a, N> = &'a mut dyn FnMut(N) -> ControlFlow<()>;

/// A traversal producer rooted at an origin node.
pub trait AxisGuide<N> {
    fn guide(&self, origin: &N, visit: Visit<'_, N>) -> ControlFlow<()>;

    /// Number of nodes the guide would visit.
    fn count(&self, origin: &N) -> usize {
        let mut n = 0;
        let _ = self.guide(origin, &mut |_| {
            n += 1;
            ControlFlow::Continue(())
        });
        n
    }

    fn collect(&self, origin: &N) -> Vec<N> {
        let mut out = Vec::new();
        let _ = self.guide(origin, &mut |node| {
            out.push(node);
            ControlFlow::Continue(())
        });
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Ancestor,
    AncestorOrSelf,
    Attribute,
    Child,
    Descendant,
    DescendantOrSelf,
    Following,
    FollowingSibling,
    Namespace,
    Parent,
    Preceding,
    PrecedingSibling,
    SelfAxis,
}

impl Axis {
    pub const ALL: [Axis; 13] = [
        Axis::Ancestor,
        Axis::AncestorOrSelf,
        Axis::Attribute,
        Axis::Child,
        Axis::Descendant,
        Axis::DescendantOrSelf,
        Axis::Following,
        Axis::FollowingSibling,
        Axis::Namespace,
        Axis::Parent,
        Axis::Preceding,
        Axis::PrecedingSibling,
        Axis::SelfAxis,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Axis::Ancestor => "ancestor",
            Axis::AncestorOrSelf => "ancestor-or-self",
            Axis::Attribute => "attribute",
            Axis::Child => "child",
            Axis::Descendant => "descendant",
            Axis::DescendantOrSelf => "descendant-or-self",
            Axis::Following => "following",
            Axis::FollowingSibling => "following-sibling",
            Axis::Namespace => "namespace",
            Axis::Parent => "parent",
            Axis::Preceding => "preceding",
            Axis::PrecedingSibling => "preceding-sibling",
            Axis::SelfAxis => "self",
        }
    }

    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            Axis::Ancestor
                | Axis::AncestorOrSelf
                | Axis::Parent
                | Axis::Preceding
                | Axis::PrecedingSibling
        )
    }

    /// Node kind a name test selects on this axis.
    pub fn principal_kind(self) -> NodeKind {
        match self {
            Axis::Attribute => NodeKind::Attribute,
            Axis::Namespace => NodeKind::Namespace,
            _ => NodeKind::Element,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Axis {
    type Err = EvaluationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Axis::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| EvaluationError::UnknownAxis(s.to_string()))
    }
}

impl<N: XdmNode> AxisGuide<N> for Axis {
    fn guide(&self, origin: &N, visit: Visit<'_, N>) -> ControlFlow<()> {
        match self {
            Axis::SelfAxis => visit(origin.clone()),
            Axis::Child => children(origin, visit),
            Axis::Descendant => descendants(origin, visit),
            Axis::DescendantOrSelf => {
                visit(origin.clone())?;
                descendants(origin, visit)
            }
            Axis::Parent => match origin.parent() {
                Some(p) => visit(p),
                None => ControlFlow::Continue(()),
            },
            Axis::Ancestor => ancestors(origin.parent(), visit),
            Axis::AncestorOrSelf => ancestors(Some(origin.clone()), visit),
            Axis::FollowingSibling => {
                for sibling in following_siblings(origin) {
                    visit(sibling)?;
                }
                ControlFlow::Continue(())
            }
            Axis::PrecedingSibling => {
                for sibling in preceding_siblings(origin) {
                    visit(sibling)?;
                }
                ControlFlow::Continue(())
            }
            Axis::Attribute => {
                if origin.kind() == NodeKind::Element {
                    for attr in origin.attributes() {
                        visit(attr)?;
                    }
                }
                ControlFlow::Continue(())
            }
            // Namespace nodes are not exposed by the document model.
            Axis::Namespace => ControlFlow::Continue(()),
            Axis::Following => following(origin, visit),
            Axis::Preceding => preceding(origin, visit),
        }
    }
}

fn is_attribute_like<N: XdmNode>(node: &N) -> bool {
    matches!(node.kind(), NodeKind::Attribute | NodeKind::Namespace)
}

fn children<N: XdmNode>(node: &N, visit: Visit<'_, N>) -> ControlFlow<()> {
    for child in node.children() {
        visit(child)?;
    }
    ControlFlow::Continue(())
}

fn descendants<N: XdmNode>(node: &N, visit: Visit<'_, N>) -> ControlFlow<()> {
    for child in node.children() {
        visit(child.clone())?;
        descendants(&child, visit)?;
    }
    ControlFlow::Continue(())
}

/// Subtree of `node` (itself included) in reverse document order.
fn reverse_subtree<N: XdmNode>(node: &N, visit: Visit<'_, N>) -> ControlFlow<()> {
    for child in node.children().iter().rev() {
        reverse_subtree(child, visit)?;
    }
    visit(node.clone())
}

fn ancestors<N: XdmNode>(mut cur: Option<N>, visit: Visit<'_, N>) -> ControlFlow<()> {
    while let Some(node) = cur {
        cur = node.parent();
        visit(node)?;
    }
    ControlFlow::Continue(())
}

fn following_siblings<N: XdmNode>(node: &N) -> Vec<N> {
    if is_attribute_like(node) {
        return Vec::new();
    }
    let Some(parent) = node.parent() else { return Vec::new() };
    let mut siblings = parent.children();
    match siblings.iter().position(|s| s == node) {
        Some(pos) => siblings.split_off(pos + 1),
        None => Vec::new(),
    }
}

fn preceding_siblings<N: XdmNode>(node: &N) -> Vec<N> {
    if is_attribute_like(node) {
        return Vec::new();
    }
    let Some(parent) = node.parent() else { return Vec::new() };
    let mut siblings = parent.children();
    match siblings.iter().position(|s| s == node) {
        Some(pos) => {
            siblings.truncate(pos);
            siblings.reverse();
            siblings
        }
        None => Vec::new(),
    }
}

fn following<N: XdmNode>(origin: &N, visit: Visit<'_, N>) -> ControlFlow<()> {
    let mut cur = origin.clone();
    if is_attribute_like(origin) {
        // The owner element's content follows its attributes.
        let Some(owner) = origin.parent() else { return ControlFlow::Continue(()) };
        descendants(&owner, visit)?;
        cur = owner;
    }
    loop {
        for sibling in following_siblings(&cur) {
            visit(sibling.clone())?;
            descendants(&sibling, visit)?;
        }
        match cur.parent() {
            Some(parent) => cur = parent,
            None => return ControlFlow::Continue(()),
        }
    }
}

fn preceding<N: XdmNode>(origin: &N, visit: Visit<'_, N>) -> ControlFlow<()> {
    let mut cur = if is_attribute_like(origin) {
        match origin.parent() {
            Some(owner) => owner,
            None => return ControlFlow::Continue(()),
        }
    } else {
        origin.clone()
    };
    loop {
        for sibling in preceding_siblings(&cur) {
            reverse_subtree(&sibling, visit)?;
        }
        match cur.parent() {
            Some(parent) => cur = parent,
            None => return ControlFlow::Continue(()),
        }
    }
}
