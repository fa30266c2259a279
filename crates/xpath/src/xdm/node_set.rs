use crate::error::Error;
use crate::model::XdmNode;
use core::cmp::Ordering;
use core::ops::ControlFlow;

/// Nodes in strictly increasing document order, without duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSet<N> {
    nodes: Vec<N>,
}

impl<N> Default for NodeSet<N> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

impl<N> NodeSet<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(node: N) -> Self {
        Self { nodes: vec![node] }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn first(&self) -> Option<&N> {
        self.nodes.first()
    }

    pub fn get(&self, index: usize) -> Option<&N> {
        self.nodes.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, N> {
        self.nodes.iter()
    }

    pub fn as_slice(&self) -> &[N] {
        &self.nodes
    }

    pub fn into_vec(self) -> Vec<N> {
        self.nodes
    }

    /// Visits nodes in document order until `visit` breaks.
    pub fn each(&self, mut visit: impl FnMut(&N) -> ControlFlow<()>) -> ControlFlow<()> {
        for n in &self.nodes {
            visit(n)?;
        }
        ControlFlow::Continue(())
    }

    /// True if some member satisfies `pred`; stops at the first one.
    pub fn any(&self, mut pred: impl FnMut(&N) -> bool) -> bool {
        self.each(|n| if pred(n) { ControlFlow::Break(()) } else { ControlFlow::Continue(()) })
            .is_break()
    }
}

impl<N: XdmNode> NodeSet<N> {
    /// Sorts into document order and removes duplicates. Input that is
    /// already ordered is kept as is.
    pub fn from_nodes(mut nodes: Vec<N>) -> Result<Self, Error> {
        if is_strictly_ordered(&nodes)? {
            return Ok(Self { nodes });
        }
        let mut failure = None;
        nodes.sort_by(|a, b| match a.compare_document_order(b) {
            Ok(ord) => ord,
            Err(e) => {
                failure.get_or_insert(e);
                Ordering::Equal
            }
        });
        if let Some(e) = failure {
            return Err(e);
        }
        nodes.dedup();
        Ok(Self { nodes })
    }

    /// Merges two node-sets in linear time.
    pub fn union(&self, other: &Self) -> Result<Self, Error> {
        let (a, b) = (&self.nodes, &other.nodes);
        let mut out = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].compare_document_order(&b[j])? {
                Ordering::Less => {
                    out.push(a[i].clone());
                    i += 1;
                }
                Ordering::Greater => {
                    out.push(b[j].clone());
                    j += 1;
                }
                Ordering::Equal => {
                    out.push(a[i].clone());
                    i += 1;
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&a[i..]);
        out.extend_from_slice(&b[j..]);
        Ok(Self { nodes: out })
    }

    pub fn contains(&self, node: &N) -> bool {
        self.nodes.contains(node)
    }
}

fn is_strictly_ordered<N: XdmNode>(nodes: &[N]) -> Result<bool, Error> {
    for pair in nodes.windows(2) {
        if pair[0].compare_document_order(&pair[1])? != Ordering::Less {
            return Ok(false);
        }
    }
    Ok(true)
}

impl<'a, N> IntoIterator for &'a NodeSet<N> {
    type Item = &'a N;
    type IntoIter = std::slice::Iter<'a, N>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl<N> IntoIterator for NodeSet<N> {
    type Item = N;
    type IntoIter = std::vec::IntoIter<N>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}
