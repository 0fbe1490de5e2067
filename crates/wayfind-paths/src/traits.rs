use std::hash::Hash;
use std::rc::Rc;

use wayfind_core::Point;

use crate::modifier::EdgeModifier;

/// Anything usable as a graph vertex: identity and hashing only.
///
/// Blanket-implemented; the engine never inspects a node beyond `==` and
/// `hash`, and never owns the graph the node belongs to.
pub trait Node: Clone + Eq + Hash {}

impl<T: Clone + Eq + Hash> Node for T {}

/// A directed edge produced on demand by a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge<N> {
    pub to: N,
    pub cost: f32,
}

impl<N> Edge<N> {
    #[inline]
    pub fn new(to: N, cost: f32) -> Self {
        Self { to, cost }
    }

    /// Whether the edge may be traversed: finite, non-negative cost.
    #[inline]
    pub fn is_traversable(&self) -> bool {
        self.cost.is_finite() && self.cost >= 0.0
    }
}

/// Edge provider: the only capability search algorithms need from a graph.
pub trait Graph<N> {
    /// Clear `buf` and append every traversable outgoing edge of `node`.
    ///
    /// Must be deterministic for a fixed graph state and must never yield
    /// edges into out-of-bounds or permanently blocked nodes.
    fn edges(&self, node: &N, buf: &mut Vec<Edge<N>>);

    /// Whether `node` may be entered at all. Virtual edges supplied by an
    /// [`EdgeModifier`] into a node that fails this are dropped.
    fn is_traversable(&self, _node: &N) -> bool {
        true
    }
}

impl<N, G: Graph<N> + ?Sized> Graph<N> for &G {
    fn edges(&self, node: &N, buf: &mut Vec<Edge<N>>) {
        (**self).edges(node, buf)
    }

    fn is_traversable(&self, node: &N) -> bool {
        (**self).is_traversable(node)
    }
}

impl<N, G: Graph<N> + ?Sized> Graph<N> for Box<G> {
    fn edges(&self, node: &N, buf: &mut Vec<Edge<N>>) {
        (**self).edges(node, buf)
    }

    fn is_traversable(&self, node: &N) -> bool {
        (**self).is_traversable(node)
    }
}

impl<N, G: Graph<N> + ?Sized> Graph<N> for Rc<G> {
    fn edges(&self, node: &N, buf: &mut Vec<Edge<N>>) {
        (**self).edges(node, buf)
    }

    fn is_traversable(&self, node: &N) -> bool {
        (**self).is_traversable(node)
    }
}

/// Straight-line visibility between two grid cells, used by path smoothing.
pub trait LineOfSight {
    /// Whether every cell on the discrete line from `from` to `to` is walkable.
    fn line_of_sight(&self, from: Point, to: Point) -> bool;
}

/// Enumerate the effective outgoing edges of `node` for one search step.
///
/// Graph edges come first, followed by any virtual edges the modifier
/// supplies; virtual edges into nodes the graph reports as not traversable
/// are discarded. Every edge is then passed through the modifier; rejected
/// edges and edges whose final cost is not finite and non-negative are
/// dropped.
pub fn collect_edges<N, G, M>(graph: &G, modifier: &M, node: &N, buf: &mut Vec<Edge<N>>)
where
    G: Graph<N> + ?Sized,
    M: EdgeModifier<N> + ?Sized,
{
    graph.edges(node, buf);
    let own = buf.len();
    modifier.extra_edges(node, buf);
    let mut i = 0;
    buf.retain_mut(|e| {
        let extra = i >= own;
        i += 1;
        (!extra || graph.is_traversable(&e.to))
            && modifier.modify_cost(node, &e.to, &mut e.cost)
            && e.is_traversable()
    });
}

/// Total cost of walking `path` over `graph`.
///
/// Each consecutive pair must be joined by an edge; when several parallel
/// edges exist the cheapest one counts. Returns `None` if some step is not an
/// edge. A single-node path costs zero.
pub fn path_cost<N: Node, G: Graph<N> + ?Sized>(graph: &G, path: &[N]) -> Option<f32> {
    let mut buf = Vec::new();
    let mut total = 0.0;
    for pair in path.windows(2) {
        graph.edges(&pair[0], &mut buf);
        let step = buf
            .iter()
            .filter(|e| e.to == pair[1])
            .map(|e| e.cost)
            .min_by(f32::total_cmp)?;
        total += step;
    }
    Some(total)
}
