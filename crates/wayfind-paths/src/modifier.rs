//! Edge modifiers: per-search cost rewriting and edge rejection.
//!
//! A modifier sees every candidate edge during traversal and may raise its
//! cost or veto it for the current step. The underlying graph is never
//! touched. Modifiers may also contribute virtual edges ([`Portals`]).
//!
//! Lowering a cost below the graph's base cost is allowed for shortcuts, but
//! then the heuristic in use may no longer be admissible.

use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::traits::{Edge, Node};

/// Rewrites or rejects edges during traversal.
pub trait EdgeModifier<N> {
    /// Adjust `cost` for the edge `from -> to`. Returning `false` drops the
    /// edge for this step only.
    fn modify_cost(&self, from: &N, to: &N, cost: &mut f32) -> bool;

    /// Append virtual outgoing edges of `from` to `buf` without clearing it.
    fn extra_edges(&self, _from: &N, _buf: &mut Vec<Edge<N>>) {}
}

impl<N, M: EdgeModifier<N> + ?Sized> EdgeModifier<N> for &M {
    fn modify_cost(&self, from: &N, to: &N, cost: &mut f32) -> bool {
        (**self).modify_cost(from, to, cost)
    }

    fn extra_edges(&self, from: &N, buf: &mut Vec<Edge<N>>) {
        (**self).extra_edges(from, buf)
    }
}

impl<N, M: EdgeModifier<N> + ?Sized> EdgeModifier<N> for Box<M> {
    fn modify_cost(&self, from: &N, to: &N, cost: &mut f32) -> bool {
        (**self).modify_cost(from, to, cost)
    }

    fn extra_edges(&self, from: &N, buf: &mut Vec<Edge<N>>) {
        (**self).extra_edges(from, buf)
    }
}

impl<N, M: EdgeModifier<N> + ?Sized> EdgeModifier<N> for Rc<M> {
    fn modify_cost(&self, from: &N, to: &N, cost: &mut f32) -> bool {
        (**self).modify_cost(from, to, cost)
    }

    fn extra_edges(&self, from: &N, buf: &mut Vec<Edge<N>>) {
        (**self).extra_edges(from, buf)
    }
}

/// Accepts every edge unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoModifier;

impl<N> EdgeModifier<N> for NoModifier {
    #[inline]
    fn modify_cost(&self, _from: &N, _to: &N, _cost: &mut f32) -> bool {
        true
    }
}

/// Rejects every edge entering one of the excluded nodes.
#[derive(Debug, Clone)]
pub struct ExcludeNodes<N: Node> {
    nodes: FxHashSet<N>,
}

impl<N: Node> Default for ExcludeNodes<N> {
    fn default() -> Self {
        Self {
            nodes: FxHashSet::default(),
        }
    }
}

impl<N: Node> ExcludeNodes<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude `node`. Returns `false` if it was already excluded.
    pub fn insert(&mut self, node: N) -> bool {
        self.nodes.insert(node)
    }

    pub fn remove(&mut self, node: &N) -> bool {
        self.nodes.remove(node)
    }

    pub fn contains(&self, node: &N) -> bool {
        self.nodes.contains(node)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

impl<N: Node> FromIterator<N> for ExcludeNodes<N> {
    fn from_iter<I: IntoIterator<Item = N>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl<N: Node> EdgeModifier<N> for ExcludeNodes<N> {
    fn modify_cost(&self, _from: &N, to: &N, _cost: &mut f32) -> bool {
        !self.nodes.contains(to)
    }
}

/// Rejects specific directed edges.
#[derive(Debug, Clone)]
pub struct ExcludeEdges<N: Node> {
    edges: FxHashSet<(N, N)>,
}

impl<N: Node> Default for ExcludeEdges<N> {
    fn default() -> Self {
        Self {
            edges: FxHashSet::default(),
        }
    }
}

impl<N: Node> ExcludeEdges<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude the directed edge `from -> to`.
    pub fn insert(&mut self, from: N, to: N) -> bool {
        self.edges.insert((from, to))
    }

    /// Exclude both `a -> b` and `b -> a`.
    pub fn insert_symmetric(&mut self, a: N, b: N) {
        self.edges.insert((a.clone(), b.clone()));
        self.edges.insert((b, a));
    }

    pub fn remove(&mut self, from: N, to: N) -> bool {
        self.edges.remove(&(from, to))
    }

    pub fn clear(&mut self) {
        self.edges.clear();
    }
}

impl<N: Node> EdgeModifier<N> for ExcludeEdges<N> {
    fn modify_cost(&self, from: &N, to: &N, _cost: &mut f32) -> bool {
        // Probe without cloning into a tuple for the common empty case.
        if self.edges.is_empty() {
            return true;
        }
        !self.edges.contains(&(from.clone(), to.clone()))
    }
}

/// Additive per-node cost paid when an edge enters the node.
///
/// Overlays stack: adding to a node that already carries a penalty sums the
/// two. An infinite penalty makes the node unreachable for the search.
#[derive(Debug, Clone)]
pub struct CostOverlay<N: Node> {
    extra: FxHashMap<N, f32>,
}

impl<N: Node> Default for CostOverlay<N> {
    fn default() -> Self {
        Self {
            extra: FxHashMap::default(),
        }
    }
}

impl<N: Node> CostOverlay<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta` to the entry cost of `node`.
    pub fn add(&mut self, node: N, delta: f32) {
        *self.extra.entry(node).or_insert(0.0) += delta;
    }

    /// Replace the entry cost of `node`.
    pub fn set(&mut self, node: N, cost: f32) {
        self.extra.insert(node, cost);
    }

    pub fn get(&self, node: &N) -> f32 {
        self.extra.get(node).copied().unwrap_or(0.0)
    }

    pub fn remove(&mut self, node: &N) -> Option<f32> {
        self.extra.remove(node)
    }

    pub fn clear(&mut self) {
        self.extra.clear();
    }
}

impl<N: Node> EdgeModifier<N> for CostOverlay<N> {
    fn modify_cost(&self, _from: &N, to: &N, cost: &mut f32) -> bool {
        if let Some(delta) = self.extra.get(to) {
            *cost += delta;
        }
        true
    }
}

/// Virtual directed edges that exist only during traversal (teleporters,
/// doors, ladders between otherwise unconnected graphs).
#[derive(Debug, Clone)]
pub struct Portals<N: Node> {
    links: FxHashMap<N, Vec<Edge<N>>>,
}

impl<N: Node> Default for Portals<N> {
    fn default() -> Self {
        Self {
            links: FxHashMap::default(),
        }
    }
}

impl<N: Node> Portals<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a one-way portal `from -> to`.
    pub fn link(&mut self, from: N, to: N, cost: f32) {
        self.links.entry(from).or_default().push(Edge::new(to, cost));
    }

    /// Add portals in both directions with the same cost.
    pub fn link_both(&mut self, a: N, b: N, cost: f32) {
        self.link(a.clone(), b.clone(), cost);
        self.link(b, a, cost);
    }

    /// Remove every portal leaving `from`.
    pub fn unlink(&mut self, from: &N) {
        self.links.remove(from);
    }

    pub fn len(&self) -> usize {
        self.links.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl<N: Node> EdgeModifier<N> for Portals<N> {
    fn modify_cost(&self, _from: &N, _to: &N, _cost: &mut f32) -> bool {
        true
    }

    fn extra_edges(&self, from: &N, buf: &mut Vec<Edge<N>>) {
        if let Some(links) = self.links.get(from) {
            buf.extend(links.iter().cloned());
        }
    }
}

/// Ordered composition of modifiers.
///
/// An edge survives only if every member accepts it; each member sees the
/// cost left by the previous one, so additive deltas stack. Virtual edges of
/// every member are offered to the whole chain.
pub struct Composite<'a, N> {
    members: Vec<Box<dyn EdgeModifier<N> + 'a>>,
}

impl<N> Default for Composite<'_, N> {
    fn default() -> Self {
        Self {
            members: Vec::new(),
        }
    }
}

impl<'a, N> Composite<'a, N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a modifier to the chain.
    pub fn with(mut self, modifier: impl EdgeModifier<N> + 'a) -> Self {
        self.members.push(Box::new(modifier));
        self
    }

    pub fn push(&mut self, modifier: impl EdgeModifier<N> + 'a) {
        self.members.push(Box::new(modifier));
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<N> EdgeModifier<N> for Composite<'_, N> {
    fn modify_cost(&self, from: &N, to: &N, cost: &mut f32) -> bool {
        self.members.iter().all(|m| m.modify_cost(from, to, cost))
    }

    fn extra_edges(&self, from: &N, buf: &mut Vec<Edge<N>>) {
        for m in &self.members {
            m.extra_edges(from, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::collect_edges;
    use crate::GridGraph;
    use wayfind_core::Point;

    fn p(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn exclude_nodes_rejects_entry() {
        let ex: ExcludeNodes<Point> = [p(1, 0)].into_iter().collect();
        let mut c = 1.0;
        assert!(!ex.modify_cost(&p(0, 0), &p(1, 0), &mut c));
        assert!(ex.modify_cost(&p(1, 0), &p(0, 0), &mut c));
    }

    #[test]
    fn exclude_edges_is_directed() {
        let mut ex = ExcludeEdges::new();
        ex.insert(p(0, 0), p(1, 0));
        let mut c = 1.0;
        assert!(!ex.modify_cost(&p(0, 0), &p(1, 0), &mut c));
        assert!(ex.modify_cost(&p(1, 0), &p(0, 0), &mut c));

        ex.insert_symmetric(p(2, 2), p(2, 3));
        assert!(!ex.modify_cost(&p(2, 3), &p(2, 2), &mut c));
    }

    #[test]
    fn composite_stacks_and_requires_all() {
        let mut a = CostOverlay::new();
        a.add(p(1, 0), 2.0);
        let mut b = CostOverlay::new();
        b.add(p(1, 0), 3.0);
        let ex: ExcludeNodes<Point> = [p(0, 1)].into_iter().collect();

        let chain = Composite::new().with(&a).with(&b).with(&ex);
        let mut c = 1.0;
        assert!(chain.modify_cost(&p(0, 0), &p(1, 0), &mut c));
        assert_eq!(c, 6.0);

        let mut c = 1.0;
        assert!(!chain.modify_cost(&p(0, 0), &p(0, 1), &mut c));
    }

    #[test]
    fn collect_edges_applies_modifier_and_portals() {
        let grid = GridGraph::new(3, 3).unwrap();
        let mut portals = Portals::new();
        portals.link(p(0, 0), p(2, 2), 0.5);
        let ex: ExcludeNodes<Point> = [p(1, 0)].into_iter().collect();
        let chain = Composite::new().with(portals).with(ex);

        let mut buf = Vec::new();
        collect_edges(&grid, &chain, &p(0, 0), &mut buf);
        let targets: Vec<_> = buf.iter().map(|e| e.to).collect();
        assert!(targets.contains(&p(0, 1)));
        assert!(targets.contains(&p(2, 2)));
        assert!(!targets.contains(&p(1, 0)));
    }

    #[test]
    fn portal_into_wall_is_dropped() {
        let mut grid = GridGraph::new(3, 1).unwrap();
        grid.set_unwalkable(p(2, 0)).unwrap();
        let mut portals = Portals::new();
        portals.link(p(0, 0), p(2, 0), 1.0);
        portals.link(p(0, 0), p(7, 7), 1.0);

        let mut buf = Vec::new();
        collect_edges(&grid, &portals, &p(0, 0), &mut buf);
        let targets: Vec<_> = buf.iter().map(|e| e.to).collect();
        assert_eq!(targets, vec![p(1, 0)]);
    }

    #[test]
    fn infinite_overlay_drops_edge() {
        let grid = GridGraph::new(2, 1).unwrap();
        let mut overlay = CostOverlay::new();
        overlay.set(p(1, 0), f32::INFINITY);
        let mut buf = Vec::new();
        collect_edges(&grid, &overlay, &p(0, 0), &mut buf);
        assert!(buf.is_empty());
    }
}
