use std::collections::BinaryHeap;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::frontier::{OpenEntry, PathNode};
use crate::modifier::{EdgeModifier, NoModifier};
use crate::traits::{collect_edges, Edge, Graph, Node};

/// Uniform-cost frontier expansion.
///
/// After [`expand`](Self::expand) the instance answers any number of
/// [`cost`](Self::cost) / [`path_to`](Self::path_to) queries against that
/// single expansion. [`find_nearest`](Self::find_nearest) stops at the first
/// target settled, which is the cheapest reachable one because nodes settle
/// in non-decreasing cost order.
///
/// Scratch state is cleared at the start of every call.
#[derive(Debug)]
pub struct Dijkstra<N: Node> {
    cost_so_far: FxHashMap<N, f32>,
    came_from: FxHashMap<N, N>,
    settled: Vec<PathNode<N>>,
    open: BinaryHeap<OpenEntry<N>>,
    targets: FxHashSet<N>,
    edges: Vec<Edge<N>>,
    seq: u64,
}

impl<N: Node> Default for Dijkstra<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Node> Dijkstra<N> {
    pub fn new() -> Self {
        Self {
            cost_so_far: FxHashMap::default(),
            came_from: FxHashMap::default(),
            settled: Vec::new(),
            open: BinaryHeap::new(),
            targets: FxHashSet::default(),
            edges: Vec::new(),
            seq: 0,
        }
    }

    /// Settle every node reachable from `start` within `max_cost`.
    ///
    /// Returns all settled nodes in settle order.
    pub fn expand<G>(&mut self, graph: &G, start: N, max_cost: f32) -> &[PathNode<N>]
    where
        G: Graph<N> + ?Sized,
    {
        self.expand_from(graph, &NoModifier, [start], max_cost)
    }

    /// [`expand`](Self::expand) with an edge modifier.
    pub fn expand_with<G, M>(
        &mut self,
        graph: &G,
        modifier: &M,
        start: N,
        max_cost: f32,
    ) -> &[PathNode<N>]
    where
        G: Graph<N> + ?Sized,
        M: EdgeModifier<N> + ?Sized,
    {
        self.expand_from(graph, modifier, [start], max_cost)
    }

    /// Multi-origin expansion: every source starts at cost 0.
    pub fn expand_from<G, M, I>(
        &mut self,
        graph: &G,
        modifier: &M,
        sources: I,
        max_cost: f32,
    ) -> &[PathNode<N>]
    where
        G: Graph<N> + ?Sized,
        M: EdgeModifier<N> + ?Sized,
        I: IntoIterator<Item = N>,
    {
        self.targets.clear();
        self.run(graph, modifier, sources, max_cost);
        &self.settled
    }

    /// Path from `start` to the cheapest reachable node of `targets` within
    /// `max_cost`, or `None` if no target is reachable.
    pub fn find_nearest<G>(
        &mut self,
        graph: &G,
        start: N,
        targets: &[N],
        max_cost: f32,
    ) -> Option<Vec<N>>
    where
        G: Graph<N> + ?Sized,
    {
        self.find_nearest_with(graph, &NoModifier, start, targets, max_cost)
    }

    /// [`find_nearest`](Self::find_nearest) with an edge modifier.
    pub fn find_nearest_with<G, M>(
        &mut self,
        graph: &G,
        modifier: &M,
        start: N,
        targets: &[N],
        max_cost: f32,
    ) -> Option<Vec<N>>
    where
        G: Graph<N> + ?Sized,
        M: EdgeModifier<N> + ?Sized,
    {
        self.targets.clear();
        self.targets.extend(targets.iter().cloned());
        if self.targets.is_empty() {
            self.clear();
            return None;
        }
        let hit = self.run(graph, modifier, [start], max_cost)?;
        self.path_to(&hit)
    }

    /// Best known cost to `node` from the last expansion.
    ///
    /// Final for settled nodes. After an early-stopping
    /// [`find_nearest`](Self::find_nearest), frontier nodes report an upper
    /// bound.
    pub fn cost(&self, node: &N) -> Option<f32> {
        self.cost_so_far.get(node).copied()
    }

    pub fn is_reached(&self, node: &N) -> bool {
        self.cost_so_far.contains_key(node)
    }

    /// Nodes settled by the last call, in settle order.
    pub fn reached(&self) -> &[PathNode<N>] {
        &self.settled
    }

    /// Path from the expansion origin to `node`, both inclusive.
    pub fn path_to(&self, node: &N) -> Option<Vec<N>> {
        if !self.cost_so_far.contains_key(node) {
            return None;
        }
        let mut path = vec![node.clone()];
        let mut cur = node;
        while let Some(prev) = self.came_from.get(cur) {
            path.push(prev.clone());
            cur = prev;
        }
        path.reverse();
        Some(path)
    }

    fn clear(&mut self) {
        self.cost_so_far.clear();
        self.came_from.clear();
        self.settled.clear();
        self.open.clear();
        self.seq = 0;
    }

    fn run<G, M, I>(&mut self, graph: &G, modifier: &M, sources: I, max_cost: f32) -> Option<N>
    where
        G: Graph<N> + ?Sized,
        M: EdgeModifier<N> + ?Sized,
        I: IntoIterator<Item = N>,
    {
        self.clear();

        for src in sources {
            if self.cost_so_far.contains_key(&src) {
                continue;
            }
            self.cost_so_far.insert(src.clone(), 0.0);
            self.seq += 1;
            self.open.push(OpenEntry {
                node: src,
                g: 0.0,
                f: 0.0,
                h: 0.0,
                seq: self.seq,
            });
        }

        let mut edges = std::mem::take(&mut self.edges);
        let mut hit = None;

        while let Some(current) = self.open.pop() {
            // Lazy deletion: a cheaper entry for this node was pushed later.
            if self
                .cost_so_far
                .get(&current.node)
                .is_some_and(|&best| current.g > best)
            {
                continue;
            }

            self.settled.push(PathNode {
                node: current.node.clone(),
                cost: current.g,
            });

            if self.targets.contains(&current.node) {
                hit = Some(current.node);
                break;
            }

            collect_edges(graph, modifier, &current.node, &mut edges);
            for e in edges.drain(..) {
                let tentative = current.g + e.cost;
                if tentative > max_cost {
                    continue;
                }
                if self
                    .cost_so_far
                    .get(&e.to)
                    .is_some_and(|&best| tentative >= best)
                {
                    continue;
                }
                self.cost_so_far.insert(e.to.clone(), tentative);
                self.came_from.insert(e.to.clone(), current.node.clone());
                self.seq += 1;
                self.open.push(OpenEntry {
                    node: e.to,
                    g: tentative,
                    f: tentative,
                    h: 0.0,
                    seq: self.seq,
                });
            }
        }

        self.edges = edges;
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::ExcludeNodes;
    use crate::testutil::walled_grid;
    use crate::{GridGraph, SparseGraph};
    use wayfind_core::Point;

    fn p(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn expand_records_costs_and_paths() {
        let grid = GridGraph::new(4, 4).unwrap();
        let mut d = Dijkstra::new();
        let reached = d.expand(&grid, p(0, 0), f32::INFINITY);
        assert_eq!(reached.len(), 16);
        assert!(reached.windows(2).all(|w| w[0].cost <= w[1].cost));
        assert_eq!(d.cost(&p(3, 3)), Some(6.0));
        let path = d.path_to(&p(3, 2)).unwrap();
        assert_eq!(path.len(), 6);
        assert_eq!(path.first(), Some(&p(0, 0)));
        assert_eq!(path.last(), Some(&p(3, 2)));
    }

    #[test]
    fn max_cost_bounds_expansion() {
        let grid = GridGraph::new(10, 10).unwrap();
        let mut d = Dijkstra::new();
        let reached = d.expand(&grid, p(5, 5), 2.0);
        // Diamond of radius 2: 1 + 4 + 8 cells.
        assert_eq!(reached.len(), 13);
        assert!(reached.iter().all(|n| n.cost <= 2.0));
        assert_eq!(d.cost(&p(8, 5)), None);
        assert_eq!(d.path_to(&p(8, 5)), None);
    }

    #[test]
    fn find_nearest_picks_cheapest_target() {
        let mut grid = GridGraph::new(7, 1).unwrap();
        grid.set_cost(p(1, 0), 5.0).unwrap();
        let mut d = Dijkstra::new();
        // (0,0) is two steps away but one of them costs 6; (6,0) is 3 cheap steps.
        let path = d
            .find_nearest(&grid, p(3, 0), &[p(0, 0), p(6, 0)], f32::INFINITY)
            .unwrap();
        assert_eq!(path.last(), Some(&p(6, 0)));
        assert_eq!(d.cost(&p(6, 0)), Some(3.0));
    }

    #[test]
    fn find_nearest_start_is_target() {
        let grid = GridGraph::new(3, 3).unwrap();
        let path = Dijkstra::new().find_nearest(&grid, p(1, 1), &[p(1, 1), p(0, 0)], 10.0);
        assert_eq!(path, Some(vec![p(1, 1)]));
    }

    #[test]
    fn find_nearest_respects_budget_and_walls() {
        let grid = walled_grid(9, 5, 4);
        let mut d = Dijkstra::new();
        assert_eq!(
            d.find_nearest(&grid, p(0, 0), &[p(8, 0), p(6, 4)], f32::INFINITY),
            None
        );
        let open = GridGraph::new(9, 5).unwrap();
        assert_eq!(d.find_nearest(&open, p(0, 0), &[p(8, 0)], 7.0), None);
        assert!(d.find_nearest(&open, p(0, 0), &[p(8, 0)], 8.0).is_some());
        assert_eq!(d.find_nearest(&open, p(0, 0), &[], 8.0), None);
    }

    #[test]
    fn multi_source_and_modifier() {
        let grid = GridGraph::new(5, 1).unwrap();
        let ex: ExcludeNodes<Point> = [p(2, 0)].into_iter().collect();
        let mut d = Dijkstra::new();
        d.expand_from(&grid, &ex, [p(0, 0), p(4, 0)], f32::INFINITY);
        assert_eq!(d.cost(&p(1, 0)), Some(1.0));
        assert_eq!(d.cost(&p(3, 0)), Some(1.0));
        assert!(!d.is_reached(&p(2, 0)));
    }

    #[test]
    fn duplicate_entries_are_skipped() {
        // b is first reached expensively through a, then cheaply through c.
        let mut g = SparseGraph::new();
        g.add_edge('s', 'a', 1.0).unwrap();
        g.add_edge('s', 'c', 2.0).unwrap();
        g.add_edge('a', 'b', 10.0).unwrap();
        g.add_edge('c', 'b', 1.0).unwrap();
        let mut d = Dijkstra::new();
        let reached = d.expand(&g, 's', f32::INFINITY);
        let b_entries = reached.iter().filter(|n| n.node == 'b').count();
        assert_eq!(b_entries, 1);
        assert_eq!(d.cost(&'b'), Some(3.0));
        assert_eq!(d.path_to(&'b'), Some(vec!['s', 'c', 'b']));
    }
}
