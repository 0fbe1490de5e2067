//! Sparse waypoint graph with explicit adjacency lists.
//!
//! Nodes are arbitrary hashable identifiers. Each node may carry a world
//! position; positioned nodes are registered in an optional uniform-cell
//! [`SpatialHash`] so "nearest node to this point" queries stay cheap on
//! large graphs.

use rustc_hash::FxHashMap;

use wayfind_core::Vec2;

use crate::error::{PathError, Result};
use crate::heuristic::HeuristicFn;
use crate::traits::{Edge, Graph, Node};

// ---------------------------------------------------------------------------
// SpatialHash
// ---------------------------------------------------------------------------

/// Uniform grid bucketing of positioned nodes.
#[derive(Debug, Clone)]
pub struct SpatialHash<N: Node> {
    cell_size: f32,
    cells: FxHashMap<(i32, i32), Vec<(N, Vec2)>>,
}

impl<N: Node> SpatialHash<N> {
    /// Create an index whose buckets are `cell_size` world units wide.
    pub fn new(cell_size: f32) -> Result<Self> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(PathError::InvalidCellSize(cell_size));
        }
        Ok(Self {
            cell_size,
            cells: FxHashMap::default(),
        })
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    #[inline]
    fn cell_of(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    pub fn insert(&mut self, node: N, pos: Vec2) {
        let key = self.cell_of(pos);
        self.cells.entry(key).or_default().push((node, pos));
    }

    /// Remove `node`, which must have been inserted at `pos`.
    pub fn remove(&mut self, node: &N, pos: Vec2) -> bool {
        let key = self.cell_of(pos);
        let Some(bucket) = self.cells.get_mut(&key) else {
            return false;
        };
        let Some(i) = bucket.iter().position(|(n, _)| n == node) else {
            return false;
        };
        bucket.remove(i);
        if bucket.is_empty() {
            self.cells.remove(&key);
        }
        true
    }

    /// Closest node within `radius` of `pos`; an infinite radius finds the
    /// closest node overall. Ties keep the node in the lowest bucket row,
    /// then column, then insertion order.
    ///
    /// Only buckets that can intersect the query circle are probed. When
    /// that box spans more buckets than are occupied, the occupied buckets
    /// are scanned instead, so the cost never exceeds one pass over the
    /// index.
    pub fn nearest(&self, pos: Vec2, radius: f32) -> Option<N> {
        if radius.is_nan() || radius < 0.0 {
            return None;
        }
        let r2 = radius * radius;
        let x0 = ((pos.x - radius) / self.cell_size).floor();
        let y0 = ((pos.y - radius) / self.cell_size).floor();
        let x1 = ((pos.x + radius) / self.cell_size).floor();
        let y1 = ((pos.y + radius) / self.cell_size).floor();
        let span = (f64::from(x1) - f64::from(x0) + 1.0) * (f64::from(y1) - f64::from(y0) + 1.0);

        let mut best = None;
        if span.is_finite() && span <= self.cells.len() as f64 {
            for cy in y0 as i32..=y1 as i32 {
                for cx in x0 as i32..=x1 as i32 {
                    if let Some(bucket) = self.cells.get(&(cx, cy)) {
                        offer_bucket(&mut best, (cx, cy), bucket, pos, r2);
                    }
                }
            }
        } else {
            for (&key, bucket) in &self.cells {
                offer_bucket(&mut best, key, bucket, pos, r2);
            }
        }
        best.map(|(_, _, n)| n.clone())
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}

// Closest candidate so far: (distance², (row, column, slot), node).
type Candidate<'a, N> = Option<(f32, (i32, i32, usize), &'a N)>;

fn offer_bucket<'a, N>(
    best: &mut Candidate<'a, N>,
    key: (i32, i32),
    bucket: &'a [(N, Vec2)],
    pos: Vec2,
    r2: f32,
) {
    for (slot, (node, p)) in bucket.iter().enumerate() {
        let d2 = p.distance_squared(pos);
        if d2 > r2 {
            continue;
        }
        let order = (key.1, key.0, slot);
        if best.is_none_or(|(b, o, _)| d2 < b || (d2 == b && order < o)) {
            *best = Some((d2, order, node));
        }
    }
}

// ---------------------------------------------------------------------------
// SparseGraph
// ---------------------------------------------------------------------------

/// Directed weighted graph keyed by node identity.
#[derive(Debug, Clone)]
pub struct SparseGraph<N: Node> {
    adjacency: FxHashMap<N, Vec<Edge<N>>>,
    positions: FxHashMap<N, Vec2>,
    index: Option<SpatialHash<N>>,
}

impl<N: Node> Default for SparseGraph<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Node> SparseGraph<N> {
    /// Empty graph without a spatial index.
    pub fn new() -> Self {
        Self {
            adjacency: FxHashMap::default(),
            positions: FxHashMap::default(),
            index: None,
        }
    }

    /// Empty graph whose positioned nodes are indexed in buckets of
    /// `cell_size` world units.
    pub fn with_spatial_index(cell_size: f32) -> Result<Self> {
        Ok(Self {
            index: Some(SpatialHash::new(cell_size)?),
            ..Self::new()
        })
    }

    /// Add a node without a position. Returns `false` if already present.
    pub fn add_node(&mut self, node: N) -> bool {
        if self.adjacency.contains_key(&node) {
            return false;
        }
        self.adjacency.insert(node, Vec::new());
        true
    }

    /// Add a node (or move an existing one) at a world position.
    pub fn add_node_at(&mut self, node: N, pos: Vec2) {
        self.add_node(node.clone());
        if let Some(old) = self.positions.insert(node.clone(), pos) {
            if let Some(index) = &mut self.index {
                index.remove(&node, old);
            }
        }
        if let Some(index) = &mut self.index {
            index.insert(node, pos);
        }
    }

    /// Remove a node along with every edge into or out of it.
    pub fn remove_node(&mut self, node: &N) -> bool {
        if self.adjacency.remove(node).is_none() {
            return false;
        }
        for edges in self.adjacency.values_mut() {
            edges.retain(|e| e.to != *node);
        }
        if let Some(pos) = self.positions.remove(node) {
            if let Some(index) = &mut self.index {
                index.remove(node, pos);
            }
        }
        true
    }

    /// Add the directed edge `from -> to`, creating missing endpoints.
    pub fn add_edge(&mut self, from: N, to: N, cost: f32) -> Result<()> {
        if !(cost.is_finite() && cost >= 0.0) {
            return Err(PathError::InvalidCost(cost));
        }
        self.add_node(to.clone());
        self.adjacency
            .entry(from)
            .or_default()
            .push(Edge::new(to, cost));
        Ok(())
    }

    /// Add edges in both directions with the same cost.
    pub fn add_undirected_edge(&mut self, a: N, b: N, cost: f32) -> Result<()> {
        self.add_edge(a.clone(), b.clone(), cost)?;
        self.add_edge(b, a, cost)
    }

    /// Remove every directed edge `from -> to`.
    pub fn remove_edge(&mut self, from: &N, to: &N) -> bool {
        let Some(edges) = self.adjacency.get_mut(from) else {
            return false;
        };
        let before = edges.len();
        edges.retain(|e| e.to != *to);
        edges.len() != before
    }

    pub fn contains(&self, node: &N) -> bool {
        self.adjacency.contains_key(node)
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.adjacency.keys()
    }

    pub fn position(&self, node: &N) -> Option<Vec2> {
        self.positions.get(node).copied()
    }

    /// Straight-line distance between two positioned nodes.
    pub fn distance(&self, a: &N, b: &N) -> Option<f32> {
        Some(self.position(a)?.distance(self.position(b)?))
    }

    /// Euclidean heuristic over node positions. Unpositioned nodes estimate 0.
    ///
    /// Admissible as long as no edge is cheaper than the distance it spans.
    pub fn euclidean_heuristic(&self) -> HeuristicFn<impl Fn(&N, &N) -> f32 + '_> {
        HeuristicFn(move |a: &N, b: &N| self.distance(a, b).unwrap_or(0.0))
    }

    /// Nearest positioned node within `radius` of `pos`.
    ///
    /// Uses the spatial index when present, otherwise scans every node.
    pub fn nearest(&self, pos: Vec2, radius: f32) -> Option<N> {
        if let Some(index) = &self.index {
            return index.nearest(pos, radius);
        }
        if radius.is_nan() || radius < 0.0 {
            return None;
        }
        let r2 = radius * radius;
        self.positions
            .iter()
            .map(|(n, p)| (n, p.distance_squared(pos)))
            .filter(|&(_, d2)| d2 <= r2)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(n, _)| n.clone())
    }
}

impl<N: Node> Graph<N> for SparseGraph<N> {
    fn edges(&self, node: &N, buf: &mut Vec<Edge<N>>) {
        buf.clear();
        if let Some(edges) = self.adjacency.get(node) {
            buf.extend(edges.iter().cloned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_graph() -> SparseGraph<u32> {
        let mut g = SparseGraph::with_spatial_index(4.0).unwrap();
        for i in 0..5u32 {
            g.add_node_at(i, Vec2::new(i as f32 * 3.0, 0.0));
        }
        for i in 0..4u32 {
            g.add_undirected_edge(i, i + 1, 3.0).unwrap();
        }
        g
    }

    #[test]
    fn counts_and_edges() {
        let g = line_graph();
        assert_eq!(g.node_count(), 5);
        assert_eq!(g.edge_count(), 8);
        let mut buf = vec![Edge::new(99, 1.0)];
        g.edges(&2, &mut buf);
        let to: Vec<_> = buf.iter().map(|e| e.to).collect();
        assert_eq!(to, vec![1, 3]);
    }

    #[test]
    fn rejects_invalid_costs() {
        let mut g = SparseGraph::new();
        assert_eq!(g.add_edge(1, 2, -1.0), Err(PathError::InvalidCost(-1.0)));
        assert!(g.add_edge(1, 2, f32::INFINITY).is_err());
        assert!(g.add_edge(1, 2, f32::NAN).is_err());
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn remove_node_drops_incoming_edges() {
        let mut g = line_graph();
        assert!(g.remove_node(&2));
        assert!(!g.contains(&2));
        let mut buf = Vec::new();
        g.edges(&1, &mut buf);
        assert!(buf.iter().all(|e| e.to != 2));
        assert_eq!(g.nearest(Vec2::new(6.0, 0.0), 0.5), None);
        assert!(!g.remove_node(&2));
    }

    #[test]
    fn remove_edge_is_directed() {
        let mut g = line_graph();
        assert!(g.remove_edge(&0, &1));
        assert!(!g.remove_edge(&0, &1));
        let mut buf = Vec::new();
        g.edges(&1, &mut buf);
        assert!(buf.iter().any(|e| e.to == 0));
    }

    #[test]
    fn nearest_respects_radius() {
        let g = line_graph();
        assert_eq!(g.nearest(Vec2::new(5.0, 1.0), 2.0), Some(2));
        assert_eq!(g.nearest(Vec2::new(-1.0, 0.0), 2.0), Some(0));
        assert_eq!(g.nearest(Vec2::new(100.0, 100.0), 5.0), None);
    }

    #[test]
    fn nearest_without_index_matches_indexed() {
        let indexed = line_graph();
        let mut plain = SparseGraph::new();
        for i in 0..5u32 {
            plain.add_node_at(i, Vec2::new(i as f32 * 3.0, 0.0));
        }
        for x in [-2.0, 1.0, 4.0, 7.6, 11.0, 14.5] {
            let q = Vec2::new(x, 0.5);
            assert_eq!(indexed.nearest(q, 2.5), plain.nearest(q, 2.5));
        }
    }

    #[test]
    fn moving_a_node_updates_index() {
        let mut g = line_graph();
        g.add_node_at(4, Vec2::new(-10.0, -10.0));
        assert_eq!(g.nearest(Vec2::new(12.0, 0.0), 1.0), None);
        assert_eq!(g.nearest(Vec2::new(-10.0, -9.0), 1.5), Some(4));
    }

    #[test]
    fn unbounded_radius_finds_closest_node() {
        let mut g = SparseGraph::with_spatial_index(1.0).unwrap();
        g.add_node_at(1u32, Vec2::new(0.0, 0.0));
        g.add_node_at(2, Vec2::new(5000.0, -3000.0));
        assert_eq!(g.nearest(Vec2::new(0.5, 0.5), 20_000.0), Some(1));
        assert_eq!(g.nearest(Vec2::new(4000.0, -2000.0), f32::INFINITY), Some(2));
        assert_eq!(g.nearest(Vec2::new(0.0, 0.0), f32::MAX), Some(1));
        assert_eq!(g.nearest(Vec2::new(0.0, 0.0), -1.0), None);
    }

    #[test]
    fn wide_and_narrow_scans_agree_on_ties() {
        let mut index = SpatialHash::new(1.0).unwrap();
        // Enough occupied buckets that the 2.5 query probes its box directly.
        for i in 0..40u8 {
            index.insert(char::from(b'0' + i), Vec2::new(100.0 + f32::from(i), 100.0));
        }
        // Equidistant from the origin, in different buckets.
        index.insert('a', Vec2::new(2.0, 0.0));
        index.insert('b', Vec2::new(-2.0, 0.0));
        index.insert('c', Vec2::new(0.0, -2.0));
        let narrow = index.nearest(Vec2::ZERO, 2.5);
        assert_eq!(narrow, Some('c'));
        assert_eq!(index.nearest(Vec2::ZERO, f32::INFINITY), narrow);
    }

    #[test]
    fn spatial_hash_rejects_bad_cell_size() {
        assert!(SpatialHash::<u32>::new(0.0).is_err());
        assert!(SpatialHash::<u32>::new(f32::NAN).is_err());
    }
}
