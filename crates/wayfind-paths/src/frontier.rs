use std::cmp::Ordering;

/// A node with an associated cumulative cost, as reported by Dijkstra
/// expansion and search traces.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathNode<N> {
    pub node: N,
    pub cost: f32,
}

/// Sentinel cost meaning "not reached".
pub const UNREACHABLE: f32 = f32::INFINITY;

// ---------------------------------------------------------------------------
// Priority-queue entry for A*/Dijkstra searches
// ---------------------------------------------------------------------------

/// Open-list entry ordered for `BinaryHeap` (a max-heap) so that the entry
/// with the smallest `f` pops first; ties prefer smaller `h`, then earlier
/// insertion.
///
/// Nodes are re-pushed instead of decreased in place, so a popped entry may
/// be stale. Callers must compare `g` against their authoritative cost table
/// before trusting it.
#[derive(Debug, Clone)]
pub(crate) struct OpenEntry<N> {
    pub(crate) node: N,
    pub(crate) g: f32,
    pub(crate) f: f32,
    pub(crate) h: f32,
    pub(crate) seq: u64,
}

impl<N> PartialEq for OpenEntry<N> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<N> Eq for OpenEntry<N> {}

impl<N> PartialOrd for OpenEntry<N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<N> Ord for OpenEntry<N> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap.
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.h.total_cmp(&self.h))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    fn entry(node: u8, f: f32, h: f32, seq: u64) -> OpenEntry<u8> {
        OpenEntry {
            node,
            g: f - h,
            f,
            h,
            seq,
        }
    }

    #[test]
    fn pops_lowest_f_then_lowest_h_then_fifo() {
        let mut heap = BinaryHeap::new();
        heap.push(entry(0, 5.0, 1.0, 0));
        heap.push(entry(1, 3.0, 2.0, 1));
        heap.push(entry(2, 3.0, 1.0, 2));
        heap.push(entry(3, 3.0, 1.0, 3));
        heap.push(entry(4, 4.0, 0.0, 4));

        let order: Vec<_> = std::iter::from_fn(|| heap.pop().map(|e| e.node)).collect();
        assert_eq!(order, vec![2, 3, 1, 4, 0]);
    }
}

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;
    use crate::traits::Edge;
    use wayfind_core::Point;

    #[test]
    fn pathnode_round_trip() {
        let node = PathNode {
            node: Point::new(3, 7),
            cost: 4.5,
        };
        let json = serde_json::to_string(&node).unwrap();
        let back: PathNode<Point> = serde_json::from_str(&json).unwrap();
        assert_eq!(node, back);
    }

    #[test]
    fn edge_round_trip() {
        let edge = Edge::new("gate".to_string(), 2.0);
        let json = serde_json::to_string(&edge).unwrap();
        let back: Edge<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(edge, back);
    }
}
