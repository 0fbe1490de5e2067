//! Debug snapshot of a single A* run.

use rustc_hash::FxHashMap;

use crate::astar::SearchOutcome;
use crate::frontier::PathNode;
use crate::traits::Node;

/// What a search did: the nodes it expanded in order, the best cost it
/// found for every node it touched, and how it ended.
///
/// Produced by [`AStar::trace`](crate::AStar::trace). Meant for tooling and
/// tests, not hot paths: building it allocates.
#[derive(Debug, Clone)]
pub struct SearchTrace<N: Node> {
    expanded: Vec<PathNode<N>>,
    costs: FxHashMap<N, f32>,
    path: Option<Vec<N>>,
    outcome: SearchOutcome,
}

impl<N: Node> SearchTrace<N> {
    pub(crate) fn new(
        expanded: Vec<PathNode<N>>,
        costs: FxHashMap<N, f32>,
        path: Option<Vec<N>>,
        outcome: SearchOutcome,
    ) -> Self {
        Self {
            expanded,
            costs,
            path,
            outcome,
        }
    }

    /// Expanded nodes in expansion order, with their cost from the start.
    pub fn expanded(&self) -> &[PathNode<N>] {
        &self.expanded
    }

    pub fn is_expanded(&self, node: &N) -> bool {
        self.expanded.iter().any(|pn| &pn.node == node)
    }

    /// Best known cost from the start to `node`, for any node that was
    /// generated (expanded or left on the frontier).
    pub fn cost(&self, node: &N) -> Option<f32> {
        self.costs.get(node).copied()
    }

    /// Number of nodes generated.
    pub fn generated(&self) -> usize {
        self.costs.len()
    }

    pub fn path(&self) -> Option<&[N]> {
        self.path.as_deref()
    }

    pub fn outcome(&self) -> SearchOutcome {
        self.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astar::AStar;
    use crate::heuristic::Manhattan;
    use crate::modifier::NoModifier;
    use crate::testutil::walled_grid;
    use wayfind_core::Point;

    #[test]
    fn failed_search_still_traces() {
        let grid = walled_grid(5, 3, 2);
        let start = Point::new(0, 0);
        let trace = AStar::new().trace(&grid, &Manhattan, &NoModifier, start, Point::new(4, 0));
        assert_eq!(trace.path(), None);
        assert_eq!(trace.outcome(), SearchOutcome::Exhausted);
        // Everything left of the wall gets expanded.
        assert_eq!(trace.expanded().len(), 6);
        assert!(trace.is_expanded(&Point::new(1, 2)));
        assert!(!trace.is_expanded(&Point::new(3, 0)));
        assert_eq!(trace.cost(&Point::new(1, 2)), Some(3.0));
        assert_eq!(trace.generated(), 6);
    }

    #[test]
    fn budget_shows_in_trace() {
        let grid = walled_grid(8, 8, 7);
        let mut astar = AStar::new().with_max_expand(3);
        let trace = astar.trace(&grid, &Manhattan, &NoModifier, Point::new(0, 0), Point::new(6, 6));
        assert_eq!(trace.outcome(), SearchOutcome::BudgetExceeded);
        assert_eq!(trace.expanded().len(), 3);
        assert_eq!(trace.expanded()[0].cost, 0.0);
    }
}
