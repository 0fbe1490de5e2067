//! Single-shot A* search.

use std::collections::BinaryHeap;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::frontier::{OpenEntry, PathNode};
use crate::heuristic::Heuristic;
use crate::modifier::{EdgeModifier, NoModifier};
use crate::trace::SearchTrace;
use crate::traits::{collect_edges, Edge, Graph, Node};

/// How the most recent search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchOutcome {
    /// No search has run yet.
    #[default]
    Idle,
    /// The goal was reached.
    Found,
    /// The open set emptied: the goal is unreachable.
    Exhausted,
    /// The expansion cap was hit before reaching the goal.
    BudgetExceeded,
}

#[derive(Debug, Clone)]
struct Record<N> {
    g: f32,
    h: f32,
    parent: Option<N>,
}

/// Reusable A* searcher.
///
/// Scratch buffers (open heap, node records, closed set, edge buffer, path
/// buffer) survive between calls and are cleared at the start of each one,
/// so a pooled instance allocates nothing after warm-up. No other state
/// carries over. Not reentrant: concurrent callers need their own instance.
///
/// The closed set is never reopened, which is only correct while every
/// effective edge cost is non-negative and stable for the duration of the
/// call.
#[derive(Debug)]
pub struct AStar<N: Node> {
    max_expand: Option<usize>,
    open: BinaryHeap<OpenEntry<N>>,
    records: FxHashMap<N, Record<N>>,
    closed: FxHashSet<N>,
    edges: Vec<Edge<N>>,
    path_buf: Vec<N>,
    seq: u64,
    expanded: usize,
    outcome: SearchOutcome,
}

impl<N: Node> Default for AStar<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Node> AStar<N> {
    /// Create a searcher with no expansion cap.
    pub fn new() -> Self {
        Self {
            max_expand: None,
            open: BinaryHeap::new(),
            records: FxHashMap::default(),
            closed: FxHashSet::default(),
            edges: Vec::new(),
            path_buf: Vec::new(),
            seq: 0,
            expanded: 0,
            outcome: SearchOutcome::Idle,
        }
    }

    /// Give up after expanding `max_expand` nodes.
    pub fn with_max_expand(mut self, max_expand: usize) -> Self {
        self.max_expand = Some(max_expand);
        self
    }

    pub fn set_max_expand(&mut self, max_expand: Option<usize>) {
        self.max_expand = max_expand;
    }

    pub fn max_expand(&self) -> Option<usize> {
        self.max_expand
    }

    /// Number of nodes expanded by the previous call.
    pub fn last_expanded(&self) -> usize {
        self.expanded
    }

    pub fn last_outcome(&self) -> SearchOutcome {
        self.outcome
    }

    /// Shortest path from `start` to `goal`, both inclusive.
    ///
    /// `None` means no route exists or the expansion cap was reached; check
    /// [`last_outcome`](Self::last_outcome) to tell them apart.
    pub fn find_path<G, H>(&mut self, graph: &G, heuristic: &H, start: N, goal: N) -> Option<Vec<N>>
    where
        G: Graph<N> + ?Sized,
        H: Heuristic<N> + ?Sized,
    {
        self.search(graph, heuristic, &NoModifier, start, goal, None)
    }

    /// [`find_path`](Self::find_path) with an edge modifier applied to every
    /// step.
    pub fn find_path_with<G, H, M>(
        &mut self,
        graph: &G,
        heuristic: &H,
        modifier: &M,
        start: N,
        goal: N,
    ) -> Option<Vec<N>>
    where
        G: Graph<N> + ?Sized,
        H: Heuristic<N> + ?Sized,
        M: EdgeModifier<N> + ?Sized,
    {
        self.search(graph, heuristic, modifier, start, goal, None)
    }

    /// Run a search and capture everything it did for inspection.
    pub fn trace<G, H, M>(
        &mut self,
        graph: &G,
        heuristic: &H,
        modifier: &M,
        start: N,
        goal: N,
    ) -> SearchTrace<N>
    where
        G: Graph<N> + ?Sized,
        H: Heuristic<N> + ?Sized,
        M: EdgeModifier<N> + ?Sized,
    {
        let mut expanded = Vec::new();
        let path = self.search(graph, heuristic, modifier, start, goal, Some(&mut expanded));
        let costs = self
            .records
            .iter()
            .map(|(n, r)| (n.clone(), r.g))
            .collect();
        SearchTrace::new(expanded, costs, path, self.outcome)
    }

    fn reset(&mut self) {
        self.open.clear();
        self.records.clear();
        self.closed.clear();
        self.seq = 0;
        self.expanded = 0;
    }

    fn search<G, H, M>(
        &mut self,
        graph: &G,
        heuristic: &H,
        modifier: &M,
        start: N,
        goal: N,
        mut trace: Option<&mut Vec<PathNode<N>>>,
    ) -> Option<Vec<N>>
    where
        G: Graph<N> + ?Sized,
        H: Heuristic<N> + ?Sized,
        M: EdgeModifier<N> + ?Sized,
    {
        self.reset();

        let h = heuristic.estimate(&start, &goal);
        self.records.insert(
            start.clone(),
            Record {
                g: 0.0,
                h,
                parent: None,
            },
        );
        self.open.push(OpenEntry {
            node: start,
            g: 0.0,
            f: h,
            h,
            seq: 0,
        });

        let mut edges = std::mem::take(&mut self.edges);

        let found = 'search: loop {
            let Some(current) = self.open.pop() else {
                break 'search false;
            };

            if self.closed.contains(&current.node) {
                continue;
            }
            // Skip stale entries superseded by a cheaper push.
            match self.records.get(&current.node) {
                Some(r) if current.g > r.g => continue,
                _ => {}
            }

            if current.node == goal {
                break 'search true;
            }

            if self.max_expand.is_some_and(|cap| self.expanded >= cap) {
                self.outcome = SearchOutcome::BudgetExceeded;
                self.edges = edges;
                return None;
            }

            self.expanded += 1;
            if let Some(t) = trace.as_deref_mut() {
                t.push(PathNode {
                    node: current.node.clone(),
                    cost: current.g,
                });
            }

            collect_edges(graph, modifier, &current.node, &mut edges);
            for e in edges.drain(..) {
                if self.closed.contains(&e.to) {
                    continue;
                }
                let tentative = current.g + e.cost;
                let h = match self.records.get_mut(&e.to) {
                    Some(r) if tentative >= r.g => continue,
                    Some(r) => {
                        r.g = tentative;
                        r.parent = Some(current.node.clone());
                        r.h
                    }
                    None => {
                        let h = heuristic.estimate(&e.to, &goal);
                        self.records.insert(
                            e.to.clone(),
                            Record {
                                g: tentative,
                                h,
                                parent: Some(current.node.clone()),
                            },
                        );
                        h
                    }
                };
                self.seq += 1;
                self.open.push(OpenEntry {
                    node: e.to,
                    g: tentative,
                    f: tentative + h,
                    h,
                    seq: self.seq,
                });
            }

            self.closed.insert(current.node);
        };

        self.edges = edges;

        if !found {
            self.outcome = SearchOutcome::Exhausted;
            return None;
        }
        self.outcome = SearchOutcome::Found;

        // Walk parent pointers goal -> start, then emit start -> goal.
        self.path_buf.clear();
        let mut cur = Some(goal);
        while let Some(n) = cur {
            cur = self.records.get(&n).and_then(|r| r.parent.clone());
            self.path_buf.push(n);
        }
        Some(self.path_buf.drain(..).rev().collect())
    }
}
