//! D* Lite incremental replanning on a [`GridGraph`].
//!
//! The planner searches backward from the goal and keeps, for every cell,
//! `g` (settled cost-to-goal) and `rhs` (one-step lookahead: the cheapest
//! `edge cost + g(successor)`). A cell is *consistent* when `g == rhs`,
//! *overconsistent* when `g > rhs` and *underconsistent* when `g < rhs`.
//! After a terrain edit only the cells whose value actually changes are
//! re-expanded, so repairs touch a small wavefront around the edit.
//!
//! A session is bound to one `(start, goal, grid)` triple for its whole life
//! and owns the grid, so every edit goes through
//! [`update_obstacle`](DStarLite::update_obstacle) or
//! [`set_cost`](DStarLite::set_cost) and the node table cannot drift from the
//! terrain. A new start or goal needs a new session.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::{debug, trace};
use wayfind_core::Point;

use crate::error::{PathError, Result};
use crate::grid::{GridGraph, BLOCKED};
use crate::heuristic::Heuristic;
use crate::traits::{Edge, Graph};

/// Two-level priority `(min(g, rhs) + h(start, s), min(g, rhs))`.
#[derive(Debug, Clone, Copy)]
struct Key(f32, f32);

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0).then_with(|| self.1.total_cmp(&other.1))
    }
}

/// Queue entry; duplicates are allowed and filtered when they reach the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QueueEntry {
    key: Key,
    idx: usize,
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap.
        other.key.cmp(&self.key).then_with(|| other.idx.cmp(&self.idx))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    g: f32,
    rhs: f32,
}

impl Cell {
    const UNSEEN: Cell = Cell {
        g: f32::INFINITY,
        rhs: f32::INFINITY,
    };

    #[inline]
    fn is_consistent(self) -> bool {
        self.g == self.rhs
    }
}

/// Incremental planner session.
pub struct DStarLite<H> {
    grid: GridGraph,
    heuristic: H,
    start: Point,
    goal: Point,
    start_idx: usize,
    goal_idx: usize,
    cells: Vec<Cell>,
    open: BinaryHeap<QueueEntry>,
    edges: Vec<Edge<Point>>,
    adjacent: Vec<Point>,
    expanded: usize,
}

impl<H: Heuristic<Point>> DStarLite<H> {
    /// Bind a session to `grid`, `start` and `goal` and run the initial
    /// search.
    ///
    /// `heuristic` must be consistent for the grid's connectivity (e.g.
    /// [`Manhattan`](crate::Manhattan) for 4-connected grids,
    /// [`Octile`](crate::Octile) for 8-connected ones).
    pub fn new(grid: GridGraph, start: Point, goal: Point, heuristic: H) -> Result<Self> {
        let start_idx = grid.index(start).ok_or(PathError::OutOfBounds(start))?;
        let goal_idx = grid.index(goal).ok_or(PathError::OutOfBounds(goal))?;
        let mut cells = vec![Cell::UNSEEN; grid.len()];
        cells[goal_idx].rhs = 0.0;

        let mut session = Self {
            grid,
            heuristic,
            start,
            goal,
            start_idx,
            goal_idx,
            cells,
            open: BinaryHeap::new(),
            edges: Vec::with_capacity(8),
            adjacent: Vec::with_capacity(8),
            expanded: 0,
        };
        let key = session.key(goal_idx);
        session.open.push(QueueEntry { key, idx: goal_idx });
        session.compute_shortest_path();
        Ok(session)
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn goal(&self) -> Point {
        self.goal
    }

    /// Read access to the tracked terrain.
    pub fn grid(&self) -> &GridGraph {
        &self.grid
    }

    /// End the session and hand the terrain back.
    pub fn into_grid(self) -> GridGraph {
        self.grid
    }

    /// Cells expanded by the most recent
    /// [`compute_shortest_path`](Self::compute_shortest_path).
    pub fn last_expanded(&self) -> usize {
        self.expanded
    }

    /// Settled cost from `p` to the goal, if `p` is known to reach it.
    pub fn cost_to_goal(&self, p: Point) -> Option<f32> {
        let g = self.cells[self.grid.index(p)?].g;
        g.is_finite().then_some(g)
    }

    /// Block (`true`) or clear (`false`) a cell and repair the plan.
    pub fn update_obstacle(&mut self, p: Point, blocked: bool) -> Result<()> {
        self.set_cost(p, if blocked { BLOCKED } else { 0.0 })
    }

    /// Change the entry cost of a cell and repair the plan.
    pub fn set_cost(&mut self, p: Point, cost: f32) -> Result<()> {
        self.grid.set_cost(p, cost)?;
        // set_cost succeeded, so p is in bounds.
        let idx = self.grid.index(p).ok_or(PathError::OutOfBounds(p))?;

        self.update_node(idx);
        self.update_adjacent(p);
        self.compute_shortest_path();
        debug!(
            "d* lite: cell {} cost {} repaired with {} expansions",
            p, cost, self.expanded
        );
        Ok(())
    }

    /// Expand queued cells until the start is consistent and no queued key
    /// beats it.
    pub fn compute_shortest_path(&mut self) {
        self.expanded = 0;
        loop {
            self.drop_stale();
            let Some(top) = self.open.peek().copied() else {
                break;
            };
            let start = self.cells[self.start_idx];
            if top.key >= self.key(self.start_idx) && start.is_consistent() {
                break;
            }
            self.open.pop();
            self.expanded += 1;

            let u = top.idx;
            let cell = self.cells[u];
            if cell.g > cell.rhs {
                self.cells[u].g = cell.rhs;
            } else {
                self.cells[u].g = f32::INFINITY;
                self.update_node(u);
            }
            self.update_adjacent(self.grid.range().point_at(u));
        }
        trace!("d* lite: compute_shortest_path expanded {}", self.expanded);
    }

    /// Current route from start to goal, both inclusive.
    ///
    /// Walks greedily down the converged value function, at each step taking
    /// the successor minimizing `edge cost + g`. `None` if the walk reaches a
    /// cell with no finite successor.
    pub fn get_path(&mut self) -> Option<Vec<Point>> {
        if !self.cells[self.start_idx].g.is_finite() {
            return None;
        }
        let mut path = vec![self.start];
        let mut cur = self.start;
        let limit = self.grid.len();

        while cur != self.goal {
            if path.len() > limit {
                return None;
            }
            self.grid.edges(&cur, &mut self.edges);
            let mut best: Option<(Point, f32)> = None;
            for e in &self.edges {
                let Some(i) = self.grid.index(e.to) else {
                    continue;
                };
                let total = e.cost + self.cells[i].g;
                if total.is_finite() && best.is_none_or(|(_, b)| total < b) {
                    best = Some((e.to, total));
                }
            }
            let (next, _) = best?;
            path.push(next);
            cur = next;
        }
        Some(path)
    }

    fn key(&self, idx: usize) -> Key {
        let c = self.cells[idx];
        let m = c.g.min(c.rhs);
        let p = self.grid.range().point_at(idx);
        Key(m + self.heuristic.estimate(&self.start, &p), m)
    }

    /// Recompute `rhs` of a non-goal cell and queue it if inconsistent.
    fn update_node(&mut self, idx: usize) {
        if idx != self.goal_idx {
            let p = self.grid.range().point_at(idx);
            self.grid.edges(&p, &mut self.edges);
            let mut rhs = f32::INFINITY;
            for e in &self.edges {
                if let Some(i) = self.grid.index(e.to) {
                    rhs = rhs.min(e.cost + self.cells[i].g);
                }
            }
            self.cells[idx].rhs = rhs;
        }
        if !self.cells[idx].is_consistent() {
            let key = self.key(idx);
            self.open.push(QueueEntry { key, idx });
        }
    }

    /// Re-evaluate every in-bounds cell adjacent to `p`. On a grid these
    /// are exactly the cells that may have an edge into `p`.
    fn update_adjacent(&mut self, p: Point) {
        let mut adjacent = std::mem::take(&mut self.adjacent);
        adjacent.clear();
        adjacent.extend(self.grid.adjacent(p));
        for &n in &adjacent {
            if let Some(i) = self.grid.index(n) {
                self.update_node(i);
            }
        }
        self.adjacent = adjacent;
    }

    /// Pop queue tops that are consistent or carry an outdated key.
    fn drop_stale(&mut self) {
        while let Some(top) = self.open.peek().copied() {
            if self.cells[top.idx].is_consistent() || top.key != self.key(top.idx) {
                self.open.pop();
            } else {
                break;
            }
        }
    }
}
