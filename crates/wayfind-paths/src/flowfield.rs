//! Flow fields: one backward sweep from a goal, shared by every agent
//! heading there.
//!
//! The sweep relaxes cells from a FIFO queue instead of a priority queue. A
//! cell is re-queued whenever it gets strictly cheaper, so the integration
//! field still settles at the true cost-to-goal; the FIFO order only means
//! some cells are visited more than once.

use std::collections::VecDeque;

use wayfind_core::{Point, Range, Vec2};

use crate::frontier::UNREACHABLE;
use crate::grid::GridGraph;
use crate::modifier::{EdgeModifier, NoModifier};
use crate::traits::{Edge, Graph};

/// Integration costs and flow directions toward a single goal.
#[derive(Debug, Clone, Default)]
pub struct FlowField {
    rng: Range,
    goal: Option<Point>,
    integration: Vec<f32>,
    steps: Vec<Point>,
    queued: Vec<bool>,
    queue: VecDeque<usize>,
    edges: Vec<Edge<Point>>,
    reached: usize,
}

impl FlowField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the field toward `goal` over `grid`.
    pub fn compute(&mut self, grid: &GridGraph, goal: Point) {
        self.compute_with(grid, &NoModifier, goal)
    }

    /// [`compute`](Self::compute) with an edge modifier applied to every
    /// `cell -> toward-goal` step.
    pub fn compute_with<M>(&mut self, grid: &GridGraph, modifier: &M, goal: Point)
    where
        M: EdgeModifier<Point> + ?Sized,
    {
        // Reset, reusing the buffers when the grid size is unchanged.
        self.rng = grid.range();
        let len = grid.len();
        self.integration.clear();
        self.integration.resize(len, UNREACHABLE);
        self.steps.clear();
        self.steps.resize(len, Point::ZERO);
        self.queued.clear();
        self.queued.resize(len, false);
        self.queue.clear();
        self.goal = Some(goal);
        self.reached = 0;

        let Some(gi) = grid.index(goal) else {
            return;
        };
        if !grid.is_walkable(goal) {
            return;
        }
        self.integration[gi] = 0.0;
        self.queue.push_back(gi);
        self.queued[gi] = true;

        let mut edges = std::mem::take(&mut self.edges);

        while let Some(ci) = self.queue.pop_front() {
            self.queued[ci] = false;
            let cp = self.rng.point_at(ci);
            let current = self.integration[ci];

            // Neighbours of `cp` are exactly the cells with an edge into it.
            grid.edges(&cp, &mut edges);
            for e in &edges {
                let n = e.to;
                let Some(mut cost) = grid.move_cost(n, cp) else {
                    continue;
                };
                if !modifier.modify_cost(&n, &cp, &mut cost) || !(cost.is_finite() && cost >= 0.0)
                {
                    continue;
                }
                let Some(ni) = self.rng.index_of(n) else {
                    continue;
                };
                let candidate = current + cost;
                if candidate < self.integration[ni] {
                    self.integration[ni] = candidate;
                    self.steps[ni] = cp - n;
                    if !self.queued[ni] {
                        self.queued[ni] = true;
                        self.queue.push_back(ni);
                    }
                }
            }
        }

        self.edges = edges;
        self.reached = self.integration.iter().filter(|c| c.is_finite()).count();
    }

    /// Goal of the last computation.
    pub fn goal(&self) -> Option<Point> {
        self.goal
    }

    /// Number of cells that can reach the goal.
    pub fn reached_count(&self) -> usize {
        self.reached
    }

    /// Cumulative cost from `p` to the goal; [`UNREACHABLE`] if none.
    pub fn integration(&self, p: Point) -> f32 {
        self.rng
            .index_of(p)
            .and_then(|i| self.integration.get(i).copied())
            .unwrap_or(UNREACHABLE)
    }

    /// Unit vector pointing from `p` toward its next cell on the way to the
    /// goal. Zero at the goal itself, `None` where the goal is unreachable.
    pub fn direction(&self, p: Point) -> Option<Vec2> {
        let i = self.reachable_index(p)?;
        Some(self.steps[i].to_vec2().normalize_or_zero())
    }

    /// The cell an agent at `p` should move to next.
    pub fn next_step(&self, p: Point) -> Option<Point> {
        let i = self.reachable_index(p)?;
        Some(p + self.steps[i])
    }

    /// Trace an agent from `start` to the goal by following the field.
    ///
    /// Gives up after `width * height` steps, which can only happen if ties
    /// produced a cycle.
    pub fn find_path(&self, start: Point) -> Option<Vec<Point>> {
        let goal = self.goal?;
        self.reachable_index(start)?;
        let limit = self.rng.len();
        let mut path = vec![start];
        let mut cur = start;
        while cur != goal {
            if path.len() > limit {
                return None;
            }
            let dir = self.direction(cur)?;
            let next = cur + dir.round_to_point();
            if next == cur {
                return None;
            }
            path.push(next);
            cur = next;
        }
        Some(path)
    }

    fn reachable_index(&self, p: Point) -> Option<usize> {
        let i = self.rng.index_of(p)?;
        self.integration
            .get(i)
            .is_some_and(|c| c.is_finite())
            .then_some(i)
    }
}
