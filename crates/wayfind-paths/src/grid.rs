//! Uniform-grid graph with per-cell float costs.
//!
//! Every cell stores an extra entry cost: `0.0` is free terrain, larger
//! values are slower terrain and `f32::INFINITY` is a wall. Moving into a
//! cardinal neighbour costs `1 + cost(target)`; moving diagonally costs
//! `√2 + cost(target)`.

use std::f32::consts::SQRT_2;

use wayfind_core::{Point, Range};

use crate::error::{PathError, Result};
use crate::traits::{Edge, Graph, LineOfSight};

/// Cost value marking an unwalkable cell.
pub const BLOCKED: f32 = f32::INFINITY;

/// A 4- or 8-connected grid over `[0, width) x [0, height)`.
#[derive(Debug, Clone, PartialEq)]
pub struct GridGraph {
    rng: Range,
    costs: Vec<f32>,
    diagonals: bool,
    corner_cutting: bool,
}

impl GridGraph {
    /// Create an all-free, 4-connected grid.
    pub fn new(width: i32, height: i32) -> Result<Self> {
        check_dimensions(width, height)?;
        let len = (width as usize) * (height as usize);
        Ok(Self {
            rng: Range::sized(width, height),
            costs: vec![0.0; len],
            diagonals: false,
            corner_cutting: true,
        })
    }

    /// Create a grid from a row-major cost buffer of `width * height` cells.
    ///
    /// NaN and negative costs are rejected.
    pub fn from_costs(width: i32, height: i32, costs: Vec<f32>) -> Result<Self> {
        check_dimensions(width, height)?;
        let expected = (width as usize) * (height as usize);
        if costs.len() != expected {
            return Err(PathError::CostLengthMismatch {
                width,
                height,
                expected,
                actual: costs.len(),
            });
        }
        if let Some(&bad) = costs.iter().find(|c| !is_valid_cell_cost(**c)) {
            return Err(PathError::InvalidCost(bad));
        }
        Ok(Self {
            rng: Range::sized(width, height),
            costs,
            diagonals: false,
            corner_cutting: true,
        })
    }

    /// Create a grid from the legacy 0/1 form: `rows[y][x] == 0` is free,
    /// anything else is a wall.
    pub fn from_walkable<R: AsRef<[i32]>>(rows: &[R]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.as_ref().len());
        check_dimensions(width as i32, height as i32)?;
        let mut costs = Vec::with_capacity(width * height);
        for (row, cells) in rows.iter().enumerate() {
            let cells = cells.as_ref();
            if cells.len() != width {
                return Err(PathError::RaggedRow {
                    row,
                    expected: width,
                    actual: cells.len(),
                });
            }
            costs.extend(cells.iter().map(|&c| if c == 0 { 0.0 } else { BLOCKED }));
        }
        Self::from_costs(width as i32, height as i32, costs)
    }

    /// Enable or disable the four diagonal moves.
    pub fn with_diagonals(mut self, diagonals: bool) -> Self {
        self.diagonals = diagonals;
        self
    }

    /// Whether a diagonal move may squeeze past a blocked orthogonal cell.
    pub fn with_corner_cutting(mut self, corner_cutting: bool) -> Self {
        self.corner_cutting = corner_cutting;
        self
    }

    pub fn set_diagonals(&mut self, diagonals: bool) {
        self.diagonals = diagonals;
    }

    #[inline]
    pub fn diagonals(&self) -> bool {
        self.diagonals
    }

    #[inline]
    pub fn corner_cutting(&self) -> bool {
        self.corner_cutting
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.rng.width()
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.rng.height()
    }

    /// The grid rectangle.
    #[inline]
    pub fn range(&self) -> Range {
        self.rng
    }

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.costs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }

    #[inline]
    pub fn in_bounds(&self, p: Point) -> bool {
        p.in_range(&self.rng)
    }

    /// Flat index of `p`, if inside.
    #[inline]
    pub fn index(&self, p: Point) -> Option<usize> {
        self.rng.index_of(p)
    }

    /// Entry cost of `p`; [`BLOCKED`] outside the grid.
    #[inline]
    pub fn cost(&self, p: Point) -> f32 {
        self.index(p).map_or(BLOCKED, |i| self.costs[i])
    }

    /// Whether `p` is inside the grid and not blocked.
    #[inline]
    pub fn is_walkable(&self, p: Point) -> bool {
        self.cost(p).is_finite()
    }

    /// Overwrite the entry cost of `p`. `BLOCKED` makes it a wall.
    pub fn set_cost(&mut self, p: Point, cost: f32) -> Result<()> {
        if !is_valid_cell_cost(cost) {
            return Err(PathError::InvalidCost(cost));
        }
        let i = self.index(p).ok_or(PathError::OutOfBounds(p))?;
        self.costs[i] = cost;
        Ok(())
    }

    /// Make `p` free terrain (cost 0).
    pub fn set_walkable(&mut self, p: Point) -> Result<()> {
        self.set_cost(p, 0.0)
    }

    /// Make `p` a wall.
    pub fn set_unwalkable(&mut self, p: Point) -> Result<()> {
        self.set_cost(p, BLOCKED)
    }

    /// Cost of the single step `from -> to`, or `None` if it is not an edge.
    pub fn move_cost(&self, from: Point, to: Point) -> Option<f32> {
        self.step_cost(from, to, self.diagonals)
    }

    /// Like [`Graph::edges`] but with an explicit connectivity choice.
    pub fn edges_with(&self, p: Point, diagonals: bool, buf: &mut Vec<Edge<Point>>) {
        buf.clear();
        if !self.is_walkable(p) {
            return;
        }
        for d in Point::CARDINALS {
            let n = p + d;
            let c = self.cost(n);
            if c.is_finite() {
                buf.push(Edge::new(n, 1.0 + c));
            }
        }
        if !diagonals {
            return;
        }
        for d in Point::DIAGONALS {
            let n = p + d;
            let c = self.cost(n);
            if c.is_finite() && self.diagonal_clear(p, d) {
                buf.push(Edge::new(n, SQRT_2 + c));
            }
        }
    }

    /// In-bounds cells adjacent to `p` under the grid's connectivity,
    /// walkable or not.
    pub(crate) fn adjacent(&self, p: Point) -> impl Iterator<Item = Point> + '_ {
        let count = if self.diagonals { 8 } else { 4 };
        p.neighbors_8()
            .into_iter()
            .take(count)
            .filter(move |&n| self.in_bounds(n))
    }

    fn step_cost(&self, from: Point, to: Point, diagonals: bool) -> Option<f32> {
        let d = to - from;
        if d == Point::ZERO || d.x.abs() > 1 || d.y.abs() > 1 {
            return None;
        }
        if !self.is_walkable(from) || !self.is_walkable(to) {
            return None;
        }
        if d.is_diagonal() {
            if !diagonals || !self.diagonal_clear(from, d) {
                return None;
            }
            Some(SQRT_2 + self.cost(to))
        } else {
            Some(1.0 + self.cost(to))
        }
    }

    #[inline]
    fn diagonal_clear(&self, p: Point, d: Point) -> bool {
        self.corner_cutting
            || (self.is_walkable(p.shift(d.x, 0)) && self.is_walkable(p.shift(0, d.y)))
    }
}

impl Graph<Point> for GridGraph {
    fn edges(&self, node: &Point, buf: &mut Vec<Edge<Point>>) {
        self.edges_with(*node, self.diagonals, buf)
    }

    fn is_traversable(&self, node: &Point) -> bool {
        self.is_walkable(*node)
    }
}

impl LineOfSight for GridGraph {
    /// Bresenham walk from `from` to `to`, both inclusive. Diagonal steps
    /// respect the corner-cutting setting.
    fn line_of_sight(&self, from: Point, to: Point) -> bool {
        if !self.is_walkable(from) {
            return false;
        }
        let dx = (to.x - from.x).abs();
        let dy = -(to.y - from.y).abs();
        let sx = (to.x - from.x).signum();
        let sy = (to.y - from.y).signum();
        let mut err = dx + dy;
        let mut cur = from;

        while cur != to {
            let e2 = 2 * err;
            let mut step = Point::ZERO;
            if e2 >= dy {
                err += dy;
                step.x = sx;
            }
            if e2 <= dx {
                err += dx;
                step.y = sy;
            }
            if step.is_diagonal() && !self.diagonal_clear(cur, step) {
                return false;
            }
            cur = cur + step;
            if !self.is_walkable(cur) {
                return false;
            }
        }
        true
    }
}

fn check_dimensions(width: i32, height: i32) -> Result<()> {
    if width <= 0 || height <= 0 {
        return Err(PathError::InvalidDimensions { width, height });
    }
    Ok(())
}

#[inline]
fn is_valid_cell_cost(c: f32) -> bool {
    !c.is_nan() && c >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(grid: &GridGraph, p: Point) -> Vec<(Point, f32)> {
        let mut buf = Vec::new();
        grid.edges(&p, &mut buf);
        buf.iter().map(|e| (e.to, e.cost)).collect()
    }

    #[test]
    fn rejects_bad_dimensions() {
        assert_eq!(
            GridGraph::new(0, 3),
            Err(PathError::InvalidDimensions {
                width: 0,
                height: 3
            })
        );
        assert!(GridGraph::new(-1, -1).is_err());
        assert!(matches!(
            GridGraph::from_costs(2, 2, vec![0.0; 3]),
            Err(PathError::CostLengthMismatch { expected: 4, .. })
        ));
        assert!(matches!(
            GridGraph::from_walkable(&[vec![0, 0], vec![0]]),
            Err(PathError::RaggedRow { row: 1, .. })
        ));
        let empty: [Vec<i32>; 0] = [];
        assert!(GridGraph::from_walkable(&empty).is_err());
    }

    #[test]
    fn out_of_bounds_is_blocked() {
        let g = GridGraph::new(3, 3).unwrap();
        assert_eq!(g.cost(Point::new(-1, 0)), BLOCKED);
        assert!(!g.is_walkable(Point::new(3, 0)));
        assert!(g.is_walkable(Point::new(2, 2)));
    }

    #[test]
    fn corner_cell_has_two_cardinal_edges() {
        let g = GridGraph::new(3, 3).unwrap();
        let e = targets(&g, Point::new(0, 0));
        assert_eq!(e.len(), 2);
        assert!(e.iter().all(|&(_, c)| c == 1.0));
    }

    #[test]
    fn diagonal_edges_cost_sqrt2_plus_target() {
        let mut g = GridGraph::new(3, 3).unwrap().with_diagonals(true);
        g.set_cost(Point::new(1, 1), 2.0).unwrap();
        let e = targets(&g, Point::new(0, 0));
        assert_eq!(e.len(), 3);
        let diag = e.iter().find(|(p, _)| *p == Point::new(1, 1)).unwrap();
        assert!((diag.1 - (SQRT_2 + 2.0)).abs() < 1e-6);
    }

    #[test]
    fn never_enumerates_walls() {
        let g = GridGraph::from_walkable(&[[0, 1, 0], [1, 0, 0], [0, 0, 0]])
            .unwrap()
            .with_diagonals(true);
        let e = targets(&g, Point::new(0, 0));
        assert_eq!(e, vec![(Point::new(1, 1), SQRT_2)]);
        assert!(targets(&g, Point::new(1, 0)).is_empty());
    }

    #[test]
    fn adjacent_follows_connectivity() {
        let mut g = GridGraph::new(3, 3).unwrap();
        g.set_unwalkable(Point::new(1, 0)).unwrap();
        let four: Vec<_> = g.adjacent(Point::new(0, 0)).collect();
        // Walls are included; out-of-bounds cells are not.
        assert_eq!(four, vec![Point::new(1, 0), Point::new(0, 1)]);

        g.set_diagonals(true);
        assert_eq!(g.adjacent(Point::new(1, 1)).count(), 8);
        assert_eq!(g.adjacent(Point::new(2, 2)).count(), 3);
        assert!(!g.in_bounds(Point::new(3, 0)));
    }

    #[test]
    fn corner_cutting_disabled() {
        let g = GridGraph::from_walkable(&[[0, 1], [0, 0]])
            .unwrap()
            .with_diagonals(true)
            .with_corner_cutting(false);
        assert_eq!(g.move_cost(Point::new(0, 0), Point::new(1, 1)), None);
        assert_eq!(g.move_cost(Point::new(0, 0), Point::new(0, 1)), Some(1.0));
    }

    #[test]
    fn set_cost_validation() {
        let mut g = GridGraph::new(2, 2).unwrap();
        assert_eq!(
            g.set_cost(Point::new(5, 5), 1.0),
            Err(PathError::OutOfBounds(Point::new(5, 5)))
        );
        assert!(g.set_cost(Point::new(0, 0), -1.0).is_err());
        assert!(g.set_cost(Point::new(0, 0), f32::NAN).is_err());
        g.set_unwalkable(Point::new(1, 1)).unwrap();
        assert!(!g.is_walkable(Point::new(1, 1)));
        g.set_walkable(Point::new(1, 1)).unwrap();
        assert_eq!(g.cost(Point::new(1, 1)), 0.0);
    }

    #[test]
    fn line_of_sight_blocked_by_wall() {
        let g = GridGraph::from_walkable(&[
            [0, 0, 0, 0, 0],
            [0, 0, 1, 0, 0],
            [0, 0, 0, 0, 0],
        ])
        .unwrap();
        assert!(g.line_of_sight(Point::new(0, 0), Point::new(4, 0)));
        assert!(!g.line_of_sight(Point::new(0, 1), Point::new(4, 1)));
        assert!(g.line_of_sight(Point::new(0, 2), Point::new(4, 2)));
        assert!(g.line_of_sight(Point::new(3, 2), Point::new(3, 2)));
    }
}
