//! Remaining-cost estimators.
//!
//! A heuristic must return 0 for `from == to` and should never overestimate
//! the true cost (admissibility) if A* is expected to return optimal paths.
//! The engine does not check either property.

use std::f32::consts::SQRT_2;
use std::rc::Rc;

use wayfind_core::{Point, Vec2};

/// Estimate of the remaining cost between two nodes.
pub trait Heuristic<N> {
    fn estimate(&self, from: &N, to: &N) -> f32;
}

impl<N, H: Heuristic<N> + ?Sized> Heuristic<N> for &H {
    fn estimate(&self, from: &N, to: &N) -> f32 {
        (**self).estimate(from, to)
    }
}

impl<N, H: Heuristic<N> + ?Sized> Heuristic<N> for Box<H> {
    fn estimate(&self, from: &N, to: &N) -> f32 {
        (**self).estimate(from, to)
    }
}

impl<N, H: Heuristic<N> + ?Sized> Heuristic<N> for Rc<H> {
    fn estimate(&self, from: &N, to: &N) -> f32 {
        (**self).estimate(from, to)
    }
}

/// Manhattan (L1) distance between two points.
#[inline]
pub fn manhattan(a: Point, b: Point) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

/// Chebyshev (L∞) distance between two points.
#[inline]
pub fn chebyshev(a: Point, b: Point) -> i32 {
    (a.x - b.x).abs().max((a.y - b.y).abs())
}

/// Octile distance: cheapest 8-connected route when diagonals cost √2.
#[inline]
pub fn octile(a: Point, b: Point) -> f32 {
    let dx = (a.x - b.x).abs() as f32;
    let dy = (a.y - b.y).abs() as f32;
    dx.max(dy) + (SQRT_2 - 1.0) * dx.min(dy)
}

/// Euclidean (L2) distance between two points.
#[inline]
pub fn euclidean(a: Point, b: Point) -> f32 {
    a.to_vec2().distance(b.to_vec2())
}

/// Admissible on 4-connected grids with unit base step cost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Manhattan;

impl Heuristic<Point> for Manhattan {
    #[inline]
    fn estimate(&self, from: &Point, to: &Point) -> f32 {
        manhattan(*from, *to) as f32
    }
}

/// Straight-line distance. Admissible on any grid whose steps cost at least
/// their geometric length; also works for world-space [`Vec2`] nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Euclidean;

impl Heuristic<Point> for Euclidean {
    #[inline]
    fn estimate(&self, from: &Point, to: &Point) -> f32 {
        euclidean(*from, *to)
    }
}

impl Heuristic<Vec2> for Euclidean {
    #[inline]
    fn estimate(&self, from: &Vec2, to: &Vec2) -> f32 {
        from.distance(*to)
    }
}

/// Tight admissible estimate for 8-connected grids with √2 diagonals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Octile;

impl Heuristic<Point> for Octile {
    #[inline]
    fn estimate(&self, from: &Point, to: &Point) -> f32 {
        octile(*from, *to)
    }
}

/// Admissible on 8-connected grids where diagonals cost the same as
/// cardinal steps; an underestimate when they cost √2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Chebyshev;

impl Heuristic<Point> for Chebyshev {
    #[inline]
    fn estimate(&self, from: &Point, to: &Point) -> f32 {
        chebyshev(*from, *to) as f32
    }
}

/// Always zero. Turns A* into uniform-cost search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Zero;

impl<N> Heuristic<N> for Zero {
    #[inline]
    fn estimate(&self, _from: &N, _to: &N) -> f32 {
        0.0
    }
}

/// Delegate heuristic wrapping any `Fn(&N, &N) -> f32`.
///
/// ```ignore
/// let positions = graph.clone();
/// let h = HeuristicFn(move |a: &u32, b: &u32| positions.distance(*a, *b));
/// ```
#[derive(Clone, Copy)]
pub struct HeuristicFn<F>(pub F);

impl<N, F: Fn(&N, &N) -> f32> Heuristic<N> for HeuristicFn<F> {
    #[inline]
    fn estimate(&self, from: &N, to: &N) -> f32 {
        (self.0)(from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_at_goal() {
        let p = Point::new(4, -2);
        assert_eq!(Manhattan.estimate(&p, &p), 0.0);
        assert_eq!(Euclidean.estimate(&p, &p), 0.0);
        assert_eq!(Octile.estimate(&p, &p), 0.0);
        assert_eq!(Chebyshev.estimate(&p, &p), 0.0);
        assert_eq!(Zero.estimate(&p, &p), 0.0);
    }

    #[test]
    fn closed_forms() {
        let a = Point::new(0, 0);
        let b = Point::new(3, 4);
        assert_eq!(Manhattan.estimate(&a, &b), 7.0);
        assert_eq!(Euclidean.estimate(&a, &b), 5.0);
        assert_eq!(Chebyshev.estimate(&a, &b), 4.0);
        assert!((Octile.estimate(&a, &b) - (4.0 + 3.0 * (SQRT_2 - 1.0))).abs() < 1e-5);
    }

    #[test]
    fn ordering_between_metrics() {
        let a = Point::new(1, 1);
        let b = Point::new(8, 3);
        let c = Chebyshev.estimate(&a, &b);
        let o = Octile.estimate(&a, &b);
        let m = Manhattan.estimate(&a, &b);
        assert!(c <= o && o <= m);
    }

    #[test]
    fn delegate_and_dyn() {
        let h = HeuristicFn(|a: &i32, b: &i32| (a - b).abs() as f32 * 0.5);
        assert_eq!(h.estimate(&10, &4), 3.0);

        let boxed: Box<dyn Heuristic<Point>> = Box::new(Manhattan);
        assert_eq!(boxed.estimate(&Point::new(0, 0), &Point::new(2, 2)), 4.0);
    }
}
