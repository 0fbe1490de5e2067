//! Grid fixtures shared by the unit tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use wayfind_core::Point;

use crate::GridGraph;

/// `width x height` grid where each cell is a wall with probability
/// `density`. The same seed always yields the same grid.
pub(crate) fn random_grid(seed: u64, width: i32, height: i32, density: f64, diagonals: bool) -> GridGraph {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut grid = GridGraph::new(width, height)
        .unwrap()
        .with_diagonals(diagonals);
    for p in grid.range() {
        if rng.gen_bool(density) {
            grid.set_unwalkable(p).unwrap();
        }
    }
    grid
}

/// Open 4-connected grid split by a full-height wall at column `wall_x`.
pub(crate) fn walled_grid(width: i32, height: i32, wall_x: i32) -> GridGraph {
    let mut grid = GridGraph::new(width, height).unwrap();
    for y in 0..height {
        grid.set_unwalkable(Point::new(wall_x, y)).unwrap();
    }
    grid
}
