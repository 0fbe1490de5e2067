//! Line-of-sight waypoint reduction.

use wayfind_core::Point;

use crate::traits::LineOfSight;

/// Reduce `path` to the waypoints an agent actually has to turn at.
///
/// Greedy farthest-visible vertex: from the current anchor, scan backward
/// from the end of the path and keep the first vertex with a clear line of
/// sight back to the anchor, then continue from there. Endpoints are always
/// kept and the result is never longer than the input. Paths of two or
/// fewer nodes are returned as-is.
pub fn smooth_path<L: LineOfSight + ?Sized>(los: &L, path: &[Point]) -> Vec<Point> {
    if path.len() <= 2 {
        return path.to_vec();
    }
    let last = path.len() - 1;
    let mut out = Vec::with_capacity(path.len());
    out.push(path[0]);

    let mut anchor = 0;
    while anchor < last {
        // The adjacent vertex is always reachable: it is the raw path's own step.
        let next = (anchor + 2..=last)
            .rev()
            .find(|&i| los.line_of_sight(path[anchor], path[i]))
            .unwrap_or(anchor + 1);
        out.push(path[next]);
        anchor = next;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astar::AStar;
    use crate::heuristic::{Manhattan, Octile};
    use crate::testutil::random_grid;
    use crate::GridGraph;

    fn p(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn short_paths_untouched() {
        let grid = GridGraph::new(3, 3).unwrap();
        assert!(smooth_path(&grid, &[]).is_empty());
        assert_eq!(smooth_path(&grid, &[p(0, 0)]), vec![p(0, 0)]);
        assert_eq!(
            smooth_path(&grid, &[p(0, 0), p(1, 0)]),
            vec![p(0, 0), p(1, 0)]
        );
    }

    #[test]
    fn open_grid_collapses_to_endpoints() {
        let grid = GridGraph::new(6, 6).unwrap();
        let raw = AStar::new()
            .find_path(&grid, &Manhattan, p(0, 0), p(5, 3))
            .unwrap();
        assert_eq!(raw.len(), 9);
        assert_eq!(smooth_path(&grid, &raw), vec![p(0, 0), p(5, 3)]);
    }

    #[test]
    fn keeps_corner_around_wall() {
        let grid = GridGraph::from_walkable(&[
            [0, 0, 0, 0],
            [1, 1, 1, 0],
            [0, 0, 0, 0],
        ])
        .unwrap();
        let raw = AStar::new()
            .find_path(&grid, &Manhattan, p(0, 0), p(0, 2))
            .unwrap();
        let smooth = smooth_path(&grid, &raw);
        assert_eq!(smooth.first(), Some(&p(0, 0)));
        assert_eq!(smooth.last(), Some(&p(0, 2)));
        assert!(smooth.len() >= 3);
        assert!(smooth.len() < raw.len());
        for w in smooth.windows(2) {
            assert!(grid.line_of_sight(w[0], w[1]));
        }
    }

    #[test]
    fn never_longer_and_keeps_endpoints() {
        let mut astar = AStar::new();
        for seed in 0..30 {
            let grid = random_grid(seed, 15, 15, 0.25, seed % 3 == 0);
            let Some(raw) = astar.find_path(&grid, &Octile, p(0, 0), p(14, 14)) else {
                continue;
            };
            let smooth = smooth_path(&grid, &raw);
            assert_eq!(smooth.first(), raw.first());
            assert_eq!(smooth.last(), raw.last());
            assert!(smooth.len() <= raw.len());
            // Waypoints are a subsequence of the raw path.
            let mut it = raw.iter();
            assert!(smooth.iter().all(|w| it.any(|r| r == w)));
        }
    }
}
