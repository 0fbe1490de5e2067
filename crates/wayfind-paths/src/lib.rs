//! Graph search for games: pluggable graphs, heuristics and edge modifiers,
//! plus the search algorithms that run over them.
//!
//! - **A\*** single-shot optimal search ([`AStar`])
//! - **Dijkstra** uniform-cost expansion and nearest-target queries ([`Dijkstra`])
//! - **D\* Lite** incremental replanning on a changing grid ([`DStarLite`])
//! - **Flow fields** one goal, many agents ([`FlowField`])
//! - **Smoothing** line-of-sight waypoint reduction ([`smooth_path`])
//! - **Caching** bounded LRU of finished paths ([`PathCache`])
//! - **Scheduling** per-frame budgeted request queue ([`PathScheduler`])
//!
//! The searchers own reusable scratch buffers, so a pooled instance stops
//! allocating after warm-up. They are not reentrant: give each concurrent
//! caller its own instance.
//!
//! # Extension points
//!
//! | Trait | Supplies |
//! |---|---|
//! | [`Graph`] | outgoing edges of a node |
//! | [`Heuristic`] | admissible cost-to-goal estimate |
//! | [`EdgeModifier`] | per-query cost changes, blocked edges, extra edges |
//! | [`LineOfSight`] | visibility tests for [`smooth_path`] |
//!
//! Two graphs ship with the crate: [`GridGraph`], a dense 4/8-connected cost
//! grid, and [`SparseGraph`], an adjacency list with optional positions.
//!
//! No search ever fails with an error. An unreachable goal or an exhausted
//! budget is reported as `None`; [`PathError`] is reserved for invalid
//! construction arguments.

mod astar;
mod cache;
mod dijkstra;
mod dstar;
mod error;
mod flowfield;
mod frontier;
mod grid;
mod heuristic;
mod modifier;
mod scheduler;
mod smooth;
mod sparse;
mod trace;
mod traits;

#[cfg(test)]
mod testutil;

pub use astar::{AStar, SearchOutcome};
pub use cache::PathCache;
pub use dijkstra::Dijkstra;
pub use dstar::DStarLite;
pub use error::{PathError, Result};
pub use flowfield::FlowField;
pub use frontier::{PathNode, UNREACHABLE};
pub use grid::{GridGraph, BLOCKED};
pub use heuristic::{
    chebyshev, euclidean, manhattan, octile, Chebyshev, Euclidean, Heuristic, HeuristicFn,
    Manhattan, Octile, Zero,
};
pub use modifier::{
    Composite, CostOverlay, EdgeModifier, ExcludeEdges, ExcludeNodes, NoModifier, Portals,
};
pub use scheduler::{PathCompleted, PathScheduler, PendingPath, RequestId, SchedulerConfig};
pub use smooth::smooth_path;
pub use sparse::{SparseGraph, SpatialHash};
pub use trace::SearchTrace;
pub use traits::{collect_edges, path_cost, Edge, Graph, LineOfSight, Node};
