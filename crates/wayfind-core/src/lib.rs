//! Geometry primitives for the wayfind pathfinding toolkit.
//!
//! Grid coordinates ([`Point`]), rectangular grid extents ([`Range`]) and
//! continuous vectors ([`Vec2`]) shared by every search algorithm and by the
//! host application that feeds them.

pub mod geom;

pub use geom::{Point, Range, RangeIter, Vec2};
