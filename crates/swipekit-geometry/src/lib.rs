//! Geometric value types shared across swipekit: points, sizes, and
//! limit rectangles.

pub mod geometry;

pub use geometry::{Point, Rect, Size};
