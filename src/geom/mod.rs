//!
//! Geometric primitives the simulation is built from: points, line
//! segments and triangular cells, together with the tolerance-aware
//! containment and intersection predicates the cell mesh relies on.
//!

pub mod line;
pub mod point;
pub mod tri;

pub use self::line::Line;
pub use self::point::Point;
pub use self::tri::Triangle;

use std::error;
use std::f64::EPSILON;
use std::fmt;

/// Tolerance used by every geometric comparison. Coordinates are only
/// trusted up to this distance.
pub const GEOEPS: f64 = EPSILON * 1e9;

/// Relative comparison of two scalars, scaled by the larger magnitude.
pub fn approx_equal(a: f64, b: f64) -> bool {
    let scale = if a.abs() < b.abs() { b.abs() } else { a.abs() };
    (a - b).abs() <= scale * GEOEPS
}

#[derive(Debug, Clone)]
pub enum ShapeError {
    /// A line segment needs two distinct endpoints.
    DegenerateLine(Point, Point),
    /// The three points are collinear or not pairwise distinct.
    DegenerateTriangle(Point, Point, Point),
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ShapeError::DegenerateLine(ref p1, ref p2) => {
                write!(f, "cannot create a line using 2 identical points -> {} {}", p1, p2)
            }
            ShapeError::DegenerateTriangle(ref p1, ref p2, ref p3) => {
                write!(f, "these 3 points do not allow for a valid triangle -> {} {} {}", p1, p2, p3)
            }
        }
    }
}

impl error::Error for ShapeError {}
