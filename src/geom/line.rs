use super::point::{cross, Point};
use super::{approx_equal, ShapeError, GEOEPS};
use ::cgmath::Vector2;
use std::fmt;

/// A line segment between two distinct points. Slope, intercept,
/// bounding box and length are cached at construction.
#[derive(Debug, Clone)]
pub struct Line {
    pub p1: Point,
    pub p2: Point,
    /// 0 for vertical lines, by convention.
    pub slope: f64,
    pub intercept: f64,
    pub bounds: (Point, Point),
    pub length: f64,
}

impl Line {
    pub fn new(p1: Point, p2: Point) -> Result<Line, ShapeError> {
        if p1 == p2 {
            return Err(ShapeError::DegenerateLine(p1, p2));
        }
        let slope = slope_of(p1, p2);
        Ok(Line {
            p1,
            p2,
            slope,
            intercept: intercept_of(p1.x, p1.y, slope),
            bounds: bounding_box(p1, p2),
            length: ((p2.x - p1.x) * (p2.x - p1.x) + (p2.y - p1.y) * (p2.y - p1.y)).sqrt(),
        })
    }

    /// Assumes the lines are parallel. Returns true if they overlap at
    /// more than a single point; an end-to-end touch is not an overlap.
    pub fn overlaps(&self, other: &Line) -> bool {
        if self == other {
            return true;
        }
        let minmax = |pt1: Point, pt2: Point| {
            if pt1.x + pt1.y - (pt2.x + pt2.y) >= 0.0 {
                (pt2, pt1)
            } else {
                (pt1, pt2)
            }
        };
        let (pa, pb) = minmax(self.p1, self.p2);
        let (pc, pd) = minmax(other.p1, other.p2);
        if pd == pa || pb == pc {
            return false;
        }
        pd.x + pd.y - (pa.x + pa.y) >= 0.0 && pb.x + pb.y - (pc.x + pc.y) >= 0.0
    }

    /// True if the other segment lies fully within this one.
    pub fn contains_line(&self, other: &Line) -> bool {
        if !(point_on_line(self, other.p1) && point_on_line(self, other.p2) && self.length >= other.length) {
            return false;
        }
        let (l1_x_min, l1_x_max) = minmax(self.p1.x, self.p2.x);
        let (l2_x_min, l2_x_max) = minmax(other.p1.x, other.p2.x);
        let (l1_y_min, l1_y_max) = minmax(self.p1.y, self.p2.y);
        let (l2_y_min, l2_y_max) = minmax(other.p1.y, other.p2.y);
        l1_x_max >= l2_x_max - GEOEPS
            && l1_x_min <= l2_x_min + GEOEPS
            && l1_y_max >= l2_y_max - GEOEPS
            && l1_y_min <= l2_y_min + GEOEPS
    }

    pub fn contains(&self, point: Point) -> bool {
        point_on_line(self, point)
    }

    pub fn intersects(&self, other: &Line) -> bool {
        boxes_intersect(&self.bounds, &other.bounds)
            && segment_crosses_line(self, other)
            && segment_crosses_line(other, self)
    }

    /// The intersection point of the two segments, if there is exactly
    /// one. Parallel and overlapping lines yield no intersection point.
    /// Vertical lines are handled by substituting their x coordinate
    /// into the equation of the non-vertical line.
    pub fn intersection(&self, other: &Line) -> Option<Point> {
        if !self.intersects(other) {
            return None;
        }
        let vertical = |l: &Line| approx_equal(l.p1.x, l.p2.x);
        let cross_vertical = |x: f64, p3: Point, p4: Point| {
            if approx_equal(p3.x, p4.x) {
                // both lines vertical
                None
            } else {
                let m = slope_of(p3, p4);
                let b = intercept_of(p3.x, p3.y, m);
                Some(Point::new(x, m * x + b))
            }
        };
        if vertical(self) {
            cross_vertical(self.p1.x, other.p1, other.p2)
        } else if vertical(other) {
            cross_vertical(other.p1.x, self.p1, self.p2)
        } else if approx_equal(self.slope, other.slope) {
            // parallel lines have no single intersection point
            None
        } else {
            let x = (other.intercept - self.intercept) / (self.slope - other.slope);
            Some(Point::new(x, self.slope * x + self.intercept))
        }
    }

    /// Unit normal of the segment. The sign selects the side: +1 for
    /// edges of a clockwise polygon makes the normal point inward.
    pub fn normal(&self, norm_sign: i32) -> Vector2<f64> {
        let sign = if norm_sign >= 0 { 1.0 } else { -1.0 };
        Vector2::new(
            sign * (self.p2.y - self.p1.y) / self.length,
            -sign * (self.p2.x - self.p1.x) / self.length,
        )
    }

    pub fn rand_point(&self, r1: f64) -> Point {
        let r2 = 1.0 - r1;
        Point::new(self.p1.x * r1 + self.p2.x * r2, self.p1.y * r1 + self.p2.y * r2)
    }
}

impl PartialEq for Line {
    fn eq(&self, rhs: &Line) -> bool {
        self.p1 == rhs.p1 && self.p2 == rhs.p2
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line segment [{}, {}]", self.p1, self.p2)
    }
}

fn minmax(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Returns 0 for a vertical line.
fn slope_of(p1: Point, p2: Point) -> f64 {
    if approx_equal(p1.x, p2.x) {
        0.0
    } else {
        (p1.y - p2.y) / (p1.x - p2.x)
    }
}

fn intercept_of(x: f64, y: f64, slope: f64) -> f64 {
    y - slope * x
}

/// (bottom-left, top-right) corners of the axis-aligned bounding box.
fn bounding_box(p1: Point, p2: Point) -> (Point, Point) {
    let (bl_x, tr_x) = minmax(p1.x, p2.x);
    let (bl_y, tr_y) = minmax(p1.y, p2.y);
    (Point::new(bl_x, bl_y), Point::new(tr_x, tr_y))
}

fn boxes_intersect(lhs: &(Point, Point), rhs: &(Point, Point)) -> bool {
    let (bl_1, tr_1) = *lhs;
    let (bl_2, tr_2) = *rhs;
    bl_1.x <= tr_2.x - GEOEPS
        && tr_1.x >= bl_2.x + GEOEPS
        && bl_1.y <= tr_2.y - GEOEPS
        && tr_1.y >= bl_2.y + GEOEPS
}

/// Whether the point lies on the infinite line, not just the segment.
fn point_on_line(line: &Line, p: Point) -> bool {
    cross(line.p2 - line.p1, p - line.p1).abs() < GEOEPS
}

fn point_right_of_line(line: &Line, p: Point) -> bool {
    cross(line.p2 - line.p1, p - line.p1) < 0.0
}

fn segment_crosses_line(l1: &Line, l2: &Line) -> bool {
    point_on_line(l1, l2.p1)
        || point_on_line(l1, l2.p2)
        || (point_right_of_line(l1, l2.p1) != point_right_of_line(l1, l2.p2))
}
