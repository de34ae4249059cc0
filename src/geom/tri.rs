use super::line::Line;
use super::point::{dot, Point};
use super::{approx_equal, ShapeError, GEOEPS};
use std::fmt;

/// A triangular region of the domain. Construction rejects collinear
/// and duplicated vertices; the three edges are cached in the order
/// (p1,p2), (p2,p3), (p3,p1).
#[derive(Debug, Clone)]
pub struct Triangle {
    pub p1: Point,
    pub p2: Point,
    pub p3: Point,
    lines: [Line; 3],
}

impl Triangle {
    pub fn new(p1: Point, p2: Point, p3: Point) -> Result<Triangle, ShapeError> {
        let collinear = approx_equal(slope_magnitude(p1, p2), slope_magnitude(p2, p3))
            && approx_equal(slope_magnitude(p2, p3), slope_magnitude(p3, p1));
        if collinear || p1 == p2 || p2 == p3 || p3 == p1 {
            return Err(ShapeError::DegenerateTriangle(p1, p2, p3));
        }
        let lines = [
            Line::new(p1, p2).map_err(|_| ShapeError::DegenerateTriangle(p1, p2, p3))?,
            Line::new(p2, p3).map_err(|_| ShapeError::DegenerateTriangle(p1, p2, p3))?,
            Line::new(p3, p1).map_err(|_| ShapeError::DegenerateTriangle(p1, p2, p3))?,
        ];
        Ok(Triangle { p1, p2, p3, lines })
    }

    pub fn lines(&self) -> &[Line; 3] {
        &self.lines
    }

    pub fn area(&self) -> f64 {
        let a = self.lines[0].length;
        let b = self.lines[1].length;
        let c = self.lines[2].length;
        let p = (a + b + c) / 2.0;
        (p * (p - a) * (p - b) * (p - c)).sqrt()
    }

    /// Whether any edge of this triangle crosses an edge of the other.
    /// Intersections at segment endpoints and along parallel edges are
    /// not counted, so cells sharing an edge or a corner do not
    /// intersect.
    pub fn intersects(&self, other: &Triangle) -> bool {
        let crossing = |l1: &Line, l2: &Line| match l1.intersection(l2) {
            Some(poi) => !(poi == l1.p1 || poi == l1.p2 || poi == l2.p1 || poi == l2.p2),
            None => false,
        };
        self.lines
            .iter()
            .any(|l1| other.lines.iter().any(|l2| crossing(l1, l2)))
    }

    /// Whether the point lies strictly inside the triangle. Points on
    /// an edge are not contained. A barycentric test is cross-checked
    /// against the sum of the sub-triangle areas.
    pub fn contains(&self, p: Point) -> bool {
        let bp1 = self.p2 - self.p1;
        let bp2 = self.p3 - self.p1;
        let d00 = dot(bp1, bp1);
        let d01 = dot(bp1, bp2);
        let d11 = dot(bp2, bp2);
        let denom = d00 * d11 - d01 * d01;
        let bp3 = p - self.p1;
        let d20 = dot(bp3, bp1);
        let d21 = dot(bp3, bp2);
        let u = (d11 * d20 - d01 * d21) / denom;
        let v = (d00 * d21 - d01 * d20) / denom;
        if u >= GEOEPS && u <= 1.0 - GEOEPS && v >= GEOEPS && v <= 1.0 - GEOEPS && u + v <= 1.0 - GEOEPS {
            let sub_areas = area_of(p, self.p2, self.p3) + area_of(self.p1, p, self.p3) + area_of(self.p1, self.p2, p);
            (self.area() - sub_areas).abs() < GEOEPS
        } else {
            false
        }
    }

    /// Whether any vertex of the other triangle lies strictly inside
    /// this one. Misses configurations where a triangle pierces
    /// another without placing a vertex in its interior.
    pub fn contains_triangle(&self, other: &Triangle) -> bool {
        self.contains(other.p1) || self.contains(other.p2) || self.contains(other.p3)
    }

    pub fn is_clockwise(&self) -> bool {
        (self.p2.x - self.p1.x) * (self.p2.y + self.p1.y)
            + (self.p3.x - self.p2.x) * (self.p3.y + self.p2.y)
            + (self.p1.x - self.p3.x) * (self.p1.y + self.p3.y)
            >= 0.0
    }

    /// Uniform sample over the triangle: samples outside the lower
    /// half of the unit square are reflected back inside.
    pub fn rand_point(&self, r1: f64, r2: f64) -> Point {
        let (r1, r2) = if r1 + r2 > 1.0 { (1.0 - r1, 1.0 - r2) } else { (r1, r2) };
        Point::new(
            self.p1.x + (self.p2.x - self.p1.x) * r1 + (self.p3.x - self.p1.x) * r2,
            self.p1.y + (self.p2.y - self.p1.y) * r1 + (self.p3.y - self.p1.y) * r2,
        )
    }
}

impl PartialEq for Triangle {
    fn eq(&self, rhs: &Triangle) -> bool {
        let contains = |t: &Triangle, p: Point| p == t.p1 || p == t.p2 || p == t.p3;
        contains(rhs, self.p1) && contains(rhs, self.p2) && contains(rhs, self.p3)
    }
}

impl fmt::Display for Triangle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "triangle [{}, {}, {}]", self.p1, self.p2, self.p3)
    }
}

fn slope_magnitude(p1: Point, p2: Point) -> f64 {
    if approx_equal(p1.x, p2.x) {
        0.0
    } else {
        ((p1.y - p2.y) / (p1.x - p2.x)).abs()
    }
}

fn area_of(p1: Point, p2: Point, p3: Point) -> f64 {
    match Triangle::new(p1, p2, p3) {
        Ok(t) => t.area(),
        Err(_) => 0.0,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tri(points: [(f64, f64); 3]) -> Triangle {
        Triangle::new(
            Point::new(points[0].0, points[0].1),
            Point::new(points[1].0, points[1].1),
            Point::new(points[2].0, points[2].1),
        ).unwrap()
    }

    #[test]
    fn degenerate_triangles_are_rejected() {
        let p = Point::new(0.0, 0.0);
        assert!(Triangle::new(p, Point::new(1.0, 1.0), Point::new(2.0, 2.0)).is_err());
        assert!(Triangle::new(p, p, Point::new(1.0, 0.0)).is_err());
    }

    #[test]
    fn area_of_unit_right_triangle() {
        let t = tri([(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        assert!((t.area() - 0.5).abs() < GEOEPS);
    }

    #[test]
    fn orientation() {
        assert!(!tri([(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]).is_clockwise());
        assert!(tri([(0.0, 0.0), (0.0, 1.0), (1.0, 0.0)]).is_clockwise());
    }

    #[test]
    fn contains_interior_point_but_not_edges() {
        let t = tri([(0.0, 0.0), (4.0, 0.0), (0.0, 4.0)]);
        assert!(t.contains(Point::new(1.0, 1.0)));
        assert!(!t.contains(Point::new(2.0, 0.0)));
        assert!(!t.contains(Point::new(2.0, 2.0)));
        assert!(!t.contains(Point::new(4.0, 4.0)));
    }

    #[test]
    fn rand_points_are_contained() {
        let t = tri([(0.0, 0.0), (3.0, 0.5), (1.0, 2.0)]);
        // step chosen so no sample pair lands on the r1 + r2 = 1 diagonal
        let mut r1 = 0.07;
        while r1 < 1.0 {
            let mut r2 = 0.07;
            while r2 < 1.0 {
                assert!(t.contains(t.rand_point(r1, r2)), "r1 = {}, r2 = {}", r1, r2);
                r2 += 0.13;
            }
            r1 += 0.13;
        }
    }

    #[test]
    fn vertex_containment_detects_overlap() {
        let outer = tri([(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]);
        let inner = tri([(1.0, 1.0), (2.0, 1.0), (1.0, 2.0)]);
        assert!(outer.contains_triangle(&inner));
        assert!(!inner.contains_triangle(&outer));
    }

    #[test]
    fn edge_sharing_triangles_do_not_intersect() {
        let left = tri([(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        let right = tri([(1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        assert!(!left.intersects(&right));
    }

    #[test]
    fn crossing_triangles_intersect() {
        let t1 = tri([(0.0, 0.0), (4.0, 0.0), (0.0, 4.0)]);
        let t2 = tri([(-1.0, 1.0), (3.0, 1.0), (-1.0, 3.0)]);
        assert!(t1.intersects(&t2));
    }

    #[test]
    fn equality_ignores_vertex_order() {
        let t1 = tri([(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        let t2 = tri([(0.0, 1.0), (0.0, 0.0), (1.0, 0.0)]);
        assert_eq!(t1, t2);
    }
}
