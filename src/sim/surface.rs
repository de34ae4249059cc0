//!
//! The surface kinds a phonon can collide with. Every kind shares the
//! same preamble (segment, inward normal, specularity); emitting and
//! transition surfaces add their own behavior on top of it.
//!

use super::SimContext;
use ::cgmath::Vector2;
use geom::{Line, Point};
use material::{Material, Table};
use phonon::{Phonon, Polarization};
use sampling::urand;
use std::f64::consts::PI;

/// Common state of every surface: the segment it covers, the unit
/// normal pointing into the owning cell and the probability of
/// specular reflection.
#[derive(Debug, Clone)]
pub struct Surface {
    line: Line,
    normal: Vector2<f64>,
    specularity: f64,
}

impl Surface {
    pub fn new(line: Line, specularity: f64, norm_sign: i32) -> Surface {
        let normal = line.normal(norm_sign);
        Surface { line, normal, specularity }
    }

    pub fn line(&self) -> &Line {
        &self.line
    }

    pub fn contains(&self, point: Point) -> bool {
        self.line.contains(point)
    }

    pub fn rand_point(&self, r1: f64) -> Point {
        self.line.rand_point(r1)
    }

    pub fn length(&self) -> f64 {
        self.line.length
    }

    pub fn specularity(&self) -> f64 {
        self.specularity
    }

    pub fn normal(&self) -> Vector2<f64> {
        self.normal
    }

    pub fn set_normal(&mut self, normal: Vector2<f64>) {
        self.normal = normal;
    }

    /// Redirects the phonon to a random direction pointing away from
    /// this surface (diffuse scatter). The local +x axis of the draw
    /// is the inward normal.
    pub fn redirect_phonon(&self, p: &mut Phonon) {
        let (nx, ny) = (self.normal.x, self.normal.y);
        let rand = urand();
        let new_dx = rand.sqrt();
        let new_dy = (1.0 - rand).sqrt() * (2.0 * PI * urand()).cos();
        p.set_direction(nx * new_dx - ny * new_dy, ny * new_dx + nx * new_dy);
    }

    /// Boundary behavior: specular reflection with probability equal
    /// to the specularity, diffuse scatter otherwise.
    pub fn reflect_phonon(&self, p: &mut Phonon) {
        if self.specularity == 1.0 || urand() < self.specularity {
            let (nx, ny) = (self.normal.x, self.normal.y);
            let (dx, dy) = p.direction();
            let new_dx = -dx * nx - dy * ny;
            let new_dy = -dx * ny + dy * nx;
            p.set_direction(nx * new_dx - ny * new_dy, ny * new_dx + nx * new_dy);
        } else {
            self.redirect_phonon(p);
        }
    }
}

/// A segment held at a fixed temperature that radiates phonons into
/// the cell while its emission window is open. Outside the window it
/// behaves like a plain boundary.
#[derive(Debug, Clone)]
pub struct EmitSurface {
    surface: Surface,
    temp: f64,
    duration: f64,
    start_time: f64,
    /// Index of the emit table matching `temp` in the material's
    /// temperature grid. Refreshed whenever the tables are rebuilt.
    table_index: usize,
}

impl EmitSurface {
    pub fn new(line: Line, specularity: f64, norm_sign: i32, temp: f64, duration: f64, start_time: f64) -> EmitSurface {
        EmitSurface {
            surface: Surface::new(line, specularity, norm_sign),
            temp,
            duration,
            start_time,
            table_index: 0,
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    pub fn temp(&self) -> f64 {
        self.temp
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// A lifetime drawn uniformly over the emission window.
    pub fn phonon_time(&self) -> f64 {
        self.start_time + self.duration * urand()
    }

    pub fn update_table(&mut self, material: &Material) {
        self.table_index = material.temp_index(self.temp);
    }

    pub fn table<'a>(&self, material: &'a Material) -> &'a Table {
        material.emit_table_at(self.table_index)
    }

    /// Phonons impacting while the surface emits are absorbed and
    /// leave the system; at any other time the surface reflects.
    pub fn handle_phonon(&self, p: &mut Phonon, step_time: f64) {
        let phonon_time = p.lifestep() as f64 * step_time;
        if phonon_time < self.start_time || phonon_time + step_time > self.start_time + self.duration {
            self.surface.reflect_phonon(p);
        } else {
            p.set_cell(None);
        }
    }
}

/// A shared segment between two neighboring cells. Phonons cross it
/// unless the neighbor material has no state at their frequency, in
/// which case they backscatter diffusely.
#[derive(Debug, Clone)]
pub struct TransitionSurface {
    surface: Surface,
    neighbor: usize,
}

impl TransitionSurface {
    pub fn new(line: Line, norm_sign: i32, neighbor: usize) -> TransitionSurface {
        // Specularity 0: a blocked transition always scatters diffusely.
        TransitionSurface {
            surface: Surface::new(line, 0.0, norm_sign),
            neighbor,
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    pub fn neighbor(&self) -> usize {
        self.neighbor
    }

    pub fn handle_phonon(&self, p: &mut Phonon, current_material: usize, ctx: &SimContext) {
        let neighbor = &ctx.cells[self.neighbor];
        let material = ctx.material_of(neighbor);
        if material.id() == current_material {
            // Material is the same between sensor areas
            p.set_cell(Some(self.neighbor));
            return;
        }
        // Phonon is passing from one material to another
        let max_freq = match p.polar() {
            Polarization::LA => material.max_freq_la(),
            Polarization::TA => material.max_freq_ta(),
        };
        if p.freq() > max_freq {
            // No corresponding state in the new material
            self.surface.redirect_phonon(p);
        } else {
            p.set_cell(Some(self.neighbor));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use geom::GEOEPS;

    fn surface(x1: f64, y1: f64, x2: f64, y2: f64, spec: f64, sign: i32) -> Surface {
        Surface::new(Line::new(Point::new(x1, y1), Point::new(x2, y2)).unwrap(), spec, sign)
    }

    fn direction_after_reflection(s: &Surface, dx: f64, dy: f64) -> (f64, f64) {
        let mut p = Phonon::new(1, 0.0, Some(0));
        p.set_direction(dx, dy);
        s.reflect_phonon(&mut p);
        p.direction()
    }

    #[test]
    fn specular_reflection_mirrors_across_the_normal() {
        // bottom edge of a counter-clockwise unit right triangle
        let bottom = surface(0.0, 0.0, 1.0, 0.0, 1.0, -1);
        let (dx, dy) = direction_after_reflection(&bottom, 0.0, -1.0);
        assert!(dx.abs() < GEOEPS && (dy - 1.0).abs() < GEOEPS);

        // hypotenuse, inward normal towards the origin
        let hypotenuse = surface(1.0, 0.0, 0.0, 1.0, 1.0, -1);
        let (dx, dy) = direction_after_reflection(&hypotenuse, 1.0, 0.0);
        assert!(dx.abs() < GEOEPS && (dy + 1.0).abs() < GEOEPS);

        let (dx, dy) = direction_after_reflection(&hypotenuse, 0.0, 1.0);
        assert!((dx + 1.0).abs() < GEOEPS && dy.abs() < GEOEPS);
    }

    #[test]
    fn specular_cavity_round_trip() {
        // A horizontal ray inside the right isoceles cavity returns to
        // its initial direction after four reflections.
        let bottom = surface(0.0, 0.0, 1.0, 0.0, 1.0, -1);
        let left = surface(0.0, 1.0, 0.0, 0.0, 1.0, -1);
        let hypotenuse = surface(1.0, 0.0, 0.0, 1.0, 1.0, -1);

        let mut p = Phonon::new(1, 0.0, Some(0));
        p.set_direction(1.0, 0.0);
        hypotenuse.reflect_phonon(&mut p);
        bottom.reflect_phonon(&mut p);
        hypotenuse.reflect_phonon(&mut p);
        left.reflect_phonon(&mut p);
        let (dx, dy) = p.direction();
        assert!((dx - 1.0).abs() < 4.0 * GEOEPS && dy.abs() < 4.0 * GEOEPS);
    }

    #[test]
    fn diffuse_redirect_points_into_the_cell() {
        let bottom = surface(0.0, 0.0, 1.0, 0.0, 0.0, -1);
        let normal = bottom.normal();
        let mut p = Phonon::new(1, 0.0, Some(0));
        for _ in 0..200 {
            p.set_direction(0.0, -1.0);
            bottom.redirect_phonon(&mut p);
            let (dx, dy) = p.direction();
            assert!(dx * normal.x + dy * normal.y >= 0.0);
            assert!(dx * dx + dy * dy <= 1.0 + 1e-12);
        }
    }
}
