//!
//! A triangular cell of the domain. Each of its three edges is a
//! composite surface; the cell reports its heat into the sensor it is
//! linked to by index.
//!

use super::composite::CompositeSurface;
use super::error::{Error, Result};
use super::sensor::Sensor;
use super::surface::Surface;
use super::SimContext;
use geom::{Line, Point, Triangle};
use material::Material;
use phonon::Phonon;

#[derive(Debug, Clone)]
pub struct Cell {
    triangle: Triangle,
    sensor: usize,
    boundaries: [CompositeSurface; 3],
}

impl Cell {
    pub fn new(triangle: Triangle, sensor: usize, specularity: f64) -> Cell {
        let spec = specularity.max(0.0).min(1.0);
        let norm_sign = if triangle.is_clockwise() { 1 } else { -1 };
        let lines = triangle.lines();
        let boundaries = [
            CompositeSurface::new(Surface::new(lines[0].clone(), spec, norm_sign)),
            CompositeSurface::new(Surface::new(lines[1].clone(), spec, norm_sign)),
            CompositeSurface::new(Surface::new(lines[2].clone(), spec, norm_sign)),
        ];
        Cell { triangle, sensor, boundaries }
    }

    pub fn triangle(&self) -> &Triangle {
        &self.triangle
    }

    pub fn sensor(&self) -> usize {
        self.sensor
    }

    pub fn area(&self) -> f64 {
        self.triangle.area()
    }

    pub fn boundaries(&self) -> &[CompositeSurface; 3] {
        &self.boundaries
    }

    pub fn boundary_lines(&self) -> [Line; 3] {
        [
            self.boundaries[0].line().clone(),
            self.boundaries[1].line().clone(),
            self.boundaries[2].line().clone(),
        ]
    }

    pub fn rand_point(&self, r1: f64, r2: f64) -> Point {
        self.triangle.rand_point(r1, r2)
    }

    /// Checks that an incoming cell can coexist with this one: the two
    /// must not intersect and neither may contain the other.
    pub fn validate(&self, other: &Cell) -> Result<()> {
        if self.triangle.intersects(&other.triangle) {
            return Err(Error::CellIntersects(self.triangle.clone(), other.triangle.clone()));
        }
        if self.triangle.contains_triangle(&other.triangle) {
            return Err(Error::CellContained(self.triangle.clone(), other.triangle.clone()));
        }
        if other.triangle.contains_triangle(&self.triangle) {
            return Err(Error::CellContained(other.triangle.clone(), self.triangle.clone()));
        }
        Ok(())
    }

    /// Turns the part of an edge covered by `line` into an emitting
    /// surface. Returns false when the line lies on none of the three
    /// edges of this cell.
    pub fn set_emit_surface(&mut self, line: &Line, temp: f64, duration: f64, start_time: f64) -> Result<bool> {
        let norm_sign = if self.triangle.is_clockwise() { 1 } else { -1 };
        for boundary in &mut self.boundaries {
            if boundary.add_emit_surface(line, norm_sign, temp, duration, start_time)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn set_transition_surface(&mut self, line: &Line, neighbor: usize) -> Result<bool> {
        let norm_sign = if self.triangle.is_clockwise() { 1 } else { -1 };
        for boundary in &mut self.boundaries {
            if boundary.add_transition_surface(line, norm_sign, neighbor)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Initial deviational (or absolute) energy held by the cell.
    pub fn init_energy(&self, t_eq: f64, sensor: &Sensor) -> f64 {
        let init_energy = self.area() * sensor.heat_capacity(0);
        if t_eq == 0.0 {
            init_energy
        } else {
            init_energy * (sensor.init_temp() - t_eq).abs()
        }
    }

    /// Energy emitted by all emitting surfaces of this cell over the
    /// course of the simulation. Zero when the cell has none.
    pub fn emit_energy(&self, t_eq: f64, material: &Material) -> f64 {
        self.boundaries
            .iter()
            .flat_map(|boundary| boundary.emit_surfaces())
            .map(|es| {
                let temp = es.temp();
                let energy = es.surface().length() * es.duration() * material.emit_energy(temp) / 4.0;
                if t_eq == 0.0 {
                    energy
                } else {
                    energy * (temp - t_eq).abs()
                }
            })
            .sum()
    }

    pub fn update_emit_tables(&mut self, material: &Material) {
        for boundary in &mut self.boundaries {
            boundary.update_emit_tables(material);
        }
    }

    /// Resolves a collision at `poi` against whichever edge holds the
    /// point.
    pub fn handle_surface_collision(&self, p: &mut Phonon, poi: Point, step_time: f64, ctx: &SimContext) {
        let current_material = ctx.materials[ctx.sensors[self.sensor].material()].id();
        if let Some(boundary) = self.boundaries.iter().find(|b| b.contains(poi)) {
            boundary.handle_phonon(p, poi, step_time, current_material, ctx);
        }
    }
}

impl PartialEq for Cell {
    fn eq(&self, rhs: &Cell) -> bool {
        self.triangle == rhs.triangle
    }
}

/// Installs transition surfaces on any edge the two cells share, in
/// both directions. Cells may share at most one transition area.
pub fn link_transition_surfaces(a: &mut Cell, a_index: usize, b: &mut Cell, b_index: usize) -> Result<()> {
    let a_lines = a.boundary_lines();
    let b_lines = b.boundary_lines();
    for l1 in &a_lines {
        for l2 in &b_lines {
            if l1.contains_line(l2) {
                if !(a.set_transition_surface(l2, b_index)? && b.set_transition_surface(l2, a_index)?) {
                    return Err(Error::SurfaceConflict(l1.clone(), l2.clone()));
                }
            } else if l2.contains_line(l1) {
                if !(a.set_transition_surface(l1, b_index)? && b.set_transition_surface(l1, a_index)?) {
                    return Err(Error::SurfaceConflict(l2.clone(), l1.clone()));
                }
            }
        }
    }
    Ok(())
}
