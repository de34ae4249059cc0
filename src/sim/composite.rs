//!
//! One edge of a triangular cell. Unused space on the edge acts as a
//! plain boundary; portions of it can be allocated to emitting or
//! transition sub-surfaces, which must not overlap each other.
//!

use super::error::{Error, Result};
use super::surface::{EmitSurface, Surface, TransitionSurface};
use super::SimContext;
use geom::{Line, Point};
use material::Material;
use phonon::Phonon;

#[derive(Debug, Clone)]
pub struct CompositeSurface {
    main: Surface,
    transitions: Vec<TransitionSurface>,
    emits: Vec<EmitSurface>,
}

impl CompositeSurface {
    pub fn new(main: Surface) -> CompositeSurface {
        CompositeSurface {
            main,
            transitions: Vec::new(),
            emits: Vec::new(),
        }
    }

    pub fn line(&self) -> &Line {
        self.main.line()
    }

    pub fn contains(&self, point: Point) -> bool {
        self.main.contains(point)
    }

    pub fn emit_surfaces(&self) -> &[EmitSurface] {
        &self.emits
    }

    pub fn transition_surfaces(&self) -> &[TransitionSurface] {
        &self.transitions
    }

    pub fn update_emit_tables(&mut self, material: &Material) {
        for es in &mut self.emits {
            es.update_table(material);
        }
    }

    /// Places an emitting sub-surface on this edge. Returns false when
    /// the line is not part of this edge, an error when it overlaps an
    /// existing sub-surface. Emit surfaces inherit the specularity and
    /// inward normal of the main surface.
    pub fn add_emit_surface(
        &mut self,
        line: &Line,
        norm_sign: i32,
        temp: f64,
        duration: f64,
        start_time: f64,
    ) -> Result<bool> {
        if !self.verify_surface_line(line)? {
            return Ok(false);
        }
        let mut es = EmitSurface::new(line.clone(), self.main.specularity(), norm_sign, temp, duration, start_time);
        es.surface_mut().set_normal(self.main.normal());
        self.emits.push(es);
        Ok(true)
    }

    pub fn add_transition_surface(&mut self, line: &Line, norm_sign: i32, neighbor: usize) -> Result<bool> {
        if !self.verify_surface_line(line)? {
            return Ok(false);
        }
        let mut ts = TransitionSurface::new(line.clone(), norm_sign, neighbor);
        // The sub-surface line may run opposite to this cell's edge, so
        // take the inward normal from the main surface. Backscatter off
        // a blocked transition has to point into the owning cell.
        ts.surface_mut().set_normal(self.main.normal());
        self.transitions.push(ts);
        Ok(true)
    }

    /// Dispatches a surface collision at the impact point. Transition
    /// surfaces are searched first as they are the most likely impact
    /// surfaces, then emitting surfaces, then the main boundary.
    pub fn handle_phonon(&self, p: &mut Phonon, poi: Point, step_time: f64, current_material: usize, ctx: &SimContext) {
        if let Some(ts) = self.transitions.iter().find(|ts| ts.surface().contains(poi)) {
            ts.handle_phonon(p, current_material, ctx);
            return;
        }
        if let Some(es) = self.emits.iter().find(|es| es.surface().contains(poi)) {
            es.handle_phonon(p, step_time);
            return;
        }
        self.main.reflect_phonon(p);
    }

    /// Whether the incoming surface can be placed on this edge. Errors
    /// when it overlaps an already placed sub-surface.
    fn verify_surface_line(&self, line: &Line) -> Result<bool> {
        if !self.main.line().contains_line(line) {
            return Ok(false);
        }
        for ts in &self.transitions {
            if line.overlaps(ts.surface().line()) {
                return Err(Error::SurfaceConflict(ts.surface().line().clone(), line.clone()));
            }
        }
        for es in &self.emits {
            if line.overlaps(es.surface().line()) {
                return Err(Error::SurfaceConflict(es.surface().line().clone(), line.clone()));
            }
        }
        Ok(true)
    }
}
