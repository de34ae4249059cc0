//!
//! Phonon sources. Each source owns a budget of phonons and builds
//! them one at a time, anchored either to a cell interior or to an
//! emitting surface; a phasor source is a surface source whose
//! phonons form a coherent monodirectional beam.
//!

use super::surface::EmitSurface;
use super::SimContext;
use phonon::{Phonon, Polarization};
use sampling::urand;

pub enum PhononSource {
    CellOrigin(CellSource),
    SurfaceOrigin(SurfaceSource),
    Phasor(SurfaceSource),
}

impl PhononSource {
    pub fn has_phonons(&self) -> bool {
        match *self {
            PhononSource::CellOrigin(ref source) => source.has_phonons(),
            PhononSource::SurfaceOrigin(ref source) | PhononSource::Phasor(ref source) => source.has_phonons(),
        }
    }

    pub fn total_phonons(&self) -> usize {
        match *self {
            PhononSource::CellOrigin(ref source) => source.total_phonons(),
            PhononSource::SurfaceOrigin(ref source) | PhononSource::Phasor(ref source) => source.remaining,
        }
    }

    /// Builds the next phonon. The caller must check `has_phonons`
    /// first.
    pub fn next_phonon(&mut self, t_eq: f64, ctx: &SimContext) -> Phonon {
        match *self {
            PhononSource::CellOrigin(ref mut source) => source.next_phonon(t_eq, ctx),
            PhononSource::SurfaceOrigin(ref mut source) => source.next_phonon(t_eq, ctx),
            PhononSource::Phasor(ref mut source) => {
                let (cell_index, edge, emit) = (source.cell, source.edge, source.emit);
                let mut p = source.next_phonon(t_eq, ctx);
                let normal = ctx.cells[cell_index].boundaries()[edge].emit_surfaces()[emit]
                    .surface()
                    .normal();
                // Only the velocity matters for the beam; frequency and
                // polarization are placeholders.
                p.scatter_update(1, 1.0, 1000.0, Polarization::LA);
                p.set_direction(normal.x, normal.y);
                p
            }
        }
    }
}

/// Emits phonons from the interiors of a stack of cells, sized by each
/// cell's share of the initial energy.
pub struct CellSource {
    cells: Vec<(usize, usize)>,
    total: usize,
}

impl CellSource {
    pub fn new() -> CellSource {
        CellSource {
            cells: Vec::new(),
            total: 0,
        }
    }

    pub fn add_cell_phonons(&mut self, cell: usize, num_phonons: usize) {
        if num_phonons > 0 {
            self.total += num_phonons;
            self.cells.push((cell, num_phonons));
        }
    }

    pub fn has_phonons(&self) -> bool {
        !self.cells.is_empty()
    }

    pub fn total_phonons(&self) -> usize {
        self.total
    }

    fn next_phonon(&mut self, t_eq: f64, ctx: &SimContext) -> Phonon {
        let (cell_index, remaining) = {
            let top = self.cells.last_mut().unwrap();
            top.1 -= 1;
            (top.0, top.1)
        };
        if remaining == 0 {
            self.cells.pop();
        }

        let cell = &ctx.cells[cell_index];
        let sensor = ctx.sensor_of(cell);
        let sign = if sensor.init_temp() > t_eq { 1 } else { -1 };
        let mut p = Phonon::new(sign, 0.0, Some(cell_index));
        sensor.initial_update_base(&mut p, ctx.material_of(cell));
        let point = cell.rand_point(urand(), urand());
        p.set_position(point.x, point.y);
        p.set_rand_direction();
        p
    }
}

/// Emits phonons from one emitting surface, uniformly over its span
/// and its emission window.
pub struct SurfaceSource {
    cell: usize,
    edge: usize,
    emit: usize,
    remaining: usize,
}

impl SurfaceSource {
    pub fn new(cell: usize, edge: usize, emit: usize, num_phonons: usize) -> SurfaceSource {
        SurfaceSource {
            cell,
            edge,
            emit,
            remaining: num_phonons,
        }
    }

    pub fn has_phonons(&self) -> bool {
        self.remaining > 0
    }

    fn next_phonon(&mut self, t_eq: f64, ctx: &SimContext) -> Phonon {
        self.remaining -= 1;
        let cell = &ctx.cells[self.cell];
        let es: &EmitSurface = &cell.boundaries()[self.edge].emit_surfaces()[self.emit];
        let sensor = ctx.sensor_of(cell);
        let material = ctx.material_of(cell);

        let sign = if es.temp() > t_eq { 1 } else { -1 };
        let mut p = Phonon::new(sign, es.phonon_time(), Some(self.cell));
        sensor.initial_update(&mut p, material, es.table(material));
        let point = es.surface().rand_point(urand());
        p.set_position(point.x, point.y);
        // Biased draw so the phonon heads into the cell.
        es.surface().redirect_phonon(&mut p);
        p
    }
}
