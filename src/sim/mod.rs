//!
//! The simulation engine: cells and their surfaces, sensors and their
//! controllers, phonon sources, the tracing inner loop and the
//! orchestration that runs it all to convergence.
//!

pub mod cell;
pub mod composite;
pub mod config;
pub mod controller;
pub mod error;
pub mod interpreter;
pub mod sensor;
pub mod sim;
pub mod simbuilder;
pub mod source;
pub mod surface;
pub mod tracer;

pub use self::error::{Error, Result};
pub use self::sim::Simulation;
pub use self::simbuilder::{SimulationBuilder, SimulationParams};

use self::cell::Cell;
use self::sensor::Sensor;
use material::Material;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationType {
    SteadyState,
    Periodic,
    Transient,
}

/// Shared read-only view of the sealed model, handed to every worker
/// while phonons are traced. All cross-references between cells,
/// sensors and materials are indices into these slices.
pub struct SimContext<'a> {
    pub cells: &'a [Cell],
    pub sensors: &'a [Sensor],
    pub materials: &'a [Material],
}

impl<'a> SimContext<'a> {
    pub fn sensor_of(&self, cell: &Cell) -> &'a Sensor {
        &self.sensors[cell.sensor()]
    }

    pub fn material_of(&self, cell: &Cell) -> &'a Material {
        &self.materials[self.sensor_of(cell).material()]
    }
}
