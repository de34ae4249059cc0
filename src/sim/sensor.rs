//!
//! A sensor aggregates the heat carried by phonons over one or more
//! cells. The accumulation buffers are the only mutable state shared
//! between worker threads and sit behind a per-sensor mutex.
//!

use super::controller::SensorController;
use super::SimulationType;
use ::cgmath::Vector2;
use material::{Material, Table};
use phonon::Phonon;
use std::sync::Mutex;

#[derive(Debug)]
struct HeatRecord {
    /// Signed phonon count per recorded measurement step.
    energies: Vec<i64>,
    /// Net phonon velocity per recorded measurement step, for flux.
    fluxes: Vec<Vector2<f64>>,
}

pub struct Sensor {
    id: usize,
    material: usize,
    controller: SensorController,
    area: f64,
    heat: Mutex<HeatRecord>,
}

impl Sensor {
    pub fn new(id: usize, material: usize, sim_type: SimulationType, steps_to_record: usize, t_init: f64) -> Sensor {
        Sensor {
            id,
            material,
            controller: SensorController::new(sim_type, t_init, steps_to_record_for(sim_type, steps_to_record)),
            area: 0.0,
            heat: Mutex::new(HeatRecord {
                energies: vec![0; steps_to_record],
                fluxes: vec![Vector2::new(0.0, 0.0); steps_to_record],
            }),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn material(&self) -> usize {
        self.material
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn add_to_area(&mut self, area: f64) {
        self.area += area;
    }

    pub fn init_temp(&self) -> f64 {
        self.controller.init_temp()
    }

    pub fn steady_temp(&self, step: usize) -> f64 {
        self.controller.steady_temp(step)
    }

    pub fn heat_capacity(&self, step: usize) -> f64 {
        self.controller.heat_capacity(step)
    }

    pub fn initial_update(&self, p: &mut Phonon, material: &Material, table: &Table) {
        self.controller.initial_update(p, material, table);
    }

    pub fn initial_update_base(&self, p: &mut Phonon, material: &Material) {
        self.controller.initial_update_base(p, material);
    }

    pub fn scatter_update(&self, p: &mut Phonon, material: &Material) {
        self.controller.scatter_update(p, material);
    }

    pub fn update_tables(&mut self, material: &Material) {
        self.controller.update_tables(material);
    }

    /// Records the phonon's energy and velocity at the given recorded
    /// step. Holds this sensor's mutex for the duration of one
    /// increment; contributions commute so no ordering is needed.
    pub fn update_heat_params(&self, p: &Phonon, step: usize) {
        let sign = p.sign();
        let velocity = p.velocity_vector();
        let mut heat = self.heat.lock().unwrap();
        heat.energies[step] += i64::from(sign);
        heat.fluxes[step] += velocity * f64::from(sign);
    }

    pub fn energies(&self) -> Vec<i64> {
        self.heat.lock().unwrap().energies.clone()
    }

    pub fn fluxes(&self) -> Vec<Vector2<f64>> {
        self.heat.lock().unwrap().fluxes.clone()
    }

    /// See `SensorController::is_stable`.
    pub fn is_stable(&mut self, t_final: f64, final_temps: Vec<f64>) -> bool {
        self.controller.is_stable(t_final, final_temps)
    }

    /// Clears the accumulation buffers and re-derives the controller
    /// tables for the next run.
    pub fn reset(&mut self, full_reset: bool, material: &Material) {
        self.controller.reset(full_reset, material);
        let mut heat = self.heat.lock().unwrap();
        for energy in heat.energies.iter_mut() {
            *energy = 0;
        }
        for flux in heat.fluxes.iter_mut() {
            *flux = Vector2::new(0.0, 0.0);
        }
    }
}

/// Transient controllers carry per-step state; the other regimes need
/// none.
fn steps_to_record_for(sim_type: SimulationType, steps_to_record: usize) -> usize {
    match sim_type {
        SimulationType::Transient => steps_to_record,
        _ => 0,
    }
}

/// The physical readings derived from one sensor at the end of a run.
#[derive(Debug, Clone)]
pub struct SensorMeasurements {
    pub id: usize,
    pub t_steady: f64,
    pub std_t_steady: f64,
    pub x_flux: f64,
    pub std_x_flux: f64,
    pub y_flux: f64,
    pub std_y_flux: f64,
    /// Temperature at every recorded measurement step.
    pub final_temps: Vec<f64>,
    /// Flux at every recorded measurement step.
    pub final_fluxes: Vec<Vector2<f64>>,
}

#[cfg(test)]
mod test {
    use super::*;
    use phonon::Polarization;

    fn phonon(sign: i8, velocity: f64, dx: f64, dy: f64) -> Phonon {
        let mut p = Phonon::new(sign, 0.0, Some(0));
        p.set_direction(dx, dy);
        p.scatter_update(0, 1e12, velocity, Polarization::LA);
        p
    }

    #[test]
    fn heat_updates_commute() {
        let contributions = [
            phonon(1, 100.0, 1.0, 0.0),
            phonon(-1, 50.0, 0.0, 1.0),
            phonon(1, 25.0, -1.0, 0.0),
            phonon(-1, 75.0, 0.6, 0.8),
        ];

        let forward = Sensor::new(0, 0, SimulationType::SteadyState, 4, 300.0);
        for p in contributions.iter() {
            forward.update_heat_params(p, 2);
        }
        let backward = Sensor::new(0, 0, SimulationType::SteadyState, 4, 300.0);
        for p in contributions.iter().rev() {
            backward.update_heat_params(p, 2);
        }

        assert_eq!(forward.energies(), backward.energies());
        assert_eq!(forward.fluxes()[2], backward.fluxes()[2]);
    }

    #[test]
    fn reset_clears_the_buffers() {
        use material::{DispersionData, Material, RelaxationData};

        let sensor = Sensor::new(0, 0, SimulationType::SteadyState, 2, 300.0);
        sensor.update_heat_params(&phonon(1, 10.0, 1.0, 0.0), 0);
        assert_eq!(sensor.energies()[0], 1);

        let mut mat = Material::new(0, &DispersionData {
            la: [-2.22e-7, 9260.0, 0.0],
            ta: [-2.28e-7, 5240.0, 0.0],
            max_freq_la: 7.63e13,
            max_freq_ta: 3.0e13,
        }, &RelaxationData::default());
        mat.initialize_tables(290.0, 310.0, 0.1);

        let mut sensor = sensor;
        sensor.reset(true, &mat);
        assert_eq!(sensor.energies(), vec![0, 0]);
    }
}
