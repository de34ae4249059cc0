//!
//! Runs the assembled model to convergence. Each run initializes the
//! material tables over the temperature range the model can reach,
//! traces the phonon population, and repeats with an updated
//! equilibrium temperature until enough sensors are stable.
//!

use super::interpreter::SensorInterpreter;
use super::sensor::SensorMeasurements;
use super::simbuilder::SimulationParams;
use super::tracer::Tracer;
use super::{SimContext, SimulationType};
use rayon::prelude::*;
use sim::cell::Cell;
use sim::sensor::Sensor;
use material::Material;
use sink::{self, ResultsSink};
use std::path::Path;

/// Maximum number of convergence passes per run.
const MAX_ITERS: usize = 10;
/// Percentage of sensors that must be stable for the system to count
/// as stable.
const RESET_THRESHOLD: usize = 90;
/// Stability bound on the equilibrium temperature between passes, in
/// tenths of a percent (5 = 0.5%).
const TEQ_THRESHOLD: usize = 5;
/// Margin added to the temperature bounds used by the numerical
/// inversion.
const TEMP_BOUND_EPS: f64 = 10.0;
const PHASOR_TEMP_BOUND_EPS: f64 = TEMP_BOUND_EPS * 100.0;
/// Interval of the per-material distribution table grid. Smaller
/// intervals cost memory, mostly a concern for transient runs.
const TEMP_INTERVAL: f64 = 0.1;

pub struct Simulation {
    sim_type: SimulationType,
    num_runs: usize,
    num_phonons: usize,
    t_eq: f64,
    phasor_sim: bool,
    /// First step of the window used for end-of-run temperatures; 0
    /// for steady state, whose sensors only record that window anyway.
    start_step: usize,

    tracer: Tracer,
    interpreter: SensorInterpreter,
    sink: ResultsSink,

    cells: Vec<Cell>,
    sensors: Vec<Sensor>,
    materials: Vec<Material>,
}

impl Simulation {
    pub fn new(
        params: SimulationParams,
        sim_type: SimulationType,
        start_step: usize,
        tracer: Tracer,
        interpreter: SensorInterpreter,
        sink: ResultsSink,
        cells: Vec<Cell>,
        sensors: Vec<Sensor>,
        materials: Vec<Material>,
    ) -> Simulation {
        Simulation {
            sim_type,
            num_runs: params.num_runs,
            num_phonons: params.num_phonons,
            t_eq: params.t_eq,
            phasor_sim: params.phasor_sim,
            start_step,
            tracer,
            interpreter,
            sink,
            cells,
            sensors,
            materials,
        }
    }

    /// Runs the full simulation: every independent run, each with its
    /// internal convergence loop. Results are collected in the sink.
    pub fn run(&mut self) {
        for run in 0..self.num_runs {
            info!("Run: {}", run + 1);
            let (min, max) = self.temperature_bounds();
            self.initialize_material_tables(min, max);
            let mut energy_per_phonon = self.refresh_energy();

            let mut iter = 0;
            let mut reset_required = true;
            while reset_required {
                iter += 1;
                if iter > MAX_ITERS {
                    break;
                }
                {
                    let ctx = SimContext {
                        cells: &self.cells,
                        sensors: &self.sensors,
                        materials: &self.materials,
                    };
                    self.tracer.init_sources(self.t_eq, energy_per_phonon, &ctx);
                    self.tracer.run(self.t_eq, &ctx);
                }
                match self.check_stability() {
                    Some(new_t_eq) if iter < MAX_ITERS && !self.phasor_sim => {
                        self.reset(false);
                        self.t_eq = new_t_eq;
                        info!("system not stable");
                        info!("updated t_eq: {}", self.t_eq);
                    }
                    _ => reset_required = false,
                }
                energy_per_phonon = self.refresh_energy();
            }
            if iter >= MAX_ITERS {
                warn!("system did not stabilize within {} passes", MAX_ITERS);
            }
            self.store_results();
            if run + 1 < self.num_runs {
                // Full reset: the next run starts over from the
                // user-specified initial temperatures.
                self.reset(true);
            }
        }
    }

    pub fn export_results(&self, filepath: &Path, time: f64) -> sink::Result<()> {
        self.sink.export(filepath, time, self.num_runs, self.sim_type)
    }

    /// Measurements collected so far, one set per completed run.
    pub fn measurements(&self) -> &[Vec<SensorMeasurements>] {
        self.sink.runs()
    }

    pub fn t_eq(&self) -> f64 {
        self.t_eq
    }

    /// Total energy one pass must distribute over the phonon budget,
    /// refreshed whenever `t_eq` moves.
    fn refresh_energy(&mut self) -> f64 {
        let total_energy = self.total_initial_energy();
        let energy_per_phonon = total_energy / self.num_phonons as f64;
        self.interpreter.set_params(self.t_eq, energy_per_phonon);
        energy_per_phonon
    }

    fn total_initial_energy(&self) -> f64 {
        self.cells
            .iter()
            .map(|cell| {
                let sensor = &self.sensors[cell.sensor()];
                let material = &self.materials[sensor.material()];
                cell.init_energy(self.t_eq, sensor) + cell.emit_energy(self.t_eq, material)
            })
            .sum()
    }

    /// The extreme temperatures the model can reach, from cell initial
    /// temperatures and emitting surface temperatures. Also primes the
    /// inversion bounds, padded by the phasor-aware margin.
    fn temperature_bounds(&mut self) -> (f64, f64) {
        let mut temperatures = Vec::new();
        for cell in &self.cells {
            temperatures.push(self.sensors[cell.sensor()].init_temp());
            for boundary in cell.boundaries() {
                for es in boundary.emit_surfaces() {
                    temperatures.push(es.temp());
                }
            }
        }
        let min = temperatures.iter().cloned().fold(::std::f64::INFINITY, f64::min);
        let max = temperatures.iter().cloned().fold(::std::f64::NEG_INFINITY, f64::max);
        let bound = if self.phasor_sim { PHASOR_TEMP_BOUND_EPS } else { TEMP_BOUND_EPS };
        self.interpreter.set_bounds(f64::max(min - bound, 0.0), max + bound);
        (min, max)
    }

    fn initialize_material_tables(&mut self, low_temp: f64, high_temp: f64) {
        for material in &mut self.materials {
            material.initialize_tables(low_temp, high_temp, TEMP_INTERVAL);
        }
        for sensor in self.sensors.iter_mut() {
            sensor.update_tables(&self.materials[sensor.material()]);
        }
        for cell in self.cells.iter_mut() {
            let material = &self.materials[self.sensors[cell.sensor()].material()];
            cell.update_emit_tables(material);
        }
    }

    /// Area-weighted average steady temperature over all sensors.
    fn avg_temp(&self) -> f64 {
        let total_area: f64 = self.sensors.iter().map(Sensor::area).sum();
        self.sensors
            .iter()
            .map(|sensor| sensor.steady_temp(0) * sensor.area() / total_area)
            .sum()
    }

    /// Checks sensor stability at the end of a pass. Returns the
    /// updated equilibrium temperature when another pass is needed:
    /// too few stable sensors, or `t_eq` itself still moving.
    fn check_stability(&mut self) -> Option<f64> {
        let total_sensors = self.sensors.len();
        let mut stable_sensors = 0;
        {
            let interpreter = &self.interpreter;
            let materials = &self.materials;
            let sim_type = self.sim_type;
            let start_step = self.start_step;
            for sensor in self.sensors.iter_mut() {
                let stable = if sim_type != SimulationType::Transient {
                    let t_final = interpreter.final_temp(sensor, &materials[sensor.material()], start_step);
                    sensor.is_stable(t_final, Vec::new())
                } else {
                    let final_temps = interpreter.final_temps(sensor, &materials[sensor.material()]);
                    sensor.is_stable(0.0, final_temps)
                };
                if stable {
                    stable_sensors += 1;
                }
            }
        }
        info!("stable sensors: {}/{}", stable_sensors, total_sensors);

        let new_t_eq = if self.t_eq == 0.0 || self.sim_type == SimulationType::Transient {
            self.t_eq
        } else {
            self.avg_temp()
        };
        let t_eq_moved = (new_t_eq - self.t_eq).abs() / self.t_eq * 1000.0 > TEQ_THRESHOLD as f64;
        if stable_sensors * 100 / total_sensors < RESET_THRESHOLD || t_eq_moved {
            Some(new_t_eq)
        } else {
            None
        }
    }

    fn store_results(&mut self) {
        let measurements: Vec<SensorMeasurements> = {
            let interpreter = &self.interpreter;
            let materials = &self.materials;
            self.sensors
                .par_iter()
                .map(|sensor| interpreter.scale_heat_params(sensor, &materials[sensor.material()]))
                .collect()
        };
        self.sink.add_run(measurements);
    }

    fn reset(&mut self, full_reset: bool) {
        self.tracer.reset();
        for sensor in self.sensors.iter_mut() {
            sensor.reset(full_reset, &self.materials[sensor.material()]);
        }
    }
}
