//!
//! The inner loop of the simulation. A tracer drives every phonon
//! from birth to the end of its life: drifting, colliding with cell
//! surfaces, scattering and reporting into sensors at measurement
//! steps. Phonons are independent tasks and are traced in parallel.
//!

use super::source::{CellSource, PhononSource, SurfaceSource};
use super::SimContext;
use ::rand::{self, Rng};
use ::rayon::prelude::*;
use geom::{Line, Point};
use phonon::Phonon;
use sampling::urand;
use std::mem;

/// Scattering times are drawn in nanoseconds per second of rate.
const SCALING_FACTOR: f64 = 1e9;
/// Above this phonon count the tracer streams phonons out of the
/// sources instead of materializing them all up front.
const PHONON_CUTOFF: usize = 5_000_000;
/// Cap on the phonons a single source carries, so parallel work units
/// stay balanced.
const SOURCE_MAX_PHONONS: usize = 100_000;
/// Velocity components below this are treated as zero when computing
/// impact times. A phonon this slow moves a few nanometers over a
/// whole run, which is within the geometric tolerance.
const VELOCITY_EPS: f64 = 0.01;
/// A phonon colliding this often without drifting is stuck in a tight
/// corner and gets repositioned to a random point of its cell.
const MAX_COLLISIONS: usize = 100;

pub struct Tracer {
    sources: Vec<PhononSource>,
    /// Time at which each measurement takes place.
    step_times: Vec<f64>,
    step_time: f64,
    phasor_sim: bool,
    /// First measurement step the sensors record. Non-zero for
    /// steady-state runs, which only keep the final window.
    step_adjustment: usize,
    total_phonons: usize,
}

impl Tracer {
    pub fn new(measurement_steps: usize, simulation_time: f64, phasor_sim: bool) -> Tracer {
        let step_time = simulation_time / measurement_steps as f64;
        Tracer {
            sources: Vec::new(),
            step_times: (1..measurement_steps + 1).map(|n| n as f64 * step_time).collect(),
            step_time,
            phasor_sim,
            step_adjustment: 0,
            total_phonons: 0,
        }
    }

    pub fn set_step_adjustment(&mut self, step_adjustment: usize) {
        self.step_adjustment = step_adjustment;
    }

    pub fn step_time(&self) -> f64 {
        self.step_time
    }

    pub fn total_phonons(&self) -> usize {
        self.total_phonons
    }

    pub fn reset(&mut self) {
        self.total_phonons = 0;
        self.sources.clear();
    }

    /// Builds the phonon sources for one run: one batch per cell with
    /// initial energy, one source per emitting surface, all chunked to
    /// `SOURCE_MAX_PHONONS`. Fractional phonon counts are rounded
    /// stochastically so the expected energy is preserved.
    pub fn init_sources(&mut self, t_eq: f64, eff_energy: f64, ctx: &SimContext) {
        let phonons_for = |fractional_energy: f64| {
            let phonons = fractional_energy / eff_energy;
            let num_phonons = phonons.floor();
            if urand() < phonons - num_phonons {
                num_phonons as usize + 1
            } else {
                num_phonons as usize
            }
        };

        let mut cell_source = CellSource::new();
        for (cell_index, cell) in ctx.cells.iter().enumerate() {
            let sensor = ctx.sensor_of(cell);
            let material = ctx.material_of(cell);

            let init_phonons = phonons_for(cell.init_energy(t_eq, sensor));
            if init_phonons > 0 {
                self.total_phonons += init_phonons;
                // Half the usual cap: cell phonons live longer than
                // emitted ones.
                let packed = cell_source.total_phonons();
                if packed != 0 && packed + init_phonons > SOURCE_MAX_PHONONS / 2 {
                    self.sources.push(PhononSource::CellOrigin(cell_source));
                    cell_source = CellSource::new();
                }
                cell_source.add_cell_phonons(cell_index, init_phonons);
            }

            for (edge, boundary) in cell.boundaries().iter().enumerate() {
                for (emit, es) in boundary.emit_surfaces().iter().enumerate() {
                    let temp = es.temp();
                    let energy_factor = material.emit_energy(temp) * es.duration() * es.surface().length() / 4.0;
                    let emit_energy = if t_eq == 0.0 {
                        energy_factor
                    } else {
                        energy_factor * (t_eq - temp).abs()
                    };
                    let mut emit_phonons = phonons_for(emit_energy);
                    self.total_phonons += emit_phonons;
                    while emit_phonons > SOURCE_MAX_PHONONS {
                        self.push_surface_source(SurfaceSource::new(cell_index, edge, emit, SOURCE_MAX_PHONONS));
                        emit_phonons -= SOURCE_MAX_PHONONS;
                    }
                    self.push_surface_source(SurfaceSource::new(cell_index, edge, emit, emit_phonons));
                }
            }
        }
        if cell_source.has_phonons() {
            self.sources.push(PhononSource::CellOrigin(cell_source));
        }
    }

    fn push_surface_source(&mut self, source: SurfaceSource) {
        if self.phasor_sim {
            self.sources.push(PhononSource::Phasor(source));
        } else {
            self.sources.push(PhononSource::SurfaceOrigin(source));
        }
    }

    /// Traces every phonon of the current sources to completion. The
    /// sources are consumed by the run.
    pub fn run(&mut self, t_eq: f64, ctx: &SimContext) {
        if self.total_phonons < PHONON_CUTOFF {
            self.run_phonon_by_phonon(t_eq, ctx);
        } else {
            self.run_using_sources(t_eq, ctx);
        }
    }

    /// Materializes all phonons and shuffles them before the parallel
    /// sweep, so simultaneous workers spread across sensors instead of
    /// contending for the same accumulation mutex.
    fn run_phonon_by_phonon(&mut self, t_eq: f64, ctx: &SimContext) {
        let mut sources = mem::replace(&mut self.sources, Vec::new());
        let mut phonons = Vec::with_capacity(self.total_phonons);
        for source in &mut sources {
            while source.has_phonons() {
                phonons.push(source.next_phonon(t_eq, ctx));
            }
        }
        rand::thread_rng().shuffle(&mut phonons);
        let tracer: &Tracer = self;
        phonons
            .into_par_iter()
            .for_each(|p| tracer.trace_phonon(p, ctx));
    }

    /// Streams phonons straight out of the sources, one worker per
    /// source, without ever holding the full population in memory.
    fn run_using_sources(&mut self, t_eq: f64, ctx: &SimContext) {
        let sources = mem::replace(&mut self.sources, Vec::new());
        let tracer: &Tracer = self;
        sources.into_par_iter().for_each(|mut source| {
            while source.has_phonons() {
                tracer.trace_phonon(source.next_phonon(t_eq, ctx), ctx);
            }
        });
    }

    /// Drives one phonon until its lifetime runs out or it leaves the
    /// system through an emitting surface.
    fn trace_phonon(&self, mut p: Phonon, ctx: &SimContext) {
        let measurement_steps = self.step_times.len();
        let mut phonon_age = p.lifetime();
        let mut step = (phonon_age / self.step_time) as usize;
        p.set_lifestep(step);
        let mut relax_rates = [0.0; 3];
        let mut time_to_scatter = 0.0;
        let mut time_to_measurement = 0.0;

        loop {
            let cell_index = match p.cell() {
                Some(index) => index,
                None => break,
            };
            // A scatter happened on the previous iteration: draw new
            // rates and the time to the next scattering event.
            if time_to_scatter <= 0.0 {
                relax_rates = self.relax_rates(&p, cell_index, step, ctx);
                let rate: f64 = relax_rates.iter().sum();
                time_to_scatter = SCALING_FACTOR * -urand().ln() / rate;
            }
            if time_to_measurement <= 0.0 {
                time_to_measurement = self.step_times[step] - phonon_age;
            }
            // Drift until the next non-impact event.
            let mut drift_time = time_to_scatter.min(time_to_measurement);
            let sensor_id = ctx.cells[cell_index].sensor();

            let drifted_time = match self.handle_impacts(&mut p, drift_time, sensor_id, ctx) {
                Some(drifted_time) => drifted_time,
                // The phonon was absorbed by an emitting surface.
                None => break,
            };
            if p.cell().map(|index| ctx.cells[index].sensor()) != Some(sensor_id) {
                // The phonon entered a different sensor area, so the
                // pending scatter time is no longer valid. Cut the
                // drift short and restart with fresh rates.
                drift_time = drifted_time;
            }
            p.drift(drift_time - drifted_time);
            phonon_age += drift_time;
            time_to_measurement -= drift_time;
            time_to_scatter -= drift_time;

            if time_to_measurement == 0.0 {
                step += 1;
                if step < measurement_steps {
                    p.set_lifestep(step);
                    if step >= self.step_adjustment {
                        if let Some(index) = p.cell() {
                            let cell = &ctx.cells[index];
                            ctx.sensors[cell.sensor()].update_heat_params(&p, step - self.step_adjustment);
                        }
                    }
                } else {
                    break;
                }
            } else if !self.phasor_sim && time_to_scatter == 0.0 {
                scatter(&mut p, &relax_rates, ctx);
            } else {
                // Entered a new sensor area: force a fresh scatter draw.
                time_to_scatter = 0.0;
            }
        }
    }

    /// Chains surface impacts within one drift window. Returns the
    /// time spent reaching impacts, or `None` when the phonon left the
    /// system. Returns early when the phonon crosses into another
    /// sensor area, since its scattering rates must be refreshed.
    fn handle_impacts(&self, p: &mut Phonon, drift_time: f64, sensor_id: usize, ctx: &SimContext) -> Option<f64> {
        let mut impact_time = self.next_impact(p, drift_time, ctx);
        let mut drifted_time = 0.0;
        let mut collision_counter = 0;
        while let Some(time) = impact_time {
            let cell_index = match p.cell() {
                Some(index) => index,
                None => return None,
            };
            drifted_time += time;
            collision_counter += 1;
            if collision_counter > MAX_COLLISIONS {
                // Stuck bouncing in a corner, almost always from
                // floating point trouble. Move it somewhere sane and
                // give up on this drift window.
                let point = ctx.cells[cell_index].rand_point(urand(), urand());
                p.set_position(point.x, point.y);
                return Some(drift_time);
            }
            if ctx.cells[cell_index].sensor() != sensor_id {
                return Some(drifted_time);
            }
            impact_time = self.next_impact(p, drift_time - drifted_time, ctx);
        }
        if p.outside_cell() {
            None
        } else {
            Some(drifted_time)
        }
    }

    /// Finds the first boundary of the current cell the phonon would
    /// hit within `time`, moves it there and dispatches the collision.
    /// Returns the time taken to reach the impact point.
    fn next_impact(&self, p: &mut Phonon, time: f64, ctx: &SimContext) -> Option<f64> {
        let cell = &ctx.cells[p.cell()?];
        let (px, py) = p.position();
        let velocity = p.velocity_vector();
        let start_point = Point::new(px, py);
        let end_point = Point::new(px + time * velocity.x, py + time * velocity.y);
        if start_point == end_point {
            return None;
        }
        let phonon_path = match Line::new(start_point, end_point) {
            Ok(line) => line,
            Err(_) => return None,
        };

        let time_along = |start_coord: f64, end_coord: f64, velocity: f64, max_time: f64| {
            if velocity > VELOCITY_EPS || velocity < -VELOCITY_EPS {
                (end_coord - start_coord) / velocity
            } else {
                max_time
            }
        };

        let mut time = time;
        let mut impact_point = None;
        for line in cell.boundary_lines().iter() {
            if let Some(poi) = line.intersection(&phonon_path) {
                if poi == start_point {
                    continue;
                }
                let impact_time_x = time_along(start_point.x, poi.x, velocity.x, time);
                let impact_time_y = time_along(start_point.y, poi.y, velocity.y, time);
                let impact_time = if impact_time_x <= impact_time_y {
                    impact_time_x
                } else {
                    impact_time_y
                };
                if impact_time <= time {
                    time = impact_time;
                    impact_point = Some(poi);
                }
            }
        }
        match impact_point {
            Some(poi) => {
                p.set_position(poi.x, poi.y);
                cell.handle_surface_collision(p, poi, self.step_time, ctx);
                Some(time)
            }
            None => None,
        }
    }

    fn relax_rates(&self, p: &Phonon, cell_index: usize, step: usize, ctx: &SimContext) -> [f64; 3] {
        let cell = &ctx.cells[cell_index];
        let temp = ctx.sensor_of(cell).steady_temp(step);
        ctx.material_of(cell).relax_rates(temp, p.freq(), p.polar())
    }
}

/// Applies one scattering event. Normal and Umklapp scatters resample
/// the phonon from the scatter table; Umklapp and impurity scatters
/// also randomize the direction.
fn scatter(p: &mut Phonon, relax_rates: &[f64; 3], ctx: &SimContext) {
    let (tau_n_inv, tau_u_inv, tau_i_inv) = (relax_rates[0], relax_rates[1], relax_rates[2]);
    let tau_inv = tau_n_inv + tau_u_inv + tau_i_inv;
    let rand = urand();
    if rand <= (tau_n_inv + tau_u_inv) / tau_inv {
        if let Some(index) = p.cell() {
            let cell = &ctx.cells[index];
            let sensor = ctx.sensor_of(cell);
            sensor.scatter_update(p, ctx.material_of(cell));
        }
        if rand > tau_n_inv / tau_inv {
            p.set_rand_direction();
        }
    } else if tau_i_inv > 0.0 {
        p.set_rand_direction();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use geom::Triangle;
    use material::{DispersionData, Material, RelaxationData};
    use sim::cell::Cell;
    use sim::sensor::Sensor;
    use sim::SimulationType;

    fn silicon() -> Material {
        let disp = DispersionData {
            la: [-2.22e-7, 9260.0, 0.0],
            ta: [-2.28e-7, 5240.0, 0.0],
            max_freq_la: 7.63e13,
            max_freq_ta: 3.0e13,
        };
        let relax = RelaxationData {
            b_l: 2.0e-24,
            b_tn: 9.3e-13,
            b_tu: 5.5e-18,
            b_i: 1.32e-45,
            w: 2.42e13,
        };
        Material::new(0, &disp, &relax)
    }

    fn single_cell_model() -> (Vec<Cell>, Vec<Sensor>, Vec<Material>) {
        let mut materials = vec![silicon()];
        materials[0].initialize_tables(290.0, 320.0, 0.1);
        let mut sensors = vec![Sensor::new(0, 0, SimulationType::SteadyState, 10, 310.0)];
        sensors[0].update_tables(&materials[0]);
        let triangle = Triangle::new(
            Point::new(0.0, 0.0),
            Point::new(1000.0, 0.0),
            Point::new(0.0, 1000.0),
        ).unwrap();
        let cell = Cell::new(triangle, 0, 1.0);
        sensors[0].add_to_area(cell.area());
        (vec![cell], sensors, materials)
    }

    #[test]
    fn step_times_cover_the_simulation() {
        let tracer = Tracer::new(4, 8.0, false);
        assert_eq!(tracer.step_times, vec![2.0, 4.0, 6.0, 8.0]);
        assert_eq!(tracer.step_time(), 2.0);
    }

    #[test]
    fn sources_are_sized_by_energy() {
        let (cells, sensors, materials) = single_cell_model();
        let ctx = SimContext {
            cells: &cells,
            sensors: &sensors,
            materials: &materials,
        };
        let mut tracer = Tracer::new(10, 10.0, false);
        // 10 K above equilibrium, eff energy = a tenth of the total
        let total = cells[0].init_energy(300.0, &sensors[0]);
        tracer.init_sources(300.0, total / 10.0, &ctx);
        // stochastic rounding may move the count by one
        assert!(tracer.total_phonons() >= 9 && tracer.total_phonons() <= 11);
        assert_eq!(tracer.sources.len(), 1);
        tracer.reset();
        assert_eq!(tracer.total_phonons(), 0);
    }

    #[test]
    fn impacts_land_on_the_boundary() {
        let (cells, sensors, materials) = single_cell_model();
        let ctx = SimContext {
            cells: &cells,
            sensors: &sensors,
            materials: &materials,
        };
        let tracer = Tracer::new(10, 10.0, false);
        let mut p = Phonon::new(1, 0.0, Some(0));
        p.set_position(500.0, 200.0);
        p.set_direction(-1.0, 0.0);
        p.scatter_update(0, 1e13, 1000.0, ::phonon::Polarization::LA);

        // Heading left at 1000 units per time unit: the x = 0 wall is
        // half a time unit away.
        let drifted = tracer.next_impact(&mut p, 1.0, &ctx).unwrap();
        assert!((drifted - 0.5).abs() < 1e-9);
        let (px, py) = p.position();
        assert!(px.abs() < 1e-9 && (py - 200.0).abs() < 1e-9);
        // Fully specular wall: the direction flipped.
        let (dx, _) = p.direction();
        assert!((dx - 1.0).abs() < 1e-9);
    }

    #[test]
    fn no_impact_within_a_short_drift() {
        let (cells, sensors, materials) = single_cell_model();
        let ctx = SimContext {
            cells: &cells,
            sensors: &sensors,
            materials: &materials,
        };
        let tracer = Tracer::new(10, 10.0, false);
        let mut p = Phonon::new(1, 0.0, Some(0));
        p.set_position(500.0, 200.0);
        p.set_direction(-1.0, 0.0);
        p.scatter_update(0, 1e13, 1000.0, ::phonon::Polarization::LA);
        assert_eq!(tracer.next_impact(&mut p, 0.1, &ctx), None);
    }

    #[test]
    fn traced_phonons_report_into_the_sensor() {
        let (cells, sensors, materials) = single_cell_model();
        let ctx = SimContext {
            cells: &cells,
            sensors: &sensors,
            materials: &materials,
        };
        let mut tracer = Tracer::new(100, 10.0, false);
        tracer.set_step_adjustment(90);
        let total = cells[0].init_energy(300.0, &sensors[0]);
        tracer.init_sources(300.0, total / 50.0, &ctx);
        let expected = tracer.total_phonons() as i64;
        tracer.run(300.0, &ctx);

        // A closed, fully reflective cell loses no phonons: every
        // recorded step sees the whole population.
        let energies = ctx.sensors[0].energies();
        assert_eq!(energies.len(), 10);
        for energy in &energies {
            assert_eq!(*energy, expected);
        }
    }
}
