//!
//! Staged assembly of a simulation. Materials must be added first,
//! then the sensors that reference them, then the cells linked to the
//! sensors; emitting surfaces go in last, once every edge they could
//! land on exists. Transition surfaces are installed automatically by
//! a pairwise shared-edge scan as cells are added.
//!

use super::cell::{link_transition_surfaces, Cell};
use super::error::{Error, Result};
use super::interpreter::SensorInterpreter;
use super::sensor::Sensor;
use super::sim::Simulation;
use super::tracer::Tracer;
use super::SimulationType;
use geom::{approx_equal, Line, Point, Triangle};
use material::{DispersionData, Material, RelaxationData};
use sink::ResultsSink;
use std::collections::HashMap;

/// Share of the measurement steps used for steady-state readings.
const SS_STEPS_PERCENT: f64 = 0.1;

#[derive(Debug, Clone, Copy)]
pub struct SimulationParams {
    pub num_runs: usize,
    pub measurement_steps: usize,
    pub num_phonons: usize,
    pub simulation_time: f64,
    /// Equilibrium temperature of the deviational approach; 0 selects
    /// a full simulation.
    pub t_eq: f64,
    pub phasor_sim: bool,
}

pub struct SimulationBuilder {
    params: SimulationParams,
    sim_type: SimulationType,
    step_interval: usize,
    start_step: usize,
    step_adjustment: usize,
    materials: Vec<Material>,
    material_ids: HashMap<String, usize>,
    sensors: Vec<Sensor>,
    cells: Vec<Cell>,
}

impl SimulationBuilder {
    pub fn new(params: SimulationParams) -> SimulationBuilder {
        SimulationBuilder {
            params,
            sim_type: SimulationType::SteadyState,
            step_interval: 0,
            start_step: 0,
            step_adjustment: 0,
            materials: Vec::new(),
            material_ids: HashMap::new(),
            sensors: Vec::new(),
            cells: Vec::new(),
        }
    }

    /// Selects the simulation regime. Checked here so a bad setting
    /// fails before any expensive work: the step interval must be
    /// positive exactly for periodic and transient runs, and transient
    /// runs require the deviational approach.
    pub fn simulation_type(&mut self, sim_type: SimulationType, step_interval: usize) -> Result<()> {
        self.sim_type = sim_type;
        self.start_step = 0;
        self.step_adjustment = 0;
        let steps = self.params.measurement_steps as f64;
        match sim_type {
            SimulationType::Periodic | SimulationType::Transient => {
                self.start_step = (steps - steps * SS_STEPS_PERCENT) as usize;
                if step_interval == 0 {
                    return Err(Error::Config(
                        "step interval of 0 is invalid for transient and periodic simulations".to_string(),
                    ));
                }
            }
            SimulationType::SteadyState => {
                self.step_adjustment = (steps - steps * SS_STEPS_PERCENT) as usize;
                if step_interval > 0 {
                    return Err(Error::Config(
                        "step interval > 0 is invalid for steady-state simulations".to_string(),
                    ));
                }
            }
        }
        if sim_type == SimulationType::Transient && self.params.t_eq == 0.0 {
            return Err(Error::Config(
                "transient simulations must be run using the deviational approach".to_string(),
            ));
        }
        self.step_interval = step_interval;
        Ok(())
    }

    pub fn add_material(&mut self, name: &str, disp: &DispersionData, relax: &RelaxationData) -> Result<()> {
        if self.material_ids.contains_key(name) {
            return Err(Error::DuplicateMaterial(name.to_string()));
        }
        let id = self.materials.len();
        let mut material = Material::new(id, disp, relax);
        if self.params.t_eq == 0.0 {
            material.set_full_simulation();
        }
        self.material_ids.insert(name.to_string(), id);
        self.materials.push(material);
        Ok(())
    }

    pub fn add_sensor(&mut self, id: usize, material_name: &str, t_init: f64) -> Result<()> {
        if self.sensors.iter().any(|s| s.id() == id) {
            return Err(Error::DuplicateSensor(id));
        }
        let material = *self
            .material_ids
            .get(material_name)
            .ok_or_else(|| Error::UnknownMaterial(material_name.to_string()))?;
        let steps_to_record = match self.sim_type {
            SimulationType::SteadyState => {
                (self.params.measurement_steps as f64 * SS_STEPS_PERCENT) as usize
            }
            _ => self.params.measurement_steps,
        };
        self.sensors.push(Sensor::new(id, material, self.sim_type, steps_to_record, t_init));
        Ok(())
    }

    /// Adds a triangular cell linked to a sensor. The new cell is
    /// validated against every existing cell and any shared edges
    /// become transition surfaces.
    pub fn add_cell(&mut self, triangle: Triangle, sensor_id: usize, specularity: f64) -> Result<()> {
        let sensor_index = self.sensor_index(sensor_id)?;
        let area = triangle.area();
        let new_index = self.cells.len();
        self.cells.push(Cell::new(triangle, sensor_index, specularity));
        {
            let (existing, incoming) = self.cells.split_at_mut(new_index);
            let new_cell = &mut incoming[0];
            for (index, cell) in existing.iter_mut().enumerate() {
                if *new_cell == *cell {
                    return Err(Error::DuplicateCell(new_cell.triangle().clone()));
                }
                new_cell.validate(cell)?;
                link_transition_surfaces(new_cell, new_index, cell, index)?;
            }
        }
        self.sensors[sensor_index].add_to_area(area);
        Ok(())
    }

    /// Adds an axis-aligned rectangular region as two right triangles
    /// sharing one sensor. `p1` and `p2` are opposite corners.
    pub fn add_rect_cell(&mut self, p1: Point, p2: Point, sensor_id: usize, specularity: f64) -> Result<()> {
        if approx_equal(p1.x, p2.x) || approx_equal(p1.y, p2.y) {
            return Err(Error::Config("these points do not specify a rectangle".to_string()));
        }
        let t1 = Triangle::new(p1, Point::new(p1.x, p2.y), Point::new(p2.x, p1.y))?;
        let t2 = Triangle::new(p2, Point::new(p2.x, p1.y), Point::new(p1.x, p2.y))?;
        self.add_cell(t1, sensor_id, specularity)?;
        self.add_cell(t2, sensor_id, specularity)
    }

    /// Turns the segment between the two points into an emitting
    /// surface on whichever cell edge carries it. A window narrower
    /// than the whole run makes the surface transient, which is only
    /// allowed in transient simulations.
    pub fn add_emit_surface(&mut self, p1: Point, p2: Point, temp: f64, duration: f64, start_time: f64) -> Result<()> {
        let simulation_time = self.params.simulation_time;
        if start_time < 0.0
            || start_time >= simulation_time
            || duration < 0.0
            || duration > simulation_time - start_time
        {
            return Err(Error::Config(
                "emit surface start_time or duration specifications are invalid".to_string(),
            ));
        }
        if (start_time > 0.0 || duration < simulation_time) && self.sim_type != SimulationType::Transient {
            return Err(Error::Config(
                "cannot add a transient surface to a non transient simulation".to_string(),
            ));
        }
        let line = Line::new(p1, p2)?;
        for cell in &mut self.cells {
            if cell.set_emit_surface(&line, temp, duration, start_time)? {
                return Ok(());
            }
        }
        Err(Error::EmitSurfacePlacement(line))
    }

    pub fn build(self) -> Simulation {
        let tracer = {
            let mut tracer = Tracer::new(self.params.measurement_steps, self.params.simulation_time, self.params.phasor_sim);
            tracer.set_step_adjustment(self.step_adjustment);
            tracer
        };
        let mut sink = ResultsSink::new();
        if self.step_interval > 0 {
            sink.set_step_interval(self.step_interval);
        }
        Simulation::new(
            self.params,
            self.sim_type,
            self.start_step,
            tracer,
            SensorInterpreter::new(),
            sink,
            self.cells,
            self.sensors,
            self.materials,
        )
    }

    fn sensor_index(&self, sensor_id: usize) -> Result<usize> {
        self.sensors
            .iter()
            .position(|s| s.id() == sensor_id)
            .ok_or(Error::UnknownSensor(sensor_id))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn params(t_eq: f64) -> SimulationParams {
        SimulationParams {
            num_runs: 1,
            measurement_steps: 100,
            num_phonons: 1000,
            simulation_time: 10.0,
            t_eq,
            phasor_sim: false,
        }
    }

    fn silicon_disp() -> DispersionData {
        DispersionData {
            la: [-2.22e-7, 9260.0, 0.0],
            ta: [-2.28e-7, 5240.0, 0.0],
            max_freq_la: 7.63e13,
            max_freq_ta: 3.0e13,
        }
    }

    fn silicon_relax() -> RelaxationData {
        RelaxationData {
            b_l: 2.0e-24,
            b_tn: 9.3e-13,
            b_tu: 5.5e-18,
            b_i: 1.32e-45,
            w: 2.42e13,
        }
    }

    fn builder_with_sensor(t_eq: f64) -> SimulationBuilder {
        let mut builder = SimulationBuilder::new(params(t_eq));
        builder.simulation_type(SimulationType::SteadyState, 0).unwrap();
        builder.add_material("silicon", &silicon_disp(), &silicon_relax()).unwrap();
        builder.add_sensor(0, "silicon", 300.0).unwrap();
        builder
    }

    fn tri(points: [(f64, f64); 3]) -> Triangle {
        Triangle::new(
            Point::new(points[0].0, points[0].1),
            Point::new(points[1].0, points[1].1),
            Point::new(points[2].0, points[2].1),
        ).unwrap()
    }

    #[test]
    fn transient_requires_a_deviational_run() {
        let mut builder = SimulationBuilder::new(params(0.0));
        match builder.simulation_type(SimulationType::Transient, 10) {
            Err(Error::Config(_)) => {}
            _ => panic!("expected a configuration error"),
        }
    }

    #[test]
    fn step_interval_must_match_the_regime() {
        let mut builder = SimulationBuilder::new(params(300.0));
        assert!(builder.simulation_type(SimulationType::Periodic, 0).is_err());
        assert!(builder.simulation_type(SimulationType::SteadyState, 5).is_err());
        assert!(builder.simulation_type(SimulationType::Periodic, 5).is_ok());
        assert!(builder.simulation_type(SimulationType::SteadyState, 0).is_ok());
    }

    #[test]
    fn duplicate_names_and_ids_are_rejected() {
        let mut builder = builder_with_sensor(300.0);
        assert!(builder.add_material("silicon", &silicon_disp(), &silicon_relax()).is_err());
        assert!(builder.add_sensor(0, "silicon", 310.0).is_err());
        assert!(builder.add_sensor(1, "germanium", 310.0).is_err());
    }

    #[test]
    fn cells_contained_in_existing_cells_are_rejected() {
        let mut builder = builder_with_sensor(300.0);
        builder.add_cell(tri([(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]), 0, 1.0).unwrap();
        match builder.add_cell(tri([(1.0, 1.0), (2.0, 1.0), (1.0, 2.0)]), 0, 1.0) {
            Err(Error::CellContained(..)) => {}
            _ => panic!("expected a containment error"),
        }
    }

    #[test]
    fn duplicate_cells_are_rejected() {
        let mut builder = builder_with_sensor(300.0);
        builder.add_cell(tri([(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]), 0, 1.0).unwrap();
        match builder.add_cell(tri([(0.0, 10.0), (0.0, 0.0), (10.0, 0.0)]), 0, 1.0) {
            Err(Error::DuplicateCell(..)) => {}
            _ => panic!("expected a duplicate cell error"),
        }
    }

    #[test]
    fn rect_cells_come_in_linked_pairs() {
        let mut builder = builder_with_sensor(300.0);
        builder.add_rect_cell(Point::new(0.0, 0.0), Point::new(10.0, 5.0), 0, 1.0).unwrap();
        // the diagonal of the rectangle links the two halves
        let transitions: usize = (0..2)
            .map(|i| {
                builder.cells[i]
                    .boundaries()
                    .iter()
                    .map(|b| b.transition_surfaces().len())
                    .sum::<usize>()
            })
            .sum();
        assert_eq!(transitions, 2);
    }

    #[test]
    fn emit_surfaces_must_land_on_a_cell_edge() {
        let mut builder = builder_with_sensor(300.0);
        builder.add_cell(tri([(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]), 0, 1.0).unwrap();
        assert!(builder
            .add_emit_surface(Point::new(1.0, 0.0), Point::new(4.0, 0.0), 350.0, 10.0, 0.0)
            .is_ok());
        match builder.add_emit_surface(Point::new(1.0, 1.0), Point::new(4.0, 1.0), 350.0, 10.0, 0.0) {
            Err(Error::EmitSurfacePlacement(_)) => {}
            _ => panic!("expected a placement error"),
        }
    }

    #[test]
    fn transient_surfaces_need_a_transient_simulation() {
        let mut builder = builder_with_sensor(300.0);
        builder.add_cell(tri([(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]), 0, 1.0).unwrap();
        match builder.add_emit_surface(Point::new(1.0, 0.0), Point::new(4.0, 0.0), 350.0, 2.0, 0.0) {
            Err(Error::Config(_)) => {}
            _ => panic!("expected a configuration error"),
        }
        // out-of-range windows fail regardless of the regime
        assert!(builder
            .add_emit_surface(Point::new(1.0, 0.0), Point::new(4.0, 0.0), 350.0, 20.0, 0.0)
            .is_err());
    }
}
