//!
//! JSON input format of the simulator and the loader that turns an
//! input file into a ready-to-run simulation.
//!

use super::error::Result;
use super::simbuilder::{SimulationBuilder, SimulationParams};
use super::sim::Simulation;
use super::SimulationType;
use ::serde_json;
use geom::{Point, Triangle};
use material::{DispersionData, RelaxationData};
use std::fs::File;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct InputData {
    pub settings: Settings,
    pub materials: Vec<MaterialData>,
    pub sensors: Vec<SensorData>,
    pub cells: Vec<CellData>,
    pub emit_surfaces: Vec<EmitSurfaceData>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    /// 0 = steady state, 1 = periodic, 2 = transient.
    pub sim_type: u32,
    pub num_phonons: usize,
    pub num_measurements: usize,
    pub sim_time: f64,
    pub t_eq: f64,
    pub phasor_sim: bool,
    #[serde(default)]
    pub step_interval: usize,
    #[serde(default = "default_num_runs")]
    pub num_runs: usize,
}

fn default_num_runs() -> usize {
    1
}

#[derive(Debug, Deserialize)]
pub struct MaterialData {
    pub name: String,
    pub d_data: DData,
    pub r_data: RData,
}

#[derive(Debug, Deserialize)]
pub struct DData {
    pub la_data: [f64; 3],
    pub ta_data: [f64; 3],
    pub max_freq_la: f64,
    pub max_freq_ta: f64,
}

#[derive(Debug, Deserialize)]
pub struct RData {
    pub b_l: f64,
    pub b_tn: f64,
    pub b_tu: f64,
    pub b_i: f64,
    pub w: f64,
}

#[derive(Debug, Deserialize)]
pub struct SensorData {
    pub id: usize,
    pub material: String,
    pub t_init: f64,
}

#[derive(Debug, Deserialize)]
pub struct CellData {
    pub triangle: TriangleData,
    #[serde(rename = "sensorID")]
    pub sensor_id: usize,
    pub specularity: f64,
}

#[derive(Debug, Deserialize)]
pub struct TriangleData {
    pub p1: PointData,
    pub p2: PointData,
    pub p3: PointData,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct PointData {
    pub x: f64,
    pub y: f64,
}

impl PointData {
    fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Debug, Deserialize)]
pub struct EmitSurfaceData {
    pub p1: PointData,
    pub p2: PointData,
    pub temp: f64,
    pub duration: f64,
    pub start_time: f64,
}

/// Reads a simulation from a JSON input file.
pub fn load(filepath: &Path) -> Result<Simulation> {
    let file = File::open(filepath)?;
    let data: InputData = serde_json::from_reader(file)?;
    build(&data)
}

/// Assembles a simulation from parsed input, in the order the builder
/// requires: regime, materials, sensors, cells, emitting surfaces.
pub fn build(data: &InputData) -> Result<Simulation> {
    let sim_type = match data.settings.sim_type {
        1 => SimulationType::Periodic,
        2 => SimulationType::Transient,
        _ => SimulationType::SteadyState,
    };
    let params = SimulationParams {
        num_runs: data.settings.num_runs,
        measurement_steps: data.settings.num_measurements,
        num_phonons: data.settings.num_phonons,
        simulation_time: data.settings.sim_time,
        t_eq: data.settings.t_eq,
        phasor_sim: data.settings.phasor_sim,
    };

    let mut builder = SimulationBuilder::new(params);
    builder.simulation_type(sim_type, data.settings.step_interval)?;

    for material in &data.materials {
        let disp = DispersionData {
            la: material.d_data.la_data,
            ta: material.d_data.ta_data,
            max_freq_la: material.d_data.max_freq_la,
            max_freq_ta: material.d_data.max_freq_ta,
        };
        let relax = RelaxationData {
            b_l: material.r_data.b_l,
            b_tn: material.r_data.b_tn,
            b_tu: material.r_data.b_tu,
            b_i: material.r_data.b_i,
            w: material.r_data.w,
        };
        builder.add_material(&material.name, &disp, &relax)?;
    }
    for sensor in &data.sensors {
        builder.add_sensor(sensor.id, &sensor.material, sensor.t_init)?;
    }
    for cell in &data.cells {
        let triangle = Triangle::new(
            cell.triangle.p1.point(),
            cell.triangle.p2.point(),
            cell.triangle.p3.point(),
        )?;
        builder.add_cell(triangle, cell.sensor_id, cell.specularity)?;
    }
    for surface in &data.emit_surfaces {
        builder.add_emit_surface(
            surface.p1.point(),
            surface.p2.point(),
            surface.temp,
            surface.duration,
            surface.start_time,
        )?;
    }
    Ok(builder.build())
}
