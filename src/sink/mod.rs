//!
//! Serializes simulation results to plain text. One measurement set is
//! collected per run; multi-run simulations are averaged at export
//! time.
//!

use ::cgmath::Vector2;
use ::chrono::Utc;
use sim::sensor::SensorMeasurements;
use sim::SimulationType;
use std::error;
use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::result;

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
}

impl error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref err) => write!(f, "{}", err),
        }
    }
}

/// Collects sensor measurements run by run and writes them out in the
/// format matching the simulation regime.
pub struct ResultsSink {
    step_interval: usize,
    runs: Vec<Vec<SensorMeasurements>>,
}

impl ResultsSink {
    pub fn new() -> ResultsSink {
        ResultsSink {
            step_interval: 1,
            runs: Vec::new(),
        }
    }

    pub fn set_step_interval(&mut self, step_interval: usize) {
        self.step_interval = step_interval;
    }

    pub fn add_run(&mut self, mut measurements: Vec<SensorMeasurements>) {
        measurements.sort_by(|m1, m2| m1.id.cmp(&m2.id));
        self.runs.push(measurements);
    }

    pub fn runs(&self) -> &[Vec<SensorMeasurements>] {
        &self.runs
    }

    /// Writes the results next to the input file, with the filename
    /// prefixed by the export flavor and the extension replaced by
    /// `.txt`. An existing file is overwritten.
    pub fn export(&self, filepath: &Path, time: f64, num_runs: usize, sim_type: SimulationType) -> Result<()> {
        match sim_type {
            SimulationType::SteadyState => self.steady_state_export(filepath, time, num_runs),
            _ => self.periodic_export(filepath, time, num_runs),
        }
    }

    /// One line per sensor: steady temperature and both flux
    /// components, each with its standard error.
    fn steady_state_export(&self, filepath: &Path, time: f64, num_runs: usize) -> Result<()> {
        let mut output = File::create(adjust_path(filepath, "ss_"))?;
        writeln!(
            output,
            "Steady State Results from {} @ {} - Time Taken {}[s] over {} runs",
            filename_of(filepath),
            current_datetime(),
            time,
            num_runs
        )?;
        for m in &self.averaged() {
            writeln!(
                output,
                "{} {} {} {} {} {}",
                m.t_steady, m.std_t_steady, m.x_flux, m.std_x_flux, m.y_flux, m.std_y_flux
            )?;
        }
        Ok(())
    }

    /// Repeating blocks over the measurement steps: the midpoint of
    /// the step interval, the sensor count, then per-sensor averages
    /// of temperature and flux over the interval.
    fn periodic_export(&self, filepath: &Path, time: f64, num_runs: usize) -> Result<()> {
        let mut output = File::create(adjust_path(filepath, "per_"))?;
        writeln!(
            output,
            "Periodic Results from {} @ {} - Time Taken {}[s] over {} runs",
            filename_of(filepath),
            current_datetime(),
            time,
            num_runs
        )?;
        let measurements = self.averaged();
        if measurements.is_empty() {
            return Ok(());
        }
        let num_sensors = measurements.len();
        let measurement_steps = measurements[num_sensors - 1].final_temps.len();
        let interval = self.step_interval;

        let mut step = 0;
        while step + interval <= measurement_steps {
            writeln!(output, "{}", step + interval / 2)?;
            writeln!(output, "{}", num_sensors)?;
            for m in &measurements {
                let temp = m.final_temps[step..step + interval].iter().sum::<f64>() / interval as f64;
                let x_flux = m.final_fluxes[step..step + interval]
                    .iter()
                    .map(|flux| flux.x)
                    .sum::<f64>() / interval as f64;
                let y_flux = m.final_fluxes[step..step + interval]
                    .iter()
                    .map(|flux| flux.y)
                    .sum::<f64>() / interval as f64;
                writeln!(output, "{} {} {}", temp, x_flux, y_flux)?;
            }
            step += interval;
        }
        Ok(())
    }

    /// Element-wise average of all completed runs.
    fn averaged(&self) -> Vec<SensorMeasurements> {
        if self.runs.is_empty() {
            return Vec::new();
        }
        if self.runs.len() == 1 {
            return self.runs[0].clone();
        }
        let num_runs = self.runs.len() as f64;
        let first = &self.runs[0];
        (0..first.len())
            .map(|sensor| {
                let mut avg = SensorMeasurements {
                    id: first[sensor].id,
                    t_steady: 0.0,
                    std_t_steady: 0.0,
                    x_flux: 0.0,
                    std_x_flux: 0.0,
                    y_flux: 0.0,
                    std_y_flux: 0.0,
                    final_temps: vec![0.0; first[sensor].final_temps.len()],
                    final_fluxes: vec![Vector2::new(0.0, 0.0); first[sensor].final_fluxes.len()],
                };
                for run in &self.runs {
                    let m = &run[sensor];
                    avg.t_steady += m.t_steady;
                    avg.std_t_steady += m.std_t_steady;
                    avg.x_flux += m.x_flux;
                    avg.std_x_flux += m.std_x_flux;
                    avg.y_flux += m.y_flux;
                    avg.std_y_flux += m.std_y_flux;
                    for (acc, temp) in avg.final_temps.iter_mut().zip(&m.final_temps) {
                        *acc += *temp;
                    }
                    for (acc, flux) in avg.final_fluxes.iter_mut().zip(&m.final_fluxes) {
                        *acc += *flux;
                    }
                }
                avg.t_steady /= num_runs;
                avg.std_t_steady /= num_runs;
                avg.x_flux /= num_runs;
                avg.std_x_flux /= num_runs;
                avg.y_flux /= num_runs;
                avg.std_y_flux /= num_runs;
                for temp in avg.final_temps.iter_mut() {
                    *temp /= num_runs;
                }
                for flux in avg.final_fluxes.iter_mut() {
                    *flux /= num_runs;
                }
                avg
            })
            .collect()
    }
}

fn adjust_path(filepath: &Path, prefix: &str) -> PathBuf {
    let mut new_path = filepath.to_path_buf();
    new_path.set_extension("txt");
    let filename = filename_of(&new_path);
    new_path.set_file_name(format!("{}{}", prefix, filename));
    new_path
}

fn filename_of(filepath: &Path) -> String {
    filepath
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// UTC timestamp for the export header.
fn current_datetime() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
