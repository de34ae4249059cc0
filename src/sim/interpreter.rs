//!
//! Pure reader that converts the signed phonon counts a sensor has
//! accumulated into physical temperatures and heat fluxes. Deviational
//! runs scale linearly around the equilibrium temperature; full
//! simulations invert the theoretical energy curve numerically.
//!

use super::sensor::{Sensor, SensorMeasurements};
use ::cgmath::Vector2;
use material::Material;

/// Bisection tolerance of the numerical inversion.
const EPS: f64 = 0.0001;
const MAX_ITERS: usize = 40;

pub struct SensorInterpreter {
    /// Bounds of the numerical inversion; set from the extreme model
    /// temperatures before a run.
    lb: f64,
    ub: f64,
    t_eq: f64,
    /// Energy one simulated phonon stands for.
    eff_energy: f64,
}

impl SensorInterpreter {
    pub fn new() -> SensorInterpreter {
        SensorInterpreter {
            lb: 0.0,
            ub: 0.0,
            t_eq: 0.0,
            eff_energy: 0.0,
        }
    }

    pub fn set_bounds(&mut self, lb: f64, ub: f64) {
        self.lb = lb;
        self.ub = ub;
    }

    pub fn set_params(&mut self, t_eq: f64, eff_energy: f64) {
        self.t_eq = t_eq;
        self.eff_energy = eff_energy;
    }

    /// Full reading of one sensor: per-step temperatures and fluxes
    /// plus their mean and standard error over the recorded window.
    pub fn scale_heat_params(&self, sensor: &Sensor, material: &Material) -> SensorMeasurements {
        let fluxes = sensor.fluxes();
        let mut final_temps = self.find_temperature(sensor, material, 0);
        if let Some(first) = final_temps.first_mut() {
            *first = sensor.init_temp();
        }
        let flux_factor = self.eff_energy / sensor.area();
        let final_fluxes: Vec<Vector2<f64>> = fluxes.iter().map(|flux| *flux * flux_factor).collect();

        let (t_steady, std_t_steady) = avg_and_std_error(&final_temps);
        let (x_flux, std_x_flux) = avg_and_std_error(&final_fluxes.iter().map(|f| f.x).collect::<Vec<_>>());
        let (y_flux, std_y_flux) = avg_and_std_error(&final_fluxes.iter().map(|f| f.y).collect::<Vec<_>>());

        SensorMeasurements {
            id: sensor.id(),
            t_steady,
            std_t_steady,
            x_flux,
            std_x_flux,
            y_flux,
            std_y_flux,
            final_temps,
            final_fluxes,
        }
    }

    /// Mean temperature over the steps from `start_step` on. Used to
    /// judge stability at the end of a run.
    pub fn final_temp(&self, sensor: &Sensor, material: &Material, start_step: usize) -> f64 {
        if sensor.area() == 0.0 {
            return 0.0;
        }
        let steps = sensor.energies().len();
        let temps = self.find_temperature(sensor, material, start_step);
        temps.iter().sum::<f64>() / (steps - start_step) as f64
    }

    /// The temperature at every recorded step, for transient runs.
    pub fn final_temps(&self, sensor: &Sensor, material: &Material) -> Vec<f64> {
        self.find_temperature(sensor, material, 0)
    }

    fn find_temperature(&self, sensor: &Sensor, material: &Material, start_step: usize) -> Vec<f64> {
        let area = sensor.area();
        sensor.energies()[start_step..]
            .iter()
            .enumerate()
            .map(|(index, &energy_units)| {
                let energy = self.eff_energy * energy_units as f64;
                if self.t_eq != 0.0 {
                    // Linearized deviational reading; the step index
                    // only matters for transient heat capacities.
                    energy / (area * sensor.heat_capacity(index)) + self.t_eq
                } else {
                    self.inversion(material, area, energy, false)
                }
            })
            .collect()
    }

    /// Bisects the theoretical energy curve until it matches the
    /// accumulated energy.
    fn inversion(&self, material: &Material, area: f64, current_energy: f64, pseudo: bool) -> f64 {
        let mut lb = self.lb;
        let mut ub = self.ub;
        let mut temp = 0.0;
        let mut iter = 0;
        while ub - lb >= EPS {
            iter += 1;
            if iter == MAX_ITERS {
                break;
            }
            temp = (ub + lb) / 2.0;
            let de = material.theoretical_energy(temp, pseudo) * area - current_energy;
            if de < 0.0 {
                lb = temp;
            } else {
                ub = temp;
            }
        }
        temp
    }
}

fn avg_and_std_error(data: &[f64]) -> (f64, f64) {
    let size = data.len() as f64;
    let avg = data.iter().sum::<f64>() / size;
    let variance = data.iter().map(|value| (avg - value) * (avg - value)).sum::<f64>() / size;
    (avg, variance.sqrt() / size.sqrt())
}
