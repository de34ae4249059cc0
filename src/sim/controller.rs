//!
//! Per-regime sensor behavior. The controller owns the temperatures
//! and table handles a sensor samples from; the three regimes share a
//! common state block and differ in how they advance it between runs.
//!

use super::SimulationType;
use material::{Material, Table};
use phonon::Phonon;

/// Relative change below which a sensor temperature counts as stable
/// between two runs (0.001 = 0.1%).
const TEMP_THRESHOLD: f64 = 0.001;
/// Per-step relative change below which a transient temperature
/// history counts as stable against the previous run.
const TRANSIENT_TEMP_THRESHOLD: f64 = 0.02;

#[derive(Debug, Clone)]
enum Regime {
    SteadyState,
    Periodic,
    Transient {
        /// Per-measurement-step scatter table indices, heat capacities
        /// and steady temperatures.
        scatter_indices: Vec<usize>,
        heat_capacities: Vec<f64>,
        steady_temps: Vec<f64>,
    },
}

#[derive(Debug, Clone)]
pub struct SensorController {
    regime: Regime,
    t_init: f64,
    /// Steady temperature of the sensor area after the latest run.
    /// Selects the energy tables and heat capacity for the next one.
    t_steady: f64,
    /// Energy per unit volume in full simulations, heat capacity in
    /// deviational ones.
    heat_capacity: f64,
    base_index: usize,
    scatter_index: usize,
}

impl SensorController {
    pub fn new(sim_type: SimulationType, t_init: f64, num_measurements: usize) -> SensorController {
        let regime = match sim_type {
            SimulationType::SteadyState => Regime::SteadyState,
            SimulationType::Periodic => Regime::Periodic,
            SimulationType::Transient => Regime::Transient {
                scatter_indices: vec![0; num_measurements],
                heat_capacities: vec![0.0; num_measurements],
                steady_temps: vec![t_init; num_measurements],
            },
        };
        SensorController {
            regime,
            t_init,
            t_steady: t_init,
            heat_capacity: 0.0,
            base_index: 0,
            scatter_index: 0,
        }
    }

    /// The temperature the next run starts from. Steady-state runs
    /// restart from the previous steady temperature so the system
    /// converges faster; the periodic progression is not of interest
    /// there.
    pub fn init_temp(&self) -> f64 {
        match self.regime {
            Regime::SteadyState => self.t_steady,
            _ => self.t_init,
        }
    }

    pub fn steady_temp(&self, step: usize) -> f64 {
        match self.regime {
            Regime::Transient { ref steady_temps, .. } => {
                if step == 0 {
                    self.t_init
                } else {
                    steady_temps[step]
                }
            }
            _ => self.t_steady,
        }
    }

    pub fn heat_capacity(&self, step: usize) -> f64 {
        match self.regime {
            Regime::Transient { ref heat_capacities, .. } => heat_capacities[step],
            _ => self.heat_capacity,
        }
    }

    /// Gives a freshly built phonon its frequency, velocity and
    /// polarization from the given cumulative table.
    pub fn initial_update(&self, p: &mut Phonon, material: &Material, table: &Table) {
        let (index, polar) = Material::freq_index(table);
        p.scatter_update(index, material.freq(index), material.velocity(index, polar), polar);
    }

    /// Same as `initial_update` but samples the sensor's base table.
    pub fn initial_update_base(&self, p: &mut Phonon, material: &Material) {
        let (index, polar) = Material::freq_index(material.base_table_at(self.base_index));
        p.scatter_update(index, material.freq(index), material.velocity(index, polar), polar);
    }

    /// Resamples a scattered phonon from the scatter table. Transient
    /// sensors use the table of the phonon's current lifestep.
    pub fn scatter_update(&self, p: &mut Phonon, material: &Material) {
        let index = match self.regime {
            Regime::Transient { ref scatter_indices, .. } => scatter_indices[p.lifestep()],
            _ => self.scatter_index,
        };
        let (index, polar) = Material::freq_index(material.scatter_table_at(index));
        p.scatter_update(index, material.freq(index), material.velocity(index, polar), polar);
    }

    /// Points the controller at the tables for the initial
    /// temperature. Called once the material tables exist.
    pub fn update_tables(&mut self, material: &Material) {
        self.base_index = material.temp_index(self.t_init);
        self.heat_capacity = material.base_energy_at(self.base_index);
        self.scatter_index = material.temp_index(self.t_init);
        if let Regime::Transient {
            ref mut scatter_indices,
            ref mut heat_capacities,
            ref mut steady_temps,
        } = self.regime
        {
            for index in scatter_indices.iter_mut() {
                *index = material.temp_index(self.t_init);
            }
            for hc in heat_capacities.iter_mut() {
                *hc = material.base_energy_at(material.temp_index(self.t_init));
            }
            for temp in steady_temps.iter_mut() {
                *temp = self.t_init;
            }
        }
    }

    /// Records the end-of-run temperature(s) and reports whether the
    /// sensor stayed within the stability threshold of the previous
    /// run. Transient sensors compare the whole history element-wise.
    pub fn is_stable(&mut self, t_final: f64, final_temps: Vec<f64>) -> bool {
        match self.regime {
            Regime::Transient { ref mut steady_temps, .. } => {
                let stable = steady_temps
                    .iter()
                    .zip(&final_temps)
                    .all(|(&t1, &t2)| (t2 - t1).abs() / t1 <= TRANSIENT_TEMP_THRESHOLD);
                *steady_temps = final_temps;
                stable
            }
            _ => {
                let stable = (t_final - self.t_steady).abs() / self.t_steady <= TEMP_THRESHOLD;
                self.t_steady = t_final;
                stable
            }
        }
    }

    /// Re-derives tables and heat capacities for the next run. A full
    /// reset restores the initial temperatures first (used between
    /// independent runs); otherwise the latest steady temperatures are
    /// carried forward.
    pub fn reset(&mut self, full_reset: bool, material: &Material) {
        match self.regime {
            Regime::SteadyState => {
                if full_reset {
                    self.t_steady = self.t_init;
                }
                self.base_index = material.temp_index(self.t_steady);
                self.heat_capacity = material.base_energy_at(self.base_index);
                self.scatter_index = material.temp_index(self.t_steady);
            }
            Regime::Periodic => {
                if full_reset {
                    self.t_steady = self.t_init;
                }
                // The heat capacity is left untouched: refreshing it
                // would further narrow the valid temperature range of
                // deviational runs.
                self.base_index = material.temp_index(self.t_steady);
                self.scatter_index = material.temp_index(self.t_steady);
            }
            Regime::Transient {
                ref mut scatter_indices,
                ref mut heat_capacities,
                ref mut steady_temps,
            } => {
                if full_reset {
                    for temp in steady_temps.iter_mut() {
                        *temp = self.t_init;
                    }
                }
                for (hc, &temp) in heat_capacities.iter_mut().zip(steady_temps.iter()) {
                    *hc = material.base_energy(temp);
                }
                for (index, &temp) in scatter_indices.iter_mut().zip(steady_temps.iter()) {
                    *index = material.temp_index(temp);
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn steady_state_restarts_from_the_steady_temperature() {
        let mut c = SensorController::new(SimulationType::SteadyState, 300.0, 0);
        assert_eq!(c.init_temp(), 300.0);
        assert!(!c.is_stable(310.0, Vec::new()));
        assert_eq!(c.init_temp(), 310.0);
        assert_eq!(c.steady_temp(5), 310.0);
    }

    #[test]
    fn periodic_keeps_the_user_initial_temperature() {
        let mut c = SensorController::new(SimulationType::Periodic, 300.0, 0);
        assert!(!c.is_stable(310.0, Vec::new()));
        assert_eq!(c.init_temp(), 300.0);
        assert_eq!(c.steady_temp(0), 310.0);
    }

    #[test]
    fn stability_threshold_is_a_tenth_of_a_percent() {
        let mut c = SensorController::new(SimulationType::SteadyState, 300.0, 0);
        assert!(c.is_stable(300.2, Vec::new()));
        assert!(!c.is_stable(310.0, Vec::new()));
    }

    #[test]
    fn transient_compares_histories_element_wise() {
        let mut c = SensorController::new(SimulationType::Transient, 300.0, 3);
        assert!(c.is_stable(0.0, vec![301.0, 302.0, 303.0]));
        assert!(!c.is_stable(0.0, vec![301.0, 330.0, 303.0]));
        assert_eq!(c.steady_temp(0), 300.0);
        assert_eq!(c.steady_temp(1), 330.0);
    }
}
