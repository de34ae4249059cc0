//!
//! Phonon dispersion and relaxation model of a material, plus the
//! per-temperature cumulative distribution tables the simulation
//! samples from. Tables are built once per run and shared read-only
//! between worker threads afterwards.
//!

use phonon::Polarization;
use sampling::urand;
use std::cmp;
use std::f64::consts::PI;

pub const NUM_FREQ_BINS: usize = 1000;

const HBAR: f64 = 1.054517e-34;
const BOLTZ: f64 = 1.38065e-23;

/// Cumulative distribution over the frequency bins. Each entry is the
/// cumulative probability up to the bin together with the fraction of
/// the bin carried by the LA branch.
pub type Table = Vec<(f64, f64)>;

/// Quadratic dispersion coefficients `w = a*k^2 + b*k + c` for both
/// acoustic branches and the branch frequency cutoffs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispersionData {
    pub la: [f64; 3],
    pub ta: [f64; 3],
    pub max_freq_la: f64,
    pub max_freq_ta: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RelaxationData {
    pub b_l: f64,
    pub b_tn: f64,
    pub b_tu: f64,
    pub b_i: f64,
    /// Frequency cutoff between TA normal and TA Umklapp scattering.
    pub w: f64,
}

pub struct TableData {
    pub table: Table,
    pub cumul_sum: f64,
}

pub struct Material {
    id: usize,
    b_l: f64,
    b_tn: f64,
    b_tu: f64,
    b_i: f64,
    w: f64,

    w_max_la: f64,
    w_max_ta: f64,

    freq_width: f64,
    full_simulation: bool,

    frequencies: Vec<f64>,
    densities_la: Vec<f64>,
    densities_ta: Vec<f64>,
    velocities_la: Vec<f64>,
    velocities_ta: Vec<f64>,

    temps: Vec<f64>,
    base_tables: Vec<TableData>,
    emit_tables: Vec<TableData>,
    scatter_tables: Vec<TableData>,
}

impl Material {
    pub fn new(id: usize, disp: &DispersionData, relax: &RelaxationData) -> Material {
        let freq_width = f64::max(disp.max_freq_la, disp.max_freq_ta) / NUM_FREQ_BINS as f64;
        let frequencies: Vec<f64> = (0..NUM_FREQ_BINS)
            .map(|n| (2 * n + 1) as f64 * freq_width / 2.0)
            .collect();

        let mut densities_la = vec![0.0; NUM_FREQ_BINS];
        let mut densities_ta = vec![0.0; NUM_FREQ_BINS];
        let mut velocities_la = vec![0.0; NUM_FREQ_BINS];
        let mut velocities_ta = vec![0.0; NUM_FREQ_BINS];
        for (index, &freq) in frequencies.iter().enumerate() {
            let la_gv = group_velocity(freq, &disp.la);
            velocities_la[index] = la_gv;
            densities_la[index] = wavevector(freq, &disp.la).powi(2) / 2.0 / PI.powi(2) / la_gv;
            let ta_gv = group_velocity(freq, &disp.ta);
            if !ta_gv.is_nan() {
                velocities_ta[index] = ta_gv;
                // No factor of two: the TA density of states absorbs the
                // double degeneracy of the branch.
                densities_ta[index] = wavevector(freq, &disp.ta).powi(2) / PI.powi(2) / ta_gv;
            }
        }

        Material {
            id,
            b_l: relax.b_l,
            b_tn: relax.b_tn,
            b_tu: relax.b_tu,
            b_i: relax.b_i,
            w: relax.w,
            w_max_la: disp.max_freq_la,
            w_max_ta: disp.max_freq_ta,
            freq_width,
            full_simulation: false,
            frequencies,
            densities_la,
            densities_ta,
            velocities_la,
            velocities_ta,
            temps: Vec::new(),
            base_tables: Vec::new(),
            emit_tables: Vec::new(),
            scatter_tables: Vec::new(),
        }
    }

    /// Switches the distributions from the deviational (derivative)
    /// form to absolute phonon occupation.
    pub fn set_full_simulation(&mut self) {
        self.full_simulation = true;
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn max_freq_la(&self) -> f64 {
        self.w_max_la
    }

    pub fn max_freq_ta(&self) -> f64 {
        self.w_max_ta
    }

    /// Scattering rates in the order [normal, Umklapp, impurity].
    pub fn relax_rates(&self, temp: f64, freq: f64, polar: Polarization) -> [f64; 3] {
        [
            self.tau_n_inv(temp, freq, polar),
            self.tau_u_inv(temp, freq, polar),
            self.tau_i_inv(freq),
        ]
    }

    /// Samples a frequency bin by bisection over the cumulative
    /// probabilities, then the polarization from the bin's LA share.
    pub fn freq_index(table: &Table) -> (usize, Polarization) {
        let mut low = 0;
        let mut high = table.len() - 1;
        let mut mid = low + (high - low) / 2;
        let rand = urand();
        while high - low > 1 {
            if rand < table[mid].0 {
                high = mid;
            } else {
                low = mid;
            }
            mid = (low + high) / 2;
        }
        let polar = if urand() <= table[high].1 { Polarization::LA } else { Polarization::TA };
        (high, polar)
    }

    /// The frequency represented by a bin. Deviational simulations
    /// jitter the sample across the bin width.
    pub fn freq(&self, index: usize) -> f64 {
        if self.full_simulation {
            self.frequencies[index]
        } else {
            self.frequencies[index] + (2.0 * urand() - 1.0) * self.freq_width / 2.0
        }
    }

    pub fn velocity(&self, index: usize, polar: Polarization) -> f64 {
        match polar {
            Polarization::LA => self.velocities_la[index],
            Polarization::TA => self.velocities_ta[index],
        }
    }

    /// Index of the tables that cover the given temperature.
    pub fn temp_index(&self, temp: f64) -> usize {
        let index = self
            .temps
            .iter()
            .position(|&t| t >= temp)
            .unwrap_or(self.temps.len());
        cmp::min(index, self.temps.len() - 1)
    }

    pub fn base_table_at(&self, index: usize) -> &Table {
        &self.base_tables[index].table
    }

    pub fn base_energy_at(&self, index: usize) -> f64 {
        self.base_tables[index].cumul_sum
    }

    pub fn emit_table_at(&self, index: usize) -> &Table {
        &self.emit_tables[index].table
    }

    pub fn scatter_table_at(&self, index: usize) -> &Table {
        &self.scatter_tables[index].table
    }

    pub fn base_energy(&self, temp: f64) -> f64 {
        self.base_tables[self.temp_index(temp)].cumul_sum
    }

    /// Energy emission rate factor of a surface at this temperature.
    pub fn emit_energy(&self, temp: f64) -> f64 {
        self.emit_tables[self.temp_index(temp)].cumul_sum
    }

    pub fn scatter_energy(&self, temp: f64) -> f64 {
        self.scatter_tables[self.temp_index(temp)].cumul_sum
    }

    /// Total energy (or heat capacity) the tables predict at the given
    /// temperature. With `pseudo` the relaxation-weighted sum is used,
    /// as needed by the pseudo-energy inversion.
    pub fn theoretical_energy(&self, temp: f64, pseudo: bool) -> f64 {
        if pseudo {
            self.scatter_energy(temp)
        } else {
            self.base_energy(temp)
        }
    }

    /// Builds the cumulative tables for every temperature in
    /// [low_temp, high_temp] at the given interval. Any previously
    /// built tables are discarded.
    pub fn initialize_tables(&mut self, low_temp: f64, high_temp: f64, temp_interval: f64) {
        let num_steps = ((high_temp - low_temp) / temp_interval) as usize;
        self.temps = (0..num_steps)
            .map(|n| low_temp + temp_interval * n as f64)
            .collect();
        self.temps.push(high_temp);
        self.base_tables.clear();
        self.emit_tables.clear();
        self.scatter_tables.clear();

        let temps = self.temps.clone();
        for &temp in &temps {
            let la_base = self.phonon_dist(temp, Polarization::LA);
            let ta_base = self.phonon_dist(temp, Polarization::TA);
            let heat_capacity = sum(&la_base) + sum(&ta_base);
            self.base_tables.push(TableData {
                table: build_cumul_dist(&la_base, &ta_base),
                cumul_sum: heat_capacity,
            });

            let emit = self.cumul_dist_emit(
                self.phonon_dist(temp, Polarization::LA),
                self.phonon_dist(temp, Polarization::TA),
            );
            self.emit_tables.push(emit);

            let scatter = self.cumul_dist_scatter(
                self.phonon_dist(temp, Polarization::LA),
                self.phonon_dist(temp, Polarization::TA),
                temp,
            );
            self.scatter_tables.push(scatter);
        }
    }

    fn cumul_dist_emit(&self, mut la_dist: Vec<f64>, mut ta_dist: Vec<f64>) -> TableData {
        for (dist, vel) in la_dist.iter_mut().zip(&self.velocities_la) {
            *dist *= *vel;
        }
        for (dist, vel) in ta_dist.iter_mut().zip(&self.velocities_ta) {
            *dist *= *vel;
        }
        TableData {
            table: build_cumul_dist(&la_dist, &ta_dist),
            cumul_sum: sum(&la_dist) + sum(&ta_dist),
        }
    }

    fn cumul_dist_scatter(&self, mut la_dist: Vec<f64>, mut ta_dist: Vec<f64>, temp: f64) -> TableData {
        {
            let mut weight = |dist: &mut Vec<f64>, polar| {
                for (elem, &freq) in dist.iter_mut().zip(&self.frequencies) {
                    let rates = self.relax_rates(temp, freq, polar);
                    *elem *= rates[0] + rates[1] + rates[2];
                }
            };
            weight(&mut la_dist, Polarization::LA);
            weight(&mut ta_dist, Polarization::TA);
        }
        TableData {
            table: build_cumul_dist(&la_dist, &ta_dist),
            cumul_sum: sum(&la_dist) + sum(&ta_dist),
        }
    }

    /// Per-bin phonon energy (full simulation) or heat capacity
    /// (deviational, via the Bose-Einstein derivative) of one branch.
    fn phonon_dist(&self, temp: f64, polar: Polarization) -> Vec<f64> {
        let densities = match polar {
            Polarization::LA => &self.densities_la,
            Polarization::TA => &self.densities_ta,
        };
        let const_calc = HBAR / (BOLTZ * temp);
        self.frequencies
            .iter()
            .zip(densities)
            .map(|(&freq, &density)| {
                let mut dist = freq * HBAR / (const_calc * freq).exp_m1() * self.freq_width * density;
                if !self.full_simulation {
                    dist *= const_calc * freq * (const_calc * freq).exp() / ((const_calc * freq).exp_m1() * temp);
                }
                dist
            })
            .collect()
    }

    // Normal scattering
    fn tau_n_inv(&self, temp: f64, freq: f64, polar: Polarization) -> f64 {
        match polar {
            Polarization::LA => self.b_l * freq * freq * temp.powi(3),
            Polarization::TA => {
                if freq < self.w {
                    self.b_tn * freq * temp.powi(4)
                } else {
                    0.0
                }
            }
        }
    }

    // Umklapp scattering
    fn tau_u_inv(&self, temp: f64, freq: f64, polar: Polarization) -> f64 {
        match polar {
            Polarization::LA => self.b_l * freq * freq * temp.powi(3),
            Polarization::TA => {
                if freq >= self.w {
                    self.b_tu * freq * freq / (HBAR * freq / (temp * BOLTZ)).sinh()
                } else {
                    0.0
                }
            }
        }
    }

    // Impurity scattering
    fn tau_i_inv(&self, freq: f64) -> f64 {
        self.b_i * freq.powi(4)
    }
}

/// Smaller root of the dispersion relation, i.e. the wavevector that
/// maps to the given frequency.
fn wavevector(freq: f64, coeffs: &[f64; 3]) -> f64 {
    let d = coeffs[1].powi(2) - 4.0 * coeffs[0] * (coeffs[2] - freq);
    let a = (-coeffs[1] - d.sqrt()) / (2.0 * coeffs[0]);
    let b = (-coeffs[1] + d.sqrt()) / (2.0 * coeffs[0]);
    if a < b {
        a
    } else {
        b
    }
}

fn group_velocity(freq: f64, coeffs: &[f64; 3]) -> f64 {
    2.0 * coeffs[0] * wavevector(freq, coeffs) + coeffs[1]
}

fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Joins the LA and TA distributions into one cumulative table with
/// the per-bin LA fraction stored alongside.
fn build_cumul_dist(t1: &[f64], t2: &[f64]) -> Table {
    let cumul_sum = sum(t1) + sum(t2);
    let mut table = Vec::with_capacity(t1.len());
    table.push(((t1[0] + t2[0]) / cumul_sum, t1[0] / (t1[0] + t2[0])));
    for i in 1..t1.len() {
        let prev = table[i - 1].0;
        table.push((prev + (t1[i] + t2[i]) / cumul_sum, t1[i] / (t1[i] + t2[i])));
    }
    table
}

#[cfg(test)]
mod test {
    use super::*;

    pub fn silicon() -> Material {
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

    #[test]
    fn cumulative_tables_are_normalized_and_nondecreasing() {
        let mut mat = silicon();
        mat.initialize_tables(290.0, 310.0, 0.1);
        for temp in &[290.0, 300.0, 310.0] {
            let idx = mat.temp_index(*temp);
            for table in &[mat.base_table_at(idx), mat.emit_table_at(idx), mat.scatter_table_at(idx)] {
                assert!((table[table.len() - 1].0 - 1.0).abs() < 1e-12);
                for window in table.windows(2) {
                    assert!(window[1].0 >= window[0].0);
                }
            }
        }
    }

    #[test]
    fn relax_rates_are_nonnegative() {
        let mat = silicon();
        for &freq in &[1e12, 1e13, 2.5e13, 5e13] {
            for &polar in &[Polarization::LA, Polarization::TA] {
                let rates = mat.relax_rates(300.0, freq, polar);
                for rate in &rates {
                    assert!(*rate >= 0.0, "freq {} polar {:?}", freq, polar);
                }
            }
        }
    }

    #[test]
    fn ta_rates_respect_the_umklapp_cutoff() {
        let mat = silicon();
        let below = mat.relax_rates(300.0, 2.0e13, Polarization::TA);
        assert!(below[0] > 0.0 && below[1] == 0.0);
        let above = mat.relax_rates(300.0, 2.5e13, Polarization::TA);
        assert!(above[0] == 0.0 && above[1] > 0.0);
    }

    #[test]
    fn freq_index_sampling_stays_in_range() {
        let mut mat = silicon();
        mat.initialize_tables(290.0, 310.0, 0.1);
        let table = mat.base_table_at(mat.temp_index(300.0));
        for _ in 0..1000 {
            let (index, _polar) = Material::freq_index(table);
            assert!(index < NUM_FREQ_BINS);
        }
    }

    #[test]
    fn theoretical_energy_grows_with_temperature() {
        let mut mat = silicon();
        mat.set_full_simulation();
        mat.initialize_tables(280.0, 320.0, 0.1);
        let e_cold = mat.theoretical_energy(285.0, false);
        let e_hot = mat.theoretical_energy(315.0, false);
        assert!(e_hot > e_cold && e_cold > 0.0);
    }

    #[test]
    fn ta_bins_past_the_cutoff_are_empty() {
        let mat = silicon();
        let idx = NUM_FREQ_BINS - 1; // well past max_freq_ta
        assert_eq!(mat.velocity(idx, Polarization::TA), 0.0);
        assert!(mat.velocity(idx, Polarization::LA) > 0.0);
    }
}
