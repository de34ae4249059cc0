//! The particle state advanced by the tracer. A phonon whose cell
//! handle is `None` has left the system and is no longer simulated.

use ::cgmath::Vector2;
use sampling::urand;
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarization {
    LA,
    TA,
}

#[derive(Debug, Clone)]
pub struct Phonon {
    /// Whether the particle carries positive or negative deviational
    /// energy (-1 or 1).
    sign: i8,
    lifetime: f64,
    lifestep: usize,
    px: f64,
    py: f64,
    dx: f64,
    dy: f64,
    freq_index: usize,
    freq: f64,
    velocity: f64,
    polar: Polarization,
    /// Index of the owning cell, if the phonon is still in the system.
    cell: Option<usize>,
}

impl Phonon {
    pub fn new(sign: i8, lifetime: f64, cell: Option<usize>) -> Phonon {
        Phonon {
            sign,
            lifetime,
            lifestep: 0,
            px: 0.0,
            py: 0.0,
            dx: 0.0,
            dy: 0.0,
            freq_index: 0,
            freq: 0.0,
            velocity: 0.0,
            polar: Polarization::LA,
            cell,
        }
    }

    pub fn sign(&self) -> i8 {
        self.sign
    }

    pub fn position(&self) -> (f64, f64) {
        (self.px, self.py)
    }

    pub fn direction(&self) -> (f64, f64) {
        (self.dx, self.dy)
    }

    pub fn velocity_vector(&self) -> Vector2<f64> {
        Vector2::new(self.dx * self.velocity, self.dy * self.velocity)
    }

    pub fn freq_index(&self) -> usize {
        self.freq_index
    }

    pub fn freq(&self) -> f64 {
        self.freq
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn polar(&self) -> Polarization {
        self.polar
    }

    pub fn lifetime(&self) -> f64 {
        self.lifetime
    }

    pub fn lifestep(&self) -> usize {
        self.lifestep
    }

    pub fn cell(&self) -> Option<usize> {
        self.cell
    }

    pub fn outside_cell(&self) -> bool {
        self.cell.is_none()
    }

    /// Installs a freshly sampled frequency, velocity and polarization.
    pub fn scatter_update(&mut self, freq_index: usize, freq: f64, velocity: f64, polar: Polarization) {
        self.freq_index = freq_index;
        self.freq = freq;
        self.velocity = velocity;
        self.polar = polar;
    }

    pub fn set_position(&mut self, px: f64, py: f64) {
        self.px = px;
        self.py = py;
    }

    pub fn set_direction(&mut self, dx: f64, dy: f64) {
        self.dx = dx;
        self.dy = dy;
    }

    pub fn set_cell(&mut self, cell: Option<usize>) {
        self.cell = cell;
    }

    pub fn set_lifestep(&mut self, step: usize) {
        self.lifestep = step;
    }

    pub fn drift(&mut self, time: f64) {
        let factor = self.velocity * time;
        self.px += self.dx * factor;
        self.py += self.dy * factor;
    }

    pub fn set_rand_direction(&mut self) {
        self.dx = 2.0 * urand() - 1.0;
        self.dy = (1.0 - self.dx * self.dx).sqrt() * (2.0 * PI * urand()).cos();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn drift_follows_direction_and_velocity() {
        let mut p = Phonon::new(1, 0.0, Some(0));
        p.set_position(1.0, 2.0);
        p.set_direction(0.6, 0.8);
        p.scatter_update(3, 1e12, 100.0, Polarization::TA);
        p.drift(0.5);
        let (px, py) = p.position();
        assert!((px - 31.0).abs() < 1e-12);
        assert!((py - 42.0).abs() < 1e-12);
    }

    #[test]
    fn rand_direction_stays_in_the_unit_disk() {
        // the in-plane projection of a 3D unit direction has norm <= 1
        let mut p = Phonon::new(-1, 0.0, None);
        for _ in 0..100 {
            p.set_rand_direction();
            let (dx, dy) = p.direction();
            let norm = dx * dx + dy * dy;
            assert!(norm <= 1.0 + 1e-12);
            assert!(dx >= -1.0 && dx <= 1.0);
        }
    }
}
