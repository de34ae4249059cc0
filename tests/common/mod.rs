use simplelog::{Config, LevelFilter, SimpleLogger};

use phonsim::material::{DispersionData, RelaxationData};

/// Initializes terminal logging once per test binary; repeated calls
/// are harmless.
pub fn init_logging() {
    let _ = SimpleLogger::init(LevelFilter::Info, Config::default());
}

pub fn silicon_dispersion() -> DispersionData {
    DispersionData {
        la: [-2.22e-7, 9260.0, 0.0],
        ta: [-2.28e-7, 5240.0, 0.0],
        max_freq_la: 7.63e13,
        max_freq_ta: 3.0e13,
    }
}

pub fn silicon_relaxation() -> RelaxationData {
    RelaxationData {
        b_l: 2.0e-24,
        b_tn: 9.3e-13,
        b_tu: 5.5e-18,
        b_i: 1.32e-45,
        w: 2.42e13,
    }
}
