#[macro_use]
extern crate log;
extern crate phonsim;
extern crate simplelog;

use phonsim::sim::config;
use simplelog::{Config, LevelFilter, SimpleLogger};
use std::env;
use std::path::Path;
use std::time::Instant;

fn main() {
    let _ = SimpleLogger::init(LevelFilter::Info, Config::default());

    let filenames: Vec<String> = env::args().skip(1).collect();
    if filenames.is_empty() {
        error!("need at least one input file");
        return;
    }
    for filename in &filenames {
        let filepath = Path::new(filename);
        match config::load(filepath) {
            Ok(mut simulation) => {
                let start = Instant::now();
                simulation.run();
                let elapsed = start.elapsed();
                let time = elapsed.as_secs() as f64 + f64::from(elapsed.subsec_nanos()) * 1e-9;
                info!("time taken: {}[s]", time);
                if let Err(err) = simulation.export_results(filepath, time) {
                    error!("could not export results for {}: {}", filename, err);
                }
            }
            Err(err) => error!("error reading the data from the file at {}: {}", filename, err),
        }
    }
}
