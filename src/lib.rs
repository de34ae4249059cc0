#[macro_use]
extern crate log;
extern crate cgmath;
extern crate chrono;
extern crate rand;
extern crate rayon;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;

pub mod geom;
pub mod material;
pub mod phonon;
pub mod sampling;
pub mod sim;
pub mod sink;

pub use sim::{Simulation, SimulationBuilder};
