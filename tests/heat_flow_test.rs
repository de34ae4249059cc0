extern crate phonsim;
extern crate simplelog;

mod common;

use phonsim::geom::Point;
use phonsim::sim::{SimulationBuilder, SimulationParams, SimulationType};

/// A bar held between a hot and a cold isothermal edge conducts heat
/// from left to right: the steady x flux must come out positive and
/// reproducible between independent runs.
#[cfg_attr(not(feature = "expensive_tests"), ignore)]
#[test]
fn heat_flows_from_hot_to_cold() {
    common::init_logging();

    let params = SimulationParams {
        num_runs: 2,
        measurement_steps: 100,
        num_phonons: 10_000,
        simulation_time: 10.0,
        t_eq: 300.0,
        phasor_sim: false,
    };
    let mut builder = SimulationBuilder::new(params);
    builder.simulation_type(SimulationType::SteadyState, 0).unwrap();
    builder
        .add_material("silicon", &common::silicon_dispersion(), &common::silicon_relaxation())
        .unwrap();
    builder.add_sensor(0, "silicon", 300.0).unwrap();
    builder
        .add_rect_cell(Point::new(0.0, 0.0), Point::new(1000.0, 500.0), 0, 1.0)
        .unwrap();
    // hot left edge, cold right edge, both held for the whole run
    builder
        .add_emit_surface(Point::new(0.0, 0.0), Point::new(0.0, 500.0), 310.0, 10.0, 0.0)
        .unwrap();
    builder
        .add_emit_surface(Point::new(1000.0, 0.0), Point::new(1000.0, 500.0), 290.0, 10.0, 0.0)
        .unwrap();

    let mut simulation = builder.build();
    simulation.run();

    let runs = simulation.measurements();
    assert_eq!(runs.len(), 2);
    let first = &runs[0][0];
    let second = &runs[1][0];

    assert!(first.x_flux > 0.0, "first run x_flux = {}", first.x_flux);
    assert!(second.x_flux > 0.0, "second run x_flux = {}", second.x_flux);
    // the transverse flux has no driving gradient
    assert!(first.y_flux.abs() < first.x_flux, "y_flux = {}", first.y_flux);

    let difference = (first.x_flux - second.x_flux).abs() / first.x_flux;
    assert!(
        difference < 0.3,
        "runs disagree: {} vs {} ({}%)",
        first.x_flux,
        second.x_flux,
        difference * 100.0
    );
}
