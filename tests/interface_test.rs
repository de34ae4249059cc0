extern crate phonsim;
extern crate simplelog;

mod common;

use phonsim::geom::{Point, Triangle};
use phonsim::material::{DispersionData, Material, RelaxationData};
use phonsim::phonon::{Phonon, Polarization};
use phonsim::sim::cell::{link_transition_surfaces, Cell};
use phonsim::sim::sensor::Sensor;
use phonsim::sim::surface::TransitionSurface;
use phonsim::sim::{SimContext, SimulationType};

fn material_with_cutoffs(id: usize, max_freq_la: f64, max_freq_ta: f64) -> Material {
    let disp = DispersionData {
        la: [-1.0e-8, 5000.0, 0.0],
        ta: [-1.2e-8, 3000.0, 0.0],
        max_freq_la,
        max_freq_ta,
    };
    Material::new(id, &disp, &RelaxationData::default())
}

struct InterfaceModel {
    cells: Vec<Cell>,
    sensors: Vec<Sensor>,
    materials: Vec<Material>,
}

/// Two cells sharing the diagonal of a square, each on its own
/// sensor. With `same_material` both sensors use material 0.
fn two_cell_model(same_material: bool) -> InterfaceModel {
    let materials = vec![
        material_with_cutoffs(0, 5.0e12, 2.0e12),
        material_with_cutoffs(1, 3.0e12, 1.0e12),
    ];
    let left_material = 0;
    let right_material = if same_material { 0 } else { 1 };
    let sensors = vec![
        Sensor::new(0, left_material, SimulationType::SteadyState, 10, 300.0),
        Sensor::new(1, right_material, SimulationType::SteadyState, 10, 300.0),
    ];
    let mut left = Cell::new(
        Triangle::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0), Point::new(0.0, 100.0)).unwrap(),
        0,
        1.0,
    );
    let mut right = Cell::new(
        Triangle::new(Point::new(100.0, 0.0), Point::new(100.0, 100.0), Point::new(0.0, 100.0)).unwrap(),
        1,
        1.0,
    );
    left.validate(&right).unwrap();
    link_transition_surfaces(&mut left, 0, &mut right, 1).unwrap();
    InterfaceModel {
        cells: vec![left, right],
        sensors,
        materials,
    }
}

fn transition_of(cell: &Cell) -> &TransitionSurface {
    cell.boundaries()
        .iter()
        .flat_map(|boundary| boundary.transition_surfaces())
        .next()
        .expect("the shared edge should carry a transition surface")
}

fn phonon_at_interface(freq: f64) -> Phonon {
    let mut p = Phonon::new(1, 0.0, Some(0));
    p.set_position(50.0, 50.0);
    p.set_direction(0.6, 0.8);
    p.scatter_update(10, freq, 2500.0, Polarization::LA);
    p
}

#[test]
fn frequencies_above_the_neighbor_cutoff_backscatter() {
    common::init_logging();
    let model = two_cell_model(false);
    let ctx = SimContext {
        cells: &model.cells,
        sensors: &model.sensors,
        materials: &model.materials,
    };
    let ts = transition_of(&model.cells[0]);

    let mut p = phonon_at_interface(4.0e12);
    ts.handle_phonon(&mut p, 0, &ctx);
    // 4 THz exceeds the 3 THz LA cutoff of the neighbor material
    assert_eq!(p.cell(), Some(0));
    let (dx, dy) = p.direction();
    let normal = ts.surface().normal();
    assert!(dx * normal.x + dy * normal.y >= 0.0, "must scatter back into its cell");
}

#[test]
fn frequencies_below_the_neighbor_cutoff_transmit() {
    common::init_logging();
    let model = two_cell_model(false);
    let ctx = SimContext {
        cells: &model.cells,
        sensors: &model.sensors,
        materials: &model.materials,
    };
    let ts = transition_of(&model.cells[0]);

    let mut p = phonon_at_interface(2.0e12);
    let direction = p.direction();
    ts.handle_phonon(&mut p, 0, &ctx);
    assert_eq!(p.cell(), Some(1));
    assert_eq!(p.direction(), direction);
}

#[test]
fn same_material_transitions_only_move_the_phonon() {
    common::init_logging();
    let model = two_cell_model(true);
    let ctx = SimContext {
        cells: &model.cells,
        sensors: &model.sensors,
        materials: &model.materials,
    };
    let ts = transition_of(&model.cells[0]);

    // well above every cutoff: the gate must not even be consulted
    let mut p = phonon_at_interface(8.0e12);
    let position = p.position();
    let direction = p.direction();
    ts.handle_phonon(&mut p, 0, &ctx);
    assert_eq!(p.cell(), Some(1));
    assert_eq!(p.position(), position);
    assert_eq!(p.direction(), direction);
    assert_eq!(p.freq(), 8.0e12);
    assert_eq!(p.velocity(), 2500.0);
    assert_eq!(p.polar(), Polarization::LA);
}
