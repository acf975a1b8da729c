use super::{build_cell, madelung, AtomicStructure, CellParams, Unit, BOHR};
use crate::error::PbcError;
use approx::assert_relative_eq;
use nalgebra::Vector3;
use std::f64::consts::PI;

fn cubic(length: f64) -> AtomicStructure {
    AtomicStructure::new(
        [[length, 0.0, 0.0], [0.0, length, 0.0], [0.0, 0.0, length]],
        vec!["H".to_string(), "H".to_string()],
        vec![[0.0, 0.0, 0.0], [1.4, 0.0, 0.0]],
    )
}

#[test]
fn test_gsmax_overrides_cutoff() {
    let params = CellParams {
        ke_cutoff: 50.0,
        gsmax: Some(4),
        ..CellParams::default()
    };
    let cell = build_cell(&cubic(6.0), &params).unwrap();
    assert_eq!(cell.mesh, [9, 9, 9]);
    assert!(cell.ke_cutoff.is_none());

    let cutoff_only = build_cell(
        &cubic(6.0),
        &CellParams {
            ke_cutoff: 50.0,
            ..CellParams::default()
        },
    )
    .unwrap();
    assert_ne!(cutoff_only.mesh, cell.mesh);
    assert_eq!(cutoff_only.ke_cutoff, Some(50.0));
}

#[test]
fn test_cutoff_mesh() {
    // |b| = 2 pi / 6, sqrt(2 * 20) = 6.3246 -> gs = ceil(6.0395) = 7
    let cell = build_cell(&cubic(6.0), &CellParams::default()).unwrap();
    assert_eq!(cell.mesh, [15, 15, 15]);
    assert_eq!(cell.ngrids(), 15 * 15 * 15);
    assert_eq!(cell.gv().len(), cell.ngrids());
    assert_eq!(cell.grid_coords().len(), cell.ngrids());
}

#[test]
fn test_angstrom_input_is_converted() {
    let params = CellParams {
        unit: Unit::Angstrom,
        ..CellParams::default()
    };
    let cell = build_cell(&cubic(3.0), &params).unwrap();
    assert_relative_eq!(cell.lattice[(0, 0)], 3.0 / BOHR, epsilon = 1e-12);
    assert_relative_eq!(cell.atoms[1].position.x, 1.4 / BOHR, epsilon = 1e-12);
}

#[test]
fn test_reciprocal_vectors_are_dual() {
    let structure = AtomicStructure::diamond("C", 6.74);
    let cell = build_cell(&structure, &CellParams::default()).unwrap();
    let product = cell.lattice * cell.reciprocal_vectors().transpose();
    for i in 0..3 {
        for j in 0..3 {
            let expected = if i == j { 2.0 * PI } else { 0.0 };
            assert_relative_eq!(product[(i, j)], expected, epsilon = 1e-10);
        }
    }
    assert_relative_eq!(cell.volume(), 6.74f64.powi(3) / 4.0, epsilon = 1e-10);
}

#[test]
fn test_gv_starts_at_origin() {
    let params = CellParams {
        gsmax: Some(1),
        ..CellParams::default()
    };
    let cell = build_cell(&cubic(2.0 * PI), &params).unwrap();
    let gv = cell.gv();
    assert_relative_eq!(gv[0], Vector3::zeros());
    assert_relative_eq!(gv[1], Vector3::new(0.0, 0.0, 1.0), epsilon = 1e-12);
    assert_relative_eq!(gv[2], Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-12);
}

#[test]
fn test_valence_electrons() {
    let diamond = build_cell(&AtomicStructure::diamond("C", 6.74), &CellParams::default()).unwrap();
    assert_eq!(diamond.nelectron(), 8);

    let all_electron = build_cell(
        &AtomicStructure::diamond("C", 6.74),
        &CellParams {
            pseudo: None,
            ..CellParams::default()
        },
    )
    .unwrap();
    assert_eq!(all_electron.nelectron(), 12);
}

#[test]
fn test_semicore_pseudo_sets_valence_charge() {
    let sodium = |pseudo: &str| {
        build_cell(
            &AtomicStructure::diamond("Na", 8.0),
            &CellParams {
                pseudo: Some(pseudo.to_string()),
                ..CellParams::default()
            },
        )
        .unwrap()
    };
    assert_eq!(sodium("gth-pade").nelectron(), 2);
    assert_eq!(sodium("gth-pbe-q9").nelectron(), 18);
    assert_eq!(sodium("gth-pade-q1").nelectron(), 2);

    let titanium = build_cell(
        &AtomicStructure::diamond("Ti", 8.0),
        &CellParams {
            pseudo: Some("gth-pbe-q12".to_string()),
            ..CellParams::default()
        },
    )
    .unwrap();
    assert_eq!(titanium.nelectron(), 24);
}

#[test]
fn test_invalid_inputs() {
    let flat = AtomicStructure::new(
        [[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
        vec!["H".to_string()],
        vec![[0.0; 3]],
    );
    assert!(matches!(
        build_cell(&flat, &CellParams::default()),
        Err(PbcError::InvalidLattice(_))
    ));

    let mut unknown = cubic(5.0);
    unknown.symbols[0] = "Xx".to_string();
    assert!(matches!(
        build_cell(&unknown, &CellParams::default()),
        Err(PbcError::UnknownElement(_))
    ));

    let params = CellParams {
        dimension: 4,
        ..CellParams::default()
    };
    assert!(build_cell(&cubic(5.0), &params).is_err());
}

#[test]
fn test_simple_cubic_madelung() {
    let cell = build_cell(&cubic(5.0), &CellParams::default()).unwrap();
    assert_relative_eq!(madelung(&cell), 2.837_297_479 / 5.0, epsilon = 1e-7);
}
