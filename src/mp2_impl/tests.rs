use super::*;
use crate::error::PbcError;
use crate::runner::{run_mean_field, RunConfig};
use crate::scf_impl::{MoSolution, Orbitals, RoothaanDriver, Spin};
use crate::testing::{model_cell, ModelEngine};
use approx::assert_relative_eq;
use nalgebra::{DVector, Vector3};
use std::sync::Arc;

fn converged_rhf() -> MeanField {
    let engine = ModelEngine::default();
    let config = RunConfig::hf().with_df(Some("df"));
    let run = run_mean_field(Arc::new(model_cell()), &config, &engine, &mut RoothaanDriver).unwrap();
    assert!(run.mf.converged);
    run.mf
}

fn as_unrestricted(rhf: &MeanField) -> MeanField {
    let spatial = rhf.restricted().unwrap();
    let occ = spatial.occ.map(|n| n / 2.0);
    let orbitals =
        Orbitals::new(spatial.coeff.clone(), spatial.energy.clone(), occ).unwrap();
    let mut uhf = rhf.clone();
    uhf.solution = Some(MoSolution::Unrestricted {
        alpha: orbitals.clone(),
        beta: orbitals,
    });
    uhf
}

/// Spin orbitals `alpha p, beta p` for every spatial orbital `p`.
fn spin_orbitals(rhf: &MeanField) -> (Orbitals, Vec<Spin>) {
    let spatial = rhf.restricted().unwrap();
    let (nao, nmo) = spatial.coeff.shape();
    let mut coeff = DMatrix::zeros(2 * nao, 2 * nmo);
    let mut orbspin = Vec::with_capacity(2 * nmo);
    for p in 0..nmo {
        coeff
            .view_mut((0, 2 * p), (nao, 1))
            .copy_from(&spatial.coeff.column(p));
        coeff
            .view_mut((nao, 2 * p + 1), (nao, 1))
            .copy_from(&spatial.coeff.column(p));
        orbspin.extend([Spin::Alpha, Spin::Beta]);
    }
    let energy = DVector::from_fn(2 * nmo, |q, _| spatial.energy[q / 2]);
    let occ = DVector::from_fn(2 * nmo, |q, _| spatial.occ[q / 2] / 2.0);
    (Orbitals::new(coeff, energy, occ).unwrap(), orbspin)
}

fn as_general(rhf: &MeanField, tagged: bool) -> MeanField {
    let (orbitals, orbspin) = spin_orbitals(rhf);
    let mut ghf = rhf.clone();
    ghf.solution = Some(MoSolution::General {
        orbitals,
        orbspin: tagged.then_some(orbspin),
    });
    ghf
}

#[test]
fn test_default_coefficients_match_explicit() {
    let rhf = converged_rhf();
    let rmp2 = PeriodicRmp2::new(&rhf);
    let coeff = rhf.restricted().unwrap().coeff.clone();
    let implicit = rmp2.ao2mo(None).unwrap();
    let explicit = rmp2.ao2mo(Some(&coeff)).unwrap();
    assert_relative_eq!(implicit.ovov, explicit.ovov, epsilon = 1e-14);

    let uhf = as_unrestricted(&rhf);
    let ump2 = PeriodicUmp2::new(&uhf);
    let pair = (coeff.clone(), coeff);
    let implicit = ump2.ao2mo(None).unwrap();
    let explicit = ump2.ao2mo(Some(&pair)).unwrap();
    assert_relative_eq!(implicit.ovOV, explicit.ovOV, epsilon = 1e-14);
}

#[test]
fn test_ovov_layout() {
    let rhf = converged_rhf();
    let eris = PeriodicRmp2::new(&rhf).ao2mo(None).unwrap();
    let (nocc, nvir) = (eris.mo_energy.nocc(), eris.mo_energy.nvir());
    assert_eq!((nocc, nvir), (2, 4));
    assert_eq!(eris.ovov.shape(), (nocc * nvir, nocc * nvir));
    // (ia|jb) = (jb|ia)
    assert_relative_eq!(eris.ovov, eris.ovov.transpose(), epsilon = 1e-12);

    let orbitals = rhf.restricted().unwrap();
    let (orbo, orbv) = orbitals.split(&orbitals.coeff).unwrap();
    let direct = gen_ao2mofn(&rhf).unwrap()([&orbo, &orbv, &orbo, &orbv]).unwrap();
    assert_relative_eq!(direct, eris.ovov, epsilon = 1e-14);
}

#[test]
fn test_spin_flavours_agree_for_closed_shell() {
    let rhf = converged_rhf();
    let e_r = PeriodicRmp2::new(&rhf).kernel().unwrap();
    assert!(e_r < 0.0);

    let e_u = PeriodicUmp2::new(&as_unrestricted(&rhf)).kernel().unwrap();
    assert_relative_eq!(e_u, e_r, epsilon = 1e-10);

    let e_g_tagged = PeriodicGmp2::new(&as_general(&rhf, true)).kernel().unwrap();
    let e_g_untagged = PeriodicGmp2::new(&as_general(&rhf, false)).kernel().unwrap();
    assert_relative_eq!(e_g_tagged, e_r, epsilon = 1e-10);
    assert_relative_eq!(e_g_untagged, e_r, epsilon = 1e-10);
}

#[test]
fn test_spin_tags_zero_mixed_pairs() {
    let rhf = converged_rhf();
    let ghf = as_general(&rhf, false);
    let (orbitals, orbspin) = spin_orbitals(&rhf);
    let gmp2 = PeriodicGmp2::new(&ghf);

    let untagged = gmp2
        .ao2mo(Some(&SpinOrbitals::Untagged(orbitals.coeff.clone())))
        .unwrap();
    let tagged = gmp2
        .ao2mo(Some(&SpinOrbitals::Tagged {
            coeff: orbitals.coeff.clone(),
            orbspin: orbspin.clone(),
        }))
        .unwrap();

    let occ: Vec<Spin> = orbitals.occupied_indices().iter().map(|&p| orbspin[p]).collect();
    let vir: Vec<Spin> = orbitals.virtual_indices().iter().map(|&p| orbspin[p]).collect();
    let mut nonzero = 0;
    for i in 0..tagged.nocc() {
        for j in 0..tagged.nocc() {
            for a in 0..tagged.nvir() {
                for b in 0..tagged.nvir() {
                    let v = tagged.oovv(i, j, a, b);
                    assert_relative_eq!(v, untagged.oovv(i, j, a, b), epsilon = 1e-12);
                    let direct_allowed = occ[i] == vir[a] && occ[j] == vir[b];
                    let exchange_allowed = occ[i] == vir[b] && occ[j] == vir[a];
                    if !direct_allowed && !exchange_allowed {
                        assert_eq!(v, 0.0);
                    }
                    if v.abs() > 1e-12 {
                        nonzero += 1;
                    }
                }
            }
        }
    }
    assert!(nonzero > 0);
}

#[test]
fn test_odd_spin_orbital_dimension() {
    let rhf = converged_rhf();
    let ghf = as_general(&rhf, false);
    let (orbitals, _) = spin_orbitals(&rhf);
    let odd = orbitals.coeff.rows(0, orbitals.coeff.nrows() - 1).into_owned();
    let result = PeriodicGmp2::new(&ghf).ao2mo(Some(&SpinOrbitals::Untagged(odd)));
    assert!(matches!(result, Err(PbcError::OddSpinOrbitalDimension(11))));
}

#[test]
fn test_spin_label_count_must_match() {
    let rhf = converged_rhf();
    let ghf = as_general(&rhf, false);
    let (orbitals, mut orbspin) = spin_orbitals(&rhf);
    orbspin.pop();
    let result = PeriodicGmp2::new(&ghf).ao2mo(Some(&SpinOrbitals::Tagged {
        coeff: orbitals.coeff,
        orbspin,
    }));
    assert!(matches!(result, Err(PbcError::ShapeMismatch { .. })));
}

#[test]
fn test_flavour_needs_matching_solution() {
    let rhf = converged_rhf();
    assert!(matches!(
        PeriodicUmp2::new(&rhf).kernel(),
        Err(PbcError::MissingSolution(_))
    ));
    assert!(matches!(
        PeriodicGmp2::new(&rhf).ao2mo(None),
        Err(PbcError::MissingSolution(_))
    ));

    let e_before = rhf.e_tot;
    PeriodicRmp2::new(&rhf).kernel().unwrap();
    assert_eq!(rhf.e_tot, e_before);
}

#[test]
fn test_kpoint_sampled_mean_field_is_rejected() {
    let rhf = converged_rhf();
    let mut kmf = rhf.clone();
    kmf.kpts = vec![Vector3::new(0.3, 0.0, 0.0), Vector3::new(-0.3, 0.0, 0.0)];

    assert!(matches!(gen_ao2mofn(&kmf).err(), Some(PbcError::Unsupported(_))));
    assert!(matches!(
        PeriodicRmp2::new(&kmf).kernel(),
        Err(PbcError::Unsupported(_))
    ));
    assert!(matches!(
        PeriodicUmp2::new(&as_unrestricted(&kmf)).kernel(),
        Err(PbcError::Unsupported(_))
    ));
    assert!(matches!(
        PeriodicGmp2::new(&as_general(&kmf, true)).kernel(),
        Err(PbcError::Unsupported(_))
    ));
}
