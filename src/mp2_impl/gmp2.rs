//! Spin-orbital (general) periodic MP2.

use super::eris::{GeneralEris, OrbitalEnergies};
use super::{gen_ao2mofn, PeriodicMp2};
use crate::error::{PbcError, Result};
use crate::scf_impl::{MeanField, Spin};
use nalgebra::DMatrix;
use tracing::{debug, info};

/// Two-component orbital coefficients: the first half of the rows holds the
/// alpha AO components, the second half the beta components.
#[derive(Debug, Clone)]
pub enum SpinOrbitals {
    /// Orbitals that may mix alpha and beta components.
    Untagged(DMatrix<f64>),
    /// Orbitals that are each a pure spin state, labelled by `orbspin`.
    Tagged {
        coeff: DMatrix<f64>,
        orbspin: Vec<Spin>,
    },
}

/// MP2 in the spin-orbital basis of a general (two-component) solution.
#[derive(Debug, Clone, Copy)]
pub struct PeriodicGmp2<'a> {
    mf: &'a MeanField,
}

impl<'a> PeriodicGmp2<'a> {
    pub fn new(mf: &'a MeanField) -> Self {
        PeriodicGmp2 { mf }
    }
}

fn spin_halves(c: &DMatrix<f64>, nao: usize) -> (DMatrix<f64>, DMatrix<f64>) {
    (c.rows(0, nao).into_owned(), c.rows(nao, nao).into_owned())
}

impl PeriodicMp2 for PeriodicGmp2<'_> {
    type Coefficients = SpinOrbitals;
    type Eris = GeneralEris;

    fn mean_field(&self) -> &MeanField {
        self.mf
    }

    /// Without coefficients the mean-field's own orbitals are used, tagged
    /// when the mean-field carries spin labels.
    fn ao2mo(&self, mo_coeff: Option<&SpinOrbitals>) -> Result<GeneralEris> {
        let (orbitals, mf_orbspin) = self.mf.general()?;
        let (coeff, orbspin) = match mo_coeff {
            Some(SpinOrbitals::Untagged(coeff)) => (coeff, None),
            Some(SpinOrbitals::Tagged { coeff, orbspin }) => (coeff, Some(orbspin.as_slice())),
            None => (&orbitals.coeff, mf_orbspin),
        };

        let nao2 = coeff.nrows();
        if nao2 % 2 != 0 {
            return Err(PbcError::OddSpinOrbitalDimension(nao2));
        }
        let nao = nao2 / 2;

        let (orbo, orbv) = orbitals.split(coeff)?;
        let nvir = orbv.ncols();
        info!(
            "GMP2 ao2mo: nocc = {}, nvir = {}, spin tags: {}",
            orbo.ncols(),
            nvir,
            orbspin.is_some()
        );

        let ao2mofn = gen_ao2mofn(self.mf)?;
        let (orbo_a, orbo_b) = spin_halves(&orbo, nao);
        let (orbv_a, orbv_b) = spin_halves(&orbv, nao);

        let ovov = match orbspin {
            None => {
                let mut eri = ao2mofn([&orbo_a, &orbv_a, &orbo_a, &orbv_a])?;
                eri += ao2mofn([&orbo_b, &orbv_b, &orbo_b, &orbv_b])?;
                let eri_ab = ao2mofn([&orbo_a, &orbv_a, &orbo_b, &orbv_b])?;
                eri += &eri_ab;
                eri += eri_ab.transpose();
                eri
            }
            Some(orbspin) => {
                if orbspin.len() != orbitals.nmo() {
                    return Err(PbcError::ShapeMismatch {
                        context: "orbital spin labels",
                        expected: orbitals.nmo(),
                        found: orbspin.len(),
                    });
                }
                let orbo = orbo_a + orbo_b;
                let orbv = orbv_a + orbv_b;
                let mut eri = ao2mofn([&orbo, &orbv, &orbo, &orbv])?;

                let spins_of = |indices: Vec<usize>| -> Vec<Spin> {
                    indices.into_iter().map(|p| orbspin[p]).collect()
                };
                let occ_spin = spins_of(orbitals.occupied_indices());
                let vir_spin = spins_of(orbitals.virtual_indices());
                let mut masked = 0;
                for (i, si) in occ_spin.iter().enumerate() {
                    for (a, sa) in vir_spin.iter().enumerate() {
                        if si != sa {
                            let ia = i * nvir + a;
                            eri.row_mut(ia).fill(0.0);
                            eri.column_mut(ia).fill(0.0);
                            masked += 1;
                        }
                    }
                }
                debug!("Zeroed {} spin-forbidden (i, a) pairs", masked);
                eri
            }
        };

        Ok(GeneralEris::from_ovov(&ovov, OrbitalEnergies::from_orbitals(orbitals)))
    }
}
