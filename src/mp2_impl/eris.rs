//! MO-basis integral blocks and the MP2 energy expressions over them.

use crate::scf_impl::Orbitals;
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use tracing::debug;

/// Integral blocks that know how to turn themselves into an MP2 energy.
pub trait Mp2Integrals {
    /// Second-order correlation energy with canonical orbital denominators.
    fn energy(&self) -> f64;
}

/// `sum_{ijab} f(i, j, a, b)`, parallel over `i`.
fn sum_ijab<F>(nocc: [usize; 2], nvir: [usize; 2], f: F) -> f64
where
    F: Fn(usize, usize, usize, usize) -> f64 + Sync,
{
    (0..nocc[0])
        .into_par_iter()
        .map(|i| {
            let mut e = 0.0;
            for j in 0..nocc[1] {
                for a in 0..nvir[0] {
                    for b in 0..nvir[1] {
                        e += f(i, j, a, b);
                    }
                }
            }
            e
        })
        .sum()
}

/// Occupied and virtual orbital energies of one spin channel.
#[derive(Debug, Clone)]
pub struct OrbitalEnergies {
    pub occ: DVector<f64>,
    pub vir: DVector<f64>,
}

impl OrbitalEnergies {
    pub fn from_orbitals(orbitals: &Orbitals) -> Self {
        let (occ, vir) = orbitals.split_energy();
        OrbitalEnergies { occ, vir }
    }

    pub fn nocc(&self) -> usize {
        self.occ.len()
    }

    pub fn nvir(&self) -> usize {
        self.vir.len()
    }
}

/// `(ia|jb)` for a closed-shell reference: rows `i * nvir + a`, columns
/// `j * nvir + b`.
#[derive(Debug, Clone)]
pub struct RestrictedEris {
    pub ovov: DMatrix<f64>,
    pub mo_energy: OrbitalEnergies,
}

impl Mp2Integrals for RestrictedEris {
    fn energy(&self) -> f64 {
        let (no, nv) = (self.mo_energy.nocc(), self.mo_energy.nvir());
        let (eo, ev) = (&self.mo_energy.occ, &self.mo_energy.vir);
        let e = sum_ijab([no, no], [nv, nv], |i, j, a, b| {
            let iajb = self.ovov[(i * nv + a, j * nv + b)];
            let ibja = self.ovov[(i * nv + b, j * nv + a)];
            iajb * (2.0 * iajb - ibja) / (eo[i] + eo[j] - ev[a] - ev[b])
        });
        debug!("Restricted MP2 pair sum over {} x {} orbitals: {:.12}", no, nv, e);
        e
    }
}

/// Spin blocks `(ia|jb)`, `(ia|JB)` and `(IA|JB)`; upper case marks beta
/// orbitals.
#[allow(non_snake_case)]
#[derive(Debug, Clone)]
pub struct UnrestrictedEris {
    pub ovov: DMatrix<f64>,
    pub ovOV: DMatrix<f64>,
    pub OVOV: DMatrix<f64>,
    pub alpha: OrbitalEnergies,
    pub beta: OrbitalEnergies,
}

fn same_spin_energy(ovov: &DMatrix<f64>, mo: &OrbitalEnergies) -> f64 {
    let (no, nv) = (mo.nocc(), mo.nvir());
    let (eo, ev) = (&mo.occ, &mo.vir);
    sum_ijab([no, no], [nv, nv], |i, j, a, b| {
        let iajb = ovov[(i * nv + a, j * nv + b)];
        let ibja = ovov[(i * nv + b, j * nv + a)];
        0.5 * iajb * (iajb - ibja) / (eo[i] + eo[j] - ev[a] - ev[b])
    })
}

impl Mp2Integrals for UnrestrictedEris {
    fn energy(&self) -> f64 {
        let (a, b) = (&self.alpha, &self.beta);
        let e_aa = same_spin_energy(&self.ovov, a);
        let e_bb = same_spin_energy(&self.OVOV, b);
        let nv_b = b.nvir();
        let e_ab = sum_ijab([a.nocc(), b.nocc()], [a.nvir(), nv_b], |i, j, x, y| {
            let v = self.ovOV[(i * a.nvir() + x, j * nv_b + y)];
            v * v / (a.occ[i] + b.occ[j] - a.vir[x] - b.vir[y])
        });
        debug!(
            "Unrestricted MP2 components: aa = {:.12}, bb = {:.12}, ab = {:.12}",
            e_aa, e_bb, e_ab
        );
        e_aa + e_bb + e_ab
    }
}

/// Antisymmetrised spin-orbital integrals `<ij||ab> = (ia|jb) - (ib|ja)`.
#[derive(Debug, Clone)]
pub struct GeneralEris {
    nocc: usize,
    nvir: usize,
    oovv: Vec<f64>,
    pub mo_energy: OrbitalEnergies,
}

impl GeneralEris {
    /// Antisymmetrise an `(ia|jb)` pair matrix
    ///
    /// <ij||ab> = (ia|jb) - (ib|ja)
    ///
    /// # Arguments
    ///
    /// * `ovov` - Spin-orbital `(ia|jb)` with rows `i * nvir + a` and columns
    ///   `j * nvir + b`
    /// * `mo_energy` - Occupied and virtual spin-orbital energies, which fix
    ///   `nocc` and `nvir`
    ///
    /// # Returns
    ///
    /// The antisymmetrised integrals stored as `oovv[i, j, a, b]`
    pub fn from_ovov(ovov: &DMatrix<f64>, mo_energy: OrbitalEnergies) -> Self {
        let (nocc, nvir) = (mo_energy.nocc(), mo_energy.nvir());
        let mut oovv = vec![0.0; nocc * nocc * nvir * nvir];
        for i in 0..nocc {
            for j in 0..nocc {
                for a in 0..nvir {
                    for b in 0..nvir {
                        oovv[((i * nocc + j) * nvir + a) * nvir + b] =
                            ovov[(i * nvir + a, j * nvir + b)] - ovov[(i * nvir + b, j * nvir + a)];
                    }
                }
            }
        }
        GeneralEris {
            nocc,
            nvir,
            oovv,
            mo_energy,
        }
    }

    pub fn nocc(&self) -> usize {
        self.nocc
    }

    pub fn nvir(&self) -> usize {
        self.nvir
    }

    /// `<ij||ab>`
    pub fn oovv(&self, i: usize, j: usize, a: usize, b: usize) -> f64 {
        self.oovv[((i * self.nocc + j) * self.nvir + a) * self.nvir + b]
    }
}

impl Mp2Integrals for GeneralEris {
    fn energy(&self) -> f64 {
        let (eo, ev) = (&self.mo_energy.occ, &self.mo_energy.vir);
        sum_ijab([self.nocc; 2], [self.nvir; 2], |i, j, a, b| {
            let v = self.oovv(i, j, a, b);
            0.25 * v * v / (eo[i] + eo[j] - ev[a] - ev[b])
        })
    }
}
