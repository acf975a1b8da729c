//! Closed-shell Roothaan-Hall iterations at the Gamma point.

use super::xc::{XcFunctional, XcGrid};
use super::{Diis, ExxDiv, MeanField, Method, MoSolution, Orbitals, ScfDriver};
use crate::cell::madelung;
use crate::df::DensityFitting;
use crate::error::{PbcError, Result};
use crate::integrals::IntegralEngine;
use nalgebra::{DMatrix, DVector};
use std::cmp::Ordering;
use tracing::{debug, info, warn};

/// Built-in restricted driver for Gamma-point HF and local-density DFT.
///
/// J and K come from the mean-field's density-fitting backend; k-point
/// sampling needs an external [`ScfDriver`].
#[derive(Debug, Clone, Default)]
pub struct RoothaanDriver;

/// Canonical orthogonaliser `U s^{-1/2}`, dropping near-linear dependencies.
pub(crate) fn orthogonalizer(overlap: &DMatrix<f64>) -> DMatrix<f64> {
    let eig = overlap.clone().symmetric_eigen();
    let keep: Vec<usize> = (0..eig.eigenvalues.len())
        .filter(|&i| eig.eigenvalues[i] > 1e-10)
        .collect();
    let mut x = eig.eigenvectors.select_columns(&keep);
    for (mut col, &i) in x.column_iter_mut().zip(&keep) {
        col /= eig.eigenvalues[i].sqrt();
    }
    x
}

/// Solve `F C = S C e` in the orthogonal basis `x`, eigenvalues ascending.
pub(crate) fn eigh(fock: &DMatrix<f64>, x: &DMatrix<f64>) -> (DVector<f64>, DMatrix<f64>) {
    let f_prime = x.transpose() * fock * x;
    let eig = f_prime.symmetric_eigen();

    let mut indices: Vec<usize> = (0..eig.eigenvalues.len()).collect();
    indices.sort_by(|&a, &b| {
        eig.eigenvalues[a]
            .partial_cmp(&eig.eigenvalues[b])
            .unwrap_or(Ordering::Equal)
    });
    let energies = DVector::from_fn(indices.len(), |i, _| eig.eigenvalues[indices[i]]);
    let coeff = x * eig.eigenvectors.select_columns(&indices);
    (energies, coeff)
}

fn make_rdm1(coeff: &DMatrix<f64>, nocc: usize) -> DMatrix<f64> {
    let occupied = coeff.columns(0, nocc).into_owned();
    &occupied * occupied.transpose() * 2.0
}

/// Everything that stays fixed across SCF cycles.
struct FockBuilder<'a> {
    mf: &'a MeanField,
    hcore: DMatrix<f64>,
    overlap: DMatrix<f64>,
    functional: Option<XcFunctional>,
    grid: Option<XcGrid>,
    madelung: f64,
}

impl FockBuilder<'_> {
    fn hyb(&self) -> f64 {
        self.functional.map_or(1.0, |f| f.exact_exchange())
    }

    /// Fock matrix and electronic energy for a density matrix.
    fn build(&self, dm: &DMatrix<f64>) -> Result<(DMatrix<f64>, f64)> {
        let hyb = self.hyb();
        let kpt = self.mf.kpt()?;
        let (vj, vk) = self.mf.with_df.get_jk(dm, &kpt, hyb != 0.0)?;

        let mut energy = dm.dot(&self.hcore) + 0.5 * dm.dot(&vj);
        let mut fock = &self.hcore + vj;

        if let Some(mut vk) = vk {
            if self.madelung != 0.0 {
                vk += &self.overlap * dm * &self.overlap * self.madelung;
            }
            energy -= 0.25 * hyb * dm.dot(&vk);
            fock -= vk * (0.5 * hyb);
        }

        if let (Some(functional), Some(grid)) = (&self.functional, &self.grid) {
            let (exc, vxc) = grid.eval(functional, dm);
            energy += exc;
            fock += vxc;
        }

        Ok((fock, energy))
    }
}

impl ScfDriver for RoothaanDriver {
    fn kernel(&mut self, mf: &mut MeanField, engine: &dyn IntegralEngine) -> Result<f64> {
        if !mf.is_gamma_point() {
            return Err(PbcError::Unsupported(format!(
                "built-in Roothaan driver handles the Gamma point only ({} k-points given)",
                mf.kpts.len()
            )));
        }

        let cell = mf.cell.clone();
        let kpt = mf.kpt()?;
        let nelectron = cell.nelectron();
        if nelectron % 2 != 0 {
            return Err(PbcError::OddElectronCount(nelectron));
        }
        let nocc = nelectron / 2;

        let functional = match &mf.method {
            Method::Hf => None,
            Method::Dft { xc } => Some(XcFunctional::parse(xc)?),
        };
        let grid = match functional {
            Some(_) => Some(XcGrid::new(&cell, engine, &kpt)?),
            None => None,
        };
        let madelung = match mf.exxdiv {
            ExxDiv::Ewald => madelung(&cell),
            ExxDiv::None => 0.0,
        };

        let overlap = engine.overlap(&cell, &kpt)?;
        let hcore = engine.hcore(&cell, &kpt)?;
        let energy_nuc = engine.energy_nuc(&cell);
        let x = orthogonalizer(&overlap);
        if nocc > x.ncols() {
            return Err(PbcError::ShapeMismatch {
                context: "occupied orbitals vs. linearly independent AOs",
                expected: x.ncols(),
                found: nocc,
            });
        }

        let params = mf.params;
        let verbose = mf.verbose;
        info!(
            "Starting Roothaan SCF: nao = {}, nocc = {}, E_nuc = {:.10}, madelung = {:.8}",
            hcore.nrows(),
            nocc,
            energy_nuc,
            madelung
        );

        let builder = FockBuilder {
            mf,
            hcore,
            overlap,
            functional,
            grid,
            madelung,
        };

        // core-Hamiltonian guess
        let (mut mo_energy, mut mo_coeff) = eigh(&builder.hcore, &x);
        let mut dm = make_rdm1(&mo_coeff, nocc);
        let mut diis = (params.diis_space > 0).then(|| Diis::new(params.diis_space));

        let mut e_old = 0.0;
        let mut converged = false;
        for cycle in 0..params.max_cycle {
            let (fock, e_elec) = builder.build(&dm)?;
            let e_tot = e_elec + energy_nuc;

            let fock = match diis.as_mut() {
                Some(diis) => {
                    diis.update(fock.clone(), &dm, &builder.overlap);
                    diis.extrapolate().unwrap_or(fock)
                }
                None => fock,
            };

            let (energies, coeff) = eigh(&fock, &x);
            let dm_new = make_rdm1(&coeff, nocc);
            let ddm = (&dm_new - &dm).norm();
            let de = e_tot - e_old;

            if verbose >= 4 {
                info!(
                    "cycle {}: E = {:.12} au, dE = {:.3e}, |ddm| = {:.3e}",
                    cycle + 1,
                    e_tot,
                    de,
                    ddm
                );
            }

            mo_energy = energies;
            mo_coeff = coeff;
            dm = dm_new;

            if de.abs() < params.conv_tol && ddm < params.conv_tol.sqrt() {
                converged = true;
                info!("SCF converged in {} cycles", cycle + 1);
                break;
            }
            e_old = e_tot;
        }

        let (_, e_elec) = builder.build(&dm)?;
        let e_tot = e_elec + energy_nuc;
        if !converged {
            warn!(
                "SCF not converged after {} cycles, E = {:.12} au",
                params.max_cycle, e_tot
            );
        }
        debug!("Orbital energies: {:?}", mo_energy.as_slice());

        let nmo = mo_coeff.ncols();
        let occ = DVector::from_fn(nmo, |i, _| if i < nocc { 2.0 } else { 0.0 });
        let orbitals = Orbitals::new(mo_coeff, mo_energy, occ)?;

        mf.solution = Some(MoSolution::Restricted(orbitals));
        mf.e_tot = e_tot;
        mf.converged = converged;
        Ok(e_tot)
    }
}
