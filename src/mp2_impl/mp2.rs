//! Restricted and unrestricted periodic MP2.

use super::eris::{OrbitalEnergies, RestrictedEris, UnrestrictedEris};
use super::{gen_ao2mofn, PeriodicMp2};
use crate::df::DensityFitting;
use crate::error::Result;
use crate::scf_impl::MeanField;
use nalgebra::DMatrix;
use tracing::info;

/// Closed-shell MP2 over a restricted mean-field solution.
#[derive(Debug, Clone, Copy)]
pub struct PeriodicRmp2<'a> {
    mf: &'a MeanField,
}

impl<'a> PeriodicRmp2<'a> {
    pub fn new(mf: &'a MeanField) -> Self {
        PeriodicRmp2 { mf }
    }
}

impl PeriodicMp2 for PeriodicRmp2<'_> {
    type Coefficients = DMatrix<f64>;
    type Eris = RestrictedEris;

    fn mean_field(&self) -> &MeanField {
        self.mf
    }

    fn ao2mo(&self, mo_coeff: Option<&DMatrix<f64>>) -> Result<RestrictedEris> {
        let orbitals = self.mf.restricted()?;
        let coeff = mo_coeff.unwrap_or(&orbitals.coeff);
        let (orbo, orbv) = orbitals.split(coeff)?;
        info!(
            "RMP2 ao2mo: nocc = {}, nvir = {}, backend {}",
            orbo.ncols(),
            orbv.ncols(),
            self.mf.with_df.scheme()
        );

        let ao2mofn = gen_ao2mofn(self.mf)?;
        let ovov = ao2mofn([&orbo, &orbv, &orbo, &orbv])?;
        Ok(RestrictedEris {
            ovov,
            mo_energy: OrbitalEnergies::from_orbitals(orbitals),
        })
    }
}

/// MP2 over an unrestricted (separate alpha and beta orbitals) solution.
#[derive(Debug, Clone, Copy)]
pub struct PeriodicUmp2<'a> {
    mf: &'a MeanField,
}

impl<'a> PeriodicUmp2<'a> {
    pub fn new(mf: &'a MeanField) -> Self {
        PeriodicUmp2 { mf }
    }
}

impl PeriodicMp2 for PeriodicUmp2<'_> {
    /// Alpha then beta coefficients.
    type Coefficients = (DMatrix<f64>, DMatrix<f64>);
    type Eris = UnrestrictedEris;

    fn mean_field(&self) -> &MeanField {
        self.mf
    }

    fn ao2mo(&self, mo_coeff: Option<&(DMatrix<f64>, DMatrix<f64>)>) -> Result<UnrestrictedEris> {
        let (alpha, beta) = self.mf.unrestricted()?;
        let (coeff_a, coeff_b) = match mo_coeff {
            Some((a, b)) => (a, b),
            None => (&alpha.coeff, &beta.coeff),
        };
        let (orbo_a, orbv_a) = alpha.split(coeff_a)?;
        let (orbo_b, orbv_b) = beta.split(coeff_b)?;
        info!(
            "UMP2 ao2mo: nocc = ({}, {}), nvir = ({}, {})",
            orbo_a.ncols(),
            orbo_b.ncols(),
            orbv_a.ncols(),
            orbv_b.ncols()
        );

        let ao2mofn = gen_ao2mofn(self.mf)?;
        Ok(UnrestrictedEris {
            ovov: ao2mofn([&orbo_a, &orbv_a, &orbo_a, &orbv_a])?,
            ovOV: ao2mofn([&orbo_a, &orbv_a, &orbo_b, &orbv_b])?,
            OVOV: ao2mofn([&orbo_b, &orbv_b, &orbo_b, &orbv_b])?,
            alpha: OrbitalEnergies::from_orbitals(alpha),
            beta: OrbitalEnergies::from_orbitals(beta),
        })
    }
}
