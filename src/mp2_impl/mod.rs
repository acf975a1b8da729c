//! Periodic MP2 (second-order Møller-Plesset) on top of a converged
//! mean-field object.
//!
//! # Theory
//!
//! For a closed-shell reference the correlation energy is
//!
//! E_MP2 = Σ_{ijab} (ia|jb) [2 (ia|jb) - (ib|ja)] / (ε_i + ε_j - ε_a - ε_b)
//!
//! The unrestricted and spin-orbital (general) variants use the usual spin
//! blocks and antisymmetrised integrals. Only the AO→MO integral
//! transformation is periodic-specific: it runs through the mean-field's
//! density-fitting backend at the mean-field's k-point instead of a
//! molecular four-index transform.
//!
//! # Usage
//!
//! ```ignore
//! let run = run_mean_field(cell, &RunConfig::hf(), &engine, &mut RoothaanDriver)?;
//! let mp2 = PeriodicRmp2::new(&run.mf);
//! let e_corr = mp2.kernel()?;
//! ```

mod eris;
mod gmp2;
mod mp2;
#[cfg(test)]
mod tests;

pub use eris::{GeneralEris, Mp2Integrals, OrbitalEnergies, RestrictedEris, UnrestrictedEris};
pub use gmp2::{PeriodicGmp2, SpinOrbitals};
pub use mp2::{PeriodicRmp2, PeriodicUmp2};

use crate::df::DensityFitting;
use crate::error::Result;
use crate::scf_impl::MeanField;
use nalgebra::DMatrix;
use tracing::info;

/// An MP2 flavour whose integrals come from a periodic mean-field object.
pub trait PeriodicMp2 {
    /// Orbital coefficients accepted by [`PeriodicMp2::ao2mo`].
    type Coefficients;
    type Eris: Mp2Integrals;

    fn mean_field(&self) -> &MeanField;

    /// Transform the `(ov|ov)` integrals; `None` uses the mean-field's own
    /// converged coefficients.
    fn ao2mo(&self, mo_coeff: Option<&Self::Coefficients>) -> Result<Self::Eris>;

    /// MP2 correlation energy from the mean-field's orbitals.
    fn kernel(&self) -> Result<f64> {
        let eris = self.ao2mo(None)?;
        let e_corr = eris.energy();
        let mf = self.mean_field();
        info!("E(MP2 correlation) = {:.12} Eh", e_corr);
        info!("E(MP2 total)       = {:.12} Eh", mf.e_tot + e_corr);
        Ok(e_corr)
    }
}

/// The AO→MO transform bound to a mean-field object: the backend's own
/// `ao2mo` at the mean-field's k-point, uncompressed.
///
/// Only single-k-point objects are accepted; a k-point sampled mean-field
/// yields `PbcError::Unsupported`.
pub fn gen_ao2mofn(
    mf: &MeanField,
) -> Result<impl Fn([&DMatrix<f64>; 4]) -> Result<DMatrix<f64>> + '_> {
    let kpt = mf.kpt()?;
    Ok(move |mos: [&DMatrix<f64>; 4]| mf.with_df.ao2mo(mos, &kpt))
}
