//! One-call mean-field runs: k-points, backend selection, build and SCF.

#[cfg(test)]
mod tests;

use crate::cell::Cell;
use crate::df::{DensityFitting, DfScheme};
use crate::error::Result;
use crate::integrals::IntegralEngine;
use crate::kpts::KMesh;
use crate::scf_impl::{ExxDiv, MeanField, Method, ScfDriver, ScfParams};
use nalgebra::Vector3;
use std::sync::Arc;
use tracing::info;

/// Everything that distinguishes the Gamma-point and k-point HF/DFT runs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub method: Method,
    /// `None` runs at the Gamma point only.
    pub kmesh: Option<KMesh>,
    pub df: DfScheme,
    pub exxdiv: ExxDiv,
    pub verbose: i32,
    pub scf: ScfParams,
}

impl RunConfig {
    fn base(method: Method, kmesh: Option<KMesh>) -> Self {
        RunConfig {
            method,
            kmesh,
            df: DfScheme::Fft,
            exxdiv: ExxDiv::None,
            verbose: 4,
            scf: ScfParams::default(),
        }
    }

    /// Gamma-point Hartree-Fock.
    pub fn hf() -> Self {
        Self::base(Method::Hf, None)
    }

    /// Gamma-point DFT with `lda,vwn`.
    pub fn dft() -> Self {
        Self::base(Method::lda(), None)
    }

    /// k-point Hartree-Fock on a Monkhorst-Pack mesh.
    pub fn khf(kmesh: KMesh) -> Self {
        Self::base(Method::Hf, Some(kmesh))
    }

    /// k-point DFT with `lda,vwn` on a Monkhorst-Pack mesh.
    pub fn kdft(kmesh: KMesh) -> Self {
        Self::base(Method::lda(), Some(kmesh))
    }

    /// Select the backend by name: `"df"`, `"mix_df"`, anything else FFT.
    pub fn with_df(mut self, name: Option<&str>) -> Self {
        self.df = DfScheme::from_name(name);
        self
    }

    /// Replace the functional of a DFT run; ignored for HF.
    pub fn with_xc(mut self, xc: &str) -> Self {
        if let Method::Dft { xc: current } = &mut self.method {
            *current = xc.to_string();
        }
        self
    }

    pub fn with_exxdiv(mut self, exxdiv: ExxDiv) -> Self {
        self.exxdiv = exxdiv;
        self
    }

    pub fn with_verbose(mut self, verbose: i32) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_scf_params(mut self, scf: ScfParams) -> Self {
        self.scf = scf;
        self
    }
}

/// A mean-field object after its SCF, with the folded fractional k-points of
/// k-point runs.
#[derive(Debug, Clone)]
pub struct MeanFieldRun {
    pub mf: MeanField,
    pub scaled_kpts: Option<Vec<Vector3<f64>>>,
}

/// Build the k-points, the mean-field object and its density-fitting backend,
/// then converge it with `driver`.
///
/// Non-convergence is reported through `mf.converged`, not as an error.
pub fn run_mean_field<D: ScfDriver + ?Sized>(
    cell: Arc<Cell>,
    config: &RunConfig,
    engine: &dyn IntegralEngine,
    driver: &mut D,
) -> Result<MeanFieldRun> {
    let (kpts, scaled_kpts) = match &config.kmesh {
        Some(kmesh) => {
            let (scaled, abs) = kmesh.build(&cell)?;
            info!(
                "Monkhorst-Pack mesh {:?} (gamma = {}): {} k-points",
                kmesh.nmp,
                kmesh.gamma,
                abs.len()
            );
            (abs, Some(scaled))
        }
        None => (vec![Vector3::zeros()], None),
    };

    let mut mf = MeanField::new(cell, config.method.clone(), kpts, config.exxdiv);
    mf.verbose = config.verbose;
    mf.params = config.scf;
    mf.set_df(config.df);
    info!("Density fitting: {}", mf.with_df.scheme());

    mf.build(engine)?;
    mf.scf(driver, engine)?;

    Ok(MeanFieldRun { mf, scaled_kpts })
}
