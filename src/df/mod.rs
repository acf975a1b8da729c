//! Density-fitting backends for periodic two-electron integrals.
//!
//! Three interchangeable strategies are available: plane-wave fitting on the
//! FFT mesh ([`FftDf`]), Gaussian auxiliary-basis fitting ([`GaussianDf`]) and
//! mixed fitting ([`MixedDf`]). A backend is selected by name with
//! [`DfScheme::from_name`], built once against an [`IntegralEngine`] and then
//! used both for the mean-field J/K builds and for MP2 integral
//! transformations.

mod cderi;
mod fft;
mod gdf;
mod mdf;

pub use cderi::Cderi;
pub use fft::{coulomb_kernel, FftDf};
pub use gdf::GaussianDf;
pub use mdf::MixedDf;

use crate::cell::Cell;
use crate::error::{PbcError, Result};
use crate::integrals::IntegralEngine;
use nalgebra::{DMatrix, Vector3};
use std::fmt;
use std::sync::Arc;

/// Which fitting strategy a mean-field object uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DfScheme {
    Fft,
    Gaussian,
    Mixed,
}

impl DfScheme {
    /// `"df"` selects Gaussian fitting, `"mix_df"` mixed fitting; anything
    /// else, including no name at all, falls back to plane-wave fitting.
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("df") => DfScheme::Gaussian,
            Some("mix_df") => DfScheme::Mixed,
            _ => DfScheme::Fft,
        }
    }
}

impl fmt::Display for DfScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DfScheme::Fft => "FFTDF",
            DfScheme::Gaussian => "GDF",
            DfScheme::Mixed => "MDF",
        };
        f.write_str(name)
    }
}

pub trait DensityFitting {
    fn scheme(&self) -> DfScheme;

    fn kpts(&self) -> &[Vector3<f64>];

    /// Evaluate and cache the fitting factors for every k-point of the backend.
    fn build(&mut self, engine: &dyn IntegralEngine) -> Result<()>;

    /// Cached factors for `kpt`; fails if `kpt` was not part of the build.
    fn cderi(&self, kpt: &Vector3<f64>) -> Result<&Cderi>;

    /// `(pq|rs)` over four orbital blocks at `kpt`, uncompressed:
    /// rows `p * nq + q`, columns `r * ns + s`.
    fn ao2mo(&self, mos: [&DMatrix<f64>; 4], kpt: &Vector3<f64>) -> Result<DMatrix<f64>> {
        self.cderi(kpt)?.contract(mos)
    }

    fn get_jk(
        &self,
        dm: &DMatrix<f64>,
        kpt: &Vector3<f64>,
        with_k: bool,
    ) -> Result<(DMatrix<f64>, Option<DMatrix<f64>>)> {
        self.cderi(kpt)?.get_jk(dm, with_k)
    }
}

/// A backend of any of the three schemes, owned by a mean-field object.
#[derive(Debug, Clone)]
pub enum DfBackend {
    Fft(FftDf),
    Gaussian(GaussianDf),
    Mixed(MixedDf),
}

impl DfBackend {
    pub fn new(scheme: DfScheme, cell: Arc<Cell>, kpts: Vec<Vector3<f64>>) -> Self {
        match scheme {
            DfScheme::Fft => DfBackend::Fft(FftDf::new(cell, kpts)),
            DfScheme::Gaussian => DfBackend::Gaussian(GaussianDf::new(cell, kpts)),
            DfScheme::Mixed => DfBackend::Mixed(MixedDf::new(cell, kpts)),
        }
    }

    pub fn cell(&self) -> &Arc<Cell> {
        match self {
            DfBackend::Fft(df) => &df.cell,
            DfBackend::Gaussian(df) => &df.cell,
            DfBackend::Mixed(df) => &df.cell,
        }
    }

    fn inner(&self) -> &dyn DensityFitting {
        match self {
            DfBackend::Fft(df) => df as &dyn DensityFitting,
            DfBackend::Gaussian(df) => df as &dyn DensityFitting,
            DfBackend::Mixed(df) => df as &dyn DensityFitting,
        }
    }
}

impl DensityFitting for DfBackend {
    fn scheme(&self) -> DfScheme {
        self.inner().scheme()
    }

    fn kpts(&self) -> &[Vector3<f64>] {
        self.inner().kpts()
    }

    /// Only fully periodic cells are fitted: the Coulomb kernels and the
    /// exchange-divergence correction assume three periodic directions.
    fn build(&mut self, engine: &dyn IntegralEngine) -> Result<()> {
        let dimension = self.cell().dimension;
        if dimension != 3 {
            return Err(PbcError::Unsupported(format!(
                "density fitting for {}-dimensional cells; only 3D periodicity is implemented",
                dimension
            )));
        }
        match self {
            DfBackend::Fft(df) => df.build(engine),
            DfBackend::Gaussian(df) => df.build(engine),
            DfBackend::Mixed(df) => df.build(engine),
        }
    }

    fn cderi(&self, kpt: &Vector3<f64>) -> Result<&Cderi> {
        self.inner().cderi(kpt)
    }
}

/// Auxiliary basis used when none is given: even-tempered for GTH basis sets,
/// the Weigend Coulomb-fitting set otherwise.
pub fn default_auxbasis(basis: &str) -> String {
    if basis.to_ascii_lowercase().starts_with("gth") {
        "etb".to_string()
    } else {
        "weigend".to_string()
    }
}
