use super::cderi::{Cderi, KptCache};
use super::fft::plane_wave_cderi;
use super::{default_auxbasis, DensityFitting, DfScheme};
use crate::cell::Cell;
use crate::error::Result;
use crate::integrals::IntegralEngine;
use nalgebra::Vector3;
use std::sync::Arc;
use tracing::info;

/// Mixed fitting: `1/r = erfc(w r)/r + erf(w r)/r`. The short-range part is
/// fitted with Gaussian auxiliary functions, the smooth long-range part with
/// plane waves on the FFT mesh.
#[derive(Debug, Clone)]
pub struct MixedDf {
    pub cell: Arc<Cell>,
    pub kpts: Vec<Vector3<f64>>,
    pub auxbasis: String,
    /// Range-separation parameter in inverse Bohr.
    pub omega: f64,
    cache: KptCache,
}

impl MixedDf {
    pub const DEFAULT_OMEGA: f64 = 0.5;

    pub fn new(cell: Arc<Cell>, kpts: Vec<Vector3<f64>>) -> Self {
        let auxbasis = default_auxbasis(&cell.basis);
        MixedDf {
            cell,
            kpts,
            auxbasis,
            omega: Self::DEFAULT_OMEGA,
            cache: KptCache::default(),
        }
    }

    pub fn with_omega(mut self, omega: f64) -> Self {
        self.omega = omega;
        self.cache = KptCache::default();
        self
    }
}

impl DensityFitting for MixedDf {
    fn scheme(&self) -> DfScheme {
        DfScheme::Mixed
    }

    fn kpts(&self) -> &[Vector3<f64>] {
        &self.kpts
    }

    fn build(&mut self, engine: &dyn IntegralEngine) -> Result<()> {
        info!(
            "Building MDF with auxiliary basis {}, omega = {:.3}, mesh {:?}",
            self.auxbasis, self.omega, self.cell.mesh
        );
        let nao = engine.nao(&self.cell);
        for kpt in &self.kpts {
            let short_range =
                engine.gaussian_factors(&self.cell, kpt, &self.auxbasis, Some(self.omega))?;
            let mut cderi = Cderi::from_real(nao, short_range)?;
            cderi.extend(plane_wave_cderi(&self.cell, engine, kpt, Some(self.omega))?)?;
            self.cache.insert(*kpt, cderi);
        }
        Ok(())
    }

    fn cderi(&self, kpt: &Vector3<f64>) -> Result<&Cderi> {
        self.cache.get(kpt)
    }
}
