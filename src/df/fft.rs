use super::cderi::{Cderi, KptCache};
use super::{DensityFitting, DfScheme};
use crate::cell::Cell;
use crate::error::Result;
use crate::integrals::IntegralEngine;
use nalgebra::Vector3;
use std::f64::consts::PI;
use std::sync::Arc;
use tracing::{debug, info};

/// `4 pi / (V |G|^2)`, optionally damped by `exp(-|G|^2 / 4 omega^2)` to keep
/// only the long-range `erf(omega r)/r` part. The G = 0 term is zero.
pub fn coulomb_kernel(cell: &Cell, gv: &[Vector3<f64>], omega: Option<f64>) -> Vec<f64> {
    let prefactor = 4.0 * PI / cell.volume();
    gv.iter()
        .map(|g| {
            let g2 = g.norm_squared();
            if g2 < 1e-12 {
                return 0.0;
            }
            let damping = omega.map_or(1.0, |w| (-g2 / (4.0 * w * w)).exp());
            prefactor * damping / g2
        })
        .collect()
}

/// Plane-wave fitting: AO pair densities on the cell's FFT mesh contracted
/// with the Coulomb kernel.
#[derive(Debug, Clone)]
pub struct FftDf {
    pub cell: Arc<Cell>,
    pub kpts: Vec<Vector3<f64>>,
    cache: KptCache,
}

impl FftDf {
    pub fn new(cell: Arc<Cell>, kpts: Vec<Vector3<f64>>) -> Self {
        FftDf {
            cell,
            kpts,
            cache: KptCache::default(),
        }
    }
}

/// Plane-wave factors for one k-point, dropping G-vectors whose kernel vanishes.
pub(super) fn plane_wave_cderi(
    cell: &Cell,
    engine: &dyn IntegralEngine,
    kpt: &Vector3<f64>,
    omega: Option<f64>,
) -> Result<Cderi> {
    let gv = cell.gv();
    let kernel = coulomb_kernel(cell, &gv, omega);
    let rho = engine.pair_densities(cell, kpt, &gv)?;

    let (factors, weights): (Vec<_>, Vec<_>) = rho
        .into_iter()
        .zip(kernel)
        .filter(|(_, w)| *w > 0.0)
        .unzip();
    debug!("{} plane waves with non-zero Coulomb weight", factors.len());

    Cderi::from_complex(engine.nao(cell), factors, weights)
}

impl DensityFitting for FftDf {
    fn scheme(&self) -> DfScheme {
        DfScheme::Fft
    }

    fn kpts(&self) -> &[Vector3<f64>] {
        &self.kpts
    }

    fn build(&mut self, engine: &dyn IntegralEngine) -> Result<()> {
        info!(
            "Building FFTDF on mesh {:?} for {} k-point(s)",
            self.cell.mesh,
            self.kpts.len()
        );
        for kpt in &self.kpts {
            let cderi = plane_wave_cderi(&self.cell, engine, kpt, None)?;
            self.cache.insert(*kpt, cderi);
        }
        Ok(())
    }

    fn cderi(&self, kpt: &Vector3<f64>) -> Result<&Cderi> {
        self.cache.get(kpt)
    }
}
