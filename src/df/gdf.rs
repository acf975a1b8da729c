use super::cderi::{Cderi, KptCache};
use super::{default_auxbasis, DensityFitting, DfScheme};
use crate::cell::Cell;
use crate::error::Result;
use crate::integrals::IntegralEngine;
use nalgebra::Vector3;
use std::sync::Arc;
use tracing::info;

/// Gaussian density fitting with a full-range Coulomb metric.
#[derive(Debug, Clone)]
pub struct GaussianDf {
    pub cell: Arc<Cell>,
    pub kpts: Vec<Vector3<f64>>,
    pub auxbasis: String,
    cache: KptCache,
}

impl GaussianDf {
    pub fn new(cell: Arc<Cell>, kpts: Vec<Vector3<f64>>) -> Self {
        let auxbasis = default_auxbasis(&cell.basis);
        GaussianDf {
            cell,
            kpts,
            auxbasis,
            cache: KptCache::default(),
        }
    }

    pub fn with_auxbasis(mut self, auxbasis: &str) -> Self {
        self.auxbasis = auxbasis.to_string();
        self.cache = KptCache::default();
        self
    }
}

impl DensityFitting for GaussianDf {
    fn scheme(&self) -> DfScheme {
        DfScheme::Gaussian
    }

    fn kpts(&self) -> &[Vector3<f64>] {
        &self.kpts
    }

    fn build(&mut self, engine: &dyn IntegralEngine) -> Result<()> {
        info!(
            "Building GDF with auxiliary basis {} for {} k-point(s)",
            self.auxbasis,
            self.kpts.len()
        );
        let nao = engine.nao(&self.cell);
        for kpt in &self.kpts {
            let factors = engine.gaussian_factors(&self.cell, kpt, &self.auxbasis, None)?;
            self.cache.insert(*kpt, Cderi::from_real(nao, factors)?);
        }
        Ok(())
    }

    fn cderi(&self, kpt: &Vector3<f64>) -> Result<&Cderi> {
        self.cache.get(kpt)
    }
}
