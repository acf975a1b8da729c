//! Integrals dumped by an external engine and read back from YAML.

use super::IntegralEngine;
use crate::cell::Cell;
use crate::error::{PbcError, Result};
use nalgebra::{DMatrix, Vector3};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Gamma-point integrals for one cell, stored as row-major nested vectors.
///
/// Plane-wave pair densities must be tabulated on the cell's own FFT mesh in
/// the order produced by [`Cell::gv`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TabulatedIntegrals {
    pub nao: usize,
    pub energy_nuc: f64,
    pub overlap: Vec<Vec<f64>>,
    pub hcore: Vec<Vec<f64>>,
    /// Metric-contracted three-centre factors, one entry per auxiliary basis
    /// and range-separation parameter.
    #[serde(default)]
    pub gaussian: Vec<TabulatedFactors>,
    /// One entry per G-vector: real and imaginary parts.
    #[serde(default)]
    pub pair_densities: Option<Vec<[Vec<Vec<f64>>; 2]>>,
    /// AO values on the cell's real-space grid, `npoints x nao`.
    #[serde(default)]
    pub ao_values: Option<Vec<Vec<f64>>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TabulatedFactors {
    pub auxbasis: String,
    #[serde(default)]
    pub omega: Option<f64>,
    pub factors: Vec<Vec<Vec<f64>>>,
}

fn to_matrix(rows: &[Vec<f64>], ncols: usize, what: &'static str) -> Result<DMatrix<f64>> {
    for row in rows {
        if row.len() != ncols {
            return Err(PbcError::ShapeMismatch {
                context: what,
                expected: ncols,
                found: row.len(),
            });
        }
    }
    Ok(DMatrix::from_fn(rows.len(), ncols, |i, j| rows[i][j]))
}

fn square(rows: &[Vec<f64>], n: usize, what: &'static str) -> Result<DMatrix<f64>> {
    if rows.len() != n {
        return Err(PbcError::ShapeMismatch {
            context: what,
            expected: n,
            found: rows.len(),
        });
    }
    to_matrix(rows, n, what)
}

fn require_gamma(kpt: &Vector3<f64>) -> Result<()> {
    if kpt.norm() > 1e-9 {
        return Err(PbcError::Unsupported(
            "tabulated integrals only cover the Gamma point".to_string(),
        ));
    }
    Ok(())
}

impl TabulatedIntegrals {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> color_eyre::eyre::Result<Self> {
        use color_eyre::eyre::WrapErr;

        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Unable to read integral file: {}", path.display()))?;
        let tables: TabulatedIntegrals =
            serde_yml::from_str(&content).wrap_err("Failed to parse integral file")?;
        info!(
            "Loaded tabulated integrals: nao = {}, {} auxiliary set(s), pair densities: {}",
            tables.nao,
            tables.gaussian.len(),
            tables.pair_densities.is_some()
        );
        Ok(tables)
    }
}

impl IntegralEngine for TabulatedIntegrals {
    fn nao(&self, _cell: &Cell) -> usize {
        self.nao
    }

    fn overlap(&self, _cell: &Cell, kpt: &Vector3<f64>) -> Result<DMatrix<f64>> {
        require_gamma(kpt)?;
        square(&self.overlap, self.nao, "overlap matrix")
    }

    fn hcore(&self, _cell: &Cell, kpt: &Vector3<f64>) -> Result<DMatrix<f64>> {
        require_gamma(kpt)?;
        square(&self.hcore, self.nao, "core Hamiltonian")
    }

    fn energy_nuc(&self, _cell: &Cell) -> f64 {
        self.energy_nuc
    }

    fn pair_densities(
        &self,
        _cell: &Cell,
        kpt: &Vector3<f64>,
        gv: &[Vector3<f64>],
    ) -> Result<Vec<DMatrix<Complex64>>> {
        require_gamma(kpt)?;
        let table = self
            .pair_densities
            .as_ref()
            .ok_or(PbcError::MissingIntegrals("plane-wave pair densities"))?;
        if table.len() != gv.len() {
            return Err(PbcError::ShapeMismatch {
                context: "pair densities per G-vector",
                expected: gv.len(),
                found: table.len(),
            });
        }

        table
            .iter()
            .map(|[re, im]| {
                let re = square(re, self.nao, "pair density (real)")?;
                let im = square(im, self.nao, "pair density (imaginary)")?;
                Ok(re.zip_map(&im, Complex64::new))
            })
            .collect()
    }

    fn gaussian_factors(
        &self,
        _cell: &Cell,
        kpt: &Vector3<f64>,
        auxbasis: &str,
        omega: Option<f64>,
    ) -> Result<Vec<DMatrix<f64>>> {
        require_gamma(kpt)?;
        let same_range = |tabulated: Option<f64>| match (tabulated, omega) {
            (None, None) => true,
            (Some(a), Some(b)) => (a - b).abs() < 1e-12,
            _ => false,
        };
        let entry = self
            .gaussian
            .iter()
            .find(|t| t.auxbasis.eq_ignore_ascii_case(auxbasis) && same_range(t.omega))
            .ok_or(PbcError::MissingIntegrals("three-centre factors for the auxiliary basis"))?;
        entry
            .factors
            .iter()
            .map(|f| square(f, self.nao, "three-centre factor"))
            .collect()
    }

    fn ao_values(
        &self,
        _cell: &Cell,
        kpt: &Vector3<f64>,
        coords: &[Vector3<f64>],
    ) -> Result<DMatrix<f64>> {
        require_gamma(kpt)?;
        let table = self
            .ao_values
            .as_ref()
            .ok_or(PbcError::MissingIntegrals("AO values on the real-space grid"))?;
        if table.len() != coords.len() {
            return Err(PbcError::ShapeMismatch {
                context: "AO values per grid point",
                expected: coords.len(),
                found: table.len(),
            });
        }
        to_matrix(table, self.nao, "AO values")
    }
}
