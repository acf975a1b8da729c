//! Small deterministic integral engine for unit tests.

use crate::cell::{build_cell, AtomicStructure, Cell, CellParams};
use crate::error::{PbcError, Result};
use crate::integrals::IntegralEngine;
use nalgebra::{DMatrix, Vector3};
use num_complex::Complex64;

/// Four hydrogens in a 6 Bohr cube on a 3x3x3 mesh: 4 valence electrons.
pub(crate) fn model_cell() -> Cell {
    let structure = AtomicStructure::new(
        [[6.0, 0.0, 0.0], [0.0, 6.0, 0.0], [0.0, 0.0, 6.0]],
        vec!["H".into(), "H".into(), "H".into(), "H".into()],
        vec![
            [0.0, 0.0, 0.0],
            [1.4, 0.0, 0.0],
            [3.0, 3.0, 0.0],
            [4.4, 3.0, 0.0],
        ],
    );
    let params = CellParams {
        gsmax: Some(1),
        ..CellParams::default()
    };
    build_cell(&structure, &params).unwrap()
}

/// Smooth, well-conditioned stand-ins for lattice-summed integrals.
///
/// All factorised ERIs are Gram forms, so the Coulomb matrix is positive
/// semi-definite like the real thing.
#[derive(Debug, Clone)]
pub(crate) struct ModelEngine {
    pub nao: usize,
    pub naux: usize,
}

impl Default for ModelEngine {
    fn default() -> Self {
        ModelEngine { nao: 6, naux: 8 }
    }
}

impl ModelEngine {
    fn center(&self, u: usize) -> Vector3<f64> {
        Vector3::new(0.7 * u as f64, 0.3 * (u % 3) as f64, 0.2 * (u % 2) as f64)
    }

    fn pair_amplitude(&self, u: usize, v: usize) -> f64 {
        let d = (self.center(u) - self.center(v)).norm();
        (-0.5 * d * d).exp()
    }
}

impl IntegralEngine for ModelEngine {
    fn nao(&self, _cell: &Cell) -> usize {
        self.nao
    }

    fn overlap(&self, _cell: &Cell, _kpt: &Vector3<f64>) -> Result<DMatrix<f64>> {
        Ok(DMatrix::from_fn(self.nao, self.nao, |i, j| {
            if i == j {
                1.0
            } else {
                0.1 * self.pair_amplitude(i, j)
            }
        }))
    }

    fn hcore(&self, _cell: &Cell, _kpt: &Vector3<f64>) -> Result<DMatrix<f64>> {
        Ok(DMatrix::from_fn(self.nao, self.nao, |i, j| {
            if i == j {
                -2.0 + 0.8 * i as f64
            } else {
                -0.2 * self.pair_amplitude(i, j)
            }
        }))
    }

    fn energy_nuc(&self, _cell: &Cell) -> f64 {
        1.25
    }

    fn pair_densities(
        &self,
        _cell: &Cell,
        kpt: &Vector3<f64>,
        gv: &[Vector3<f64>],
    ) -> Result<Vec<DMatrix<Complex64>>> {
        if kpt.norm() > 1e-9 {
            return Err(PbcError::Unsupported("model engine is Gamma-only".into()));
        }
        Ok(gv
            .iter()
            .map(|g| {
                DMatrix::from_fn(self.nao, self.nao, |u, v| {
                    let mid = 0.5 * (self.center(u) + self.center(v));
                    let amplitude =
                        0.5 * self.pair_amplitude(u, v) * (-g.norm_squared() / 8.0).exp();
                    Complex64::from_polar(amplitude, -g.dot(&mid))
                })
            })
            .collect())
    }

    fn gaussian_factors(
        &self,
        _cell: &Cell,
        kpt: &Vector3<f64>,
        _auxbasis: &str,
        omega: Option<f64>,
    ) -> Result<Vec<DMatrix<f64>>> {
        if kpt.norm() > 1e-9 {
            return Err(PbcError::Unsupported("model engine is Gamma-only".into()));
        }
        let scale = omega.map_or(1.0, |w| 1.0 - (-w).exp());
        Ok((0..self.naux)
            .map(|p| {
                DMatrix::from_fn(self.nao, self.nao, |u, v| {
                    let phase = 0.7 * (p + 1) as f64 * (u + v + 1) as f64;
                    0.15 * scale * phase.cos() * self.pair_amplitude(u, v)
                })
            })
            .collect())
    }

    fn ao_values(
        &self,
        _cell: &Cell,
        _kpt: &Vector3<f64>,
        coords: &[Vector3<f64>],
    ) -> Result<DMatrix<f64>> {
        Ok(DMatrix::from_fn(coords.len(), self.nao, |r, u| {
            let d = coords[r] - self.center(u);
            (-0.3 * d.norm_squared()).exp()
        }))
    }
}

/// Brute-force `(uv|ls)` from a factorisation, for checking contractions.
pub(crate) fn full_eri(factors: &[DMatrix<Complex64>], weights: &[f64], n: usize) -> Vec<f64> {
    let mut eri = vec![0.0; n * n * n * n];
    for (b, &w) in factors.iter().zip(weights) {
        for u in 0..n {
            for v in 0..n {
                for l in 0..n {
                    for s in 0..n {
                        eri[((u * n + v) * n + l) * n + s] +=
                            w * (b[(u, v)].conj() * b[(l, s)]).re;
                    }
                }
            }
        }
    }
    eri
}
