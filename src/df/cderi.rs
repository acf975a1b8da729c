//! Factorised two-electron integrals shared by every fitting scheme.
//!
//! All three backends reduce the Coulomb interaction to
//! `(uv|ls) = Re sum_P w_P conj(B_P[u,v]) B_P[l,s]`; they differ only in how
//! the factors `B_P` and weights `w_P` are produced.

use crate::error::{PbcError, Result};
use nalgebra::{DMatrix, Vector3};
use num_complex::Complex64;
use rayon::prelude::*;

#[derive(Debug, Clone)]
pub struct Cderi {
    nao: usize,
    pub(super) factors: Vec<DMatrix<Complex64>>,
    pub(super) weights: Vec<f64>,
}

impl Cderi {
    pub fn new(nao: usize) -> Self {
        Cderi {
            nao,
            factors: Vec::new(),
            weights: Vec::new(),
        }
    }

    /// Real factors with unit weight, as produced by Gaussian fitting.
    pub fn from_real(nao: usize, factors: Vec<DMatrix<f64>>) -> Result<Self> {
        let weights = vec![1.0; factors.len()];
        let factors = factors
            .into_iter()
            .map(|f| f.map(Complex64::from))
            .collect();
        Self::from_complex(nao, factors, weights)
    }

    pub fn from_complex(
        nao: usize,
        factors: Vec<DMatrix<Complex64>>,
        weights: Vec<f64>,
    ) -> Result<Self> {
        if factors.len() != weights.len() {
            return Err(PbcError::ShapeMismatch {
                context: "fitting weights",
                expected: factors.len(),
                found: weights.len(),
            });
        }
        if let Some(bad) = factors.iter().find(|f| f.shape() != (nao, nao)) {
            return Err(PbcError::ShapeMismatch {
                context: "fitting factor dimension",
                expected: nao,
                found: bad.nrows().max(bad.ncols()),
            });
        }
        Ok(Cderi {
            nao,
            factors,
            weights,
        })
    }

    pub fn nao(&self) -> usize {
        self.nao
    }

    pub fn naux(&self) -> usize {
        self.factors.len()
    }

    /// Append another factorisation of a complementary part of the interaction.
    pub fn extend(&mut self, other: Cderi) -> Result<()> {
        if other.nao != self.nao {
            return Err(PbcError::ShapeMismatch {
                context: "merged fitting factors",
                expected: self.nao,
                found: other.nao,
            });
        }
        self.factors.extend(other.factors);
        self.weights.extend(other.weights);
        Ok(())
    }

    /// Rows: auxiliary index. Columns: the pair `(p, q)` flattened as `p * nq + q`
    /// after transforming with `left^T B_P right`.
    fn half_transform(&self, left: &DMatrix<f64>, right: &DMatrix<f64>) -> Result<DMatrix<Complex64>> {
        for c in [left, right] {
            if c.nrows() != self.nao {
                return Err(PbcError::ShapeMismatch {
                    context: "orbital coefficient rows",
                    expected: self.nao,
                    found: c.nrows(),
                });
            }
        }

        let lt = left.transpose().map(Complex64::from);
        let r = right.map(Complex64::from);
        let (np, nq) = (left.ncols(), right.ncols());

        let rows: Vec<DMatrix<Complex64>> = self
            .factors
            .par_iter()
            .map(|b| &lt * b * &r)
            .collect();

        Ok(DMatrix::from_fn(self.naux(), np * nq, |l, pq| {
            rows[l][(pq / nq, pq % nq)]
        }))
    }

    /// `(pq|rs)` for the four orbital blocks, as a `(np*nq) x (nr*ns)` matrix.
    pub fn contract(&self, mos: [&DMatrix<f64>; 4]) -> Result<DMatrix<f64>> {
        let bra = self.half_transform(mos[0], mos[1])?;
        let mut ket = self.half_transform(mos[2], mos[3])?;
        for (l, mut row) in ket.row_iter_mut().enumerate() {
            row *= Complex64::from(self.weights[l]);
        }
        Ok((bra.adjoint() * ket).map(|z| z.re))
    }

    /// Coulomb and, when requested, exchange matrices of a real symmetric
    /// density matrix.
    pub fn get_jk(
        &self,
        dm: &DMatrix<f64>,
        with_k: bool,
    ) -> Result<(DMatrix<f64>, Option<DMatrix<f64>>)> {
        if dm.shape() != (self.nao, self.nao) {
            return Err(PbcError::ShapeMismatch {
                context: "density matrix",
                expected: self.nao,
                found: dm.nrows(),
            });
        }

        let n = self.nao;
        let dmc = dm.map(Complex64::from);
        let zero = || {
            (
                DMatrix::<Complex64>::zeros(n, n),
                DMatrix::<Complex64>::zeros(n, n),
            )
        };

        let (vj, vk) = self
            .factors
            .par_iter()
            .zip(self.weights.par_iter())
            .map(|(b, &w)| {
                let rho = b.component_mul(&dmc).sum();
                let bconj = b.map(|z| z.conj());
                let vj = &bconj * (rho * w);
                let vk = if with_k {
                    &bconj * &dmc * b.transpose() * Complex64::from(w)
                } else {
                    DMatrix::zeros(n, n)
                };
                (vj, vk)
            })
            .reduce(zero, |(j1, k1), (j2, k2)| (j1 + j2, k1 + k2));

        let vk = with_k.then(|| vk.map(|z| z.re));
        Ok((vj.map(|z| z.re), vk))
    }
}

/// Per-k-point factor cache owned by one backend instance.
#[derive(Debug, Clone, Default)]
pub(crate) struct KptCache {
    entries: Vec<(Vector3<f64>, Cderi)>,
}

impl KptCache {
    pub fn insert(&mut self, kpt: Vector3<f64>, cderi: Cderi) {
        self.entries.retain(|(k, _)| (k - kpt).norm() > 1e-9);
        self.entries.push((kpt, cderi));
    }

    pub fn get(&self, kpt: &Vector3<f64>) -> Result<&Cderi> {
        self.entries
            .iter()
            .find(|(k, _)| (k - kpt).norm() <= 1e-9)
            .map(|(_, c)| c)
            .ok_or(PbcError::DfNotBuilt(kpt.x, kpt.y, kpt.z))
    }
}
