//! DIIS (Direct Inversion in the Iterative Subspace) Fock extrapolation.

use nalgebra::{DMatrix, DVector};
use std::collections::VecDeque;
use tracing::debug;

/// Extrapolates the Fock matrix from a window of previous Fock matrices,
/// minimising the norm of the commutator error `FDS - SDF` subject to
/// `sum c_i = 1`.
#[derive(Debug, Clone)]
pub struct Diis {
    error_matrices: VecDeque<DMatrix<f64>>,
    fock_matrices: VecDeque<DMatrix<f64>>,
    max_subspace_size: usize,
}

impl Diis {
    /// Create an empty DIIS accelerator
    ///
    /// # Arguments
    ///
    /// * `max_subspace_size` - Number of previous Fock/error pairs kept for
    ///   the extrapolation; older pairs are discarded first
    pub fn new(max_subspace_size: usize) -> Self {
        Diis {
            error_matrices: VecDeque::with_capacity(max_subspace_size),
            fock_matrices: VecDeque::with_capacity(max_subspace_size),
            max_subspace_size,
        }
    }

    /// Commutator `FDS - SDF`, zero at self-consistency.
    pub fn error_matrix(
        fock: &DMatrix<f64>,
        density: &DMatrix<f64>,
        overlap: &DMatrix<f64>,
    ) -> DMatrix<f64> {
        fock * density * overlap - overlap * density * fock
    }

    /// Push a Fock matrix and its error; the oldest pair drops out once the
    /// window is full.
    pub fn update(&mut self, fock: DMatrix<f64>, density: &DMatrix<f64>, overlap: &DMatrix<f64>) {
        let error = Self::error_matrix(&fock, density, overlap);
        if self.error_matrices.len() >= self.max_subspace_size {
            self.error_matrices.pop_front();
            self.fock_matrices.pop_front();
        }
        self.error_matrices.push_back(error);
        self.fock_matrices.push_back(fock);
    }

    /// Extrapolate a new Fock matrix from the stored subspace
    ///
    /// # Algorithm
    ///
    /// With error matrices `e_i`, solve the bordered Pulay system
    ///
    /// ```text
    /// | B   -1 | | c      |   |  0 |
    /// | -1   0 | | lambda | = | -1 |,   B_ij = <e_i, e_j>
    /// ```
    ///
    /// and return `F = sum_i c_i F_i`, the combination with the smallest
    /// error norm whose coefficients sum to one.
    ///
    /// # Returns
    ///
    /// The extrapolated Fock matrix, or `None` when the subspace is empty or
    /// the B matrix is singular
    pub fn extrapolate(&self) -> Option<DMatrix<f64>> {
        let n = self.error_matrices.len();
        if n == 0 {
            return None;
        }

        let mut b = DMatrix::zeros(n + 1, n + 1);
        for i in 0..n {
            for j in 0..=i {
                let bij = self.error_matrices[i].dot(&self.error_matrices[j]);
                b[(i, j)] = bij;
                b[(j, i)] = bij;
            }
            b[(i, n)] = -1.0;
            b[(n, i)] = -1.0;
        }

        let mut rhs = DVector::zeros(n + 1);
        rhs[n] = -1.0;

        let coeffs = match b.lu().solve(&rhs) {
            Some(x) => x,
            None => {
                debug!("DIIS extrapolation failed: singular B matrix");
                return None;
            }
        };

        let mut fock = DMatrix::zeros(self.fock_matrices[0].nrows(), self.fock_matrices[0].ncols());
        for (f, c) in self.fock_matrices.iter().zip(coeffs.iter()) {
            fock += f * *c;
        }
        Some(fock)
    }

    pub fn size(&self) -> usize {
        self.error_matrices.len()
    }
}
