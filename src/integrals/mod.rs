//! Interface to the integral engine that evaluates Gaussian-basis quantities
//! for a periodic cell.

mod tabulated;

pub use tabulated::{TabulatedFactors, TabulatedIntegrals};

use crate::cell::Cell;
use crate::error::Result;
use nalgebra::{DMatrix, Vector3};
use num_complex::Complex64;

/// AO-level quantities a periodic calculation consumes.
///
/// Implementations evaluate lattice-summed Gaussian integrals; this crate only
/// orchestrates them.
pub trait IntegralEngine {
    /// Number of atomic orbitals of `cell`.
    fn nao(&self, cell: &Cell) -> usize;

    fn overlap(&self, cell: &Cell, kpt: &Vector3<f64>) -> Result<DMatrix<f64>>;

    /// Kinetic plus (pseudo)potential one-electron Hamiltonian.
    fn hcore(&self, cell: &Cell, kpt: &Vector3<f64>) -> Result<DMatrix<f64>>;

    /// Nuclear (or ion-ion) repulsion energy per cell.
    fn energy_nuc(&self, cell: &Cell) -> f64;

    /// Fourier components `rho_uv(G) = int_cell phi_u phi_v e^{-iGr} dr` on the
    /// supplied plane waves, one `nao x nao` matrix per G.
    fn pair_densities(
        &self,
        cell: &Cell,
        kpt: &Vector3<f64>,
        gv: &[Vector3<f64>],
    ) -> Result<Vec<DMatrix<Complex64>>>;

    /// Three-centre factors `B_L = sum_M (L|M)^{-1/2} (M|uv)` for an auxiliary
    /// basis. With `omega` the metric and integrals use the short-range
    /// `erfc(omega r)/r` interaction instead of `1/r`.
    fn gaussian_factors(
        &self,
        cell: &Cell,
        kpt: &Vector3<f64>,
        auxbasis: &str,
        omega: Option<f64>,
    ) -> Result<Vec<DMatrix<f64>>>;

    /// AO values on real-space points, `npoints x nao`.
    fn ao_values(
        &self,
        cell: &Cell,
        kpt: &Vector3<f64>,
        coords: &[Vector3<f64>],
    ) -> Result<DMatrix<f64>>;
}
