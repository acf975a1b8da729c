//! Periodic mean-field objects and the SCF drivers that converge them.
//!
//! A [`MeanField`] carries the cell, its k-points, the exchange-divergence
//! treatment and a density-fitting backend. It goes through
//! "unbuilt -> built -> converged": the backend is built against an
//! [`IntegralEngine`], then an [`ScfDriver`] fills in the orbitals.

mod diis;
mod roothaan;
pub mod xc;

pub use diis::Diis;
pub use roothaan::RoothaanDriver;
pub use xc::XcFunctional;

use crate::cell::Cell;
use crate::df::{DensityFitting, DfBackend, DfScheme};
use crate::error::{PbcError, Result};
use crate::integrals::IntegralEngine;
use nalgebra::{DMatrix, DVector, Vector3};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Mean-field flavour.
#[derive(Debug, Clone, PartialEq)]
pub enum Method {
    Hf,
    Dft { xc: String },
}

impl Method {
    pub fn lda() -> Self {
        Method::Dft {
            xc: "lda,vwn".to_string(),
        }
    }
}

/// Treatment of the G = 0 divergence of the exchange integrals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExxDiv {
    /// Drop the G = 0 term.
    #[default]
    None,
    /// Drop G = 0 and add the probe-charge Madelung correction.
    Ewald,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spin {
    Alpha,
    Beta,
}

/// Coefficients (AO x MO), orbital energies and occupations.
#[derive(Debug, Clone)]
pub struct Orbitals {
    pub coeff: DMatrix<f64>,
    pub energy: DVector<f64>,
    pub occ: DVector<f64>,
}

impl Orbitals {
    pub fn new(coeff: DMatrix<f64>, energy: DVector<f64>, occ: DVector<f64>) -> Result<Self> {
        for (context, len) in [("orbital energies", energy.len()), ("occupations", occ.len())] {
            if len != coeff.ncols() {
                return Err(PbcError::ShapeMismatch {
                    context,
                    expected: coeff.ncols(),
                    found: len,
                });
            }
        }
        Ok(Orbitals { coeff, energy, occ })
    }

    pub fn nmo(&self) -> usize {
        self.coeff.ncols()
    }

    pub fn occupied_indices(&self) -> Vec<usize> {
        (0..self.nmo()).filter(|&i| self.occ[i] > 0.0).collect()
    }

    pub fn virtual_indices(&self) -> Vec<usize> {
        (0..self.nmo()).filter(|&i| self.occ[i] <= 0.0).collect()
    }

    pub fn nocc(&self) -> usize {
        self.occupied_indices().len()
    }

    /// Occupied and virtual column blocks of `coeff`, selected with this
    /// object's occupations.
    pub fn split(&self, coeff: &DMatrix<f64>) -> Result<(DMatrix<f64>, DMatrix<f64>)> {
        if coeff.ncols() != self.nmo() {
            return Err(PbcError::ShapeMismatch {
                context: "orbital coefficient columns",
                expected: self.nmo(),
                found: coeff.ncols(),
            });
        }
        Ok((
            coeff.select_columns(&self.occupied_indices()),
            coeff.select_columns(&self.virtual_indices()),
        ))
    }

    /// Orbital energies reordered as occupied block then virtual block.
    pub fn split_energy(&self) -> (DVector<f64>, DVector<f64>) {
        (
            self.energy.select_rows(&self.occupied_indices()),
            self.energy.select_rows(&self.virtual_indices()),
        )
    }
}

/// Converged orbitals of a mean-field object.
#[derive(Debug, Clone)]
pub enum MoSolution {
    Restricted(Orbitals),
    Unrestricted { alpha: Orbitals, beta: Orbitals },
    /// Two-component spin orbitals: the first half of the AO rows is alpha,
    /// the second half beta. `orbspin` labels each MO when it is a pure spin
    /// state.
    General {
        orbitals: Orbitals,
        orbspin: Option<Vec<Spin>>,
    },
}

/// SCF iteration controls.
#[derive(Debug, Clone, Copy)]
pub struct ScfParams {
    pub max_cycle: usize,
    pub conv_tol: f64,
    /// DIIS window; zero disables extrapolation.
    pub diis_space: usize,
}

impl Default for ScfParams {
    fn default() -> Self {
        ScfParams {
            max_cycle: 50,
            conv_tol: 1e-9,
            diis_space: 8,
        }
    }
}

/// A periodic HF or DFT calculation on a set of k-points.
#[derive(Debug, Clone)]
pub struct MeanField {
    pub cell: Arc<Cell>,
    pub method: Method,
    /// Absolute k-points; a single zero vector for Gamma-point objects.
    pub kpts: Vec<Vector3<f64>>,
    pub exxdiv: ExxDiv,
    pub with_df: DfBackend,
    /// Diagnostic volume; higher values log per-cycle details.
    pub verbose: i32,
    pub params: ScfParams,
    pub e_tot: f64,
    pub converged: bool,
    pub solution: Option<MoSolution>,
}

impl MeanField {
    pub fn new(cell: Arc<Cell>, method: Method, kpts: Vec<Vector3<f64>>, exxdiv: ExxDiv) -> Self {
        let with_df = DfBackend::new(DfScheme::Fft, cell.clone(), kpts.clone());
        MeanField {
            cell,
            method,
            kpts,
            exxdiv,
            with_df,
            verbose: 4,
            params: ScfParams::default(),
            e_tot: 0.0,
            converged: false,
            solution: None,
        }
    }

    /// Single k-point object at Gamma.
    pub fn gamma(cell: Arc<Cell>, method: Method, exxdiv: ExxDiv) -> Self {
        Self::new(cell, method, vec![Vector3::zeros()], exxdiv)
    }

    /// Replace the density-fitting backend (unbuilt) with another scheme.
    pub fn set_df(&mut self, scheme: DfScheme) {
        self.with_df = DfBackend::new(scheme, self.cell.clone(), self.kpts.clone());
    }

    pub fn build(&mut self, engine: &dyn IntegralEngine) -> Result<()> {
        self.with_df.build(engine)
    }

    /// The k-point of a single-k-point object. Objects sampling several
    /// k-points have no single `kpt` and are rejected.
    pub fn kpt(&self) -> Result<Vector3<f64>> {
        match self.kpts.as_slice() {
            [kpt] => Ok(*kpt),
            kpts => Err(PbcError::Unsupported(format!(
                "expected a single k-point, mean-field samples {}",
                kpts.len()
            ))),
        }
    }

    pub fn is_gamma_point(&self) -> bool {
        matches!(self.kpts.as_slice(), [kpt] if kpt.norm() < 1e-9)
    }

    /// Run the driver and record the result on `self`.
    pub fn scf<D: ScfDriver + ?Sized>(
        &mut self,
        driver: &mut D,
        engine: &dyn IntegralEngine,
    ) -> Result<f64> {
        let e_tot = driver.kernel(self, engine)?;
        info!(
            "{} total energy: {:.10} au (converged: {})",
            self.label(),
            e_tot,
            self.converged
        );
        Ok(e_tot)
    }

    fn label(&self) -> String {
        let method = match &self.method {
            Method::Hf => "HF".to_string(),
            Method::Dft { xc } => format!("DFT({})", xc),
        };
        if self.is_gamma_point() {
            format!("Gamma-point {}", method)
        } else {
            format!("{}-k-point {}", self.kpts.len(), method)
        }
    }

    pub fn restricted(&self) -> Result<&Orbitals> {
        match &self.solution {
            Some(MoSolution::Restricted(orbitals)) => Ok(orbitals),
            _ => Err(PbcError::MissingSolution("restricted")),
        }
    }

    pub fn unrestricted(&self) -> Result<(&Orbitals, &Orbitals)> {
        match &self.solution {
            Some(MoSolution::Unrestricted { alpha, beta }) => Ok((alpha, beta)),
            _ => Err(PbcError::MissingSolution("unrestricted")),
        }
    }

    pub fn general(&self) -> Result<(&Orbitals, Option<&[Spin]>)> {
        match &self.solution {
            Some(MoSolution::General { orbitals, orbspin }) => Ok((orbitals, orbspin.as_deref())),
            _ => Err(PbcError::MissingSolution("general spin")),
        }
    }
}

/// Converges a mean-field object in place and returns its total energy.
///
/// Non-convergence is not an error: drivers set `converged = false` and
/// return the last energy.
pub trait ScfDriver {
    fn kernel(&mut self, mf: &mut MeanField, engine: &dyn IntegralEngine) -> Result<f64>;
}
