//! Error type shared by every periodic calculation step.

use thiserror::Error;

/// Errors raised while building cells, k-point meshes, density-fitting
/// backends, mean-field solutions and MP2 integral containers.
#[derive(Error, Debug)]
pub enum PbcError {
    #[error("Unknown element symbol: {0}")]
    UnknownElement(String),

    #[error("Invalid lattice: {0}")]
    InvalidLattice(String),

    #[error("Invalid cell parameter: {0}")]
    InvalidCell(String),

    #[error("Invalid k-point mesh {0:?}: every axis needs at least one point")]
    InvalidMesh([usize; 3]),

    #[error("Shape mismatch in {context}: expected {expected}, found {found}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Spin-orbital coefficients need an even AO dimension, found {0}")]
    OddSpinOrbitalDimension(usize),

    #[error("Restricted reference needs an even electron count, found {0}")]
    OddElectronCount(usize),

    #[error("Density fitting has not been built for k-point [{0:.6}, {1:.6}, {2:.6}]")]
    DfNotBuilt(f64, f64, f64),

    #[error("Integral engine cannot provide {0}")]
    MissingIntegrals(&'static str),

    #[error("Unknown exchange-correlation functional: {0}")]
    UnknownFunctional(String),

    #[error("Mean-field object has no {0} orbitals; run the SCF first")]
    MissingSolution(&'static str),

    #[error("Unsupported: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, PbcError>;
