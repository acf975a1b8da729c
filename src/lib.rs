//! Periodic Hartree-Fock/DFT harness and density-fitted MP2 for crystals.
//!
//! The crate builds periodic cells and Monkhorst-Pack k-point meshes, selects
//! a density-fitting backend, drives a mean-field calculation through an
//! [`ScfDriver`] and transforms the fitted integrals for restricted,
//! unrestricted and spin-orbital MP2. Gaussian integrals themselves come from
//! an [`IntegralEngine`] implementation.

pub mod cell;
pub mod df;
pub mod error;
pub mod integrals;
pub mod kpts;
pub mod mp2_impl;
pub mod runner;
pub mod scf_impl;
#[cfg(test)]
pub(crate) mod testing;

pub use cell::{build_cell, AtomicStructure, Cell, CellParams, Unit};
pub use df::{DensityFitting, DfBackend, DfScheme};
pub use error::{PbcError, Result};
pub use integrals::{IntegralEngine, TabulatedIntegrals};
pub use kpts::KMesh;
pub use mp2_impl::{PeriodicGmp2, PeriodicMp2, PeriodicRmp2, PeriodicUmp2, SpinOrbitals};
pub use runner::{run_mean_field, MeanFieldRun, RunConfig};
pub use scf_impl::{ExxDiv, MeanField, Method, MoSolution, RoothaanDriver, ScfDriver};
