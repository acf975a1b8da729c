//! Periodic unit cell: lattice, atoms, basis and plane-wave discretisation.
//!
//! A [`Cell`] is produced once by [`build_cell`] from an [`AtomicStructure`]
//! and is immutable afterwards; mean-field objects share it through an `Arc`.

mod ewald;
mod structure;
#[cfg(test)]
mod tests;

pub use ewald::madelung;
pub use structure::AtomicStructure;

use crate::error::{PbcError, Result};
use itertools::iproduct;
use nalgebra::{Matrix3, Vector3};
use periodic_table_on_an_enum::Element;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::{debug, info};

/// Bohr radius in Angstrom.
pub const BOHR: f64 = 0.529_177_210_92;

/// Length unit the atomic structure is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Unit {
    #[serde(rename = "A", alias = "Angstrom", alias = "angstrom")]
    Angstrom,
    #[serde(rename = "B", alias = "Bohr", alias = "bohr")]
    Bohr,
}

impl Unit {
    /// Factor converting a length in this unit to Bohr.
    pub fn to_bohr(self) -> f64 {
        match self {
            Unit::Angstrom => 1.0 / BOHR,
            Unit::Bohr => 1.0,
        }
    }
}

/// Options accepted by [`build_cell`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CellParams {
    pub unit: Unit,
    /// Kinetic-energy cutoff in Hartree; ignored when `gsmax` is set.
    pub ke_cutoff: f64,
    /// Number of G-vectors on each side of the origin along every axis.
    pub gsmax: Option<usize>,
    pub basis: String,
    pub pseudo: Option<String>,
    /// Number of periodic directions. Cells with fewer than three are built
    /// but rejected by the density-fitting backends.
    pub dimension: usize,
    pub incore_anyway: bool,
}

impl Default for CellParams {
    fn default() -> Self {
        CellParams {
            unit: Unit::Bohr,
            ke_cutoff: 20.0,
            gsmax: None,
            basis: "gth-szv".to_string(),
            pseudo: Some("gth-pade".to_string()),
            dimension: 3,
            incore_anyway: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CellAtom {
    pub element: Element,
    /// Cartesian position in Bohr.
    pub position: Vector3<f64>,
}

/// A built periodic cell. All lengths are stored in Bohr.
#[derive(Debug, Clone)]
pub struct Cell {
    /// Lattice vectors, one per row.
    pub lattice: Matrix3<f64>,
    pub atoms: Vec<CellAtom>,
    pub basis: String,
    pub pseudo: Option<String>,
    pub dimension: usize,
    /// `None` when the mesh came from an explicit `gsmax`.
    pub ke_cutoff: Option<f64>,
    pub mesh: [usize; 3],
    pub incore_anyway: bool,
    pub unit: Unit,
}

/// Build a periodic cell from an atomic structure.
///
/// Exactly one of `gsmax` and `ke_cutoff` fixes the FFT mesh; `gsmax` takes
/// precedence when both are given.
pub fn build_cell(structure: &AtomicStructure, params: &CellParams) -> Result<Cell> {
    if params.dimension > 3 {
        return Err(PbcError::InvalidCell(format!(
            "dimension must be 0..=3, got {}",
            params.dimension
        )));
    }

    let scale = params.unit.to_bohr();
    let lattice = structure.lattice_matrix() * scale;
    if lattice.determinant().abs() < 1e-10 {
        return Err(PbcError::InvalidLattice(
            "lattice vectors are linearly dependent".to_string(),
        ));
    }

    let atoms = structure
        .atoms()?
        .into_iter()
        .map(|(element, position)| CellAtom {
            element,
            position: position * scale,
        })
        .collect::<Vec<_>>();

    let (mesh, ke_cutoff) = match params.gsmax {
        Some(gs) => ([2 * gs + 1; 3], None),
        None => {
            if !(params.ke_cutoff > 0.0) {
                return Err(PbcError::InvalidCell(format!(
                    "ke_cutoff must be positive, got {}",
                    params.ke_cutoff
                )));
            }
            (cutoff_to_mesh(&lattice, params.ke_cutoff), Some(params.ke_cutoff))
        }
    };

    let cell = Cell {
        lattice,
        atoms,
        basis: params.basis.clone(),
        pseudo: params.pseudo.clone(),
        dimension: params.dimension,
        ke_cutoff,
        mesh,
        incore_anyway: params.incore_anyway,
        unit: params.unit,
    };

    info!(
        "Built cell: {} atoms, basis {}, pseudo {}, mesh {:?}, volume {:.6} Bohr^3",
        cell.atoms.len(),
        cell.basis,
        cell.pseudo.as_deref().unwrap_or("none"),
        cell.mesh,
        cell.volume()
    );
    for (i, atom) in cell.atoms.iter().enumerate() {
        debug!(
            "  Atom {}: {} at [{:.6}, {:.6}, {:.6}] Bohr",
            i + 1,
            atom.element.get_symbol(),
            atom.position.x,
            atom.position.y,
            atom.position.z
        );
    }

    Ok(cell)
}

/// `gs_i = ceil(sqrt(2 ke) / |b_i|)`, mesh `2 gs_i + 1`.
fn cutoff_to_mesh(lattice: &Matrix3<f64>, ke_cutoff: f64) -> [usize; 3] {
    let b = reciprocal(lattice);
    let gmax = (2.0 * ke_cutoff).sqrt();
    let mut mesh = [0; 3];
    for (i, n) in mesh.iter_mut().enumerate() {
        let gs = (gmax / b.row(i).norm()).ceil() as usize;
        *n = 2 * gs + 1;
    }
    mesh
}

fn reciprocal(lattice: &Matrix3<f64>) -> Matrix3<f64> {
    // rows b_i with a_i . b_j = 2 pi delta_ij
    lattice
        .try_inverse()
        .map(|inv| inv.transpose() * (2.0 * PI))
        .unwrap_or_else(Matrix3::zeros)
}

/// FFT frequency ordering: 0, 1, .., n/2, -(n-1)/2, .., -1.
fn fft_freq(n: usize) -> Vec<i64> {
    let n = n as i64;
    (0..n).map(|i| if i < (n + 1) / 2 { i } else { i - n }).collect()
}

impl Cell {
    pub fn volume(&self) -> f64 {
        self.lattice.determinant().abs()
    }

    /// Reciprocal lattice vectors (rows), including the 2 pi factor.
    pub fn reciprocal_vectors(&self) -> Matrix3<f64> {
        reciprocal(&self.lattice)
    }

    /// Fractional (scaled) k-points to absolute coordinates.
    pub fn get_abs_kpts(&self, scaled: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
        let bt = self.reciprocal_vectors().transpose();
        scaled.iter().map(|k| bt * k).collect()
    }

    /// Absolute k-points back to fractional coordinates.
    pub fn get_scaled_kpts(&self, abs: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
        abs.iter().map(|k| self.lattice * k / (2.0 * PI)).collect()
    }

    pub fn ngrids(&self) -> usize {
        self.mesh.iter().product()
    }

    /// Plane-wave vectors of the FFT mesh, last axis running fastest.
    pub fn gv(&self) -> Vec<Vector3<f64>> {
        let bt = self.reciprocal_vectors().transpose();
        let [f0, f1, f2] = self.mesh.map(fft_freq);
        iproduct!(f0.iter(), f1.iter(), f2.iter())
            .map(|(&i, &j, &k)| bt * Vector3::new(i as f64, j as f64, k as f64))
            .collect()
    }

    /// Uniform real-space grid matching the FFT mesh.
    pub fn grid_coords(&self) -> Vec<Vector3<f64>> {
        let at = self.lattice.transpose();
        let [n0, n1, n2] = self.mesh;
        iproduct!(0..n0, 0..n1, 0..n2)
            .map(|(i, j, k)| {
                at * Vector3::new(
                    i as f64 / n0 as f64,
                    j as f64 / n1 as f64,
                    k as f64 / n2 as f64,
                )
            })
            .collect()
    }

    /// Number of electrons treated explicitly.
    ///
    /// Without a pseudopotential every electron counts. A pseudopotential
    /// name carrying a `-qN` suffix (`gth-pbe-q9`) fixes the valence charge
    /// of every atom to `N`, which covers semicore variants. Otherwise only
    /// the electrons outside the preceding noble-gas shell are counted, so
    /// semicore pseudopotentials must be named with their `-qN` suffix.
    pub fn nelectron(&self) -> usize {
        let explicit = self.pseudo.as_deref().and_then(explicit_valence);
        self.atoms
            .iter()
            .map(|atom| {
                let z = atom.element.get_atomic_number() as usize;
                match (&self.pseudo, explicit) {
                    (Some(_), Some(q)) => q.min(z),
                    (Some(_), None) => valence_charge(z),
                    (None, _) => z,
                }
            })
            .sum()
    }
}

/// `N` from a trailing `-qN` in a pseudopotential name.
fn explicit_valence(pseudo: &str) -> Option<usize> {
    let (_, suffix) = pseudo.rsplit_once("-q")?;
    suffix.parse().ok()
}

/// Electrons outside the largest noble-gas core below `z`.
fn valence_charge(z: usize) -> usize {
    const NOBLE: [usize; 6] = [86, 54, 36, 18, 10, 2];
    let core = NOBLE.iter().copied().find(|&n| n < z).unwrap_or(0);
    z - core
}
