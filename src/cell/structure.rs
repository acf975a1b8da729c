//! Atomic-structure description a cell is built from.

use crate::error::{PbcError, Result};
use nalgebra::{Matrix3, Vector3};
use periodic_table_on_an_enum::Element;
use serde::{Deserialize, Serialize};

/// Lattice vectors plus atomic species and Cartesian positions.
///
/// Lengths are in whatever unit the cell is later built with; the structure
/// itself is unit-agnostic.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AtomicStructure {
    /// Lattice vectors, one per row.
    pub lattice: [[f64; 3]; 3],
    pub symbols: Vec<String>,
    pub positions: Vec<[f64; 3]>,
}

impl AtomicStructure {
    pub fn new(lattice: [[f64; 3]; 3], symbols: Vec<String>, positions: Vec<[f64; 3]>) -> Self {
        Self {
            lattice,
            symbols,
            positions,
        }
    }

    /// Two-atom primitive cell of the diamond structure with cubic lattice
    /// constant `a`.
    pub fn diamond(symbol: &str, a: f64) -> Self {
        let h = 0.5 * a;
        let q = 0.25 * a;
        Self {
            lattice: [[0.0, h, h], [h, 0.0, h], [h, h, 0.0]],
            symbols: vec![symbol.to_string(), symbol.to_string()],
            positions: vec![[0.0, 0.0, 0.0], [q, q, q]],
        }
    }

    pub fn lattice_matrix(&self) -> Matrix3<f64> {
        Matrix3::from_fn(|i, j| self.lattice[i][j])
    }

    /// Resolve the symbols to elements, paired with their positions.
    pub fn atoms(&self) -> Result<Vec<(Element, Vector3<f64>)>> {
        if self.symbols.len() != self.positions.len() {
            return Err(PbcError::ShapeMismatch {
                context: "atomic positions",
                expected: self.symbols.len(),
                found: self.positions.len(),
            });
        }

        self.symbols
            .iter()
            .zip(&self.positions)
            .map(|(symbol, pos)| {
                let element = Element::from_symbol(symbol)
                    .ok_or_else(|| PbcError::UnknownElement(symbol.clone()))?;
                Ok((element, Vector3::new(pos[0], pos[1], pos[2])))
            })
            .collect()
    }
}
