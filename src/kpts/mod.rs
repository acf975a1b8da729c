//! Monkhorst-Pack k-point meshes folded into the first Brillouin zone.


use crate::cell::Cell;
use crate::error::{PbcError, Result};
use itertools::iproduct;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Requested k-point sampling.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KMesh {
    /// Number of points along each reciprocal axis.
    pub nmp: [usize; 3],
    /// Shift even axes by half a spacing so the mesh contains Gamma.
    #[serde(default)]
    pub gamma: bool,
    /// Extra fractional shift applied to every point before folding.
    #[serde(default)]
    pub kshift: [f64; 3],
}

impl KMesh {
    pub fn new(nmp: [usize; 3]) -> Self {
        KMesh {
            nmp,
            gamma: false,
            kshift: [0.0; 3],
        }
    }

    pub fn with_gamma(mut self, gamma: bool) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_shift(mut self, kshift: [f64; 3]) -> Self {
        self.kshift = kshift;
        self
    }

    /// Fractional k-points: Monkhorst-Pack, optional Gamma shift, user
    /// shift, then folding into `[-0.5, 0.5)`.
    pub fn scaled_kpts(&self) -> Result<Vec<Vector3<f64>>> {
        let mut kpts = monkhorst_pack(self.nmp)?;
        debug!("Monkhorst-Pack k-points: {:?}", kpts);

        if self.gamma {
            for (axis, &n) in self.nmp.iter().enumerate() {
                if n % 2 == 0 {
                    for k in kpts.iter_mut() {
                        k[axis] += 0.5 / n as f64;
                    }
                }
            }
        }

        let shift = Vector3::from(self.kshift);
        for k in kpts.iter_mut() {
            *k = wrap_to_first_bz(&(*k + shift));
        }
        debug!("Folded k-points: {:?}", kpts);

        Ok(kpts)
    }

    /// Folded fractional k-points together with their absolute coordinates.
    pub fn build(&self, cell: &Cell) -> Result<(Vec<Vector3<f64>>, Vec<Vector3<f64>>)> {
        let scaled = self.scaled_kpts()?;
        let abs = cell.get_abs_kpts(&scaled);
        Ok((scaled, abs))
    }
}

/// `(i + 0.5) / n - 0.5` along each axis; the last axis runs fastest.
pub fn monkhorst_pack(nmp: [usize; 3]) -> Result<Vec<Vector3<f64>>> {
    if nmp.iter().any(|&n| n == 0) {
        return Err(PbcError::InvalidMesh(nmp));
    }
    let coord = |i: usize, n: usize| (i as f64 + 0.5) / n as f64 - 0.5;
    Ok(iproduct!(0..nmp[0], 0..nmp[1], 0..nmp[2])
        .map(|(i, j, k)| Vector3::new(coord(i, nmp[0]), coord(j, nmp[1]), coord(k, nmp[2])))
        .collect())
}

/// Subtract the nearest lattice point so every component lies in `[-0.5, 0.5)`.
pub fn wrap_to_first_bz(k: &Vector3<f64>) -> Vector3<f64> {
    k.map(|x| {
        let folded = x - (x + 0.5).floor();
        // x = 0.5 - tiny can round up to exactly 0.5
        if folded >= 0.5 {
            folded - 1.0
        } else {
            folded
        }
    })
}
