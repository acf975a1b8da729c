//! Madelung constant of a unit probe charge in a neutralising background.

use super::Cell;
use itertools::iproduct;
use libm::erfc;
use nalgebra::Vector3;
use std::f64::consts::PI;

/// erfc(x) and exp(-x^2/4) both fall below 1e-16 past this argument.
const EWALD_CUT: f64 = 8.0;

/// Ewald energy of one point charge per cell (plus uniform background).
fn probe_ewald_energy(cell: &Cell) -> f64 {
    let volume = cell.volume();
    let eta = PI.sqrt() / volume.cbrt();

    let a = cell.lattice;
    let at = a.transpose();
    let real_shells: Vec<i64> = (0..3)
        .map(|i| (EWALD_CUT / eta / a.row(i).norm()).ceil() as i64 + 1)
        .collect();
    let mut e_real = 0.0;
    for (i, j, k) in iproduct!(
        -real_shells[0]..=real_shells[0],
        -real_shells[1]..=real_shells[1],
        -real_shells[2]..=real_shells[2]
    ) {
        if i == 0 && j == 0 && k == 0 {
            continue;
        }
        let r = (at * Vector3::new(i as f64, j as f64, k as f64)).norm();
        e_real += 0.5 * erfc(eta * r) / r;
    }

    let b = cell.reciprocal_vectors();
    let bt = b.transpose();
    let gmax = 2.0 * eta * EWALD_CUT;
    let recip_shells: Vec<i64> = (0..3)
        .map(|i| (gmax / b.row(i).norm()).ceil() as i64 + 1)
        .collect();
    let mut e_recip = 0.0;
    for (i, j, k) in iproduct!(
        -recip_shells[0]..=recip_shells[0],
        -recip_shells[1]..=recip_shells[1],
        -recip_shells[2]..=recip_shells[2]
    ) {
        if i == 0 && j == 0 && k == 0 {
            continue;
        }
        let g2 = (bt * Vector3::new(i as f64, j as f64, k as f64)).norm_squared();
        e_recip += (-g2 / (4.0 * eta * eta)).exp() / g2;
    }
    e_recip *= 2.0 * PI / volume;

    let e_self = -eta / PI.sqrt();
    let e_background = -PI / (2.0 * eta * eta * volume);

    e_real + e_recip + e_self + e_background
}

/// Madelung constant used for the `ewald` exchange-divergence correction,
/// `-2 E_ewald(probe)`.
pub fn madelung(cell: &Cell) -> f64 {
    -2.0 * probe_ewald_energy(cell)
}
