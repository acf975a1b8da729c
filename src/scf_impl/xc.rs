//! Local-density exchange-correlation on the cell's uniform real-space grid.

use crate::cell::Cell;
use crate::error::{PbcError, Result};
use crate::integrals::IntegralEngine;
use nalgebra::{DMatrix, DVector, Vector3};
use rayon::prelude::*;
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    Slater,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correlation {
    Vwn5,
}

/// An `"exchange,correlation"` functional pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XcFunctional {
    pub exchange: Option<Exchange>,
    pub correlation: Option<Correlation>,
}

impl XcFunctional {
    /// Parse names such as `lda,vwn`, `slater,`, `,vwn5` or the aliases
    /// `lda` / `svwn`.
    pub fn parse(xc: &str) -> Result<Self> {
        let lowered = xc.trim().to_ascii_lowercase();
        let (x, c) = match lowered.as_str() {
            "lda" | "svwn" => ("lda", "vwn"),
            other => other.split_once(',').unwrap_or((other, "")),
        };

        let exchange = match x.trim() {
            "" => None,
            "lda" | "slater" | "s" => Some(Exchange::Slater),
            _ => return Err(PbcError::UnknownFunctional(xc.to_string())),
        };
        let correlation = match c.trim() {
            "" => None,
            "vwn" | "vwn5" => Some(Correlation::Vwn5),
            _ => return Err(PbcError::UnknownFunctional(xc.to_string())),
        };

        Ok(XcFunctional {
            exchange,
            correlation,
        })
    }

    /// Fraction of exact exchange; zero for every local functional.
    pub fn exact_exchange(&self) -> f64 {
        0.0
    }

    /// Energy density per volume and potential at one density value.
    pub fn eval(&self, rho: f64) -> (f64, f64) {
        let mut e = 0.0;
        let mut v = 0.0;
        if self.exchange.is_some() {
            let (ex, vx) = slater_exchange(rho);
            e += ex;
            v += vx;
        }
        if self.correlation.is_some() {
            let (ec, vc) = vwn5_correlation(rho);
            e += ec;
            v += vc;
        }
        (e, v)
    }
}

/// `e_x = c_x rho^(4/3)`, `v_x = (4/3) c_x rho^(1/3)`, `c_x = -(3/4)(3/pi)^(1/3)`.
pub(crate) fn slater_exchange(rho: f64) -> (f64, f64) {
    if rho <= 0.0 {
        return (0.0, 0.0);
    }
    let cx = -0.75 * (3.0 / PI).cbrt();
    let rho13 = rho.cbrt();
    (cx * rho * rho13, 4.0 / 3.0 * cx * rho13)
}

/// Paramagnetic VWN5 correlation; returns `rho eps_c` and `v_c`.
pub(crate) fn vwn5_correlation(rho: f64) -> (f64, f64) {
    const A: f64 = 0.031_090_7;
    const X0: f64 = -0.104_98;
    const B: f64 = 3.727_44;
    const C: f64 = 12.935_2;

    if rho <= 1e-14 {
        return (0.0, 0.0);
    }

    let rs = (3.0 / (4.0 * PI * rho)).cbrt();
    let x = rs.sqrt();
    let q = (4.0 * C - B * B).sqrt();
    let big_x = |t: f64| t * t + B * t + C;
    let xx = big_x(x);
    let xx0 = big_x(X0);
    let atan_term = (q / (2.0 * x + B)).atan();
    let denom = (2.0 * x + B).powi(2) + q * q;

    let eps = A
        * ((x * x / xx).ln() + 2.0 * B / q * atan_term
            - B * X0 / xx0
                * (((x - X0).powi(2) / xx).ln() + 2.0 * (B + 2.0 * X0) / q * atan_term));

    let deps_dx = A
        * (2.0 / x - (2.0 * x + B) / xx - 4.0 * B / denom
            - B * X0 / xx0 * (2.0 / (x - X0) - (2.0 * x + B) / xx - 4.0 * (B + 2.0 * X0) / denom));

    (rho * eps, eps - x / 6.0 * deps_dx)
}

/// AO values on the cell grid with the uniform quadrature weight `V / N`.
#[derive(Debug, Clone)]
pub struct XcGrid {
    ao: DMatrix<f64>,
    weight: f64,
}

impl XcGrid {
    pub fn new(cell: &Cell, engine: &dyn IntegralEngine, kpt: &Vector3<f64>) -> Result<Self> {
        let coords = cell.grid_coords();
        let ao = engine.ao_values(cell, kpt, &coords)?;
        Ok(XcGrid {
            ao,
            weight: cell.volume() / coords.len() as f64,
        })
    }

    /// Electron density on every grid point for a symmetric density matrix.
    pub fn density(&self, dm: &DMatrix<f64>) -> DVector<f64> {
        let tmp = &self.ao * dm;
        DVector::from_iterator(
            self.ao.nrows(),
            tmp.row_iter()
                .zip(self.ao.row_iter())
                .map(|(t, a)| t.dot(&a)),
        )
    }

    /// Exchange-correlation energy and potential matrix.
    pub fn eval(&self, functional: &XcFunctional, dm: &DMatrix<f64>) -> (f64, DMatrix<f64>) {
        let rho = self.density(dm);
        let values: Vec<(f64, f64)> = rho.as_slice().par_iter().map(|&r| functional.eval(r)).collect();

        let exc = self.weight * values.iter().map(|(e, _)| e).sum::<f64>();

        let mut weighted = self.ao.clone();
        for (mut row, (_, v)) in weighted.row_iter_mut().zip(&values) {
            row *= self.weight * v;
        }
        let vxc = self.ao.transpose() * weighted;
        (exc, vxc)
    }
}
