//! Configuration management for periodic calculations
//!
//! YAML sections mirror the calculation steps: the structure and cell
//! options, the mean-field run, SCF controls and the optional MP2 step.
//! Missing values are filled in by `with_defaults`; command-line arguments
//! override the file.

mod args;

pub use args::Args;

use color_eyre::eyre::{bail, Result};
use pbc_mp::kpts::KMesh;
use pbc_mp::scf_impl::{self, ExxDiv, Method};
use pbc_mp::{AtomicStructure, CellParams, DfScheme, RunConfig};
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub structure: AtomicStructure,
    #[serde(default)]
    pub cell: CellParams,
    #[serde(default)]
    pub scf_params: ScfParams,
    #[serde(default)]
    pub run: RunParams,
    pub mp2: Option<Mp2Params>,
    /// YAML file with the tabulated integrals of this cell.
    pub integrals: String,
    pub verbose: Option<i32>,
}

/// SCF-specific parameters
#[derive(Debug, Deserialize, Serialize)]
pub struct ScfParams {
    pub max_cycle: Option<usize>,
    pub diis_subspace_size: Option<usize>,
    pub convergence_threshold: Option<f64>,
}

impl Default for ScfParams {
    fn default() -> Self {
        let defaults = scf_impl::ScfParams::default();
        ScfParams {
            max_cycle: Some(defaults.max_cycle),
            diis_subspace_size: Some(defaults.diis_space),
            convergence_threshold: Some(defaults.conv_tol),
        }
    }
}

impl ScfParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.max_cycle.is_none() {
            self.max_cycle = defaults.max_cycle;
        }
        if self.diis_subspace_size.is_none() {
            self.diis_subspace_size = defaults.diis_subspace_size;
        }
        if self.convergence_threshold.is_none() {
            self.convergence_threshold = defaults.convergence_threshold;
        }
        self
    }
}

/// Mean-field run parameters
#[derive(Debug, Deserialize, Serialize)]
pub struct RunParams {
    /// "hf" or "dft"
    pub method: Option<String>,
    pub xc: Option<String>,
    /// k-point mesh; absent for Gamma-point runs
    pub kmesh: Option<KMesh>,
    /// Density fitting name: "df", "mix_df" or anything else for FFT
    pub df: Option<String>,
    pub exxdiv: Option<ExxDiv>,
}

impl Default for RunParams {
    fn default() -> Self {
        RunParams {
            method: Some("hf".to_string()),
            xc: Some("lda,vwn".to_string()),
            kmesh: None,
            df: None,
            exxdiv: Some(ExxDiv::None),
        }
    }
}

impl RunParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.method.is_none() {
            self.method = defaults.method;
        }
        if self.xc.is_none() {
            self.xc = defaults.xc;
        }
        if self.exxdiv.is_none() {
            self.exxdiv = defaults.exxdiv;
        }
        self
    }
}

/// MP2 calculation parameters
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Mp2Params {
    pub enabled: Option<bool>,
}

impl Default for Mp2Params {
    fn default() -> Self {
        Mp2Params {
            enabled: Some(false),
        }
    }
}

impl Mp2Params {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        if self.enabled.is_none() {
            self.enabled = Self::default().enabled;
        }
        self
    }
}

impl Config {
    /// Apply defaults to all configuration sections
    pub fn with_defaults(mut self) -> Self {
        self.scf_params = self.scf_params.with_defaults();
        self.run = self.run.with_defaults();
        if let Some(mp2_params) = self.mp2.take() {
            self.mp2 = Some(mp2_params.with_defaults());
        }
        if self.verbose.is_none() {
            self.verbose = Some(4);
        }
        self
    }

    /// Verbosity after command-line overrides
    pub fn verbosity(&self, args: &Args) -> i32 {
        args.verbose.or(self.verbose).unwrap_or(4)
    }

    /// Check if MP2 calculation is enabled
    pub fn is_mp2_enabled(&self, args: &Args) -> bool {
        args.mp2 || self.mp2.as_ref().and_then(|m| m.enabled).unwrap_or(false)
    }

    /// Assemble the mean-field run, command-line arguments taking precedence
    pub fn run_config(&self, args: &Args) -> Result<RunConfig> {
        let method = match self.run.method.as_deref().unwrap_or("hf") {
            "hf" | "HF" => Method::Hf,
            "dft" | "DFT" | "ks" => Method::Dft {
                xc: self.run.xc.clone().unwrap_or_else(|| "lda,vwn".to_string()),
            },
            other => bail!("Unknown mean-field method: {}", other),
        };

        let defaults = scf_impl::ScfParams::default();
        let scf = scf_impl::ScfParams {
            max_cycle: args
                .max_cycle
                .or(self.scf_params.max_cycle)
                .unwrap_or(defaults.max_cycle),
            conv_tol: args
                .convergence_threshold
                .or(self.scf_params.convergence_threshold)
                .unwrap_or(defaults.conv_tol),
            diis_space: args
                .diis_subspace_size
                .or(self.scf_params.diis_subspace_size)
                .unwrap_or(defaults.diis_space),
        };

        let df_name = args.df.as_deref().or(self.run.df.as_deref());
        Ok(RunConfig {
            method,
            kmesh: self.run.kmesh.clone(),
            df: DfScheme::from_name(df_name),
            exxdiv: self.run.exxdiv.unwrap_or_default(),
            verbose: self.verbosity(args),
            scf,
        })
    }
}
