//! Command-line argument parsing for periodic calculations

use clap::Parser;

/// Periodic HF/DFT and MP2 with YAML configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    pub config_file: String,

    /// Override output file: (default stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Override verbosity (0 errors only, 4 info, 5+ debug, 7+ trace)
    #[arg(short, long)]
    pub verbose: Option<i32>,

    /// Override density fitting: "df", "mix_df", anything else FFT
    #[arg(long)]
    pub df: Option<String>,

    /// Override maximum SCF cycles
    #[arg(long)]
    pub max_cycle: Option<usize>,

    /// Override DIIS subspace size
    #[arg(long)]
    pub diis_subspace_size: Option<usize>,

    /// Override convergence threshold
    #[arg(long)]
    pub convergence_threshold: Option<f64>,

    /// Run MP2 after the mean-field calculation
    #[arg(long)]
    pub mp2: bool,
}
