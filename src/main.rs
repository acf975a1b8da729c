//! Periodic mean-field and MP2 command-line interface
//!
//! Reads a YAML configuration, builds the cell, runs the mean-field
//! calculation with the configured density fitting and optionally MP2.

mod app;
mod config;
mod io;

use app::PbcApplication;
use color_eyre::eyre::Result;

fn main() -> Result<()> {
    color_eyre::install()?;
    PbcApplication::from_cli()?.run()
}
