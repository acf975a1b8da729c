//! Input/Output operations for periodic calculations
//!
//! This module handles logging setup.

mod output;

pub use output::setup_output;
