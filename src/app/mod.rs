mod report;

use self::report::{report_mean_field, report_mp2};
use crate::config::{Args, Config};
use crate::io::setup_output;
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use pbc_mp::{
    build_cell, run_mean_field, PeriodicMp2, PeriodicRmp2, RoothaanDriver, TabulatedIntegrals,
};
use std::fs;
use std::sync::Arc;
use tracing::info;

pub struct PbcApplication {
    args: Args,
    config: Config,
}

impl PbcApplication {
    pub fn from_cli() -> Result<Self> {
        let args = Args::parse();
        let config = load_config(&args)?;
        Ok(Self { args, config })
    }

    pub fn run(self) -> Result<()> {
        let verbose = self.config.verbosity(&self.args);
        setup_output(self.args.output.as_ref(), verbose);
        info!("Configuration loaded:\n{:?}", self.config);

        let cell = Arc::new(
            build_cell(&self.config.structure, &self.config.cell)
                .wrap_err("Failed to build the periodic cell")?,
        );
        let engine = TabulatedIntegrals::from_yaml_file(&self.config.integrals)?;
        let run_config = self.config.run_config(&self.args)?;

        let run = run_mean_field(cell, &run_config, &engine, &mut RoothaanDriver)
            .wrap_err("Mean-field calculation failed")?;
        report_mean_field(&run);

        if self.config.is_mp2_enabled(&self.args) {
            info!("\nStarting periodic MP2...");
            let e_corr = PeriodicRmp2::new(&run.mf)
                .kernel()
                .wrap_err("MP2 calculation failed")?;
            report_mp2(&run.mf, e_corr);
        }

        Ok(())
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let config_content = fs::read_to_string(&args.config_file)
        .wrap_err_with(|| format!("Unable to read configuration file: {}", args.config_file))?;

    let config = serde_yml::from_str::<Config>(&config_content)
        .wrap_err("Failed to parse configuration file")?
        .with_defaults();

    Ok(config)
}
