
use clap::Args;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::core::{check_required_filename, AFTER_HELP, FULL_VERSION};

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct GoldStandardSettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    hlabench_version: String,

    /// Raw 1000 Genomes HLA diversity table (space-separated)
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "input")]
    #[clap(value_name = "TXT")]
    #[clap(help_heading = Some("Input/Output"))]
    pub input_fn: PathBuf,

    /// Sample universe file, one sample id per line
    #[clap(required = true)]
    #[clap(short = 's')]
    #[clap(long = "samples")]
    #[clap(value_name = "TXT")]
    #[clap(help_heading = Some("Input/Output"))]
    pub samples_fn: PathBuf,

    /// Path to write the curated gold-standard dataset (JSON)
    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_fn: PathBuf,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8
}

pub fn check_gold_standard_settings(mut settings: GoldStandardSettings) -> anyhow::Result<GoldStandardSettings> {
    // hard code the version in
    settings.hlabench_version = FULL_VERSION.clone();
    info!("Hlabench version: {:?}", &settings.hlabench_version);
    info!("Sub-command: gold-standard");

    // check for all the required input files
    check_required_filename(&settings.input_fn, "Diversity table")?;
    check_required_filename(&settings.samples_fn, "Sample universe")?;

    // dump stuff to the logger
    info!("Inputs:");
    info!("\tDiversity table: {:?}", &settings.input_fn);
    info!("\tSample universe: {:?}", &settings.samples_fn);
    info!("Outputs:");
    info!("\tGold standard: {:?}", &settings.output_fn);

    Ok(settings)
}
