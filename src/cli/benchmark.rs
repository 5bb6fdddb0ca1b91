
use anyhow::bail;
use clap::Args;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::core::{check_optional_filename, check_required_filename, AFTER_HELP, FULL_VERSION};
use crate::data_types::resolution::Resolution;

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct BenchmarkSettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    hlabench_version: String,

    /// Curated gold standard dataset (JSON, output of the gold-standard sub-command)
    #[clap(required = true)]
    #[clap(short = 'g')]
    #[clap(long = "gold-standard")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub gold_standard_fn: PathBuf,

    /// Sample universe file, one sample id per line
    #[clap(required = true)]
    #[clap(short = 's')]
    #[clap(long = "samples")]
    #[clap(value_name = "TXT")]
    #[clap(help_heading = Some("Input/Output"))]
    pub samples_fn: PathBuf,

    /// P-group nomenclature table (IMGT/HLA hla_nom_p.txt layout)
    #[clap(required = true)]
    #[clap(short = 'p')]
    #[clap(long = "p-group-table")]
    #[clap(value_name = "TXT")]
    #[clap(help_heading = Some("Input/Output"))]
    pub p_group_fn: PathBuf,

    /// Pseudosequence group table (TSV: P-group, pseudosequence group)
    #[clap(required = true)]
    #[clap(short = 'e')]
    #[clap(long = "e-group-table")]
    #[clap(value_name = "TSV")]
    #[clap(help_heading = Some("Input/Output"))]
    pub e_group_fn: PathBuf,

    /// Folder with HLA typing results from Kourami
    #[clap(long = "kourami")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Tool results"))]
    pub kourami_folder: Option<PathBuf>,

    /// Folder with HLA typing results from HLA*LA
    #[clap(long = "hla-la")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Tool results"))]
    pub hla_la_folder: Option<PathBuf>,

    /// Folder with HLA typing results from Optitype
    #[clap(long = "optitype")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Tool results"))]
    pub optitype_folder: Option<PathBuf>,

    /// Folder with HLA typing results from HISAT-genotype
    #[clap(long = "hisat-genotype")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Tool results"))]
    pub hisat_genotype_folder: Option<PathBuf>,

    /// The resolutions to evaluate each tool at
    #[clap(long = "resolution")]
    #[clap(value_name = "RESOLUTION")]
    #[clap(value_enum)]
    #[clap(default_values = ["1-field", "pseudosequence", "p-group", "2-field"])]
    #[clap(help_heading = Some("Compare parameters"))]
    pub resolutions: Vec<Resolution>,

    /// Disables the per-sample audit output
    #[clap(long = "disable-audit")]
    #[clap(help_heading = Some("Compare parameters"))]
    pub disable_audit: bool,

    /// Output directory containing the report JSON and summary table
    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-dir")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_folder: PathBuf,

    /// Optional output debug folder
    #[clap(long = "output-debug")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub debug_folder: Option<PathBuf>,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8
}

pub fn check_benchmark_settings(mut settings: BenchmarkSettings) -> anyhow::Result<BenchmarkSettings> {
    // hard code the version in
    settings.hlabench_version = FULL_VERSION.clone();
    info!("Hlabench version: {:?}", &settings.hlabench_version);
    info!("Sub-command: benchmark");

    // check for all the required input files
    check_required_filename(&settings.gold_standard_fn, "Gold standard")?;
    check_required_filename(&settings.samples_fn, "Sample universe")?;
    check_required_filename(&settings.p_group_fn, "P-group table")?;
    check_required_filename(&settings.e_group_fn, "Pseudosequence table")?;
    check_optional_filename(settings.kourami_folder.as_deref(), "Kourami results")?;
    check_optional_filename(settings.hla_la_folder.as_deref(), "HLA*LA results")?;
    check_optional_filename(settings.optitype_folder.as_deref(), "Optitype results")?;
    check_optional_filename(settings.hisat_genotype_folder.as_deref(), "HISAT-genotype results")?;

    // at least one tool has to be benchmarked
    if settings.kourami_folder.is_none() && settings.hla_la_folder.is_none() &&
        settings.optitype_folder.is_none() && settings.hisat_genotype_folder.is_none() {
        bail!("At least one tool result folder must be provided");
    }

    // dump stuff to the logger
    info!("Inputs:");
    info!("\tGold standard: {:?}", &settings.gold_standard_fn);
    info!("\tSample universe: {:?}", &settings.samples_fn);
    info!("\tP-group table: {:?}", &settings.p_group_fn);
    info!("\tPseudosequence table: {:?}", &settings.e_group_fn);
    info!("Tool results:");
    for (label, folder) in [
        ("Kourami", settings.kourami_folder.as_ref()),
        ("HLA*LA", settings.hla_la_folder.as_ref()),
        ("Optitype", settings.optitype_folder.as_ref()),
        ("HISAT-genotype", settings.hisat_genotype_folder.as_ref())
    ] {
        match folder {
            Some(path) => info!("\t{label}: {path:?}"),
            None => info!("\t{label}: None")
        };
    }

    // compare parameters
    if settings.resolutions.is_empty() {
        bail!("At least one resolution must be provided");
    }
    settings.resolutions.sort();
    settings.resolutions.dedup();
    info!("Compare parameters:");
    info!("\tResolutions: {:?}", settings.resolutions.iter().map(|r| r.to_string()).collect::<Vec<String>>());
    info!("\tAudit output: {}", if settings.disable_audit { "DISABLED" } else { "ENABLED" });

    // outputs
    info!("Outputs:");
    info!("\tOutput folder: {:?}", &settings.output_folder);
    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        info!("\tDebug folder: {debug_folder:?}");
    }

    Ok(settings)
}
