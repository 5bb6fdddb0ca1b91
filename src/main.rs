
use indexmap::IndexMap;
use log::{error, info, LevelFilter};
use serde::Serialize;
use std::time::Instant;

use hlabench::benchmark::{run_benchmark, BenchmarkConfigBuilder};
use hlabench::cli::benchmark::{check_benchmark_settings, BenchmarkSettings};
use hlabench::cli::core::{get_cli, Commands, FULL_VERSION};
use hlabench::cli::gold_standard::{check_gold_standard_settings, GoldStandardSettings};
use hlabench::data_types::genotypes::{GoldStandard, SamplePredictions};
use hlabench::data_types::score_metrics::MetricsBucket;
use hlabench::parsing::gold_standard::{load_gold_standard, load_sample_universe};
use hlabench::parsing::lookup_tables::load_lookup_tables;
use hlabench::parsing::tool_results::{load_tool_results, GenotypingTool};
use hlabench::util::json_io::{load_json, save_json};
use hlabench::writers::summary::write_summary;

/// Small provenance blob saved next to the debug outputs
#[derive(Serialize)]
struct RunMetadata {
    version: String,
    created: String
}

impl RunMetadata {
    fn now() -> Self {
        Self {
            version: FULL_VERSION.clone(),
            created: chrono::Utc::now().to_rfc3339()
        }
    }
}

fn run_gold_standard_command(settings: GoldStandardSettings) {
    // start the timer
    let start_time = Instant::now();

    // set up logging before we check the other settings
    let filter_level: LevelFilter = match settings.verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    };
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();

    let settings = match check_gold_standard_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    // the universe comes first, it decides which rows we curate
    let sample_universe = match load_sample_universe(&settings.samples_fn) {
        Ok(su) => su,
        Err(e) => {
            error!("Error while loading sample universe: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };
    info!("Sample universe contains {} samples", sample_universe.len());

    // curation is all-or-nothing; an untyped slot in the universe kills the run here
    let gold_standard = match load_gold_standard(&settings.input_fn, &sample_universe) {
        Ok(gs) => gs,
        Err(e) => {
            error!("Error while curating gold standard: {e:#}");
            std::process::exit(exitcode::DATAERR);
        }
    };

    if let Some(parent) = settings.output_fn.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                error!("Error while creating output folder: {e}");
                std::process::exit(exitcode::IOERR);
            }
        }
    }

    info!("Saving gold standard to {:?}...", settings.output_fn);
    if let Err(e) = save_json(&gold_standard, &settings.output_fn, "gold standard") {
        error!("Error while saving gold standard: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    info!("Curation completed in {} seconds.", start_time.elapsed().as_secs_f64());
}

fn run_benchmark_command(settings: BenchmarkSettings) {
    // start the timer
    let start_time = Instant::now();

    // set up logging before we check the other settings
    let filter_level: LevelFilter = match settings.verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    };
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();

    let settings = match check_benchmark_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    // create the primary output folder
    info!("Creating output folder at {:?}...", settings.output_folder);
    match std::fs::create_dir_all(&settings.output_folder) {
        Ok(()) => {},
        Err(e) => {
            error!("Error while creating output folder: {e}");
            std::process::exit(exitcode::IOERR);
        }
    }

    // create a debug folder if specified
    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        info!("Creating debug folder at {debug_folder:?}...");
        match std::fs::create_dir_all(debug_folder) {
            Ok(()) => {},
            Err(e) => {
                error!("Error while creating debug folder: {e}");
                std::process::exit(exitcode::IOERR);
            }
        }

        // save the CLI options
        let cli_json = debug_folder.join("cli_settings.json");
        info!("Saving CLI options to {cli_json:?}...");
        if let Err(e) = save_json(&settings, &cli_json, "CLI options") {
            error!("Error while saving CLI options: {e}");
            std::process::exit(exitcode::IOERR);
        }

        // save the run provenance alongside them
        let metadata_json = debug_folder.join("run_metadata.json");
        if let Err(e) = save_json(&RunMetadata::now(), &metadata_json, "run metadata") {
            error!("Error while saving run metadata: {e}");
            std::process::exit(exitcode::IOERR);
        }
    }

    // load the shared lookup tables
    info!("Pre-loading group lookup tables into memory...");
    let lookup_tables = match load_lookup_tables(&settings.p_group_fn, &settings.e_group_fn) {
        Ok(lt) => lt,
        Err(e) => {
            error!("Error while loading lookup tables: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };

    // load the sample universe and truth data
    let sample_universe = match load_sample_universe(&settings.samples_fn) {
        Ok(su) => su,
        Err(e) => {
            error!("Error while loading sample universe: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };
    info!("Sample universe contains {} samples", sample_universe.len());

    let gold_standard: GoldStandard = match load_json(&settings.gold_standard_fn, "gold standard") {
        Ok(gs) => gs,
        Err(e) => {
            error!("Error while loading gold standard: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };

    // absent truth data is a configuration error; reject before parsing tool outputs
    if let Err(e) = gold_standard.ensure_complete(&sample_universe) {
        error!("Gold standard does not cover the sample universe: {e:#}");
        std::process::exit(exitcode::DATAERR);
    }

    // load each provided tool in a fixed report order
    let tool_folders = [
        (GenotypingTool::Kourami, settings.kourami_folder.as_ref()),
        (GenotypingTool::HlaLa, settings.hla_la_folder.as_ref()),
        (GenotypingTool::Optitype, settings.optitype_folder.as_ref()),
        (GenotypingTool::HisatGenotype, settings.hisat_genotype_folder.as_ref())
    ];
    let mut predictions: IndexMap<String, SamplePredictions> = Default::default();
    for (tool, opt_folder) in tool_folders {
        if let Some(folder) = opt_folder {
            info!("Loading {tool} results...");
            match load_tool_results(tool, folder) {
                Ok(tp) => {
                    predictions.insert(tool.to_string(), tp);
                },
                Err(e) => {
                    error!("Error while loading {tool} results: {e:#}");
                    std::process::exit(exitcode::IOERR);
                }
            };
        }
    }

    // build our benchmark configuration
    let benchmark_config = match BenchmarkConfigBuilder::default()
        .resolutions(settings.resolutions.clone())
        .keep_audit(!settings.disable_audit)
        .build() {
        Ok(bc) => bc,
        Err(e) => {
            error!("Error while building benchmark config: {e:?}");
            std::process::exit(exitcode::SOFTWARE);
        }
    };

    // run the validation across tools and resolutions
    info!("Scoring tool predictions...");
    let results = match run_benchmark(&predictions, &gold_standard, &sample_universe, &lookup_tables, &benchmark_config) {
        Ok(r) => r,
        Err(e) => {
            error!("Error while scoring predictions: {e:#}");
            std::process::exit(exitcode::DATAERR);
        }
    };

    // dump the headline numbers to the logger
    for (resolution, tools) in &results.metrics {
        for (tool, buckets) in tools {
            let total = &buckets[&MetricsBucket::Total];
            info!("{tool} @ {resolution}: call rate {:.2}%, typing accuracy {:.2}%", total.call_rate, total.typing_accuracy);
        }
    }

    // now write things
    let metrics_fn = settings.output_folder.join("typing_results.json");
    info!("Saving typing results to {metrics_fn:?}...");
    if let Err(e) = save_json(&results.metrics, &metrics_fn, "typing results") {
        error!("Error while saving typing results: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    if !settings.disable_audit {
        let audit_fn = settings.output_folder.join("typing_results_full.json");
        info!("Saving audit detail to {audit_fn:?}...");
        if let Err(e) = save_json(&results.audit, &audit_fn, "audit detail") {
            error!("Error while saving audit detail: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    }

    let summary_fn = settings.output_folder.join("summary.tsv");
    info!("Saving output summary to {summary_fn:?}...");
    if let Err(e) = write_summary(&results, &summary_fn) {
        error!("Error while saving summary file: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    info!("Benchmark completed in {} seconds.", start_time.elapsed().as_secs_f64());
}

fn main() {
    let cli = get_cli();
    match cli.command {
        Commands::GoldStandard(settings) => {
            run_gold_standard_command(*settings);
        },
        Commands::Benchmark(settings) => {
            run_benchmark_command(*settings);
        }
    }

    info!("Process finished successfully.");
}
