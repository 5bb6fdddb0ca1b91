
use anyhow::Context;
use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::data_types::alleles::{Allele, Locus};
use crate::data_types::genotypes::{PredictionRecord, SamplePredictions};

/// The genotyping tools whose output layouts we can parse.
/// Display strings match the tool keys used in the report JSON.
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum_macros::Display, strum_macros::EnumString)]
pub enum GenotypingTool {
    #[strum(serialize = "Kourami")]
    Kourami,
    #[strum(serialize = "HLA-LA")]
    HlaLa,
    #[strum(serialize = "Optitype")]
    Optitype,
    #[strum(serialize = "Hisatgenotype")]
    HisatGenotype
}

impl GenotypingTool {
    /// The filename suffix marking this tool's per-sample result file
    fn result_suffix(&self) -> &'static str {
        match self {
            GenotypingTool::Kourami |
            GenotypingTool::Optitype => "_result.tsv",
            GenotypingTool::HlaLa => "R1_bestguess_G.txt",
            GenotypingTool::HisatGenotype => "results.txt"
        }
    }
}

lazy_static! {
    /// Scanning form of the allele grammar for line-oriented tool outputs
    static ref ALLELE_SCAN_RE: Regex = Regex::new(r"(A|B|C|DRB1|DQB1)\*\d{1,3}(?::\d{1,3}){0,3}[A-Z]?").unwrap();
    /// HISAT-genotype ranked prediction lines; only the top two ranks are genotype calls
    static ref HISAT_RANKED_RE: Regex = Regex::new(r"^\t+(1|2) ranked ((A|B|C|DRB1|DQB1)\S*)").unwrap();
}

/// Loads one tool's full result directory into per-sample prediction records.
/// # Arguments
/// * `tool` - which output layout to expect
/// * `result_folder` - root folder the tool wrote its per-sample results under
/// # Errors
/// * if the directory walk or a result file read fails
pub fn load_tool_results(tool: GenotypingTool, result_folder: &Path) -> anyhow::Result<SamplePredictions> {
    let result_files = find_result_files(result_folder, tool.result_suffix())?;
    info!("Found {} {tool} result file(s) under {result_folder:?}", result_files.len());

    let mut predictions: SamplePredictions = Default::default();
    for filename in result_files {
        let sample = sample_id_for(&filename, result_folder, tool.result_suffix());
        let content = read_to_string(&filename)
            .with_context(|| format!("Error while reading {filename:?}:"))?;

        let raw_calls = match tool {
            GenotypingTool::Kourami => parse_kourami(&content),
            GenotypingTool::HlaLa => parse_hla_la(&content)
                .with_context(|| format!("Error while parsing {filename:?}:"))?,
            GenotypingTool::Optitype => parse_optitype(&content)
                .with_context(|| format!("Error while parsing {filename:?}:"))?,
            GenotypingTool::HisatGenotype => parse_hisat_genotype(&content)
        };
        if raw_calls.is_empty() {
            debug!("{tool} made no calls for sample {sample}");
        }

        let records = to_prediction_records(raw_calls);
        if predictions.insert(sample.clone(), records).is_some() {
            warn!("Multiple {tool} result files for sample {sample}, keeping the last one");
        }
    }

    Ok(predictions)
}

/// Walks a tool's output folder and collects its result files, sorted for determinism
fn find_result_files(result_folder: &Path, suffix: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut result_files: Vec<PathBuf> = vec![];
    for entry in WalkDir::new(result_folder) {
        let entry = entry.with_context(|| format!("Error while walking {result_folder:?}:"))?;
        if entry.file_type().is_file() && entry.file_name().to_string_lossy().ends_with(suffix) {
            result_files.push(entry.into_path());
        }
    }
    result_files.sort();
    Ok(result_files)
}

/// Derives the sample id from a result file location: the first directory component
/// under the search root when the tool nests per-sample folders, otherwise the
/// filename with the result suffix stripped.
fn sample_id_for(filename: &Path, result_folder: &Path, suffix: &str) -> String {
    if let Ok(relative) = filename.strip_prefix(result_folder) {
        if relative.components().count() > 1 {
            if let Some(first) = relative.components().next() {
                return first.as_os_str().to_string_lossy().into_owned();
            }
        }
    }
    filename.file_name()
        .map(|name| name.to_string_lossy().trim_end_matches(suffix).to_string())
        .unwrap_or_default()
}

fn read_to_string(filename: &Path) -> std::io::Result<String> {
    let mut content = String::new();
    File::open(filename)?.read_to_string(&mut content)?;
    Ok(content)
}

/// Kourami writes one prediction line per called allele; the first grammar match on
/// each line is the call. An empty file means the sample produced no typing.
fn parse_kourami(content: &str) -> Vec<String> {
    content.lines()
        .filter_map(|line| {
            ALLELE_SCAN_RE.find(line)
                .map(|matched| matched.as_str().to_string())
        })
        .collect()
}

/// HLA*LA writes a best-guess TSV with an `Allele` column; rows at loci outside the
/// benchmark set are skipped.
fn parse_hla_la(content: &str) -> anyhow::Result<Vec<String>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = csv_reader.headers()
        .context("Error while reading header row:")?
        .clone();
    let allele_column = headers.iter().position(|h| h == "Allele")
        .context("Missing Allele column in header")?;

    let mut calls: Vec<String> = vec![];
    for result in csv_reader.records() {
        let row = result?;
        let Some(value) = row.get(allele_column) else {
            continue;
        };
        if value.parse::<Allele>().is_ok() {
            calls.push(value.to_string());
        }
    }
    Ok(calls)
}

/// Optitype writes a single data row; columns 2-7 hold the class I calls, with empty
/// cells for loci it could not type.
fn parse_optitype(content: &str) -> anyhow::Result<Vec<String>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(content.as_bytes());

    let Some(result) = csv_reader.records().next() else {
        return Ok(vec![]);
    };
    let row = result.context("Error while reading the result row:")?;

    let calls = (1..7)
        .filter_map(|column| row.get(column))
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
        .collect();
    Ok(calls)
}

/// HISAT-genotype writes indented "N ranked <allele>" report lines; ranks 1 and 2 are
/// the genotype calls. A locus with a single ranked entry is reported homozygous
/// downstream via the duplication rule.
fn parse_hisat_genotype(content: &str) -> Vec<String> {
    content.lines()
        .filter_map(|line| {
            HISAT_RANKED_RE.captures(line)
                .map(|captures| captures[2].to_string())
        })
        .collect()
}

/// Groups raw calls by locus and applies the record construction rules (homozygous
/// duplication, sorting). Calls that do not parse are logged and excluded here; the
/// exclusion shows up in the call-rate denominator as a missing call.
fn to_prediction_records(raw_calls: Vec<String>) -> BTreeMap<Locus, PredictionRecord> {
    let mut by_locus: BTreeMap<Locus, Vec<String>> = Default::default();
    for raw in raw_calls {
        match raw.parse::<Allele>() {
            Ok(allele) => {
                // store the two-field form when available; deeper fields and markers
                // are noise at every comparison resolution
                let call = allele.two_field().unwrap_or_else(|_| raw.clone());
                by_locus.entry(allele.locus()).or_default().push(call);
            },
            Err(e) => {
                warn!("Excluding unparseable tool call: {e}");
            }
        };
    }

    by_locus.into_iter()
        .map(|(locus, calls)| (locus, PredictionRecord::new(calls)))
        .collect()
}
