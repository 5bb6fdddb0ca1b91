
use serde::Serialize;
use std::fs::File;
use std::path::Path;

use crate::benchmark::BenchmarkResults;

/// Contains all the data written to each row of our summary file
#[derive(Serialize)]
struct SummaryRow {
    /// The tool that was benchmarked
    tool: String,
    /// The resolution the comparison ran at
    resolution: String,
    /// Locus or derived class bucket
    bucket: String,
    /// Total haplotype calls made
    count: u64,
    /// Total correct haplotype calls
    score: u64,
    /// Percentage of expected calls that were made
    call_rate: f64,
    /// Percentage of expected calls that were made and correct
    typing_accuracy: f64
}

/// Writes the flat summary table, one row per tool, resolution and bucket.
/// Rows come out in a fixed order: resolution, then tool load order, then bucket.
/// # Arguments
/// * `results` - the finished benchmark run
/// * `filename` - the filename for the output; ".csv" switches the delimiter to a comma
pub fn write_summary(results: &BenchmarkResults, filename: &Path) -> csv::Result<()> {
    // modify the delimiter to "," if it ends with .csv
    let is_csv: bool = filename.extension().unwrap_or_default() == "csv";
    let delimiter: u8 = if is_csv { b',' } else { b'\t' };
    let mut csv_writer: csv::Writer<File> = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(filename)?;

    for (resolution, tools) in &results.metrics {
        for (tool, buckets) in tools {
            for (bucket, metrics) in buckets {
                csv_writer.serialize(SummaryRow {
                    tool: tool.clone(),
                    resolution: resolution.to_string(),
                    bucket: bucket.to_string(),
                    count: metrics.count,
                    score: metrics.score,
                    call_rate: metrics.call_rate,
                    typing_accuracy: metrics.typing_accuracy
                })?;
            }
        }
    }

    // save everything
    csv_writer.flush()?;
    Ok(())
}
