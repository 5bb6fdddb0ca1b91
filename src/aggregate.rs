
use anyhow::{ensure, Context};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::data_types::alleles::{Locus, HLA_LOCI};
use crate::data_types::score_metrics::{MetricsBucket, ScoreMetrics};

/// One scored sample/locus outcome for a tool, the unit the aggregation folds over
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScoreRecord {
    /// The locus that was scored
    pub locus: Locus,
    /// The sample that was scored
    pub sample: String,
    /// Number of haplotype calls the tool made here (0, 1 or 2)
    pub calls: u64,
    /// Number of those calls that matched the truth (0, 1 or 2)
    pub hits: u64
}

/// Final per-bucket numbers as they appear in the report
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BucketMetrics {
    /// Total haplotype calls made
    pub count: u64,
    /// Total correct haplotype calls
    pub score: u64,
    /// 100 * count / (multiplier * n_samples * 2)
    pub call_rate: f64,
    /// 100 * score / (multiplier * n_samples * 2)
    pub typing_accuracy: f64
}

/// Folds one tool's score records into per-locus counters, derives the HLA-I, HLA-II
/// and Total buckets by summation (so Total always equals HLA-I + HLA-II), and computes
/// the percentage metrics. The output map is ordered, so identical input always
/// serializes identically.
/// # Arguments
/// * `score_records` - every sample/locus outcome for the tool; each sample in the
///   universe must appear exactly once per locus, even when it produced zero calls
/// * `n_samples` - size of the sample universe
/// # Errors
/// * if the records do not cover the universe exactly once per locus
pub fn aggregate_scores(score_records: &[ScoreRecord], n_samples: u64) -> anyhow::Result<BTreeMap<MetricsBucket, BucketMetrics>> {
    ensure!(n_samples > 0, "Sample universe is empty");

    // per-locus accumulation with a coverage check
    let mut locus_metrics: BTreeMap<Locus, ScoreMetrics> = HLA_LOCI.into_iter()
        .map(|locus| (locus, ScoreMetrics::default()))
        .collect();
    let mut seen: BTreeSet<(Locus, &str)> = Default::default();
    for record in score_records {
        ensure!(
            seen.insert((record.locus, record.sample.as_str())),
            "Sample {} was scored twice at locus {}", record.sample, record.locus
        );
        let entry = locus_metrics.get_mut(&record.locus)
            .with_context(|| format!("Unexpected locus in score records: {}", record.locus))?;
        *entry += ScoreMetrics::new(record.calls, record.hits);
    }
    ensure!(
        seen.len() as u64 == n_samples * HLA_LOCI.len() as u64,
        "Expected {} score records covering the sample universe, found {}",
        n_samples * HLA_LOCI.len() as u64, seen.len()
    );

    // class and total buckets are derived from the locus counters, never
    // accumulated independently
    let mut buckets: BTreeMap<MetricsBucket, ScoreMetrics> = Default::default();
    for (locus, metrics) in locus_metrics {
        buckets.insert(MetricsBucket::Locus(locus), metrics);
        *buckets.entry(MetricsBucket::class_of(locus)).or_default() += metrics;
        *buckets.entry(MetricsBucket::Total).or_default() += metrics;
    }

    buckets.into_iter()
        .map(|(bucket, metrics)| {
            let possible = bucket.possible_calls(n_samples);
            let call_rate = metrics.call_rate(possible)
                .with_context(|| format!("No possible calls for bucket {bucket}"))?;
            let typing_accuracy = metrics.typing_accuracy(possible)
                .with_context(|| format!("No possible calls for bucket {bucket}"))?;
            Ok((bucket, BucketMetrics {
                count: metrics.count,
                score: metrics.score,
                call_rate,
                typing_accuracy
            }))
        })
        .collect()
}
