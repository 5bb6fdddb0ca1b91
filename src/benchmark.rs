
use anyhow::Context;
use derive_builder::Builder;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::aggregate::{aggregate_scores, BucketMetrics, ScoreRecord};
use crate::data_types::alleles::{Locus, HLA_LOCI};
use crate::data_types::genotypes::{GoldStandard, PredictionRecord, SamplePredictions};
use crate::data_types::resolution::{Resolution, ALL_RESOLUTIONS};
use crate::data_types::score_metrics::MetricsBucket;
use crate::normalize::LookupTables;
use crate::scoring::score_genotype;

/// Controls which comparisons the benchmark runs
#[derive(Builder, Clone, Debug)]
#[builder(default)]
pub struct BenchmarkConfig {
    /// the resolutions each tool is evaluated at
    resolutions: Vec<Resolution>,
    /// if true, keeps the per-sample reference/prediction detail for the audit output
    keep_audit: bool
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            resolutions: ALL_RESOLUTIONS.to_vec(),
            keep_audit: true
        }
    }
}

/// Per-sample detail kept for auditing a single scored genotype
#[derive(Clone, Debug, Serialize)]
pub struct AuditEntry {
    /// The truth allele sets per haplotype slot, normalized
    pub reference: [Vec<String>; 2],
    /// The normalized call per prediction slot; empty when no call was made
    pub prediction: Vec<Vec<String>>,
    /// Number of haplotype slots that did not match
    pub miscalls: u64
}

/// Aggregated metrics: resolution -> tool -> bucket -> numbers.
/// Tools stay in their load order; everything else is sorted.
pub type ResolutionMetrics = BTreeMap<Resolution, IndexMap<String, BTreeMap<MetricsBucket, BucketMetrics>>>;

/// Audit detail: resolution -> tool -> locus -> sample -> entry
pub type ResolutionAudit = BTreeMap<Resolution, IndexMap<String, BTreeMap<Locus, BTreeMap<String, AuditEntry>>>>;

/// Everything one benchmark run produces
#[derive(Clone, Debug, Default, Serialize)]
pub struct BenchmarkResults {
    /// The aggregated metrics, the primary report
    pub metrics: ResolutionMetrics,
    /// The per-sample audit detail; empty maps when auditing is disabled
    pub audit: ResolutionAudit,
    /// Allele strings that failed resolution conversion across the whole run
    pub conversion_failures: u64
}

/// Entry point for the validation run: scores every tool at every configured resolution
/// against the gold standard and aggregates the outcomes.
/// # Arguments
/// * `predictions` - per-tool parsed predictions, in the tool order the report should use
/// * `gold_standard` - the curated truth data, two-field resolution
/// * `sample_universe` - the samples every tool is judged on, including its no-calls
/// * `tables` - the shared group lookup tables
/// * `config` - resolutions and audit toggle
/// # Errors
/// * if the gold standard does not fully cover the sample universe
/// * if aggregation invariants are violated (duplicate sample/locus records)
pub fn run_benchmark(
    predictions: &IndexMap<String, SamplePredictions>,
    gold_standard: &GoldStandard,
    sample_universe: &[String],
    tables: &LookupTables,
    config: &BenchmarkConfig
) -> anyhow::Result<BenchmarkResults> {
    // absent truth data is a configuration error, reject before any scoring
    gold_standard.ensure_complete(sample_universe)
        .context("Gold standard does not cover the sample universe:")?;

    let n_samples = sample_universe.len() as u64;
    let mut results = BenchmarkResults::default();

    for &resolution in &config.resolutions {
        let mut tool_metrics: IndexMap<String, BTreeMap<MetricsBucket, BucketMetrics>> = Default::default();
        let mut tool_audit: IndexMap<String, BTreeMap<Locus, BTreeMap<String, AuditEntry>>> = Default::default();

        for (tool, tool_predictions) in predictions {
            debug!("Scoring {tool} at resolution {resolution}...");
            let mut score_records: Vec<ScoreRecord> = Vec::with_capacity(sample_universe.len() * HLA_LOCI.len());
            let mut audit: BTreeMap<Locus, BTreeMap<String, AuditEntry>> = Default::default();

            for locus in HLA_LOCI {
                for sample in sample_universe {
                    // a sample or locus the tool never reported is a plain no-call
                    let no_call = PredictionRecord::no_call();
                    let prediction = tool_predictions.get(sample)
                        .and_then(|loci| loci.get(&locus))
                        .unwrap_or(&no_call);

                    // ensure_complete above guarantees this lookup succeeds
                    let reference = gold_standard.genotype(sample, locus)
                        .with_context(|| format!("Missing gold standard for {sample}/{locus}"))?;

                    let score = score_genotype(reference, prediction, resolution, tables);
                    results.conversion_failures += score.conversion_failures;
                    score_records.push(ScoreRecord {
                        locus,
                        sample: sample.clone(),
                        calls: prediction.call_count(),
                        hits: score.hits
                    });

                    if config.keep_audit {
                        audit.entry(locus).or_default().insert(sample.clone(), AuditEntry {
                            miscalls: score.miscalls(),
                            reference: score.reference,
                            prediction: score.prediction
                        });
                    }
                }
            }

            let buckets = aggregate_scores(&score_records, n_samples)
                .with_context(|| format!("Error while aggregating {tool} at {resolution}:"))?;
            tool_metrics.insert(tool.clone(), buckets);
            if config.keep_audit {
                tool_audit.insert(tool.clone(), audit);
            }
        }

        results.metrics.insert(resolution, tool_metrics);
        if config.keep_audit {
            results.audit.insert(resolution, tool_audit);
        }
    }

    if results.conversion_failures > 0 {
        warn!("{} allele string(s) failed resolution conversion and were excluded from comparisons", results.conversion_failures);
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::genotypes::DiploidGenotype;

    /// Two-sample gold standard where every locus is heterozygous 01:01 / 02:01
    fn test_gold_standard(samples: &[&str]) -> GoldStandard {
        let gold: BTreeMap<String, BTreeMap<Locus, DiploidGenotype>> = samples.iter()
            .map(|sample| {
                let loci = HLA_LOCI.into_iter()
                    .map(|locus| {
                        (locus, DiploidGenotype::new(
                            vec![format!("{locus}*01:01")],
                            vec![format!("{locus}*02:01")]
                        ))
                    })
                    .collect();
                (sample.to_string(), loci)
            })
            .collect();
        GoldStandard::new(gold)
    }

    /// A tool that predicts every locus of every sample correctly
    fn perfect_tool(samples: &[&str]) -> SamplePredictions {
        samples.iter()
            .map(|sample| {
                let loci = HLA_LOCI.into_iter()
                    .map(|locus| {
                        (locus, PredictionRecord::new(vec![
                            format!("{locus}*01:01:01"),
                            format!("{locus}*02:01:02")
                        ]))
                    })
                    .collect();
                (sample.to_string(), loci)
            })
            .collect()
    }

    #[test]
    fn test_perfect_run() {
        let samples = ["HG00096", "HG00097"];
        let universe: Vec<String> = samples.iter().map(|s| s.to_string()).collect();
        let gold = test_gold_standard(&samples);
        let predictions: IndexMap<String, SamplePredictions> =
            [("Kourami".to_string(), perfect_tool(&samples))].into_iter().collect();
        let tables = LookupTables::default();

        let results = run_benchmark(&predictions, &gold, &universe, &tables, &BenchmarkConfig::default()).unwrap();
        assert_eq!(results.conversion_failures, 0);

        for (_resolution, tools) in &results.metrics {
            let buckets = &tools["Kourami"];
            for (bucket, metrics) in buckets {
                assert_eq!(metrics.count, bucket.multiplier() * 4);
                assert_eq!(metrics.score, bucket.multiplier() * 4);
            }
        }

        // all four resolutions evaluated by default
        assert_eq!(results.metrics.len(), ALL_RESOLUTIONS.len());
        // audit carries every sample at every locus
        let audit = &results.audit[&Resolution::TwoField]["Kourami"];
        assert_eq!(audit.len(), HLA_LOCI.len());
        assert_eq!(audit[&Locus::A].len(), samples.len());
        assert_eq!(audit[&Locus::A]["HG00096"].miscalls, 0);
    }

    #[test]
    fn test_missing_tool_data_scores_no_call() {
        let samples = ["HG00096", "HG00097"];
        let universe: Vec<String> = samples.iter().map(|s| s.to_string()).collect();
        let gold = test_gold_standard(&samples);
        // tool only reported the first sample
        let predictions: IndexMap<String, SamplePredictions> =
            [("Optitype".to_string(), perfect_tool(&samples[..1]))].into_iter().collect();
        let tables = LookupTables::default();

        let config = BenchmarkConfigBuilder::default()
            .resolutions(vec![Resolution::TwoField])
            .build().unwrap();
        let results = run_benchmark(&predictions, &gold, &universe, &tables, &config).unwrap();

        let buckets = &results.metrics[&Resolution::TwoField]["Optitype"];
        let total = buckets[&MetricsBucket::Total];
        // half the expected calls made, all of them correct
        assert_eq!(total.count, 10);
        assert_eq!(total.score, 10);
        assert_eq!(total.call_rate, 50.0);

        // the unreported sample shows up as an audited no-call
        let entry = &results.audit[&Resolution::TwoField]["Optitype"][&Locus::A]["HG00097"];
        assert!(entry.prediction.is_empty());
        assert_eq!(entry.miscalls, 2);
    }

    #[test]
    fn test_incomplete_gold_standard_fatal() {
        let samples = ["HG00096"];
        let universe = vec!["HG00096".to_string(), "HG00099".to_string()];
        let gold = test_gold_standard(&samples);
        let predictions: IndexMap<String, SamplePredictions> =
            [("Kourami".to_string(), perfect_tool(&samples))].into_iter().collect();
        let tables = LookupTables::default();

        let result = run_benchmark(&predictions, &gold, &universe, &tables, &BenchmarkConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_audit_disabled() {
        let samples = ["HG00096"];
        let universe: Vec<String> = samples.iter().map(|s| s.to_string()).collect();
        let gold = test_gold_standard(&samples);
        let predictions: IndexMap<String, SamplePredictions> =
            [("HLA-LA".to_string(), perfect_tool(&samples))].into_iter().collect();
        let tables = LookupTables::default();

        let config = BenchmarkConfigBuilder::default()
            .keep_audit(false)
            .build().unwrap();
        let results = run_benchmark(&predictions, &gold, &universe, &tables, &config).unwrap();
        assert!(results.audit.is_empty());
        assert!(!results.metrics.is_empty());
    }
}
