
/// Contains the HLA allele grammar, locus definitions and parse errors
pub mod alleles;
/// Contains diploid genotypes, per-tool prediction records and the gold standard
pub mod genotypes;
/// Contains the closed set of comparison resolutions
pub mod resolution;
/// Contains the call/score counters and the derived aggregation buckets
pub mod score_metrics;
