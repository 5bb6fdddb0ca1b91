
use std::ops::AddAssign;

use crate::data_types::alleles::{HlaClass, Locus};

/// Raw per-bucket counters we accumulate during validation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScoreMetrics {
    /// Number of haplotype calls the tool made
    pub count: u64,
    /// Number of those calls that matched the gold standard
    pub score: u64
}

impl AddAssign for ScoreMetrics {
    // Enables += with counters
    fn add_assign(&mut self, rhs: Self) {
        self.count += rhs.count;
        self.score += rhs.score;
    }
}

impl ScoreMetrics {
    /// Constructor
    pub fn new(count: u64, score: u64) -> Self {
        Self {
            count, score
        }
    }

    /// Percentage of expected haplotype calls that were actually produced
    pub fn call_rate(&self, possible_calls: u64) -> Option<f64> {
        if possible_calls > 0 {
            Some(self.count as f64 * 100.0 / possible_calls as f64)
        } else {
            None
        }
    }

    /// Percentage of expected haplotype calls that were produced AND correct
    pub fn typing_accuracy(&self, possible_calls: u64) -> Option<f64> {
        if possible_calls > 0 {
            Some(self.score as f64 * 100.0 / possible_calls as f64)
        } else {
            None
        }
    }
}

/// The aggregation buckets a validated call lands in: its single locus, plus the
/// derived class and total buckets. Order here controls the summary row order.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum MetricsBucket {
    /// A single locus; multiplier 1
    Locus(Locus),
    /// HLA class I, the sum of A, B and C; multiplier 3
    ClassI,
    /// HLA class II, the sum of DRB1 and DQB1; multiplier 2
    ClassII,
    /// All five loci; multiplier 5
    Total
}

impl std::fmt::Display for MetricsBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsBucket::Locus(locus) => write!(f, "{locus}"),
            MetricsBucket::ClassI => write!(f, "HLA-I"),
            MetricsBucket::ClassII => write!(f, "HLA-II"),
            MetricsBucket::Total => write!(f, "Total")
        }
    }
}

impl serde::Serialize for MetricsBucket {
    // buckets are JSON map keys, so they serialize as their display label
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl MetricsBucket {
    /// Number of loci contributing to this bucket
    pub fn multiplier(&self) -> u64 {
        match self {
            MetricsBucket::Locus(_) => 1,
            MetricsBucket::ClassI => 3,
            MetricsBucket::ClassII => 2,
            MetricsBucket::Total => 5
        }
    }

    /// The call-rate / accuracy denominator: two haplotype calls per sample per locus
    pub fn possible_calls(&self, n_samples: u64) -> u64 {
        self.multiplier() * n_samples * 2
    }

    /// The class bucket a locus belongs to
    pub fn class_of(locus: Locus) -> MetricsBucket {
        match locus.hla_class() {
            HlaClass::ClassI => MetricsBucket::ClassI,
            HlaClass::ClassII => MetricsBucket::ClassII
        }
    }
}
