
use anyhow::{bail, ensure};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::data_types::alleles::{Locus, HLA_LOCI};

/// The two haplotype slots of one sample at one locus.
/// Each slot carries the set of equally-acceptable two-field truth alleles, since
/// the source typing may be ambiguous at that resolution.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct DiploidGenotype {
    /// Acceptable truth alleles for the first haplotype
    hap1: Vec<String>,
    /// Acceptable truth alleles for the second haplotype
    hap2: Vec<String>
}

impl DiploidGenotype {
    /// Constructor
    pub fn new(hap1: Vec<String>, hap2: Vec<String>) -> Self {
        Self {
            hap1, hap2
        }
    }

    pub fn hap1(&self) -> &[String] {
        &self.hap1
    }

    pub fn hap2(&self) -> &[String] {
        &self.hap2
    }

    /// Returns true if both haplotype slots carry at least one truth allele.
    /// An empty slot means the sample was never typed at this locus.
    pub fn is_fully_typed(&self) -> bool {
        !self.hap1.is_empty() && !self.hap2.is_empty()
    }
}

/// The calls a single tool made for one sample at one locus.
/// Construction applies the homozygous duplication rule, so downstream consumers
/// only ever see zero or two-or-more calls.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PredictionRecord {
    /// The called alleles, sorted; empty means the tool made no call here
    calls: Vec<String>
}

impl PredictionRecord {
    /// Builds a record from raw calls.
    /// A single call is homozygous shorthand from the tool, so it is duplicated
    /// to two identical calls; calls are then sorted for stable output.
    pub fn new(mut calls: Vec<String>) -> Self {
        if calls.len() == 1 {
            let dup = calls[0].clone();
            calls.push(dup);
        }
        calls.sort();
        Self {
            calls
        }
    }

    /// An explicit "no call" record
    pub fn no_call() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[String] {
        &self.calls
    }

    /// Number of haplotype calls this record contributes to the call-rate denominator
    pub fn call_count(&self) -> u64 {
        self.calls.len() as u64
    }

    pub fn is_no_call(&self) -> bool {
        self.calls.is_empty()
    }
}

/// Per-sample predictions for one tool: sample id -> locus -> record.
/// A sample key with an empty inner map means the tool produced an empty result file.
pub type SamplePredictions = BTreeMap<String, BTreeMap<Locus, PredictionRecord>>;

/// The curated truth data: sample id -> locus -> diploid genotype, alleles stored at
/// two-field resolution. Built once per run and read-only during scoring.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct GoldStandard {
    samples: BTreeMap<String, BTreeMap<Locus, DiploidGenotype>>
}

impl GoldStandard {
    /// Constructor
    pub fn new(samples: BTreeMap<String, BTreeMap<Locus, DiploidGenotype>>) -> Self {
        Self {
            samples
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn genotype(&self, sample: &str, locus: Locus) -> Option<&DiploidGenotype> {
        self.samples.get(sample)
            .and_then(|loci| loci.get(&locus))
    }

    pub fn sample_ids(&self) -> impl Iterator<Item = &String> {
        self.samples.keys()
    }

    /// Verifies the truth data covers every sample in the universe at every locus with
    /// both haplotype slots typed. Scoring against absent truth silently corrupts the
    /// accuracy numbers, so any gap here is fatal before scoring starts.
    /// # Arguments
    /// * `sample_universe` - the full list of samples the benchmark will score
    /// # Errors
    /// * if the universe contains a duplicate sample id
    /// * if a sample is missing from the truth data, or is untyped at any locus
    pub fn ensure_complete(&self, sample_universe: &[String]) -> anyhow::Result<()> {
        let mut seen: std::collections::BTreeSet<&str> = Default::default();
        for sample in sample_universe {
            ensure!(seen.insert(sample), "Duplicate sample id in universe: {sample}");

            let Some(loci) = self.samples.get(sample) else {
                bail!("Sample {sample} has no gold-standard data");
            };
            for locus in HLA_LOCI {
                match loci.get(&locus) {
                    Some(genotype) => {
                        ensure!(genotype.is_fully_typed(), "Sample {sample} is not fully typed at locus {locus}");
                    },
                    None => bail!("Sample {sample} has no gold-standard entry for locus {locus}")
                };
            }
        }
        Ok(())
    }
}
