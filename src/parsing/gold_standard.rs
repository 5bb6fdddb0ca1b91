
use anyhow::{bail, ensure, Context};
use itertools::Itertools;
use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::data_types::alleles::{Allele, Locus, HLA_LOCI};
use crate::data_types::genotypes::{DiploidGenotype, GoldStandard};

/// Loads the sample universe file: one sample id per line, '#' comments allowed.
/// Duplicate ids are rejected here, before anything gets scored against them.
pub fn load_sample_universe(filename: &Path) -> anyhow::Result<Vec<String>> {
    let reader = BufReader::new(File::open(filename)
        .with_context(|| format!("Error while opening {filename:?}:"))?);
    parse_sample_universe(reader)
        .with_context(|| format!("Error while parsing {filename:?}:"))
}

/// Parses the sample universe, preserving file order with a set-based duplicate check
pub fn parse_sample_universe<R: BufRead>(reader: R) -> anyhow::Result<Vec<String>> {
    let mut seen: BTreeSet<String> = Default::default();
    let mut samples: Vec<String> = vec![];
    for line in reader.lines() {
        let line = line?;
        let sample = line.trim();
        if sample.is_empty() || sample.starts_with('#') {
            continue;
        }
        ensure!(seen.insert(sample.to_string()), "Duplicate sample id: {sample}");
        samples.push(sample.to_string());
    }

    ensure!(!samples.is_empty(), "Sample universe is empty");
    Ok(samples)
}

/// Loads and curates the raw 1000 Genomes HLA diversity table into the gold standard.
/// # Arguments
/// * `filename` - the space-separated diversity table
/// * `sample_universe` - samples to retain; the curated set must fully cover this list
/// # Errors
/// * if the table cannot be read or lacks the expected columns
/// * if any universe sample ends up untyped at any locus
pub fn load_gold_standard(filename: &Path, sample_universe: &[String]) -> anyhow::Result<GoldStandard> {
    let file = File::open(filename)
        .with_context(|| format!("Error while opening {filename:?}:"))?;
    let gold_standard = parse_gold_standard(file, sample_universe)
        .with_context(|| format!("Error while parsing {filename:?}:"))?;
    info!("Curated gold standard covers {} samples", gold_standard.len());
    Ok(gold_standard)
}

/// Parses the diversity table layout: space-separated columns with a header row carrying
/// `id` plus paired per-locus columns (`A`, `A.1`, `B`, `B.1`, ...). A cell is a
/// slash-separated list of allele names without the locus prefix; `0000` marks an
/// untyped slot. Rows sharing a sample id are merged per haplotype slot into the union
/// of their allele lists. Alleles without a two-field form are dropped with a logged
/// parse failure; a haplotype slot left empty afterwards is fatal.
pub fn parse_gold_standard<R: Read>(reader: R, sample_universe: &[String]) -> anyhow::Result<GoldStandard> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b' ')
        .comment(Some(b'#'))
        .from_reader(reader);

    // resolve the column layout from the header row
    let headers = csv_reader.headers()
        .context("Error while reading header row:")?
        .clone();
    let column_of = |name: &str| -> anyhow::Result<usize> {
        headers.iter().position(|h| h == name)
            .with_context(|| format!("Missing column {name:?} in header"))
    };
    let id_column = column_of("id")?;
    let locus_columns: Vec<(Locus, usize, usize)> = HLA_LOCI.into_iter()
        .map(|locus| {
            let first = column_of(&locus.to_string())?;
            let second = column_of(&format!("{locus}.1"))?;
            Ok((locus, first, second))
        })
        .collect::<anyhow::Result<_>>()?;

    // accumulate raw slot candidates, merging duplicate sample rows by union
    let mut raw_slots: BTreeMap<String, BTreeMap<Locus, [Vec<String>; 2]>> = Default::default();
    for (row_index, result) in csv_reader.records().enumerate() {
        let row = result.with_context(|| format!("Error while reading row {}:", row_index + 1))?;
        let sample = row.get(id_column)
            .with_context(|| format!("Missing id on row {}", row_index + 1))?
            .trim_matches('"')
            .to_string();
        if !sample_universe.is_empty() && !sample_universe.contains(&sample) {
            continue;
        }

        let sample_entry = raw_slots.entry(sample).or_default();
        for &(locus, first, second) in &locus_columns {
            let slots = sample_entry.entry(locus).or_default();
            for (slot_index, column) in [(0, first), (1, second)] {
                let cell = row.get(column)
                    .with_context(|| format!("Missing {locus} column on row {}", row_index + 1))?
                    .trim_matches('"');
                for token in split_cell(cell) {
                    let candidate = format!("{locus}*{token}");
                    if !slots[slot_index].contains(&candidate) {
                        slots[slot_index].push(candidate);
                    }
                }
            }
        }
    }

    // reduce each slot to its unique two-field alleles and flag anything left untyped
    let mut parse_failures: u64 = 0;
    let mut untyped: Vec<String> = vec![];
    let mut samples: BTreeMap<String, BTreeMap<Locus, DiploidGenotype>> = Default::default();
    for (sample, loci) in raw_slots {
        let mut genotypes: BTreeMap<Locus, DiploidGenotype> = Default::default();
        for (locus, slots) in loci {
            let [hap1, hap2] = slots.map(|candidates| {
                to_two_field_set(&candidates, &mut parse_failures)
            });
            if hap1.is_empty() || hap2.is_empty() {
                untyped.push(format!("{sample}/{locus}"));
            }
            genotypes.insert(locus, DiploidGenotype::new(hap1, hap2));
        }
        samples.insert(sample, genotypes);
    }

    if parse_failures > 0 {
        warn!("{parse_failures} truth allele(s) had no two-field form and were excluded");
    }
    if !untyped.is_empty() {
        // scoring against a partially-typed truth set would corrupt the metrics
        bail!("Untyped gold-standard slots: {}", untyped.iter().join(", "));
    }

    let gold_standard = GoldStandard::new(samples);
    gold_standard.ensure_complete(sample_universe)
        .context("Curated gold standard does not cover the sample universe:")?;
    Ok(gold_standard)
}

/// Splits a raw cell into allele tokens; `0000` and empty entries mean "untyped"
fn split_cell(cell: &str) -> Vec<&str> {
    cell.split('/')
        .map(|token| token.trim())
        .filter(|token| !token.is_empty() && *token != "0000")
        .collect()
}

/// Converts raw candidates to their unique two-field forms, counting drops
fn to_two_field_set(candidates: &[String], parse_failures: &mut u64) -> Vec<String> {
    let mut converted: Vec<String> = candidates.iter()
        .filter_map(|raw| {
            match raw.parse::<Allele>().and_then(|allele| allele.two_field()) {
                Ok(two_field) => Some(two_field),
                Err(e) => {
                    warn!("Dropping truth allele: {e}");
                    *parse_failures += 1;
                    None
                }
            }
        })
        .collect();
    converted.sort();
    converted.dedup();
    converted
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIVERSITY_FIXTURE: &str = "\
id region population A A.1 B B.1 C C.1 DRB1 DRB1.1 DQB1 DQB1.1
HG00096 GBR EUR 01:01 02:01:01 07:02 57:01 07:01 06:02 15:01 03:01 06:02 02:01
HG00097 GBR EUR 03:01/03:20 11:01 08:01 35:01 04:01 07:02 01:01 04:01 05:01 03:02
";

    const DUPLICATE_FIXTURE: &str = "\
id region population A A.1 B B.1 C C.1 DRB1 DRB1.1 DQB1 DQB1.1
HG00096 GBR EUR 01:01 02:01 07:02 57:01 07:01 06:02 15:01 03:01 06:02 02:01
HG00096 GBR EUR 01:02 02:01 07:02 57:01 07:01 06:02 15:01 03:01 06:02 02:01
";

    const UNTYPED_FIXTURE: &str = "\
id region population A A.1 B B.1 C C.1 DRB1 DRB1.1 DQB1 DQB1.1
HG00096 GBR EUR 01:01 0000 07:02 57:01 07:01 06:02 15:01 03:01 06:02 02:01
";

    fn universe(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_basic_table() {
        let gold = parse_gold_standard(DIVERSITY_FIXTURE.as_bytes(), &universe(&["HG00096", "HG00097"])).unwrap();
        assert_eq!(gold.len(), 2);

        // third fields get truncated to two-field storage
        let genotype = gold.genotype("HG00096", Locus::A).unwrap();
        assert_eq!(genotype.hap1(), ["A*01:01".to_string()]);
        assert_eq!(genotype.hap2(), ["A*02:01".to_string()]);

        // ambiguous truth slots keep all acceptable alleles
        let genotype = gold.genotype("HG00097", Locus::A).unwrap();
        assert_eq!(genotype.hap1(), ["A*03:01".to_string(), "A*03:20".to_string()]);
    }

    #[test]
    fn test_universe_filter() {
        let gold = parse_gold_standard(DIVERSITY_FIXTURE.as_bytes(), &universe(&["HG00097"])).unwrap();
        assert_eq!(gold.len(), 1);
        assert!(gold.genotype("HG00096", Locus::A).is_none());
    }

    #[test]
    fn test_duplicate_rows_merge_to_union() {
        let gold = parse_gold_standard(DUPLICATE_FIXTURE.as_bytes(), &universe(&["HG00096"])).unwrap();
        let genotype = gold.genotype("HG00096", Locus::A).unwrap();
        assert_eq!(genotype.hap1(), ["A*01:01".to_string(), "A*01:02".to_string()]);
        assert_eq!(genotype.hap2(), ["A*02:01".to_string()]);
    }

    #[test]
    fn test_untyped_slot_is_fatal() {
        let result = parse_gold_standard(UNTYPED_FIXTURE.as_bytes(), &universe(&["HG00096"]));
        assert!(result.unwrap_err().to_string().contains("Untyped gold-standard slots"));
    }

    #[test]
    fn test_missing_universe_sample_is_fatal() {
        let result = parse_gold_standard(DIVERSITY_FIXTURE.as_bytes(), &universe(&["HG00096", "HG99999"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_sample_universe() {
        let content = "# 1000G subset\nHG00096\n\nHG00097\n";
        let samples = parse_sample_universe(content.as_bytes()).unwrap();
        assert_eq!(samples, vec!["HG00096".to_string(), "HG00097".to_string()]);
    }

    #[test]
    fn test_duplicate_universe_id_rejected() {
        let content = "HG00096\nHG00097\nHG00096\n";
        let result = parse_sample_universe(content.as_bytes());
        assert!(result.unwrap_err().to_string().contains("Duplicate sample id"));
    }

    #[test]
    fn test_empty_universe_rejected() {
        assert!(parse_sample_universe("# only comments\n".as_bytes()).is_err());
    }
}
