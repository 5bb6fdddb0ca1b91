
use anyhow::{ensure, Context};
use log::{debug, info, warn};
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::data_types::alleles::Allele;
use crate::normalize::LookupTables;

/// Loads both group tables and bundles them into the shared lookup object.
/// # Arguments
/// * `p_group_fn` - IMGT/HLA P-group nomenclature file (`hla_nom_p.txt` layout)
/// * `e_group_fn` - two-column TSV mapping a P-group name to its pseudosequence group
/// # Errors
/// * if either file cannot be opened or parsed
pub fn load_lookup_tables(p_group_fn: &Path, e_group_fn: &Path) -> anyhow::Result<LookupTables> {
    let p_reader = BufReader::new(File::open(p_group_fn)
        .with_context(|| format!("Error while opening {p_group_fn:?}:"))?);
    let p_group = parse_p_group_table(p_reader)
        .with_context(|| format!("Error while parsing {p_group_fn:?}:"))?;

    let e_reader = BufReader::new(File::open(e_group_fn)
        .with_context(|| format!("Error while opening {e_group_fn:?}:"))?);
    let e_group = parse_e_group_table(e_reader)
        .with_context(|| format!("Error while parsing {e_group_fn:?}:"))?;

    info!("Loaded {} P-group entries and {} pseudosequence entries", p_group.len(), e_group.len());
    Ok(LookupTables::new(p_group, e_group))
}

/// Parses the IMGT/HLA P-group nomenclature layout: three semicolon-separated columns
/// holding the locus prefix (`A*`), a slash-separated allele list, and the group name.
/// An empty group column marks an ungrouped allele, which needs no table entry since
/// normalization falls back to the two-field form anyway. Each listed allele is keyed
/// by its two-field form; alleles at loci outside the benchmark set are skipped.
pub fn parse_p_group_table<R: BufRead>(reader: R) -> anyhow::Result<FxHashMap<String, String>> {
    let mut table: FxHashMap<String, String> = Default::default();

    for (line_index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Error while reading line {}:", line_index + 1))?;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let columns: Vec<&str> = line.split(';').collect();
        ensure!(columns.len() == 3, "Expected 3 columns on line {}, found {}", line_index + 1, columns.len());

        let locus_prefix = columns[0];
        let group = columns[2].trim();
        if group.is_empty() {
            // ungrouped single allele, handled by the two-field fallback
            continue;
        }
        let group_name = format!("{locus_prefix}{group}");

        for short_allele in columns[1].split('/') {
            let full_name = format!("{locus_prefix}{short_allele}");
            let allele: Allele = match full_name.parse() {
                Ok(a) => a,
                Err(_) => {
                    // most commonly a locus we do not benchmark
                    debug!("Skipping P-group entry outside the benchmark set: {full_name}");
                    continue;
                }
            };
            let Ok(two_field) = allele.two_field() else {
                debug!("Skipping P-group entry without a two-field form: {full_name}");
                continue;
            };

            // several four-field names share a two-field key; only conflicting groups are notable
            if let Some(existing) = table.get(&two_field) {
                if existing != &group_name {
                    warn!("Two-field key {two_field} maps to both {existing} and {group_name}, keeping {existing}");
                }
                continue;
            }
            table.insert(two_field, group_name.clone());
        }
    }

    Ok(table)
}

/// Parses the pseudosequence table: two tab-separated columns mapping a P-group name
/// to its pseudosequence (E-group) representative. Lines starting with '#' are comments.
pub fn parse_e_group_table<R: BufRead>(reader: R) -> anyhow::Result<FxHashMap<String, String>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut table: FxHashMap<String, String> = Default::default();
    for (row_index, result) in csv_reader.records().enumerate() {
        let row = result.with_context(|| format!("Error while reading row {}:", row_index + 1))?;

        let p_group = row.get(0)
            .ok_or_else(|| anyhow::anyhow!("Missing P-group column on row {}", row_index + 1))?
            .trim().to_string();
        let e_group = row.get(1)
            .ok_or_else(|| anyhow::anyhow!("Missing pseudosequence column on row {}", row_index + 1))?
            .trim().to_string();
        ensure!(!p_group.is_empty() && !e_group.is_empty(), "Empty field on row {}", row_index + 1);

        if let Some(existing) = table.insert(p_group, e_group) {
            warn!("Duplicate pseudosequence entry replaced a previous value: {existing}");
        }
    }

    Ok(table)
}
