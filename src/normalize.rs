
use rustc_hash::FxHashMap;

use crate::data_types::alleles::{Allele, AlleleError};
use crate::data_types::resolution::Resolution;

/// Immutable resolution lookup tables, built once at startup and shared read-only
/// across all normalization calls.
#[derive(Clone, Debug, Default)]
pub struct LookupTables {
    /// two-field allele name -> P-group representative
    p_group: FxHashMap<String, String>,
    /// P-group representative -> pseudosequence (E-group) representative
    e_group: FxHashMap<String, String>
}

impl LookupTables {
    /// Constructor
    pub fn new(p_group: FxHashMap<String, String>, e_group: FxHashMap<String, String>) -> Self {
        Self {
            p_group, e_group
        }
    }

    pub fn p_group_len(&self) -> usize {
        self.p_group.len()
    }

    pub fn e_group_len(&self) -> usize {
        self.e_group.len()
    }
}

/// Converts a raw allele string into its canonical form at the requested resolution.
/// This is a pure function over the provided tables; a malformed input yields an
/// explicit error, never a partial string, and callers are expected to count and
/// log exclusions rather than abort.
/// # Arguments
/// * `raw` - the allele string to convert, at any input resolution
/// * `resolution` - the target resolution
/// * `tables` - the shared group lookup tables
/// # Errors
/// * if the input does not match the allele grammar
/// * if the input has too few fields for the requested resolution
pub fn normalize_allele(raw: &str, resolution: Resolution, tables: &LookupTables) -> Result<String, AlleleError> {
    let allele: Allele = raw.parse()?;
    match resolution {
        Resolution::OneField => Ok(allele.one_field()),
        Resolution::TwoField => allele.two_field(),
        Resolution::PGroup => p_group_form(&allele, tables),
        Resolution::Pseudosequence => {
            // chain through the P-group; a missing E-group entry gracefully keeps the P-group form
            let p_group = p_group_form(&allele, tables)?;
            Ok(tables.e_group.get(&p_group).cloned().unwrap_or(p_group))
        }
    }
}

/// P-group lookup keyed by the two-field form. Tools sometimes report names that are
/// already a group identifier, so a missing entry falls back to the two-field form
/// instead of failing.
fn p_group_form(allele: &Allele, tables: &LookupTables) -> Result<String, AlleleError> {
    let two_field = allele.two_field()?;
    Ok(tables.p_group.get(&two_field).cloned().unwrap_or(two_field))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Small fixture with one mapped P-group and one mapped E-group
    fn fixture_tables() -> LookupTables {
        let p_group: FxHashMap<String, String> = [
            ("A*01:01".to_string(), "A*01:01P".to_string()),
            ("A*01:04".to_string(), "A*01:01P".to_string()),
            ("B*57:01".to_string(), "B*57:01P".to_string())
        ].into_iter().collect();
        let e_group: FxHashMap<String, String> = [
            ("A*01:01P".to_string(), "A*01:01E".to_string())
        ].into_iter().collect();
        LookupTables::new(p_group, e_group)
    }

    #[test]
    fn test_one_field() {
        let tables = LookupTables::default();
        assert_eq!(normalize_allele("A*01:01:01", Resolution::OneField, &tables).unwrap(), "A*01");
        assert_eq!(normalize_allele("DQB1*06", Resolution::OneField, &tables).unwrap(), "DQB1*06");
    }

    #[test]
    fn test_two_field() {
        let tables = LookupTables::default();
        assert_eq!(normalize_allele("A*01:01:01:02", Resolution::TwoField, &tables).unwrap(), "A*01:01");
        assert_eq!(normalize_allele("B*57:01:03G", Resolution::TwoField, &tables).unwrap(), "B*57:01");
        // one field is not enough for the two-field form
        assert!(normalize_allele("A*01", Resolution::TwoField, &tables).is_err());
    }

    #[test]
    fn test_two_field_idempotent() {
        let tables = LookupTables::default();
        let once = normalize_allele("DRB1*15:01:01G", Resolution::TwoField, &tables).unwrap();
        let twice = normalize_allele(&once, Resolution::TwoField, &tables).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_p_group_lookup() {
        let tables = fixture_tables();
        // mapped entries collapse onto the group representative
        assert_eq!(normalize_allele("A*01:01:01", Resolution::PGroup, &tables).unwrap(), "A*01:01P");
        assert_eq!(normalize_allele("A*01:04", Resolution::PGroup, &tables).unwrap(), "A*01:01P");
    }

    #[test]
    fn test_p_group_fallback() {
        let tables = fixture_tables();
        // unmapped alleles keep their own two-field form
        assert_eq!(normalize_allele("C*07:02", Resolution::PGroup, &tables).unwrap(), "C*07:02");
    }

    #[test]
    fn test_pseudosequence_chain() {
        let tables = fixture_tables();
        assert_eq!(normalize_allele("A*01:04", Resolution::Pseudosequence, &tables).unwrap(), "A*01:01E");
    }

    #[test]
    fn test_pseudosequence_fallback_to_p_group() {
        let tables = fixture_tables();
        // B*57:01P has no E-group entry, so the chain stops at the P-group form
        assert_eq!(normalize_allele("B*57:01", Resolution::Pseudosequence, &tables).unwrap(), "B*57:01P");
    }

    #[test]
    fn test_invalid_input() {
        let tables = fixture_tables();
        for resolution in crate::data_types::resolution::ALL_RESOLUTIONS {
            assert!(normalize_allele("A*", resolution, &tables).is_err());
            assert!(normalize_allele("garbage", resolution, &tables).is_err());
        }
    }
}
