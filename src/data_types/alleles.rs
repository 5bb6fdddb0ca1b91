
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The five HLA loci covered by the benchmark.
/// Variant order matches the conventional report order (class I, then class II).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize, strum_macros::Display, strum_macros::EnumString)]
pub enum Locus {
    #[serde(rename = "A")]
    #[strum(serialize = "A")]
    A,
    #[serde(rename = "B")]
    #[strum(serialize = "B")]
    B,
    #[serde(rename = "C")]
    #[strum(serialize = "C")]
    C,
    #[serde(rename = "DRB1")]
    #[strum(serialize = "DRB1")]
    Drb1,
    #[serde(rename = "DQB1")]
    #[strum(serialize = "DQB1")]
    Dqb1
}

/// All loci in report order, for iteration without an allocation
pub const HLA_LOCI: [Locus; 5] = [Locus::A, Locus::B, Locus::C, Locus::Drb1, Locus::Dqb1];

/// The two HLA classes the loci fall into
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum HlaClass {
    ClassI,
    ClassII
}

impl Locus {
    /// Returns the HLA class this locus belongs to
    pub fn hla_class(&self) -> HlaClass {
        match self {
            Locus::A |
            Locus::B |
            Locus::C => HlaClass::ClassI,
            Locus::Drb1 |
            Locus::Dqb1 => HlaClass::ClassII
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum AlleleError {
    #[error("allele {allele:?} does not match the HLA nomenclature grammar")]
    ParseFailure { allele: String },
    #[error("allele {allele:?} names a locus outside the benchmark set")]
    UnknownLocus { allele: String },
    #[error("allele {allele:?} has only {available} field(s), two-field form requires at least two")]
    InsufficientFields { allele: String, available: usize }
}

lazy_static! {
    /// Anchored form of the allele grammar: locus, '*', 1-4 colon-separated numeric fields,
    /// and an optional trailing letter (G-group or expression marker)
    static ref ALLELE_RE: Regex = Regex::new(r"^([A-Z]+[0-9]*)\*(\d{1,3}(?::\d{1,3}){0,3})([A-Z]?)$").unwrap();
}

/// A parsed HLA allele name, e.g. `DRB1*15:01:01G`.
/// Fields keep their exact string form, so leading zeros are preserved through round-trips.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Allele {
    /// The locus named before the '*'
    locus: Locus,
    /// Colon-separated numeric groups, coarsest first; always at least one
    fields: Vec<String>,
    /// Optional trailing letter, e.g. 'G' for a G-group name or 'N' for a null allele
    suffix: Option<char>
}

impl FromStr for Allele {
    type Err = AlleleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = ALLELE_RE.captures(s)
            .ok_or_else(|| AlleleError::ParseFailure { allele: s.to_string() })?;

        let locus: Locus = captures[1].parse()
            .map_err(|_| AlleleError::UnknownLocus { allele: s.to_string() })?;
        let fields: Vec<String> = captures[2].split(':')
            .map(|f| f.to_string())
            .collect();
        let suffix: Option<char> = captures[3].chars().next();

        Ok(Allele {
            locus,
            fields,
            suffix
        })
    }
}

impl std::fmt::Display for Allele {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}*{}", self.locus, self.fields.join(":"))?;
        if let Some(suffix) = self.suffix {
            write!(f, "{suffix}")?;
        }
        Ok(())
    }
}

impl Allele {
    pub fn locus(&self) -> Locus {
        self.locus
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if this name carries the G-group marker, e.g. `A*01:01:01G`
    pub fn is_g_group(&self) -> bool {
        self.suffix == Some('G')
    }

    /// Truncates to the one-field form, e.g. `A*01:01:01` -> `A*01`.
    /// Always succeeds for a parsed allele, which has at least one field.
    pub fn one_field(&self) -> String {
        format!("{}*{}", self.locus, self.fields[0])
    }

    /// Truncates to the two-field form, dropping any suffix and any third/fourth field,
    /// e.g. `B*57:01:03G` -> `B*57:01`.
    /// # Errors
    /// * if the allele has fewer than two fields
    pub fn two_field(&self) -> Result<String, AlleleError> {
        if self.fields.len() < 2 {
            return Err(AlleleError::InsufficientFields {
                allele: self.to_string(),
                available: self.fields.len()
            });
        }
        Ok(format!("{}*{}:{}", self.locus, self.fields[0], self.fields[1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let allele: Allele = "A*01:01:01".parse().unwrap();
        assert_eq!(allele.locus(), Locus::A);
        assert_eq!(allele.field_count(), 3);
        assert!(!allele.is_g_group());
        assert_eq!(allele.to_string(), "A*01:01:01");
    }

    #[test]
    fn test_parse_class_two_with_g_marker() {
        let allele: Allele = "DRB1*15:01:01G".parse().unwrap();
        assert_eq!(allele.locus(), Locus::Drb1);
        assert!(allele.is_g_group());
        assert_eq!(allele.two_field().unwrap(), "DRB1*15:01");
    }

    #[test]
    fn test_parse_expression_suffix() {
        // null alleles show up in the 1000G truth data
        let allele: Allele = "C*04:09N".parse().unwrap();
        assert!(!allele.is_g_group());
        assert_eq!(allele.two_field().unwrap(), "C*04:09");
    }

    #[test]
    fn test_parse_failures() {
        // empty field list
        assert_eq!("A*".parse::<Allele>(), Err(AlleleError::ParseFailure { allele: "A*".to_string() }));
        // no separator
        assert_eq!("A01:01".parse::<Allele>(), Err(AlleleError::ParseFailure { allele: "A01:01".to_string() }));
        // locus outside the benchmark set
        assert_eq!("DPB1*04:01".parse::<Allele>(), Err(AlleleError::UnknownLocus { allele: "DPB1*04:01".to_string() }));
        // non-numeric field
        assert!("A*xx:01".parse::<Allele>().is_err());
    }

    #[test]
    fn test_one_field() {
        for (raw, expected) in [("A*01", "A*01"), ("B*57:01", "B*57"), ("DQB1*06:02:01G", "DQB1*06")] {
            let allele: Allele = raw.parse().unwrap();
            assert_eq!(allele.one_field(), expected);
        }
    }

    #[test]
    fn test_two_field_requires_two_fields() {
        let allele: Allele = "A*01".parse().unwrap();
        assert_eq!(allele.two_field(), Err(AlleleError::InsufficientFields { allele: "A*01".to_string(), available: 1 }));
    }

    #[test]
    fn test_locus_class() {
        assert_eq!(Locus::A.hla_class(), HlaClass::ClassI);
        assert_eq!(Locus::C.hla_class(), HlaClass::ClassI);
        assert_eq!(Locus::Drb1.hla_class(), HlaClass::ClassII);
        assert_eq!(Locus::Dqb1.hla_class(), HlaClass::ClassII);
    }
}
