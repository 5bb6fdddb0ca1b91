
use serde::Serialize;
use strum_macros::EnumString;

/// The closed set of nomenclature resolutions a comparison can run at.
/// Variant order matches the report order of the output JSON.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, strum_macros::Display, EnumString, clap::ValueEnum)]
pub enum Resolution {
    /// Locus plus the first field only, e.g. `A*01`
    #[serde(rename = "1-field")]
    #[strum(ascii_case_insensitive, serialize = "1-field")]
    #[clap(name = "1-field")]
    OneField,
    /// Pseudosequence (E-group) equivalence, derived from the P-group
    #[serde(rename = "pseudosequence")]
    #[strum(ascii_case_insensitive, serialize = "pseudosequence")]
    #[clap(name = "pseudosequence")]
    Pseudosequence,
    /// P-group equivalence, i.e. identical binding-groove protein sequence
    #[serde(rename = "P group")]
    #[strum(ascii_case_insensitive, serialize = "P group")]
    #[clap(name = "p-group")]
    PGroup,
    /// Locus plus the first two fields, e.g. `A*01:01`; also the gold-standard storage form
    #[default]
    #[serde(rename = "2-field")]
    #[strum(ascii_case_insensitive, serialize = "2-field")]
    #[clap(name = "2-field")]
    TwoField
}

/// All resolutions in report order
pub const ALL_RESOLUTIONS: [Resolution; 4] = [
    Resolution::OneField,
    Resolution::Pseudosequence,
    Resolution::PGroup,
    Resolution::TwoField
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_display_labels() {
        assert_eq!(Resolution::OneField.to_string(), "1-field");
        assert_eq!(Resolution::Pseudosequence.to_string(), "pseudosequence");
        assert_eq!(Resolution::PGroup.to_string(), "P group");
        assert_eq!(Resolution::TwoField.to_string(), "2-field");
    }

    #[test]
    fn test_from_str_round_trip() {
        for resolution in ALL_RESOLUTIONS {
            assert_eq!(Resolution::from_str(&resolution.to_string()).unwrap(), resolution);
        }
    }
}
