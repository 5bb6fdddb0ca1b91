
use anyhow::Context;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Loads a benchmark artifact (curated gold standard, settings dump, report) from JSON,
/// transparently decompressing a `.gz` file.
/// # Arguments
/// * `filename` - the file path to open and parse
/// * `label` - what the artifact is, used in error messages
/// # Errors
/// * if the file does not open properly
/// * if the deserialization throws errors
pub fn load_json<T: serde::de::DeserializeOwned>(filename: &Path, label: &str) -> anyhow::Result<T> {
    let file = File::open(filename)
        .with_context(|| format!("Error while opening {label} file {filename:?}:"))?;
    let reader: Box<dyn Read> = if is_gzip(filename) {
        Box::new(flate2::read::MultiGzDecoder::new(file))
    } else {
        Box::new(file)
    };
    serde_json::from_reader(BufReader::new(reader))
        .with_context(|| format!("Error while deserializing {label} from {filename:?}:"))
}

/// Saves a benchmark artifact to pretty-printed JSON, gzip-compressed when the
/// filename ends with `.gz`.
/// # Arguments
/// * `data` - the artifact in memory
/// * `filename` - user provided path to write to
/// * `label` - what the artifact is, used in error messages
/// # Errors
/// * if opening or writing to the file throw errors
/// * if JSON serialization throws errors
pub fn save_json<T: serde::Serialize>(data: &T, filename: &Path, label: &str) -> anyhow::Result<()> {
    let file = File::create(filename)
        .with_context(|| format!("Error while creating {label} file {filename:?}:"))?;
    let writer: Box<dyn Write> = if is_gzip(filename) {
        Box::new(flate2::write::GzEncoder::new(file, flate2::Compression::best()))
    } else {
        Box::new(file)
    };
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, data)
        .with_context(|| format!("Error while serializing {label} to {filename:?}:"))?;
    writer.flush()
        .with_context(|| format!("Error while flushing {label} to {filename:?}:"))?;
    Ok(())
}

fn is_gzip(filename: &Path) -> bool {
    filename.extension().unwrap_or_default() == "gz"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::alleles::Locus;
    use crate::data_types::genotypes::{DiploidGenotype, GoldStandard};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn test_gold_standard() -> GoldStandard {
        let loci: BTreeMap<Locus, DiploidGenotype> = [
            (Locus::A, DiploidGenotype::new(
                vec!["A*01:01".to_string()],
                vec!["A*02:01".to_string()]
            ))
        ].into_iter().collect();
        GoldStandard::new([("HG00096".to_string(), loci)].into_iter().collect())
    }

    fn temp_filename(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("hlabench_{}_{name}", std::process::id()))
    }

    #[test]
    fn test_gold_standard_round_trip() {
        let gold = test_gold_standard();
        let filename = temp_filename("gold.json");

        save_json(&gold, &filename, "gold standard").unwrap();
        let reloaded: GoldStandard = load_json(&filename, "gold standard").unwrap();
        assert_eq!(gold, reloaded);

        std::fs::remove_file(&filename).unwrap();
    }

    #[test]
    fn test_gzip_round_trip() {
        let gold = test_gold_standard();
        let filename = temp_filename("gold.json.gz");

        save_json(&gold, &filename, "gold standard").unwrap();
        // the gz extension switches on compression, so the raw bytes are not JSON
        let raw = std::fs::read(&filename).unwrap();
        assert_ne!(raw.first(), Some(&b'{'));

        let reloaded: GoldStandard = load_json(&filename, "gold standard").unwrap();
        assert_eq!(gold, reloaded);

        std::fs::remove_file(&filename).unwrap();
    }

    #[test]
    fn test_missing_file_names_the_artifact() {
        let filename = temp_filename("does_not_exist.json");
        let result: anyhow::Result<GoldStandard> = load_json(&filename, "gold standard");
        assert!(format!("{:#}", result.unwrap_err()).contains("gold standard"));
    }
}
