/*!
# Parsing module
Contains the logic for parsing input files into meaningful structs / data.
*/
/// Curates the 1000 Genomes diversity table into the gold standard
pub mod gold_standard;
/// Loads the P-group and pseudosequence lookup tables
pub mod lookup_tables;
/// Parsers for the per-tool genotyping result layouts
pub mod tool_results;
