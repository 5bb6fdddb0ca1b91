
/// Folds per-sample scores into per-locus, per-class and total metrics
pub mod aggregate;
/// Core driver that scores every tool at every resolution
pub mod benchmark;
/// Command line interface functionality
pub mod cli;
/// Contains various shared data types
pub mod data_types;
/// Allele resolution conversion over the shared lookup tables
pub mod normalize;
/// Tooling for parsing input files into meaningful structs / data
pub mod parsing;
/// Diploid genotype scoring against the gold standard
pub mod scoring;
/// Various utility functions that tend to be very generic
pub mod util;
/// All output writers
pub mod writers;
