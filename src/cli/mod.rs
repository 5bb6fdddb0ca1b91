
/*!
# CLI module
Command line interface functionality that is specific to Hlabench.
*/

/// Settings for the benchmark sub-command
pub mod benchmark;
/// Shared CLI definitions and file checks
pub mod core;
/// Settings for the gold-standard sub-command
pub mod gold_standard;
