
/*!
# Writers module
Contains the logic for writing the output files for the benchmark command.
*/
/// Flat summary table writer
pub mod summary;
