
/// Helper functions for read/writing JSON via serde
pub mod json_io;
