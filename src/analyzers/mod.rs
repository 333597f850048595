//! Band classification and school-level aggregation.
//!
//! Levels read back from summary files are mapped to expectation bands, then
//! counted per school and per grade for charts, documents, and JSON output.

pub mod aggregate;
pub mod band;
pub mod types;
pub mod utility;
