//! Per-file diagnostics attached to processing reports.
//!
//! Timings are collected for every stage of the pipeline (load, decode,
//! predict, composite, write) and serialized with the JSON report.

pub mod timing;

pub use timing::{elapsed_ms, StageTiming, TimingBreakdown};
