//! The deal-detection engine.
//!
//! Joins raw listings with card metadata, scans each card for a
//! profitable price gap, fans the scan out across expansions, and ranks
//! the aggregated candidates.

pub mod joiner;
pub mod scanner;
pub mod orchestrator;
pub mod ranker;
