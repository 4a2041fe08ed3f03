//! ESG score derivation.
//!
//! This module rolls field-level records up to farm level, converts derived
//! metrics into normalized component scores via a threshold or percentile
//! strategy, and combines them into a weighted overall ESG score.

pub mod aggregate;
pub mod engine;
pub mod grade;
pub mod metrics;
pub mod percentile;
pub mod threshold;
pub mod utility;
