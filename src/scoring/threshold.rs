//! Fixed-cutoff scoring.
//!
//! A metric value maps to one of five bands {100, 75, 50, 25, 0} against
//! `[excellent, good, moderate, poor]` cutoffs. A value exactly on a cutoff
//! earns that cutoff's band: for lower-is-better metrics, 450 against
//! cutoffs 300/450/600/800 scores 75; for higher-is-better metrics a female
//! workforce share of exactly 0.40 against a 0.40 excellent cutoff scores
//! 100.

use crate::scoring::metrics::Direction;

/// Scores a single value against four cutoffs. Each row is scored
/// independently; no peer data is needed.
pub fn threshold_score(value: f64, direction: Direction, cutoffs: [f64; 4]) -> f64 {
    let [excellent, good, moderate, poor] = cutoffs;
    match direction {
        Direction::LowerIsBetter => match value {
            v if v <= excellent => 100.0,
            v if v <= good => 75.0,
            v if v <= moderate => 50.0,
            v if v <= poor => 25.0,
            _ => 0.0,
        },
        Direction::HigherIsBetter => match value {
            v if v >= excellent => 100.0,
            v if v >= good => 75.0,
            v if v >= moderate => 50.0,
            v if v >= poor => 25.0,
            _ => 0.0,
        },
    }
}
