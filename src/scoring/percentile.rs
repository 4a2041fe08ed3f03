//! Peer-relative scoring.
//!
//! A metric's raw values across the whole dataset are converted to
//! average-rank percentiles; the percentile (or its complement for
//! lower-is-better metrics) is the score. Unlike the threshold strategy,
//! this needs the full peer set at scoring time.

use crate::scoring::metrics::Direction;

/// Converts one column of values into 0–100 percentile scores, one per
/// input slot. Missing values stay missing. Ties share their average rank.
/// A column with one or fewer distinct values scores 50 for every row that
/// has a value.
pub fn percentile_scores(values: &[Option<f64>], direction: Direction) -> Vec<Option<f64>> {
    let present: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(idx, value)| value.map(|v| (idx, v)))
        .collect();

    let mut scores = vec![None; values.len()];
    if present.is_empty() {
        return scores;
    }

    let mut distinct: Vec<f64> = present.iter().map(|(_, v)| *v).collect();
    distinct.sort_by(f64::total_cmp);
    distinct.dedup();
    if distinct.len() <= 1 {
        for (idx, _) in &present {
            scores[*idx] = Some(50.0);
        }
        return scores;
    }

    let mut ordered = present.clone();
    ordered.sort_by(|a, b| a.1.total_cmp(&b.1));

    let count = ordered.len() as f64;
    let mut start = 0;
    while start < ordered.len() {
        let mut end = start;
        while end + 1 < ordered.len() && ordered[end + 1].1 == ordered[start].1 {
            end += 1;
        }
        // ranks are 1-based; tied values share the average of their ranks
        let average_rank = (start + end + 2) as f64 / 2.0;
        let pct = average_rank / count;
        let score = match direction {
            Direction::HigherIsBetter => pct * 100.0,
            Direction::LowerIsBetter => (1.0 - pct) * 100.0,
        };
        for &(idx, _) in &ordered[start..=end] {
            scores[idx] = Some(score);
        }
        start = end + 1;
    }

    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_higher_is_better_ranks() {
        let values = vec![Some(10.0), Some(20.0), Some(30.0), Some(40.0)];
        let scores = percentile_scores(&values, Direction::HigherIsBetter);

        assert_eq!(scores[0], Some(25.0));
        assert_eq!(scores[1], Some(50.0));
        assert_eq!(scores[2], Some(75.0));
        assert_eq!(scores[3], Some(100.0));
    }

    #[test]
    fn test_lower_is_better_inverts() {
        let values = vec![Some(10.0), Some(20.0), Some(30.0), Some(40.0)];
        let scores = percentile_scores(&values, Direction::LowerIsBetter);

        assert_eq!(scores[0], Some(75.0));
        assert_eq!(scores[3], Some(0.0));
    }

    #[test]
    fn test_ties_share_average_rank() {
        let values = vec![Some(10.0), Some(10.0), Some(30.0), Some(40.0)];
        let scores = percentile_scores(&values, Direction::HigherIsBetter);

        // ranks 1 and 2 average to 1.5; pct = 1.5/4
        assert_eq!(scores[0], Some(37.5));
        assert_eq!(scores[1], Some(37.5));
        assert_eq!(scores[2], Some(75.0));
    }

    #[test]
    fn test_missing_values_stay_missing() {
        let values = vec![Some(10.0), None, Some(30.0)];
        let scores = percentile_scores(&values, Direction::HigherIsBetter);

        assert_eq!(scores[0], Some(50.0));
        assert_eq!(scores[1], None);
        assert_eq!(scores[2], Some(100.0));
    }

    #[test]
    fn test_degenerate_series_scores_neutral() {
        let values = vec![Some(5.0), Some(5.0), None];
        let scores = percentile_scores(&values, Direction::LowerIsBetter);

        assert_eq!(scores[0], Some(50.0));
        assert_eq!(scores[1], Some(50.0));
        assert_eq!(scores[2], None);
    }

    #[test]
    fn test_empty_column() {
        let values = vec![None, None];
        let scores = percentile_scores(&values, Direction::HigherIsBetter);
        assert_eq!(scores, vec![None, None]);
    }
}
