//! Component score assembly and the weighted overall ESG score.
//!
//! A component score is the unweighted mean of its non-missing sub-scores;
//! a component with no contributing sub-scores falls back to a declared
//! neutral default so the overall score is always computable for every
//! validated row. The overall weighting is a fixed reporting convention and
//! is never adjusted per dataset.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::info;

use crate::dataset::Table;
use crate::scoring::metrics::{Component, MetricSpec, default_metrics};
use crate::scoring::percentile::percentile_scores;
use crate::scoring::threshold::threshold_score;
use crate::scoring::utility::mean;

/// How component scores combine into the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Fixed cutoffs; each row is scored independently.
    #[default]
    Threshold,
    /// Peer-relative percentile ranks across the whole dataset.
    Percentile,
}

/// Component weights. The 0.5/0.3/0.2 split is a reporting convention.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub environment: f64,
    pub social: f64,
    pub governance: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            environment: 0.5,
            social: 0.3,
            governance: 0.2,
        }
    }
}

/// Categorical governance scoring for certification scheme labels.
/// Matching is case-insensitive substring, first entry wins.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CertificationLadder {
    pub schemes: Vec<(String, f64)>,
    /// Any named scheme not in the ladder.
    pub other_scheme_score: f64,
    /// Blank or "none".
    pub none_score: f64,
}

impl Default for CertificationLadder {
    fn default() -> Self {
        CertificationLadder {
            schemes: vec![
                ("organic".to_string(), 100.0),
                ("soil association".to_string(), 100.0),
                ("leaf".to_string(), 100.0),
                ("red tractor".to_string(), 80.0),
            ],
            other_scheme_score: 60.0,
            none_score: 40.0,
        }
    }
}

/// Full scoring configuration with documented placeholder defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: Weights,
    pub neutral_score: f64,
    pub metrics: Vec<MetricSpec>,
    pub certification: CertificationLadder,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            weights: Weights::default(),
            neutral_score: 50.0,
            metrics: default_metrics(),
            certification: CertificationLadder::default(),
        }
    }
}

/// Scores one certification label against the ladder.
pub fn certification_score(label: Option<&str>, ladder: &CertificationLadder) -> f64 {
    let Some(label) = label.map(str::trim).filter(|l| !l.is_empty()) else {
        return ladder.none_score;
    };
    let lowered = label.to_lowercase();
    if lowered == "none" {
        return ladder.none_score;
    }
    for (scheme, score) in &ladder.schemes {
        if lowered.contains(scheme.as_str()) {
            return *score;
        }
    }
    ladder.other_scheme_score
}

/// Appends `e_score`, `s_score`, `g_score` and `esg_score` columns.
///
/// Metric sub-scores come from the registry filtered to columns present in
/// the table; the governance component additionally takes a certification
/// sub-score when a `certification_scheme` column exists.
pub fn score_table(table: &mut Table, config: &ScoringConfig, strategy: Strategy) {
    let active: Vec<&MetricSpec> = config
        .metrics
        .iter()
        .filter(|metric| table.has_column(&metric.column))
        .filter(|metric| strategy == Strategy::Percentile || metric.cutoffs.is_some())
        .collect();

    let mut percentiles: HashMap<&str, Vec<Option<f64>>> = HashMap::new();
    if strategy == Strategy::Percentile {
        for metric in &active {
            percentiles.insert(
                metric.column.as_str(),
                percentile_scores(&table.column_numbers(&metric.column), metric.direction),
            );
        }
    }

    let has_certification = table.has_column("certification_scheme");

    let mut results = Vec::with_capacity(table.len());
    for (idx, row) in table.rows().iter().enumerate() {
        let mut environment = Vec::new();
        let mut social = Vec::new();
        let mut governance = Vec::new();

        for metric in &active {
            let sub_score = match strategy {
                Strategy::Threshold => row.number(&metric.column).map(|value| {
                    let cutoffs = metric.cutoffs.unwrap_or_default();
                    threshold_score(value, metric.direction, cutoffs)
                }),
                Strategy::Percentile => percentiles
                    .get(metric.column.as_str())
                    .and_then(|scores| scores[idx]),
            };
            if let Some(score) = sub_score {
                match metric.component {
                    Component::Environment => environment.push(score),
                    Component::Social => social.push(score),
                    Component::Governance => governance.push(score),
                }
            }
        }

        if has_certification {
            governance.push(certification_score(
                row.text("certification_scheme"),
                &config.certification,
            ));
        }

        let e_score = component_score(&environment, config.neutral_score);
        let s_score = component_score(&social, config.neutral_score);
        let g_score = component_score(&governance, config.neutral_score);
        let esg_score = (config.weights.environment * e_score
            + config.weights.social * s_score
            + config.weights.governance * g_score)
            .clamp(0.0, 100.0);

        results.push((e_score, s_score, g_score, esg_score));
    }

    table.add_column("e_score");
    table.add_column("s_score");
    table.add_column("g_score");
    table.add_column("esg_score");
    for (row, (e, s, g, esg)) in table.rows_mut().iter_mut().zip(results) {
        row.set_number("e_score", Some(e));
        row.set_number("s_score", Some(s));
        row.set_number("g_score", Some(g));
        row.set_number("esg_score", Some(esg));
    }

    info!(
        rows = table.len(),
        metrics = active.len(),
        strategy = ?strategy,
        "ESG scores computed"
    );
}

fn component_score(sub_scores: &[f64], neutral: f64) -> f64 {
    if sub_scores.is_empty() {
        neutral
    } else {
        mean(sub_scores).clamp(0.0, 100.0)
    }
}
