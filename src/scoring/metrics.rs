//! Declarative metric registry.
//!
//! Every sub-score the engine can produce is declared here as data rather
//! than as column-sniffing branches inside the scoring functions. The engine
//! iterates the registry and keeps only the metrics whose column is present
//! in the table being scored.

use serde::Deserialize;

/// ESG component a metric contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    Environment,
    Social,
    Governance,
}

/// Whether a larger raw value is desirable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

/// One scoreable metric. Cutoffs are `[excellent, good, moderate, poor]`;
/// metrics without cutoffs are dataset-relative and only participate in the
/// percentile strategy.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricSpec {
    pub column: String,
    pub component: Component,
    pub direction: Direction,
    #[serde(default)]
    pub cutoffs: Option<[f64; 4]>,
}

fn metric(
    column: &str,
    component: Component,
    direction: Direction,
    cutoffs: Option<[f64; 4]>,
) -> MetricSpec {
    MetricSpec {
        column: column.to_string(),
        component,
        direction,
        cutoffs,
    }
}

/// The default registry. The cutoff values are documented placeholder
/// configuration, not validated agronomy.
pub fn default_metrics() -> Vec<MetricSpec> {
    use Component::*;
    use Direction::*;

    vec![
        metric("emissions_per_ha", Environment, LowerIsBetter, Some([300.0, 450.0, 600.0, 800.0])),
        metric("emissions_per_tonne", Environment, LowerIsBetter, Some([150.0, 250.0, 400.0, 600.0])),
        metric("n_per_ha", Environment, LowerIsBetter, Some([50.0, 100.0, 150.0, 200.0])),
        metric("chemical_per_ha", Environment, LowerIsBetter, Some([1.0, 2.0, 4.0, 8.0])),
        metric("water_per_tonne", Environment, LowerIsBetter, Some([50.0, 100.0, 200.0, 400.0])),
        metric("pesticide_use_rate", Environment, LowerIsBetter, Some([0.15, 0.35, 0.60, 0.85])),
        metric("soil_organic_matter_pct", Environment, HigherIsBetter, Some([6.0, 4.0, 3.0, 2.0])),
        metric("cover_crop_rate", Environment, HigherIsBetter, Some([0.75, 0.50, 0.25, 0.10])),
        metric("soil_test_rate", Environment, HigherIsBetter, Some([0.90, 0.70, 0.50, 0.25])),
        metric("hedgerow_length_m", Environment, HigherIsBetter, None),
        metric("trees_planted_count", Environment, HigherIsBetter, None),
        metric("female_share", Social, HigherIsBetter, Some([0.40, 0.30, 0.20, 0.10])),
        metric("accidents_per_100_workers", Social, LowerIsBetter, Some([0.0, 5.0, 10.0, 15.0])),
        metric("training_hours_per_worker", Social, HigherIsBetter, Some([20.0, 10.0, 5.0, 2.0])),
        metric("labour_hours_per_ha", Social, HigherIsBetter, None),
        metric("safety_training_rate", Social, HigherIsBetter, Some([0.90, 0.70, 0.50, 0.25])),
        metric("contract_rate", Social, HigherIsBetter, Some([0.95, 0.80, 0.60, 0.30])),
        metric("sfi_soil_compliance_rate", Governance, HigherIsBetter, Some([0.90, 0.70, 0.50, 0.25])),
        metric("sfi_nutrient_compliance_rate", Governance, HigherIsBetter, Some([0.90, 0.70, 0.50, 0.25])),
        metric("sfi_hedgerow_compliance_rate", Governance, HigherIsBetter, Some([0.90, 0.70, 0.50, 0.25])),
        metric("reduced_tillage_rate", Governance, HigherIsBetter, Some([0.75, 0.50, 0.25, 0.10])),
        metric("ipm_rate", Governance, HigherIsBetter, Some([0.75, 0.50, 0.25, 0.10])),
    ]
}
