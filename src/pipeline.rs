//! End-to-end dataset processing.
//!
//! Stages run strictly in sequence over the in-memory table: header remap →
//! schema validation → intensity KPIs → emissions → farm-level rollup (for
//! field-month datasets) → ESG scoring. A structural validation failure
//! halts everything before any derivation happens.

use tracing::info;

use crate::dataset::{DatasetError, Table};
use crate::emissions::{EmissionFactors, apply_emission_factors};
use crate::kpi::derive_kpis;
use crate::schema::{self, Profile};
use crate::scoring::aggregate::aggregate_to_farm;
use crate::scoring::engine::{ScoringConfig, Strategy, score_table};

/// Configuration for one pipeline run. Everything has documented defaults
/// and can be overridden without touching calculation code.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub factors: EmissionFactors,
    pub scoring: ScoringConfig,
    pub strategy: Strategy,
}

/// Runs the full pipeline, returning the augmented result table.
#[tracing::instrument(skip(table, options), fields(profile = %profile))]
pub fn process_dataset(
    mut table: Table,
    profile: Profile,
    options: &PipelineOptions,
) -> Result<Table, DatasetError> {
    schema::remap_headers(&mut table, profile);
    schema::validate(&table, profile)?;

    derive_kpis(&mut table);
    apply_emission_factors(&mut table, &options.factors);

    let mut table = if profile == Profile::FieldMonth {
        aggregate_to_farm(&table)
    } else {
        table
    };

    score_table(&mut table, &options.scoring, options.strategy);

    info!(rows = table.len(), "Pipeline complete");
    Ok(table)
}
