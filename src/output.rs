//! Output formatting and persistence for scored datasets.
//!
//! Supports CSV export of the result table and a compact JSON summary of
//! per-record scores for downstream presentation code.

use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::dataset::Table;
use crate::scoring::grade::rating;

/// Writes the result table as CSV, headers first, missing cells empty.
pub fn write_table_csv(path: &Path, table: &Table) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().from_path(path)?;

    writer.write_record(table.columns())?;
    for row in table.rows() {
        let record: Vec<String> = table
            .columns()
            .iter()
            .map(|column| row.get(column).render())
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = table.len(), "Result table written");
    Ok(())
}

/// One record's scores in the JSON summary.
#[derive(Debug, Serialize)]
pub struct SummaryEntry {
    pub id: Option<String>,
    pub year: Option<i64>,
    pub e_score: Option<f64>,
    pub s_score: Option<f64>,
    pub g_score: Option<f64>,
    pub esg_score: Option<f64>,
    pub rating: Option<String>,
}

/// Portfolio-level summary of a scored dataset.
#[derive(Debug, Serialize)]
pub struct ScoreSummary {
    pub generated_at: DateTime<Utc>,
    pub record_count: usize,
    pub records: Vec<SummaryEntry>,
}

/// Builds the summary from a scored result table. The record id prefers the
/// farm identifier and falls back to the organisation name for SME rows.
pub fn build_summary(table: &Table) -> ScoreSummary {
    let records = table
        .rows()
        .iter()
        .map(|row| {
            let id = non_empty(row.get("farm_id").render())
                .or_else(|| non_empty(row.get("organisation_name").render()));
            let esg_score = row.number("esg_score");
            SummaryEntry {
                id,
                year: row.number("year").map(|y| y as i64),
                e_score: row.number("e_score"),
                s_score: row.number("s_score"),
                g_score: row.number("g_score"),
                esg_score,
                rating: esg_score.map(rating),
            }
        })
        .collect();

    ScoreSummary {
        generated_at: Utc::now(),
        record_count: table.len(),
        records,
    }
}

/// Writes the JSON summary to disk, pretty-printed.
pub fn write_summary(path: &Path, summary: &ScoreSummary) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(summary)?)?;
    info!(path = %path.display(), records = summary.record_count, "Summary written");
    Ok(())
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
