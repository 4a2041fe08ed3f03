//! Field-month to farm-year rollup.
//!
//! Extensive quantities (areas, totals, counts) are summed; intensity and
//! rate quantities are averaged unweighted across sub-records; yes/no
//! practice flags become compliance-rate fractions in [0, 1]. Columns absent
//! from the input are omitted from the output. Sums and means skip missing
//! cells; a group with no contributing cells aggregates to missing, never
//! to zero.

use std::collections::{BTreeMap, HashMap};

use tracing::{info, warn};

use crate::dataset::{Cell, Row, Table};
use crate::scoring::utility::mean;

#[derive(Clone, Copy, PartialEq)]
enum AggOp {
    /// Extensive quantity: summed across sub-records.
    Sum,
    /// Intensity or rate: unweighted mean across sub-records.
    Mean,
    /// Yes/no flag: converted to 0/1 then averaged into a fraction.
    Rate,
}

struct AggSpec {
    source: &'static str,
    output: &'static str,
    op: AggOp,
}

const fn agg(source: &'static str, output: &'static str, op: AggOp) -> AggSpec {
    AggSpec { source, output, op }
}

/// Aggregated columns in output order. Only those whose source column is
/// present in the input participate.
const AGG_COLUMNS: &[AggSpec] = &[
    agg("area_ha", "area_ha", AggOp::Sum),
    agg("yield_tonnes", "yield_tonnes", AggOp::Sum),
    agg("water_m3", "water_m3", AggOp::Sum),
    agg("electricity_kwh", "electricity_kwh", AggOp::Sum),
    agg("labour_hours", "labour_hours", AggOp::Sum),
    agg("total_emissions", "total_emissions", AggOp::Sum),
    agg("emissions_fertilizer", "emissions_fertilizer", AggOp::Sum),
    agg("emissions_diesel", "emissions_diesel", AggOp::Sum),
    agg("emissions_electricity", "emissions_electricity", AggOp::Sum),
    agg("emissions_livestock", "emissions_livestock", AggOp::Sum),
    agg("hedgerow_length_m", "hedgerow_length_m", AggOp::Sum),
    agg("wildflower_area_ha", "wildflower_area_ha", AggOp::Sum),
    agg("buffer_strip_area_ha", "buffer_strip_area_ha", AggOp::Sum),
    agg("trees_planted_count", "trees_planted_count", AggOp::Sum),
    agg("n_per_ha", "n_per_ha", AggOp::Mean),
    agg("p_per_ha", "p_per_ha", AggOp::Mean),
    agg("k_per_ha", "k_per_ha", AggOp::Mean),
    agg("chemical_per_ha", "chemical_per_ha", AggOp::Mean),
    agg("emissions_per_ha", "emissions_per_ha", AggOp::Mean),
    agg("labour_hours_per_ha", "labour_hours_per_ha", AggOp::Mean),
    agg("soil_organic_matter_pct", "soil_organic_matter_pct", AggOp::Mean),
    agg("soil_ph", "soil_ph", AggOp::Mean),
    agg("pesticide_applied", "pesticide_use_rate", AggOp::Rate),
    agg("irrigation_applied", "irrigation_rate", AggOp::Rate),
    agg("livestock_present", "livestock_presence_rate", AggOp::Rate),
    agg("sfi_soil_standard", "sfi_soil_compliance_rate", AggOp::Rate),
    agg("sfi_nutrient_management", "sfi_nutrient_compliance_rate", AggOp::Rate),
    agg("sfi_hedgerows", "sfi_hedgerow_compliance_rate", AggOp::Rate),
    agg("cover_crop_planted", "cover_crop_rate", AggOp::Rate),
    agg("reduced_tillage", "reduced_tillage_rate", AggOp::Rate),
    agg("integrated_pest_management", "ipm_rate", AggOp::Rate),
    agg("labour_hs_training_done", "safety_training_rate", AggOp::Rate),
    agg("worker_contracts_formalised", "contract_rate", AggOp::Rate),
    agg("soil_test_conducted", "soil_test_rate", AggOp::Rate),
];

struct Group {
    farm_name: Option<String>,
    series: HashMap<&'static str, Vec<Option<f64>>>,
}

/// Rolls sub-records sharing a (farm_id, year) key into one row per key,
/// ordered by key. Rows without a farm identifier or year cannot be grouped
/// and are dropped with a warning.
pub fn aggregate_to_farm(table: &Table) -> Table {
    let active: Vec<&AggSpec> = AGG_COLUMNS
        .iter()
        .filter(|spec| table.has_column(spec.source))
        .collect();
    let has_farm_name = table.has_column("farm_name");

    let mut groups: BTreeMap<(String, i64), Group> = BTreeMap::new();
    let mut dropped = 0usize;

    for row in table.rows() {
        let farm_id = identifier(row.get("farm_id"));
        let year = row.number("year").map(|y| y as i64);
        let (Some(farm_id), Some(year)) = (farm_id, year) else {
            dropped += 1;
            continue;
        };

        let group = groups.entry((farm_id, year)).or_insert_with(|| Group {
            farm_name: None,
            series: HashMap::new(),
        });
        if group.farm_name.is_none() {
            group.farm_name = row.text("farm_name").map(str::to_string);
        }
        for spec in &active {
            let value = match spec.op {
                AggOp::Rate => row.flag(spec.source).map(|b| if b { 1.0 } else { 0.0 }),
                _ => row.number(spec.source),
            };
            group.series.entry(spec.source).or_default().push(value);
        }
    }

    if dropped > 0 {
        warn!(dropped, "Rows without a (farm_id, year) key were skipped");
    }

    let mut columns = vec!["farm_id".to_string()];
    if has_farm_name {
        columns.push("farm_name".to_string());
    }
    columns.push("year".to_string());
    columns.extend(active.iter().map(|spec| spec.output.to_string()));

    let mut output = Table::new(columns);
    for ((farm_id, year), group) in groups {
        let mut row = Row::default();
        row.set("farm_id", Cell::Text(farm_id));
        if has_farm_name {
            let cell = match group.farm_name {
                Some(name) => Cell::Text(name),
                None => Cell::Empty,
            };
            row.set("farm_name", cell);
        }
        row.set("year", Cell::Number(year as f64));

        for spec in &active {
            let values: Vec<f64> = group
                .series
                .get(spec.source)
                .map(|series| series.iter().flatten().copied().collect())
                .unwrap_or_default();
            let aggregated = if values.is_empty() {
                None
            } else {
                match spec.op {
                    AggOp::Sum => Some(values.iter().sum()),
                    AggOp::Mean | AggOp::Rate => Some(mean(&values)),
                }
            };
            row.set_number(spec.output, aggregated);
        }
        output.push_row(row);
    }

    info!(
        input_rows = table.len(),
        farms = output.len(),
        "Aggregated to farm level"
    );
    output
}

/// Group keys may arrive as text or as numeric codes; numeric farm ids are
/// formatted without a trailing fraction.
fn identifier(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Text(s) => Some(s.clone()),
        Cell::Number(v) if v.fract() == 0.0 => Some(format!("{}", *v as i64)),
        Cell::Number(v) => Some(format!("{v}")),
        Cell::Empty => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Cell;

    fn table(columns: &[&str], rows: Vec<Vec<&str>>) -> Table {
        let mut table = Table::new(columns.iter().map(|c| c.to_string()).collect());
        for values in rows {
            let mut row = Row::default();
            for (column, value) in columns.iter().zip(values) {
                row.set(column, Cell::parse(value));
            }
            table.push_row(row);
        }
        table
    }

    #[test]
    fn test_sums_and_unweighted_means() {
        let t = table(
            &["farm_id", "year", "area_ha", "total_emissions", "emissions_per_ha"],
            vec![
                vec!["F1", "2025", "10", "100", "10"],
                vec!["F1", "2025", "20", "300", "15"],
            ],
        );
        let farm = aggregate_to_farm(&t);

        assert_eq!(farm.len(), 1);
        let row = &farm.rows()[0];
        assert_eq!(row.number("area_ha"), Some(30.0));
        assert_eq!(row.number("total_emissions"), Some(400.0));
        // intensity is the unweighted mean of sub-records, not total/total
        assert_eq!(row.number("emissions_per_ha"), Some(12.5));
    }

    #[test]
    fn test_flags_become_rate_fractions() {
        let t = table(
            &["farm_id", "year", "sfi_soil_standard"],
            vec![
                vec!["F1", "2025", "yes"],
                vec!["F1", "2025", "No"],
                vec!["F1", "2025", "TRUE"],
                vec!["F1", "2025", "1"],
            ],
        );
        let farm = aggregate_to_farm(&t);

        assert_eq!(farm.rows()[0].number("sfi_soil_compliance_rate"), Some(0.75));
    }

    #[test]
    fn test_unparseable_flag_excluded_from_rate() {
        let t = table(
            &["farm_id", "year", "pesticide_applied"],
            vec![
                vec!["F1", "2025", "yes"],
                vec!["F1", "2025", "maybe"],
                vec!["F1", "2025", "no"],
            ],
        );
        let farm = aggregate_to_farm(&t);

        assert_eq!(farm.rows()[0].number("pesticide_use_rate"), Some(0.5));
    }

    #[test]
    fn test_absent_columns_are_omitted() {
        let t = table(
            &["farm_id", "year", "area_ha"],
            vec![vec!["F1", "2025", "10"]],
        );
        let farm = aggregate_to_farm(&t);

        assert!(farm.has_column("area_ha"));
        assert!(!farm.has_column("yield_tonnes"));
        assert!(!farm.has_column("pesticide_use_rate"));
    }

    #[test]
    fn test_all_missing_aggregates_to_missing() {
        let t = table(
            &["farm_id", "year", "yield_tonnes"],
            vec![vec!["F1", "2025", ""], vec!["F1", "2025", ""]],
        );
        let farm = aggregate_to_farm(&t);

        assert_eq!(farm.rows()[0].number("yield_tonnes"), None);
    }

    #[test]
    fn test_groups_by_farm_and_year() {
        let t = table(
            &["farm_id", "year", "area_ha"],
            vec![
                vec!["F2", "2025", "1"],
                vec!["F1", "2025", "2"],
                vec!["F1", "2024", "3"],
            ],
        );
        let farm = aggregate_to_farm(&t);

        assert_eq!(farm.len(), 3);
        // ordered by (farm_id, year)
        assert_eq!(farm.rows()[0].text("farm_id"), Some("F1"));
        assert_eq!(farm.rows()[0].number("year"), Some(2024.0));
        assert_eq!(farm.rows()[2].text("farm_id"), Some("F2"));
    }

    #[test]
    fn test_rows_without_key_are_dropped() {
        let t = table(
            &["farm_id", "year", "area_ha"],
            vec![vec!["F1", "2025", "5"], vec!["", "2025", "7"]],
        );
        let farm = aggregate_to_farm(&t);

        assert_eq!(farm.len(), 1);
        assert_eq!(farm.rows()[0].number("area_ha"), Some(5.0));
    }

    #[test]
    fn test_first_seen_farm_name_is_kept() {
        let t = table(
            &["farm_id", "farm_name", "year", "area_ha"],
            vec![
                vec!["F1", "Green Valley", "2025", "5"],
                vec!["F1", "Green Valley Farm", "2025", "6"],
            ],
        );
        let farm = aggregate_to_farm(&t);

        assert_eq!(farm.rows()[0].text("farm_name"), Some("Green Valley"));
    }
}
