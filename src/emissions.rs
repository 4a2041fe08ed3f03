//! Greenhouse-gas estimates from activity quantities.
//!
//! Each activity column is multiplied by a fixed emission factor into a
//! per-source column; the sources are then summed into `total_emissions`.
//! Factors are configuration passed in at call time, never module state.

use serde::Deserialize;
use tracing::debug;

use crate::dataset::Table;
use crate::kpi::safe_div;

/// Emission factors in kg CO2e per activity unit.
///
/// The defaults are the placeholder reference values used across the
/// reporting variants; they are not scientifically authoritative and are
/// expected to be overridden from configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmissionFactors {
    /// kg CO2e per kg of nitrogen fertilizer.
    pub nitrogen: f64,
    /// kg CO2e per litre of diesel.
    pub diesel: f64,
    /// kg CO2e per kWh of electricity.
    pub electricity: f64,
    /// kg CO2e per head of livestock per year.
    pub livestock: f64,
}

impl Default for EmissionFactors {
    fn default() -> Self {
        EmissionFactors {
            nitrogen: 5.5,
            diesel: 2.7,
            electricity: 0.5,
            livestock: 3000.0,
        }
    }
}

struct Source {
    output: &'static str,
    activity: &'static str,
    factor: f64,
}

/// Adds per-source emissions columns, `total_emissions`, and the emissions
/// intensity columns. Sources whose activity column is absent are excluded
/// from the sum; a missing activity cell makes that row's source and total
/// missing rather than counting as zero.
pub fn apply_emission_factors(table: &mut Table, factors: &EmissionFactors) {
    let sources = [
        Source {
            output: "emissions_fertilizer",
            activity: "fertilizer_n_kg",
            factor: factors.nitrogen,
        },
        Source {
            output: "emissions_diesel",
            activity: "diesel_litres",
            factor: factors.diesel,
        },
        Source {
            output: "emissions_electricity",
            activity: "electricity_kwh",
            factor: factors.electricity,
        },
        Source {
            output: "emissions_livestock",
            activity: "livestock_head",
            factor: factors.livestock,
        },
    ];

    let active: Vec<&Source> = sources
        .iter()
        .filter(|source| table.has_column(source.activity))
        .collect();
    if active.is_empty() {
        return;
    }

    for source in &active {
        table.add_column(source.output);
    }
    table.add_column("total_emissions");

    let has_area = table.has_column("area_ha");
    let has_yield = table.has_column("yield_tonnes");
    if has_area {
        table.add_column("emissions_per_ha");
    }
    if has_yield {
        table.add_column("emissions_per_tonne");
    }

    for row in table.rows_mut() {
        let mut total = Some(0.0);
        for source in &active {
            let value = row.number(source.activity).map(|v| v * source.factor);
            row.set_number(source.output, value);
            total = match (total, value) {
                (Some(acc), Some(v)) => Some(acc + v),
                _ => None,
            };
        }
        row.set_number("total_emissions", total);

        if has_area {
            row.set_number("emissions_per_ha", safe_div(total, row.number("area_ha")));
        }
        if has_yield {
            row.set_number(
                "emissions_per_tonne",
                safe_div(total, row.number("yield_tonnes")),
            );
        }
    }

    debug!(sources = active.len(), "Emissions computed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Cell, Row};

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
    fn test_total_is_sum_of_sources() {
        let mut t = table(
            &["area_ha", "fertilizer_n_kg", "diesel_litres", "electricity_kwh"],
            vec![vec!["10", "100", "50", "200"]],
        );
        apply_emission_factors(&mut t, &EmissionFactors::default());

        let row = &t.rows()[0];
        assert_eq!(row.number("emissions_fertilizer"), Some(550.0));
        assert_eq!(row.number("emissions_diesel"), Some(135.0));
        assert_eq!(row.number("emissions_electricity"), Some(100.0));

        // Round-trip: the per-source columns sum back to the total exactly
        let sum = row.number("emissions_fertilizer").unwrap()
            + row.number("emissions_diesel").unwrap()
            + row.number("emissions_electricity").unwrap();
        assert_eq!(row.number("total_emissions"), Some(sum));
        assert_eq!(row.number("emissions_per_ha"), Some(sum / 10.0));
    }

    #[test]
    fn test_factors_are_configuration() {
        let factors = EmissionFactors {
            nitrogen: 6.0,
            ..EmissionFactors::default()
        };
        let mut t = table(&["fertilizer_n_kg", "diesel_litres"], vec![vec!["10", "0"]]);
        apply_emission_factors(&mut t, &factors);

        assert_eq!(t.rows()[0].number("emissions_fertilizer"), Some(60.0));
    }

    #[test]
    fn test_missing_activity_cell_makes_total_missing() {
        let mut t = table(
            &["fertilizer_n_kg", "diesel_litres"],
            vec![vec!["", "50"], vec!["100", "50"]],
        );
        apply_emission_factors(&mut t, &EmissionFactors::default());

        assert_eq!(t.rows()[0].number("emissions_fertilizer"), None);
        assert_eq!(t.rows()[0].number("total_emissions"), None);
        assert_eq!(t.rows()[1].number("total_emissions"), Some(550.0 + 135.0));
    }

    #[test]
    fn test_absent_source_column_is_excluded() {
        let mut t = table(&["fertilizer_n_kg"], vec![vec!["100"]]);
        apply_emission_factors(&mut t, &EmissionFactors::default());

        assert!(!t.has_column("emissions_diesel"));
        assert_eq!(t.rows()[0].number("total_emissions"), Some(550.0));
    }

    #[test]
    fn test_livestock_source() {
        let mut t = table(
            &["fertilizer_n_kg", "livestock_head"],
            vec![vec!["0", "2"]],
        );
        apply_emission_factors(&mut t, &EmissionFactors::default());

        assert_eq!(t.rows()[0].number("emissions_livestock"), Some(6000.0));
        assert_eq!(t.rows()[0].number("total_emissions"), Some(6000.0));
    }

    #[test]
    fn test_zero_area_intensity_is_missing() {
        let mut t = table(
            &["area_ha", "fertilizer_n_kg", "diesel_litres"],
            vec![vec!["0", "100", "50"]],
        );
        apply_emission_factors(&mut t, &EmissionFactors::default());

        assert!(t.rows()[0].number("total_emissions").is_some());
        assert_eq!(t.rows()[0].number("emissions_per_ha"), None);
    }
}
