//! Per-record intensity metrics.
//!
//! Every derived ratio is declared once in [`RATIOS`] and computed with the
//! same safe-division policy: a zero, negative or missing denominator makes
//! the quotient missing, never zero, never infinity.

use tracing::debug;

use crate::dataset::Table;

/// One intensity ratio: `output = numerator / denominator * scale`.
/// A pairing is only computed when both source columns are present; each
/// pairing is independent of the others.
pub struct RatioSpec {
    pub output: &'static str,
    pub numerator: &'static str,
    pub denominator: &'static str,
    pub scale: f64,
}

const fn ratio(
    output: &'static str,
    numerator: &'static str,
    denominator: &'static str,
    scale: f64,
) -> RatioSpec {
    RatioSpec {
        output,
        numerator,
        denominator,
        scale,
    }
}

/// Intensity metrics derived from paired raw columns.
pub const RATIOS: &[RatioSpec] = &[
    ratio("yield_per_ha", "yield_tonnes", "area_ha", 1.0),
    ratio("n_per_ha", "fertilizer_n_kg", "area_ha", 1.0),
    ratio("p_per_ha", "fertilizer_p_kg", "area_ha", 1.0),
    ratio("k_per_ha", "fertilizer_k_kg", "area_ha", 1.0),
    ratio("chemical_per_ha", "chemical_kg", "area_ha", 1.0),
    ratio("water_per_tonne", "water_m3", "yield_tonnes", 1.0),
    ratio("labour_hours_per_ha", "labour_hours", "area_ha", 1.0),
    ratio("female_share", "workers_female", "workers_total", 1.0),
    ratio("accidents_per_100_workers", "accidents_count", "workers_total", 100.0),
    ratio("training_hours_per_worker", "training_hours", "workers_total", 1.0),
];

/// Divides with the missing-propagation policy: the quotient is missing
/// whenever the numerator is missing or the denominator is missing, zero,
/// or negative.
pub fn safe_div(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let n = numerator?;
    let d = denominator?;
    if d <= 0.0 {
        return None;
    }
    Some(n / d)
}

/// Adds every ratio from [`RATIOS`] whose source columns exist in the table.
pub fn derive_kpis(table: &mut Table) {
    let active: Vec<&RatioSpec> = RATIOS
        .iter()
        .filter(|spec| table.has_column(spec.numerator) && table.has_column(spec.denominator))
        .collect();

    for spec in &active {
        table.add_column(spec.output);
    }
    for row in table.rows_mut() {
        for spec in &active {
            let value = safe_div(row.number(spec.numerator), row.number(spec.denominator))
                .map(|v| v * spec.scale);
            row.set_number(spec.output, value);
        }
    }

    debug!(derived = active.len(), "Intensity metrics computed");
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
    fn test_safe_div_zero_denominator_is_missing() {
        assert_eq!(safe_div(Some(10.0), Some(0.0)), None);
        assert_eq!(safe_div(Some(10.0), Some(-1.0)), None);
        assert_eq!(safe_div(Some(10.0), None), None);
        assert_eq!(safe_div(None, Some(2.0)), None);
        assert_eq!(safe_div(Some(10.0), Some(4.0)), Some(2.5));
    }

    #[test]
    fn test_zero_area_yield_is_missing_not_zero() {
        let mut t = table(
            &["area_ha", "yield_tonnes"],
            vec![vec!["0", "10"], vec!["5", "10"]],
        );
        derive_kpis(&mut t);

        assert_eq!(t.rows()[0].number("yield_per_ha"), None);
        assert_eq!(t.rows()[1].number("yield_per_ha"), Some(2.0));
    }

    #[test]
    fn test_pairings_are_independent() {
        // No fertiliser columns at all: yield intensity still computed
        let mut t = table(&["area_ha", "yield_tonnes"], vec![vec!["4", "12"]]);
        derive_kpis(&mut t);

        assert_eq!(t.rows()[0].number("yield_per_ha"), Some(3.0));
        assert!(!t.has_column("n_per_ha"));
    }

    #[test]
    fn test_malformed_cell_affects_only_its_metric() {
        let mut t = table(
            &["area_ha", "yield_tonnes", "fertilizer_n_kg"],
            vec![vec!["5", "ten", "50"]],
        );
        derive_kpis(&mut t);

        assert_eq!(t.rows()[0].number("yield_per_ha"), None);
        assert_eq!(t.rows()[0].number("n_per_ha"), Some(10.0));
    }

    #[test]
    fn test_scaled_ratio() {
        let mut t = table(
            &["workers_total", "accidents_count"],
            vec![vec!["50", "2"]],
        );
        derive_kpis(&mut t);

        assert_eq!(t.rows()[0].number("accidents_per_100_workers"), Some(4.0));
    }
}
