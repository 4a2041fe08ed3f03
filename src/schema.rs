//! Granularity profiles and dataset schema validation.
//!
//! A profile declares which columns a dataset must carry before any scoring
//! happens, and which optional columns unlock richer sub-scores. Validation
//! reports every absent required column at once; optional columns are a soft
//! condition and never an error.

use std::fmt;

use tracing::info;

use crate::dataset::{DatasetError, Table};

/// A column the engine knows about: internal name plus the human-readable
/// header it may appear under in uploaded files.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub label: &'static str,
}

const fn col(name: &'static str, label: &'static str) -> ColumnSpec {
    ColumnSpec { name, label }
}

/// Data granularity of one uploaded dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// One row per farm-year.
    Farm,
    /// One row per farm-year-enterprise (or crop within an enterprise).
    EnterpriseCrop,
    /// One row per organisation-year, pre-aggregated by an SME.
    Sme,
    /// One row per field-month; rolled up to farm-year before scoring.
    FieldMonth,
}

const FARM_REQUIRED: &[ColumnSpec] = &[
    col("organisation_name", "Organisation Name"),
    col("farm_id", "Farm ID"),
    col("country", "Country"),
    col("year", "Year"),
    col("crop", "Crop"),
    col("area_ha", "Area (hectares)"),
    col("yield_tonnes", "Yield (tonnes)"),
    col("fertilizer_n_kg", "Nitrogen Fertilizer (kg N)"),
    col("diesel_litres", "Diesel Used (litres)"),
    col("electricity_kwh", "Electricity (kWh)"),
    col("water_m3", "Water Used (m3)"),
    col("workers_total", "Workers Total"),
    col("workers_female", "Workers Female"),
    col("accidents_count", "Accidents Count"),
];

const FARM_OPTIONAL: &[ColumnSpec] = &[
    col("fertilizer_p_kg", "Phosphate Fertilizer (kg P2O5)"),
    col("fertilizer_k_kg", "Potash Fertilizer (kg K2O)"),
    col("chemical_kg", "Crop Protection Products (kg)"),
    col("labour_hours", "Labour Hours"),
    col("livestock_head", "Livestock (head)"),
    col("training_hours", "Training Hours"),
    col("soil_organic_matter_pct", "Soil Organic Matter (%)"),
    col("certification_scheme", "Certification Scheme"),
];

const ENTERPRISE_REQUIRED: &[ColumnSpec] = &[
    col("organisation_name", "Organisation Name"),
    col("farm_id", "Farm ID"),
    col("enterprise", "Enterprise"),
    col("country", "Country"),
    col("year", "Year"),
    col("crop", "Crop"),
    col("area_ha", "Area (hectares)"),
    col("yield_tonnes", "Yield (tonnes)"),
    col("fertilizer_n_kg", "Nitrogen Fertilizer (kg N)"),
    col("diesel_litres", "Diesel Used (litres)"),
    col("electricity_kwh", "Electricity (kWh)"),
    col("water_m3", "Water Used (m3)"),
    col("workers_total", "Workers Total"),
    col("workers_female", "Workers Female"),
    col("accidents_count", "Accidents Count"),
];

const SME_REQUIRED: &[ColumnSpec] = &[
    col("organisation_name", "Organisation Name"),
    col("year", "Year"),
    col("area_ha", "Area (hectares)"),
    col("yield_tonnes", "Yield (tonnes)"),
    col("fertilizer_n_kg", "Nitrogen Fertilizer (kg N)"),
    col("diesel_litres", "Diesel Used (litres)"),
    col("electricity_kwh", "Electricity (kWh)"),
    col("workers_total", "Workers Total"),
    col("workers_female", "Workers Female"),
    col("accidents_count", "Accidents Count"),
];

const SME_OPTIONAL: &[ColumnSpec] = &[
    col("water_m3", "Water Used (m3)"),
    col("chemical_kg", "Crop Protection Products (kg)"),
    col("labour_hours", "Labour Hours"),
    col("livestock_head", "Livestock (head)"),
    col("training_hours", "Training Hours"),
    col("certification_scheme", "Certification Scheme"),
];

const FIELD_MONTH_REQUIRED: &[ColumnSpec] = &[
    col("farm_id", "Farm ID"),
    col("farm_name", "Farm Name"),
    col("year", "Year"),
    col("month", "Month"),
    col("field_id", "Field ID"),
    col("crop", "Crop Type"),
    col("area_ha", "Field Area (hectares)"),
    col("fertilizer_n_kg", "Nitrogen Fertilizer (kg N)"),
    col("diesel_litres", "Diesel Used (litres)"),
    col("pesticide_applied", "Pesticide Applied (yes/no)"),
    col("irrigation_applied", "Irrigation Applied (yes/no)"),
    col("livestock_present", "Livestock Present (yes/no)"),
    col("sfi_soil_standard", "SFI Soil Standard (yes/no)"),
    col("sfi_nutrient_management", "SFI Nutrient Management (yes/no)"),
    col("sfi_hedgerows", "SFI Hedgerows (yes/no)"),
];

const FIELD_MONTH_OPTIONAL: &[ColumnSpec] = &[
    col("yield_tonnes", "Yield (tonnes)"),
    col("fertilizer_p_kg", "Phosphate Fertilizer (kg P2O5)"),
    col("fertilizer_k_kg", "Potash Fertilizer (kg K2O)"),
    col("chemical_kg", "Crop Protection Products (kg)"),
    col("labour_hours", "Labour Hours"),
    col("water_m3", "Water Used (m3)"),
    col("electricity_kwh", "Electricity (kWh)"),
    col("soil_organic_matter_pct", "Soil Organic Matter (%)"),
    col("soil_ph", "Soil pH"),
    col("hedgerow_length_m", "Hedgerow Length (meters)"),
    col("wildflower_area_ha", "Wildflower Area (hectares)"),
    col("buffer_strip_area_ha", "Buffer Strip Area (hectares)"),
    col("trees_planted_count", "Trees Planted Count"),
    col("cover_crop_planted", "Cover Crop Planted (yes/no)"),
    col("reduced_tillage", "Reduced Tillage (yes/no)"),
    col("integrated_pest_management", "Integrated Pest Management (yes/no)"),
    col("labour_hs_training_done", "Health & Safety Training (yes/no)"),
    col("worker_contracts_formalised", "Worker Contracts Formalised (yes/no)"),
    col("soil_test_conducted", "Soil Test Conducted (yes/no)"),
];

impl Profile {
    pub fn required_columns(&self) -> &'static [ColumnSpec] {
        match self {
            Profile::Farm => FARM_REQUIRED,
            Profile::EnterpriseCrop => ENTERPRISE_REQUIRED,
            Profile::Sme => SME_REQUIRED,
            Profile::FieldMonth => FIELD_MONTH_REQUIRED,
        }
    }

    pub fn optional_columns(&self) -> &'static [ColumnSpec] {
        match self {
            Profile::Farm | Profile::EnterpriseCrop => FARM_OPTIONAL,
            Profile::Sme => SME_OPTIONAL,
            Profile::FieldMonth => FIELD_MONTH_OPTIONAL,
        }
    }

    /// Guesses the granularity from which identifying columns are present.
    pub fn infer(table: &Table) -> Profile {
        if table.has_column("field_id") && table.has_column("month") {
            Profile::FieldMonth
        } else if table.has_column("enterprise") {
            Profile::EnterpriseCrop
        } else if table.has_column("farm_id") {
            Profile::Farm
        } else {
            Profile::Sme
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Farm => "farm",
            Profile::EnterpriseCrop => "enterprise-crop",
            Profile::Sme => "sme",
            Profile::FieldMonth => "field-month",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renames incoming headers that exactly match a known human-readable label
/// to the engine's internal column name. Matching is case-sensitive.
pub fn remap_headers(table: &mut Table, profile: Profile) {
    for spec in profile
        .required_columns()
        .iter()
        .chain(profile.optional_columns())
    {
        if table.has_column(spec.label) && !table.has_column(spec.name) {
            table.rename_column(spec.label, spec.name);
        }
    }
}

/// Returns the required columns absent from the table, in declaration order.
pub fn missing_columns<'a>(table: &Table, required: &'a [ColumnSpec]) -> Vec<&'a ColumnSpec> {
    required
        .iter()
        .filter(|spec| !table.has_column(spec.name))
        .collect()
}

/// Validates the table against a profile, failing with the complete list of
/// absent required columns. Optional columns are reported only as a log line.
pub fn validate(table: &Table, profile: Profile) -> Result<(), DatasetError> {
    let missing = missing_columns(table, profile.required_columns());
    if !missing.is_empty() {
        return Err(DatasetError::MissingColumns(
            missing
                .iter()
                .map(|spec| format!("{} ({})", spec.name, spec.label))
                .collect(),
        ));
    }

    let present_optional = profile
        .optional_columns()
        .iter()
        .filter(|spec| table.has_column(spec.name))
        .count();
    info!(
        profile = %profile,
        rows = table.len(),
        optional_present = present_optional,
        "Dataset validated"
    );
    Ok(())
}
