//! In-memory tabular dataset model.
//!
//! A [`Table`] is the working artifact every pipeline stage reads and
//! extends. Cells are explicitly three-state: numeric, text, or missing.
//! Numeric reads of non-numeric cells yield `None`, so a bad cell never
//! poisons a whole dataset.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

/// Errors surfaced while loading or validating a dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Structural error: processing must halt, all names reported at once.
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("dataset has no header row")]
    NoHeader,
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single cell value. "Missing" is first-class, never a NaN sentinel.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    /// Parses one raw CSV field. Blank fields are missing; anything that is
    /// not a finite number is kept as text.
    pub fn parse(raw: &str) -> Cell {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Cell::Number(v),
            _ => Cell::Text(trimmed.to_string()),
        }
    }

    pub fn number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Renders the cell for CSV output; missing cells render empty.
    pub fn render(&self) -> String {
        match self {
            Cell::Number(v) => format!("{v}"),
            Cell::Text(s) => s.clone(),
            Cell::Empty => String::new(),
        }
    }

    /// Interprets a yes/no practice flag. "yes"/"true"/"1" are true and
    /// "no"/"false"/"0" are false, case-insensitively; anything else is
    /// missing rather than silently counted as no.
    pub fn flag(&self) -> Option<bool> {
        match self {
            Cell::Number(v) if *v == 1.0 => Some(true),
            Cell::Number(v) if *v == 0.0 => Some(false),
            Cell::Text(s) => match s.to_ascii_lowercase().as_str() {
                "yes" | "true" => Some(true),
                "no" | "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

/// One record of the working table, keyed by column name.
#[derive(Debug, Clone, Default)]
pub struct Row {
    cells: HashMap<String, Cell>,
}

static EMPTY: Cell = Cell::Empty;

impl Row {
    pub fn get(&self, column: &str) -> &Cell {
        self.cells.get(column).unwrap_or(&EMPTY)
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).number()
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).text()
    }

    pub fn flag(&self, column: &str) -> Option<bool> {
        self.get(column).flag()
    }

    pub fn set(&mut self, column: &str, cell: Cell) {
        self.cells.insert(column.to_string(), cell);
    }

    /// Writes a derived numeric value; `None` stores an explicit missing cell.
    pub fn set_number(&mut self, column: &str, value: Option<f64>) {
        let cell = match value {
            Some(v) => Cell::Number(v),
            None => Cell::Empty,
        };
        self.set(column, cell);
    }

    fn rename(&mut self, from: &str, to: &str) {
        if let Some(cell) = self.cells.remove(from) {
            self.cells.insert(to.to_string(), cell);
        }
    }
}

/// An ordered set of columns plus rows. Stages append derived columns in
/// place; rows are never removed once loaded.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Table {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Registers a column if it is not already present.
    pub fn add_column(&mut self, name: &str) {
        if !self.has_column(name) {
            self.columns.push(name.to_string());
        }
    }

    /// Renames a column, rewriting every row's key. No-op when absent.
    pub fn rename_column(&mut self, from: &str, to: &str) {
        let Some(position) = self.columns.iter().position(|c| c == from) else {
            return;
        };
        self.columns[position] = to.to_string();
        for row in &mut self.rows {
            row.rename(from, to);
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Extracts a column as numeric values, one per row. Used by the
    /// percentile strategy, which needs the whole peer set at once.
    pub fn column_numbers(&self, name: &str) -> Vec<Option<f64>> {
        self.rows.iter().map(|row| row.number(name)).collect()
    }

    /// Parses a CSV dataset from raw bytes, decoding UTF-8 first and
    /// falling back to Latin-1 when the bytes are not valid UTF-8.
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Table, DatasetError> {
        let decoded = decode(bytes);
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(decoded.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(DatasetError::NoHeader);
        }

        let mut table = Table::new(headers.clone());
        for record in reader.records() {
            let record = record?;
            let mut row = Row::default();
            for (column, field) in headers.iter().zip(record.iter()) {
                row.set(column, Cell::parse(field));
            }
            table.push_row(row);
        }

        debug!(
            rows = table.len(),
            columns = table.columns.len(),
            "Dataset parsed"
        );
        Ok(table)
    }

    pub fn from_csv_path(path: &Path) -> Result<Table, DatasetError> {
        let bytes = std::fs::read(path)?;
        Table::from_csv_bytes(&bytes)
    }
}

/// Decodes dataset bytes, preferring strict UTF-8. Legacy exports from
/// spreadsheet tools are commonly Latin-1, where every byte maps directly
/// to the same code point.
fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_parse_kinds() {
        assert_eq!(Cell::parse("12.5"), Cell::Number(12.5));
        assert_eq!(Cell::parse("  7 "), Cell::Number(7.0));
        assert_eq!(Cell::parse(""), Cell::Empty);
        assert_eq!(Cell::parse("   "), Cell::Empty);
        assert_eq!(Cell::parse("abc"), Cell::Text("abc".to_string()));
        // NaN and infinity are not valid dataset numbers
        assert_eq!(Cell::parse("NaN"), Cell::Text("NaN".to_string()));
        assert_eq!(Cell::parse("inf"), Cell::Text("inf".to_string()));
    }

    #[test]
    fn test_flag_parsing() {
        assert_eq!(Cell::parse("Yes").flag(), Some(true));
        assert_eq!(Cell::parse("TRUE").flag(), Some(true));
        assert_eq!(Cell::parse("1").flag(), Some(true));
        assert_eq!(Cell::parse("no").flag(), Some(false));
        assert_eq!(Cell::parse("False").flag(), Some(false));
        assert_eq!(Cell::parse("0").flag(), Some(false));
        // unparseable flags are missing, not "no"
        assert_eq!(Cell::parse("maybe").flag(), None);
        assert_eq!(Cell::parse("").flag(), None);
        assert_eq!(Cell::parse("2").flag(), None);
    }

    #[test]
    fn test_from_csv_bytes_basic() {
        let csv = "farm_id,area_ha,crop\nF1,10.5,wheat\nF2,,barley\n";
        let table = Table::from_csv_bytes(csv.as_bytes()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.columns(), &["farm_id", "area_ha", "crop"]);
        assert_eq!(table.rows()[0].number("area_ha"), Some(10.5));
        assert_eq!(table.rows()[0].text("farm_id"), Some("F1"));
        assert_eq!(table.rows()[1].number("area_ha"), None);
    }

    #[test]
    fn test_non_numeric_cell_reads_as_missing() {
        let csv = "farm_id,area_ha\nF1,lots\n";
        let table = Table::from_csv_bytes(csv.as_bytes()).unwrap();
        assert_eq!(table.rows()[0].number("area_ha"), None);
        assert_eq!(table.rows()[0].text("area_ha"), Some("lots"));
    }

    #[test]
    fn test_latin1_fallback() {
        // "Müller" in Latin-1: 0xFC is not valid UTF-8 on its own
        let bytes = b"farm_id,organisation_name\nF1,M\xFCller\n";
        let table = Table::from_csv_bytes(bytes).unwrap();
        assert_eq!(table.rows()[0].text("organisation_name"), Some("Müller"));
    }

    #[test]
    fn test_empty_input_is_no_header() {
        let result = Table::from_csv_bytes(b"");
        assert!(matches!(result, Err(DatasetError::NoHeader)));
    }

    #[test]
    fn test_header_only_yields_empty_table() {
        let table = Table::from_csv_bytes(b"farm_id,area_ha\n").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns().len(), 2);
    }

    #[test]
    fn test_rename_column_rewrites_rows() {
        let csv = "Farm ID,area_ha\nF1,3\n";
        let mut table = Table::from_csv_bytes(csv.as_bytes()).unwrap();
        table.rename_column("Farm ID", "farm_id");

        assert!(table.has_column("farm_id"));
        assert!(!table.has_column("Farm ID"));
        assert_eq!(table.rows()[0].text("farm_id"), Some("F1"));
    }

    #[test]
    fn test_short_row_fills_missing() {
        let csv = "a,b,c\n1,2\n";
        let table = Table::from_csv_bytes(csv.as_bytes()).unwrap();
        assert_eq!(table.rows()[0].number("c"), None);
    }
}
