//! The in-memory transaction table and row selections over it.
//!
//! A `TransactionTable` is loaded once per parse and never mutated afterwards. Every subset
//! (period, income, issues, one category) is a `Selection`, which borrows the table and holds
//! the indices of the rows it contains.

use crate::error::{Error, Result};
use crate::model::filter::ColumnFilter;
use crate::model::mapping::Mapping;
use crate::model::period::Period;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, trace};

/// Field separator of the export.
pub const DELIMITER: u8 = b';';

/// The value that replaces missing cells.
pub const EMPTY_CELL: &str = "empty";

/// All rows of an export with string-typed cells.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct TransactionTable {
    mapping: Mapping,
    rows: Vec<Vec<String>>,
}

impl TransactionTable {
    /// Reads the export at `path`.
    ///
    /// # Errors
    /// - `Error::FileFormat` if the file cannot be opened or read, is not valid delimited text,
    ///   or lacks one of `required_columns`.
    pub fn load(path: impl AsRef<Path>, required_columns: &[&str]) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::file_format(format!("Unable to open {}: {e}", path.display()))
        })?;
        let table = Self::from_reader(file, required_columns).map_err(|e| match e {
            Error::FileFormat(msg) => Error::file_format(format!("{}: {msg}", path.display())),
            other => other,
        })?;
        debug!(
            rows = table.len(),
            columns = table.mapping.len(),
            "Loaded transactions from {}",
            path.display()
        );
        Ok(table)
    }

    /// Reads an export from any reader. See [`TransactionTable::load`].
    pub fn from_reader<R: Read>(reader: R, required_columns: &[&str]) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(DELIMITER)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| Error::file_format(format!("Unable to read the header row: {e}")))?
            .clone();
        let mapping = Mapping::new(headers.iter()).map_err(|e| Error::file_format(e.to_string()))?;

        if let Some(missing) = required_columns
            .iter()
            .find(|column| mapping.index(column).is_none())
        {
            return Err(Error::file_format(format!(
                "The expected column '{missing}' is missing"
            )));
        }

        let width = mapping.len();
        let mut rows = Vec::new();
        for (row_ix, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| {
                Error::file_format(format!("Unable to read row {}: {e}", row_ix + 2))
            })?;
            if record.len() > width {
                return Err(Error::file_format(format!(
                    "A row longer than the header row was encountered at row {}",
                    row_ix + 2
                )));
            }
            let mut cells: Vec<String> = record.iter().map(normalize_cell).collect();
            cells.resize(width, EMPTY_CELL.to_string());
            rows.push(cells);
        }

        Ok(Self { mapping, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> &[String] {
        self.mapping.headers()
    }

    /// Returns the index of `column`.
    ///
    /// # Errors
    /// Returns `Error::FileFormat` if the export has no such column.
    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.mapping
            .index(column)
            .ok_or_else(|| Error::file_format(format!("The expected column '{column}' is missing")))
    }

    /// A selection of every row.
    pub fn all(&self) -> Selection<'_> {
        Selection {
            table: self,
            rows: (0..self.rows.len()).collect(),
        }
    }

    /// Selects the rows of `period`.
    ///
    /// With a month, rows whose `month_column` equals the `YYYY-MM` tag are kept. Without one,
    /// rows whose `year_column` holds the year are kept.
    ///
    /// # Errors
    /// - `Error::Config` if a month is requested but no month column is configured.
    /// - `Error::FileFormat` if a configured column is missing.
    pub fn select_period(
        &self,
        year_column: &str,
        month_column: Option<&str>,
        period: &Period,
    ) -> Result<Selection<'_>> {
        let selection = match period.month_tag() {
            Some(tag) => {
                let column = month_column.ok_or_else(|| {
                    Error::config("A month was requested but no month column is configured")
                })?;
                let ix = self.column_index(column)?;
                self.all().retain(|row| row[ix] == tag)
            }
            None => {
                let ix = self.column_index(year_column)?;
                let year = period.year();
                self.all()
                    .retain(|row| row[ix].trim().parse::<i32>().map_or(false, |y| y == year))
            }
        };
        trace!(rows = selection.len(), "Selected rows for {period}");
        Ok(selection)
    }

    fn row(&self, ix: usize) -> &[String] {
        &self.rows[ix]
    }
}

fn normalize_cell(cell: &str) -> String {
    if cell.is_empty() {
        EMPTY_CELL.to_string()
    } else {
        cell.to_string()
    }
}

/// A subset of the rows of a `TransactionTable`, in table order.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    table: &'a TransactionTable,
    rows: Vec<usize>,
}

impl<'a> Selection<'a> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn table(&self) -> &'a TransactionTable {
        self.table
    }

    /// Keeps the rows that pass every filter. An empty filter list keeps every row.
    ///
    /// # Errors
    /// Returns `Error::FileFormat` if a filter names a column the export does not have.
    pub fn apply_filters(&self, filters: &[ColumnFilter]) -> Result<Selection<'a>> {
        let mut selection = self.clone();
        for filter in filters {
            let ix = self.table.column_index(filter.column())?;
            selection = selection.retain(|row| filter.accepts(&row[ix]));
        }
        Ok(selection)
    }

    /// Keeps the rows whose `column` value equals `value`.
    pub fn where_equals(&self, column: &str, value: &str) -> Result<Selection<'a>> {
        let ix = self.table.column_index(column)?;
        Ok(self.retain(|row| row[ix] == value))
    }

    /// Keeps the rows whose lowercase `column` value contains `needle`. The needle is expected in
    /// lowercase, an empty needle keeps every row.
    pub fn where_contains(&self, column: &str, needle: &str) -> Result<Selection<'a>> {
        let ix = self.table.column_index(column)?;
        Ok(self.retain(|row| row[ix].to_lowercase().contains(needle)))
    }

    /// The values of `column` for the selected rows, in row order.
    pub fn values(&self, column: &str) -> Result<Vec<&'a str>> {
        let ix = self.table.column_index(column)?;
        let table = self.table;
        Ok(self
            .rows
            .iter()
            .map(|&row| table.row(row)[ix].as_str())
            .collect())
    }

    /// The distinct values of `column` in order of first appearance.
    pub fn distinct(&self, column: &str) -> Result<Vec<&'a str>> {
        let mut seen = HashSet::new();
        Ok(self
            .values(column)?
            .into_iter()
            .filter(|value| seen.insert(*value))
            .collect())
    }

    fn retain<F>(&self, mut keep: F) -> Selection<'a>
    where
        F: FnMut(&[String]) -> bool,
    {
        let table = self.table;
        Selection {
            table,
            rows: self
                .rows
                .iter()
                .copied()
                .filter(|&row| keep(table.row(row)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Analyse-Jahr;Analyse-Monat;Hauptkategorie;Typ;Betrag
2024;2024-03;Wohnen;Ausgabe;-800,00
2024;2024-03;Lebensmittel;Ausgabe;-150,50
2024;2024-04;Lebensmittel;;-20,00
2023;2023-12;Freizeit;Ausgabe;-10,00
";

    fn table() -> TransactionTable {
        TransactionTable::from_reader(CSV.as_bytes(), &["Betrag"]).unwrap()
    }

    #[test]
    fn test_load_normalizes_empty_cells() {
        let table = table();
        assert_eq!(table.len(), 4);
        let types = table.all().values("Typ").unwrap();
        assert_eq!(types, vec!["Ausgabe", "Ausgabe", "empty", "Ausgabe"]);
    }

    #[test]
    fn test_load_pads_short_rows() {
        let csv = "A;B;C\n1;2\n";
        let table = TransactionTable::from_reader(csv.as_bytes(), &[]).unwrap();
        assert_eq!(table.all().values("C").unwrap(), vec!["empty"]);
    }

    #[test]
    fn test_load_rejects_long_rows() {
        let csv = "A;B\n1;2;3\n";
        let err = TransactionTable::from_reader(csv.as_bytes(), &[]).unwrap_err();
        assert!(err.is_file_format());
    }

    #[test]
    fn test_load_missing_required_column() {
        let err = TransactionTable::from_reader(CSV.as_bytes(), &["Unterkategorie"]).unwrap_err();
        assert!(err.is_file_format());
        assert!(err.to_string().contains("Unterkategorie"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = TransactionTable::load(dir.path().join("nope.csv"), &[]).unwrap_err();
        assert!(err.is_file_format());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("export.csv");
        std::fs::write(&path, CSV).unwrap();
        let table = TransactionTable::load(&path, &["Analyse-Jahr"]).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.headers()[4], "Betrag");
    }

    #[test]
    fn test_select_month() {
        let table = table();
        let period = Period::new(2024, Some(3)).unwrap();
        let selection = table
            .select_period("Analyse-Jahr", Some("Analyse-Monat"), &period)
            .unwrap();
        assert_eq!(
            selection.values("Hauptkategorie").unwrap(),
            vec!["Wohnen", "Lebensmittel"]
        );
    }

    #[test]
    fn test_select_year() {
        let table = table();
        let period = Period::new(2024, None).unwrap();
        let selection = table.select_period("Analyse-Jahr", None, &period).unwrap();
        assert_eq!(selection.len(), 3);
    }

    #[test]
    fn test_select_month_without_month_column() {
        let table = table();
        let period = Period::new(2024, Some(3)).unwrap();
        let err = table
            .select_period("Analyse-Jahr", None, &period)
            .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_empty_filter_list_is_noop() {
        let table = table();
        let selection = table.all().apply_filters(&[]).unwrap();
        assert_eq!(selection.len(), table.len());
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let table = table();
        let filters = vec![
            ColumnFilter::new("Typ", ["Ausgabe"]),
            ColumnFilter::new("Analyse-Jahr", ["2024"]),
        ];
        let selection = table.all().apply_filters(&filters).unwrap();
        assert_eq!(selection.len(), 2);
    }

    #[test]
    fn test_disjoint_filters_on_same_column_yield_nothing() {
        let table = table();
        let filters = vec![
            ColumnFilter::new("Hauptkategorie", ["Wohnen"]),
            ColumnFilter::new("Hauptkategorie", ["Lebensmittel"]),
        ];
        let selection = table.all().apply_filters(&filters).unwrap();
        assert!(selection.is_empty());
    }

    #[test]
    fn test_filter_on_unknown_column() {
        let table = table();
        let filters = vec![ColumnFilter::new("Konto", ["Giro"])];
        assert!(table.all().apply_filters(&filters).unwrap_err().is_file_format());
    }

    #[test]
    fn test_where_contains_is_case_insensitive() {
        let table = table();
        let selection = table.all().where_contains("Hauptkategorie", "mittel").unwrap();
        assert_eq!(selection.len(), 2);
        let everything = table.all().where_contains("Hauptkategorie", "").unwrap();
        assert_eq!(everything.len(), 4);
    }

    #[test]
    fn test_distinct_keeps_first_seen_order() {
        let table = table();
        let distinct = table.all().distinct("Hauptkategorie").unwrap();
        assert_eq!(distinct, vec!["Wohnen", "Lebensmittel", "Freizeit"]);
    }
}
