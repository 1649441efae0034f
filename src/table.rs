use std::path::Path;

use csv::{ReaderBuilder, Writer};

use crate::error::Error;
use crate::types::Result;

/// Raw field values loaded as missing cells
pub const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NULL", "null", "NaN", "nan", "None", "#N/A",
];

/// Whether a raw field stands for an absent value
pub fn is_missing(field: &str) -> bool {
    MISSING_TOKENS.contains(&field)
}

/// In-memory table of optional string cells under named columns.
///
/// Every row holds exactly one cell per header; absent values are `None`.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Load a table from a CSV file with a header row.
    ///
    /// Short records are padded with missing cells and long records are
    /// truncated, so every row matches the header width. Fields listed in
    /// [`MISSING_TOKENS`] load as missing.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let mut table = Table::new(name, headers);
        for result in reader.records() {
            let record = result?;
            let row = record
                .iter()
                .map(|field| {
                    if is_missing(field) {
                        None
                    } else {
                        Some(field.to_string())
                    }
                })
                .collect();
            table.push_row(row);
        }
        Ok(table)
    }

    /// Write the table as CSV, rendering missing cells as empty fields
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = Writer::from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    /// Append a row, padding or truncating it to the header width
    pub fn push_row(&mut self, mut row: Vec<Option<String>>) {
        row.resize(self.headers.len(), None);
        self.rows.push(row);
    }

    /// Append a column; the value count must equal the current row count
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<Option<String>>) {
        assert_eq!(values.len(), self.rows.len());
        self.headers.push(name.into());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    /// Position of a named column, or the schema-violation error
    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| Error::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// All cells of one column, top to bottom
    pub fn column_values(&self, column: &str) -> Result<Vec<Option<String>>> {
        let idx = self.column_index(column)?;
        Ok(self.rows.iter().map(|row| row[idx].clone()).collect())
    }

    /// New table holding only the named columns, in the given order
    pub fn select(&self, columns: &[&str]) -> Result<Table> {
        let indices: Vec<usize> = columns
            .iter()
            .map(|c| self.column_index(c))
            .collect::<Result<_>>()?;
        let mut out = Table::new(
            self.name.clone(),
            columns.iter().map(|c| c.to_string()).collect(),
        );
        for row in &self.rows {
            out.push_row(indices.iter().map(|&i| row[i].clone()).collect());
        }
        Ok(out)
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        let idx = self.column_index(from)?;
        self.headers[idx] = to.to_string();
        Ok(())
    }

    /// Apply a transform to every present cell of one column
    pub fn map_column(&mut self, column: &str, f: impl Fn(&str) -> String) -> Result<()> {
        let idx = self.column_index(column)?;
        for row in &mut self.rows {
            if let Some(value) = row[idx].take() {
                row[idx] = Some(f(&value));
            }
        }
        Ok(())
    }
}
