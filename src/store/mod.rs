//! Row-oriented access to the spreadsheet that backs the application.
//!
//! A sheet is a grid of JSON scalars whose first row holds the column
//! headers. Backends only move whole rows and single cells around; all
//! lookups are linear scans done here, on a freshly loaded copy of the sheet.

pub mod memory;
pub mod postgres;
pub mod schema;
pub mod sheets;

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

pub type Grid = Vec<Vec<Value>>;
pub type Record = Map<String, Value>;

/// Storage seam. Row indices are grid indices: `0` is the header row and
/// data rows start at `1`.
#[async_trait]
pub trait RowStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn sheet_names(&self) -> Result<Vec<String>>;

    /// Whole grid including the header row, or `None` when the sheet does not exist.
    async fn read_sheet(&self, sheet: &str) -> Result<Option<Grid>>;

    async fn write_cells(&self, sheet: &str, row: usize, cells: &[(usize, Value)]) -> Result<()>;

    async fn append_row(&self, sheet: &str, values: Vec<Value>) -> Result<()>;

    async fn delete_row(&self, sheet: &str, row: usize) -> Result<()>;

    /// Creates the sheet with the given header row. Callers check existence first.
    async fn create_sheet(&self, sheet: &str, headers: &[&str]) -> Result<()>;
}

/// Text form of a cell, used for every key comparison.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Spreadsheet truthiness: empty cells, empty strings, `false` and zero are blank.
pub fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        _ => true,
    }
}

/// `TRUE` flags as written by the sheet UI (`TRUE` text or a real boolean).
pub fn is_true_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s == "TRUE",
        _ => false,
    }
}

#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    /// Data rows only; data row `i` lives at grid row `i + 1`.
    pub rows: Vec<Vec<Value>>,
}

impl Sheet {
    pub fn from_grid(name: &str, mut grid: Grid) -> Self {
        if grid.is_empty() {
            return Self {
                name: name.to_string(),
                headers: Vec::new(),
                rows: Vec::new(),
            };
        }
        let rows = grid.split_off(1);
        let headers = grid
            .into_iter()
            .next()
            .unwrap_or_default()
            .iter()
            .map(cell_text)
            .collect();
        Self {
            name: name.to_string(),
            headers,
            rows,
        }
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, row: usize, col: usize) -> &Value {
        static NULL: Value = Value::Null;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&NULL)
    }

    /// Cell by column name; `Null` when the column or the cell is missing.
    pub fn value(&self, row: usize, column: &str) -> &Value {
        static NULL: Value = Value::Null;
        match self.column(column) {
            Some(col) => self.cell(row, col),
            None => &NULL,
        }
    }

    pub fn text(&self, row: usize, column: &str) -> String {
        cell_text(self.value(row, column))
    }

    /// First data row whose `column` cell is filled and equals `key` as text.
    pub fn find_row(&self, column: &str, key: &str) -> Option<usize> {
        let col = self.column(column)?;
        (0..self.rows.len()).find(|&i| {
            let cell = self.cell(i, col);
            is_filled(cell) && cell_text(cell) == key
        })
    }

    /// Data rows whose `column` cell equals `value` exactly.
    pub fn rows_where(&self, column: &str, value: &str) -> Vec<usize> {
        let Some(col) = self.column(column) else {
            return Vec::new();
        };
        (0..self.rows.len())
            .filter(|&i| match self.cell(i, col) {
                Value::String(s) => s == value,
                other => is_filled(other) && cell_text(other) == value,
            })
            .collect()
    }

    pub fn record(&self, row: usize) -> Record {
        self.headers
            .iter()
            .enumerate()
            .map(|(col, header)| (header.clone(), self.cell(row, col).clone()))
            .collect()
    }

    pub fn records(&self) -> Vec<Record> {
        (0..self.rows.len()).map(|i| self.record(i)).collect()
    }
}

/// Thin accessor shared by the services.
#[derive(Clone)]
pub struct Workbook {
    store: Arc<dyn RowStore>,
}

impl Workbook {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }

    pub fn backend_tag(&self) -> &'static str {
        self.store.backend_tag()
    }

    pub async fn sheet_names(&self) -> Result<Vec<String>> {
        self.store.sheet_names().await
    }

    pub async fn load(&self, name: &str) -> Result<Option<Sheet>> {
        let grid = self.store.read_sheet(name).await?;
        Ok(grid.map(|g| Sheet::from_grid(name, g)))
    }

    /// Like [`Workbook::load`] but a missing sheet is a not-found error.
    pub async fn require(&self, name: &str) -> Result<Sheet> {
        self.load(name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Planilha {} não encontrada", name)))
    }

    /// Writes the named fields of data row `row`. Columns missing from the
    /// header are skipped; returns how many cells were written.
    pub async fn set_fields(&self, sheet: &Sheet, row: usize, fields: &[(&str, Value)]) -> Result<usize> {
        let cells: Vec<(usize, Value)> = fields
            .iter()
            .filter_map(|(name, value)| sheet.column(name).map(|col| (col, value.clone())))
            .collect();
        if cells.is_empty() {
            return Ok(0);
        }
        self.store.write_cells(&sheet.name, row + 1, &cells).await?;
        Ok(cells.len())
    }

    pub async fn append_row(&self, sheet: &str, values: Vec<Value>) -> Result<()> {
        self.store.append_row(sheet, values).await
    }

    /// Builds a row in header order from `record` and appends it.
    pub async fn append_record(&self, sheet: &Sheet, record: &Record) -> Result<()> {
        let values = sheet
            .headers
            .iter()
            .map(|h| record.get(h).cloned().unwrap_or_else(|| Value::String(String::new())))
            .collect();
        self.store.append_row(&sheet.name, values).await
    }

    pub async fn delete_row(&self, sheet: &Sheet, row: usize) -> Result<()> {
        self.store.delete_row(&sheet.name, row + 1).await
    }

    /// Creates the sheet when absent. Returns `true` if it was created.
    pub async fn ensure_sheet(&self, name: &str, headers: &[&str]) -> Result<bool> {
        if self.store.read_sheet(name).await?.is_some() {
            return Ok(false);
        }
        self.store.create_sheet(name, headers).await?;
        Ok(true)
    }
}
