use super::{Grid, RowStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

/// Process-local store used by tests and `STORE_BACKEND=memory`.
#[derive(Default)]
pub struct MemoryStore {
    sheets: RwLock<Vec<(String, Grid)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sheet with headers and rows given as JSON values.
    pub fn with_sheet(mut self, name: &str, headers: &[&str], rows: Vec<Vec<Value>>) -> Self {
        let sheets = self.sheets.get_mut();
        let mut grid: Grid = vec![headers.iter().map(|h| Value::String(h.to_string())).collect()];
        grid.extend(rows);
        sheets.retain(|(n, _)| n != name);
        sheets.push((name.to_string(), grid));
        self
    }

    /// Copy of a whole grid, for assertions.
    pub async fn snapshot(&self, name: &str) -> Option<Grid> {
        self.sheets
            .read()
            .await
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, g)| g.clone())
    }
}

fn missing(sheet: &str) -> Error {
    Error::NotFound(format!("Planilha {} não encontrada", sheet))
}

#[async_trait]
impl RowStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn sheet_names(&self) -> Result<Vec<String>> {
        Ok(self.sheets.read().await.iter().map(|(n, _)| n.clone()).collect())
    }

    async fn read_sheet(&self, sheet: &str) -> Result<Option<Grid>> {
        Ok(self.snapshot(sheet).await)
    }

    async fn write_cells(&self, sheet: &str, row: usize, cells: &[(usize, Value)]) -> Result<()> {
        let mut sheets = self.sheets.write().await;
        let (_, grid) = sheets
            .iter_mut()
            .find(|(n, _)| n == sheet)
            .ok_or_else(|| missing(sheet))?;
        let target = grid
            .get_mut(row)
            .ok_or_else(|| Error::Store(format!("row {} out of range in {}", row, sheet)))?;
        for (col, value) in cells {
            if target.len() <= *col {
                target.resize(col + 1, Value::String(String::new()));
            }
            target[*col] = value.clone();
        }
        Ok(())
    }

    async fn append_row(&self, sheet: &str, values: Vec<Value>) -> Result<()> {
        let mut sheets = self.sheets.write().await;
        let (_, grid) = sheets
            .iter_mut()
            .find(|(n, _)| n == sheet)
            .ok_or_else(|| missing(sheet))?;
        grid.push(values);
        Ok(())
    }

    async fn delete_row(&self, sheet: &str, row: usize) -> Result<()> {
        let mut sheets = self.sheets.write().await;
        let (_, grid) = sheets
            .iter_mut()
            .find(|(n, _)| n == sheet)
            .ok_or_else(|| missing(sheet))?;
        if row == 0 || row >= grid.len() {
            return Err(Error::Store(format!("row {} out of range in {}", row, sheet)));
        }
        grid.remove(row);
        Ok(())
    }

    async fn create_sheet(&self, sheet: &str, headers: &[&str]) -> Result<()> {
        let mut sheets = self.sheets.write().await;
        if sheets.iter().any(|(n, _)| n == sheet) {
            return Err(Error::Store(format!("sheet {} already exists", sheet)));
        }
        let header_row = headers.iter().map(|h| Value::String(h.to_string())).collect();
        sheets.push((sheet.to_string(), vec![header_row]));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn writes_pad_short_rows() {
        let store = MemoryStore::new().with_sheet("S", &["a", "b", "c"], vec![vec![json!("x")]]);
        store.write_cells("S", 1, &[(2, json!("z"))]).await.unwrap();
        let grid = store.snapshot("S").await.unwrap();
        assert_eq!(grid[1], vec![json!("x"), json!(""), json!("z")]);
    }

    #[tokio::test]
    async fn header_row_cannot_be_deleted() {
        let store = MemoryStore::new().with_sheet("S", &["a"], vec![vec![json!("1")]]);
        assert!(store.delete_row("S", 0).await.is_err());
        store.delete_row("S", 1).await.unwrap();
        assert_eq!(store.snapshot("S").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_sheet_reads_as_none() {
        let store = MemoryStore::new();
        assert!(store.read_sheet("NOPE").await.unwrap().is_none());
        assert!(store.append_row("NOPE", vec![]).await.is_err());
    }
}
