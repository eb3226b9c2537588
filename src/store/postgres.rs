use super::{Grid, RowStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Row};

/// Self-hosted mirror of the spreadsheet: one JSONB array per row.
#[derive(Clone)]
pub struct PgSheetStore {
    pool: PgPool,
}

impl PgSheetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn sheet_exists(&self, sheet: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 AS one FROM sheets WHERE name = $1")
            .bind(sheet)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn row_at(&self, sheet: &str, row: usize) -> Result<(i64, Vec<Value>)> {
        let record = sqlx::query(
            r#"
            SELECT id, cells FROM sheet_rows
            WHERE sheet = $1
            ORDER BY id ASC
            OFFSET $2 LIMIT 1
            "#,
        )
        .bind(sheet)
        .bind(row as i64)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::Store(format!("row {} out of range in {}", row, sheet)))?;

        let id: i64 = record.try_get("id")?;
        let cells: Value = record.try_get("cells")?;
        Ok((id, into_cells(cells)))
    }
}

fn into_cells(value: Value) -> Vec<Value> {
    match value {
        Value::Array(cells) => cells,
        _ => Vec::new(),
    }
}

#[async_trait]
impl RowStore for PgSheetStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn sheet_names(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM sheets ORDER BY created_at ASC, name ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|r| r.try_get::<String, _>("name").map_err(Error::from))
            .collect()
    }

    async fn read_sheet(&self, sheet: &str) -> Result<Option<Grid>> {
        if !self.sheet_exists(sheet).await? {
            return Ok(None);
        }
        let rows = sqlx::query("SELECT cells FROM sheet_rows WHERE sheet = $1 ORDER BY id ASC")
            .bind(sheet)
            .fetch_all(&self.pool)
            .await?;
        let mut grid = Vec::with_capacity(rows.len());
        for row in rows {
            let cells: Value = row.try_get("cells")?;
            grid.push(into_cells(cells));
        }
        Ok(Some(grid))
    }

    async fn write_cells(&self, sheet: &str, row: usize, cells: &[(usize, Value)]) -> Result<()> {
        let (id, mut current) = self.row_at(sheet, row).await?;
        for (col, value) in cells {
            if current.len() <= *col {
                current.resize(col + 1, Value::String(String::new()));
            }
            current[*col] = value.clone();
        }
        sqlx::query("UPDATE sheet_rows SET cells = $1, updated_at = NOW() WHERE id = $2")
            .bind(Value::Array(current))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn append_row(&self, sheet: &str, values: Vec<Value>) -> Result<()> {
        if !self.sheet_exists(sheet).await? {
            return Err(Error::NotFound(format!("Planilha {} não encontrada", sheet)));
        }
        sqlx::query("INSERT INTO sheet_rows (sheet, cells) VALUES ($1, $2)")
            .bind(sheet)
            .bind(Value::Array(values))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_row(&self, sheet: &str, row: usize) -> Result<()> {
        if row == 0 {
            return Err(Error::Store(format!("refusing to delete the header row of {}", sheet)));
        }
        let (id, _) = self.row_at(sheet, row).await?;
        sqlx::query("DELETE FROM sheet_rows WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_sheet(&self, sheet: &str, headers: &[&str]) -> Result<()> {
        let header_row: Vec<Value> = headers.iter().map(|h| Value::String(h.to_string())).collect();
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO sheets (name) VALUES ($1)")
            .bind(sheet)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO sheet_rows (sheet, cells) VALUES ($1, $2)")
            .bind(sheet)
            .bind(Value::Array(header_row))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
