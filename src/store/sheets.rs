use super::{Grid, RowStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::instrument;
use url::Url;

/// Google Sheets v4 values API. The access token is minted outside this
/// process (service account or OAuth flow) and passed in through config.
#[derive(Clone)]
pub struct GoogleSheetsStore {
    client: Client,
    api_base: String,
    spreadsheet_id: String,
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Option<Vec<Vec<Value>>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

impl GoogleSheetsStore {
    pub fn new(api_base: String, spreadsheet_id: String, access_token: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            spreadsheet_id,
            access_token,
        })
    }

    fn spreadsheet_url(&self, suffix: &str) -> Result<Url> {
        Url::parse(&format!(
            "{}/spreadsheets/{}{}",
            self.api_base, self.spreadsheet_id, suffix
        ))
        .map_err(|e| Error::Config(format!("invalid SHEETS_API_BASE: {}", e)))
    }

    fn values_url(&self, segment: &str) -> Result<Url> {
        let mut url = self.spreadsheet_url("")?;
        url.path_segments_mut()
            .map_err(|_| Error::Config("SHEETS_API_BASE cannot be a base".to_string()))?
            .push("values")
            .push(segment);
        Ok(url)
    }

    async fn check(resp: Response, what: &str) -> Result<Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Err(Error::Store(format!("{} failed status={} body={}", what, status, body)))
    }

    async fn metadata(&self) -> Result<Vec<SheetProperties>> {
        let mut url = self.spreadsheet_url("")?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties(sheetId,title)");
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let meta: SpreadsheetMeta = Self::check(resp, "spreadsheet metadata").await?.json().await?;
        Ok(meta.sheets.into_iter().map(|s| s.properties).collect())
    }

    async fn sheet_id(&self, sheet: &str) -> Result<i64> {
        self.metadata()
            .await?
            .into_iter()
            .find(|p| p.title == sheet)
            .map(|p| p.sheet_id)
            .ok_or_else(|| Error::NotFound(format!("Planilha {} não encontrada", sheet)))
    }

    async fn batch_update(&self, requests: Value) -> Result<()> {
        let url = self.spreadsheet_url(":batchUpdate")?;
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&json!({ "requests": requests }))
            .send()
            .await?;
        Self::check(resp, "spreadsheet batchUpdate").await?;
        Ok(())
    }
}

/// Quoted sheet reference for A1 notation.
fn quoted(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}

/// Zero-based column index to its A1 letters.
fn column_letter(mut col: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (col % 26) as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// A1 address of a grid cell (both indices zero-based).
fn cell_range(sheet: &str, row: usize, col: usize) -> String {
    format!("{}!{}{}", quoted(sheet), column_letter(col), row + 1)
}

/// The API drops trailing empty cells; pad every row to the header width.
fn pad_rows(mut grid: Grid) -> Grid {
    let width = grid.iter().map(|r| r.len()).max().unwrap_or(0);
    for row in grid.iter_mut() {
        row.resize(width, Value::String(String::new()));
    }
    grid
}

#[async_trait]
impl RowStore for GoogleSheetsStore {
    fn backend_tag(&self) -> &'static str {
        "google_sheets"
    }

    #[instrument(name = "sheets_list", skip(self))]
    async fn sheet_names(&self) -> Result<Vec<String>> {
        Ok(self.metadata().await?.into_iter().map(|p| p.title).collect())
    }

    #[instrument(name = "sheets_read", skip(self))]
    async fn read_sheet(&self, sheet: &str) -> Result<Option<Grid>> {
        let mut url = self.values_url(&quoted(sheet))?;
        url.query_pairs_mut()
            .append_pair("valueRenderOption", "UNFORMATTED_VALUE")
            .append_pair("majorDimension", "ROWS");
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        if resp.status() == StatusCode::BAD_REQUEST {
            let body = resp.text().await.unwrap_or_default();
            if body.contains("Unable to parse range") {
                return Ok(None);
            }
            return Err(Error::Store(format!("read {} failed: {}", sheet, body)));
        }
        let range: ValueRange = Self::check(resp, "values get").await?.json().await?;
        Ok(Some(pad_rows(range.values.unwrap_or_default())))
    }

    #[instrument(name = "sheets_write", skip(self, cells))]
    async fn write_cells(&self, sheet: &str, row: usize, cells: &[(usize, Value)]) -> Result<()> {
        let data: Vec<Value> = cells
            .iter()
            .map(|(col, value)| {
                json!({
                    "range": cell_range(sheet, row, *col),
                    "values": [[value]],
                })
            })
            .collect();
        let url = self.spreadsheet_url("/values:batchUpdate")?;
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&json!({ "valueInputOption": "RAW", "data": data }))
            .send()
            .await?;
        Self::check(resp, "values batchUpdate").await?;
        Ok(())
    }

    #[instrument(name = "sheets_append", skip(self, values))]
    async fn append_row(&self, sheet: &str, values: Vec<Value>) -> Result<()> {
        let mut url = self.values_url(&format!("{}:append", quoted(sheet)))?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&json!({ "values": [values] }))
            .send()
            .await?;
        Self::check(resp, "values append").await?;
        Ok(())
    }

    #[instrument(name = "sheets_delete_row", skip(self))]
    async fn delete_row(&self, sheet: &str, row: usize) -> Result<()> {
        let sheet_id = self.sheet_id(sheet).await?;
        self.batch_update(json!([{
            "deleteDimension": {
                "range": {
                    "sheetId": sheet_id,
                    "dimension": "ROWS",
                    "startIndex": row,
                    "endIndex": row + 1,
                }
            }
        }]))
        .await
    }

    #[instrument(name = "sheets_create", skip(self, headers))]
    async fn create_sheet(&self, sheet: &str, headers: &[&str]) -> Result<()> {
        self.batch_update(json!([{ "addSheet": { "properties": { "title": sheet } } }]))
            .await?;

        let mut url = self.values_url(&format!("{}!A1", quoted(sheet)))?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let resp = self
            .client
            .put(url)
            .bearer_auth(&self.access_token)
            .json(&json!({ "values": [headers] }))
            .send()
            .await?;
        Self::check(resp, "header write").await?;
        Ok(())
    }
}
