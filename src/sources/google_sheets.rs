use crate::error::{CaseTrackerError, Result};
use crate::repository::TableSource;
use crate::schema::{CanonicalColumn, RawTable};
use reqwest::header::CACHE_CONTROL;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::runtime::Runtime;

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const LAST_COLUMN: &str = "ZZZ";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    major_dimension: Option<String>,
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Google Sheets v4 values API, one spreadsheet, OAuth bearer token.
///
/// The repository interface is synchronous, so each call is driven to
/// completion on a private current-thread runtime. Do not call it from
/// inside another tokio runtime.
pub struct GoogleSheetsSource {
    client: Client,
    runtime: Runtime,
    spreadsheet_id: String,
    access_token: String,
    base_url: String,
}

impl GoogleSheetsSource {
    pub fn new(spreadsheet_id: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            client: Client::new(),
            runtime,
            spreadsheet_id: spreadsheet_id.into(),
            access_token: access_token.into(),
            base_url: SHEETS_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn values_url(&self, worksheet: &str, suffix: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| CaseTrackerError::ConfigError(format!("Invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| CaseTrackerError::ConfigError("Base URL cannot be a base".to_string()))?
            .push(&self.spreadsheet_id)
            .push("values")
            .push(&format!("{}{}", worksheet, suffix));
        Ok(url)
    }

    /// Numbers come back unformatted; date cells come back as their
    /// displayed text, not as serial numbers.
    fn fetch_url(&self, worksheet: &str) -> Result<Url> {
        let mut url = self.values_url(worksheet, "")?;
        url.query_pairs_mut()
            .append_pair("valueRenderOption", "UNFORMATTED_VALUE")
            .append_pair("dateTimeRenderOption", "FORMATTED_STRING")
            .append_pair("majorDimension", "ROWS");
        Ok(url)
    }

    async fn fetch_async(&self, worksheet: &str) -> Result<RawTable> {
        let url = self.fetch_url(worksheet)?;

        let res = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let error_text = res.text().await?;
            return Err(CaseTrackerError::unavailable(
                "fetch",
                format!("Sheets API error (status {}): {}", status, error_text),
            ));
        }

        let body: ValueRange = res.json().await?;
        Ok(values_to_table(body.values))
    }

    /// Writes the table over the top of the worksheet, then clears whatever
    /// rows remain below it. A failed write leaves the previous contents in
    /// place.
    async fn overwrite_async(&self, worksheet: &str, table: &RawTable) -> Result<()> {
        let mut update_url = self.values_url(worksheet, "")?;
        update_url
            .query_pairs_mut()
            .append_pair("valueInputOption", "RAW");

        let values = table_to_values(table);
        let written_rows = values.len();
        let payload = ValueRange {
            range: Some(worksheet.to_string()),
            major_dimension: Some("ROWS".to_string()),
            values,
        };

        let res = self
            .client
            .put(update_url)
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let error_text = res.text().await?;
            return Err(CaseTrackerError::unavailable(
                "overwrite",
                format!("Sheets API error (status {}): {}", status, error_text),
            ));
        }

        let clear_url = self.values_url(&trailing_range(worksheet, written_rows), ":clear")?;
        let res = self
            .client
            .post(clear_url)
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let error_text = res.text().await?;
            return Err(CaseTrackerError::unavailable(
                "clear",
                format!("Sheets API error (status {}): {}", status, error_text),
            ));
        }

        Ok(())
    }
}

impl TableSource for GoogleSheetsSource {
    fn fetch(&self, worksheet: &str) -> Result<RawTable> {
        self.runtime.block_on(self.fetch_async(worksheet))
    }

    fn overwrite(&self, worksheet: &str, table: &RawTable) -> Result<()> {
        self.runtime.block_on(self.overwrite_async(worksheet, table))
    }

    fn describe(&self) -> String {
        format!("google sheet {}", self.spreadsheet_id)
    }
}

fn cell_to_text(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => match number.as_i64() {
            Some(int) => int.to_string(),
            None => number.to_string(),
        },
        other => other.to_string(),
    }
}

fn values_to_table(values: Vec<Vec<Value>>) -> RawTable {
    let mut rows = values
        .into_iter()
        .map(|row| row.iter().map(cell_to_text).collect::<Vec<_>>());

    match rows.next() {
        Some(headers) => RawTable {
            headers,
            rows: rows.collect(),
        },
        None => RawTable::default(),
    }
}

/// A1 range covering every row after the first `written_rows`.
fn trailing_range(worksheet: &str, written_rows: usize) -> String {
    format!(
        "'{}'!A{}:{}",
        worksheet.replace('\'', "''"),
        written_rows + 1,
        LAST_COLUMN
    )
}

/// Numeric columns go out as JSON numbers so the sheet keeps them numeric
/// under `RAW` input; everything else stays text.
fn table_to_values(table: &RawTable) -> Vec<Vec<Value>> {
    let numeric: Vec<bool> = table
        .headers
        .iter()
        .map(|header| {
            CanonicalColumn::from_header(header)
                .map(|column| column.is_numeric())
                .unwrap_or(false)
        })
        .collect();

    let mut values = Vec::with_capacity(table.rows.len() + 1);
    values.push(table.headers.iter().cloned().map(Value::String).collect());

    for row in &table.rows {
        let cells = row
            .iter()
            .enumerate()
            .map(|(idx, cell)| {
                let as_number = numeric
                    .get(idx)
                    .copied()
                    .unwrap_or(false)
                    .then(|| cell.parse::<f64>().ok())
                    .flatten()
                    .and_then(serde_json::Number::from_f64);
                match as_number {
                    Some(number) => Value::Number(number),
                    None => Value::String(cell.clone()),
                }
            })
            .collect();
        values.push(cells);
    }

    values
}
