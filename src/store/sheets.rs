//! Google Sheets v4 backend.
//!
//! The "connection" is an access token for a worksheet that has been checked
//! to exist (and created with a header row if it did not). It is memoized in
//! a [`TtlCache`] and dropped on refresh or on a 401.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{records_from_rows, StoreError, HEADER};
use crate::auth::service_account::{fetch_access_token, ServiceAccountKey};
use crate::models::entry::RawRecord;
use crate::services::cache::TtlCache;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const NEW_SHEET_ROWS: u32 = 100;
const NEW_SHEET_COLS: u32 = 20;

#[derive(Clone)]
pub struct SheetsStore {
    client: reqwest::Client,
    key: Arc<ServiceAccountKey>,
    api_base: String,
    spreadsheet_id: String,
    worksheet: String,
    session: TtlCache<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

impl SheetsStore {
    pub fn new(
        key: Arc<ServiceAccountKey>,
        spreadsheet_id: &str,
        worksheet: &str,
        session_ttl: Duration,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            key,
            api_base: SHEETS_API_BASE.to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            worksheet: worksheet.to_string(),
            session: TtlCache::new(session_ttl),
        })
    }

    #[cfg(test)]
    fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.to_string();
        self
    }

    pub async fn reset_session(&self) {
        self.session.force_invalidate().await;
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.access_token().await.map(|_| ())
    }

    pub async fn append(&self, timestamp: &str, mood: &str, note: &str) -> Result<(), StoreError> {
        let token = self.access_token().await?;
        let result = self
            .append_rows(&token, vec![vec![timestamp, mood, note]])
            .await;
        self.on_result(result).await
    }

    pub async fn read_all(&self) -> Result<Vec<RawRecord>, StoreError> {
        let token = self.access_token().await?;
        let result = self.read_values(&token, &a1_range(&self.worksheet, None)).await;
        let rows = self.on_result(result).await?;
        Ok(records_from_rows(rows))
    }

    /// Drop the session on auth failures so the next call re-authenticates.
    async fn on_result<T>(&self, result: Result<T, StoreError>) -> Result<T, StoreError> {
        if let Err(StoreError::Api { status: 401, .. }) = &result {
            self.session.force_invalidate().await;
        }
        result
    }

    async fn access_token(&self) -> Result<String, StoreError> {
        self.session
            .get_or_try_fetch(|| async {
                let token = fetch_access_token(&self.client, &self.key).await?;
                self.ensure_worksheet(&token).await?;
                Ok::<_, StoreError>(token)
            })
            .await
    }

    async fn ensure_worksheet(&self, token: &str) -> Result<(), StoreError> {
        let url = self.url(&[])?;
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(&[("fields", "sheets.properties.title")])
            .send()
            .await?;

        if matches!(response.status(), StatusCode::NOT_FOUND | StatusCode::FORBIDDEN) {
            return Err(StoreError::DestinationNotFound(format!(
                "Spreadsheet '{}' not found. Please check the name or share it with '{}'.",
                self.spreadsheet_id, self.key.client_email
            )));
        }
        let meta: SpreadsheetMeta = check(response).await?.json().await?;

        if !meta.sheets.iter().any(|s| s.properties.title == self.worksheet) {
            tracing::warn!(
                spreadsheet = %self.spreadsheet_id,
                worksheet = %self.worksheet,
                "Worksheet not found, creating it"
            );
            self.add_worksheet(token).await?;
            return self.append_rows(token, vec![HEADER.to_vec()]).await;
        }

        let first_row = self
            .read_values(token, &a1_range(&self.worksheet, Some("A1:C1")))
            .await?;
        if first_row.iter().all(|row| row.iter().all(|c| c.trim().is_empty())) {
            tracing::info!(worksheet = %self.worksheet, "Worksheet is empty, writing header row");
            self.append_rows(token, vec![HEADER.to_vec()]).await?;
        }

        Ok(())
    }

    async fn add_worksheet(&self, token: &str) -> Result<(), StoreError> {
        let url = self.url(&[":batchUpdate"])?;
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": self.worksheet,
                        "gridProperties": {
                            "rowCount": NEW_SHEET_ROWS,
                            "columnCount": NEW_SHEET_COLS,
                        }
                    }
                }
            }]
        });

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn append_rows(&self, token: &str, rows: Vec<Vec<&str>>) -> Result<(), StoreError> {
        let range = a1_range(&self.worksheet, Some("A1:C1"));
        let url = self.url(&["values", &format!("{}:append", range)])?;

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&json!({ "values": rows }))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn read_values(&self, token: &str, range: &str) -> Result<Vec<Vec<String>>, StoreError> {
        let url = self.url(&["values", range])?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(&[("majorDimension", "ROWS")])
            .send()
            .await?;
        let range: ValueRange = check(response).await?.json().await?;

        Ok(cells_to_strings(range.values))
    }

    /// `{base}/{spreadsheet_id}` followed by `segments`. A segment starting
    /// with `:` is a custom method on the previous segment.
    fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut path = vec![self.spreadsheet_id.clone()];
        for segment in segments {
            match segment.strip_prefix(':') {
                Some(method) => {
                    if let Some(last) = path.last_mut() {
                        last.push(':');
                        last.push_str(method);
                    }
                }
                None => path.push(segment.to_string()),
            }
        }

        let mut url = Url::parse(&self.api_base).map_err(|e| StoreError::Config(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Config("Sheets API base URL cannot take a path".into()))?
            .extend(path.iter());
        Ok(url)
    }
}

/// A1 range on a named sheet, quoting the name.
fn a1_range(worksheet: &str, cells: Option<&str>) -> String {
    let quoted = format!("'{}'", worksheet.replace('\'', "''"));
    match cells {
        Some(cells) => format!("{}!{}", quoted, cells),
        None => quoted,
    }
}

fn cells_to_strings(values: Vec<Vec<Value>>) -> Vec<Vec<String>> {
    values
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| match cell {
                    Value::String(s) => s,
                    Value::Null => String::new(),
                    other => other.to_string(),
                })
                .collect()
        })
        .collect()
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    Err(StoreError::Api { status, message })
}
