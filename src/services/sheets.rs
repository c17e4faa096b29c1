// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Spreadsheet writer backed by Google Sheets.
//!
//! The spreadsheet is opened once at startup (looked up by name through
//! Drive unless an ID is configured) and its first worksheet receives every
//! harvested row. Rows are only ever appended: nothing is read back except
//! to decide whether the header row still needs to be written.

use crate::config::SpreadsheetTarget;
use crate::error::AppError;
use crate::models::SubscriptionRecord;
use crate::services::google_auth::ServiceAccountTokenSource;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::{Arc, Mutex};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

/// Destination for harvested subscription rows.
#[async_trait]
pub trait SpreadsheetWriter: Send + Sync {
    /// Append `records` in order, writing the header row first if the sheet
    /// is empty. Never merges or deduplicates.
    async fn append(&self, records: &[SubscriptionRecord]) -> Result<(), AppError>;
}

/// API roots for Sheets and Drive.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub sheets: String,
    pub drive: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            sheets: SHEETS_API_BASE.to_string(),
            drive: DRIVE_API_BASE.to_string(),
        }
    }
}

impl GoogleEndpoints {
    /// Both APIs served from one root (used by tests).
    pub fn single_host(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            sheets: format!("{}/v4", base),
            drive: format!("{}/drive/v3", base),
        }
    }
}

/// Handle to the first worksheet of one spreadsheet.
pub struct SheetsClient {
    http: reqwest::Client,
    tokens: ServiceAccountTokenSource,
    endpoints: GoogleEndpoints,
    spreadsheet_id: String,
    worksheet_title: String,
}

impl SheetsClient {
    /// Open the target spreadsheet with the public Google endpoints.
    pub async fn open(
        tokens: ServiceAccountTokenSource,
        target: &SpreadsheetTarget,
    ) -> Result<Self, AppError> {
        Self::open_with_endpoints(tokens, target, GoogleEndpoints::default()).await
    }

    /// Resolve the spreadsheet and bind its first worksheet.
    pub async fn open_with_endpoints(
        tokens: ServiceAccountTokenSource,
        target: &SpreadsheetTarget,
        endpoints: GoogleEndpoints,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::new();
        let access_token = tokens.access_token().await?;

        let spreadsheet_id = match target {
            SpreadsheetTarget::Id(id) => id.clone(),
            SpreadsheetTarget::Name(name) => {
                find_spreadsheet_by_name(&http, &endpoints, &access_token, name).await?
            }
        };

        let url = format!("{}/spreadsheets/{}", endpoints.sheets, spreadsheet_id);
        let metadata: SpreadsheetMetadata = send_json(
            http.get(&url)
                .bearer_auth(&access_token)
                .query(&[("fields", "sheets.properties(title,index)")]),
        )
        .await?;

        let worksheet_title = metadata
            .sheets
            .into_iter()
            .map(|s| s.properties)
            .min_by_key(|p| p.index)
            .map(|p| p.title)
            .ok_or_else(|| {
                AppError::Spreadsheet(format!("Spreadsheet {} has no worksheets", spreadsheet_id))
            })?;

        tracing::debug!(
            spreadsheet_id = %spreadsheet_id,
            worksheet = %worksheet_title,
            client_email = %tokens.client_email(),
            "Opened spreadsheet"
        );

        Ok(Self {
            http,
            tokens,
            endpoints,
            spreadsheet_id,
            worksheet_title,
        })
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    pub fn worksheet_title(&self) -> &str {
        &self.worksheet_title
    }

    /// A1 range covering `columns` of the bound worksheet.
    fn range(&self, columns: &str) -> String {
        format!("'{}'!{}", self.worksheet_title.replace('\'', "''"), columns)
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}",
            self.endpoints.sheets,
            self.spreadsheet_id,
            urlencoding::encode(range)
        )
    }

    /// True if the worksheet has no rows. Column A holds `user_id`, which
    /// every written row (header included) fills.
    async fn is_empty(&self, access_token: &str) -> Result<bool, AppError> {
        let url = self.values_url(&self.range("A:A"));
        let range: ValueRange = send_json(
            self.http
                .get(&url)
                .bearer_auth(access_token)
                .query(&[("majorDimension", "ROWS")]),
        )
        .await?;

        Ok(range.values.iter().all(|row| row.is_empty()))
    }
}

#[async_trait]
impl SpreadsheetWriter for SheetsClient {
    async fn append(&self, records: &[SubscriptionRecord]) -> Result<(), AppError> {
        if records.is_empty() {
            return Ok(());
        }

        let access_token = self.tokens.access_token().await?;

        let mut values = Vec::with_capacity(records.len() + 1);
        if self.is_empty(&access_token).await? {
            tracing::info!(worksheet = %self.worksheet_title, "Writing header row");
            values.push(SubscriptionRecord::header_row());
        }
        values.extend(records.iter().map(SubscriptionRecord::to_row));

        let url = format!("{}:append", self.values_url(&self.range("A1")));
        let body = serde_json::json!({
            "majorDimension": "ROWS",
            "values": values,
        });

        let _: serde_json::Value = send_json(
            self.http
                .post(&url)
                .bearer_auth(&access_token)
                .query(&[
                    ("valueInputOption", "RAW"),
                    ("insertDataOption", "INSERT_ROWS"),
                ])
                .json(&body),
        )
        .await?;

        tracing::info!(rows = records.len(), "Appended rows to spreadsheet");
        Ok(())
    }
}

async fn find_spreadsheet_by_name(
    http: &reqwest::Client,
    endpoints: &GoogleEndpoints,
    access_token: &str,
    name: &str,
) -> Result<String, AppError> {
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    let query = format!(
        "name = '{}' and mimeType = '{}' and trashed = false",
        escaped, SPREADSHEET_MIME_TYPE
    );

    let url = format!("{}/files", endpoints.drive);
    let files: FileList = send_json(
        http.get(&url).bearer_auth(access_token).query(&[
            ("q", query.as_str()),
            ("fields", "files(id,name)"),
            ("pageSize", "1"),
            ("supportsAllDrives", "true"),
            ("includeItemsFromAllDrives", "true"),
        ]),
    )
    .await?;

    files
        .files
        .into_iter()
        .next()
        .map(|f| f.id)
        .ok_or_else(|| {
            AppError::Spreadsheet(format!(
                "Spreadsheet '{}' not found or not shared with the service account",
                name
            ))
        })
}

/// Send a request and parse the JSON body, mapping failures to
/// `AppError::Spreadsheet`.
async fn send_json<T: for<'de> Deserialize<'de>>(
    request: reqwest::RequestBuilder,
) -> Result<T, AppError> {
    let response = request
        .send()
        .await
        .map_err(|e| AppError::Spreadsheet(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Spreadsheet(format!("HTTP {}: {}", status, body)));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::Spreadsheet(format!("JSON parse error: {}", e)))
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<Sheet>,
}

#[derive(Debug, Deserialize)]
struct Sheet {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
    #[serde(default)]
    index: u32,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// InMemorySheet - test double
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory worksheet with the same append semantics as [`SheetsClient`].
#[derive(Clone, Default)]
pub struct InMemorySheet {
    rows: Arc<Mutex<Vec<Vec<String>>>>,
    fail_with: Arc<Mutex<Option<String>>>,
}

impl InMemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows written so far, header included.
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.rows.lock().map(|rows| rows.clone()).unwrap_or_default()
    }

    /// Make subsequent appends fail with `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        if let Ok(mut fail) = self.fail_with.lock() {
            *fail = Some(message.into());
        }
    }
}

#[async_trait]
impl SpreadsheetWriter for InMemorySheet {
    async fn append(&self, records: &[SubscriptionRecord]) -> Result<(), AppError> {
        if let Some(message) = self.fail_with.lock().ok().and_then(|f| f.clone()) {
            return Err(AppError::Spreadsheet(message));
        }
        if records.is_empty() {
            return Ok(());
        }

        let mut rows = self
            .rows
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("In-memory sheet poisoned")))?;
        if rows.is_empty() {
            rows.push(SubscriptionRecord::header_row());
        }
        rows.extend(records.iter().map(SubscriptionRecord::to_row));
        Ok(())
    }
}
