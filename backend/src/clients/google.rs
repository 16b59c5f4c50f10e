//! Google Sheets v4 / Drive v3 client over plain REST calls.
//!
//! Authorization is a bearer access token obtained elsewhere (the OAuth
//! consent flow is not part of this service). The token is either fixed in
//! configuration or re-read from a `tokens.json` file on every call, so an
//! external refresher can rotate it without a restart.

use crate::clients::{RevisionSource, SpreadsheetStore};
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::model::revision::Revision;
use common::model::sheet::{SheetMetadata, SpreadsheetSnapshot};
use log::debug;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;

const REVISION_FIELDS: &str =
    "nextPageToken,revisions(id,modifiedTime,lastModifyingUser(displayName))";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessToken {
    Static(String),
    /// JSON file with at least an `access_token` field.
    File(PathBuf),
}

#[derive(Deserialize)]
struct TokenFile {
    access_token: String,
}

impl AccessToken {
    async fn resolve(&self) -> std::result::Result<String, String> {
        match self {
            AccessToken::Static(token) => Ok(token.clone()),
            AccessToken::File(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|e| format!("token file {}: {}", path.display(), e))?;
                let file: TokenFile = serde_json::from_slice(&bytes)
                    .map_err(|e| format!("token file {}: {}", path.display(), e))?;
                Ok(file.access_token)
            }
        }
    }
}

/// Quotes a sheet title for A1 notation: `New Sheet` becomes `'New Sheet'`.
/// On its own this addresses every cell of the sheet.
pub fn sheet_range(sheet_title: &str) -> String {
    format!("'{}'", sheet_title.replace('\'', "''"))
}

/// `cell` (or `A1:B2`-style block) on the sheet titled `sheet_title`.
pub fn a1_range(sheet_title: &str, cell: &str) -> String {
    format!("{}!{}", sheet_range(sheet_title), cell)
}

/// Body of `spreadsheets.create` seeding the first sheet with `rows`.
fn create_body(title: &str, rows: &[Vec<String>]) -> serde_json::Value {
    let row_data: Vec<_> = rows
        .iter()
        .map(|row| {
            let values: Vec<_> = row
                .iter()
                .map(|cell| json!({ "userEnteredValue": { "stringValue": cell } }))
                .collect();
            json!({ "values": values })
        })
        .collect();

    json!({
        "properties": { "title": title },
        "sheets": [{
            "properties": { "title": title },
            "data": [{ "rowData": row_data }]
        }]
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedSpreadsheet {
    spreadsheet_id: String,
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    properties: SpreadsheetProperties,
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SpreadsheetProperties {
    title: String,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SpreadsheetProperties,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RevisionPage {
    #[serde(default)]
    revisions: Vec<DriveRevision>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveRevision {
    id: String,
    modified_time: DateTime<Utc>,
    last_modifying_user: Option<DriveUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveUser {
    display_name: Option<String>,
}

impl From<DriveRevision> for Revision {
    fn from(r: DriveRevision) -> Self {
        Revision {
            id: r.id,
            modified_time: r.modified_time,
            modified_by: r.last_modifying_user.and_then(|u| u.display_name),
        }
    }
}

pub struct GoogleClient {
    http: Client,
    token: AccessToken,
    sheets_url: String,
    drive_url: String,
}

impl GoogleClient {
    /// Fails only when the HTTP client cannot be built (e.g. no TLS backend).
    pub fn new(
        token: AccessToken,
        sheets_url: &str,
        drive_url: &str,
    ) -> std::result::Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            http,
            token,
            sheets_url: sheets_url.trim_end_matches('/').to_string(),
            drive_url: drive_url.trim_end_matches('/').to_string(),
        })
    }

    /// Joins `segments` onto `base`, percent-encoding each one.
    fn endpoint(base: &str, segments: &[&str]) -> std::result::Result<Url, String> {
        let mut url = Url::parse(base).map_err(|e| format!("invalid base url {}: {}", base, e))?;
        url.path_segments_mut()
            .map_err(|_| format!("base url {} cannot take a path", base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn sheets(&self, segments: &[&str]) -> std::result::Result<Url, String> {
        let mut all = vec!["v4", "spreadsheets"];
        all.extend_from_slice(segments);
        Self::endpoint(&self.sheets_url, &all)
    }

    fn drive(&self, segments: &[&str]) -> std::result::Result<Url, String> {
        let mut all = vec!["drive", "v3", "files"];
        all.extend_from_slice(segments);
        Self::endpoint(&self.drive_url, &all)
    }

    /// Sends an authorized request. Non-2xx answers become errors carrying the
    /// status and the response body.
    async fn execute(&self, request: RequestBuilder) -> std::result::Result<Response, String> {
        let token = self.token.resolve().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(format!("status={} body={}", status, body))
        }
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> std::result::Result<T, String> {
        self.execute(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| format!("decode response: {}", e))
    }

    async fn fetch_meta(&self, resource_id: &str) -> Result<SpreadsheetMeta> {
        let url = self.sheets(&[resource_id]).map_err(SyncError::RemoteRead)?;
        let request = self
            .http
            .get(url)
            .query(&[("fields", "properties.title,sheets.properties.title")]);
        self.read_json(request).await.map_err(SyncError::RemoteRead)
    }
}

#[async_trait]
impl RevisionSource for GoogleClient {
    async fn list_revisions(&self, resource_id: &str) -> Result<Vec<Revision>> {
        let url = self
            .drive(&[resource_id, "revisions"])
            .map_err(SyncError::RemoteRead)?;
        let mut revisions = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(url.clone())
                .query(&[("fields", REVISION_FIELDS), ("pageSize", "1000")]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }
            let page: RevisionPage = self.read_json(request).await.map_err(SyncError::RemoteRead)?;
            revisions.extend(page.revisions.into_iter().map(Revision::from));
            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!("listed {} revisions for {}", revisions.len(), resource_id);
        Ok(revisions)
    }
}

#[async_trait]
impl SpreadsheetStore for GoogleClient {
    async fn create(&self, title: &str, rows: &[Vec<String>]) -> Result<String> {
        let url = self.sheets(&[]).map_err(SyncError::RemoteWrite)?;
        let request = self.http.post(url).json(&create_body(title, rows));
        let created: CreatedSpreadsheet = self
            .read_json(request)
            .await
            .map_err(SyncError::RemoteWrite)?;
        Ok(created.spreadsheet_id)
    }

    async fn get_metadata(&self, resource_id: &str) -> Result<SheetMetadata> {
        let meta = self.fetch_meta(resource_id).await?;
        Ok(SheetMetadata {
            title: meta.properties.title,
        })
    }

    async fn clear_range(&self, resource_id: &str, range: &str) -> Result<()> {
        let clear = format!("{}:clear", range);
        let url = self
            .sheets(&[resource_id, "values", &clear])
            .map_err(SyncError::RemoteWrite)?;
        self.execute(self.http.post(url).json(&json!({})))
            .await
            .map_err(SyncError::RemoteWrite)?;
        Ok(())
    }

    async fn overwrite_range(
        &self,
        resource_id: &str,
        range: &str,
        rows: &[Vec<String>],
    ) -> Result<()> {
        let url = self
            .sheets(&[resource_id, "values", range])
            .map_err(SyncError::RemoteWrite)?;
        let request = self
            .http
            .put(url)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&json!({ "range": range, "majorDimension": "ROWS", "values": rows }));
        self.execute(request).await.map_err(SyncError::RemoteWrite)?;
        Ok(())
    }

    async fn get(&self, resource_id: &str) -> Result<SpreadsheetSnapshot> {
        let meta = self.fetch_meta(resource_id).await?;
        let sheet_title = meta
            .sheets
            .first()
            .map(|s| s.properties.title.clone())
            .ok_or_else(|| {
                SyncError::RemoteRead(format!("spreadsheet {} has no sheets", resource_id))
            })?;

        let url = self
            .sheets(&[resource_id, "values", &a1_range(&sheet_title, "A1:ZZ")])
            .map_err(SyncError::RemoteRead)?;
        let range: ValueRange = self
            .read_json(self.http.get(url).query(&[("valueRenderOption", "FORMATTED_VALUE")]))
            .await
            .map_err(SyncError::RemoteRead)?;

        let mut values = range.values.into_iter();
        Ok(SpreadsheetSnapshot {
            title: meta.properties.title,
            header: values.next().unwrap_or_default(),
            rows: values.collect(),
        })
    }

    async fn grant_access(&self, resource_id: &str, principal: &str, role: &str) -> Result<()> {
        let url = self
            .drive(&[resource_id, "permissions"])
            .map_err(SyncError::RemoteWrite)?;
        let request = self.http.post(url).json(&json!({
            "type": "user",
            "role": role,
            "emailAddress": principal,
        }));
        self.execute(request).await.map_err(SyncError::RemoteWrite)?;
        Ok(())
    }

    async fn delete(&self, resource_id: &str) -> Result<()> {
        let url = self.drive(&[resource_id]).map_err(SyncError::RemoteWrite)?;
        self.execute(self.http.delete(url))
            .await
            .map_err(SyncError::RemoteWrite)?;
        Ok(())
    }
}
