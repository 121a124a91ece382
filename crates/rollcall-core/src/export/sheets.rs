//! Google Sheets v4 client authenticated as a service account.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::report::{date_report, date_sheet_name, range_report, SheetReport};
use super::ExportError;
use crate::models::{AttendanceWithMember, Member};
use crate::remote::{send_json, RemoteError};

const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Sheet name for range exports when the caller gives none
pub const DEFAULT_SHEET_NAME: &str = "Attendance Report";

/// Lifetime requested for each access token.
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Refresh the cached token this long before it expires.
const TOKEN_REFRESH_BUFFER_SECS: i64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SheetsCredentials {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl SheetsCredentials {
    /// Build credentials from the raw environment values.
    ///
    /// A service-account JSON document wins over the separate email and key.
    /// Returns `Ok(None)` when neither form is present.
    pub fn from_env_values(
        service_account_json: Option<&str>,
        client_email: Option<&str>,
        private_key: Option<&str>,
    ) -> Result<Option<Self>, ExportError> {
        if let Some(raw) = service_account_json.filter(|s| !s.trim().is_empty()) {
            let creds: SheetsCredentials = serde_json::from_str(raw).map_err(|e| {
                ExportError::Credentials(format!("Invalid service account JSON: {}", e))
            })?;
            return Ok(Some(creds));
        }

        match (client_email, private_key) {
            (Some(email), Some(key)) if !email.trim().is_empty() && !key.trim().is_empty() => {
                Ok(Some(Self {
                    client_email: email.trim().to_string(),
                    // keys pasted into .env files carry literal \n sequences
                    private_key: key.replace("\\n", "\n"),
                    token_uri: default_token_uri(),
                }))
            }
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn needs_refresh(&self) -> bool {
        Utc::now() + Duration::seconds(TOKEN_REFRESH_BUFFER_SECS) > self.expires_at
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct Sheet {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Spreadsheet {
    spreadsheet_id: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetSheets {
    #[serde(default)]
    sheets: Vec<Sheet>,
}

#[derive(Debug, Deserialize)]
struct BatchUpdateResponse {
    #[serde(default)]
    replies: Vec<Value>,
}

/// Where an export landed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ExportResult {
    pub spreadsheet_id: String,
    pub spreadsheet_url: String,
    pub rows_written: usize,
}

impl ExportResult {
    fn new(spreadsheet_id: String, rows_written: usize) -> Self {
        Self {
            spreadsheet_url: format!("https://docs.google.com/spreadsheets/d/{}", spreadsheet_id),
            spreadsheet_id,
            rows_written,
        }
    }
}

/// Google Sheets client.
/// Access tokens are cached until shortly before they expire.
pub struct SheetsClient {
    client: reqwest::Client,
    credentials: SheetsCredentials,
    token: Mutex<Option<AccessToken>>,
}

impl SheetsClient {
    pub fn new(credentials: SheetsCredentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
            token: Mutex::new(None),
        }
    }

    pub fn client_email(&self) -> &str {
        &self.credentials.client_email
    }

    fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String, ExportError> {
        let claims = AssertionClaims {
            iss: &self.credentials.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.credentials.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + TOKEN_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| ExportError::Credentials(format!("Invalid private key: {}", e)))?;
        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| ExportError::Credentials(format!("Failed to sign assertion: {}", e)))
    }

    /// A valid access token, exchanging a fresh assertion when needed
    async fn access_token(&self) -> Result<String, ExportError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| !t.needs_refresh()) {
            return Ok(token.token.clone());
        }

        let now = Utc::now();
        let assertion = self.signed_assertion(now)?;
        let form = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ];
        let response: TokenResponse = send_json("google-oauth", || {
            self.client.post(&self.credentials.token_uri).form(&form)
        })
        .await?;

        let expires_in = response.expires_in.unwrap_or(TOKEN_LIFETIME_SECS);
        debug!(expires_in, "Obtained Google access token");
        let token = AccessToken {
            token: response.access_token,
            expires_at: now + Duration::seconds(expires_in),
        };
        let value = token.token.clone();
        *cached = Some(token);
        Ok(value)
    }

    fn values_url(spreadsheet_id: &str, range: &str, suffix: &str) -> Result<Url, ExportError> {
        let mut url = Url::parse(&format!("{}/{}/values", SHEETS_API_URL, spreadsheet_id))
            .map_err(|e| ExportError::InvalidTarget(format!("{}: {}", spreadsheet_id, e)))?;
        url.path_segments_mut()
            .map_err(|_| ExportError::InvalidTarget(spreadsheet_id.to_string()))?
            .push(&format!("{}{}", range, suffix));
        Ok(url)
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &Value,
    ) -> Result<T, ExportError> {
        let token = self.access_token().await?;
        Ok(send_json("sheets", || self.client.post(url).bearer_auth(&token).json(body)).await?)
    }

    async fn create_spreadsheet(&self, title: &str, sheet_name: &str) -> Result<(String, i64), ExportError> {
        let body = json!({
            "properties": { "title": title },
            "sheets": [{ "properties": { "title": sheet_name } }]
        });
        let created: Value = self.post_json(SHEETS_API_URL, &body).await?;
        let spreadsheet: Spreadsheet = serde_json::from_value(created.clone())
            .map_err(|e| RemoteError::InvalidResponse(format!("sheets: {}", e)))?;
        let sheets: SpreadsheetSheets = serde_json::from_value(created)
            .map_err(|e| RemoteError::InvalidResponse(format!("sheets: {}", e)))?;
        let sheet_id = sheets
            .sheets
            .iter()
            .find(|s| s.properties.title == sheet_name)
            .map_or(0, |s| s.properties.sheet_id);

        info!(spreadsheet_id = %spreadsheet.spreadsheet_id, "Created spreadsheet");
        Ok((spreadsheet.spreadsheet_id, sheet_id))
    }

    async fn find_sheet_id(&self, spreadsheet_id: &str, sheet_name: &str) -> Result<i64, ExportError> {
        let token = self.access_token().await?;
        let url = format!("{}/{}", SHEETS_API_URL, spreadsheet_id);
        let found: SpreadsheetSheets = send_json("sheets", || {
            self.client
                .get(&url)
                .query(&[("fields", "sheets.properties")])
                .bearer_auth(&token)
        })
        .await?;
        found
            .sheets
            .into_iter()
            .find(|s| s.properties.title == sheet_name)
            .map(|s| s.properties.sheet_id)
            .ok_or_else(|| {
                RemoteError::NotFound(format!("sheet '{}' in {}", sheet_name, spreadsheet_id)).into()
            })
    }

    /// Add `sheet_name` to an existing spreadsheet, or clear it if it already exists
    async fn prepare_sheet(&self, spreadsheet_id: &str, sheet_name: &str) -> Result<i64, ExportError> {
        let url = format!("{}/{}:batchUpdate", SHEETS_API_URL, spreadsheet_id);
        let body = json!({
            "requests": [{ "addSheet": { "properties": { "title": sheet_name } } }]
        });

        match self.post_json::<BatchUpdateResponse>(&url, &body).await {
            Ok(response) => {
                let sheet_id = response
                    .replies
                    .first()
                    .and_then(|r| r.pointer("/addSheet/properties/sheetId"))
                    .and_then(Value::as_i64)
                    .unwrap_or(0);
                Ok(sheet_id)
            }
            Err(ExportError::Remote(RemoteError::BadRequest(reason))) => {
                warn!(sheet = sheet_name, reason = %reason, "Could not add sheet, clearing it instead");
                let sheet_id = self.find_sheet_id(spreadsheet_id, sheet_name).await?;
                let clear_url = Self::values_url(spreadsheet_id, &format!("{}!A:Z", sheet_name), ":clear")?;
                self.post_json::<Value>(clear_url.as_str(), &json!({})).await?;
                Ok(sheet_id)
            }
            Err(e) => Err(e),
        }
    }

    async fn write_values(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        report: &SheetReport,
    ) -> Result<(), ExportError> {
        let token = self.access_token().await?;
        let url = Self::values_url(spreadsheet_id, &format!("{}!A1", sheet_name), "")?;
        let body = json!({ "values": report.rows });
        let _: Value = send_json("sheets", || {
            self.client
                .put(url.clone())
                .query(&[("valueInputOption", "RAW")])
                .bearer_auth(&token)
                .json(&body)
        })
        .await?;
        Ok(())
    }

    async fn format_header(
        &self,
        spreadsheet_id: &str,
        sheet_id: i64,
        columns: usize,
    ) -> Result<(), ExportError> {
        let url = format!("{}/{}:batchUpdate", SHEETS_API_URL, spreadsheet_id);
        let body = json!({
            "requests": [
                {
                    "repeatCell": {
                        "range": { "sheetId": sheet_id, "startRowIndex": 0, "endRowIndex": 1 },
                        "cell": {
                            "userEnteredFormat": {
                                "backgroundColor": { "red": 0.2, "green": 0.5, "blue": 0.8 },
                                "textFormat": {
                                    "bold": true,
                                    "foregroundColor": { "red": 1, "green": 1, "blue": 1 }
                                }
                            }
                        },
                        "fields": "userEnteredFormat(backgroundColor,textFormat)"
                    }
                },
                {
                    "autoResizeDimensions": {
                        "dimensions": {
                            "sheetId": sheet_id,
                            "dimension": "COLUMNS",
                            "startIndex": 0,
                            "endIndex": columns
                        }
                    }
                }
            ]
        });
        let _: Value = self.post_json(&url, &body).await?;
        Ok(())
    }

    async fn publish(
        &self,
        spreadsheet_id: Option<&str>,
        title: &str,
        sheet_name: &str,
        report: &SheetReport,
    ) -> Result<ExportResult, ExportError> {
        let (spreadsheet_id, sheet_id) = match spreadsheet_id.filter(|id| !id.trim().is_empty()) {
            Some(id) => (id.to_string(), self.prepare_sheet(id, sheet_name).await?),
            None => self.create_spreadsheet(title, sheet_name).await?,
        };

        self.write_values(&spreadsheet_id, sheet_name, report).await?;
        self.format_header(&spreadsheet_id, sheet_id, report.columns).await?;

        info!(spreadsheet_id = %spreadsheet_id, sheet = sheet_name, rows = report.len(), "Exported report");
        Ok(ExportResult::new(spreadsheet_id, report.len()))
    }

    /// Export every record in a date range (already fetched by the caller)
    pub async fn export_range(
        &self,
        records: &[AttendanceWithMember],
        spreadsheet_id: Option<&str>,
        sheet_name: Option<&str>,
    ) -> Result<ExportResult, ExportError> {
        let sheet_name = sheet_name
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_SHEET_NAME);
        let title = format!("Sunday School Attendance - {}", Utc::now().format("%Y-%m-%d %H:%M"));
        let report = range_report(records);
        self.publish(spreadsheet_id, &title, sheet_name, &report).await
    }

    /// Export one date's attendance for the whole roster
    pub async fn export_date(
        &self,
        date: NaiveDate,
        members: &[Member],
        records: &[AttendanceWithMember],
        spreadsheet_id: Option<&str>,
    ) -> Result<ExportResult, ExportError> {
        let sheet_name = date_sheet_name(date);
        let title = format!("Sunday School - {}", sheet_name);
        let report = date_report(members, records);
        self.publish(spreadsheet_id, &title, &sheet_name, &report).await
    }
}
