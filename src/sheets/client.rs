use std::time::{Duration, Instant};

use log::debug;
use reqwest::Url;
use serde::de::DeserializeOwned;

use super::types::{ErrorEnvelope, SpreadsheetResponse, ValueRange};
use super::{SheetSource, SheetsError};

const API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Truncate a string for log output, appending "..." if truncated.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let mut end = max_len;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

/// Read-only client for one spreadsheet, authenticated with an API key.
pub struct SheetsClient {
    sheet_id: String,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl SheetsClient {
    pub fn new(sheet_id: &str, api_key: &str) -> Result<Self, SheetsError> {
        let sheet_id = sheet_id.trim();
        let api_key = api_key.trim();
        if sheet_id.is_empty() {
            return Err(SheetsError::MissingConfig("id"));
        }
        if api_key.is_empty() {
            return Err(SheetsError::MissingConfig("API key"));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| SheetsError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            sheet_id: sheet_id.to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    /// Build `{API_URL}/{sheet_id}/{segments...}?key=...`, percent-encoding each segment.
    fn url(&self, segments: &[&str]) -> Result<Url, SheetsError> {
        let mut url = Url::parse(API_URL).map_err(|e| SheetsError::InvalidResponse(e.to_string()))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| SheetsError::InvalidResponse("API URL cannot be a base".into()))?;
            path.push(&self.sheet_id);
            for segment in segments {
                path.push(segment);
            }
        }
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, SheetsError> {
        // The query string carries the API key; keep it out of the logs.
        debug!("GET {}", url.path());

        let start = Instant::now();
        let response = self.client.get(url).send().map_err(|e| {
            debug!("  network error after {:?}: {}", start.elapsed(), e);
            SheetsError::Network(e.without_url().to_string())
        })?;

        let status = response.status();
        debug!("  response: {} in {:?}", status, start.elapsed());
        let body = response
            .text()
            .map_err(|e| SheetsError::InvalidResponse(format!("failed to read body: {}", e)))?;
        debug!("  response body: {} bytes", body.len());

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| truncate_for_log(&body, 200));
            debug!("  API error ({}): {}", status.as_u16(), message);
            return Err(SheetsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            debug!("  deserialization error: {}", e);
            SheetsError::InvalidResponse(format!("{}\n\nResponse body:\n{}", e, truncate_for_log(&body, 500)))
        })
    }
}

impl SheetSource for SheetsClient {
    fn sheet_titles(&self) -> Result<Vec<String>, SheetsError> {
        let url = self.url(&[])?;
        let response: SpreadsheetResponse = self.get(url)?;
        Ok(response.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    fn sheet_values(&self, title: &str) -> Result<Vec<Vec<String>>, SheetsError> {
        let range = format!("'{}'", title.replace('\'', "''"));
        let url = self.url(&["values", &range])?;
        let response: ValueRange = self.get(url)?;
        Ok(response.into_rows())
    }
}
