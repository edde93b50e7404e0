// Google Sheets v4 values client
// Blocking reqwest client; only values.get and values.update are used.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::auth::Credentials;
use crate::remote::{RemoteError, RemoteStore, ValueInputOption};
use crate::settings::Settings;

pub struct SheetsClient {
    http: Client,
    api_base: String,
    spreadsheet_id: String,
    credentials: Credentials,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeBody<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: Vec<Vec<String>>,
}

impl SheetsClient {
    pub fn new(
        api_base: String,
        spreadsheet_id: String,
        credentials: Credentials,
    ) -> Result<Self, RemoteError> {
        let http = Client::builder()
            .user_agent(format!("shot-tracker/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_base,
            spreadsheet_id,
            credentials,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, RemoteError> {
        let credentials = Credentials::load(settings.token_path())?;
        Self::new(
            settings.api_base.clone(),
            settings.spreadsheet_id.clone(),
            credentials,
        )
    }

    fn values_url(&self, range: &str) -> Result<Url, RemoteError> {
        values_url(&self.api_base, &self.spreadsheet_id, range)
    }

    /// Send an authorized request. A 401 is retried once with a freshly
    /// refreshed token when the token file carries a refresh token.
    fn send(&mut self, build: impl Fn(&Client, &str) -> RequestBuilder) -> Result<Response, RemoteError> {
        let token = self.credentials.access_token(&self.http)?;
        let response = build(&self.http, &token).send().map_err(network_error)?;

        if response.status() == StatusCode::UNAUTHORIZED && self.credentials.can_refresh() {
            log::info!("Access token rejected, refreshing and retrying");
            let token = self.credentials.refresh(&self.http)?;
            let response = build(&self.http, &token).send().map_err(network_error)?;
            return check(response);
        }
        check(response)
    }
}

impl RemoteStore for SheetsClient {
    fn get(&mut self, range: &str) -> Result<Vec<Vec<String>>, RemoteError> {
        let url = self.values_url(range)?;
        let body: ValueRange = self
            .send(|http, token| http.get(url.clone()).bearer_auth(token))?
            .json()
            .map_err(|e| RemoteError::Parse(e.to_string()))?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    fn update(
        &mut self,
        range: &str,
        values: Vec<Vec<String>>,
        input: ValueInputOption,
    ) -> Result<(), RemoteError> {
        let mut url = self.values_url(range)?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", input.as_str());

        let body = ValueRangeBody {
            range,
            major_dimension: "ROWS",
            values,
        };
        self.send(|http, token| http.put(url.clone()).bearer_auth(token).json(&body))?;
        Ok(())
    }
}

fn network_error(e: reqwest::Error) -> RemoteError {
    RemoteError::Network(e.to_string())
}

fn check(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().unwrap_or_default();
    Err(RemoteError::Http {
        status: status.as_u16(),
        message,
    })
}

/// `{api_base}/v4/spreadsheets/{id}/values/{range}` with the range escaped as
/// a single path segment.
fn values_url(api_base: &str, spreadsheet_id: &str, range: &str) -> Result<Url, RemoteError> {
    let mut url = Url::parse(api_base).map_err(|e| RemoteError::Parse(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| RemoteError::Parse(format!("`{}` cannot be a base URL", api_base)))?
        .pop_if_empty()
        .extend(["v4", "spreadsheets", spreadsheet_id, "values", range]);
    Ok(url)
}

/// Formatted values arrive as strings; anything else is rendered as JSON text.
fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
