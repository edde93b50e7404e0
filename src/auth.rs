// OAuth token storage for the Sheets backend
// Reads the authorized-user token.json left by the Google consent flow and
// refreshes the access token when it expires. The consent flow itself is
// run by external tooling.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Refresh this long before the recorded expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("not signed in: no token file at {}", .0.display())]
    NotAuthenticated(PathBuf),
    #[error("access token expired and no refresh token is stored")]
    Expired,
    #[error("token refresh failed: {0}")]
    Refresh(String),
    #[error("token file I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid token file: {0}")]
    Parse(#[from] serde_json::Error),
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Contents of `token.json`. Unknown keys are carried through on save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizedUser {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    error_description: Option<String>,
}

impl AuthorizedUser {
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        if !path.exists() {
            return Err(AuthError::NotAuthenticated(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the token file, 0600 on Unix.
    pub fn save(&self, path: &Path) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    /// A token without a recorded expiry is assumed valid until the API
    /// rejects it.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry <= now + Duration::seconds(EXPIRY_SKEW_SECS),
            None => false,
        }
    }

    pub fn refresh(&mut self, http: &reqwest::blocking::Client) -> Result<(), AuthError> {
        let refresh_token = self.refresh_token.clone().ok_or(AuthError::Expired)?;

        let resp = http
            .post(&self.token_uri)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .map_err(|e| AuthError::Refresh(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(desc) => format!("{} ({})", err.error, desc),
                    None => err.error,
                },
                Err(_) => format!("HTTP {}", status.as_u16()),
            };
            return Err(AuthError::Refresh(message));
        }

        let token: TokenResponse = resp.json().map_err(|e| AuthError::Refresh(e.to_string()))?;
        self.apply(token, Utc::now());
        Ok(())
    }

    fn apply(&mut self, token: TokenResponse, now: DateTime<Utc>) {
        self.token = token.access_token;
        self.expiry = Some(now + Duration::seconds(token.expires_in));
        if let Some(refresh_token) = token.refresh_token {
            self.refresh_token = Some(refresh_token);
        }
    }
}

/// A token file bound to its location, refreshed and re-saved on demand.
#[derive(Debug, Clone)]
pub struct Credentials {
    user: AuthorizedUser,
    path: PathBuf,
}

impl Credentials {
    pub fn load(path: PathBuf) -> Result<Self, AuthError> {
        let user = AuthorizedUser::load(&path)?;
        Ok(Self { user, path })
    }

    pub fn access_token(&mut self, http: &reqwest::blocking::Client) -> Result<String, AuthError> {
        if self.user.needs_refresh(Utc::now()) {
            return self.refresh(http);
        }
        Ok(self.user.token.clone())
    }

    pub fn can_refresh(&self) -> bool {
        self.user.refresh_token.is_some()
    }

    /// Exchange the refresh token for a new access token and persist it.
    pub fn refresh(&mut self, http: &reqwest::blocking::Client) -> Result<String, AuthError> {
        log::info!("Refreshing access token");
        self.user.refresh(http)?;
        if let Err(e) = self.user.save(&self.path) {
            log::warn!("Could not persist refreshed token to {}: {}", self.path.display(), e);
        }
        Ok(self.user.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN_JSON: &str = r#"{
        "token": "ya29.old",
        "refresh_token": "1//refresh",
        "token_uri": "https://oauth2.googleapis.com/token",
        "client_id": "id.apps.googleusercontent.com",
        "client_secret": "secret",
        "scopes": ["https://www.googleapis.com/auth/spreadsheets"],
        "expiry": "2024-01-15T14:30:00.123456Z"
    }"#;

    #[test]
    fn parses_authorized_user_file() {
        let user: AuthorizedUser = serde_json::from_str(TOKEN_JSON).unwrap();
        assert_eq!(user.token, "ya29.old");
        assert_eq!(user.refresh_token.as_deref(), Some("1//refresh"));
        assert!(user.expiry.is_some());
        assert!(user.extra.contains_key("scopes"));
    }

    #[test]
    fn minimal_file_uses_default_token_uri() {
        let user: AuthorizedUser = serde_json::from_str(r#"{"token":"t"}"#).unwrap();
        assert_eq!(user.token_uri, DEFAULT_TOKEN_URI);
        assert!(user.refresh_token.is_none());
        assert!(!user.needs_refresh(Utc::now()));
    }

    #[test]
    fn refresh_window_includes_skew() {
        let mut user: AuthorizedUser = serde_json::from_str(TOKEN_JSON).unwrap();
        let now = Utc::now();
        user.expiry = Some(now + Duration::seconds(30));
        assert!(user.needs_refresh(now));
        user.expiry = Some(now + Duration::minutes(10));
        assert!(!user.needs_refresh(now));
    }

    #[test]
    fn applying_response_keeps_refresh_token_when_absent() {
        let mut user: AuthorizedUser = serde_json::from_str(TOKEN_JSON).unwrap();
        let now = Utc::now();
        user.apply(
            TokenResponse {
                access_token: "ya29.new".into(),
                expires_in: 3599,
                refresh_token: None,
            },
            now,
        );
        assert_eq!(user.token, "ya29.new");
        assert_eq!(user.refresh_token.as_deref(), Some("1//refresh"));
        assert_eq!(user.expiry, Some(now + Duration::seconds(3599)));
    }

    #[test]
    fn expired_without_refresh_token_is_an_error() {
        let mut user: AuthorizedUser = serde_json::from_str(r#"{"token":"t"}"#).unwrap();
        let http = reqwest::blocking::Client::new();
        assert!(matches!(user.refresh(&http), Err(AuthError::Expired)));
    }

    #[test]
    fn missing_file_is_not_authenticated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        assert!(matches!(
            Credentials::load(path),
            Err(AuthError::NotAuthenticated(_))
        ));
    }

    #[test]
    fn save_preserves_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        let user: AuthorizedUser = serde_json::from_str(TOKEN_JSON).unwrap();
        user.save(&path).unwrap();

        let reloaded = AuthorizedUser::load(&path).unwrap();
        assert_eq!(reloaded.token, "ya29.old");
        assert_eq!(reloaded.extra.get("scopes"), user.extra.get("scopes"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn expired_token_is_refreshed_and_saved() {
        use httpmock::prelude::*;

        let server = MockServer::start();
        let refresh_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/token")
                .form_urlencoded_tuple("grant_type", "refresh_token")
                .form_urlencoded_tuple("refresh_token", "1//refresh");
            then.status(200).json_body(serde_json::json!({
                "access_token": "ya29.fresh",
                "expires_in": 3599,
                "token_type": "Bearer"
            }));
        });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        let mut user: AuthorizedUser = serde_json::from_str(TOKEN_JSON).unwrap();
        user.token_uri = server.url("/token");
        user.save(&path).unwrap();

        let mut credentials = Credentials::load(path.clone()).unwrap();
        let http = reqwest::blocking::Client::new();
        assert_eq!(credentials.access_token(&http).unwrap(), "ya29.fresh");
        refresh_mock.assert();

        let saved = AuthorizedUser::load(&path).unwrap();
        assert_eq!(saved.token, "ya29.fresh");
        assert_eq!(saved.refresh_token.as_deref(), Some("1//refresh"));
        assert!(!saved.needs_refresh(Utc::now()));

        // Still valid, so no second exchange.
        assert_eq!(credentials.access_token(&http).unwrap(), "ya29.fresh");
        refresh_mock.assert();
    }

    #[test]
    fn rejected_refresh_reports_oauth_error() {
        use httpmock::prelude::*;

        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/token");
            then.status(400).json_body(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Token has been expired or revoked."
            }));
        });

        let mut user: AuthorizedUser = serde_json::from_str(TOKEN_JSON).unwrap();
        user.token_uri = server.url("/token");
        let err = user.refresh(&reqwest::blocking::Client::new()).unwrap_err();
        assert!(matches!(err, AuthError::Refresh(ref msg) if msg.starts_with("invalid_grant")));
        assert_eq!(user.token, "ya29.old");
    }
}
