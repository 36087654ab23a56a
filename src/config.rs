//! Static credentials and fixed endpoints

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

pub const CREDENTIALS_ENV: &str = "TUBELIST_CREDENTIALS";
const CREDENTIALS_FILE: &str = "credentials.json";

pub const API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";
pub const REDIRECT_URI: &str = "http://127.0.0.1:8898/login";
pub const SCOPE: &str = "https://www.googleapis.com/auth/youtube.force-ssl";

pub const PAGE_SIZE: u32 = 25;
pub const SIGN_IN_RECHECK_DELAY: Duration = Duration::from_secs(10);

/// OAuth client section, as downloaded from the Google Cloud console
#[derive(Clone, Debug, Deserialize)]
pub struct OAuthClientCredentials {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ApiKeyCredentials {
    pub key: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Credentials {
    #[serde(alias = "installed")]
    pub web: OAuthClientCredentials,
    pub api: ApiKeyCredentials,
}

impl Credentials {
    pub fn path() -> PathBuf {
        std::env::var_os(CREDENTIALS_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CREDENTIALS_FILE))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading credentials from {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let credentials: Credentials = serde_json::from_str(content)?;
        if credentials.web.client_id.trim().is_empty() {
            anyhow::bail!("client_id is empty");
        }
        Ok(credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_web_client_credentials() {
        let creds = Credentials::parse(
            r#"{ "web": { "client_id": "abc.apps.googleusercontent.com" }, "api": { "key": "AIza" } }"#,
        )
        .unwrap();
        assert_eq!(creds.web.client_id, "abc.apps.googleusercontent.com");
        assert!(creds.web.client_secret.is_none());
        assert_eq!(creds.api.key, "AIza");
    }

    #[test]
    fn accepts_installed_app_section() {
        let creds = Credentials::parse(
            r#"{ "installed": { "client_id": "id", "client_secret": "s3cret", "project_id": "p" },
                 "api": { "key": "k" } }"#,
        )
        .unwrap();
        assert_eq!(creds.web.client_secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn rejects_missing_api_key() {
        assert!(Credentials::parse(r#"{ "web": { "client_id": "id" } }"#).is_err());
    }

    #[test]
    fn rejects_blank_client_id() {
        assert!(Credentials::parse(r#"{ "web": { "client_id": " " }, "api": { "key": "k" } }"#).is_err());
    }
}
