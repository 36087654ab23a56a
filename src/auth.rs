//! Google account sign-in (OAuth 2.0 authorization code flow with PKCE)
//!
//! The browser redirects back to a loopback listener; tokens are cached on disk
//! so the next start can restore the session without a browser round trip.

use std::path::PathBuf;

use anyhow::{Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{watch, RwLock};
use url::Url;

use crate::config::{AUTH_URL, REDIRECT_URI, REVOKE_URL, SCOPE, TOKEN_URL};
use crate::error::{ApiError, ApiResult};

const RESPONSE: &str = r#"
<!doctype html>
<html>
<head><title>Success</title></head>
<body><h1>Authentication Successful!</h1><p>You can return to tubelist.</p><script>window.close();</script></body>
</html>
"#;
const CACHE: &str = ".cache";
const TOKEN_FILE: &str = "token.json";

/// Refresh when less than this many seconds remain
const REFRESH_MARGIN_SECS: i64 = 300;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OAuthTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl OAuthTokens {
    fn from_response(response: TokenResponse, previous_refresh: Option<&str>) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response
                .refresh_token
                .or_else(|| previous_refresh.map(str::to_string)),
            expires_at: Utc::now() + chrono::Duration::seconds(response.expires_in),
        }
    }

    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        (self.expires_at - now).num_seconds() < REFRESH_MARGIN_SECS
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// What the sign-in status listener delivers
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserHandle {
    signed_in: bool,
    expires_at: Option<DateTime<Utc>>,
}

impl UserHandle {
    pub fn signed_in(expires_at: DateTime<Utc>) -> Self {
        Self {
            signed_in: true,
            expires_at: Some(expires_at),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn is_signed_in(&self) -> bool {
        self.signed_in
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

/// PKCE code verifier plus the CSRF `state` sent with the authorization request
#[derive(Debug, Clone)]
pub struct PkceVerifier {
    verifier: String,
    state: String,
}

impl PkceVerifier {
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();

        let mut verifier_bytes = [0u8; 32];
        rng.fill(&mut verifier_bytes);

        let mut state_bytes = [0u8; 16];
        rng.fill(&mut state_bytes);

        Self {
            verifier: URL_SAFE_NO_PAD.encode(verifier_bytes),
            state: URL_SAFE_NO_PAD.encode(state_bytes),
        }
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    /// S256: BASE64URL(SHA256(verifier))
    pub fn challenge(&self) -> String {
        let hash = Sha256::digest(self.verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(hash)
    }
}

impl Default for PkceVerifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Query parameters of the redirect back to the loopback listener
#[derive(Debug, Default, PartialEq)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

fn parse_callback(request_line: &str) -> Option<CallbackParams> {
    // "GET /login?code=...&state=... HTTP/1.1"
    let mut parts = request_line.split_whitespace();
    let _method = parts.next()?;
    let target = parts.next()?;
    let url = Url::parse(&format!("http://127.0.0.1{}", target)).ok()?;
    let expected_path = Url::parse(REDIRECT_URI).ok()?.path().to_string();
    if url.path() != expected_path {
        return None;
    }

    let mut params = CallbackParams::default();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => params.code = Some(value.into_owned()),
            "state" => params.state = Some(value.into_owned()),
            "error" => params.error = Some(value.into_owned()),
            _ => {}
        }
    }
    Some(params)
}

/// A started sign-in: the URL to visit and the listener awaiting the redirect
pub struct SignInRequest {
    pub url: String,
    verifier: PkceVerifier,
    listener: TcpListener,
}

pub struct AuthClient {
    client_id: String,
    client_secret: Option<String>,
    http: reqwest::Client,
    tokens: RwLock<Option<OAuthTokens>>,
    status: watch::Sender<UserHandle>,
    cache_path: PathBuf,
}

impl AuthClient {
    pub fn init(client_id: &str, client_secret: Option<&str>, http: reqwest::Client) -> Self {
        let (status, _) = watch::channel(UserHandle::signed_out());
        Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.map(str::to_string),
            http,
            tokens: RwLock::new(None),
            status,
            cache_path: PathBuf::from(CACHE).join(TOKEN_FILE),
        }
    }

    pub fn with_cache_path(mut self, path: PathBuf) -> Self {
        self.cache_path = path;
        self
    }

    /// Subscribe to sign-in status changes
    pub fn listen(&self) -> watch::Receiver<UserHandle> {
        self.status.subscribe()
    }

    pub fn current_user(&self) -> UserHandle {
        self.status.borrow().clone()
    }

    fn publish(&self, user: UserHandle) {
        tracing::debug!(signed_in = user.is_signed_in(), "Publishing sign-in status");
        self.status.send_replace(user);
    }

    /// Restore a cached session; always publishes a status
    pub async fn restore_session(&self) {
        let cached = match self.load_cache() {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read cached token");
                None
            }
        };

        let Some(tokens) = cached else {
            tracing::info!("No cached token found");
            self.publish(UserHandle::signed_out());
            return;
        };

        let tokens = if tokens.needs_refresh(Utc::now()) {
            match tokens.refresh_token.as_deref() {
                Some(refresh_token) => match self.refresh(refresh_token).await {
                    Ok(fresh) => {
                        self.save_cache(&fresh);
                        fresh
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Cached refresh token failed, sign-in required");
                        self.publish(UserHandle::signed_out());
                        return;
                    }
                },
                None => {
                    tracing::info!("Cached token expired and has no refresh token");
                    self.publish(UserHandle::signed_out());
                    return;
                }
            }
        } else {
            tokens
        };

        tracing::info!(expires_at = %tokens.expires_at, "Restored cached session");
        let expires_at = tokens.expires_at;
        *self.tokens.write().await = Some(tokens);
        self.publish(UserHandle::signed_in(expires_at));
    }

    pub fn build_auth_url(&self, verifier: &PkceVerifier) -> Result<String> {
        let mut url = Url::parse(AUTH_URL).context("invalid authorization endpoint")?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", REDIRECT_URI)
            .append_pair("response_type", "code")
            .append_pair("scope", SCOPE)
            .append_pair("state", verifier.state())
            .append_pair("code_challenge", &verifier.challenge())
            .append_pair("code_challenge_method", "S256")
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");
        Ok(url.to_string())
    }

    /// Bind the loopback listener and build the authorization URL
    pub async fn begin_sign_in(&self) -> Result<SignInRequest> {
        let redirect = Url::parse(REDIRECT_URI)?;
        let addr = format!(
            "{}:{}",
            redirect.host_str().unwrap_or("127.0.0.1"),
            redirect.port_or_known_default().unwrap_or(80)
        );
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("binding OAuth redirect listener on {}", addr))?;

        let verifier = PkceVerifier::new();
        let url = self.build_auth_url(&verifier)?;
        tracing::info!("Starting browser-based OAuth flow");
        Ok(SignInRequest {
            url,
            verifier,
            listener,
        })
    }

    /// Wait for the browser redirect, exchange the code and publish signed-in
    pub async fn complete_sign_in(&self, request: SignInRequest) -> Result<()> {
        let params = loop {
            let (mut stream, _) = request.listener.accept().await?;
            let mut buf = vec![0u8; 8192];
            let n = stream.read(&mut buf).await?;
            let head = String::from_utf8_lossy(&buf[..n]);
            let request_line = head.lines().next().unwrap_or_default();

            match parse_callback(request_line) {
                Some(params) => {
                    let reply = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        RESPONSE.len(),
                        RESPONSE
                    );
                    stream.write_all(reply.as_bytes()).await?;
                    break params;
                }
                None => {
                    stream
                        .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                        .await?;
                }
            }
        };

        if let Some(error) = params.error {
            anyhow::bail!("authorization denied: {}", error);
        }
        if params.state.as_deref() != Some(request.verifier.state()) {
            tracing::warn!("OAuth state mismatch on redirect");
            anyhow::bail!("OAuth state mismatch");
        }
        let code = params.code.context("redirect carried no authorization code")?;

        let tokens = self.exchange_code(&code, &request.verifier).await?;
        self.save_cache(&tokens);
        let expires_at = tokens.expires_at;
        *self.tokens.write().await = Some(tokens);

        tracing::info!("Browser authentication completed successfully");
        self.publish(UserHandle::signed_in(expires_at));
        Ok(())
    }

    async fn exchange_code(&self, code: &str, verifier: &PkceVerifier) -> ApiResult<OAuthTokens> {
        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", REDIRECT_URI),
            ("client_id", self.client_id.as_str()),
            ("code_verifier", verifier.verifier.as_str()),
        ];
        if let Some(secret) = self.client_secret.as_deref() {
            params.push(("client_secret", secret));
        }

        tracing::debug!("Exchanging authorization code for tokens");
        let response = self.http.post(TOKEN_URL).form(&params).send().await?;
        let token = Self::read_token_response("token exchange", response).await?;
        Ok(OAuthTokens::from_response(token, None))
    }

    async fn refresh(&self, refresh_token: &str) -> ApiResult<OAuthTokens> {
        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
        ];
        if let Some(secret) = self.client_secret.as_deref() {
            params.push(("client_secret", secret));
        }

        tracing::info!("Token expiring soon, refreshing...");
        let response = self
            .http
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| ApiError::TokenRefresh(e.to_string()))?;
        let token = Self::read_token_response("token refresh", response)
            .await
            .map_err(|e| ApiError::TokenRefresh(e.to_string()))?;
        tracing::info!("Token refreshed successfully");
        Ok(OAuthTokens::from_response(token, Some(refresh_token)))
    }

    async fn read_token_response(
        operation: &'static str,
        response: reqwest::Response,
    ) -> ApiResult<TokenResponse> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                operation,
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|source| ApiError::Decode { operation, source })
    }

    /// Bearer token for API calls, refreshed when close to expiry
    pub async fn access_token(&self) -> ApiResult<String> {
        let current = self.tokens.read().await.clone();
        let tokens = current.ok_or(ApiError::NotSignedIn)?;
        if !tokens.needs_refresh(Utc::now()) {
            return Ok(tokens.access_token);
        }

        let Some(refresh_token) = tokens.refresh_token.as_deref() else {
            return Err(ApiError::TokenRefresh("no refresh token".to_string()));
        };

        match self.refresh(refresh_token).await {
            Ok(fresh) => {
                self.save_cache(&fresh);
                let access_token = fresh.access_token.clone();
                *self.tokens.write().await = Some(fresh);
                Ok(access_token)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to refresh token");
                *self.tokens.write().await = None;
                self.publish(UserHandle::signed_out());
                Err(e)
            }
        }
    }

    pub async fn sign_out(&self) {
        let tokens = self.tokens.write().await.take();
        if let Some(tokens) = tokens {
            let revoke = self
                .http
                .post(REVOKE_URL)
                .form(&[("token", tokens.access_token.as_str())])
                .send()
                .await;
            match revoke {
                Ok(resp) if resp.status().is_success() => tracing::debug!("Token revoked"),
                Ok(resp) => tracing::warn!(status = resp.status().as_u16(), "Token revoke rejected"),
                Err(e) => tracing::warn!(error = %e, "Token revoke failed"),
            }
        }
        if self.cache_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.cache_path) {
                tracing::warn!(error = %e, "Could not remove cached token");
            }
        }
        tracing::info!("Signed out");
        self.publish(UserHandle::signed_out());
    }

    fn load_cache(&self) -> Result<Option<OAuthTokens>> {
        if !self.cache_path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.cache_path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save_cache(&self, tokens: &OAuthTokens) {
        let result = (|| -> Result<()> {
            if let Some(dir) = self.cache_path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            std::fs::write(&self.cache_path, serde_json::to_string(tokens)?)?;
            Ok(())
        })();
        match result {
            Ok(()) => tracing::debug!("Saved token to disk"),
            Err(e) => tracing::warn!(error = %e, "Could not cache token"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(cache: PathBuf) -> AuthClient {
        AuthClient::init("client-id", None, reqwest::Client::new()).with_cache_path(cache)
    }

    fn temp_cache(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tubelist-auth-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir.join(TOKEN_FILE)
    }

    #[test]
    fn challenge_matches_rfc7636_vector() {
        let verifier = PkceVerifier {
            verifier: "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".to_string(),
            state: "s".to_string(),
        };
        assert_eq!(verifier.challenge(), "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    #[test]
    fn auth_url_requests_force_ssl_scope() {
        let auth = client(temp_cache("url"));
        let verifier = PkceVerifier::new();
        let url = Url::parse(&auth.build_auth_url(&verifier).unwrap()).unwrap();
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(pairs["client_id"], "client-id");
        assert_eq!(pairs["scope"], SCOPE);
        assert_eq!(pairs["redirect_uri"], REDIRECT_URI);
        assert_eq!(pairs["state"], verifier.state());
        assert_eq!(pairs["code_challenge"], verifier.challenge());
        assert_eq!(pairs["code_challenge_method"], "S256");
    }

    #[test]
    fn parses_redirect_request_line() {
        let params = parse_callback("GET /login?code=4%2Fabc&state=xyz&scope=s HTTP/1.1").unwrap();
        assert_eq!(params.code.as_deref(), Some("4/abc"));
        assert_eq!(params.state.as_deref(), Some("xyz"));
        assert!(params.error.is_none());

        let denied = parse_callback("GET /login?error=access_denied&state=xyz HTTP/1.1").unwrap();
        assert_eq!(denied.error.as_deref(), Some("access_denied"));

        assert!(parse_callback("GET /favicon.ico HTTP/1.1").is_none());
        assert!(parse_callback("").is_none());
    }

    #[test]
    fn refresh_window_is_five_minutes() {
        let now = Utc::now();
        let tokens = |secs| OAuthTokens {
            access_token: "a".into(),
            refresh_token: None,
            expires_at: now + chrono::Duration::seconds(secs),
        };
        assert!(tokens(60).needs_refresh(now));
        assert!(!tokens(3600).needs_refresh(now));
    }

    #[tokio::test]
    async fn restore_without_cache_publishes_signed_out() {
        let auth = client(temp_cache("missing"));
        let mut rx = auth.listen();
        auth.restore_session().await;

        assert!(rx.has_changed().unwrap());
        assert!(!rx.borrow_and_update().is_signed_in());
        assert!(matches!(auth.access_token().await, Err(ApiError::NotSignedIn)));
    }

    #[tokio::test]
    async fn restore_with_valid_cache_publishes_signed_in() {
        let path = temp_cache("valid");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let tokens = OAuthTokens {
            access_token: "ya29.token".into(),
            refresh_token: Some("1//refresh".into()),
            expires_at: Utc::now() + chrono::Duration::hours(1),
        };
        std::fs::write(&path, serde_json::to_string(&tokens).unwrap()).unwrap();

        let auth = client(path.clone());
        let mut rx = auth.listen();
        auth.restore_session().await;

        assert!(rx.borrow_and_update().is_signed_in());
        assert!(auth.current_user().is_signed_in());
        assert_eq!(auth.access_token().await.unwrap(), "ya29.token");
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn expired_cache_without_refresh_token_is_signed_out() {
        let path = temp_cache("expired");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let tokens = OAuthTokens {
            access_token: "old".into(),
            refresh_token: None,
            expires_at: Utc::now() - chrono::Duration::hours(1),
        };
        std::fs::write(&path, serde_json::to_string(&tokens).unwrap()).unwrap();

        let auth = client(path.clone());
        auth.restore_session().await;
        assert!(!auth.current_user().is_signed_in());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
