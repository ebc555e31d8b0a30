//! Google OAuth2 provider for read-only Calendar access.

use calrows_core::AuthError;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::storage::TokenSet;

pub const CALENDAR_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// OAuth client credentials as downloaded from the Google Cloud console.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The console wraps credentials in `installed` for desktop apps, `web` otherwise.
#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        let file: ClientSecretFile = serde_json::from_str(json)
            .map_err(|e| AuthError::InvalidClientSecret(e.to_string()))?;

        file.installed.or(file.web).ok_or_else(|| {
            AuthError::InvalidClientSecret("expected an `installed` or `web` section".to_string())
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, AuthError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| AuthError::ClientSecretMissing(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
}

impl GoogleTokenResponse {
    /// Convert to a cacheable token set, keeping `previous_refresh` when Google omits one.
    pub fn into_token_set(self, previous_refresh: Option<String>) -> TokenSet {
        let expires_in = i64::try_from(self.expires_in).unwrap_or(i64::MAX);
        let expires_at = chrono::Utc::now().timestamp().saturating_add(expires_in);
        TokenSet {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh),
            expires_at,
            scopes: self
                .scope
                .split_whitespace()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

pub struct GoogleOAuth2Provider {
    secret: ClientSecret,
    http: reqwest::Client,
}

impl GoogleOAuth2Provider {
    pub fn new(secret: ClientSecret) -> Self {
        Self {
            secret,
            http: reqwest::Client::new(),
        }
    }

    /// Generate authorization URL for the consent screen.
    /// Returns (url, state) where state should be verified on callback.
    pub fn authorization_url(&self, redirect_uri: &str) -> (String, String) {
        let state = uuid::Uuid::new_v4().to_string();

        let url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&access_type=offline&prompt=consent",
            self.secret.auth_uri,
            urlencoding::encode(&self.secret.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(CALENDAR_READONLY_SCOPE),
            urlencoding::encode(&state),
        );

        (url, state)
    }

    /// Exchange authorization code for tokens.
    #[tracing::instrument(skip(self, code), level = "info")]
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<GoogleTokenResponse, AuthError> {
        let response = self
            .http
            .post(&self.secret.token_uri)
            .form(&[
                ("client_id", self.secret.client_id.as_str()),
                ("client_secret", self.secret.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AuthError::OAuthFailed(format!(
                "token exchange failed: {}",
                error_text
            )));
        }

        response
            .json::<GoogleTokenResponse>()
            .await
            .map_err(|e| AuthError::OAuthFailed(format!("invalid token response: {}", e)))
    }

    /// Refresh an expired access token.
    #[tracing::instrument(skip(self, refresh_token), level = "info")]
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<GoogleTokenResponse, AuthError> {
        let response = self
            .http
            .post(&self.secret.token_uri)
            .form(&[
                ("client_id", self.secret.client_id.as_str()),
                ("client_secret", self.secret.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AuthError::RefreshFailed(error_text));
        }

        response
            .json::<GoogleTokenResponse>()
            .await
            .map_err(|e| AuthError::RefreshFailed(format!("invalid refresh response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn secret(token_uri: &str) -> ClientSecret {
        ClientSecret {
            client_id: "test_client_id".to_string(),
            client_secret: "test_client_secret".to_string(),
            auth_uri: DEFAULT_AUTH_URI.to_string(),
            token_uri: token_uri.to_string(),
        }
    }

    #[test]
    fn test_client_secret_installed_section() {
        let json = r#"{
            "installed": {
                "client_id": "abc.apps.googleusercontent.com",
                "client_secret": "shh",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token",
                "redirect_uris": ["http://localhost"]
            }
        }"#;

        let secret = ClientSecret::from_json(json).unwrap();
        assert_eq!(secret.client_id, "abc.apps.googleusercontent.com");
        assert_eq!(secret.token_uri, "https://oauth2.googleapis.com/token");
    }

    #[test]
    fn test_client_secret_web_section_with_defaults() {
        let json = r#"{"web": {"client_id": "id", "client_secret": "secret"}}"#;
        let secret = ClientSecret::from_json(json).unwrap();
        assert_eq!(secret.auth_uri, DEFAULT_AUTH_URI);
        assert_eq!(secret.token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn test_client_secret_without_section() {
        let result = ClientSecret::from_json(r#"{"client_id": "id"}"#);
        assert!(matches!(result, Err(AuthError::InvalidClientSecret(_))));
    }

    #[test]
    fn test_client_secret_missing_file() {
        let result = ClientSecret::from_file(Path::new("/nonexistent/credentials.json"));
        assert!(matches!(result, Err(AuthError::ClientSecretMissing(_))));
    }

    #[test]
    fn test_auth_url_requests_readonly_offline_access() {
        let provider = GoogleOAuth2Provider::new(secret(DEFAULT_TOKEN_URI));
        let (url, state) = provider.authorization_url("http://127.0.0.1:5000/callback");

        assert!(url.contains("calendar.readonly"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A5000%2Fcallback"));
        assert!(url.contains(&state));
    }

    #[test]
    fn test_state_is_unique() {
        let provider = GoogleOAuth2Provider::new(secret(DEFAULT_TOKEN_URI));
        let (_, state1) = provider.authorization_url("http://127.0.0.1/callback");
        let (_, state2) = provider.authorization_url("http://127.0.0.1/callback");
        assert_ne!(state1, state2);
    }

    #[test]
    fn test_token_set_keeps_previous_refresh_token() {
        let response = GoogleTokenResponse {
            access_token: "new".to_string(),
            refresh_token: None,
            expires_in: 3600,
            token_type: "Bearer".to_string(),
            scope: CALENDAR_READONLY_SCOPE.to_string(),
        };

        let token_set = response.into_token_set(Some("old_refresh".to_string()));
        assert_eq!(token_set.refresh_token.as_deref(), Some("old_refresh"));
        assert_eq!(token_set.scopes, vec![CALENDAR_READONLY_SCOPE.to_string()]);
        assert!(!token_set.needs_refresh());
    }

    #[test]
    fn test_huge_expires_in_saturates() {
        let response = GoogleTokenResponse {
            access_token: "new".to_string(),
            refresh_token: None,
            expires_in: u64::MAX,
            token_type: "Bearer".to_string(),
            scope: String::new(),
        };

        let token_set = response.into_token_set(None);
        assert_eq!(token_set.expires_at, i64::MAX);
        assert!(!token_set.needs_refresh());
    }

    #[tokio::test]
    async fn test_refresh_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=r1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh",
                "expires_in": 3599,
                "token_type": "Bearer",
                "scope": CALENDAR_READONLY_SCOPE
            })))
            .mount(&mock_server)
            .await;

        let provider =
            GoogleOAuth2Provider::new(secret(&format!("{}/token", mock_server.uri())));
        let response = provider.refresh_token("r1").await.unwrap();

        assert_eq!(response.access_token, "fresh");
        assert!(response.refresh_token.is_none());
    }

    #[tokio::test]
    async fn test_refresh_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#),
            )
            .mount(&mock_server)
            .await;

        let provider =
            GoogleOAuth2Provider::new(secret(&format!("{}/token", mock_server.uri())));
        let result = provider.refresh_token("revoked").await;

        match result {
            Err(AuthError::RefreshFailed(msg)) => assert!(msg.contains("invalid_grant")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exchange_code() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "access",
                "refresh_token": "refresh",
                "expires_in": 3599,
                "token_type": "Bearer",
                "scope": CALENDAR_READONLY_SCOPE
            })))
            .mount(&mock_server)
            .await;

        let provider =
            GoogleOAuth2Provider::new(secret(&format!("{}/token", mock_server.uri())));
        let response = provider
            .exchange_code("abc", "http://127.0.0.1:1/callback")
            .await
            .unwrap();

        assert_eq!(response.refresh_token.as_deref(), Some("refresh"));
    }
}
