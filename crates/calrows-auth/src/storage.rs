use calrows_core::AuthError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Seconds before expiry at which a token is treated as stale.
const REFRESH_MARGIN_SECS: i64 = 300;

/// Token set for OAuth2 authentication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Access token for API requests
    pub access_token: String,

    /// Optional refresh token for token renewal
    pub refresh_token: Option<String>,

    /// Token expiration timestamp (Unix timestamp)
    pub expires_at: i64,

    /// Scopes granted to this token
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl TokenSet {
    /// Check if the token needs refresh (within 5 minutes of expiry)
    pub fn needs_refresh(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        now >= self.expires_at.saturating_sub(REFRESH_MARGIN_SECS)
    }
}

/// On-disk JSON cache for the token set, shared between runs.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the cached token set, `None` if nothing is cached yet.
    pub fn load(&self) -> Result<Option<TokenSet>, AuthError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path)
            .map_err(|e| AuthError::StorageError(format!("{}: {}", self.path.display(), e)))?;

        let token_set = serde_json::from_str(&json)
            .map_err(|e| AuthError::StorageError(format!("{}: {}", self.path.display(), e)))?;

        tracing::debug!("Loaded cached token from {}", self.path.display());
        Ok(Some(token_set))
    }

    /// Persist the token set, replacing any previous cache.
    pub fn store(&self, token_set: &TokenSet) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| AuthError::StorageError(format!("{}: {}", parent.display(), e)))?;
            }
        }

        let json = serde_json::to_string_pretty(token_set)
            .map_err(|e| AuthError::StorageError(e.to_string()))?;

        fs::write(&self.path, json)
            .map_err(|e| AuthError::StorageError(format!("{}: {}", self.path.display(), e)))?;

        tracing::info!("Stored token cache at {}", self.path.display());
        Ok(())
    }
}
