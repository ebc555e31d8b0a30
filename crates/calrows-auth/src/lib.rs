//! Google OAuth for calrows.
//!
//! Resolves a bearer token from the on-disk cache, refreshing it or running
//! the browser consent flow when the cache can't be used.

pub mod flow;
pub mod google;
pub mod storage;

pub use google::{ClientSecret, GoogleOAuth2Provider, GoogleTokenResponse};
pub use storage::{TokenSet, TokenStore};

use calrows_core::{AuthConfig, AuthError};

pub struct Authenticator {
    provider: GoogleOAuth2Provider,
    store: TokenStore,
    callback_port: u16,
}

impl Authenticator {
    pub fn new(provider: GoogleOAuth2Provider, store: TokenStore, callback_port: u16) -> Self {
        Self {
            provider,
            store,
            callback_port,
        }
    }

    /// Build from config, reading the client secret file.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        let secret = ClientSecret::from_file(&config.client_secret_path)?;
        Ok(Self::new(
            GoogleOAuth2Provider::new(secret),
            TokenStore::new(&config.token_cache_path),
            config.callback_port,
        ))
    }

    /// Return a usable access token, refreshing or re-authorizing as needed.
    ///
    /// Any new token set is written back to the cache.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        let cached = self.store.load()?;

        let token_set = match cached {
            Some(token_set) if !token_set.needs_refresh() => {
                tracing::debug!("Using cached access token");
                return Ok(token_set.access_token);
            }
            Some(TokenSet {
                refresh_token: Some(refresh_token),
                ..
            }) => {
                tracing::info!("Access token expired, refreshing");
                self.provider
                    .refresh_token(&refresh_token)
                    .await?
                    .into_token_set(Some(refresh_token))
            }
            _ => {
                tracing::info!("No usable token cached, starting authorization flow");
                flow::run_local_server(&self.provider, self.callback_port).await?
            }
        };

        self.store.store(&token_set)?;
        Ok(token_set.access_token)
    }
}
