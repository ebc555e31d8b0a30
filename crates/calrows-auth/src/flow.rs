//! Installed-app consent flow with a loopback redirect.

use calrows_core::AuthError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use warp::Filter;

use crate::google::GoogleOAuth2Provider;
use crate::storage::TokenSet;

type CallbackParams = HashMap<String, String>;
type CallbackSender = Arc<Mutex<Option<oneshot::Sender<CallbackParams>>>>;

const CALLBACK_PAGE: &str = "<html><body><h1>Authorization complete</h1>\
<p>You can close this window and return to calrows.</p></body></html>";

/// Run the browser consent flow, serving the redirect on `127.0.0.1:port`.
///
/// Port 0 binds an ephemeral port.
pub async fn run_local_server(
    provider: &GoogleOAuth2Provider,
    port: u16,
) -> Result<TokenSet, AuthError> {
    let (params_tx, params_rx) = oneshot::channel::<CallbackParams>();
    let params_tx: CallbackSender = Arc::new(Mutex::new(Some(params_tx)));

    let routes = warp::get()
        .and(warp::path("callback"))
        .and(warp::path::end())
        .and(warp::query::<CallbackParams>())
        .and(warp::any().map(move || params_tx.clone()))
        .and_then(handle_callback);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let (addr, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(([127, 0, 0, 1], port), async {
            let _ = shutdown_rx.await;
        })
        .map_err(|_| AuthError::PortInUse(port))?;
    let server = tokio::spawn(server);

    let redirect_uri = format!("http://{}/callback", addr);
    let (auth_url, state) = provider.authorization_url(&redirect_uri);

    tracing::info!("Please visit this URL to authorize calrows: {}", auth_url);
    if let Err(e) = webbrowser::open(&auth_url) {
        tracing::warn!("Failed to open browser: {}", e);
    }

    let params = params_rx
        .await
        .map_err(|_| AuthError::OAuthFailed("callback server stopped".to_string()))?;

    let _ = shutdown_tx.send(());
    if let Err(e) = server.await {
        tracing::debug!("Callback server task ended abnormally: {}", e);
    }

    let code = parse_callback(&params, &state)?;
    let response = provider.exchange_code(&code, &redirect_uri).await?;

    tracing::info!("OAuth2 flow completed");
    Ok(response.into_token_set(None))
}

async fn handle_callback(
    params: CallbackParams,
    tx: CallbackSender,
) -> Result<impl warp::Reply, warp::Rejection> {
    if let Some(sender) = tx.lock().await.take() {
        let _ = sender.send(params);
    }

    Ok(warp::reply::html(CALLBACK_PAGE))
}

/// Extract the authorization code from the redirect query, checking `state`.
fn parse_callback(params: &CallbackParams, expected_state: &str) -> Result<String, AuthError> {
    if let Some(error) = params.get("error") {
        return Err(if error == "access_denied" {
            AuthError::OAuthCancelled
        } else {
            AuthError::OAuthFailed(error.clone())
        });
    }

    if params.get("state").map(String::as_str) != Some(expected_state) {
        return Err(AuthError::StateMismatch);
    }

    params
        .get("code")
        .filter(|code| !code.is_empty())
        .cloned()
        .ok_or_else(|| AuthError::OAuthFailed("redirect carried no code".to_string()))
}
