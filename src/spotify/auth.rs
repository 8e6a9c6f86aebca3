use std::{sync::Arc, time::Duration};

use chrono::Utc;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{
    config::Settings,
    error::{Error, Result},
    management::TokenManager,
    server::start_api_server,
    types::{PkceToken, Token},
    utils, warning,
};

/// Runs the authorization-code flow in the user's browser.
///
/// 1. Generates a PKCE verifier/challenge and a random `state`
/// 2. Starts the local callback server
/// 3. Opens the authorize URL (or prints it when no browser can be launched)
/// 4. Waits up to 60 seconds for the callback to deliver a token
/// 5. Persists the token for later runs
pub async fn login(settings: Arc<Settings>) -> Result<Token> {
    let shared_state: Arc<Mutex<Option<PkceToken>>> = Arc::new(Mutex::new(None));

    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);
    let state = utils::generate_state();

    // Store verifier in shared state before redirect
    {
        let mut lock = shared_state.lock().await;
        *lock = Some(PkceToken {
            code_verifier,
            state: state.clone(),
            token: None,
        });
    }

    let server_state = Arc::clone(&shared_state);
    let server_settings = Arc::clone(&settings);
    let server = tokio::spawn(async move {
        if let Err(e) = start_api_server(server_state, server_settings).await {
            tracing::error!(error = %e, "callback server stopped");
        }
    });

    let auth_url = reqwest::Url::parse_with_params(
        &settings.auth_url,
        &[
            ("client_id", settings.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", settings.redirect_uri.as_str()),
            ("code_challenge", code_challenge.as_str()),
            ("code_challenge_method", "S256"),
            ("scope", settings.scope.as_str()),
            ("state", state.as_str()),
        ],
    )
    .map_err(|e| Error::Config(format!("invalid auth url: {e}")))?;

    if webbrowser::open(auth_url.as_str()).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let token = wait_for_token(shared_state).await;
    server.abort();

    let token = token.ok_or_else(|| Error::auth("authorization failed or timed out"))?;
    TokenManager::new(token.clone(), Arc::clone(&settings))
        .persist()
        .await?;

    Ok(token)
}

/// Polls the shared state once per second for up to 60 seconds.
async fn wait_for_token(shared_state: Arc<Mutex<Option<PkceToken>>>) -> Option<Token> {
    use std::time::Instant;

    let max_wait = Duration::from_secs(60);
    let start = Instant::now();

    while start.elapsed() < max_wait {
        let lock = shared_state.lock().await;
        if let Some(token) = lock.as_ref().and_then(|p| p.token.clone()) {
            return Some(token);
        }
        drop(lock);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    None
}

/// Exchanges an authorization code for a token.
pub async fn exchange_code(settings: &Settings, code: &str, verifier: &str) -> Result<Token> {
    let req = Client::new().post(&settings.token_url).form(&[
        ("grant_type", "authorization_code"),
        ("client_id", settings.client_id.as_str()),
        ("code", code),
        ("code_verifier", verifier),
        ("redirect_uri", settings.redirect_uri.as_str()),
    ]);

    let json = send_token_request(settings, req).await?;
    token_from_json(&json, None)
}

/// Exchanges a refresh token for a fresh access token.
///
/// Spotify may omit `refresh_token` in the response; the previous one is
/// kept in that case.
pub async fn refresh_token(settings: &Settings, refresh_token: &str) -> Result<Token> {
    let req = Client::new().post(&settings.token_url).form(&[
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
        ("client_id", settings.client_id.as_str()),
    ]);

    let json = send_token_request(settings, req).await?;
    token_from_json(&json, Some(refresh_token))
}

async fn send_token_request(settings: &Settings, req: RequestBuilder) -> Result<Value> {
    let req = match &settings.client_secret {
        Some(secret) => req.basic_auth(&settings.client_id, Some(secret)),
        None => req,
    };

    let res = req.send().await?;
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(Error::auth(format!("token endpoint returned {status}: {body}")));
    }

    Ok(res.json().await?)
}

fn token_from_json(json: &Value, previous_refresh: Option<&str>) -> Result<Token> {
    let access_token = json["access_token"]
        .as_str()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::auth("token response carries no access_token"))?;

    let refresh_token = json["refresh_token"]
        .as_str()
        .or(previous_refresh)
        .unwrap_or_default();

    Ok(Token {
        access_token: access_token.to_string(),
        refresh_token: refresh_token.to_string(),
        scope: json["scope"].as_str().unwrap_or_default().to_string(),
        expires_in: json["expires_in"].as_u64().unwrap_or(3600),
        obtained_at: Utc::now().timestamp() as u64,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn keeps_previous_refresh_token_when_omitted() {
        let json = json!({ "access_token": "new", "expires_in": 3600, "scope": "a b" });
        let token = token_from_json(&json, Some("old-refresh")).unwrap();
        assert_eq!(token.access_token, "new");
        assert_eq!(token.refresh_token, "old-refresh");
        assert_eq!(token.scope, "a b");
    }

    #[test]
    fn missing_access_token_is_an_auth_error() {
        let json = json!({ "error": "invalid_grant" });
        assert!(matches!(token_from_json(&json, None), Err(Error::Auth(_))));
    }
}
