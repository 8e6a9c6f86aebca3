use std::sync::Arc;

use crate::{config::Settings, error, info, spotify, success};

/// Authorizes spotsel with Spotify and stores the token for later commands.
pub async fn auth() {
    let settings = match Settings::from_env() {
        Ok(s) => Arc::new(s),
        Err(e) => error!("Invalid configuration. Err: {}", e),
    };

    info!("Waiting for authorization in the browser...");
    match spotify::auth::login(settings).await {
        Ok(token) => success!(
            "Authenticated. Token valid for {} minutes.",
            token.expires_in / 60
        ),
        Err(e) => error!("Authentication failed. Err: {}", e),
    }
}
