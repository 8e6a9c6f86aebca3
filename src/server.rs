use axum::{Extension, Router, routing::get};
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::sync::Mutex;

use crate::{
    api,
    config::Settings,
    error::{Error, Result},
    types::PkceToken,
};

/// Serves `/health` and the OAuth `/callback` until the task is aborted.
pub async fn start_api_server(
    state: Arc<Mutex<Option<PkceToken>>>,
    settings: Arc<Settings>,
) -> Result<()> {
    let app = Router::new().route("/health", get(api::health)).route(
        "/callback",
        get(api::callback)
            .layer::<_, std::convert::Infallible>(Extension(state))
            .layer(Extension(settings.clone())),
    );

    let addr = SocketAddr::from_str(&settings.server_address).map_err(|e| {
        Error::Config(format!(
            "invalid server address '{}': {}",
            settings.server_address, e
        ))
    })?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::debug!(%addr, "callback server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
