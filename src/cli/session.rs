use std::{sync::Arc, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    config::Settings,
    error,
    management::{Integration, TokenManager, TokenProvider},
};

pub(crate) fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb
}

/// Sets up one integration instance, selecting `device` when given.
///
/// Exits with a message pointing at `spotsel auth` when no token is stored.
pub(crate) async fn connect(device: Option<&str>) -> Integration {
    let settings = match Settings::from_env() {
        Ok(s) => Arc::new(s),
        Err(e) => error!("Invalid configuration. Err: {}", e),
    };

    let tokens: Arc<dyn TokenProvider> = match TokenManager::load(Arc::clone(&settings)).await {
        Ok(t) => Arc::new(t),
        Err(e) => error!("Failed to load token. Please run spotsel auth\n Error: {}", e),
    };

    let pb = spinner("Loading playback state and library...");
    let integration = match Integration::setup(&settings, tokens).await {
        Ok(i) => i,
        Err(e) => {
            pb.finish_and_clear();
            error!("Cannot reach Spotify. Err: {}", e);
        }
    };
    pb.finish_and_clear();

    if let Some(device) = device {
        if let Err(e) = integration.dispatcher().select_device(device).await {
            error!("{}", e);
        }
    }

    integration
}
