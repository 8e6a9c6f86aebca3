use colored::Colorize;

use crate::{
    cli::session,
    error, info,
    management::view::{PlayerState, PlayerView},
    types::{RepeatMode, Snapshot},
    warning,
};

fn format_secs(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

fn status_line(snapshot: &Snapshot) -> String {
    let view = PlayerView::from_snapshot(snapshot);
    let state = match view.state {
        PlayerState::Playing => "playing".green().bold(),
        PlayerState::Paused => "paused".yellow().bold(),
        PlayerState::Idle => "idle".dimmed(),
    };

    if view.state == PlayerState::Idle {
        return format!("{state}");
    }

    let mut line = format!(
        "{state} {} - {}",
        view.title.as_deref().unwrap_or("Unknown"),
        view.artist.as_deref().unwrap_or("Unknown"),
    );
    if let (Some(pos), Some(dur)) = (view.position_secs, view.duration_secs) {
        line.push_str(&format!(" [{}/{}]", format_secs(pos), format_secs(dur)));
    }
    if let Some(source) = &view.source {
        line.push_str(&format!(" from {}", source.cyan()));
    }
    if let Some(device) = &view.device {
        line.push_str(&format!(" on {}", device.name));
    }
    line
}

/// Prints the current player state and the last update result.
pub async fn status() {
    let integration = session::connect(None).await;
    let Some(snapshot) = integration.coordinator().data() else {
        error!("No playback data available");
    };

    let view = PlayerView::from_snapshot(&snapshot);
    println!("{}", status_line(&snapshot));
    if let Some(album) = &view.album {
        info!("Album: {}", album);
    }
    if view.state != PlayerState::Idle {
        let repeat = match view.repeat {
            RepeatMode::Off => "off",
            RepeatMode::One => "one",
            RepeatMode::All => "all",
        };
        info!("Shuffle: {}, repeat: {}", view.shuffle, repeat);
    }
    match integration.context().selected_device().await {
        Some(id) => info!("Selected device: {}", id),
        None => warning!("No device selected"),
    }

    let update = integration.coordinator().status().await;
    if let Some(at) = update.last_success_at {
        info!("Last update: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    integration.unload();
}

/// Starts polling and prints a status line whenever the state changes,
/// until Ctrl-C.
pub async fn watch() {
    let mut integration = session::connect(None).await;
    integration.start();

    let mut updates = integration.coordinator().subscribe();
    let mut last_line = String::new();
    info!(
        "Watching playback, refreshing every {}s. Press Ctrl-C to stop.",
        integration.coordinator().interval().as_secs()
    );

    loop {
        let current = updates.borrow_and_update().clone();
        if let Some(snapshot) = current {
            let line = status_line(&snapshot);
            if line != last_line {
                println!("{line}");
                last_line = line;
            }
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    integration.unload();
}
