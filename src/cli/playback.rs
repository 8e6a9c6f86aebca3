use crate::{
    cli::session,
    error,
    error::Result,
    info,
    management::{Integration, Outcome, PlaylistRef, view},
    success,
    types::RepeatMode,
    utils, warning,
};

fn report(integration: Integration, command: &str, result: Result<Outcome>) {
    match result {
        Ok(Outcome::Sent) => success!("{} sent", command),
        Ok(Outcome::Debounced) => warning!("{} ignored, another command was just sent", command),
        Ok(Outcome::Invalidated) => warning!(
            "{} was refused by Spotify, the device or session may be gone. State refreshed.",
            command
        ),
        Err(e) => {
            integration.unload();
            error!("{} failed. Err: {}", command, e);
        }
    }
    integration.unload();
}

/// Resumes playback on the selected (or given) device.
pub async fn play(device: Option<String>) {
    let integration = session::connect(device.as_deref()).await;
    let result = integration.dispatcher().play(None).await;
    report(integration, "Play", result);
}

pub async fn pause(device: Option<String>) {
    let integration = session::connect(device.as_deref()).await;
    let result = integration.dispatcher().pause(None).await;
    report(integration, "Pause", result);
}

pub async fn next(device: Option<String>) {
    let integration = session::connect(device.as_deref()).await;
    let result = integration.dispatcher().next(None).await;
    report(integration, "Next", result);
}

pub async fn previous(device: Option<String>) {
    let integration = session::connect(device.as_deref()).await;
    let result = integration.dispatcher().previous(None).await;
    report(integration, "Previous", result);
}

pub async fn shuffle(state: bool, device: Option<String>) {
    let integration = session::connect(device.as_deref()).await;
    let result = integration.dispatcher().shuffle(state, None).await;
    report(integration, "Shuffle", result);
}

pub async fn repeat(mode: RepeatMode, device: Option<String>) {
    let integration = session::connect(device.as_deref()).await;
    let result = integration.dispatcher().repeat(mode, None).await;
    report(integration, "Repeat", result);
}

/// Moves playback to a device given by label or id.
pub async fn transfer(target: String) {
    let integration = session::connect(None).await;
    let result = integration.dispatcher().transfer(&target).await;
    report(integration, "Transfer", result);
}

/// Selection only lives as long as the instance, so this mostly serves to
/// check that a label resolves.
pub async fn select_device(target: String) {
    let integration = session::connect(None).await;
    match integration.dispatcher().select_device(&target).await {
        Ok(device) => success!("Selected {}", utils::device_label(&device)),
        Err(e) => {
            integration.unload();
            error!("{}", e);
        }
    }
    integration.unload();
}

pub async fn source(name: String, device: Option<String>) {
    let integration = session::connect(device.as_deref()).await;
    let result = integration.dispatcher().select_source(&name).await;
    report(integration, "Source", result);
}

/// Starts a playlist, optionally at one of its tracks (uri or picker label).
pub async fn play_playlist(playlist: String, track: Option<String>, device: Option<String>) {
    let integration = session::connect(device.as_deref()).await;
    let Some(snapshot) = integration.coordinator().data() else {
        error!("No playback data available");
    };

    let playlist_id = view::playlist_options(&snapshot, integration.context())
        .value_of(&playlist)
        .map(str::to_string)
        .or_else(|| snapshot.playlist(&playlist).map(|p| p.id.clone()));

    let result = match (track, playlist_id) {
        (None, Some(id)) => {
            integration
                .dispatcher()
                .play_playlist(PlaylistRef::Id(id), None)
                .await
        }
        (None, None) => {
            integration
                .dispatcher()
                .play_playlist(PlaylistRef::Name(playlist), None)
                .await
        }
        (Some(track), Some(id)) => {
            let options = view::playlist_track_options(&snapshot, &id);
            let uri = options.value_of(&track).unwrap_or(&track).to_string();
            info!("Playing {} in {}", track, playlist);
            integration
                .dispatcher()
                .play_track_in_playlist(&id, &uri, None)
                .await
        }
        (Some(_), None) => {
            integration.unload();
            error!("Unknown playlist: {}", playlist);
        }
    };
    report(integration, "Play playlist", result);
}

/// Plays a saved or recently played track, given by uri or picker label.
pub async fn play_track(track: String, device: Option<String>) {
    let integration = session::connect(device.as_deref()).await;
    let Some(snapshot) = integration.coordinator().data() else {
        error!("No playback data available");
    };

    let saved = view::saved_track_options(&snapshot);
    let recent = view::recent_track_options(&snapshot);
    let uri = saved
        .value_of(&track)
        .or_else(|| recent.value_of(&track))
        .unwrap_or(&track)
        .to_string();

    let result = integration.dispatcher().play_track(&uri, None).await;
    report(integration, "Play track", result);
}

pub async fn queue(uri: String, now: bool, device: Option<String>) {
    let integration = session::connect(device.as_deref()).await;
    let result = integration.dispatcher().queue_track(&uri, None, now).await;
    report(integration, "Queue", result);
}

/// Drops the loaded library and loads it again.
pub async fn refresh_library() {
    let integration = session::connect(None).await;
    integration.dispatcher().refresh_library();

    let pb = session::spinner("Reloading library...");
    let result = integration.coordinator().tick().await;
    pb.finish_and_clear();

    match result {
        Ok(snapshot) => success!("Library reloaded, {} playlists", snapshot.playlists.len()),
        Err(e) => {
            integration.unload();
            error!("Library reload failed. Err: {}", e);
        }
    }
    integration.unload();
}
