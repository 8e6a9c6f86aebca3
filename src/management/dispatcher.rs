//! Command dispatcher.
//!
//! Every user-issued playback command passes through [`Dispatcher`]:
//! arguments are resolved first, then the debounce window is checked, the
//! token refreshed, the remote calls sent in order, and finally one
//! out-of-schedule coordinator refresh requested whatever the result.

use std::{sync::Arc, time::Duration};

use tokio::{sync::Mutex, time::Instant};

use crate::{
    error::{Error, Result},
    management::{Context, Coordinator, TokenProvider},
    spotify::SpotifyApi,
    types::{Device, PlayMode, RepeatMode, Snapshot},
    utils,
};

pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Rejects anything arriving within `window` of the last accepted command.
#[derive(Debug)]
pub struct Debounce {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl Debounce {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    /// Rejections leave the window where it was.
    pub fn accept_at(&mut self, now: Instant) -> bool {
        match self.last_accepted {
            Some(last) if now.saturating_duration_since(last) < self.window => false,
            _ => {
                self.last_accepted = Some(now);
                true
            }
        }
    }

    pub fn accept(&mut self) -> bool {
        self.accept_at(Instant::now())
    }
}

/// What happened to a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Sent,
    /// Dropped by the debounce guard, nothing was sent.
    Debounced,
    /// The API answered 403; treated as a stale session or device and
    /// answered with a refresh instead of an error.
    Invalidated,
}

/// One remote playback call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackCall {
    Transfer {
        device_id: String,
        play: bool,
    },
    Resume {
        device_id: Option<String>,
    },
    Pause {
        device_id: Option<String>,
    },
    Next {
        device_id: Option<String>,
    },
    Previous {
        device_id: Option<String>,
    },
    Shuffle {
        state: bool,
        device_id: Option<String>,
    },
    Repeat {
        mode: RepeatMode,
        device_id: Option<String>,
    },
    PlayTrack {
        device_id: String,
        track_uri: String,
    },
    Queue {
        device_id: String,
        track_uri: String,
    },
    PlayPlaylist {
        device_id: String,
        playlist_id: String,
        offset_uri: Option<String>,
    },
}

impl PlaybackCall {
    pub async fn send(&self, api: &SpotifyApi) -> Result<()> {
        match self {
            PlaybackCall::Transfer { device_id, play } => {
                api.transfer_playback(device_id, *play).await
            }
            PlaybackCall::Resume { device_id } => api.resume(device_id.as_deref()).await,
            PlaybackCall::Pause { device_id } => api.pause(device_id.as_deref()).await,
            PlaybackCall::Next { device_id } => api.next_track(device_id.as_deref()).await,
            PlaybackCall::Previous { device_id } => api.previous_track(device_id.as_deref()).await,
            PlaybackCall::Shuffle { state, device_id } => {
                api.set_shuffle(*state, device_id.as_deref()).await
            }
            PlaybackCall::Repeat { mode, device_id } => {
                api.set_repeat(*mode, device_id.as_deref()).await
            }
            PlaybackCall::PlayTrack {
                device_id,
                track_uri,
            } => api.start_playback(device_id, track_uri).await,
            PlaybackCall::Queue {
                device_id,
                track_uri,
            } => api.add_to_queue(device_id, track_uri).await,
            PlaybackCall::PlayPlaylist {
                device_id,
                playlist_id,
                offset_uri: Some(uri),
            } => api.start_playlist_at_track(device_id, playlist_id, uri).await,
            PlaybackCall::PlayPlaylist {
                device_id,
                playlist_id,
                offset_uri: None,
            } => api.start_playlist(device_id, playlist_id).await,
        }
    }
}

/// Calls for picking `track_uri` inside a playlist.
///
/// With [`PlayMode::QueueThenSkip`] and something playing, the playlist is
/// started from the top, the track queued right after and skipped to.
/// Otherwise the playlist starts positioned at the track.
pub fn plan_playlist_track(
    mode: PlayMode,
    playing: bool,
    device_id: &str,
    playlist_id: &str,
    track_uri: &str,
) -> Vec<PlaybackCall> {
    if mode == PlayMode::QueueThenSkip && playing {
        return vec![
            PlaybackCall::PlayPlaylist {
                device_id: device_id.to_string(),
                playlist_id: playlist_id.to_string(),
                offset_uri: None,
            },
            PlaybackCall::Queue {
                device_id: device_id.to_string(),
                track_uri: track_uri.to_string(),
            },
            PlaybackCall::Next {
                device_id: Some(device_id.to_string()),
            },
        ];
    }

    vec![PlaybackCall::PlayPlaylist {
        device_id: device_id.to_string(),
        playlist_id: playlist_id.to_string(),
        offset_uri: Some(track_uri.to_string()),
    }]
}

/// Calls for picking a saved or recently played track (no context).
pub fn plan_track(
    mode: PlayMode,
    playing: bool,
    device_id: &str,
    track_uri: &str,
) -> Vec<PlaybackCall> {
    if mode == PlayMode::QueueThenSkip && playing {
        return plan_queue(true, true, device_id, track_uri);
    }

    vec![PlaybackCall::PlayTrack {
        device_id: device_id.to_string(),
        track_uri: track_uri.to_string(),
    }]
}

/// Calls for queueing a track; starts it directly when nothing is playing.
pub fn plan_queue(
    playing: bool,
    play_now: bool,
    device_id: &str,
    track_uri: &str,
) -> Vec<PlaybackCall> {
    if !playing {
        return vec![PlaybackCall::PlayTrack {
            device_id: device_id.to_string(),
            track_uri: track_uri.to_string(),
        }];
    }

    let mut calls = vec![PlaybackCall::Queue {
        device_id: device_id.to_string(),
        track_uri: track_uri.to_string(),
    }];
    if play_now {
        calls.push(PlaybackCall::Next {
            device_id: Some(device_id.to_string()),
        });
    }
    calls
}

/// A playlist named either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistRef {
    Id(String),
    Name(String),
}

impl PlaylistRef {
    /// Prefers the id when both are given.
    pub fn from_parts(id: Option<String>, name: Option<String>) -> Result<Self> {
        match (id, name) {
            (Some(id), _) if !id.is_empty() => Ok(PlaylistRef::Id(id)),
            (_, Some(name)) if !name.is_empty() => Ok(PlaylistRef::Name(name)),
            _ => Err(Error::invalid("Provide playlist_id or playlist_name")),
        }
    }
}

/// Finds a device by its display label or by id.
pub fn find_device<'a>(devices: &'a [Device], target: &str) -> Option<&'a Device> {
    devices
        .iter()
        .find(|d| utils::device_label(d) == target)
        .or_else(|| devices.iter().find(|d| d.id == target))
}

pub struct Dispatcher {
    context: Arc<Context>,
    api: Arc<SpotifyApi>,
    tokens: Arc<dyn TokenProvider>,
    coordinator: Arc<Coordinator>,
    debounce: Mutex<Debounce>,
}

impl Dispatcher {
    pub fn new(
        context: Arc<Context>,
        api: Arc<SpotifyApi>,
        tokens: Arc<dyn TokenProvider>,
        coordinator: Arc<Coordinator>,
    ) -> Self {
        Self::with_window(context, api, tokens, coordinator, DEBOUNCE_WINDOW)
    }

    pub fn with_window(
        context: Arc<Context>,
        api: Arc<SpotifyApi>,
        tokens: Arc<dyn TokenProvider>,
        coordinator: Arc<Coordinator>,
        window: Duration,
    ) -> Self {
        Self {
            context,
            api,
            tokens,
            coordinator,
            debounce: Mutex::new(Debounce::new(window)),
        }
    }

    async fn dispatch(&self, command: &str, calls: Vec<PlaybackCall>) -> Result<Outcome> {
        if !self.debounce.lock().await.accept() {
            tracing::debug!(command, "command debounced");
            return Ok(Outcome::Debounced);
        }

        let token = self.tokens.ensure_token_valid().await?;
        self.api.set_token(token).await;

        let mut result = Ok(());
        for call in &calls {
            tracing::debug!(command, ?call, "sending playback call");
            if let Err(e) = call.send(&self.api).await {
                result = Err(e);
                break;
            }
        }

        self.coordinator.request_refresh();

        match result {
            Ok(()) => Ok(Outcome::Sent),
            Err(e) if e.status() == Some(403) => {
                tracing::warn!(command, error = %e, "playback call forbidden, refreshing state");
                Ok(Outcome::Invalidated)
            }
            Err(e) => Err(e),
        }
    }

    fn snapshot(&self) -> Result<Arc<Snapshot>> {
        self.coordinator
            .data()
            .ok_or_else(|| Error::invalid("No playback data loaded yet"))
    }

    fn playing(&self) -> bool {
        self.coordinator
            .data()
            .is_some_and(|snapshot| snapshot.player.is_some())
    }

    async fn optional_device(&self, explicit: Option<&str>) -> Option<String> {
        match explicit.filter(|id| !id.is_empty()) {
            Some(id) => Some(id.to_string()),
            None => self.context.selected_device().await,
        }
    }

    /// Transfers playback to the target device and resumes there.
    pub async fn play(&self, device_id: Option<&str>) -> Result<Outcome> {
        let device_id = self.context.resolve_device(device_id).await?;
        let calls = vec![
            PlaybackCall::Transfer {
                device_id: device_id.clone(),
                play: true,
            },
            PlaybackCall::Resume {
                device_id: Some(device_id),
            },
        ];
        self.dispatch("play", calls).await
    }

    pub async fn pause(&self, device_id: Option<&str>) -> Result<Outcome> {
        let device_id = self.optional_device(device_id).await;
        self.dispatch("pause", vec![PlaybackCall::Pause { device_id }])
            .await
    }

    pub async fn next(&self, device_id: Option<&str>) -> Result<Outcome> {
        let device_id = self.optional_device(device_id).await;
        self.dispatch("next", vec![PlaybackCall::Next { device_id }])
            .await
    }

    pub async fn previous(&self, device_id: Option<&str>) -> Result<Outcome> {
        let device_id = self.optional_device(device_id).await;
        self.dispatch("previous", vec![PlaybackCall::Previous { device_id }])
            .await
    }

    pub async fn shuffle(&self, state: bool, device_id: Option<&str>) -> Result<Outcome> {
        let device_id = self.optional_device(device_id).await;
        self.dispatch("shuffle", vec![PlaybackCall::Shuffle { state, device_id }])
            .await
    }

    pub async fn repeat(&self, mode: RepeatMode, device_id: Option<&str>) -> Result<Outcome> {
        let device_id = self.optional_device(device_id).await;
        self.dispatch("repeat", vec![PlaybackCall::Repeat { mode, device_id }])
            .await
    }

    /// Starts the allowlisted playlist named `source` on the selected device.
    pub async fn select_source(&self, source: &str) -> Result<Outcome> {
        let device_id = self.context.resolve_device(None).await?;
        let snapshot = self.snapshot()?;
        let playlist = snapshot
            .playlists
            .iter()
            .find(|p| p.name == source && self.context.allows_playlist(&p.id))
            .ok_or_else(|| Error::invalid(format!("Unknown source: {source}")))?;

        let calls = vec![PlaybackCall::PlayPlaylist {
            device_id,
            playlist_id: playlist.id.clone(),
            offset_uri: None,
        }];
        self.dispatch("select_source", calls).await
    }

    /// Moves playback to `target` (label or id) and remembers it as selected.
    pub async fn transfer(&self, target: &str) -> Result<Outcome> {
        let snapshot = self.snapshot()?;
        let device_id = find_device(&snapshot.devices, target)
            .map(|d| d.id.clone())
            .ok_or_else(|| Error::invalid(format!("Unknown device: {target}")))?;

        let calls = vec![PlaybackCall::Transfer {
            device_id: device_id.clone(),
            play: true,
        }];
        let outcome = self.dispatch("transfer", calls).await?;
        if outcome != Outcome::Debounced {
            self.context.select_device(device_id).await;
        }
        Ok(outcome)
    }

    /// Selects the device for later commands without any remote call.
    pub async fn select_device(&self, target: &str) -> Result<Device> {
        let snapshot = self.snapshot()?;
        let device = find_device(&snapshot.devices, target)
            .cloned()
            .ok_or_else(|| Error::invalid(format!("Unknown device: {target}")))?;
        self.context.select_device(device.id.clone()).await;
        Ok(device)
    }

    pub async fn play_playlist(
        &self,
        playlist: PlaylistRef,
        device_id: Option<&str>,
    ) -> Result<Outcome> {
        let device_id = self.context.resolve_device(device_id).await?;
        let playlist_id = match playlist {
            PlaylistRef::Id(id) => id,
            PlaylistRef::Name(name) => self
                .snapshot()?
                .playlist_by_name(&name)
                .map(|p| p.id.clone())
                .ok_or_else(|| Error::invalid(format!("Playlist not found by name: {name}")))?,
        };

        let calls = vec![PlaybackCall::PlayPlaylist {
            device_id,
            playlist_id,
            offset_uri: None,
        }];
        self.dispatch("play_playlist", calls).await
    }

    pub async fn play_track_in_playlist(
        &self,
        playlist_id: &str,
        track_uri: &str,
        device_id: Option<&str>,
    ) -> Result<Outcome> {
        let device_id = self.context.resolve_device(device_id).await?;
        let calls = plan_playlist_track(
            self.context.play_mode(),
            self.playing(),
            &device_id,
            playlist_id,
            track_uri,
        );
        self.dispatch("play_track_in_playlist", calls).await
    }

    /// Plays a saved or recently played track.
    pub async fn play_track(&self, track_uri: &str, device_id: Option<&str>) -> Result<Outcome> {
        let device_id = self.context.resolve_device(device_id).await?;
        let calls = plan_track(
            self.context.play_mode(),
            self.playing(),
            &device_id,
            track_uri,
        );
        self.dispatch("play_track", calls).await
    }

    pub async fn queue_track(
        &self,
        track_uri: &str,
        device_id: Option<&str>,
        play_now: bool,
    ) -> Result<Outcome> {
        let device_id = self.context.resolve_device(device_id).await?;
        let calls = plan_queue(self.playing(), play_now, &device_id, track_uri);
        self.dispatch("queue_track", calls).await
    }

    /// Forces the next tick to re-fetch playlists and their tracks.
    pub fn refresh_library(&self) {
        self.coordinator.reset_library();
    }
}
