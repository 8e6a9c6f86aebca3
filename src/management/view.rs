//! Read-only views derived from a [`Snapshot`]: the media-player state and
//! the option lists the pickers offer.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::{
    management::Context,
    types::{RepeatMode, Snapshot},
    utils::{self, Options},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Playing,
    Paused,
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Music,
    Podcast,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDevice {
    pub id: Option<String>,
    pub name: String,
    pub kind: Option<String>,
    pub volume_percent: Option<u64>,
}

/// Media-player state of one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerView {
    pub state: PlayerState,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub image_url: Option<String>,
    pub content_type: Option<ContentType>,
    pub duration_secs: Option<u64>,
    pub position_secs: Option<u64>,
    pub position_updated_at: Option<DateTime<Utc>>,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub source: Option<String>,
    pub device: Option<ActiveDevice>,
}

impl PlayerView {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let Some(player) = snapshot.player.as_ref() else {
            return Self::idle();
        };

        let item = player.get("item").filter(|item| !item.is_null());
        let str_of = |value: Option<&Value>, key: &str| {
            value
                .and_then(|v| v.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        let duration_secs = item
            .and_then(|i| i.get("duration_ms"))
            .and_then(Value::as_u64)
            .map(|ms| ms / 1000);
        let position_secs = player
            .get("progress_ms")
            .and_then(Value::as_i64)
            .map(|ms| {
                let secs = (ms / 1000).max(0) as u64;
                duration_secs.map_or(secs, |d| secs.min(d))
            });
        let position_updated_at = position_secs.map(|_| {
            player
                .get("timestamp")
                .and_then(Value::as_i64)
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
                .unwrap_or(snapshot.updated_at)
        });

        let artist = item
            .map(|i| utils::join_artists(i.get("artists")))
            .filter(|joined| joined != "Unknown");
        let album = item.and_then(|i| i.get("album"));
        let image_url = album
            .and_then(|a| a.get("images"))
            .and_then(Value::as_array)
            .and_then(|images| images.first())
            .and_then(|image| image.get("url"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let content_type = match item.and_then(|i| i.get("type")).and_then(Value::as_str) {
            Some("track") => Some(ContentType::Music),
            Some("episode") => Some(ContentType::Podcast),
            _ => None,
        };

        let playing = player
            .get("is_playing")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let repeat = player
            .get("repeat_state")
            .and_then(Value::as_str)
            .and_then(RepeatMode::from_api_str)
            .unwrap_or(RepeatMode::Off);

        let context = player.get("context").filter(|c| !c.is_null());
        let source = match str_of(context, "type").as_deref() {
            Some("playlist") => str_of(context, "uri")
                .and_then(|uri| uri.rsplit(':').next().map(str::to_string))
                .and_then(|id| snapshot.playlist(&id).map(|p| p.name.clone())),
            _ => None,
        };

        let device = player.get("device").filter(|d| !d.is_null()).map(|d| ActiveDevice {
            id: str_of(Some(d), "id"),
            name: str_of(Some(d), "name").unwrap_or_else(|| "Unknown".to_string()),
            kind: str_of(Some(d), "type"),
            volume_percent: d.get("volume_percent").and_then(Value::as_u64),
        });

        PlayerView {
            state: if playing {
                PlayerState::Playing
            } else {
                PlayerState::Paused
            },
            title: str_of(item, "name"),
            artist,
            album: str_of(album, "name"),
            image_url,
            content_type,
            duration_secs,
            position_secs,
            position_updated_at,
            shuffle: player
                .get("shuffle_state")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            repeat,
            source,
            device,
        }
    }

    fn idle() -> Self {
        PlayerView {
            state: PlayerState::Idle,
            title: None,
            artist: None,
            album: None,
            image_url: None,
            content_type: None,
            duration_secs: None,
            position_secs: None,
            position_updated_at: None,
            shuffle: false,
            repeat: RepeatMode::Off,
            source: None,
            device: None,
        }
    }
}

pub fn device_options(snapshot: &Snapshot) -> Options {
    Options::from_pairs(
        snapshot
            .devices
            .iter()
            .map(|d| (utils::device_label(d), d.id.as_str())),
    )
}

/// Names of the allowlisted playlists; empty when no allowlist is set.
pub fn source_list(snapshot: &Snapshot, context: &Context) -> Vec<String> {
    if context.playlist_ids().is_empty() {
        return Vec::new();
    }

    snapshot
        .playlists
        .iter()
        .filter(|p| context.allows_playlist(&p.id))
        .map(|p| p.name.clone())
        .collect()
}

pub fn playlist_options(snapshot: &Snapshot, context: &Context) -> Options {
    Options::from_pairs(
        snapshot
            .playlists
            .iter()
            .filter(|p| context.allows_playlist(&p.id))
            .map(|p| (p.name.clone(), p.id.as_str())),
    )
}

pub fn playlist_track_options(snapshot: &Snapshot, playlist_id: &str) -> Options {
    Options::tracks(
        snapshot
            .tracks_of(playlist_id)
            .iter()
            .map(|t| (t.name.as_str(), t.artists.as_str(), t.uri.as_str())),
    )
}

pub fn saved_track_options(snapshot: &Snapshot) -> Options {
    Options::tracks(
        snapshot
            .saved_tracks
            .iter()
            .map(|t| (t.name.as_str(), t.artists.as_str(), t.uri.as_str())),
    )
}

pub fn recent_track_options(snapshot: &Snapshot) -> Options {
    Options::tracks(
        snapshot
            .recent_tracks
            .iter()
            .map(|t| (t.name.as_str(), t.artists.as_str(), t.uri.as_str())),
    )
}
