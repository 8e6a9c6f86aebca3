use std::{collections::HashMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabled::Tabled;

use crate::error::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

/// Pending authorization shared between the login flow and the callback handler.
#[derive(Debug, Clone)]
pub struct PkceToken {
    pub code_verifier: String,
    pub state: String,
    pub token: Option<Token>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
}

/// A playable track. `uri` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub uri: String,
    pub name: String,
    pub artists: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentItem {
    pub uri: String,
    pub name: String,
    pub artists: String,
    pub played_at: Option<String>,
}

impl RecentItem {
    pub fn from_track(track: Track, played_at: Option<String>) -> Self {
        Self {
            uri: track.uri,
            name: track.name,
            artists: track.artists,
            played_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub is_active: bool,
}

/// Playlists and their tracks, loaded once and reused until a library reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Library {
    pub playlists: Vec<Playlist>,
    pub playlist_tracks: HashMap<String, Vec<Track>>,
}

/// Best-known view of the remote playback and library state.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub devices: Vec<Device>,
    pub playlists: Vec<Playlist>,
    pub saved_tracks: Vec<Track>,
    pub recent_tracks: Vec<RecentItem>,
    pub playlist_tracks: HashMap<String, Vec<Track>>,
    /// Raw `/me/player` record, absent when nothing is playing or the fetch failed.
    pub player: Option<Value>,
    pub updated_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn playlist(&self, id: &str) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.id == id)
    }

    pub fn playlist_by_name(&self, name: &str) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.name == name)
    }

    pub fn tracks_of(&self, playlist_id: &str) -> &[Track] {
        self.playlist_tracks
            .get(playlist_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn active_device(&self) -> Option<&Device> {
        self.devices.iter().find(|d| d.is_active)
    }
}

/// How selecting a track inside a list starts playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayMode {
    /// Start the context positioned at the track.
    #[default]
    DirectPlay,
    /// When something is playing, queue the track and skip to it.
    QueueThenSkip,
}

impl FromStr for PlayMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "play" => Ok(PlayMode::DirectPlay),
            "queue_play" => Ok(PlayMode::QueueThenSkip),
            other => Err(Error::Config(format!(
                "unknown play mode '{other}', expected 'play' or 'queue_play'"
            ))),
        }
    }
}

impl fmt::Display for PlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayMode::DirectPlay => write!(f, "play"),
            PlayMode::QueueThenSkip => write!(f, "queue_play"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RepeatMode {
    Off,
    One,
    All,
}

impl RepeatMode {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            RepeatMode::Off => "off",
            RepeatMode::One => "track",
            RepeatMode::All => "context",
        }
    }

    pub fn from_api_str(s: &str) -> Option<Self> {
        match s {
            "off" => Some(RepeatMode::Off),
            "track" => Some(RepeatMode::One),
            "context" => Some(RepeatMode::All),
            _ => None,
        }
    }
}

#[derive(Tabled)]
pub struct DeviceTableRow {
    pub device: String,
    pub id: String,
    pub active: String,
    pub selected: String,
}

#[derive(Tabled)]
pub struct PlaylistTableRow {
    pub name: String,
    pub id: String,
    pub tracks: usize,
    pub allowed: String,
}

#[derive(Tabled)]
pub struct TrackTableRow {
    pub option: String,
    pub uri: String,
}
