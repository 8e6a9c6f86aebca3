//! Configuration management for spotsel.
//!
//! Values come from environment variables, optionally seeded from a `.env`
//! file in the local data directory. Environment variables win over the file.
//! Everything is read once into [`Settings`]; nothing re-parses the
//! environment while the integration is running.

use std::{collections::HashSet, env, path::PathBuf};

use crate::{
    error::{Error, Result},
    types::PlayMode,
};

pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";

pub const SPOTIFY_SCOPES: &[&str] = &[
    "playlist-read-private",
    "playlist-read-collaborative",
    "user-read-playback-state",
    "user-modify-playback-state",
    "user-library-read",
    "user-read-recently-played",
];

/// Loads environment variables from `<data_local_dir>/spotsel/.env`.
///
/// The directory is created when missing. A missing `.env` file is not an
/// error, the process environment alone is then used.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/spotsel/.env`
/// - macOS: `~/Library/Application Support/spotsel/.env`
/// - Windows: `%LOCALAPPDATA%/spotsel/.env`
pub async fn load_env() -> Result<()> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    match dotenv::from_path(&path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "loaded environment file");
            Ok(())
        }
        Err(dotenv::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Config(format!(
            "cannot read {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Root of everything spotsel keeps on disk.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotsel");
    path
}

/// Settings of one integration instance.
#[derive(Debug, Clone)]
pub struct Settings {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub server_address: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    pub scope: String,
    pub play_mode: PlayMode,
    /// Playlists exposed as sources. Empty means "no filter" for the
    /// playlist picker and "no sources" for the source list.
    pub playlist_ids: HashSet<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            client_id: required("SPOTIFY_API_AUTH_CLIENT_ID")?,
            client_secret: optional("SPOTIFY_API_AUTH_CLIENT_SECRET"),
            redirect_uri: or_default("SPOTIFY_API_REDIRECT_URI", DEFAULT_REDIRECT_URI),
            server_address: or_default("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS),
            auth_url: or_default("SPOTIFY_API_AUTH_URL", DEFAULT_AUTH_URL),
            token_url: or_default("SPOTIFY_API_TOKEN_URL", DEFAULT_TOKEN_URL),
            api_url: or_default("SPOTIFY_API_URL", DEFAULT_API_URL),
            scope: optional("SPOTIFY_API_AUTH_SCOPE").unwrap_or_else(|| SPOTIFY_SCOPES.join(" ")),
            play_mode: optional("SPOTSEL_PLAY_MODE")
                .unwrap_or_default()
                .parse()?,
            playlist_ids: parse_id_list(&optional("SPOTSEL_PLAYLIST_IDS").unwrap_or_default()),
        })
    }

    /// Settings pointing every endpoint at `api_url`, for local test servers.
    pub fn for_api(api_url: impl Into<String>) -> Self {
        let api_url = api_url.into();
        Self {
            client_id: "spotsel".to_string(),
            client_secret: None,
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            server_address: DEFAULT_SERVER_ADDRESS.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: format!("{api_url}/api/token"),
            api_url,
            scope: SPOTIFY_SCOPES.join(" "),
            play_mode: PlayMode::default(),
            playlist_ids: HashSet::new(),
        }
    }
}

pub fn parse_id_list(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

fn required(name: &str) -> Result<String> {
    optional(name).ok_or_else(|| Error::Config(format!("{name} must be set")))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn or_default(name: &str, default: &str) -> String {
    optional(name).unwrap_or_else(|| default.to_string())
}
