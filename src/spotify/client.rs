//! REST client for the Spotify Web API.
//!
//! One method per remote capability. Every request carries the bearer token
//! currently stored in the client; the client never refreshes tokens itself,
//! callers set a fresh one with [`SpotifyApi::set_token`] before privileged
//! calls.

use reqwest::{
    Client, Method, StatusCode,
    header::{CONTENT_LENGTH, CONTENT_TYPE},
};
use serde_json::{Map, Value, json};
use tokio::sync::RwLock;

use crate::{
    error::{Error, Result},
    types::{Device, Playlist, RecentItem, RepeatMode, Track},
    utils,
};

/// Tracks fetched per playlist during a library load.
pub const PLAYLIST_TRACK_CAP: usize = 128;
pub const SAVED_TRACK_CAP: usize = 50;
/// The recently-played endpoint serves at most one page of 50.
pub const RECENT_LIMIT: usize = 50;

#[derive(Debug)]
pub struct SpotifyApi {
    http: Client,
    base_url: String,
    token: RwLock<String>,
}

impl SpotifyApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a client sharing an existing connection pool.
    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: RwLock::new(String::new()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn set_token(&self, token: impl Into<String>) {
        *self.token.write().await = token.into();
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Value> {
        let token = self.token.read().await.clone();
        tracing::debug!(%method, url, "spotify request");

        let mut req = self.http.request(method.clone(), url).bearer_auth(token);
        if !query.is_empty() {
            req = req.query(query);
        }
        req = match body {
            Some(body) => req.json(&body),
            None if method != Method::GET => req.header(CONTENT_LENGTH, "0"),
            None => req,
        };

        let resp = req.send().await?;
        let status = resp.status();

        if status == StatusCode::NO_CONTENT {
            return Ok(empty());
        }

        if status.as_u16() >= 400 {
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!(%method, url, status = status.as_u16(), "spotify request rejected");
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let is_json = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.to_ascii_lowercase().contains("application/json"));
        if !is_json {
            resp.bytes().await?;
            return Ok(empty());
        }

        Ok(resp.json::<Value>().await?)
    }

    async fn get(&self, url: &str) -> Result<Value> {
        self.request(Method::GET, url, &[], None).await
    }

    /// Follows `next` links from `first`, collecting what `extract` yields
    /// from each page's `items` in encounter order.
    ///
    /// Stops when a page has no `next` link or once `cap` items are
    /// collected, whichever comes first.
    pub async fn paginate<T>(
        &self,
        first: String,
        cap: Option<usize>,
        mut extract: impl FnMut(&Value) -> Option<T>,
    ) -> Result<Vec<T>> {
        let full = |out: &Vec<T>| cap.is_some_and(|c| out.len() >= c);
        let mut out = Vec::new();
        let mut next = Some(first);

        while let Some(url) = next.take() {
            if full(&out) {
                break;
            }

            let page = self.get(&url).await?;
            for item in page
                .get("items")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
            {
                if let Some(value) = extract(item) {
                    out.push(value);
                    if full(&out) {
                        break;
                    }
                }
            }

            next = page
                .get("next")
                .and_then(Value::as_str)
                .filter(|n| !n.is_empty())
                .map(str::to_string);
        }

        Ok(out)
    }

    pub async fn get_playlists(&self) -> Result<Vec<Playlist>> {
        let url = format!("{}/me/playlists?limit=50", self.base_url);
        self.paginate(url, None, |it| {
            Some(Playlist {
                id: it.get("id")?.as_str()?.to_string(),
                name: it
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            })
        })
        .await
    }

    pub async fn get_playlist_tracks(&self, playlist_id: &str, cap: usize) -> Result<Vec<Track>> {
        let url = format!("{}/playlists/{}/tracks?limit=100", self.base_url, playlist_id);
        self.paginate(url, Some(cap), utils::flatten_track).await
    }

    pub async fn get_saved_tracks(&self, cap: usize) -> Result<Vec<Track>> {
        let url = format!("{}/me/tracks?limit=50", self.base_url);
        self.paginate(url, Some(cap), utils::flatten_track).await
    }

    pub async fn get_recently_played(&self, limit: usize) -> Result<Vec<RecentItem>> {
        let url = format!(
            "{}/me/player/recently-played?limit={}",
            self.base_url,
            limit.min(RECENT_LIMIT)
        );
        let data = self.get(&url).await?;

        Ok(data
            .get("items")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|item| {
                let track = utils::flatten_track(item)?;
                let played_at = item
                    .get("played_at")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                Some(RecentItem::from_track(track, played_at))
            })
            .collect())
    }

    pub async fn get_devices(&self) -> Result<Vec<Device>> {
        let data = self.get(&format!("{}/me/player/devices", self.base_url)).await?;

        Ok(data
            .get("devices")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|d| {
                let id = d.get("id").and_then(Value::as_str).filter(|id| !id.is_empty())?;
                Some(Device {
                    id: id.to_string(),
                    name: d
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    is_active: d.get("is_active").and_then(Value::as_bool).unwrap_or(false),
                })
            })
            .collect())
    }

    /// Current player record, `None` when nothing is loaded on any device.
    pub async fn get_player(&self) -> Result<Option<Value>> {
        let data = self.get(&format!("{}/me/player", self.base_url)).await?;
        Ok(match data {
            Value::Object(ref map) if map.is_empty() => None,
            Value::Null => None,
            other => Some(other),
        })
    }

    pub async fn start_playback(&self, device_id: &str, track_uri: &str) -> Result<()> {
        self.request(
            Method::PUT,
            &format!("{}/me/player/play", self.base_url),
            &[("device_id", device_id.to_string())],
            Some(json!({ "uris": [track_uri] })),
        )
        .await
        .map(drop)
    }

    pub async fn add_to_queue(&self, device_id: &str, track_uri: &str) -> Result<()> {
        self.request(
            Method::POST,
            &format!("{}/me/player/queue", self.base_url),
            &[
                ("uri", track_uri.to_string()),
                ("device_id", device_id.to_string()),
            ],
            None,
        )
        .await
        .map(drop)
    }

    pub async fn pause(&self, device_id: Option<&str>) -> Result<()> {
        self.control(Method::PUT, "pause", device_id, Vec::new()).await
    }

    pub async fn resume(&self, device_id: Option<&str>) -> Result<()> {
        self.control(Method::PUT, "play", device_id, Vec::new()).await
    }

    pub async fn next_track(&self, device_id: Option<&str>) -> Result<()> {
        self.control(Method::POST, "next", device_id, Vec::new()).await
    }

    pub async fn previous_track(&self, device_id: Option<&str>) -> Result<()> {
        self.control(Method::POST, "previous", device_id, Vec::new()).await
    }

    pub async fn set_shuffle(&self, shuffle: bool, device_id: Option<&str>) -> Result<()> {
        self.control(
            Method::PUT,
            "shuffle",
            device_id,
            vec![("state", shuffle.to_string())],
        )
        .await
    }

    pub async fn set_repeat(&self, mode: RepeatMode, device_id: Option<&str>) -> Result<()> {
        self.control(
            Method::PUT,
            "repeat",
            device_id,
            vec![("state", mode.as_api_str().to_string())],
        )
        .await
    }

    pub async fn start_playlist(&self, device_id: &str, playlist_id: &str) -> Result<()> {
        self.play_context(device_id, playlist_id, None).await
    }

    pub async fn start_playlist_at_track(
        &self,
        device_id: &str,
        playlist_id: &str,
        track_uri: &str,
    ) -> Result<()> {
        self.play_context(device_id, playlist_id, Some(track_uri)).await
    }

    pub async fn transfer_playback(&self, device_id: &str, play: bool) -> Result<()> {
        self.request(
            Method::PUT,
            &format!("{}/me/player", self.base_url),
            &[],
            Some(json!({ "device_ids": [device_id], "play": play })),
        )
        .await
        .map(drop)
    }

    async fn play_context(
        &self,
        device_id: &str,
        playlist_id: &str,
        offset_uri: Option<&str>,
    ) -> Result<()> {
        let mut body = Map::new();
        body.insert(
            "context_uri".to_string(),
            Value::String(format!("spotify:playlist:{playlist_id}")),
        );
        if let Some(uri) = offset_uri {
            body.insert("offset".to_string(), json!({ "uri": uri }));
        }

        self.request(
            Method::PUT,
            &format!("{}/me/player/play", self.base_url),
            &[("device_id", device_id.to_string())],
            Some(Value::Object(body)),
        )
        .await
        .map(drop)
    }

    async fn control(
        &self,
        method: Method,
        action: &str,
        device_id: Option<&str>,
        mut query: Vec<(&str, String)>,
    ) -> Result<()> {
        if let Some(id) = device_id {
            query.push(("device_id", id.to_string()));
        }
        self.request(
            method,
            &format!("{}/me/player/{}", self.base_url, action),
            &query,
            None,
        )
        .await
        .map(drop)
    }
}

fn empty() -> Value {
    Value::Object(Map::new())
}
