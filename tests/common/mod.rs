#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use spotsel::{
    config::Settings,
    error::Result,
    management::{Context, Coordinator, TokenProvider},
    spotify::SpotifyApi,
    types::PlayMode,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

pub const TOKEN: &str = "test-token";

/// Hands out a fixed token.
pub struct StaticToken;

#[async_trait]
impl TokenProvider for StaticToken {
    async fn ensure_token_valid(&self) -> Result<String> {
        Ok(TOKEN.to_string())
    }
}

pub struct Parts {
    pub settings: Settings,
    pub context: Arc<Context>,
    pub api: Arc<SpotifyApi>,
    pub tokens: Arc<dyn TokenProvider>,
    pub coordinator: Arc<Coordinator>,
}

pub fn parts(server: &MockServer, play_mode: PlayMode) -> Parts {
    let mut settings = Settings::for_api(server.uri());
    settings.play_mode = play_mode;

    let context = Arc::new(Context::new("test", &settings));
    let api = Arc::new(SpotifyApi::new(server.uri()));
    let tokens: Arc<dyn TokenProvider> = Arc::new(StaticToken);
    let coordinator = Arc::new(Coordinator::new(
        Arc::clone(&api),
        Arc::clone(&tokens),
        Arc::clone(&context),
    ));

    Parts {
        settings,
        context,
        api,
        tokens,
        coordinator,
    }
}

pub fn track_item(id: &str, name: &str) -> Value {
    json!({
        "track": {
            "uri": format!("spotify:track:{id}"),
            "name": name,
            "artists": [{"name": "Artist"}]
        }
    })
}

pub fn page(items: Vec<Value>, next: Option<String>) -> Value {
    json!({ "items": items, "next": next })
}

pub fn ok_json(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

pub async fn mount_get(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ok_json(body))
        .mount(server)
        .await;
}

pub async fn mount_devices(server: &MockServer, active: bool) {
    mount_get(
        server,
        "/me/player/devices",
        json!({
            "devices": [
                {"id": "dev-1", "name": "Desk", "is_active": active},
                {"id": null, "name": "Restricted", "is_active": false}
            ]
        }),
    )
    .await;
}

/// Player record playing from playlist `pl-1` on `dev-1`.
pub fn player_record() -> Value {
    json!({
        "is_playing": true,
        "progress_ms": 1000,
        "timestamp": 1_700_000_000_000i64,
        "shuffle_state": false,
        "repeat_state": "off",
        "context": {"type": "playlist", "uri": "spotify:playlist:pl-1"},
        "device": {"id": "dev-1", "name": "Desk", "type": "Computer", "volume_percent": 50},
        "item": {
            "type": "track",
            "name": "One",
            "duration_ms": 180_000,
            "artists": [{"name": "Artist"}],
            "album": {"name": "Album", "images": []}
        }
    })
}

/// One playlist with two tracks, saved and recent tracks, one device and
/// (optionally) a player record.
pub async fn mount_account(server: &MockServer, playing: bool) {
    mount_get(
        server,
        "/me/playlists",
        page(vec![json!({"id": "pl-1", "name": "Morning"})], None),
    )
    .await;
    mount_get(
        server,
        "/playlists/pl-1/tracks",
        page(vec![track_item("1", "One"), track_item("2", "Two")], None),
    )
    .await;
    mount_get(server, "/me/tracks", page(vec![track_item("3", "Three")], None)).await;
    mount_get(
        server,
        "/me/player/recently-played",
        json!({"items": [{"track": {"uri": "spotify:track:4", "name": "Four", "artists": []}, "played_at": "2024-01-01T00:00:00Z"}]}),
    )
    .await;
    mount_devices(server, true).await;

    let player = if playing {
        ok_json(player_record())
    } else {
        ResponseTemplate::new(204)
    };
    Mock::given(method("GET"))
        .and(path("/me/player"))
        .respond_with(player)
        .mount(server)
        .await;
}

/// Non-GET requests received so far, as `(method, path, json body)`.
pub async fn commands(server: &MockServer) -> Vec<(String, String, Value)> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() != "GET")
        .map(|r| {
            let body = serde_json::from_slice(&r.body).unwrap_or(Value::Null);
            (r.method.to_string(), r.url.path().to_string(), body)
        })
        .collect()
}

pub async fn count_gets(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == "GET" && r.url.path() == route)
        .count()
}
