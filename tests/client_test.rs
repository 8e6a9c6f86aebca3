//! REST client against a mock Web API.

mod common;

use common::{ok_json, page, track_item};
use serde_json::json;
use spotsel::{error::Error, spotify::SpotifyApi};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

async fn client(server: &MockServer) -> SpotifyApi {
    let api = SpotifyApi::new(server.uri());
    api.set_token(common::TOKEN).await;
    api
}

#[tokio::test]
async fn playlists_follow_next_links_in_order() {
    let server = MockServer::start().await;
    let uri = server.uri();

    Mock::given(method("GET"))
        .and(path("/me/playlists"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ok_json(page(
            vec![json!({"id": "a", "name": "A"}), json!({"id": "b", "name": "B"})],
            Some(format!("{uri}/pages/playlists/2")),
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pages/playlists/2"))
        .respond_with(ok_json(page(
            vec![json!({"id": "c", "name": "C"}), json!({"name": "no id"})],
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let playlists = client(&server).await.get_playlists().await.unwrap();
    let ids: Vec<&str> = playlists.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
}

#[tokio::test]
async fn capped_pagination_stops_without_fetching_further_pages() {
    let server = MockServer::start().await;
    let uri = server.uri();

    Mock::given(method("GET"))
        .and(path("/playlists/pl/tracks"))
        .and(query_param("limit", "100"))
        .respond_with(ok_json(page(
            vec![track_item("1", "One"), track_item("2", "Two")],
            Some(format!("{uri}/pages/tracks/2")),
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pages/tracks/2"))
        .respond_with(ok_json(page(
            vec![track_item("3", "Three"), track_item("4", "Four")],
            Some(format!("{uri}/pages/tracks/3")),
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pages/tracks/3"))
        .respond_with(ok_json(page(vec![track_item("5", "Five")], None)))
        .expect(0)
        .mount(&server)
        .await;

    let tracks = client(&server)
        .await
        .get_playlist_tracks("pl", 3)
        .await
        .unwrap();
    assert_eq!(tracks.len(), 3);
    assert_eq!(tracks[2].uri, "spotify:track:3");
}

#[tokio::test]
async fn saved_tracks_skip_unplayable_items() {
    let server = MockServer::start().await;

    common::mount_get(
        &server,
        "/me/tracks",
        page(
            vec![
                json!({"track": null}),
                json!({"added_at": "2024-01-01"}),
                json!({"track": {"uri": "", "name": "Local file"}}),
                json!({"track": {"uri": "spotify:track:x", "artists": [{"name": ""}]}}),
                json!({"track": {"uri": "spotify:track:y", "name": "Y", "artists": [{"name": "A"}, {"name": "B"}]}}),
            ],
            None,
        ),
    )
    .await;

    let tracks = client(&server).await.get_saved_tracks(50).await.unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].name, "Unknown");
    assert_eq!(tracks[0].artists, "Unknown");
    assert_eq!(tracks[1].artists, "A, B");
}

#[tokio::test]
async fn recently_played_keeps_played_at() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/player/recently-played"))
        .and(query_param("limit", "50"))
        .respond_with(ok_json(json!({
            "items": [
                {"track": {"uri": "spotify:track:r", "name": "R"}, "played_at": "2024-05-01T10:00:00Z"},
                {"track": {"name": "no uri"}, "played_at": "2024-05-01T09:00:00Z"}
            ],
            "next": "ignored"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let recent = client(&server)
        .await
        .get_recently_played(200)
        .await
        .unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].played_at.as_deref(), Some("2024-05-01T10:00:00Z"));
}

#[tokio::test]
async fn error_status_carries_code_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/player/devices"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Player command failed"))
        .mount(&server)
        .await;

    let err = client(&server).await.get_devices().await.unwrap_err();
    assert_eq!(err.status(), Some(403));
    match err {
        Error::Api { body, .. } => assert_eq!(body, "Player command failed"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn empty_player_responses_mean_nothing_playing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/player"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    assert!(client(&server).await.get_player().await.unwrap().is_none());
}

#[tokio::test]
async fn non_json_success_is_accepted() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/me/player/next"))
        .and(query_param("device_id", "dev"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .await
        .next_track(Some("dev"))
        .await
        .unwrap();
}

#[tokio::test]
async fn write_calls_send_json_bodies() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/me/player/play"))
        .and(query_param("device_id", "dev"))
        .and(body_json(json!({
            "context_uri": "spotify:playlist:pl",
            "offset": {"uri": "spotify:track:t"}
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/me/player"))
        .and(body_json(json!({"device_ids": ["dev"], "play": true})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/me/player/repeat"))
        .and(query_param("state", "context"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server).await;
    api.start_playlist_at_track("dev", "pl", "spotify:track:t")
        .await
        .unwrap();
    api.transfer_playback("dev", true).await.unwrap();
    api.set_repeat(spotsel::types::RepeatMode::All, None)
        .await
        .unwrap();
}
