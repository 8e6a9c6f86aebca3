//! Playback commands against a mock Web API.

mod common;

use std::{sync::Arc, time::Duration};

use common::{commands, mount_account, mount_devices, mount_get, page, parts};
use serde_json::json;
use spotsel::{
    error::Error,
    management::{Integration, Outcome},
    types::PlayMode,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

async fn accept_writes(server: &MockServer) {
    for verb in ["PUT", "POST"] {
        Mock::given(method(verb))
            .respond_with(ResponseTemplate::new(204))
            .mount(server)
            .await;
    }
}

async fn integration(server: &MockServer, play_mode: PlayMode) -> Integration {
    let p = parts(server, play_mode);
    Integration::assemble(p.context, p.api, p.tokens, p.coordinator)
        .await
        .unwrap()
}

#[tokio::test]
async fn commands_inside_the_window_are_dropped() {
    let server = MockServer::start().await;
    mount_account(&server, true).await;
    accept_writes(&server).await;
    let it = integration(&server, PlayMode::DirectPlay).await;
    let dispatcher = it.dispatcher();

    assert_eq!(dispatcher.pause(None).await.unwrap(), Outcome::Sent);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(dispatcher.pause(None).await.unwrap(), Outcome::Debounced);
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(dispatcher.pause(None).await.unwrap(), Outcome::Sent);

    let sent = commands(&server).await;
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|(m, p, _)| m == "PUT" && p == "/me/player/pause"));
    // debounced commands request no refresh either
    assert_eq!(it.coordinator().refresh_requests(), 2);
}

#[tokio::test]
async fn forbidden_command_is_suppressed_and_refreshes_once() {
    let server = MockServer::start().await;
    mount_account(&server, true).await;
    Mock::given(method("POST"))
        .and(path("/me/player/next"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Restriction violated"))
        .expect(1)
        .mount(&server)
        .await;
    let it = integration(&server, PlayMode::DirectPlay).await;

    let before = it.coordinator().refresh_requests();
    let outcome = it.dispatcher().next(None).await.unwrap();

    assert_eq!(outcome, Outcome::Invalidated);
    assert_eq!(it.coordinator().refresh_requests(), before + 1);
}

#[tokio::test]
async fn other_failures_propagate_after_refresh() {
    let server = MockServer::start().await;
    mount_account(&server, true).await;
    Mock::given(method("PUT"))
        .and(path("/me/player/shuffle"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let it = integration(&server, PlayMode::DirectPlay).await;

    let err = it.dispatcher().shuffle(true, None).await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(it.coordinator().refresh_requests(), 1);
}

#[tokio::test]
async fn queue_then_skip_splices_the_track_into_the_playlist() {
    let server = MockServer::start().await;
    mount_account(&server, true).await;
    accept_writes(&server).await;
    let it = integration(&server, PlayMode::QueueThenSkip).await;

    let outcome = it
        .dispatcher()
        .play_track_in_playlist("pl-1", "spotify:track:2", None)
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Sent);

    let sent = commands(&server).await;
    let calls: Vec<(&str, &str)> = sent
        .iter()
        .map(|(m, p, _)| (m.as_str(), p.as_str()))
        .collect();
    assert_eq!(
        calls,
        [
            ("PUT", "/me/player/play"),
            ("POST", "/me/player/queue"),
            ("POST", "/me/player/next"),
        ]
    );
    assert_eq!(sent[0].2, json!({"context_uri": "spotify:playlist:pl-1"}));
    assert!(sent.iter().all(|(_, _, body)| body.get("offset").is_none()));
}

#[tokio::test]
async fn queue_then_skip_starts_at_offset_when_nothing_plays() {
    let server = MockServer::start().await;
    mount_account(&server, false).await;
    accept_writes(&server).await;
    let it = integration(&server, PlayMode::QueueThenSkip).await;

    it.dispatcher()
        .play_track_in_playlist("pl-1", "spotify:track:2", None)
        .await
        .unwrap();

    let sent = commands(&server).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].2,
        json!({"context_uri": "spotify:playlist:pl-1", "offset": {"uri": "spotify:track:2"}})
    );
}

#[tokio::test]
async fn invalid_arguments_do_not_consume_the_window() {
    let server = MockServer::start().await;
    mount_get(&server, "/me/playlists", page(vec![], None)).await;
    mount_get(&server, "/me/tracks", page(vec![], None)).await;
    mount_get(&server, "/me/player/recently-played", page(vec![], None)).await;
    mount_devices(&server, false).await;
    Mock::given(method("GET"))
        .and(path("/me/player"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    accept_writes(&server).await;
    let it = integration(&server, PlayMode::DirectPlay).await;

    // no active device, so nothing was adopted
    let err = it.dispatcher().play(None).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(commands(&server).await.is_empty());

    assert_eq!(
        it.dispatcher().play(Some("dev-1")).await.unwrap(),
        Outcome::Sent
    );
    let sent = commands(&server).await;
    assert_eq!(sent[0].1, "/me/player");
    assert_eq!(sent[0].2, json!({"device_ids": ["dev-1"], "play": true}));
    assert_eq!(sent[1].1, "/me/player/play");
}

#[tokio::test]
async fn transfer_remembers_the_device() {
    let server = MockServer::start().await;
    mount_account(&server, false).await;
    accept_writes(&server).await;
    let it = integration(&server, PlayMode::DirectPlay).await;
    it.context().select_device("other").await;

    let outcome = it.dispatcher().transfer("Desk [dev-1]").await.unwrap();

    assert_eq!(outcome, Outcome::Sent);
    assert_eq!(it.context().selected_device().await.as_deref(), Some("dev-1"));
    assert!(matches!(
        it.dispatcher().transfer("Nowhere").await,
        Err(Error::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn source_must_be_allowlisted() {
    let server = MockServer::start().await;
    mount_account(&server, false).await;
    accept_writes(&server).await;

    let mut p = parts(&server, PlayMode::DirectPlay);
    p.settings.playlist_ids = ["pl-other".to_string()].into_iter().collect();
    let context = Arc::new(spotsel::management::Context::new("test", &p.settings));
    let coordinator = Arc::new(spotsel::management::Coordinator::new(
        Arc::clone(&p.api),
        Arc::clone(&p.tokens),
        Arc::clone(&context),
    ));
    let it = Integration::assemble(context, p.api, p.tokens, coordinator)
        .await
        .unwrap();

    assert!(matches!(
        it.dispatcher().select_source("Morning").await,
        Err(Error::InvalidArgument(_))
    ));
    assert!(commands(&server).await.is_empty());
}

#[tokio::test]
async fn queue_starts_directly_when_idle() {
    let server = MockServer::start().await;
    mount_account(&server, false).await;
    accept_writes(&server).await;
    let it = integration(&server, PlayMode::DirectPlay).await;

    it.dispatcher()
        .queue_track("spotify:track:9", None, true)
        .await
        .unwrap();

    let sent = commands(&server).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, "/me/player/play");
    assert_eq!(sent[0].2, json!({"uris": ["spotify:track:9"]}));
}
