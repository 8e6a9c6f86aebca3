use std::collections::HashMap;

use serde_json::json;
use spotsel::types::Device;
use spotsel::utils::*;

#[test]
fn test_code_challenge_is_url_safe_sha256() {
    // RFC 7636 appendix B
    let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    assert_eq!(
        generate_code_challenge(verifier),
        "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
    );
}

#[test]
fn test_generated_values_have_expected_shape() {
    let verifier = generate_code_verifier();
    assert_eq!(verifier.len(), 128);
    assert!(verifier.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(generate_state().len(), 32);
    assert_ne!(generate_instance_id(), generate_instance_id());
}

#[test]
fn test_join_artists() {
    let artists = json!([{"name": "A"}, {"name": ""}, {"id": "x"}, {"name": "B"}]);
    assert_eq!(join_artists(Some(&artists)), "A, B");
    assert_eq!(join_artists(Some(&json!([]))), "Unknown");
    assert_eq!(join_artists(None), "Unknown");
}

#[test]
fn test_flatten_track() {
    let item = json!({"track": {"uri": "spotify:track:1", "name": "One", "artists": [{"name": "A"}]}});
    let track = flatten_track(&item).unwrap();
    assert_eq!(track.uri, "spotify:track:1");
    assert_eq!(track.name, "One");
    assert_eq!(track.artists, "A");

    assert!(flatten_track(&json!({"track": null})).is_none());
    assert!(flatten_track(&json!({"track": {"name": "local"}})).is_none());
    assert!(flatten_track(&json!({"track": {"uri": ""}})).is_none());
}

#[test]
fn test_device_label_uses_id_prefix() {
    let device = Device {
        id: "0123456789".to_string(),
        name: "Living Room".to_string(),
        is_active: false,
    };
    assert_eq!(device_label(&device), "Living Room [012345]");
}

#[test]
fn test_dedupe_label() {
    let mut existing: HashMap<String, ()> = HashMap::new();
    assert_eq!(dedupe_label("Mix", &existing), "Mix");
    existing.insert("Mix".to_string(), ());
    assert_eq!(dedupe_label("Mix", &existing), "Mix (2)");
    existing.insert("Mix (2)".to_string(), ());
    assert_eq!(dedupe_label("Mix", &existing), "Mix (3)");
}

#[test]
fn test_track_options_keep_order_and_map_to_uri() {
    let options = Options::tracks([
        ("Song", "A", "spotify:track:1"),
        ("Other", "B", "spotify:track:2"),
        ("Song", "A", "spotify:track:3"),
    ]);

    assert_eq!(
        options.labels(),
        ["Song — A", "Other — B", "Song — A (2)"]
    );
    assert_eq!(options.value_of("Song — A"), Some("spotify:track:1"));
    assert_eq!(options.value_of("Song — A (2)"), Some("spotify:track:3"));
    assert_eq!(options.value_of("missing"), None);
    assert!(Options::default().is_empty());
}
