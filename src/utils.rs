use std::collections::HashMap;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::types::{Device, Track};

pub fn generate_code_verifier() -> String {
    random_alphanumeric(128)
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Opaque value echoed back by the authorize redirect.
pub fn generate_state() -> String {
    random_alphanumeric(32)
}

/// Identity of one integration instance.
pub fn generate_instance_id() -> String {
    random_alphanumeric(12)
}

fn random_alphanumeric(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Comma-joined artist names of a track object, `"Unknown"` when there are none.
pub fn join_artists(artists: Option<&Value>) -> String {
    let names: Vec<&str> = artists
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|a| a.get("name").and_then(Value::as_str))
                .filter(|name| !name.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if names.is_empty() {
        "Unknown".to_string()
    } else {
        names.join(", ")
    }
}

/// Flattens a list item wrapping a nested `track` object.
///
/// Returns `None` when the track has no uri.
pub fn flatten_track(item: &Value) -> Option<Track> {
    let track = item.get("track")?;
    let uri = track
        .get("uri")
        .and_then(Value::as_str)
        .filter(|uri| !uri.is_empty())?;

    Some(Track {
        uri: uri.to_string(),
        name: track
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_string(),
        artists: join_artists(track.get("artists")),
    })
}

pub fn device_label(device: &Device) -> String {
    let short: String = device.id.chars().take(6).collect();
    format!("{} [{}]", device.name, short)
}

/// Makes `base` unique among `existing` by appending ` (2)`, ` (3)`, ...
pub fn dedupe_label<V>(base: &str, existing: &HashMap<String, V>) -> String {
    if !existing.contains_key(base) {
        return base.to_string();
    }

    let mut i = 2;
    loop {
        let label = format!("{base} ({i})");
        if !existing.contains_key(&label) {
            return label;
        }
        i += 1;
    }
}

/// Ordered option labels for a picker, each mapped back to its value.
#[derive(Debug, Clone, Default)]
pub struct Options {
    labels: Vec<String>,
    values: HashMap<String, String>,
}

impl Options {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (String, &'a str)>) -> Self {
        let mut options = Options::default();
        for (base, value) in pairs {
            let label = dedupe_label(&base, &options.values);
            options.values.insert(label.clone(), value.to_string());
            options.labels.push(label);
        }
        options
    }

    /// Track options labelled `"<name> — <artists>"`.
    pub fn tracks<'a>(tracks: impl IntoIterator<Item = (&'a str, &'a str, &'a str)>) -> Self {
        Self::from_pairs(
            tracks
                .into_iter()
                .map(|(name, artists, uri)| (format!("{name} — {artists}"), uri)),
        )
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn value_of(&self, label: &str) -> Option<&str> {
        self.values.get(label).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels
            .iter()
            .filter_map(|l| self.values.get(l).map(|v| (l.as_str(), v.as_str())))
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
