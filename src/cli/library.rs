use tabled::Table;

use crate::{
    cli::session,
    error,
    management::view,
    types::{DeviceTableRow, PlaylistTableRow, TrackTableRow},
    utils::{self, Options},
    warning,
};

/// Which track list to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TrackList {
    Saved,
    Recent,
    Playlist,
}

pub async fn devices() {
    let integration = session::connect(None).await;
    let Some(snapshot) = integration.coordinator().data() else {
        error!("No playback data available");
    };
    let selected = integration.context().selected_device().await;

    if snapshot.devices.is_empty() {
        warning!("No devices available. Open Spotify on a device first.");
    } else {
        let rows: Vec<DeviceTableRow> = snapshot
            .devices
            .iter()
            .map(|d| DeviceTableRow {
                device: utils::device_label(d),
                id: d.id.clone(),
                active: if d.is_active { "yes" } else { "" }.to_string(),
                selected: if selected.as_deref() == Some(d.id.as_str()) {
                    "*"
                } else {
                    ""
                }
                .to_string(),
            })
            .collect();
        println!("{}", Table::new(rows));
    }

    integration.unload();
}

/// Lists playlists with their loaded track counts and whether they are
/// usable as sources.
pub async fn playlists() {
    let integration = session::connect(None).await;
    let Some(snapshot) = integration.coordinator().data() else {
        error!("No playback data available");
    };
    let context = integration.context();

    let rows: Vec<PlaylistTableRow> = snapshot
        .playlists
        .iter()
        .map(|p| PlaylistTableRow {
            name: p.name.clone(),
            id: p.id.clone(),
            tracks: snapshot.tracks_of(&p.id).len(),
            allowed: if context.allows_playlist(&p.id) {
                "yes"
            } else {
                "no"
            }
            .to_string(),
        })
        .collect();
    println!("{}", Table::new(rows));

    let sources = view::source_list(&snapshot, context);
    if !sources.is_empty() {
        println!("Sources: {}", sources.join(", "));
    }

    integration.unload();
}

fn print_options(options: &Options) {
    if options.is_empty() {
        warning!("Nothing to show.");
        return;
    }

    let rows: Vec<TrackTableRow> = options
        .iter()
        .map(|(label, uri)| TrackTableRow {
            option: label.to_string(),
            uri: uri.to_string(),
        })
        .collect();
    println!("{}", Table::new(rows));
}

/// Prints the options of one track picker.
pub async fn tracks(list: TrackList, playlist: Option<String>) {
    let integration = session::connect(None).await;
    let Some(snapshot) = integration.coordinator().data() else {
        error!("No playback data available");
    };

    let options = match list {
        TrackList::Saved => view::saved_track_options(&snapshot),
        TrackList::Recent => view::recent_track_options(&snapshot),
        TrackList::Playlist => {
            let Some(name_or_id) = playlist else {
                error!("--playlist is required for playlist tracks");
            };
            let picker = view::playlist_options(&snapshot, integration.context());
            let id = picker
                .value_of(&name_or_id)
                .map(str::to_string)
                .or_else(|| snapshot.playlist(&name_or_id).map(|p| p.id.clone()));
            match id {
                Some(id) => view::playlist_track_options(&snapshot, &id),
                None => error!("Unknown playlist: {}", name_or_id),
            }
        }
    };
    print_options(&options);

    integration.unload();
}
