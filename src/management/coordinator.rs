//! Polling coordinator.
//!
//! Every tick refreshes devices, player state, saved tracks and recently
//! played. Playlists and their tracks are loaded on the first successful
//! library fetch and then reused until [`Coordinator::reset_library`] is
//! called. Scheduled ticks and requested refreshes both go through
//! [`Coordinator::tick`].

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::{
    sync::{Mutex, Notify, watch},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};

use crate::{
    error::{Error, Result},
    management::{Context, TokenProvider},
    spotify::{
        SpotifyApi,
        client::{PLAYLIST_TRACK_CAP, RECENT_LIMIT, SAVED_TRACK_CAP},
    },
    types::{Library, Snapshot},
};

pub const UPDATE_INTERVAL: Duration = Duration::from_secs(15);

/// Result of an optional sub-fetch: either the data, or a failure that the
/// cycle absorbs by substituting the default value.
#[derive(Debug)]
pub enum SubFetch<T> {
    Fetched(T),
    Degraded(Error),
}

impl<T: Default> SubFetch<T> {
    pub fn is_degraded(&self) -> bool {
        matches!(self, SubFetch::Degraded(_))
    }

    /// The fetched value, or `T::default()` after logging the failure.
    pub fn or_default(self, what: &str) -> T {
        match self {
            SubFetch::Fetched(value) => value,
            SubFetch::Degraded(e) => {
                tracing::warn!(fetch = what, error = %e, "optional fetch failed, using empty value");
                T::default()
            }
        }
    }
}

impl<T> From<Result<T>> for SubFetch<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => SubFetch::Fetched(value),
            Err(e) => SubFetch::Degraded(e),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateStatus {
    pub last_update_success: bool,
    pub last_error: Option<String>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub ticks: u64,
}

pub struct Coordinator {
    api: Arc<SpotifyApi>,
    tokens: Arc<dyn TokenProvider>,
    context: Arc<Context>,
    interval: Duration,
    tick_lock: Mutex<()>,
    library_loaded: AtomicBool,
    library: Mutex<Option<Arc<Library>>>,
    data: watch::Sender<Option<Arc<Snapshot>>>,
    status: Mutex<UpdateStatus>,
    refresh: Notify,
    refresh_requests: AtomicU64,
}

impl Coordinator {
    pub fn new(
        api: Arc<SpotifyApi>,
        tokens: Arc<dyn TokenProvider>,
        context: Arc<Context>,
    ) -> Self {
        Self::with_interval(api, tokens, context, UPDATE_INTERVAL)
    }

    pub fn with_interval(
        api: Arc<SpotifyApi>,
        tokens: Arc<dyn TokenProvider>,
        context: Arc<Context>,
        interval: Duration,
    ) -> Self {
        Self {
            api,
            tokens,
            context,
            interval,
            tick_lock: Mutex::new(()),
            library_loaded: AtomicBool::new(false),
            library: Mutex::new(None),
            data: watch::Sender::new(None),
            status: Mutex::new(UpdateStatus::default()),
            refresh: Notify::new(),
            refresh_requests: AtomicU64::new(0),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Last successful snapshot. Failed cycles never replace it.
    pub fn data(&self) -> Option<Arc<Snapshot>> {
        self.data.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.data.subscribe()
    }

    pub async fn status(&self) -> UpdateStatus {
        self.status.lock().await.clone()
    }

    pub fn library_loaded(&self) -> bool {
        self.library_loaded.load(Ordering::SeqCst)
    }

    /// Number of out-of-schedule refreshes requested so far.
    pub fn refresh_requests(&self) -> u64 {
        self.refresh_requests.load(Ordering::SeqCst)
    }

    /// Asks the poll loop for an immediate tick. Does not wait for it.
    pub fn request_refresh(&self) {
        self.refresh_requests.fetch_add(1, Ordering::SeqCst);
        self.refresh.notify_one();
    }

    /// Forgets the loaded library so the next tick fetches it again, and
    /// requests that tick.
    pub fn reset_library(&self) {
        tracing::info!("library reset requested");
        self.library_loaded.store(false, Ordering::SeqCst);
        self.request_refresh();
    }

    /// Runs one poll cycle.
    ///
    /// On failure of a mandatory part (token, library while unloaded,
    /// devices) returns [`Error::UpdateFailed`] and keeps the previous
    /// snapshot.
    pub async fn tick(&self) -> Result<Arc<Snapshot>> {
        let _guard = self.tick_lock.lock().await;
        let result = self.update().await;

        let mut status = self.status.lock().await;
        status.ticks += 1;

        match result {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                status.last_update_success = true;
                status.last_error = None;
                status.last_success_at = Some(snapshot.updated_at);
                drop(status);

                self.context.adopt_active_device(&snapshot.devices).await;
                self.data.send_replace(Some(Arc::clone(&snapshot)));
                tracing::debug!(
                    devices = snapshot.devices.len(),
                    playing = snapshot.player.is_some(),
                    "update finished"
                );
                Ok(snapshot)
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(error = %message, "update failed");
                status.last_update_success = false;
                status.last_error = Some(message.clone());
                Err(Error::UpdateFailed(message))
            }
        }
    }

    async fn update(&self) -> Result<Snapshot> {
        let token = self.tokens.ensure_token_valid().await?;
        self.api.set_token(token).await;

        let library = self.library().await?;
        let devices = self.api.get_devices().await?;

        let player = SubFetch::from(self.api.get_player().await).or_default("player");
        let saved_tracks =
            SubFetch::from(self.api.get_saved_tracks(SAVED_TRACK_CAP).await).or_default("saved tracks");
        let recent_tracks = SubFetch::from(self.api.get_recently_played(RECENT_LIMIT).await)
            .or_default("recently played");

        Ok(Snapshot {
            devices,
            playlists: library.playlists.clone(),
            saved_tracks,
            recent_tracks,
            playlist_tracks: library.playlist_tracks.clone(),
            player,
            updated_at: Utc::now(),
        })
    }

    async fn library(&self) -> Result<Arc<Library>> {
        if self.library_loaded() {
            if let Some(library) = self.library.lock().await.clone() {
                return Ok(library);
            }
        }

        let playlists = self.api.get_playlists().await?;
        let mut playlist_tracks = HashMap::with_capacity(playlists.len());
        for playlist in &playlists {
            let tracks = self
                .api
                .get_playlist_tracks(&playlist.id, PLAYLIST_TRACK_CAP)
                .await?;
            playlist_tracks.insert(playlist.id.clone(), tracks);
        }

        tracing::info!(playlists = playlists.len(), "library loaded");
        let library = Arc::new(Library {
            playlists,
            playlist_tracks,
        });
        *self.library.lock().await = Some(Arc::clone(&library));
        self.library_loaded.store(true, Ordering::SeqCst);

        Ok(library)
    }

    /// Ticks every `interval`, and immediately whenever a refresh is
    /// requested. Requests do not move the schedule.
    pub async fn run(self: Arc<Self>) {
        let mut schedule = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        schedule.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = schedule.tick() => {}
                _ = self.refresh.notified() => {
                    tracing::debug!("requested refresh");
                }
            }

            // failures are recorded in the status and retried next tick
            let _ = self.tick().await;
        }
    }

    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_fetch_falls_back_to_default() {
        let fetched = SubFetch::from(Ok::<_, Error>(vec![1u8, 2]));
        assert!(!fetched.is_degraded());
        assert_eq!(fetched.or_default("bytes"), vec![1, 2]);

        let degraded = SubFetch::<Vec<u8>>::from(Err(Error::Api {
            status: 500,
            body: "boom".to_string(),
        }));
        assert!(degraded.is_degraded());
        assert!(degraded.or_default("bytes").is_empty());
    }
}
