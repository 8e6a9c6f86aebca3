use std::collections::HashSet;

use tokio::sync::RwLock;

use crate::{
    config::Settings,
    error::{Error, Result},
    types::{Device, PlayMode},
};

/// Mutable runtime state of one integration instance.
///
/// Shared by the coordinator, the dispatcher and the display layer. Dropped
/// with the instance on unload, which is the only way the selected device
/// is ever cleared.
#[derive(Debug)]
pub struct Context {
    entry_id: String,
    play_mode: PlayMode,
    playlist_ids: HashSet<String>,
    selected_device: RwLock<Option<String>>,
}

impl Context {
    pub fn new(entry_id: impl Into<String>, settings: &Settings) -> Self {
        Self {
            entry_id: entry_id.into(),
            play_mode: settings.play_mode,
            playlist_ids: settings.playlist_ids.clone(),
            selected_device: RwLock::new(None),
        }
    }

    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    pub fn playlist_ids(&self) -> &HashSet<String> {
        &self.playlist_ids
    }

    /// Whether `playlist_id` passes the allowlist; an empty allowlist passes everything.
    pub fn allows_playlist(&self, playlist_id: &str) -> bool {
        self.playlist_ids.is_empty() || self.playlist_ids.contains(playlist_id)
    }

    pub async fn selected_device(&self) -> Option<String> {
        self.selected_device.read().await.clone()
    }

    pub async fn select_device(&self, device_id: impl Into<String>) {
        let device_id = device_id.into();
        tracing::debug!(entry = %self.entry_id, device = %device_id, "device selected");
        *self.selected_device.write().await = Some(device_id);
    }

    /// Adopts the first active device when nothing is selected yet.
    pub async fn adopt_active_device(&self, devices: &[Device]) -> bool {
        let mut selected = self.selected_device.write().await;
        if selected.is_some() {
            return false;
        }

        match devices.iter().find(|d| d.is_active) {
            Some(active) => {
                tracing::info!(device = %active.name, "adopting active device");
                *selected = Some(active.id.clone());
                true
            }
            None => false,
        }
    }

    /// The explicit device, else the selected one.
    pub async fn resolve_device(&self, explicit: Option<&str>) -> Result<String> {
        if let Some(id) = explicit.filter(|id| !id.is_empty()) {
            return Ok(id.to_string());
        }

        self.selected_device()
            .await
            .ok_or_else(|| Error::invalid("No device_id provided and no selected device set"))
    }
}
