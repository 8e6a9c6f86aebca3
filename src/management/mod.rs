mod auth;
mod context;
mod coordinator;
mod dispatcher;
mod integration;
pub mod view;

pub use auth::TokenManager;
pub use auth::TokenProvider;
pub use context::Context;
pub use coordinator::{Coordinator, SubFetch, UPDATE_INTERVAL, UpdateStatus};
pub use dispatcher::{
    DEBOUNCE_WINDOW, Debounce, Dispatcher, Outcome, PlaybackCall, PlaylistRef, find_device,
    plan_playlist_track, plan_queue, plan_track,
};
pub use integration::Integration;
