//! # CLI Module
//!
//! User-facing commands of spotsel. Every command except [`auth`] sets up a
//! single integration instance (token, REST client, first coordinator
//! refresh) through [`session::connect`], runs against it and unloads it.
//!
//! ## Command Categories
//!
//! - Authentication: [`auth`]
//! - State: [`status`], [`watch`]
//! - Library and pickers: [`devices`], [`playlists`], [`tracks`]
//! - Playback: [`play`], [`pause`], [`next`], [`previous`], [`shuffle`],
//!   [`repeat`], [`transfer`], [`select_device`], [`source`],
//!   [`play_playlist`], [`play_track`], [`queue`], [`refresh_library`]
//!
//! Failures are printed with the crate's `error!` macro, which exits the
//! process.

mod library;
mod login;
mod playback;
mod session;
mod status;

pub use library::{TrackList, devices, playlists, tracks};
pub use login::auth;
pub use playback::{
    next, pause, play, play_playlist, play_track, previous, queue, refresh_library, repeat,
    select_device, shuffle, source, transfer,
};
pub use status::{status, watch};
