//! # Spotify Integration Module
//!
//! HTTP-facing half of spotsel: the OAuth authorization-code flow and the
//! REST client used by the coordinator and the command dispatcher.
//!
//! ```text
//! Coordinator / Dispatcher
//!          ↓
//! SpotifyApi (client)  ←  token set by the TokenProvider before each call
//!          ↓
//! Spotify Web API (REST/JSON, bearer auth)
//! ```
//!
//! ## API Coverage
//!
//! ### Library
//! - `GET /me/playlists` - all playlists, paginated
//! - `GET /playlists/{id}/tracks` - playlist tracks, paginated and capped
//! - `GET /me/tracks` - saved tracks, paginated and capped
//! - `GET /me/player/recently-played` - one page
//!
//! ### Playback state
//! - `GET /me/player/devices`
//! - `GET /me/player`
//!
//! ### Playback control
//! - `PUT /me/player/play`, `PUT /me/player/pause`
//! - `POST /me/player/next`, `POST /me/player/previous`
//! - `PUT /me/player/shuffle`, `PUT /me/player/repeat`
//! - `POST /me/player/queue`, `PUT /me/player` (transfer)
//!
//! ### Authentication
//! - `POST /api/token` - code exchange and refresh
//!
//! ## Errors
//!
//! A response with status >= 400 becomes [`crate::error::Error::Api`] carrying
//! the status and raw body. A 204 or non-JSON body yields an empty object.
//! Nothing is retried here.

pub mod auth;
pub mod client;

pub use client::SpotifyApi;
