//! # API Module
//!
//! HTTP endpoints of the local server started during `spotsel auth`.
//!
//! - [`callback`] - receives the authorization redirect, checks `state` and
//!   exchanges the code for a token.
//! - [`health`] - status and version.

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
